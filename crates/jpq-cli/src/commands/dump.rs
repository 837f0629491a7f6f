use std::path::PathBuf;

use jpq_bytecode::dump;
use jpq_core::Colors;

use super::load::{fail, load_query};

pub struct DumpArgs {
    pub query_path: PathBuf,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let query = load_query(&args.query_path).unwrap_or_else(|e| fail(e));
    let colors = Colors::new(args.color);
    let text = dump(&query, colors).unwrap_or_else(|e| fail(e));
    print!("{}", text);
}
