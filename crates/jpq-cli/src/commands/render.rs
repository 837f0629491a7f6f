use std::path::PathBuf;

use jpq_bytecode::render;

use super::load::{fail, load_query};

pub struct RenderArgs {
    pub query_path: PathBuf,
}

pub fn run(args: RenderArgs) {
    let query = load_query(&args.query_path).unwrap_or_else(|e| fail(e));
    let text = render(&query).unwrap_or_else(|e| fail(e));
    println!("{}", text);
}
