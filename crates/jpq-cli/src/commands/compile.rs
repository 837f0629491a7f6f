use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use jpq_compiler::Encoder;
use jpq_core::Mode;
use serde_json::Value;

use super::load::{fail, load_tree, load_vars};

pub struct CompileArgs {
    pub tree_path: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: Mode,
    pub vars: Option<PathBuf>,
    pub recursion_limit: u32,
}

pub fn run(args: CompileArgs) {
    let tree = load_tree(&args.tree_path).unwrap_or_else(|e| fail(e));
    let vars = match &args.vars {
        Some(path) => Some(load_vars(path).unwrap_or_else(|e| fail(e))),
        None => None,
    };

    let encoder = Encoder::new()
        .mode(args.mode)
        .recursion_limit(args.recursion_limit);
    let encoded = match &vars {
        Some(vars) => encoder.vars::<Value>(vars).encode(&tree),
        None => encoder.encode(&tree),
    };
    let query = encoded.unwrap_or_else(|e| fail(e));

    let written = match &args.output {
        Some(path) => fs::write(path, query.as_bytes()),
        None => io::stdout().lock().write_all(query.as_bytes()),
    };
    if let Err(e) = written {
        fail(format!("failed to write compiled query: {}", e));
    }
}
