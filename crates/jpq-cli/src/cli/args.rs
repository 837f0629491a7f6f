//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands,
//! so the same definition is reused with different visibility (`.hide(true)`).

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Compiled query file (positional).
pub fn query_path_arg() -> Arg {
    Arg::new("query_path")
        .value_name("QUERY")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Compiled query file (use \"-\" for stdin)")
}

/// Parse tree file (positional).
pub fn tree_path_arg() -> Arg {
    Arg::new("tree_path")
        .value_name("TREE")
        .value_parser(value_parser!(PathBuf))
        .required(true)
        .help("Parse tree as JSON (use \"-\" for stdin)")
}

/// JSON document (positional).
pub fn doc_path_arg() -> Arg {
    Arg::new("doc_path")
        .value_name("DOC")
        .value_parser(value_parser!(PathBuf))
        .help("JSON document (use \"-\" for stdin)")
}

/// Write output to file (-o/--output).
pub fn output_file_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Write the compiled query to file (default: stdout)")
}

/// Variable bindings (--vars).
pub fn vars_arg() -> Arg {
    Arg::new("vars")
        .long("vars")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("JSON object with values for $variables")
}

/// Strict mode (--strict).
pub fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Compile in strict mode (default: lax)")
}

/// Silent evaluation (--lenient).
pub fn lenient_arg() -> Arg {
    Arg::new("lenient")
        .long("lenient")
        .action(ArgAction::SetTrue)
        .help("Turn type and shape errors into empty results")
}

/// Index scheme (--scheme).
pub fn scheme_arg() -> Arg {
    Arg::new("scheme")
        .long("scheme")
        .value_name("SCHEME")
        .default_value("full-key")
        .value_parser(["full-key", "hash-chain"])
        .help("Index entry scheme")
}

/// Evaluator entry point the index answers for (--strategy).
pub fn strategy_arg() -> Arg {
    Arg::new("strategy")
        .long("strategy")
        .value_name("STRATEGY")
        .default_value("match")
        .value_parser(["match", "exists"])
        .help("Extract for a predicate match or for an existence test")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Execution fuel limit (--fuel).
pub fn fuel_arg() -> Arg {
    Arg::new("fuel")
        .long("fuel")
        .value_name("N")
        .default_value("1000000")
        .value_parser(value_parser!(u32))
        .help("Execution fuel limit")
}

/// Recursion depth limit (--depth).
pub fn depth_arg() -> Arg {
    Arg::new("depth")
        .long("depth")
        .value_name("N")
        .default_value("1024")
        .value_parser(value_parser!(u32))
        .help("Recursion depth limit")
}

/// Print whether any item matches (--exists).
pub fn exists_arg() -> Arg {
    Arg::new("exists")
        .long("exists")
        .action(ArgAction::SetTrue)
        .conflicts_with_all(["match", "first"])
        .help("Print whether the query yields any item")
}

/// Print the predicate result (--match).
pub fn match_arg() -> Arg {
    Arg::new("match")
        .long("match")
        .action(ArgAction::SetTrue)
        .conflicts_with("first")
        .help("Print the result of a predicate query")
}

/// Print only the first item (--first).
pub fn first_arg() -> Arg {
    Arg::new("first")
        .long("first")
        .action(ArgAction::SetTrue)
        .help("Print only the first item")
}

/// Trace execution (--trace).
pub fn trace_arg() -> Arg {
    Arg::new("trace")
        .long("trace")
        .action(ArgAction::SetTrue)
        .help("Print an execution trace to stderr")
}

/// Output compact JSON (--compact).
pub fn compact_arg() -> Arg {
    Arg::new("compact")
        .long("compact")
        .action(ArgAction::SetTrue)
        .help("Output compact JSON")
}

/// Output JSON instead of text (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output JSON instead of text")
}
