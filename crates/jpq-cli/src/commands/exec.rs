//! Run a compiled query against a document.

use std::path::PathBuf;

use jpq_core::Colors;
use jpq_vm::{EvalError, Evaluator, Limits, PrintTracer};
use serde_json::{Map, Value};

use super::load::{LoadError, fail, is_stdin, load_json, load_query, load_vars};

/// What `exec` prints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecOutput {
    /// All items as a JSON array.
    Items,
    /// The first item, or `null`.
    First,
    /// `true`, `false` or `null` (unknown) for a predicate query.
    Match,
    /// Whether any item was produced; `null` when a lenient run failed.
    Exists,
}

pub struct ExecArgs {
    pub query_path: PathBuf,
    pub doc_path: PathBuf,
    pub vars: Option<PathBuf>,
    pub lenient: bool,
    pub exec_fuel: u32,
    pub recursion_limit: u32,
    pub output: ExecOutput,
    pub trace: bool,
    pub compact: bool,
    pub color: bool,
}

pub fn run(args: ExecArgs) {
    if is_stdin(&args.query_path) && is_stdin(&args.doc_path) {
        fail(LoadError::StdinTwice);
    }

    let query = load_query(&args.query_path).unwrap_or_else(|e| fail(e));
    let doc = load_json(&args.doc_path).unwrap_or_else(|e| fail(e));
    let vars = match &args.vars {
        Some(path) => load_vars(path).unwrap_or_else(|e| fail(e)),
        None => Map::new(),
    };

    let evaluator = Evaluator::<Value>::new(&query)
        .limits(
            Limits::new()
                .exec_fuel(args.exec_fuel)
                .recursion_limit(args.recursion_limit),
        )
        .lenient(args.lenient)
        .vars(&vars);

    let value = match args.output {
        ExecOutput::Exists => evaluator.exists(&doc).map(truth_json),
        ExecOutput::Match => evaluator.matches(&doc).map(truth_json),
        ExecOutput::First => evaluator
            .query_first(&doc)
            .map(|item| item.map_or(Value::Null, |item| item.to_json())),
        ExecOutput::Items if args.trace => {
            let mut tracer = PrintTracer::new(Colors::new(args.color));
            let result = evaluator.query_with(&doc, &mut tracer);
            tracer.print();
            result.map(items_json)
        }
        ExecOutput::Items => evaluator.query(&doc).map(items_json),
    };

    match value {
        Ok(value) => print_json(&value, args.compact),
        Err(e) => runtime_error(&e),
    }
}

fn truth_json(truth: Option<bool>) -> Value {
    truth.map_or(Value::Null, Value::Bool)
}

fn items_json<T: serde::Serialize>(items: Vec<T>) -> Value {
    serde_json::to_value(items).unwrap_or_else(|e| fail(e))
}

fn print_json(value: &Value, compact: bool) {
    let output = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("JSON serialization failed: {}", e)),
    }
}

fn runtime_error(e: &EvalError) -> ! {
    eprintln!("runtime error ({}): {}", e.kind(), e);
    std::process::exit(2);
}
