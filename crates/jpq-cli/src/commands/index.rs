//! Show what an index has to look up to answer a query.

use std::fmt::Write as _;
use std::path::PathBuf;

use jpq_index::{Entry, ExtractError, IndexQuery, QueryExtractor, Scheme, Strategy, extract_document};
use serde_json::{Value, json};

use super::load::{LoadError, fail, is_stdin, load_json, load_query};

pub struct IndexArgs {
    pub query_path: PathBuf,
    pub doc_path: Option<PathBuf>,
    pub scheme: Scheme,
    pub strategy: Strategy,
    pub json: bool,
    pub recursion_limit: u32,
}

pub fn run(args: IndexArgs) {
    if let Some(doc_path) = &args.doc_path
        && is_stdin(&args.query_path)
        && is_stdin(doc_path)
    {
        fail(LoadError::StdinTwice);
    }

    let query = load_query(&args.query_path).unwrap_or_else(|e| fail(e));
    let doc_entries = args.doc_path.as_ref().map(|path| {
        let doc = load_json(path).unwrap_or_else(|e| fail(e));
        extract_document(&doc, args.scheme)
    });

    let extracted = QueryExtractor::new(args.scheme)
        .strategy(args.strategy)
        .recursion_limit(args.recursion_limit)
        .extract(&query);
    let output = match extracted {
        Ok(extracted) if args.json => {
            format_json(&extracted, &args, doc_entries.as_deref())
        }
        Ok(extracted) => format_text(&extracted, doc_entries.as_deref()),
        Err(ExtractError::Unsupported(reason)) if args.json => json!({
            "scheme": args.scheme,
            "strategy": args.strategy,
            "unsupported": reason,
        })
        .to_string(),
        Err(ExtractError::Unsupported(reason)) => {
            format!("full scan required: {}", reason)
        }
        Err(e) => fail(e),
    };
    println!("{}", output);
}

/// Formula on the first line, then one numbered entry per line. With a
/// document, entries it holds are marked with `+` and a verdict follows.
pub fn format_text(extracted: &IndexQuery, doc_entries: Option<&[Entry]>) -> String {
    let presence = doc_entries.map(|entries| extracted.presence(entries));
    let mut out = extracted.formula.to_string();
    for (i, entry) in extracted.entries.iter().enumerate() {
        let mark = match &presence {
            Some(held) if held[i] => "+ ",
            Some(_) => "  ",
            None => "",
        };
        write!(out, "\n{mark}#{i} {entry}").unwrap();
    }
    if let Some(entries) = doc_entries {
        let verdict = if extracted.consistent_with(entries) {
            "document may match"
        } else {
            "document skipped"
        };
        write!(out, "\n{verdict}").unwrap();
    }
    out
}

fn format_json(extracted: &IndexQuery, args: &IndexArgs, doc_entries: Option<&[Entry]>) -> String {
    let mut value = json!({
        "scheme": args.scheme,
        "strategy": args.strategy,
        "formula": extracted.formula,
        "entries": extracted.entries,
    });
    if let (Some(entries), Value::Object(map)) = (doc_entries, &mut value) {
        map.insert("present".into(), json!(extracted.presence(entries)));
        map.insert(
            "consistent".into(),
            Value::Bool(extracted.consistent_with(entries)),
        );
    }
    serde_json::to_string_pretty(&value).unwrap_or_else(|e| fail(e))
}
