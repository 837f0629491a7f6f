use std::path::PathBuf;

use jpq_index::{Scheme, extract_document};
use serde_json::json;

use super::load::{fail, load_json};

pub struct EntriesArgs {
    pub doc_path: PathBuf,
    pub scheme: Scheme,
    pub json: bool,
}

pub fn run(args: EntriesArgs) {
    let doc = load_json(&args.doc_path).unwrap_or_else(|e| fail(e));
    let entries = extract_document(&doc, args.scheme);

    if args.json {
        let value = json!({ "scheme": args.scheme, "entries": entries });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
        return;
    }
    for entry in &entries {
        println!("{}", entry);
    }
}
