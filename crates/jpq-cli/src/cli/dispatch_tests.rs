//! Tests for CLI dispatch logic.
//!
//! These tests verify:
//! 1. Unified flags: render/dump accept exec and index flags without error
//! 2. Help visibility: hidden flags don't appear in --help
//! 3. Params extraction: correct fields are extracted from ArgMatches

use std::path::PathBuf;

use jpq_core::Mode;
use jpq_index::{Scheme, Strategy};

use super::*;
use crate::cli::commands::{
    compile_command, dump_command, entries_command, exec_command, index_command, render_command,
};
use crate::commands::exec::{ExecArgs, ExecOutput};

#[test]
fn dump_accepts_exec_flags() {
    let cmd = dump_command();
    let result = cmd.try_get_matches_from([
        "dump",
        "query.jpq",
        "doc.json",
        "--fuel",
        "500",
        "--lenient",
        "--first",
        "--scheme",
        "hash-chain",
    ]);
    assert!(
        result.is_ok(),
        "dump should accept exec flags: {:?}",
        result.err()
    );

    let m = result.unwrap();
    let params = DumpParams::from_matches(&m);
    assert_eq!(params.query_path, PathBuf::from("query.jpq"));
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn render_accepts_color_and_index_flags() {
    let cmd = render_command();
    let result = cmd.try_get_matches_from(["render", "query.jpq", "--color", "never", "--json"]);
    assert!(
        result.is_ok(),
        "render should accept hidden flags: {:?}",
        result.err()
    );

    let params = RenderParams::from_matches(&result.unwrap());
    assert_eq!(params.query_path, PathBuf::from("query.jpq"));
}

#[test]
fn render_help_hides_exec_flags() {
    let mut cmd = render_command();
    let help = cmd.render_help().to_string();

    assert!(help.contains("<QUERY>"));
    assert!(!help.contains("--fuel"), "--fuel should be hidden");
    assert!(!help.contains("--lenient"), "--lenient should be hidden");
    assert!(!help.contains("--scheme"), "--scheme should be hidden");
    assert!(!help.contains("--color"), "--color should be hidden");
}

#[test]
fn exec_help_shows_exec_flags() {
    let mut cmd = exec_command();
    let help = cmd.render_help().to_string();

    assert!(help.contains("--fuel"));
    assert!(help.contains("--match"));
    assert!(help.contains("--trace"));
    assert!(!help.contains("--scheme"), "--scheme should be hidden");
}

#[test]
fn exec_params_defaults() {
    let m = exec_command()
        .try_get_matches_from(["exec", "query.jpq", "doc.json"])
        .unwrap();
    let params = ExecParams::from_matches(&m);

    assert_eq!(params.query_path, PathBuf::from("query.jpq"));
    assert_eq!(params.doc_path, PathBuf::from("doc.json"));
    assert_eq!(params.vars, None);
    assert!(!params.lenient);
    assert_eq!(params.fuel, 1_000_000);
    assert_eq!(params.depth, 1024);
    assert!(!params.trace);
    assert!(!params.compact);

    let args: ExecArgs = params.into();
    assert_eq!(args.output, ExecOutput::Items);
}

#[test]
fn exec_params_extraction() {
    let m = exec_command()
        .try_get_matches_from([
            "exec",
            "query.jpq",
            "-",
            "--vars",
            "vars.json",
            "--lenient",
            "--fuel",
            "10",
            "--depth",
            "32",
            "--match",
            "--compact",
            "--color",
            "always",
        ])
        .unwrap();
    let params = ExecParams::from_matches(&m);

    assert_eq!(params.doc_path, PathBuf::from("-"));
    assert_eq!(params.vars, Some(PathBuf::from("vars.json")));
    assert!(params.lenient);
    assert_eq!(params.color, ColorChoice::Always);

    let args: ExecArgs = params.into();
    assert_eq!(args.exec_fuel, 10);
    assert_eq!(args.recursion_limit, 32);
    assert_eq!(args.output, ExecOutput::Match);
    assert!(args.compact);
    assert!(args.color);
}

#[test]
fn exec_requires_document() {
    let result = exec_command().try_get_matches_from(["exec", "query.jpq"]);
    assert!(result.is_err());
}

#[test]
fn exec_output_modes_conflict() {
    let result =
        exec_command().try_get_matches_from(["exec", "q.jpq", "d.json", "--exists", "--match"]);
    assert!(result.is_err(), "--exists and --match should conflict");

    let result =
        exec_command().try_get_matches_from(["exec", "q.jpq", "d.json", "--match", "--first"]);
    assert!(result.is_err(), "--match and --first should conflict");

    let m = exec_command()
        .try_get_matches_from(["exec", "q.jpq", "d.json", "--exists"])
        .unwrap();
    let args: ExecArgs = ExecParams::from_matches(&m).into();
    assert_eq!(args.output, ExecOutput::Exists);
}

#[test]
fn compile_params_mode() {
    let m = compile_command()
        .try_get_matches_from(["compile", "tree.json", "-o", "q.jpq", "--strict"])
        .unwrap();
    let params = CompileParams::from_matches(&m);
    assert_eq!(params.tree_path, PathBuf::from("tree.json"));
    assert_eq!(params.output, Some(PathBuf::from("q.jpq")));
    assert!(params.strict);

    let m = compile_command()
        .try_get_matches_from(["compile", "tree.json"])
        .unwrap();
    let params = CompileParams::from_matches(&m);
    assert_eq!(params.output, None);
    assert!(!params.strict);
    let args: crate::commands::compile::CompileArgs = params.into();
    assert_eq!(args.mode, Mode::Lax);
}

#[test]
fn index_params_scheme() {
    let m = index_command()
        .try_get_matches_from(["index", "q.jpq"])
        .unwrap();
    let params = IndexParams::from_matches(&m);
    assert_eq!(params.scheme, Scheme::FullKey);
    assert_eq!(params.doc_path, None);

    let m = index_command()
        .try_get_matches_from(["index", "q.jpq", "doc.json", "--scheme", "hash-chain", "--json"])
        .unwrap();
    let params = IndexParams::from_matches(&m);
    assert_eq!(params.scheme, Scheme::HashChain);
    assert_eq!(params.doc_path, Some(PathBuf::from("doc.json")));
    assert!(params.json);
}

#[test]
fn index_params_strategy() {
    let m = index_command()
        .try_get_matches_from(["index", "q.jpq"])
        .unwrap();
    assert_eq!(IndexParams::from_matches(&m).strategy, Strategy::Match);

    let m = index_command()
        .try_get_matches_from(["index", "q.jpq", "--strategy", "exists"])
        .unwrap();
    let args: crate::commands::index::IndexArgs = IndexParams::from_matches(&m).into();
    assert_eq!(args.strategy, Strategy::Exists);

    let result = dump_command().try_get_matches_from(["dump", "q.jpq", "--strategy", "exists"]);
    assert!(result.is_ok(), "dump should accept --strategy: {:?}", result.err());
}

#[test]
fn unknown_scheme_is_rejected() {
    let result = entries_command().try_get_matches_from(["entries", "d.json", "--scheme", "gin"]);
    assert!(result.is_err());

    let m = entries_command()
        .try_get_matches_from(["entries", "d.json"])
        .unwrap();
    let params = EntriesParams::from_matches(&m);
    assert_eq!(params.doc_path, PathBuf::from("d.json"));
    assert_eq!(params.scheme, Scheme::FullKey);
    assert!(!params.json);
}
