//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! - `*Params` structs hold what each command reads from clap
//! - `from_matches()` extractors pull the relevant fields and ignore hidden ones
//! - `Into<*Args>` impls bridge dispatch to the command handlers

use std::path::PathBuf;

use clap::ArgMatches;
use jpq_core::Mode;
use jpq_index::{Scheme, Strategy};

use super::ColorChoice;
use crate::commands::compile::CompileArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::entries::EntriesArgs;
use crate::commands::exec::{ExecArgs, ExecOutput};
use crate::commands::index::IndexArgs;
use crate::commands::render::RenderArgs;

pub struct CompileParams {
    pub tree_path: PathBuf,
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub vars: Option<PathBuf>,
    pub depth: u32,
}

impl CompileParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            tree_path: required_path(m, "tree_path"),
            output: m.get_one::<PathBuf>("output").cloned(),
            strict: m.get_flag("strict"),
            vars: m.get_one::<PathBuf>("vars").cloned(),
            depth: parse_u32(m, "depth"),
        }
    }
}

impl From<CompileParams> for CompileArgs {
    fn from(p: CompileParams) -> Self {
        Self {
            tree_path: p.tree_path,
            output: p.output,
            mode: if p.strict { Mode::Strict } else { Mode::Lax },
            vars: p.vars,
            recursion_limit: p.depth,
        }
    }
}

pub struct RenderParams {
    pub query_path: PathBuf,
    // Note: exec and index flags are parsed but not extracted (unified flags)
}

impl RenderParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            query_path: required_path(m, "query_path"),
        }
    }
}

impl From<RenderParams> for RenderArgs {
    fn from(p: RenderParams) -> Self {
        Self {
            query_path: p.query_path,
        }
    }
}

pub struct DumpParams {
    pub query_path: PathBuf,
    pub color: ColorChoice,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            query_path: required_path(m, "query_path"),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            query_path: p.query_path,
            color: p.color.should_colorize(),
        }
    }
}

pub struct ExecParams {
    pub query_path: PathBuf,
    pub doc_path: PathBuf,
    pub vars: Option<PathBuf>,
    pub lenient: bool,
    pub fuel: u32,
    pub depth: u32,
    pub exists: bool,
    pub matches: bool,
    pub first: bool,
    pub trace: bool,
    pub compact: bool,
    pub color: ColorChoice,
}

impl ExecParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            // Input
            query_path: required_path(m, "query_path"),
            doc_path: required_path(m, "doc_path"),
            vars: m.get_one::<PathBuf>("vars").cloned(),

            // Evaluation
            lenient: m.get_flag("lenient"),
            fuel: parse_u32(m, "fuel"),
            depth: parse_u32(m, "depth"),

            // Output
            exists: m.get_flag("exists"),
            matches: m.get_flag("match"),
            first: m.get_flag("first"),
            trace: m.get_flag("trace"),
            compact: m.get_flag("compact"),
            color: parse_color(m),
        }
    }
}

impl From<ExecParams> for ExecArgs {
    fn from(p: ExecParams) -> Self {
        let output = if p.exists {
            ExecOutput::Exists
        } else if p.matches {
            ExecOutput::Match
        } else if p.first {
            ExecOutput::First
        } else {
            ExecOutput::Items
        };
        Self {
            query_path: p.query_path,
            doc_path: p.doc_path,
            vars: p.vars,
            lenient: p.lenient,
            exec_fuel: p.fuel,
            recursion_limit: p.depth,
            output,
            trace: p.trace,
            compact: p.compact,
            color: p.color.should_colorize(),
        }
    }
}

pub struct IndexParams {
    pub query_path: PathBuf,
    pub doc_path: Option<PathBuf>,
    pub scheme: Scheme,
    pub strategy: Strategy,
    pub json: bool,
    pub depth: u32,
}

impl IndexParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            query_path: required_path(m, "query_path"),
            doc_path: m.get_one::<PathBuf>("doc_path").cloned(),
            scheme: parse_scheme(m),
            strategy: parse_strategy(m),
            json: m.get_flag("json"),
            depth: parse_u32(m, "depth"),
        }
    }
}

impl From<IndexParams> for IndexArgs {
    fn from(p: IndexParams) -> Self {
        Self {
            query_path: p.query_path,
            doc_path: p.doc_path,
            scheme: p.scheme,
            strategy: p.strategy,
            json: p.json,
            recursion_limit: p.depth,
        }
    }
}

pub struct EntriesParams {
    pub doc_path: PathBuf,
    pub scheme: Scheme,
    pub json: bool,
}

impl EntriesParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            doc_path: required_path(m, "doc_path"),
            scheme: parse_scheme(m),
            json: m.get_flag("json"),
        }
    }
}

impl From<EntriesParams> for EntriesArgs {
    fn from(p: EntriesParams) -> Self {
        Self {
            doc_path: p.doc_path,
            scheme: p.scheme,
            json: p.json,
        }
    }
}

/// Positional marked `.required(true)`; clap rejects the command line before
/// dispatch when it is missing.
fn required_path(m: &ArgMatches, id: &str) -> PathBuf {
    m.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

/// Numeric flags all carry a default value.
fn parse_u32(m: &ArgMatches, id: &str) -> u32 {
    m.get_one::<u32>(id).copied().unwrap_or_default()
}

fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

fn parse_scheme(m: &ArgMatches) -> Scheme {
    match m.get_one::<String>("scheme").map(|s| s.as_str()) {
        Some("hash-chain") => Scheme::HashChain,
        _ => Scheme::FullKey,
    }
}

fn parse_strategy(m: &ArgMatches) -> Strategy {
    match m.get_one::<String>("strategy").map(|s| s.as_str()) {
        Some("exists") => Strategy::Exists,
        _ => Strategy::Match,
    }
}
