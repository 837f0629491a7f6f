//! Command builders for the CLI.
//!
//! Commands that read a compiled query accept each other's flags: render and
//! dump take the exec and index flags hidden, so a command line can be
//! retargeted by changing only the subcommand.

use clap::Command;

use super::args::*;

/// Add hidden exec args (for commands that don't evaluate).
fn with_hidden_exec_args(cmd: Command) -> Command {
    cmd.arg(doc_path_arg().hide(true))
        .arg(vars_arg().hide(true))
        .arg(lenient_arg().hide(true))
        .arg(fuel_arg().hide(true))
        .arg(depth_arg().hide(true))
        .arg(exists_arg().hide(true))
        .arg(match_arg().hide(true))
        .arg(first_arg().hide(true))
        .arg(trace_arg().hide(true))
        .arg(compact_arg().hide(true))
}

/// Add hidden index args (for commands that don't extract entries).
fn with_hidden_index_args(cmd: Command) -> Command {
    cmd.arg(scheme_arg().hide(true))
        .arg(strategy_arg().hide(true))
        .arg(json_arg().hide(true))
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("jpq")
        .about("Compile, inspect and run JSON path queries")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(compile_command())
        .subcommand(render_command())
        .subcommand(dump_command())
        .subcommand(exec_command())
        .subcommand(index_command())
        .subcommand(entries_command())
}

/// Encode a JSON parse tree.
pub fn compile_command() -> Command {
    Command::new("compile")
        .about("Encode a JSON parse tree into a compiled query")
        .after_help(
            r#"EXAMPLES:
  jpq compile tree.json -o query.jpq             # lax mode
  jpq compile tree.json -o query.jpq --strict    # strict mode
  jpq compile tree.json --vars vars.json -o q.jpq  # bind $variables"#,
        )
        .arg(tree_path_arg())
        .arg(output_file_arg())
        .arg(strict_arg())
        .arg(vars_arg())
        .arg(depth_arg())
}

/// Print the textual form of a compiled query.
pub fn render_command() -> Command {
    let cmd = Command::new("render")
        .about("Print a compiled query as text")
        .arg(query_path_arg());

    with_hidden_index_args(with_hidden_exec_args(cmd.arg(color_arg().hide(true))))
}

/// Show the node layout of a compiled query.
pub fn dump_command() -> Command {
    let cmd = Command::new("dump")
        .about("Show the nodes of a compiled query")
        .after_help(
            r#"EXAMPLES:
  jpq dump query.jpq                  # one line per node
  jpq dump query.jpq --color never    # plain text"#,
        )
        .arg(query_path_arg())
        .arg(color_arg());

    with_hidden_index_args(with_hidden_exec_args(cmd))
}

/// Run a compiled query against a document.
pub fn exec_command() -> Command {
    let cmd = Command::new("exec")
        .about("Run a compiled query against a JSON document")
        .override_usage(
            "\
  jpq exec <QUERY> <DOC>
  jpq exec <QUERY> <DOC> --match
  jpq exec <QUERY> - < doc.json",
        )
        .after_help(
            r#"EXAMPLES:
  jpq exec query.jpq doc.json                 # all items as a JSON array
  jpq exec query.jpq doc.json --first         # first item or null
  jpq exec query.jpq doc.json --match         # predicate result: true, false or null
  jpq exec query.jpq doc.json --vars v.json   # late-bound $variables
  jpq exec query.jpq doc.json --trace         # trace to stderr"#,
        )
        .arg(query_path_arg())
        .arg(doc_path_arg().required(true))
        .arg(vars_arg())
        .arg(lenient_arg())
        .arg(fuel_arg())
        .arg(depth_arg())
        .arg(exists_arg())
        .arg(match_arg())
        .arg(first_arg())
        .arg(trace_arg())
        .arg(compact_arg())
        .arg(color_arg());

    with_hidden_index_args(cmd)
}

/// Extract index entries from a compiled query.
pub fn index_command() -> Command {
    Command::new("index")
        .about("Show the index entries and formula of a compiled query")
        .after_help(
            r#"EXAMPLES:
  jpq index query.jpq                         # full-key entries
  jpq index query.jpq --scheme hash-chain     # path hashes
  jpq index query.jpq --strategy exists      # for existence tests
  jpq index query.jpq doc.json                # also check a document"#,
        )
        .arg(query_path_arg())
        .arg(doc_path_arg())
        .arg(scheme_arg())
        .arg(strategy_arg())
        .arg(json_arg())
        .arg(depth_arg())
}

/// Extract index entries from a document.
pub fn entries_command() -> Command {
    Command::new("entries")
        .about("Show the index entries of a JSON document")
        .arg(doc_path_arg().required(true))
        .arg(scheme_arg())
        .arg(json_arg())
}
