mod cli;
mod commands;

use cli::{
    CompileParams, DumpParams, EntriesParams, ExecParams, IndexParams, RenderParams, build_cli,
};

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("compile", m)) => {
            let params = CompileParams::from_matches(m);
            commands::compile::run(params.into());
        }
        Some(("render", m)) => {
            let params = RenderParams::from_matches(m);
            commands::render::run(params.into());
        }
        Some(("dump", m)) => {
            let params = DumpParams::from_matches(m);
            commands::dump::run(params.into());
        }
        Some(("exec", m)) => {
            let params = ExecParams::from_matches(m);
            commands::exec::run(params.into());
        }
        Some(("index", m)) => {
            let params = IndexParams::from_matches(m);
            commands::index::run(params.into());
        }
        Some(("entries", m)) => {
            let params = EntriesParams::from_matches(m);
            commands::entries::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
