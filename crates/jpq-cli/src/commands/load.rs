//! Reading compiled queries, parse trees and documents from disk or stdin.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use jpq_bytecode::{CompiledQuery, DecodeError};
use jpq_compiler::ParseNode;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid compiled query '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("'{}' must hold a JSON object of variable values", .0.display())]
    NotAnObject(PathBuf),

    #[error("cannot read both the query and the document from stdin")]
    StdinTwice,
}

/// Raw bytes of `path`; `-` reads stdin.
pub fn read_input(path: &Path) -> Result<Vec<u8>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    if is_stdin(path) {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).map_err(io_err)?;
        return Ok(buf);
    }
    fs::read(path).map_err(io_err)
}

pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

pub fn load_query(path: &Path) -> Result<CompiledQuery, LoadError> {
    let bytes = read_input(path)?;
    CompiledQuery::from_bytes(bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_tree(path: &Path) -> Result<ParseNode, LoadError> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Variable bindings: a JSON object keyed by variable name.
pub fn load_vars(path: &Path) -> Result<Map<String, Value>, LoadError> {
    match load_json(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(LoadError::NotAnObject(path.to_path_buf())),
    }
}

/// Print `error: {err}` and exit with status 1.
pub fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", err);
    std::process::exit(1);
}
