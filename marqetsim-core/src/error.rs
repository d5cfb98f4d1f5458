//! Error types.

use std::io;
use std::num::{ParseFloatError, ParseIntError};

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(String),

    #[error("yaml deserialization error: {0}")]
    YamlDeserError(#[from] serde_yaml::Error),
    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),
    #[error("unsupported manifest format: {0} (use .yaml, .yml or .toml)")]
    UnsupportedManifestFormat(String),

    #[error("failed parsing int: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("failed parsing float: {0}")]
    ParseFloatError(#[from] ParseFloatError),

    #[error("manifest validation failed: missing required field: {0}")]
    MissingField(&'static str),
    #[error("manifest validation failed: invalid field \"{0}\": {1}")]
    InvalidField(&'static str, String),
    #[error("manifest validation failed: unknown field \"{0}\"{1}")]
    UnknownField(String, String),
    #[error("agent profile file not found: {0}")]
    AgentFileNotFound(String),

    #[error("engine failure: {0}")]
    EngineFailure(String),
    #[error("engine returned rows with inconsistent columns: {0}")]
    InconsistentRows(String),

    #[error("result file is empty: {0}")]
    EmptyResultFile(String),
    #[error("malformed result file: {0}: row {1} has {2} cells, header has {3}")]
    MalformedResultFile(String, usize, usize, usize),
    #[error("result file has unterminated quoted field: {0}")]
    UnterminatedQuote(String),

    #[error(
        "result schema mismatch: \"{0}\" has columns {1:?} but \"{2}\" has columns {3:?}"
    )]
    SchemaMismatch(String, Vec<String>, String, Vec<String>),
    #[error("no result files provided")]
    NoInputFiles,

    #[error("other error: {0}")]
    Other(String),
}
