use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = DmaMapError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum DmaMapError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Mapping header is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Mapping row on line {line} has no '{column}' field")]
    MissingField { line: u64, column: String },

    #[error("Invalid DMA identifier {value:?} on line {line}: {source}")]
    InvalidIdentifier {
        line: u64,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Feature collection must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("'features' must be an array, found {0}")]
    FeaturesNotArray(&'static str),

    #[error("Feature at index {index} must be a JSON object, found {found}")]
    FeatureNotObject { index: usize, found: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DmaMapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DmaMapError::Io {
            path: path.into(),
            source,
        }
    }
}

/// JSON type name used in shape errors.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
