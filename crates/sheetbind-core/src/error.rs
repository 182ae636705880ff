//! Error types for sheetbind core.

use thiserror::Error;

use sheetbind_engine::engine::EngineError;

/// Errors returned by workspace, document and storage operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Storage { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No open document named '{0}'")]
    NoSuchDocument(String),

    #[error("A document named '{0}' is already open")]
    DuplicateDocument(String),

    #[error("No object '{object}' in document '{document}'")]
    NoSuchObject { document: String, object: String },

    #[error("Document '{document}' already has an object named '{object}'")]
    DuplicateObject { document: String, object: String },

    #[error("'{0}' is not a sheet")]
    NotASheet(String),

    #[error("'{0}' is not a feature")]
    NotAFeature(String),

    #[error("'{object}' has no property '{property}'")]
    NoSuchProperty { object: String, property: String },

    #[error("Label '{0}' is already in use")]
    DuplicateLabel(String),

    #[error("Invalid label: '{0}'")]
    InvalidLabel(String),

    #[error("Invalid property name: '{0}'")]
    InvalidProperty(String),

    #[error("No file path set")]
    NoFilePath,
}

impl CoreError {
    /// The engine error kind, if this wraps an engine error.
    pub fn engine_kind(&self) -> Option<sheetbind_engine::engine::ErrorKind> {
        match self {
            CoreError::Engine(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
