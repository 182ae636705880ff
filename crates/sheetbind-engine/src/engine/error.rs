//! Error kinds raised by the engine.
//!
//! Structural, alias and parse errors are returned from the call that would cause them.
//! Cycle, resolution and evaluation errors are produced during recompute and stored in the
//! node state, which is why the type is `Clone + PartialEq`.

use std::ops::Range;

use thiserror::Error;

use super::address::CellAddress;

/// Byte range of the offending text inside an expression source.
pub type Span = Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("Address out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Alias '{name}' is already bound to {existing}")]
    AmbiguousAlias { name: String, existing: CellAddress },

    #[error("'{0}' is reserved and cannot be used as an alias")]
    ReservedName(String),

    #[error("'{0}' is not a valid alias name")]
    InvalidName(String),

    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    #[error("Parse error at {}..{}: {message}", span.start, span.end)]
    Parse { message: String, span: Span },

    #[error("Circular dependency detected: {0}")]
    CyclicDependency(String),

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

/// Fieldless discriminant of [`EngineError`], convenient for matching in callers and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAddress,
    OutOfBounds,
    AmbiguousAlias,
    ReservedName,
    InvalidName,
    UnknownAlias,
    Parse,
    CyclicDependency,
    UnresolvedReference,
    Evaluation,
}

impl EngineError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        EngineError::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            EngineError::OutOfBounds(_) => ErrorKind::OutOfBounds,
            EngineError::AmbiguousAlias { .. } => ErrorKind::AmbiguousAlias,
            EngineError::ReservedName(_) => ErrorKind::ReservedName,
            EngineError::InvalidName(_) => ErrorKind::InvalidName,
            EngineError::UnknownAlias(_) => ErrorKind::UnknownAlias,
            EngineError::Parse { .. } => ErrorKind::Parse,
            EngineError::CyclicDependency(_) => ErrorKind::CyclicDependency,
            EngineError::UnresolvedReference(_) => ErrorKind::UnresolvedReference,
            EngineError::Evaluation(_) => ErrorKind::Evaluation,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
