//! sheetbind-core - Documents, workspace and storage on top of the engine.

pub mod config;
pub mod document;
pub mod error;
pub mod storage;
pub mod workspace;

pub use config::Settings;
pub use document::{
    BindingStatus, Cell, CellContent, Document, Feature, Formula, NodeKey, NodeRef, NodeState,
    Object, Property, Sheet,
};
pub use error::{CoreError, Result};
pub use workspace::{EditOutcome, RecomputeReport, Workspace};

pub use sheetbind_engine::engine::{CellAddress, EngineError, ErrorKind, Value};
