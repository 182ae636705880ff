//! The set of open documents and every operation that spans them.
//!
//! All methods run to completion before returning: mutations re-register dependency edges,
//! mark affected nodes dirty, and leave recomputation to the next read or to an explicit
//! [`Workspace::recompute`].

mod graph;
mod io;
mod ops;
mod recompute;
mod rename;
mod resolve;
mod structure;

use crate::config::Settings;
use crate::document::{Document, Formula, NodeRef};
use crate::error::{CoreError, Result};
use sheetbind_engine::engine::EngineError;

/// Result of an edit that stored an expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditOutcome {
    /// The dependency cycle the edit closed, if any. The edit is kept either way.
    pub cycle: Option<Vec<NodeRef>>,
}

impl EditOutcome {
    pub fn is_cyclic(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Summary of an explicit recompute pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecomputeReport {
    /// Number of nodes recomputed.
    pub evaluated: usize,
    /// Nodes that ended in the error state.
    pub errors: Vec<(NodeRef, EngineError)>,
}

#[derive(Debug, Default)]
pub struct Workspace {
    documents: Vec<Document>,
    settings: Settings,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Workspace {
            documents: Vec::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Names of the open documents, in the order they were opened.
    pub fn document_names(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.name()).collect()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, name: &str) -> Result<&Document> {
        self.doc_index(name).map(|i| &self.documents[i])
    }

    /// Index of the open document called `name`.
    fn doc_index(&self, name: &str) -> Result<usize> {
        self.documents
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| CoreError::NoSuchDocument(name.to_string()))
    }

    fn doc_by_name(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name() == name)
    }

    fn doc_by_name_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.name() == name)
    }

    pub(crate) fn formula(&self, node: &NodeRef) -> Option<&Formula> {
        self.doc_by_name(&node.document)?.formula(&node.key)
    }

    pub(crate) fn formula_mut(&mut self, node: &NodeRef) -> Option<&mut Formula> {
        self.doc_by_name_mut(&node.document)?.formula_mut(&node.key)
    }

    /// Every expression-bound node in every open document.
    pub(crate) fn formula_nodes(&self) -> Vec<NodeRef> {
        self.documents
            .iter()
            .flat_map(|d| d.formulas().into_iter().map(|(node, _)| node))
            .collect()
    }
}
