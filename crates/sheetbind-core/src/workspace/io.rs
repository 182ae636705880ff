//! Opening, saving and closing documents.

use std::path::{Path, PathBuf};

use tracing::info;

use super::Workspace;
use crate::document::Document;
use crate::error::{CoreError, Result};
use crate::storage::{parse_document, write_document};

impl Workspace {
    /// Create an empty, unsaved document.
    pub fn new_document(&mut self, name: &str) -> Result<()> {
        if self.find_document(name).is_some() {
            return Err(CoreError::DuplicateDocument(name.to_string()));
        }
        self.documents.push(Document::new(name));
        self.after_edit(Vec::new());
        Ok(())
    }

    /// Open a document file, returning its name (the file stem).
    ///
    /// References between the new document and those already open are re-resolved, and
    /// qualifiers that only resolve through a saved link are rewritten to current labels.
    pub fn open_document(&mut self, path: &Path) -> Result<String> {
        let document = parse_document(path)?;
        let name = document.name().to_string();
        if self.find_document(&name).is_some() {
            return Err(CoreError::DuplicateDocument(name));
        }
        self.documents.push(document);

        let touched = match self.sync_links() {
            Ok(touched) => touched,
            Err(e) => {
                self.documents.pop();
                return Err(e);
            }
        };
        self.after_edit(touched);
        info!(document = %name, path = %path.display(), "opened document");

        if self.settings.recompute_on_open {
            self.recompute_document(&name)?;
        }
        Ok(name)
    }

    /// Save a document to the path it was opened from or last saved to.
    pub fn save_document(&mut self, name: &str) -> Result<PathBuf> {
        let index = self.doc_index(name)?;
        let Some(path) = self.documents[index].file_path.clone() else {
            return Err(CoreError::NoFilePath);
        };
        write_document(&path, &self.documents[index])?;
        self.documents[index].modified = false;
        info!(document = %name, path = %path.display(), "saved document");
        Ok(path)
    }

    /// Save a document to `path` and remember it for later saves. The document keeps its
    /// name for the rest of the session.
    pub fn save_document_as(&mut self, name: &str, path: &Path) -> Result<()> {
        let index = self.doc_index(name)?;
        self.documents[index].file_path = Some(path.to_path_buf());
        self.save_document(name)?;
        Ok(())
    }

    /// Close a document. References into it from other documents keep their text, become
    /// unresolved and are marked dirty along with their dependents.
    pub fn close_document(&mut self, name: &str) -> Result<()> {
        let index = self.doc_index(name)?;
        self.documents.remove(index);
        // Readers of the closed document lose those edges, so the rebuild reports them.
        self.after_edit(Vec::new());
        info!(document = %name, "closed document");
        Ok(())
    }
}
