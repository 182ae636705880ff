//! Workspace settings loaded from TOML.

use serde::Deserialize;
use std::path::Path;

use crate::error::{CoreError, Result};
use sheetbind_engine::engine::MAX_DEPENDENCY_RANGE_CELLS;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Ranges with more cells than this depend only on their occupied cells.
    pub max_range_cells: usize,
    /// Recompute a document's bindings as soon as it is opened.
    pub recompute_on_open: bool,
    /// Decimal digits used when displaying numbers; `None` prints them in full.
    pub precision: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_range_cells: MAX_DEPENDENCY_RANGE_CELLS,
            recompute_on_open: true,
            precision: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Settings> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        if settings.max_range_cells == 0 {
            return Err(CoreError::Config(
                "max_range_cells must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> Result<Settings> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(CoreError::Config(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CoreError::Config(message) => {
                CoreError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }
}
