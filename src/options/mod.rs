//! Centralized configuration with TOML preset support.
//!
//! The backend address, the mirror fallback, the engine's format/preset
//! strings and the control policy are consolidated here and injected into
//! the resolver and controller at construction time. Options serialize
//! to/from TOML so a deployment can point at a different backend without a
//! rebuild.

mod backend;
mod controls;
mod viewer;

use std::path::Path;

pub use backend::BackendOptions;
pub use controls::{ControlOptions, TogglePolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use viewer::ViewerOptions;

use crate::error::ExplorerError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[backend]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Backend and mirror addresses.
    pub backend: BackendOptions,
    /// Engine format, preset and background colors.
    pub viewer: ViewerOptions,
    /// View control behavior.
    pub controls: ControlOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Io`] if the file cannot be read and
    /// [`ExplorerError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, ExplorerError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| ExplorerError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::OptionsParse`] if serialization fails and
    /// [`ExplorerError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ExplorerError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ExplorerError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
