//! Backend metadata payloads.
//!
//! `GET {base}/structures/{id}` answers with a small JSON object describing
//! one structure; `GET {base}/hello` answers with a greeting used as a
//! liveness check. Both are parsed leniently: unknown fields are ignored
//! and `chains` may be a list or an already joined string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;
use crate::request::LoadRequest;

/// Chain identifiers of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Chains {
    /// One entry per chain.
    List(Vec<String>),
    /// A pre-formatted string.
    Joined(String),
}

impl Default for Chains {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl fmt::Display for Chains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(chains) => f.write_str(&chains.join(", ")),
            Self::Joined(chains) => f.write_str(chains),
        }
    }
}

/// Metadata for one structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructureMetadata {
    /// Canonical identifier, as the backend spells it.
    #[serde(alias = "id")]
    pub pdb_id: String,
    /// Human-readable title.
    pub title: String,
    /// Chain identifiers.
    pub chains: Chains,
    /// File format name (e.g. `mmCIF`).
    pub format: String,
    /// Direct download URL, when the backend can serve the file.
    pub file_url: Option<String>,
}

impl StructureMetadata {
    /// Parse a metadata response body.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Http`] if `body` is not a metadata object.
    pub fn from_json(body: &str) -> Result<Self, ExplorerError> {
        serde_json::from_str(body).map_err(|e| {
            ExplorerError::Http(format!("malformed structure metadata: {e}"))
        })
    }

    /// A request that loads this structure from its `fileUrl`, or `None`
    /// when the backend gave no file to view.
    #[must_use]
    pub fn load_request(&self) -> Option<LoadRequest> {
        let request = LoadRequest::new(self.file_url.as_deref(), None);
        request.is_valid().then_some(request)
    }
}

impl fmt::Display for StructureMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PDB ID: {}", self.pdb_id)?;
        writeln!(f, "Title:  {}", self.title)?;
        writeln!(f, "Chains: {}", self.chains)?;
        write!(f, "Format: {}", self.format)
    }
}

/// Response of the backend's greeting endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    /// Greeting text.
    pub message: String,
}

impl Greeting {
    /// Parse a greeting response body.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Http`] if `body` has no `message`.
    pub fn from_json(body: &str) -> Result<Self, ExplorerError> {
        serde_json::from_str(body)
            .map_err(|e| ExplorerError::Http(format!("malformed greeting: {e}")))
    }
}
