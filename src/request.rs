//! The user's intent to view one structure.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExplorerError;

/// An immutable `{ file_reference?, identifier? }` pair.
///
/// Blank strings count as absent. Equality is content equality; a request
/// that compares equal to the previous one does not need a new generation.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    #[serde(default, deserialize_with = "deserialize_non_blank")]
    file_reference: Option<String>,
    #[serde(default, deserialize_with = "deserialize_non_blank")]
    identifier: Option<String>,
}

impl LoadRequest {
    /// Build a request from both optional inputs.
    #[must_use]
    pub fn new(
        file_reference: Option<&str>,
        identifier: Option<&str>,
    ) -> Self {
        Self {
            file_reference: non_blank(file_reference),
            identifier: non_blank(identifier),
        }
    }

    /// Request a structure by direct URL (or path).
    #[must_use]
    pub fn from_file(file_reference: &str) -> Self {
        Self::new(Some(file_reference), None)
    }

    /// Request a structure by lookup identifier (e.g. a PDB ID).
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        Self::new(None, Some(identifier))
    }

    /// The direct file reference, if any.
    #[must_use]
    pub fn file_reference(&self) -> Option<&str> {
        self.file_reference.as_deref()
    }

    /// The lookup identifier, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Whether at least one input is present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.file_reference.is_some() || self.identifier.is_some()
    }

    /// Check the request before any session or network work starts.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::InvalidRequest`] when both inputs are
    /// absent.
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ExplorerError::InvalidRequest)
        }
    }
}

fn deserialize_non_blank<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(non_blank(raw.as_deref()))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}
