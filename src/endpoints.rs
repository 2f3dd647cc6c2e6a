//! Concrete URLs derived from the injected backend configuration.
//!
//! The backend exposes `GET {base}/structures/{id}` (metadata),
//! `HEAD|GET {base}/structures/{id}/file` (structure bytes) and
//! `GET {base}/hello`. Identifiers are pushed as single, percent-encoded
//! path segments, so `"1a3n"` stays `1a3n` while `"a/b"` cannot escape
//! its segment. The mirror template gets the same treatment.

use url::Url;

use crate::error::ExplorerError;

/// Placeholder substituted in the mirror template.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Parsed backend base URL plus the public mirror template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
    mirror_template: String,
}

impl Endpoints {
    /// Parse and validate a base URL and mirror template.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Config`] if `base_url` is not an absolute
    /// URL that can carry a path, or `mirror_template` lacks `{id}`.
    pub fn new(
        base_url: &str,
        mirror_template: &str,
    ) -> Result<Self, ExplorerError> {
        let base = Url::parse(base_url).map_err(|e| {
            ExplorerError::Config(format!("invalid backend URL {base_url}: {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(ExplorerError::Config(format!(
                "backend URL {base_url} cannot carry a path"
            )));
        }
        if !mirror_template.contains(ID_PLACEHOLDER) {
            return Err(ExplorerError::Config(format!(
                "mirror template {mirror_template} has no {ID_PLACEHOLDER} \
                 placeholder"
            )));
        }
        Ok(Self {
            base,
            mirror_template: mirror_template.to_owned(),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Metadata endpoint for `id`.
    #[must_use]
    pub fn structure(&self, id: &str) -> String {
        self.join(&["structures", id])
    }

    /// Preferred download (and probe) endpoint for `id`.
    #[must_use]
    pub fn structure_file(&self, id: &str) -> String {
        self.join(&["structures", id, "file"])
    }

    /// Backend greeting endpoint.
    #[must_use]
    pub fn hello(&self) -> String {
        self.join(&["hello"])
    }

    /// Public mirror URL for `id`, upper-cased and percent-encoded.
    #[must_use]
    pub fn mirror(&self, id: &str) -> String {
        let id = id.to_uppercase();
        self.mirror_template
            .replace(ID_PLACEHOLDER, &urlencoding::encode(&id))
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        // Checked in `new`: the base always carries a path.
        if let Ok(mut path) = url.path_segments_mut() {
            let _ = path.pop_if_empty().extend(segments);
        }
        url.into()
    }
}
