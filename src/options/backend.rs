use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::endpoints::Endpoints;
use crate::error::ExplorerError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Backend", inline)]
#[serde(default)]
/// Where structures are looked up and downloaded from.
pub struct BackendOptions {
    /// Base URL of the structure backend; `/structures/{id}` hangs off it.
    #[schemars(title = "Backend URL")]
    pub base_url: String,
    /// Public mirror URL with an `{id}` placeholder for the upper-cased
    /// identifier.
    #[schemars(title = "Mirror Template")]
    pub mirror_template: String,
    /// Timeout for the existence probe, in seconds.
    #[schemars(title = "Probe Timeout", range(min = 1, max = 60), extend("step" = 1))]
    pub probe_timeout_secs: u64,
    /// Timeout for metadata and structure downloads, in seconds.
    #[schemars(title = "Request Timeout", range(min = 1, max = 600), extend("step" = 1))]
    pub request_timeout_secs: u64,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_owned(),
            mirror_template: "https://files.rcsb.org/download/{id}.cif"
                .to_owned(),
            probe_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl BackendOptions {
    /// Parse the configured addresses into [`Endpoints`].
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Config`] if the base URL does not parse or
    /// the mirror template has no `{id}` placeholder.
    pub fn endpoints(&self) -> Result<Endpoints, ExplorerError> {
        Endpoints::new(&self.base_url, &self.mirror_template)
    }
}
