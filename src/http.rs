//! Blocking backend client on `ureq`.
//!
//! Used by the CLI and the headless engine. The probe issues one `HEAD`
//! request with the short probe timeout; metadata and greeting requests use
//! the longer request timeout. The client blocks the calling thread, which
//! is fine under `pollster` but not on a browser event loop; the `web`
//! feature probes with `fetch` instead.

use std::time::Duration;

use ureq::Agent;

use crate::endpoints::Endpoints;
use crate::error::ExplorerError;
use crate::metadata::{Greeting, StructureMetadata};
use crate::options::BackendOptions;
use crate::resolver::{ProbeOutcome, SourceProbe};

/// An agent whose every request gives up after `secs` seconds.
pub(crate) fn agent_with_timeout(secs: u64) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(secs)))
        .build();
    config.into()
}

/// GET `url` and read the body as text.
pub(crate) fn get_text(agent: &Agent, url: &str) -> Result<String, ureq::Error> {
    agent.get(url).call()?.into_body().read_to_string()
}

fn probe_outcome<T>(result: Result<T, ureq::Error>) -> ProbeOutcome {
    match result {
        Ok(_) => ProbeOutcome::Found,
        Err(ureq::Error::StatusCode(status)) => ProbeOutcome::Missing(status),
        Err(e) => ProbeOutcome::Unreachable(e.to_string()),
    }
}

/// Client for the structure backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    endpoints: Endpoints,
    probe_agent: Agent,
    agent: Agent,
}

impl BackendClient {
    /// Build a client from backend options.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Config`] if the configured addresses are
    /// invalid.
    pub fn new(options: &BackendOptions) -> Result<Self, ExplorerError> {
        Ok(Self {
            endpoints: options.endpoints()?,
            probe_agent: agent_with_timeout(options.probe_timeout_secs),
            agent: agent_with_timeout(options.request_timeout_secs),
        })
    }

    /// The endpoints requests are sent to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `HEAD url`, once, without retry.
    #[must_use]
    pub fn check(&self, url: &str) -> ProbeOutcome {
        probe_outcome(self.probe_agent.head(url).call())
    }

    /// `GET {base}/structures/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Http`] on transport failure, a non-success
    /// status or a malformed body.
    pub fn fetch_metadata(
        &self,
        id: &str,
    ) -> Result<StructureMetadata, ExplorerError> {
        let url = self.endpoints.structure(id);
        let body = get_text(&self.agent, &url)
            .map_err(|e| ExplorerError::Http(format!("{url}: {e}")))?;
        StructureMetadata::from_json(&body)
    }

    /// `GET {base}/hello`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Http`] if the backend is unreachable or
    /// answers with something other than a greeting.
    pub fn hello(&self) -> Result<Greeting, ExplorerError> {
        let url = self.endpoints.hello();
        let body = get_text(&self.agent, &url)
            .map_err(|e| ExplorerError::Http(format!("{url}: {e}")))?;
        Greeting::from_json(&body)
    }
}

impl SourceProbe for BackendClient {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let outcome = self.check(url);
        log::debug!("probe {url}: {outcome:?}");
        outcome
    }
}
