//! Structure source resolution with mirror fallback.
//!
//! A caller-provided file reference wins and is returned verbatim. An
//! identifier is probed against the backend's file endpoint once; if the
//! backend has it, that endpoint is the source, otherwise the public
//! mirror URL is. A failed probe is an expected outcome, not an error, so
//! it is logged at debug level and recorded in [`SourceOrigin`].

use std::fmt;

use crate::endpoints::Endpoints;
use crate::error::ExplorerError;
use crate::options::BackendOptions;
use crate::request::LoadRequest;

/// Result of a lightweight existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The resource exists (2xx).
    Found,
    /// The server answered with a non-success status.
    Missing(u16),
    /// No answer: DNS, connection, TLS, timeout.
    Unreachable(String),
}

/// Checks whether a URL can be downloaded without downloading it.
#[allow(async_fn_in_trait)]
pub trait SourceProbe {
    /// Probe `url` once. Must not retry.
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

impl<P: SourceProbe> SourceProbe for &P {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        (**self).probe(url).await
    }
}

/// Why the mirror was used instead of the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The backend answered with this status.
    NotFound(u16),
    /// The backend could not be reached.
    Unreachable(String),
}

/// Where a [`ResolvedSource`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// The request's file reference, untouched.
    Provided,
    /// The backend's file endpoint, confirmed by the probe.
    Backend,
    /// The public mirror, after the probe failed.
    Mirror(FallbackReason),
}

/// A concrete URL to load, valid for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    url: String,
    origin: SourceOrigin,
}

impl ResolvedSource {
    /// Construct a source.
    #[must_use]
    pub fn new(url: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            url: url.into(),
            origin,
        }
    }

    /// The URL to download.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// How the URL was chosen.
    #[must_use]
    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// Whether the mirror fallback was taken.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, SourceOrigin::Mirror(_))
    }
}

impl fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Turns a [`LoadRequest`] into a [`ResolvedSource`].
pub struct SourceResolver<P> {
    probe: P,
    endpoints: Endpoints,
}

impl<P: SourceProbe> SourceResolver<P> {
    /// Build a resolver from backend options.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Config`] if the backend options are
    /// invalid.
    pub fn new(backend: &BackendOptions, probe: P) -> Result<Self, ExplorerError> {
        Ok(Self::with_endpoints(backend.endpoints()?, probe))
    }

    /// Build a resolver from already parsed endpoints.
    #[must_use]
    pub fn with_endpoints(endpoints: Endpoints, probe: P) -> Self {
        Self { probe, endpoints }
    }

    /// The endpoints URLs are built from.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolve `request` to a URL, probing the backend at most once.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::InvalidRequest`] without any network
    /// activity when the request has neither input.
    pub async fn resolve(
        &self,
        request: &LoadRequest,
    ) -> Result<ResolvedSource, ExplorerError> {
        if let Some(file) = request.file_reference() {
            return Ok(ResolvedSource::new(file, SourceOrigin::Provided));
        }
        let Some(id) = request.identifier() else {
            return Err(ExplorerError::InvalidRequest);
        };

        let preferred = self.endpoints.structure_file(id);
        let reason = match self.probe.probe(&preferred).await {
            ProbeOutcome::Found => {
                return Ok(ResolvedSource::new(
                    preferred,
                    SourceOrigin::Backend,
                ));
            }
            ProbeOutcome::Missing(status) => FallbackReason::NotFound(status),
            ProbeOutcome::Unreachable(why) => FallbackReason::Unreachable(why),
        };

        let mirror = self.endpoints.mirror(id);
        log::debug!("backend has no file for {id} ({reason:?}); using {mirror}");
        Ok(ResolvedSource::new(mirror, SourceOrigin::Mirror(reason)))
    }
}
