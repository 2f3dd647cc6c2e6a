use std::fmt;

use serde::Serialize;

use crate::error::ExplorerError;
use crate::resolver::ResolvedSource;

/// Monotonically increasing token tagging one attempt to satisfy a
/// [`LoadRequest`](crate::request::LoadRequest).
///
/// Only work tagged with the controller's current generation may touch
/// view state or the live session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
)]
pub struct Generation(u64);

impl Generation {
    /// The generation before any request.
    pub const ZERO: Self = Self(0);

    /// The following generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No request yet.
    #[default]
    Idle,
    /// A generation is initializing, resolving or loading.
    Loading,
    /// The current generation's structure is displayed.
    Ready,
    /// The current generation failed; see the error message.
    Error,
    /// The owning view was removed. Terminal.
    Disposed,
}

/// Reactive readout for the surrounding UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Current phase.
    pub phase: Phase,
    /// Whether the dark background is selected.
    pub background_is_dark: bool,
    /// Human-readable failure, present only in [`Phase::Error`].
    pub error_message: Option<String>,
}

impl ViewState {
    pub(crate) const fn new(background_is_dark: bool) -> Self {
        Self {
            phase: Phase::Idle,
            background_is_dark,
            error_message: None,
        }
    }

    /// Text for the loading/error overlay, if one should be shown.
    #[must_use]
    pub fn overlay_text(&self) -> Option<String> {
        match self.phase {
            Phase::Loading => Some("Loading 3D view…".to_owned()),
            Phase::Error => Some(format!(
                "Error: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            )),
            Phase::Idle | Phase::Ready | Phase::Disposed => None,
        }
    }

    /// Caption for the background toggle button.
    #[must_use]
    pub const fn background_label(&self) -> &'static str {
        if self.background_is_dark {
            "Light background"
        } else {
            "Dark background"
        }
    }
}

/// How one call to [`start`](super::SessionController::start) ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The structure is displayed.
    Ready {
        /// The generation that finished.
        generation: Generation,
        /// Where the structure came from.
        source: ResolvedSource,
    },
    /// The generation failed and view state shows the error.
    Failed {
        /// The generation that failed.
        generation: Generation,
        /// The failure shown to the user.
        error: ExplorerError,
    },
    /// A newer generation started first; nothing was applied.
    Superseded {
        /// The stale generation.
        generation: Generation,
    },
    /// The controller was already disposed.
    Rejected,
}

impl LoadOutcome {
    /// The generation this outcome belongs to.
    #[must_use]
    pub const fn generation(&self) -> Option<Generation> {
        match self {
            Self::Ready { generation, .. }
            | Self::Failed { generation, .. }
            | Self::Superseded { generation } => Some(*generation),
            Self::Rejected => None,
        }
    }

    /// Whether the structure ended up displayed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
