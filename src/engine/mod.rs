//! The rendering engine's capability surface.
//!
//! This crate never draws anything itself. A rendering engine (a WebGL
//! plugin in the browser, a wgpu renderer natively, a headless stand-in in
//! tests) plugs in by implementing [`EngineFactory`] and [`EngineHandle`].
//! Only the operations the session lifecycle needs are modelled here:
//! bind to a region, set the background, download, parse, apply a preset,
//! fit the camera, redraw, dispose.
//!
//! Every `async` method is a suspension point at which the controller may
//! start a newer generation. Futures are not required to be `Send`.

#[cfg(feature = "http")]
pub mod headless;

use std::fmt;

use crate::region::Region;

/// Linear RGB color, components in `0.0..=1.0`.
pub type Rgb = [f32; 3];

/// Failure reported by a rendering engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine cannot attach to the region (missing capability, zero
    /// area, lost context).
    Unsupported(String),
    /// The asset could not be downloaded.
    Download(String),
    /// The downloaded data is not valid in the declared format.
    Parse(String),
    /// The visual preset could not be applied.
    Preset(String),
    /// The camera could not be reset.
    Camera(String),
    /// Releasing engine resources failed.
    Disposal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(msg) => write!(f, "engine unavailable: {msg}"),
            Self::Download(msg) => write!(f, "download failed: {msg}"),
            Self::Parse(msg) => write!(f, "parse failed: {msg}"),
            Self::Preset(msg) => write!(f, "preset failed: {msg}"),
            Self::Camera(msg) => write!(f, "camera reset failed: {msg}"),
            Self::Disposal(msg) => write!(f, "dispose failed: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Creates engine instances bound to a screen region.
// Single-threaded: callers never need these futures to be `Send`.
#[allow(async_fn_in_trait)]
pub trait EngineFactory {
    /// The per-session engine instance.
    type Handle: EngineHandle;

    /// Create one engine instance attached to `region`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unsupported`] (or any other variant) if the
    /// engine cannot attach.
    async fn create_session(
        &self,
        region: &Region,
    ) -> Result<Self::Handle, EngineError>;
}

/// One live engine instance.
///
/// Methods take `&self`: an engine is a shared, internally mutable object,
/// so a redraw may be requested while a download is still in flight.
#[allow(async_fn_in_trait)]
pub trait EngineHandle {
    /// Downloaded, not yet parsed data.
    type Data;
    /// A parsed structure trajectory.
    type Trajectory;

    /// Set the clear color.
    fn set_background(&self, color: Rgb);

    /// Download the asset at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Download`] on transport or status failure.
    async fn download_asset(&self, url: &str)
        -> Result<Self::Data, EngineError>;

    /// Parse downloaded data as a trajectory in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] if the data is not valid `format`.
    async fn parse_trajectory(
        &self,
        data: Self::Data,
        format: &str,
    ) -> Result<Self::Trajectory, EngineError>;

    /// Build the representation named `preset` for `trajectory`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Preset`] if the preset cannot be applied.
    async fn apply_default_preset(
        &self,
        trajectory: &Self::Trajectory,
        preset: &str,
    ) -> Result<(), EngineError>;

    /// Fit the camera to the current content.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Camera`] if the camera cannot be reset.
    async fn reset_camera(&self) -> Result<(), EngineError>;

    /// Schedule a redraw.
    fn request_redraw(&self);

    /// Release every GPU/DOM resource held by this instance.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Disposal`] if teardown failed part way. The
    /// caller logs and otherwise ignores it.
    fn dispose(&self) -> Result<(), EngineError>;
}
