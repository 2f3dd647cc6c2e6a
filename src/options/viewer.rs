use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::Rgb;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Viewer", inline)]
#[serde(default)]
/// Values forwarded to the rendering engine.
///
/// `trajectory_format` and `preset` are opaque to this crate; they are
/// passed through to the engine untouched.
pub struct ViewerOptions {
    /// Format name handed to the engine's trajectory parser.
    #[schemars(title = "Trajectory Format")]
    pub trajectory_format: String,
    /// Visual preset name applied after parsing.
    #[schemars(title = "Preset")]
    pub preset: String,
    /// RGB background used in dark mode.
    #[schemars(skip)]
    pub dark_background: Rgb,
    /// RGB background used in light mode.
    #[schemars(skip)]
    pub light_background: Rgb,
    /// Whether the first session starts with the dark background.
    #[schemars(title = "Start Dark")]
    pub start_dark: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            trajectory_format: "mmcif".to_owned(),
            preset: "default".to_owned(),
            dark_background: [0.0, 0.0, 0.0],
            light_background: [1.0, 1.0, 1.0],
            start_dark: true,
        }
    }
}

impl ViewerOptions {
    /// Background color for the given mode.
    #[must_use]
    pub fn background(&self, dark: bool) -> Rgb {
        if dark {
            self.dark_background
        } else {
            self.light_background
        }
    }
}
