use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What the background toggle does when no session is live.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TogglePolicy {
    /// Only toggle while an initialized session of the current generation
    /// exists; otherwise the flag stays unchanged.
    #[default]
    LiveSession,
    /// Always flip the flag; a later session starts with the new
    /// background.
    Optimistic,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[schemars(title = "Controls", inline)]
#[serde(default)]
/// Behavior of the user-facing view controls.
pub struct ControlOptions {
    /// Background toggle policy.
    #[schemars(title = "Background Toggle")]
    pub background_toggle: TogglePolicy,
}
