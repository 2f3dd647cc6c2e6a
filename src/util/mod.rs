//! Shared utilities for the session layer.
//!
//! Keyed listener registration used by screen regions (resize
//! notifications) and the controller (view-state subscriptions).

pub mod listeners;
