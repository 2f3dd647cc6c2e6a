// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Session futures hold `Rc` state; everything runs on one executor thread.
#![allow(clippy::future_not_send)]

//! Viewer session lifecycle for embedding 3D protein structures in a page.
//!
//! A user types a PDB identifier (or the page already has a file URL); this
//! crate decides where the structure bytes come from, owns one embedded
//! rendering engine bound to one screen region, loads the structure into
//! it, keeps it redrawn on resize, and tears everything down when the
//! input changes or the view goes away.
//!
//! # Key entry points
//!
//! - [`controller::SessionController`] - the lifecycle state machine; call
//!   [`start`](controller::SessionController::start) on mount or input
//!   change and [`dispose`](controller::SessionController::dispose) on
//!   unmount
//! - [`resolver::SourceResolver`] - turns a [`request::LoadRequest`] into a
//!   URL, falling back to the public mirror when the backend has no file
//! - [`engine`] - the capability surface a rendering engine implements
//! - [`options::Options`] - backend address, engine presets, control policy
//!
//! # Architecture
//!
//! All work is cooperative and single-threaded. Every load attempt is tagged
//! with a [`controller::Generation`]; before any result is applied the
//! controller compares it against the current generation and discards stale
//! work, disposing whatever session the stale attempt created. In-flight
//! downloads are never aborted, only their effects are suppressed.

pub mod controller;
pub mod endpoints;
pub mod engine;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod metadata;
pub mod options;
pub mod region;
pub mod request;
pub mod resolver;
pub mod session;
pub mod util;
#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{
    ControllerBuilder, Generation, LoadOutcome, Phase, SessionController,
    ViewState,
};
pub use error::ExplorerError;
pub use options::Options;
pub use region::{Region, RegionSize};
pub use request::LoadRequest;
pub use resolver::{ResolvedSource, SourceResolver};
pub use session::ViewerSession;
