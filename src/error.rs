//! Crate-level error types.

use std::fmt;

/// Errors produced by the protein-explorer crate.
///
/// Falling back to the public mirror when the backend has no file is not an
/// error; see [`SourceOrigin`](crate::resolver::SourceOrigin).
#[derive(Debug)]
pub enum ExplorerError {
    /// Neither an identifier nor a file reference was supplied.
    InvalidRequest,
    /// The rendering engine could not bind to the screen region.
    Initialization(String),
    /// Download, parse, or preset application failed for a resolved source.
    Load(String),
    /// Tearing down a session failed. Logged, never surfaced to view state.
    Disposal(String),
    /// Invalid configuration (backend base URL, mirror template).
    Config(String),
    /// Backend request failure outside the viewer path (metadata, greeting).
    Http(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest => {
                write!(f, "neither a PDB identifier nor a file URL was given")
            }
            Self::Initialization(msg) => {
                write!(f, "viewer initialization failed: {msg}")
            }
            Self::Load(msg) => write!(f, "structure load failed: {msg}"),
            Self::Disposal(msg) => write!(f, "viewer disposal failed: {msg}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Http(msg) => write!(f, "backend request failed: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
