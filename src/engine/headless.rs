//! An engine that loads and checks structures without drawing them.
//!
//! Backs the command-line tool: it binds to any non-empty region, fetches
//! `http(s)://` sources with `ureq` and `file://` URLs or plain paths from
//! disk, verifies the text looks like the declared format and counts atom
//! records. Backgrounds, camera resets and redraws are recorded so the
//! final state can be reported.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use ureq::Agent;
use url::Url;

use super::{EngineError, EngineFactory, EngineHandle, Rgb};
use crate::http::{agent_with_timeout, get_text};
use crate::options::BackendOptions;
use crate::region::Region;

/// What a parsed structure contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSummary {
    /// Format the text was parsed as, lower-cased.
    pub format: String,
    /// Number of `ATOM`/`HETATM` records.
    pub atoms: usize,
    /// Number of `data_` blocks (mmCIF) or `MODEL` records (PDB), at
    /// least one.
    pub models: usize,
}

/// Check that `text` is plausible `format` data and count its atoms.
///
/// # Errors
///
/// Returns [`EngineError::Parse`] for unknown formats, mmCIF text without a
/// `data_` block and PDB text without atom records.
pub fn summarize(text: &str, format: &str) -> Result<StructureSummary, EngineError> {
    let format = format.to_ascii_lowercase();
    let mut atoms = 0;
    let mut blocks = 0;
    let mut models = 0;
    for line in text.lines() {
        if line.starts_with("ATOM") || line.starts_with("HETATM") {
            atoms += 1;
        } else if line.starts_with("data_") {
            blocks += 1;
        } else if line.starts_with("MODEL") {
            models += 1;
        }
    }

    let models = match format.as_str() {
        "mmcif" | "cif" => {
            if blocks == 0 {
                return Err(EngineError::Parse(
                    "no data_ block; not mmCIF".to_owned(),
                ));
            }
            blocks
        }
        "pdb" => {
            if atoms == 0 {
                return Err(EngineError::Parse(
                    "no ATOM or HETATM records".to_owned(),
                ));
            }
            models.max(1)
        }
        other => {
            return Err(EngineError::Parse(format!(
                "unsupported format {other:?}"
            )));
        }
    };
    Ok(StructureSummary {
        format,
        atoms,
        models,
    })
}

/// Where a source string points.
fn locate(source: &str) -> Result<Option<PathBuf>, EngineError> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(None),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(Some)
            .map_err(|()| EngineError::Download(format!("bad file URL {source}"))),
        // Windows drive letters parse as a one-letter scheme.
        Ok(url) if url.scheme().len() > 1 => Err(EngineError::Download(
            format!("unsupported scheme in {source}"),
        )),
        _ => Ok(Some(PathBuf::from(source))),
    }
}

/// [`EngineFactory`] for [`HeadlessSession`]s.
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    agent: Agent,
}

impl HeadlessEngine {
    /// Download with the configured request timeout.
    #[must_use]
    pub fn new(backend: &BackendOptions) -> Self {
        Self {
            agent: agent_with_timeout(backend.request_timeout_secs),
        }
    }
}

impl EngineFactory for HeadlessEngine {
    type Handle = HeadlessSession;

    async fn create_session(
        &self,
        region: &Region,
    ) -> Result<HeadlessSession, EngineError> {
        let size = region.size();
        if size.is_empty() {
            return Err(EngineError::Unsupported(format!(
                "region {size} has no area"
            )));
        }
        log::debug!("headless session bound to {size}");
        Ok(HeadlessSession {
            agent: self.agent.clone(),
            background: Cell::new([0.0; 3]),
            structure: RefCell::new(None),
            preset: RefCell::new(None),
            camera_resets: Cell::new(0),
            redraws: Cell::new(0),
            disposed: Cell::new(false),
        })
    }
}

/// One headless engine instance.
#[derive(Debug)]
pub struct HeadlessSession {
    agent: Agent,
    background: Cell<Rgb>,
    structure: RefCell<Option<StructureSummary>>,
    preset: RefCell<Option<String>>,
    camera_resets: Cell<u32>,
    redraws: Cell<u32>,
    disposed: Cell<bool>,
}

impl HeadlessSession {
    /// The displayed structure, once a preset was applied.
    #[must_use]
    pub fn structure(&self) -> Option<StructureSummary> {
        self.structure.borrow().clone()
    }

    /// The applied preset.
    #[must_use]
    pub fn preset(&self) -> Option<String> {
        self.preset.borrow().clone()
    }

    /// Current clear color.
    #[must_use]
    pub fn background(&self) -> Rgb {
        self.background.get()
    }

    /// Redraws requested so far.
    #[must_use]
    pub fn redraws(&self) -> u32 {
        self.redraws.get()
    }

    /// Camera resets so far.
    #[must_use]
    pub fn camera_resets(&self) -> u32 {
        self.camera_resets.get()
    }

    /// Whether [`EngineHandle::dispose`] ran.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl EngineHandle for HeadlessSession {
    type Data = String;
    type Trajectory = StructureSummary;

    fn set_background(&self, color: Rgb) {
        self.background.set(color);
    }

    async fn download_asset(&self, url: &str) -> Result<String, EngineError> {
        match locate(url)? {
            None => get_text(&self.agent, url)
                .map_err(|e| EngineError::Download(format!("{url}: {e}"))),
            Some(path) => std::fs::read_to_string(&path).map_err(|e| {
                EngineError::Download(format!("{}: {e}", path.display()))
            }),
        }
    }

    async fn parse_trajectory(
        &self,
        data: String,
        format: &str,
    ) -> Result<StructureSummary, EngineError> {
        summarize(&data, format)
    }

    async fn apply_default_preset(
        &self,
        trajectory: &StructureSummary,
        preset: &str,
    ) -> Result<(), EngineError> {
        if preset.trim().is_empty() {
            return Err(EngineError::Preset("empty preset name".to_owned()));
        }
        *self.structure.borrow_mut() = Some(trajectory.clone());
        *self.preset.borrow_mut() = Some(preset.to_owned());
        Ok(())
    }

    async fn reset_camera(&self) -> Result<(), EngineError> {
        if self.structure.borrow().is_none() {
            return Err(EngineError::Camera("nothing to frame".to_owned()));
        }
        self.camera_resets.set(self.camera_resets.get() + 1);
        Ok(())
    }

    fn request_redraw(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }

    fn dispose(&self) -> Result<(), EngineError> {
        self.disposed.set(true);
        let _ = self.structure.borrow_mut().take();
        Ok(())
    }
}
