//! Scripted engine and probe doubles shared by the unit tests.
//!
//! The engine records every call, tracks which instances are still live,
//! can be told to fail at a given step, and can hold `create_session` or
//! `download_asset` until the test releases them (in any order), which is
//! how out-of-order completion is reproduced.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use rustc_hash::FxHashMap;

use crate::controller::{ControllerBuilder, SessionController};
use crate::engine::{EngineError, EngineFactory, EngineHandle, Rgb};
use crate::options::Options;
use crate::region::{Region, RegionSize};
use crate::resolver::{ProbeOutcome, SourceProbe};

/// One recorded engine call, tagged with the instance id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(u64),
    Background(u64, Rgb),
    Download(u64, String),
    Parse(u64, String),
    Preset(u64, String),
    ResetCamera(u64),
    Redraw(u64),
    Dispose(u64),
}

/// Steps that can be held open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Create,
    Download,
}

type Gate = oneshot::Sender<Result<(), EngineError>>;

#[derive(Default)]
struct Shared {
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u64>,
    live: RefCell<Vec<u64>>,
    hold_create: Cell<bool>,
    hold_download: Cell<bool>,
    pending: RefCell<VecDeque<(Step, Gate)>>,
    fail_create: Cell<bool>,
    fail_download: Cell<bool>,
    fail_parse: Cell<bool>,
    fail_preset: Cell<bool>,
    fail_camera: Cell<bool>,
    fail_dispose: Cell<bool>,
}

impl Shared {
    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn held(&self, step: Step) -> bool {
        match step {
            Step::Create => self.hold_create.get(),
            Step::Download => self.hold_download.get(),
        }
    }

    async fn gate(&self, step: Step) -> Result<(), EngineError> {
        if !self.held(step) {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push_back((step, tx));
        rx.await.unwrap_or_else(|_| {
            Err(EngineError::Download("gate dropped".to_owned()))
        })
    }
}

/// Scripted [`EngineFactory`].
#[derive(Clone, Default)]
pub(crate) struct ScriptedEngine {
    shared: Rc<Shared>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls at `step` wait for [`release`](Self::release).
    pub(crate) fn hold(&self, step: Step) {
        match step {
            Step::Create => self.shared.hold_create.set(true),
            Step::Download => self.shared.hold_download.set(true),
        }
    }

    /// Number of calls currently waiting.
    pub(crate) fn pending(&self) -> usize {
        self.shared.pending.borrow().len()
    }

    /// Complete the `index`-th oldest waiting call with `outcome`.
    pub(crate) fn release(&self, index: usize, outcome: Result<(), EngineError>) {
        let entry = self.shared.pending.borrow_mut().remove(index);
        let (_, gate) = entry.unwrap();
        let _ = gate.send(outcome);
    }

    pub(crate) fn fail_create(&self) {
        self.shared.fail_create.set(true);
    }

    pub(crate) fn fail_download(&self) {
        self.shared.fail_download.set(true);
    }

    pub(crate) fn fail_parse(&self) {
        self.shared.fail_parse.set(true);
    }

    pub(crate) fn fail_preset(&self) {
        self.shared.fail_preset.set(true);
    }

    pub(crate) fn fail_camera(&self) {
        self.shared.fail_camera.set(true);
    }

    pub(crate) fn fail_dispose(&self) {
        self.shared.fail_dispose.set(true);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.shared.calls.borrow().clone()
    }

    /// Ids of instances created and not yet disposed.
    pub(crate) fn live(&self) -> Vec<u64> {
        self.shared.live.borrow().clone()
    }

    pub(crate) fn created(&self) -> u64 {
        self.shared.next_id.get()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.shared.calls.borrow().iter().filter(|c| matches(c)).count()
    }
}

impl EngineFactory for ScriptedEngine {
    type Handle = ScriptedHandle;

    async fn create_session(
        &self,
        _region: &Region,
    ) -> Result<ScriptedHandle, EngineError> {
        self.shared.gate(Step::Create).await?;
        if self.shared.fail_create.get() {
            return Err(EngineError::Unsupported(
                "no WebGL context".to_owned(),
            ));
        }
        let id = self.shared.next_id.get() + 1;
        self.shared.next_id.set(id);
        self.shared.record(Call::Create(id));
        self.shared.live.borrow_mut().push(id);
        Ok(ScriptedHandle {
            id,
            shared: Rc::clone(&self.shared),
        })
    }
}

/// Scripted [`EngineHandle`].
pub(crate) struct ScriptedHandle {
    id: u64,
    shared: Rc<Shared>,
}

impl ScriptedHandle {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl EngineHandle for ScriptedHandle {
    type Data = String;
    type Trajectory = String;

    fn set_background(&self, color: Rgb) {
        self.shared.record(Call::Background(self.id, color));
    }

    async fn download_asset(&self, url: &str) -> Result<String, EngineError> {
        self.shared.record(Call::Download(self.id, url.to_owned()));
        self.shared.gate(Step::Download).await?;
        if self.shared.fail_download.get() {
            return Err(EngineError::Download(format!("{url}: 404")));
        }
        Ok(format!("data_{url}"))
    }

    async fn parse_trajectory(
        &self,
        data: String,
        format: &str,
    ) -> Result<String, EngineError> {
        self.shared.record(Call::Parse(self.id, format.to_owned()));
        if self.shared.fail_parse.get() {
            return Err(EngineError::Parse(
                "unexpected token at line 1".to_owned(),
            ));
        }
        Ok(data)
    }

    async fn apply_default_preset(
        &self,
        _trajectory: &String,
        preset: &str,
    ) -> Result<(), EngineError> {
        self.shared.record(Call::Preset(self.id, preset.to_owned()));
        if self.shared.fail_preset.get() {
            return Err(EngineError::Preset(format!("unknown preset {preset}")));
        }
        Ok(())
    }

    async fn reset_camera(&self) -> Result<(), EngineError> {
        self.shared.record(Call::ResetCamera(self.id));
        if self.shared.fail_camera.get() {
            return Err(EngineError::Camera("no content".to_owned()));
        }
        Ok(())
    }

    fn request_redraw(&self) {
        self.shared.record(Call::Redraw(self.id));
    }

    fn dispose(&self) -> Result<(), EngineError> {
        self.shared.record(Call::Dispose(self.id));
        self.shared.live.borrow_mut().retain(|&id| id != self.id);
        if self.shared.fail_dispose.get() {
            return Err(EngineError::Disposal("context lost".to_owned()));
        }
        Ok(())
    }
}

/// Scripted [`SourceProbe`]; unknown URLs answer `Missing(404)`.
#[derive(Clone, Default)]
pub(crate) struct ScriptedProbe {
    outcomes: Rc<RefCell<FxHashMap<String, ProbeOutcome>>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedProbe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, outcome: ProbeOutcome) {
        let _ = self.outcomes.borrow_mut().insert(url.to_owned(), outcome);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl SourceProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.calls.borrow_mut().push(url.to_owned());
        let outcome = self.outcomes.borrow().get(url).cloned();
        outcome.unwrap_or(ProbeOutcome::Missing(404))
    }
}

/// A controller over an 800x600 region driven by the given doubles.
pub(crate) fn scripted_controller(
    engine: &ScriptedEngine,
    probe: &ScriptedProbe,
    options: Options,
) -> SessionController<ScriptedEngine, ScriptedProbe> {
    ControllerBuilder::new()
        .with_options(options)
        .with_region_size(RegionSize::new(800, 600))
        .build(engine.clone(), probe.clone())
        .unwrap()
}
