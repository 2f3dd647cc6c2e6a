//! One embedded engine instance bound to one screen region.
//!
//! A [`ViewerSession`] lives for exactly one generation: created when the
//! generation starts, populated by [`load`](ViewerSession::load), and
//! disposed when superseded or when the view goes away. Once disposed it
//! is inert: every operation becomes a no-op, including operations whose
//! futures were already in flight when disposal happened. Each `.await`
//! inside the session re-checks the disposed flag before touching the
//! engine again.

mod resize;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

pub use resize::{RedrawTarget, ResizeWatcher};
use web_time::Instant;

use crate::controller::Generation;
use crate::engine::{EngineError, EngineFactory, EngineHandle};
use crate::error::ExplorerError;
use crate::options::ViewerOptions;
use crate::region::{Region, RegionSize};
use crate::resolver::ResolvedSource;

struct SessionInner<H: EngineHandle> {
    generation: Generation,
    region: Region,
    viewer: ViewerOptions,
    engine: RefCell<Option<Rc<H>>>,
    watcher: RefCell<Option<ResizeWatcher>>,
    initializing: Cell<bool>,
    disposed: Cell<bool>,
    loaded: Cell<bool>,
    dark: Cell<bool>,
}

impl<H: EngineHandle> SessionInner<H> {
    fn engine(&self) -> Option<Rc<H>> {
        if self.disposed.get() {
            return None;
        }
        self.engine.borrow().clone()
    }

    /// Detach the watcher, dispose the engine, unbind and clear the region.
    /// Returns `false` if already released.
    fn release(&self) -> bool {
        if self.disposed.replace(true) {
            return false;
        }
        let watcher = self.watcher.borrow_mut().take();
        if let Some(mut watcher) = watcher {
            let _ = watcher.detach();
        }
        let engine = self.engine.borrow_mut().take();
        if let Some(engine) = engine {
            if let Err(e) = engine.dispose() {
                let fault = ExplorerError::Disposal(e.to_string());
                log::warn!("session {}: {fault}", self.generation);
            }
        }
        if self.region.release(self.generation) {
            self.region.clear();
        }
        log::debug!("session {} disposed", self.generation);
        true
    }
}

impl<H: EngineHandle> RedrawTarget for SessionInner<H> {
    fn redraw(&self, size: RegionSize) {
        if let Some(engine) = self.engine() {
            log::trace!("session {} redraw at {size}", self.generation);
            engine.request_redraw();
        }
    }
}

impl<H: EngineHandle> Drop for SessionInner<H> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Owner of one live engine instance and its resize watcher.
///
/// Cheap to clone; clones share the same session.
pub struct ViewerSession<H: EngineHandle> {
    inner: Rc<SessionInner<H>>,
}

impl<H: EngineHandle> Clone for ViewerSession<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: EngineHandle> ViewerSession<H> {
    /// Create an uninitialized session for `generation` over `region`.
    #[must_use]
    pub(crate) fn new(
        generation: Generation,
        region: Region,
        viewer: ViewerOptions,
    ) -> Self {
        let dark = viewer.start_dark;
        Self {
            inner: Rc::new(SessionInner {
                generation,
                region,
                viewer,
                engine: RefCell::new(None),
                watcher: RefCell::new(None),
                initializing: Cell::new(false),
                disposed: Cell::new(false),
                loaded: Cell::new(false),
                dark: Cell::new(dark),
            }),
        }
    }

    /// The generation this session belongs to.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.inner.generation
    }

    /// The region this session renders into.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.inner.region
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Whether an engine instance is attached and not disposed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.engine().is_some()
    }

    /// Whether a structure finished loading into this session.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.get() && !self.is_disposed()
    }

    /// Whether the dark background is applied.
    #[must_use]
    pub fn background_is_dark(&self) -> bool {
        self.inner.dark.get()
    }

    /// Whether a resize watcher is attached.
    #[must_use]
    pub fn has_resize_watcher(&self) -> bool {
        self.inner
            .watcher
            .borrow()
            .as_ref()
            .is_some_and(ResizeWatcher::is_attached)
    }

    /// The live engine handle, if initialized and not disposed.
    #[must_use]
    pub fn engine(&self) -> Option<Rc<H>> {
        self.inner.engine()
    }

    /// Create the engine instance, bind it to the region and set the
    /// initial background.
    ///
    /// A call made while another is still creating the engine returns
    /// without creating a second instance. If the session is disposed while
    /// the engine is being created, the new instance is disposed
    /// immediately and nothing is bound.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Initialization`] if the region is bound to
    /// another session or the engine cannot attach.
    pub async fn initialize<F>(
        &self,
        factory: &F,
        dark: bool,
    ) -> Result<(), ExplorerError>
    where
        F: EngineFactory<Handle = H>,
    {
        let inner = &self.inner;
        if self.is_disposed() || self.is_initialized() || inner.initializing.get()
        {
            return Ok(());
        }
        inner.region.bind(inner.generation)?;

        inner.initializing.set(true);
        let created = factory.create_session(&inner.region).await;
        inner.initializing.set(false);
        if self.is_disposed() {
            if let Ok(handle) = created {
                log::debug!(
                    "session {} disposed during initialization",
                    inner.generation
                );
                if let Err(e) = handle.dispose() {
                    log::warn!("session {}: dispose failed: {e}", inner.generation);
                }
            }
            return Ok(());
        }
        let handle = created
            .map_err(|e| ExplorerError::Initialization(e.to_string()))?;

        inner.dark.set(dark);
        handle.set_background(inner.viewer.background(dark));
        *inner.engine.borrow_mut() = Some(Rc::new(handle));
        log::debug!(
            "session {} initialized at {}",
            inner.generation,
            inner.region.size()
        );
        Ok(())
    }

    /// Download `source`, parse it with the configured format, apply the
    /// configured preset, fit the camera and redraw.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Load`] if the session was never
    /// initialized or any engine step fails.
    pub async fn load(
        &self,
        source: &ResolvedSource,
    ) -> Result<(), ExplorerError> {
        if self.is_disposed() {
            return Ok(());
        }
        let Some(engine) = self.engine() else {
            return Err(ExplorerError::Load(
                "viewer session is not initialized".to_owned(),
            ));
        };
        let viewer = &self.inner.viewer;
        let started = Instant::now();

        let Some(data) = self.step(engine.download_asset(source.url())).await?
        else {
            return Ok(());
        };
        let Some(trajectory) = self
            .step(engine.parse_trajectory(data, &viewer.trajectory_format))
            .await?
        else {
            return Ok(());
        };
        let preset = engine.apply_default_preset(&trajectory, &viewer.preset);
        if self.step(preset).await?.is_none() {
            return Ok(());
        }
        if self.step(engine.reset_camera()).await?.is_none() {
            return Ok(());
        }
        engine.request_redraw();
        self.inner.loaded.set(true);

        log::info!(
            "session {} loaded {source} in {:.0?}",
            self.generation(),
            started.elapsed()
        );
        Ok(())
    }

    /// Switch between the dark and light background and redraw.
    pub fn set_background(&self, dark: bool) {
        if self.is_disposed() {
            return;
        }
        self.inner.dark.set(dark);
        if let Some(engine) = self.engine() {
            engine.set_background(self.inner.viewer.background(dark));
            engine.request_redraw();
        }
    }

    /// Re-fit the camera to the current content and redraw.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Load`] if the engine rejects the reset.
    pub async fn reset_camera(&self) -> Result<(), ExplorerError> {
        let Some(engine) = self.engine() else {
            return Ok(());
        };
        if self.step(engine.reset_camera()).await?.is_some() {
            engine.request_redraw();
        }
        Ok(())
    }

    /// Watch the bound region and redraw on every size change. Replaces
    /// any previously attached watcher.
    pub fn attach_resize_watcher(&self)
    where
        H: 'static,
    {
        if self.is_disposed() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let target: Weak<dyn RedrawTarget> = weak;
        let watcher = ResizeWatcher::attach(&self.inner.region, target);
        let previous = self.inner.watcher.borrow_mut().replace(watcher);
        if let Some(mut previous) = previous {
            let _ = previous.detach();
        }
    }

    /// Detach the watcher, release the engine and clear the region.
    /// Idempotent; disposal faults are logged, never returned.
    pub fn dispose(&self) {
        let _ = self.inner.release();
    }

    /// Await one engine step. `Ok(None)` means the session was disposed
    /// while the step was pending and its result must be dropped.
    async fn step<T>(
        &self,
        step: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<Option<T>, ExplorerError> {
        let result = step.await;
        if self.is_disposed() {
            return Ok(None);
        }
        result
            .map(Some)
            .map_err(|e| ExplorerError::Load(e.to_string()))
    }
}

impl<H: EngineHandle> fmt::Debug for ViewerSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerSession")
            .field("generation", &self.inner.generation)
            .field("disposed", &self.inner.disposed.get())
            .field("loaded", &self.inner.loaded.get())
            .finish_non_exhaustive()
    }
}
