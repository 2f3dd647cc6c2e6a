//! The session lifecycle state machine.
//!
//! [`SessionController`] owns the generation counter, the single live
//! [`ViewerSession`] and the [`ViewState`] the surrounding UI renders. A
//! framework binding only needs three calls: [`start`] (or
//! [`set_request`]) on mount and on input change, and [`dispose`] on
//! unmount. Dropping the last controller handle disposes as well.
//!
//! ```no_run
//! # use protein_explorer::controller::ControllerBuilder;
//! # use protein_explorer::{LoadRequest, RegionSize};
//! # async fn mount<F, P>(engine: F, probe: P)
//! # where
//! #     F: protein_explorer::engine::EngineFactory,
//! #     F::Handle: 'static,
//! #     P: protein_explorer::resolver::SourceProbe,
//! # {
//! let controller = ControllerBuilder::new()
//!     .with_region_size(RegionSize::new(800, 600))
//!     .build(engine, probe)
//!     .unwrap();
//! let _ = controller.start(LoadRequest::from_identifier("1a3n")).await;
//! println!("{:?}", controller.view_state().overlay_text());
//! controller.dispose();
//! # }
//! ```
//!
//! [`start`]: SessionController::start
//! [`set_request`]: SessionController::set_request
//! [`dispose`]: SessionController::dispose

mod controls;
mod lifecycle;
mod state;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub use state::{Generation, LoadOutcome, Phase, ViewState};

use crate::engine::EngineFactory;
use crate::error::ExplorerError;
use crate::options::Options;
use crate::region::{Region, RegionSize};
use crate::request::LoadRequest;
use crate::resolver::{SourceProbe, SourceResolver};
use crate::session::ViewerSession;
use crate::util::listeners::{ListenerId, ListenerSet};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`SessionController`].
#[derive(Debug, Default)]
pub struct ControllerBuilder {
    options: Option<Options>,
    region: Option<Region>,
}

impl ControllerBuilder {
    /// Create a builder with default options and no region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Render into an existing region (e.g. one backed by a DOM element).
    #[must_use]
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Render into a fresh region of `size` with no host surface.
    #[must_use]
    pub fn with_region_size(mut self, size: RegionSize) -> Self {
        self.region = Some(Region::new(size));
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Config`] if no region was given or the
    /// backend options are invalid.
    pub fn build<F, P>(
        self,
        factory: F,
        probe: P,
    ) -> Result<SessionController<F, P>, ExplorerError>
    where
        F: EngineFactory,
        P: SourceProbe,
    {
        let region = self.region.ok_or_else(|| {
            ExplorerError::Config("no screen region to render into".to_owned())
        })?;
        let options = self.options.unwrap_or_default();
        let resolver = SourceResolver::new(&options.backend, probe)?;
        let state = ViewState::new(options.viewer.start_dark);

        Ok(SessionController {
            inner: Rc::new(ControllerInner {
                factory,
                resolver,
                region,
                options,
                generation: Cell::new(Generation::ZERO),
                current: RefCell::new(None),
                request: RefCell::new(None),
                state: RefCell::new(state),
                observers: ListenerSet::new(),
                disposed: Cell::new(false),
            }),
        })
    }
}

// ── Controller ───────────────────────────────────────────────────────────

struct ControllerInner<F: EngineFactory, P> {
    factory: F,
    resolver: SourceResolver<P>,
    region: Region,
    options: Options,
    generation: Cell<Generation>,
    current: RefCell<Option<ViewerSession<F::Handle>>>,
    request: RefCell<Option<LoadRequest>>,
    state: RefCell<ViewState>,
    observers: ListenerSet<ViewState>,
    disposed: Cell<bool>,
}

impl<F: EngineFactory, P> ControllerInner<F, P> {
    fn is_current(&self, generation: Generation) -> bool {
        !self.disposed.get() && self.generation.get() == generation
    }

    /// Apply `update` to the view state if `generation` is still current,
    /// then notify subscribers. Returns whether anything was applied.
    fn publish_for(
        &self,
        generation: Generation,
        update: impl FnOnce(&mut ViewState),
    ) -> bool {
        if !self.is_current(generation) {
            log::trace!("suppressed view update from stale {generation}");
            return false;
        }
        let snapshot = {
            let mut state = self.state.borrow_mut();
            update(&mut state);
            state.clone()
        };
        self.observers.notify(&snapshot);
        true
    }

    /// Dispose the current session, if any.
    fn retire_current(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            log::debug!("retiring session {}", previous.generation());
            previous.dispose();
        }
    }

    /// Remove the current session if it belongs to `generation`.
    fn take_current_if(
        &self,
        generation: Generation,
    ) -> Option<ViewerSession<F::Handle>> {
        let mut current = self.current.borrow_mut();
        if current
            .as_ref()
            .is_some_and(|session| session.generation() == generation)
        {
            current.take()
        } else {
            None
        }
    }

    fn teardown(&self) {
        if self.disposed.get() {
            return;
        }
        let generation = self.generation.get().next();
        self.generation.set(generation);
        self.retire_current();
        self.region.clear();
        self.disposed.set(true);

        let snapshot = {
            let mut state = self.state.borrow_mut();
            state.phase = Phase::Disposed;
            state.error_message = None;
            state.clone()
        };
        self.observers.notify(&snapshot);
        self.observers.clear();
        log::debug!("controller disposed at {generation}");
    }
}

impl<F: EngineFactory, P> Drop for ControllerInner<F, P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Drives viewer sessions through `Idle → Loading → Ready | Error` and
/// finally `Disposed`.
///
/// Cheap to clone; clones share the same controller, so a clone can be
/// moved into a spawned task while the first handle keeps serving controls.
pub struct SessionController<F: EngineFactory, P> {
    inner: Rc<ControllerInner<F, P>>,
}

impl<F: EngineFactory, P> Clone for SessionController<F, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<F: EngineFactory, P> SessionController<F, P> {
    /// Snapshot of the current view state.
    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    /// The current generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.inner.generation.get()
    }

    /// The region sessions render into.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.inner.region
    }

    /// The options the controller was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    /// The resolver used for every generation.
    #[must_use]
    pub fn resolver(&self) -> &SourceResolver<P> {
        &self.inner.resolver
    }

    /// The most recent request.
    #[must_use]
    pub fn request(&self) -> Option<LoadRequest> {
        self.inner.request.borrow().clone()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// The initialized, non-disposed session of the current generation.
    #[must_use]
    pub fn live_session(&self) -> Option<ViewerSession<F::Handle>> {
        if self.is_disposed() {
            return None;
        }
        let generation = self.generation();
        self.inner
            .current
            .borrow()
            .as_ref()
            .filter(|session| {
                session.generation() == generation && session.is_initialized()
            })
            .cloned()
    }

    /// Call `listener` with every view state change.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ViewState) + 'static,
    ) -> ListenerId {
        self.inner.observers.add(listener)
    }

    /// Stop notifying `id`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.observers.remove(id)
    }

    /// Tear down the current session and clear the region. Terminal and
    /// idempotent; any in-flight generation completes without effect.
    /// Subscribers receive the `Disposed` state once and are then dropped.
    pub fn dispose(&self) {
        self.inner.teardown();
    }
}

impl<F: EngineFactory, P> fmt::Debug for SessionController<F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("generation", &self.generation())
            .field("state", &*self.inner.state.borrow())
            .field("region", &self.inner.region)
            .finish_non_exhaustive()
    }
}
