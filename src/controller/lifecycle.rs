use super::{Generation, LoadOutcome, Phase, SessionController};
use crate::engine::EngineFactory;
use crate::error::ExplorerError;
use crate::request::LoadRequest;
use crate::resolver::{ResolvedSource, SourceProbe};
use crate::session::ViewerSession;

impl<F, P> SessionController<F, P>
where
    F: EngineFactory,
    F::Handle: 'static,
    P: SourceProbe,
{
    /// Begin a new generation for `request` and drive it to completion.
    ///
    /// The previous session is disposed before the new one is created. If
    /// another generation starts (or the controller is disposed) while this
    /// one is suspended, this one finishes as
    /// [`LoadOutcome::Superseded`] without touching view state, and the
    /// session it created is disposed.
    pub async fn start(&self, request: LoadRequest) -> LoadOutcome {
        let inner = &self.inner;
        if inner.disposed.get() {
            log::debug!("ignoring request on disposed controller");
            return LoadOutcome::Rejected;
        }
        let generation = inner.generation.get().next();
        inner.generation.set(generation);
        *inner.request.borrow_mut() = Some(request.clone());
        inner.retire_current();
        let _ = inner.publish_for(generation, |state| {
            state.phase = Phase::Loading;
            state.error_message = None;
        });
        log::debug!("generation {generation}: loading {request:?}");

        if let Err(error) = request.validate() {
            return self.fail(generation, None, error);
        }

        let session = ViewerSession::new(
            generation,
            inner.region.clone(),
            inner.options.viewer.clone(),
        );
        *inner.current.borrow_mut() = Some(session.clone());

        match self.populate(generation, &session, &request).await {
            Ok(Some(source)) => {
                session.attach_resize_watcher();
                let _ = inner.publish_for(generation, |state| {
                    state.phase = Phase::Ready;
                    state.error_message = None;
                });
                log::debug!("generation {generation}: ready");
                LoadOutcome::Ready { generation, source }
            }
            Err(error) if inner.is_current(generation) => {
                self.fail(generation, Some(&session), error)
            }
            Ok(None) | Err(_) => self.abandon(generation, &session),
        }
    }

    /// Start a generation only if `request` differs from the last one.
    ///
    /// Returns `None` when the request is unchanged.
    pub async fn set_request(&self, request: LoadRequest) -> Option<LoadOutcome> {
        let unchanged =
            self.inner.request.borrow().as_ref() == Some(&request);
        if unchanged {
            log::trace!("request unchanged; keeping {}", self.generation());
            return None;
        }
        Some(self.start(request).await)
    }

    /// Initialize, resolve, load. `Ok(None)` means the generation went
    /// stale at one of the suspension points.
    async fn populate(
        &self,
        generation: Generation,
        session: &ViewerSession<F::Handle>,
        request: &LoadRequest,
    ) -> Result<Option<ResolvedSource>, ExplorerError> {
        let inner = &self.inner;
        let dark = inner.state.borrow().background_is_dark;

        session.initialize(&inner.factory, dark).await?;
        if !inner.is_current(generation) {
            return Ok(None);
        }
        let source = inner.resolver.resolve(request).await?;
        if !inner.is_current(generation) {
            return Ok(None);
        }
        session.load(&source).await?;
        if !inner.is_current(generation) {
            return Ok(None);
        }
        Ok(Some(source))
    }

    fn fail(
        &self,
        generation: Generation,
        session: Option<&ViewerSession<F::Handle>>,
        error: ExplorerError,
    ) -> LoadOutcome {
        let inner = &self.inner;
        if let Some(session) = session {
            session.dispose();
        }
        if let Some(current) = inner.take_current_if(generation) {
            current.dispose();
        }
        log::warn!("generation {generation} failed: {error}");
        let message = error.to_string();
        let _ = inner.publish_for(generation, |state| {
            state.phase = Phase::Error;
            state.error_message = Some(message);
        });
        LoadOutcome::Failed { generation, error }
    }

    fn abandon(
        &self,
        generation: Generation,
        session: &ViewerSession<F::Handle>,
    ) -> LoadOutcome {
        session.dispose();
        if let Some(current) = self.inner.take_current_if(generation) {
            current.dispose();
        }
        log::debug!(
            "generation {generation} superseded by {}",
            self.generation()
        );
        LoadOutcome::Superseded { generation }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    use super::*;
    use crate::engine::EngineError;
    use crate::options::Options;
    use crate::region::RegionSize;
    use crate::resolver::{FallbackReason, ProbeOutcome, SourceOrigin};
    use crate::test_support::{
        scripted_controller, Call, ScriptedEngine, ScriptedProbe, Step,
    };

    type Controller = SessionController<ScriptedEngine, ScriptedProbe>;

    const BACKEND_1A3N: &str = "http://localhost:8080/api/structures/1a3n/file";
    const MIRROR_9XYZ: &str = "https://files.rcsb.org/download/9XYZ.cif";

    fn setup() -> (ScriptedEngine, ScriptedProbe, Controller) {
        let engine = ScriptedEngine::new();
        let probe = ScriptedProbe::new();
        let controller =
            scripted_controller(&engine, &probe, Options::default());
        (engine, probe, controller)
    }

    /// Spawn `start(request)` on `pool`, collecting the outcome.
    fn spawn_start(
        pool: &LocalPool,
        controller: &Controller,
        request: LoadRequest,
        outcomes: &Rc<RefCell<Vec<LoadOutcome>>>,
    ) {
        let controller = controller.clone();
        let outcomes = Rc::clone(outcomes);
        pool.spawner()
            .spawn_local(async move {
                let outcome = controller.start(request).await;
                outcomes.borrow_mut().push(outcome);
            })
            .unwrap();
    }

    #[test]
    fn identifier_found_on_backend_reaches_ready() {
        let (engine, probe, controller) = setup();
        probe.respond(BACKEND_1A3N, ProbeOutcome::Found);

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_identifier("1a3n")),
        );

        let LoadOutcome::Ready { generation, source } = outcome else {
            panic!("expected a ready outcome");
        };
        assert_eq!(generation.get(), 1);
        assert_eq!(source.url(), BACKEND_1A3N);
        assert_eq!(controller.view_state().phase, Phase::Ready);
        assert_eq!(controller.view_state().overlay_text(), None);
        assert!(engine
            .calls()
            .contains(&Call::Download(1, BACKEND_1A3N.to_owned())));
        assert!(controller.live_session().unwrap().has_resize_watcher());
    }

    #[test]
    fn identifier_missing_on_backend_loads_from_mirror() {
        let (engine, probe, controller) = setup();
        probe.respond(
            "http://localhost:8080/api/structures/9xyz/file",
            ProbeOutcome::Missing(404),
        );

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_identifier("9xyz")),
        );

        let LoadOutcome::Ready { source, .. } = outcome else {
            panic!("expected a ready outcome");
        };
        assert_eq!(source.url(), MIRROR_9XYZ);
        assert_eq!(
            source.origin(),
            &SourceOrigin::Mirror(FallbackReason::NotFound(404))
        );
        assert!(engine
            .calls()
            .contains(&Call::Download(1, MIRROR_9XYZ.to_owned())));
        assert_eq!(controller.view_state().phase, Phase::Ready);
    }

    #[test]
    fn file_reference_never_probes() {
        let (engine, probe, controller) = setup();
        let url = "http://localhost:8080/api/structures/1a3n/file";

        let outcome =
            pollster::block_on(controller.start(LoadRequest::from_file(url)));

        assert!(outcome.is_ready());
        assert!(probe.calls().is_empty());
        assert!(engine.calls().contains(&Call::Download(1, url.to_owned())));
    }

    #[test]
    fn invalid_request_creates_no_session() {
        let (engine, probe, controller) = setup();

        let outcome =
            pollster::block_on(controller.start(LoadRequest::default()));

        assert!(matches!(
            outcome,
            LoadOutcome::Failed {
                error: ExplorerError::InvalidRequest,
                ..
            }
        ));
        let state = controller.view_state();
        assert_eq!(state.phase, Phase::Error);
        assert!(!state.error_message.unwrap().is_empty());
        assert_eq!(engine.created(), 0);
        assert!(probe.calls().is_empty());
        assert!(controller.live_session().is_none());
    }

    #[test]
    fn parse_failure_shows_error_and_disposes_session() {
        let (engine, _probe, controller) = setup();
        engine.fail_parse();

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/bad.cif")),
        );

        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        let state = controller.view_state();
        assert_eq!(state.phase, Phase::Error);
        let message = state.error_message.clone().unwrap();
        assert!(message.contains("parse failed"));
        assert_eq!(
            state.overlay_text(),
            Some(format!("Error: {message}"))
        );
        assert!(engine.live().is_empty());
        assert!(controller.live_session().is_none());
        assert_eq!(controller.region().owner(), None);
        assert_eq!(controller.region().listener_count(), 0);
    }

    #[test]
    fn download_failure_shows_error_and_disposes_session() {
        let (engine, _probe, controller) = setup();
        engine.fail_download();

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/gone.cif")),
        );

        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        let state = controller.view_state();
        assert_eq!(state.phase, Phase::Error);
        assert!(state.error_message.unwrap().contains("download failed"));
        assert_eq!(engine.count(|c| matches!(c, Call::Parse(..))), 0);
        assert!(engine.live().is_empty());
        assert_eq!(controller.region().owner(), None);
    }

    #[test]
    fn preset_failure_shows_error_and_disposes_session() {
        let (engine, _probe, controller) = setup();
        engine.fail_preset();

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/a.cif")),
        );

        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        let state = controller.view_state();
        assert_eq!(state.phase, Phase::Error);
        assert!(state.error_message.unwrap().contains("unknown preset default"));
        assert_eq!(engine.count(|c| matches!(c, Call::ResetCamera(_))), 0);
        assert!(engine.live().is_empty());
        assert_eq!(controller.region().owner(), None);
    }

    #[test]
    fn initialization_failure_is_surfaced_like_a_load_error() {
        let (engine, probe, controller) = setup();
        engine.fail_create();

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_identifier("1a3n")),
        );

        let LoadOutcome::Failed { error, .. } = outcome else {
            panic!("expected a failed outcome");
        };
        assert!(matches!(error, ExplorerError::Initialization(_)));
        assert_eq!(controller.view_state().phase, Phase::Error);
        assert!(probe.calls().is_empty());
        assert_eq!(controller.region().owner(), None);
    }

    #[test]
    fn new_request_recovers_from_error() {
        let (_engine, _probe, controller) = setup();
        let _ = pollster::block_on(controller.start(LoadRequest::default()));
        assert_eq!(controller.view_state().phase, Phase::Error);

        let _ = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/a.cif")),
        );

        let state = controller.view_state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.error_message, None);
    }

    #[test]
    fn restart_disposes_previous_session_first() {
        let (engine, _probe, controller) = setup();
        let _ = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/a.cif")),
        );
        let _ = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/b.cif")),
        );

        let calls = engine.calls();
        let disposed = calls.iter().position(|c| *c == Call::Dispose(1));
        let created = calls.iter().position(|c| *c == Call::Create(2));
        assert!(disposed.unwrap() < created.unwrap());
        assert_eq!(engine.live(), vec![2]);
        assert_eq!(controller.region().owner(), Some(controller.generation()));
        assert_eq!(controller.region().listener_count(), 1);
    }

    #[test]
    fn disposal_fault_is_swallowed() {
        let (engine, _probe, controller) = setup();
        engine.fail_dispose();
        let _ = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/a.cif")),
        );

        let outcome = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/b.cif")),
        );

        assert!(outcome.is_ready());
        assert_eq!(controller.view_state().phase, Phase::Ready);
        assert_eq!(engine.live(), vec![2]);
    }

    #[test]
    fn stale_success_after_newer_ready_changes_nothing() {
        let (engine, _probe, controller) = setup();
        engine.hold(Step::Download);
        let phases = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&phases);
        let _ = controller.subscribe(move |state| {
            seen.borrow_mut().push(state.phase);
        });
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();

        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/old.cif"),
            &outcomes,
        );
        pool.run_until_stalled();
        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/new.cif"),
            &outcomes,
        );
        pool.run_until_stalled();
        assert_eq!(engine.pending(), 2);

        // Newer generation completes first.
        engine.release(1, Ok(()));
        pool.run_until_stalled();
        assert_eq!(controller.view_state().phase, Phase::Ready);

        engine.release(0, Ok(()));
        pool.run_until_stalled();

        let outcomes = outcomes.borrow();
        assert!(matches!(
            outcomes[0],
            LoadOutcome::Ready { generation, .. } if generation.get() == 2
        ));
        assert!(matches!(
            outcomes[1],
            LoadOutcome::Superseded { generation } if generation.get() == 1
        ));
        assert_eq!(controller.view_state().phase, Phase::Ready);
        assert_eq!(engine.live(), vec![2]);
        assert_eq!(engine.count(|c| matches!(c, Call::Parse(..))), 1);
        assert_eq!(
            *phases.borrow(),
            vec![Phase::Loading, Phase::Loading, Phase::Ready]
        );
    }

    #[test]
    fn stale_failure_after_newer_ready_changes_nothing() {
        let (engine, _probe, controller) = setup();
        engine.hold(Step::Download);
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();

        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/old.cif"),
            &outcomes,
        );
        pool.run_until_stalled();
        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/new.cif"),
            &outcomes,
        );
        pool.run_until_stalled();

        engine.release(1, Ok(()));
        pool.run_until_stalled();
        engine.release(0, Err(EngineError::Download("timed out".to_owned())));
        pool.run_until_stalled();

        let state = controller.view_state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.error_message, None);
        assert!(matches!(
            outcomes.borrow()[1],
            LoadOutcome::Superseded { .. }
        ));
        assert_eq!(engine.live(), vec![2]);
    }

    #[test]
    fn stale_initialization_never_binds_the_region() {
        let (engine, _probe, controller) = setup();
        engine.hold(Step::Create);
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();

        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/old.cif"),
            &outcomes,
        );
        pool.run_until_stalled();
        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/new.cif"),
            &outcomes,
        );
        pool.run_until_stalled();
        assert_eq!(engine.pending(), 2);

        engine.release(1, Ok(()));
        pool.run_until_stalled();
        engine.release(0, Ok(()));
        pool.run_until_stalled();

        assert_eq!(controller.view_state().phase, Phase::Ready);
        assert_eq!(engine.created(), 2);
        assert_eq!(engine.live().len(), 1);
        assert_eq!(controller.region().owner(), Some(controller.generation()));
        let live = controller.live_session().unwrap();
        assert_eq!(live.engine().unwrap().id(), engine.live()[0]);
    }

    #[test]
    fn dispose_during_load_suppresses_completion() {
        let (engine, _probe, controller) = setup();
        engine.hold(Step::Download);
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();

        spawn_start(
            &pool,
            &controller,
            LoadRequest::from_file("https://example.org/a.cif"),
            &outcomes,
        );
        pool.run_until_stalled();
        controller.dispose();
        engine.release(0, Ok(()));
        pool.run_until_stalled();

        assert_eq!(controller.view_state().phase, Phase::Disposed);
        assert!(matches!(outcomes.borrow()[0], LoadOutcome::Superseded { .. }));
        assert!(engine.live().is_empty());
        assert_eq!(controller.region().owner(), None);
        assert_eq!(controller.region().listener_count(), 0);
    }

    #[test]
    fn set_request_only_restarts_on_change() {
        let (engine, _probe, controller) = setup();
        let a = LoadRequest::from_identifier("1a3n");

        let first = pollster::block_on(controller.set_request(a.clone()));
        let again = pollster::block_on(controller.set_request(a));
        let other = pollster::block_on(
            controller.set_request(LoadRequest::from_identifier("4hhb")),
        );

        assert!(first.is_some_and(|o| o.is_ready()));
        assert!(again.is_none());
        assert!(other.is_some());
        assert_eq!(controller.generation().get(), 2);
        assert_eq!(engine.created(), 2);
    }

    #[test]
    fn resize_redraws_without_reloading() {
        let (engine, _probe, controller) = setup();
        let _ = pollster::block_on(
            controller.start(LoadRequest::from_file("https://example.org/a.cif")),
        );
        let redraws = engine.count(|c| matches!(c, Call::Redraw(_)));

        controller.region().resize(RegionSize::new(1024, 768));

        assert_eq!(
            engine.count(|c| matches!(c, Call::Redraw(_))),
            redraws + 1
        );
        assert_eq!(engine.count(|c| matches!(c, Call::Download(..))), 1);
        assert_eq!(engine.created(), 1);
        assert_eq!(controller.view_state().phase, Phase::Ready);
    }
}
