use super::SessionController;
use crate::engine::EngineFactory;
use crate::options::TogglePolicy;

impl<F: EngineFactory, P> SessionController<F, P> {
    /// Flip between the dark and light background. Returns the resulting
    /// `background_is_dark` flag.
    ///
    /// With a live session the engine is updated and redrawn. Without one,
    /// [`TogglePolicy::LiveSession`] leaves the flag unchanged and
    /// [`TogglePolicy::Optimistic`] flips it so the next session starts
    /// with the new background.
    pub fn toggle_background(&self) -> bool {
        let inner = &self.inner;
        let dark = inner.state.borrow().background_is_dark;
        if inner.disposed.get() {
            return dark;
        }

        match (self.live_session(), inner.options.controls.background_toggle) {
            (Some(session), _) => session.set_background(!dark),
            (None, TogglePolicy::Optimistic) => {
                log::debug!("no live session; background applies on next load");
            }
            (None, TogglePolicy::LiveSession) => return dark,
        }
        let _ = inner.publish_for(self.generation(), |state| {
            state.background_is_dark = !dark;
        });
        !dark
    }

    /// Re-fit the camera of the live session. Returns `false` if there is
    /// no live session.
    ///
    /// A camera failure is logged; it never changes the phase.
    pub async fn auto_view(&self) -> bool {
        let Some(session) = self.live_session() else {
            return false;
        };
        if let Err(e) = session.reset_camera().await {
            log::warn!("auto view failed: {e}");
        }
        true
    }
}
