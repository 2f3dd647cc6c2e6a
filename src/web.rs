//! Browser bindings.
//!
//! A page mounts the viewer by wrapping its container element in an
//! [`ElementRegion`], building a controller over it with an engine binding
//! and a [`FetchProbe`], and calling [`start_detached`] whenever the inputs
//! change. Dropping the [`ElementRegion`] disconnects its observer; calling
//! `dispose` on the controller releases the engine.

use std::rc::Rc;

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, RequestInit, ResizeObserver, ResizeObserverEntry, Response};

use crate::controller::SessionController;
use crate::engine::EngineFactory;
use crate::error::ExplorerError;
use crate::region::{Region, RegionSize, RegionSurface};
use crate::request::LoadRequest;
use crate::resolver::{ProbeOutcome, SourceProbe};

/// Route `log` to the browser console and panics to `console.error`.
pub fn init_logging(level: log::Level) {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(level).is_err() {
        log::debug!("console logger already installed");
    }
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// ── Probe ────────────────────────────────────────────────────────────────

/// [`SourceProbe`] that issues a `HEAD` request with `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchProbe;

impl SourceProbe for FetchProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let Some(window) = web_sys::window() else {
            return ProbeOutcome::Unreachable("no global window".to_owned());
        };
        let init = RequestInit::new();
        init.set_method("HEAD");

        let promise = window.fetch_with_str_and_init(url, &init);
        match JsFuture::from(promise).await {
            Ok(value) => match value.dyn_into::<Response>() {
                Ok(response) if response.ok() => ProbeOutcome::Found,
                Ok(response) => ProbeOutcome::Missing(response.status()),
                Err(value) => ProbeOutcome::Unreachable(js_message(&value)),
            },
            Err(e) => ProbeOutcome::Unreachable(js_message(&e)),
        }
    }
}

// ── Region ───────────────────────────────────────────────────────────────

struct ElementSurface(Element);

impl RegionSurface for ElementSurface {
    fn clear(&self) {
        self.0.set_inner_html("");
    }
}

fn pixels(value: f64) -> u32 {
    value.max(0.0).round() as u32
}

/// A [`Region`] backed by a DOM element and kept sized by a
/// `ResizeObserver`.
pub struct ElementRegion {
    region: Region,
    observer: ResizeObserver,
    _on_resize: Closure<dyn FnMut(Array)>,
}

impl ElementRegion {
    /// Observe `element`. Clearing the region empties the element.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Initialization`] if the browser has no
    /// `ResizeObserver`.
    pub fn attach(element: Element) -> Result<Self, ExplorerError> {
        let size = RegionSize::new(
            u32::try_from(element.client_width()).unwrap_or(0),
            u32::try_from(element.client_height()).unwrap_or(0),
        );
        let region = Region::with_surface(
            size,
            Rc::new(ElementSurface(element.clone())),
        );

        let target = region.clone();
        let on_resize = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            for entry in entries.iter() {
                if let Ok(entry) = entry.dyn_into::<ResizeObserverEntry>() {
                    let rect = entry.content_rect();
                    target.resize(RegionSize::new(
                        pixels(rect.width()),
                        pixels(rect.height()),
                    ));
                }
            }
        });
        let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref())
            .map_err(|e| ExplorerError::Initialization(js_message(&e)))?;
        observer.observe(&element);

        Ok(Self {
            region,
            observer,
            _on_resize: on_resize,
        })
    }

    /// The region to hand to a controller builder.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }
}

impl Drop for ElementRegion {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

// ── Driving ──────────────────────────────────────────────────────────────

/// Run `controller.start(request)` on the browser event loop.
pub fn start_detached<F, P>(
    controller: &SessionController<F, P>,
    request: LoadRequest,
) where
    F: EngineFactory + 'static,
    F::Handle: 'static,
    P: SourceProbe + 'static,
{
    let controller = controller.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let outcome = controller.start(request).await;
        log::debug!("detached load finished: {outcome:?}");
    });
}
