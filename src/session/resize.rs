//! Redraw-on-resize observer.

use std::rc::Weak;

use crate::region::{Region, RegionSize};
use crate::util::listeners::ListenerId;

/// Something that can redraw after its region changed size.
pub trait RedrawTarget {
    /// Redraw for the new `size`. Must not reinitialize or reload.
    fn redraw(&self, size: RegionSize);
}

/// Observes one region and asks its target to redraw on every size change.
///
/// Holds only a weak reference to the target: a watcher never keeps a
/// session alive. Dropping the watcher detaches it.
pub struct ResizeWatcher {
    region: Region,
    listener: Option<ListenerId>,
}

impl ResizeWatcher {
    /// Start observing `region` on behalf of `target`.
    #[must_use]
    pub fn attach(region: &Region, target: Weak<dyn RedrawTarget>) -> Self {
        let listener = region.on_resize(move |size| {
            if let Some(target) = target.upgrade() {
                target.redraw(*size);
            }
        });
        Self {
            region: region.clone(),
            listener: Some(listener),
        }
    }

    /// Stop observing. Returns `false` if already detached.
    pub fn detach(&mut self) -> bool {
        self.listener
            .take()
            .is_some_and(|id| self.region.remove_listener(id))
    }

    /// Whether the watcher is still observing its region.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }
}

impl Drop for ResizeWatcher {
    fn drop(&mut self) {
        let _ = self.detach();
    }
}
