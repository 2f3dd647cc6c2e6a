//! The screen region a viewer session renders into.
//!
//! A [`Region`] is a cheap, clonable handle. The host (a DOM element, a
//! window, a test) owns the real surface and reports size changes through
//! [`Region::resize`]; sessions bind to it, watch it, and clear it. At most
//! one session generation may be bound at a time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::controller::Generation;
use crate::error::ExplorerError;
use crate::util::listeners::{ListenerId, ListenerSet};

/// Region dimensions in physical pixels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct RegionSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RegionSize {
    /// Construct a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for RegionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Host-side content of a region (e.g. the children of a DOM element).
pub trait RegionSurface {
    /// Remove everything the engine put into the region.
    fn clear(&self);
}

struct RegionInner {
    size: Cell<RegionSize>,
    owner: Cell<Option<Generation>>,
    resize_listeners: ListenerSet<RegionSize>,
    surface: Option<Rc<dyn RegionSurface>>,
    clears: Cell<u64>,
}

/// Shared handle to one screen region.
#[derive(Clone)]
pub struct Region {
    inner: Rc<RegionInner>,
}

impl Region {
    /// A region with no host surface to clear.
    #[must_use]
    pub fn new(size: RegionSize) -> Self {
        Self::build(size, None)
    }

    /// A region whose [`clear`](Self::clear) also clears `surface`.
    #[must_use]
    pub fn with_surface(
        size: RegionSize,
        surface: Rc<dyn RegionSurface>,
    ) -> Self {
        Self::build(size, Some(surface))
    }

    fn build(size: RegionSize, surface: Option<Rc<dyn RegionSurface>>) -> Self {
        Self {
            inner: Rc::new(RegionInner {
                size: Cell::new(size),
                owner: Cell::new(None),
                resize_listeners: ListenerSet::new(),
                surface,
                clears: Cell::new(0),
            }),
        }
    }

    /// Current size.
    #[must_use]
    pub fn size(&self) -> RegionSize {
        self.inner.size.get()
    }

    /// Report a new size from the host. Listeners are only notified when
    /// the size actually changed.
    pub fn resize(&self, size: RegionSize) {
        if self.inner.size.replace(size) == size {
            return;
        }
        log::trace!("region resized to {size}");
        self.inner.resize_listeners.notify(&size);
    }

    /// Register a resize listener.
    pub fn on_resize(
        &self,
        listener: impl Fn(&RegionSize) + 'static,
    ) -> ListenerId {
        self.inner.resize_listeners.add(listener)
    }

    /// Remove a resize listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.resize_listeners.remove(id)
    }

    /// Number of registered resize listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.resize_listeners.len()
    }

    /// Generation of the session currently bound to this region.
    #[must_use]
    pub fn owner(&self) -> Option<Generation> {
        self.inner.owner.get()
    }

    /// Bind a session generation to this region.
    ///
    /// Rebinding the current owner is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ExplorerError::Initialization`] if a different generation
    /// is still bound.
    pub fn bind(&self, owner: Generation) -> Result<(), ExplorerError> {
        match self.inner.owner.get() {
            Some(current) if current != owner => {
                Err(ExplorerError::Initialization(format!(
                    "region is still bound to session {current}"
                )))
            }
            _ => {
                self.inner.owner.set(Some(owner));
                Ok(())
            }
        }
    }

    /// Unbind `owner`. Returns `false` (and changes nothing) if `owner` is
    /// not the bound generation.
    pub fn release(&self, owner: Generation) -> bool {
        if self.inner.owner.get() == Some(owner) {
            self.inner.owner.set(None);
            true
        } else {
            false
        }
    }

    /// Clear the region's contents.
    pub fn clear(&self) {
        self.inner.clears.set(self.inner.clears.get() + 1);
        if let Some(surface) = &self.inner.surface {
            surface.clear();
        }
    }

    /// How many times the region has been cleared.
    #[must_use]
    pub fn clear_count(&self) -> u64 {
        self.inner.clears.get()
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("size", &self.size())
            .field("owner", &self.owner())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
