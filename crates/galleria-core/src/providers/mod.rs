//! Enumeration providers: the loader's only source of albums.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::GroupSet;

/// Completion callback handed to a provider. Called exactly once per cycle.
pub type GroupCallback = Box<dyn FnOnce(GroupSet) + Send + 'static>;

/// Per-cycle parameters forwarded to providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProviderRequest {
    /// Include animated images in the image set. Video providers ignore it.
    pub include_gifs: bool,
}

/// An asynchronous album enumerator for one media kind.
///
/// The loader calls `provide_groups` once per cycle. Implementations must
/// invoke `on_loaded` exactly once, from another thread, with an empty set
/// when nothing was found or enumeration failed.
pub trait GroupProvider: Send + Sync {
    fn provide_groups(&self, request: ProviderRequest, on_loaded: GroupCallback);
}

/// Provider that reports an empty set straight away, from its own thread.
///
/// Use for headless hosts or to stub out one media kind.
pub struct NoopProvider;

impl GroupProvider for NoopProvider {
    fn provide_groups(&self, _: ProviderRequest, on_loaded: GroupCallback) {
        spawn_or_inline("galleria-noop", move || on_loaded(Vec::new()));
    }
}

/// Run `work` on a thread called `name`, or on this one if the spawn fails.
pub(crate) fn spawn_or_inline<F>(name: &str, work: F)
where
    F: FnOnce() + Send + 'static,
{
    // Shared so the work survives a failed spawn.
    let handoff = Arc::new(Mutex::new(Some(work)));
    let worker = Arc::clone(&handoff);

    let spawned = thread::Builder::new().name(name.into()).spawn(move || {
        let work = worker.lock().take();
        if let Some(work) = work {
            work();
        }
    });

    if let Err(e) = spawned {
        log::error!("galleria: failed to spawn {} thread: {}, running inline", name, e);
        let work = handoff.lock().take();
        if let Some(work) = work {
            work();
        }
    }
}

#[cfg(feature = "fs")]
pub mod directory;

#[cfg(feature = "fs")]
pub use directory::DirectoryProvider;
