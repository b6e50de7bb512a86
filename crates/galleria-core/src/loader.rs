//! Galleria loader — joins the image and video providers.
//!
//! Each provider reports on its own thread. Results land in two slots under
//! one mutex; whichever callback fills the second slot takes both sets and
//! hands them to a `galleria-merge` thread. The merge result reaches the
//! host through a single [`LoadListener`].
//!
//! Listener calls run under a delivery lock that [`MediaLoader::detach`] also
//! takes, so once `detach` returns no callback is running or will start. The
//! lock is reentrant: a listener may detach or drop the loader from inside its
//! own callback. A listener that blocks on a thread which is itself waiting in
//! `detach` deadlocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::aggregate::{build, first_items};
use crate::error::{LoadError, LoadResult};
use crate::merge::merge;
use crate::models::{AggregateResult, GroupSet};
use crate::options::{Labels, LoadOptions};
use crate::providers::{spawn_or_inline, GroupProvider, ProviderRequest};

// ---------------------------------------------------------------------------
// Host-facing types
// ---------------------------------------------------------------------------

/// Receives the outcome of a load cycle.
///
/// Called from the merge thread (or, when nothing can be merged, from the
/// provider thread that completed last), never from inside `start`.
/// Implementations marshal onto whatever context they need.
pub trait LoadListener: Send + Sync {
    fn on_loaded(&self, result: AggregateResult);

    /// Neither provider found anything.
    fn on_no_media(&self) {}
}

/// What a finished cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(AggregateResult),
    NoMedia,
}

/// Where the current (or last) cycle stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Merging,
    Ready,
    NoMedia,
    /// Finished after the host detached; the result was discarded.
    Dropped,
}

impl LoadPhase {
    fn in_flight(self) -> bool {
        matches!(self, LoadPhase::Loading | LoadPhase::Merging)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Images,
    Videos,
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Completion slots for one cycle. `Some` means that provider has reported.
struct Join {
    cycle: u64,
    images: Option<GroupSet>,
    videos: Option<GroupSet>,
    phase: LoadPhase,
}

struct Shared {
    join: Mutex<Join>,
    ready: AtomicBool,
    alive: AtomicBool,
    /// Held across every listener call and every liveness flip.
    delivery: ReentrantMutex<()>,
}

impl Shared {
    fn set_phase(&self, phase: LoadPhase) {
        self.join.lock().phase = phase;
    }

    fn host_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Flip liveness off, waiting out any listener call in progress.
    fn detach(&self) -> bool {
        let _delivery = self.delivery.lock();
        self.alive.swap(false, Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// MediaLoader
// ---------------------------------------------------------------------------

/// Runs load cycles over an image provider and a video provider.
pub struct MediaLoader {
    images: Arc<dyn GroupProvider>,
    videos: Arc<dyn GroupProvider>,
    options: LoadOptions,
    shared: Arc<Shared>,
}

impl MediaLoader {
    pub fn new(images: Arc<dyn GroupProvider>, videos: Arc<dyn GroupProvider>) -> Self {
        Self {
            images,
            videos,
            options: LoadOptions::default(),
            shared: Arc::new(Shared {
                join: Mutex::new(Join {
                    cycle: 0,
                    images: None,
                    videos: None,
                    phase: LoadPhase::Idle,
                }),
                ready: AtomicBool::new(false),
                alive: AtomicBool::new(true),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Loader over a directory tree, scanning images and videos separately.
    #[cfg(feature = "fs")]
    pub fn from_directory(root: impl Into<std::path::PathBuf>, options: LoadOptions) -> Self {
        use crate::providers::DirectoryProvider;

        let root = root.into();
        let images = DirectoryProvider::images(root.clone(), options.labels.clone());
        let videos = DirectoryProvider::videos(root, options.labels.clone());
        Self::new(Arc::new(images), Arc::new(videos)).with_options(options)
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the three load switches. Takes effect on the next `start`.
    pub fn configure(&mut self, load_images: bool, load_videos: bool, load_gifs: bool) {
        self.options.load_images = load_images;
        self.options.load_videos = load_videos;
        self.options.load_gifs = load_gifs;
    }

    pub fn set_labels(&mut self, labels: Labels) {
        self.options.labels = labels;
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// True once the current cycle has delivered its gallery.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> LoadPhase {
        self.shared.join.lock().phase
    }

    /// Mark the host as gone. Pending results are dropped. Idempotent.
    ///
    /// Blocks until a listener call already in progress has returned.
    pub fn detach(&self) {
        if self.shared.detach() {
            log::debug!("galleria: loader detached");
        }
    }

    pub fn is_detached(&self) -> bool {
        !self.shared.host_alive()
    }

    /// Begin a load cycle. Returns immediately; `listener` hears the outcome
    /// on another thread.
    pub fn start(&self, listener: Arc<dyn LoadListener>) -> LoadResult<()> {
        if !self.shared.host_alive() {
            return Err(LoadError::Detached);
        }

        let options = self.options.clone();
        let cycle = {
            let mut join = self.shared.join.lock();
            if join.phase.in_flight() {
                return Err(LoadError::AlreadyLoading);
            }
            join.cycle += 1;
            // Disabled providers count as already reported, with nothing.
            join.images = (!options.load_images).then(Vec::new);
            join.videos = (!options.load_videos).then(Vec::new);
            join.phase = LoadPhase::Loading;
            self.shared.ready.store(false, Ordering::SeqCst);
            join.cycle
        };

        log::debug!(
            "galleria: cycle {} started (images={}, videos={}, gifs={})",
            cycle,
            options.load_images,
            options.load_videos,
            options.load_gifs
        );

        if options.nothing_requested() {
            let shared = Arc::clone(&self.shared);
            spawn_or_inline("galleria-merge", move || {
                deliver(&shared, &*listener, AggregateResult::empty())
            });
            return Ok(());
        }

        let request = ProviderRequest {
            include_gifs: options.load_gifs,
        };

        if options.load_images {
            let on_loaded = completion(&self.shared, &listener, &options.labels, cycle, Slot::Images);
            self.images.provide_groups(request, on_loaded);
        }
        if options.load_videos {
            let on_loaded = completion(&self.shared, &listener, &options.labels, cycle, Slot::Videos);
            self.videos.provide_groups(request, on_loaded);
        }

        Ok(())
    }

    /// Run one cycle and block until it finishes.
    pub fn load_blocking(&self) -> LoadResult<LoadOutcome> {
        let (tx, rx) = mpsc::channel();
        self.start(Arc::new(ChannelListener { tx: Mutex::new(tx) }))?;
        rx.recv().map_err(|_| LoadError::Abandoned)
    }
}

impl Drop for MediaLoader {
    fn drop(&mut self) {
        // Waits for a running listener call, not for providers: their
        // callbacks see the flag and drop out
        self.shared.detach();
    }
}

// ---------------------------------------------------------------------------
// Cycle completion
// ---------------------------------------------------------------------------

fn completion(
    shared: &Arc<Shared>,
    listener: &Arc<dyn LoadListener>,
    labels: &Labels,
    cycle: u64,
    slot: Slot,
) -> crate::providers::GroupCallback {
    let shared = Arc::clone(shared);
    let listener = Arc::clone(listener);
    let labels = labels.clone();
    Box::new(move |groups| complete(shared, listener, labels, cycle, slot, groups))
}

/// Record one provider's result; fire the merge if it was the last one.
fn complete(
    shared: Arc<Shared>,
    listener: Arc<dyn LoadListener>,
    labels: Labels,
    cycle: u64,
    slot: Slot,
    groups: GroupSet,
) {
    let (images, videos) = {
        let mut join = shared.join.lock();
        log::debug!(
            "galleria: cycle {} {:?} reported {} albums",
            cycle,
            slot,
            groups.len()
        );
        // `GroupCallback` is FnOnce, so each slot fills at most once per cycle.
        match slot {
            Slot::Images => join.images = Some(groups),
            Slot::Videos => join.videos = Some(groups),
        }

        if join.images.is_none() || join.videos.is_none() {
            return;
        }
        let images = join.images.take().unwrap_or_default();
        let videos = join.videos.take().unwrap_or_default();

        if images.is_empty() && videos.is_empty() {
            drop(join);
            no_media(&shared, &*listener);
            return;
        }
        join.phase = LoadPhase::Merging;
        (images, videos)
    };

    spawn_or_inline("galleria-merge", move || {
        run_pipeline(&shared, &*listener, &labels, images, videos)
    });
}

/// Merge, build the all-media album, deliver.
fn run_pipeline(
    shared: &Shared,
    listener: &dyn LoadListener,
    labels: &Labels,
    images: GroupSet,
    videos: GroupSet,
) {
    if !shared.host_alive() {
        log::debug!("galleria: host gone before merge, dropping result");
        shared.set_phase(LoadPhase::Dropped);
        return;
    }

    // The all-media album draws on the first albums as reported, before merging.
    let first_image = first_items(&images);
    let first_video = first_items(&videos);
    let merged = merge(Some(images), Some(videos));

    match build(merged, first_image, first_video, labels) {
        Some(result) => deliver(shared, listener, result),
        None => {
            log::debug!("galleria: leading albums empty, nothing to show");
            no_media(shared, listener);
        }
    }
}

fn deliver(shared: &Shared, listener: &dyn LoadListener, result: AggregateResult) {
    let _delivery = shared.delivery.lock();
    if !shared.host_alive() {
        log::debug!("galleria: host gone before delivery, dropping result");
        shared.set_phase(LoadPhase::Dropped);
        return;
    }
    log::debug!("galleria: delivering {} albums", result.len());
    shared.ready.store(true, Ordering::SeqCst);
    shared.set_phase(LoadPhase::Ready);
    listener.on_loaded(result);
}

fn no_media(shared: &Shared, listener: &dyn LoadListener) {
    let _delivery = shared.delivery.lock();
    if !shared.host_alive() {
        log::debug!("galleria: host gone, dropping no-media signal");
        shared.set_phase(LoadPhase::Dropped);
        return;
    }
    log::info!("galleria: no media found");
    shared.set_phase(LoadPhase::NoMedia);
    listener.on_no_media();
}

// ---------------------------------------------------------------------------
// Blocking adapter
// ---------------------------------------------------------------------------

struct ChannelListener {
    tx: Mutex<mpsc::Sender<LoadOutcome>>,
}

impl LoadListener for ChannelListener {
    fn on_loaded(&self, result: AggregateResult) {
        let _ = self.tx.lock().send(LoadOutcome::Loaded(result));
    }

    fn on_no_media(&self) {
        let _ = self.tx.lock().send(LoadOutcome::NoMedia);
    }
}
