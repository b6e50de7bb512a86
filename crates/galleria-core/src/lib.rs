//! galleria-core — one gallery out of two album enumerations.
//!
//! An image provider and a video provider report their albums
//! independently. The loader waits for both, joins albums that share a
//! name, prepends a synthetic all-media album and hands the result to the
//! host exactly once.
//!
//! # Architecture
//!
//! ```text
//! Layer 0: Models (items, albums, the final gallery)
//! Layer 1: Pure transforms (sort, merge, aggregate)
//! Layer 2: Loader (join two async providers, deliver once)
//! Layer 3: Hosts (CLI, FFI — implement LoadListener)
//! ```

pub mod aggregate;
pub mod error;
pub mod loader;
pub mod merge;
pub mod models;
pub mod options;
pub mod providers;
pub mod sort;

pub use error::{LoadError, LoadResult};
pub use loader::{LoadListener, LoadOutcome, LoadPhase, MediaLoader};
pub use models::*;
pub use options::{Labels, LoadOptions};
pub use providers::{GroupCallback, GroupProvider, NoopProvider, ProviderRequest};
