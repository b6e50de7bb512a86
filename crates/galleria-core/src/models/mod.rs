//! Gallery data models.
//!
//! Plain owned values: providers build them, the merge pipeline consumes
//! them, the caller owns the result.

pub mod group;
pub mod media;

pub use group::{AggregateResult, GroupSet, MediaGroup};
pub use media::{MediaItem, MediaKind};
