//! The one ordering used wherever items are sorted.
//!
//! Newest first. Equal timestamps fall back to path so the output does not
//! depend on input order.

use std::cmp::Ordering;

use crate::models::MediaItem;

/// Total order over items: timestamp descending, then path ascending.
pub fn newest_first(a: &MediaItem, b: &MediaItem) -> Ordering {
    b.time.cmp(&a.time).then_with(|| a.path.cmp(&b.path))
}

/// Stable in-place sort by [`newest_first`].
pub fn sort_items(items: &mut [MediaItem]) {
    items.sort_by(newest_first);
}
