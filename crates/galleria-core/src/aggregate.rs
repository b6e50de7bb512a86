//! Build the all-media album and pin well-known albums in place.

use crate::models::{AggregateResult, GroupSet, MediaGroup, MediaItem};
use crate::options::Labels;

/// Index the all-video album is moved to.
pub const ALL_VIDEO_INDEX: usize = 2;

/// Items of the first album of a provider's output, taken before merging.
pub fn first_items(set: &[MediaGroup]) -> Vec<MediaItem> {
    set.first().map(|g| g.items.clone()).unwrap_or_default()
}

/// Prepend the all-media album to `merged` and pin the all-video album.
///
/// The all-media album is made of `first_image_items` and
/// `first_video_items`, the first albums of each provider *before* the
/// merge. Returns `None` when both are empty: an album without a cover is
/// never built.
pub fn build(
    merged: GroupSet,
    first_image_items: Vec<MediaItem>,
    first_video_items: Vec<MediaItem>,
    labels: &Labels,
) -> Option<AggregateResult> {
    let mut items = first_image_items;
    items.extend(first_video_items);
    if items.is_empty() {
        return None;
    }

    let mut all_media = MediaGroup::new(labels.all_media.clone(), items);
    all_media.selected = true;

    let mut groups = Vec::with_capacity(merged.len() + 1);
    groups.push(all_media);
    groups.extend(merged.into_iter().map(|mut g| {
        g.selected = false;
        g
    }));

    pin(&mut groups, &labels.all_video, ALL_VIDEO_INDEX);

    Some(AggregateResult::from_groups(groups))
}

/// Move the first album named `name` to `index`, clamped to the end.
fn pin(groups: &mut Vec<MediaGroup>, name: &str, index: usize) {
    if let Some(at) = groups.iter().position(|g| g.name == name) {
        let group = groups.remove(at);
        let index = index.min(groups.len());
        groups.insert(index, group);
    }
}
