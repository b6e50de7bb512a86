//! Albums and the final gallery view.

use serde::{Deserialize, Serialize};

use super::media::MediaItem;
use crate::sort::sort_items;

/// One album: a named, time-ordered collection of items.
///
/// The name doubles as the join key when image and video albums are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaGroup {
    pub name: String,
    pub items: Vec<MediaItem>,
    /// Most recent item; `None` only while the group is empty.
    pub cover: Option<MediaItem>,
    #[serde(default)]
    pub selected: bool,
}

/// Ordered albums from one provider.
pub type GroupSet = Vec<MediaGroup>;

impl MediaGroup {
    /// Build a group, sorting `items` and taking the newest as cover.
    pub fn new(name: impl Into<String>, items: Vec<MediaItem>) -> Self {
        let mut group = Self {
            name: name.into(),
            items,
            cover: None,
            selected: false,
        };
        group.resort();
        group
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Same folder, as far as joins are concerned.
    pub fn same_album(&self, other: &MediaGroup) -> bool {
        self.name == other.name
    }

    /// Re-sort items and refresh the cover.
    pub(crate) fn resort(&mut self) {
        sort_items(&mut self.items);
        self.cover = self.items.first().cloned();
    }
}

/// The gallery handed to the caller once a load cycle completes.
///
/// Index 0 is the synthetic all-media album, which is also the only
/// selected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    groups: Vec<MediaGroup>,
}

impl AggregateResult {
    pub(crate) fn from_groups(groups: Vec<MediaGroup>) -> Self {
        Self { groups }
    }

    /// An empty gallery, for cycles where nothing was requested.
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn groups(&self) -> &[MediaGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<MediaGroup> {
        self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The synthetic all-media album, if the gallery is non-empty.
    pub fn all_media(&self) -> Option<&MediaGroup> {
        self.groups.first()
    }

    pub fn find(&self, name: &str) -> Option<&MediaGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }
}
