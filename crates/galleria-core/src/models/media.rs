//! Media item types.
//!
//! Items are produced once by an enumeration provider and never mutated
//! afterwards. Groups own them by value; the aggregate album clones.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What kind of media this item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Gif,
    Video,
}

impl MediaKind {
    pub fn is_video(self) -> bool {
        matches!(self, MediaKind::Video)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Gif => "gif",
            MediaKind::Video => "video",
        }
    }
}

/// One media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique path or content identifier.
    pub path: String,
    /// Creation/modification time in milliseconds since the epoch.
    pub time: i64,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl MediaItem {
    pub fn new(path: impl Into<String>, time: i64, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            time,
            kind,
            mime_type: None,
            size: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// File name component of the path, or the whole path if it has none.
    pub fn name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}
