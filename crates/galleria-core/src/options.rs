//! Load switches and well-known album labels.
//!
//! Both deserialize from partial JSON; missing fields take their defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names of the albums the pipeline treats specially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Synthetic album placed at index 0.
    pub all_media: String,
    /// Leading album of the image provider.
    pub all_images: String,
    /// Leading album of the video provider, pinned to index 2.
    pub all_video: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            all_media: "All media".into(),
            all_images: "All images".into(),
            all_video: "All videos".into(),
        }
    }
}

impl Labels {
    /// True if `name` is one of the well-known album names.
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.all_media || name == self.all_images || name == self.all_video
    }
}

/// What a load cycle should enumerate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub load_images: bool,
    pub load_videos: bool,
    /// Forwarded to the image provider only.
    pub load_gifs: bool,
    pub labels: Labels,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            load_images: true,
            load_videos: true,
            load_gifs: true,
            labels: Labels::default(),
        }
    }
}

impl LoadOptions {
    pub fn new(load_images: bool, load_videos: bool, load_gifs: bool) -> Self {
        Self {
            load_images,
            load_videos,
            load_gifs,
            labels: Labels::default(),
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Parse options from JSON, falling back to defaults when invalid.
    pub fn from_json(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("galleria: invalid load options ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Strict variant of [`LoadOptions::from_json`].
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn nothing_requested(&self) -> bool {
        !self.load_images && !self.load_videos
    }
}
