//! Filesystem provider — scan a directory tree into albums.
//!
//! One album per parent folder name, plus a leading album holding every
//! item of the provider's kind. Timestamps come from file mtime.
//!
//! Album names double as join keys, so a folder whose name matches one of
//! the [`Labels`] is named after its full directory path instead. It never
//! passes for the leading album or the aggregate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use super::{spawn_or_inline, GroupCallback, GroupProvider, ProviderRequest};
use crate::models::{GroupSet, MediaGroup, MediaItem, MediaKind};
use crate::options::Labels;

/// Supported still image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "heic"];

/// Animated image extensions.
const GIF_EXTENSIONS: &[&str] = &["gif"];

/// Supported video extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov", "3gp"];

const MAX_SCAN_DEPTH: usize = 32;

/// Which half of the gallery a provider enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Images,
    Videos,
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Source::Images => "images",
            Source::Videos => "videos",
        }
    }
}

/// Scans `root` on a background thread each time it is asked for albums.
pub struct DirectoryProvider {
    root: PathBuf,
    source: Source,
    labels: Labels,
}

impl DirectoryProvider {
    pub fn images(root: impl Into<PathBuf>, labels: Labels) -> Self {
        Self {
            root: root.into(),
            source: Source::Images,
            labels,
        }
    }

    pub fn videos(root: impl Into<PathBuf>, labels: Labels) -> Self {
        Self {
            root: root.into(),
            source: Source::Videos,
            labels,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Scan synchronously on the calling thread.
    pub fn scan(&self, request: ProviderRequest) -> GroupSet {
        scan_groups(&self.root, self.source, request, &self.labels)
    }
}

impl GroupProvider for DirectoryProvider {
    fn provide_groups(&self, request: ProviderRequest, on_loaded: GroupCallback) {
        let root = self.root.clone();
        let source = self.source;
        let labels = self.labels.clone();

        spawn_or_inline(&format!("galleria-scan-{}", source.as_str()), move || {
            on_loaded(scan_groups(&root, source, request, &labels))
        });
    }
}

fn scan_groups(root: &Path, source: Source, request: ProviderRequest, labels: &Labels) -> GroupSet {
    let mut items = Vec::new();
    collect(root, source, request, 0, &mut items);
    log::debug!(
        "galleria: {} scan of {} found {} items",
        source.as_str(),
        root.display(),
        items.len()
    );
    if items.is_empty() {
        return Vec::new();
    }

    let mut by_folder: HashMap<String, Vec<MediaItem>> = HashMap::new();
    for item in &items {
        by_folder
            .entry(album_name(Path::new(&item.path), root, labels))
            .or_default()
            .push(item.clone());
    }

    let mut folders: Vec<MediaGroup> = by_folder
        .into_iter()
        .map(|(name, items)| MediaGroup::new(name, items))
        .collect();
    folders.sort_by(|a, b| {
        let newest = |g: &MediaGroup| g.cover.as_ref().map(|c| c.time).unwrap_or(i64::MIN);
        newest(b).cmp(&newest(a)).then_with(|| a.name.cmp(&b.name))
    });

    let all_name = match source {
        Source::Images => labels.all_images.clone(),
        Source::Videos => labels.all_video.clone(),
    };

    let mut groups = Vec::with_capacity(folders.len() + 1);
    groups.push(MediaGroup::new(all_name, items));
    groups.extend(folders);
    groups
}

fn collect(dir: &Path, source: Source, request: ProviderRequest, depth: usize, out: &mut Vec<MediaItem>) {
    if depth > MAX_SCAN_DEPTH {
        log::warn!("galleria: scan depth limit reached at {}", dir.display());
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("galleria: cannot read {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        // Skip directory symlinks to prevent loops
        let is_symlink = std::fs::symlink_metadata(&path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        if path.is_file() {
            if let Some(item) = read_item(&path, source, request) {
                out.push(item);
            }
        } else if path.is_dir() && !is_symlink {
            collect(&path, source, request, depth + 1, out);
        }
    }
}

fn read_item(path: &Path, source: Source, request: ProviderRequest) -> Option<MediaItem> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;
    let kind = classify_extension(&ext)?;

    let wanted = match (source, kind) {
        (Source::Images, MediaKind::Image) => true,
        (Source::Images, MediaKind::Gif) => request.include_gifs,
        (Source::Videos, MediaKind::Video) => true,
        _ => false,
    };
    if !wanted {
        return None;
    }

    let path_str = path.to_str()?;
    let meta = std::fs::metadata(path).ok()?;
    let time = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    Some(
        MediaItem::new(path_str, time, kind)
            .with_mime_type(mime_type(&ext))
            .with_size(meta.len()),
    )
}

fn classify_extension(ext: &str) -> Option<MediaKind> {
    if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else if GIF_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Gif)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

fn mime_type(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "3gp" => "video/3gpp",
        _ => "application/octet-stream",
    }
}

/// Album for a file: its folder's name, or the folder's path when the name
/// is taken by a well-known album.
fn album_name(path: &Path, root: &Path, labels: &Labels) -> String {
    let name = folder_name(path, root);
    if !labels.is_reserved(&name) {
        return name;
    }
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(root)
        .display()
        .to_string()
}

/// Album name for a file: its parent folder's name, or the root's.
fn folder_name(path: &Path, root: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .or_else(|| root.file_name())
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap_or_else(|| root.display().to_string())
}
