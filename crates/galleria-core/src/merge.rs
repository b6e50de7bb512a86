//! Join image albums and video albums by name.

use crate::models::{GroupSet, MediaGroup};

/// Merge the two provider outputs into one album list.
///
/// Image albums come first, in their original order. A video album whose
/// name matches an image album is folded into it (items appended, album
/// re-sorted); every other video album is appended after the image albums,
/// in its original order. `None` is treated as an empty set.
pub fn merge(images: Option<GroupSet>, videos: Option<GroupSet>) -> GroupSet {
    let mut merged = images.unwrap_or_default();
    let image_count = merged.len();

    for video in videos.unwrap_or_default() {
        match merged[..image_count]
            .iter_mut()
            .find(|image| image.same_album(&video))
        {
            Some(image) => absorb(image, video),
            None => merged.push(video),
        }
    }

    merged
}

fn absorb(target: &mut MediaGroup, source: MediaGroup) {
    target.items.extend(source.items);
    target.resort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, MediaKind};

    fn group(name: &str, kind: MediaKind, times: &[i64]) -> MediaGroup {
        let items = times
            .iter()
            .map(|t| MediaItem::new(format!("/{}/{}-{}", name, kind.as_str(), t), *t, kind))
            .collect();
        MediaGroup::new(name, items)
    }

    fn images(name: &str, times: &[i64]) -> MediaGroup {
        group(name, MediaKind::Image, times)
    }

    fn videos(name: &str, times: &[i64]) -> MediaGroup {
        group(name, MediaKind::Video, times)
    }

    fn summary(groups: &[MediaGroup]) -> Vec<(String, Vec<i64>)> {
        groups
            .iter()
            .map(|g| (g.name.clone(), g.items.iter().map(|i| i.time).collect()))
            .collect()
    }

    #[test]
    fn camera_example_joins_and_appends() {
        let merged = merge(
            Some(vec![images("Camera", &[5, 3])]),
            Some(vec![videos("Camera", &[4]), videos("Movies", &[2])]),
        );
        assert_eq!(
            summary(&merged),
            vec![
                ("Camera".to_string(), vec![5, 4, 3]),
                ("Movies".to_string(), vec![2]),
            ]
        );
    }

    #[test]
    fn image_order_then_unmatched_video_order() {
        let merged = merge(
            Some(vec![images("A", &[1]), images("B", &[2]), images("C", &[3])]),
            Some(vec![
                videos("Z", &[9]),
                videos("B", &[8]),
                videos("Y", &[7]),
            ]),
        );
        let names: Vec<&str> = merged.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "Z", "Y"]);
        assert_eq!(merged[1].items.len(), 2);
        assert_eq!(merged[1].items[0].kind, MediaKind::Video);
    }

    #[test]
    fn result_size_counts_unmatched_videos_once() {
        let image_set = vec![images("A", &[1]), images("B", &[2])];
        let video_set = vec![videos("A", &[3]), videos("C", &[4]), videos("D", &[5])];
        let merged = merge(Some(image_set), Some(video_set));
        assert_eq!(merged.len(), 2 + 2);
    }

    #[test]
    fn merged_group_cover_is_newest_item() {
        let merged = merge(
            Some(vec![images("Camera", &[5, 3])]),
            Some(vec![videos("Camera", &[11])]),
        );
        let cover = merged[0].cover.as_ref().unwrap();
        assert_eq!(cover.time, 11);
        assert_eq!(cover.kind, MediaKind::Video);
    }

    #[test]
    fn empty_images_appends_videos_as_is() {
        let video_set = vec![videos("Movies", &[2, 6]), videos("Clips", &[1])];
        let merged = merge(Some(Vec::new()), Some(video_set.clone()));
        assert_eq!(merged, video_set);
    }

    #[test]
    fn missing_inputs_are_empty() {
        assert!(merge(None, None).is_empty());

        let only_images = vec![images("A", &[1])];
        assert_eq!(merge(Some(only_images.clone()), None), only_images);

        let only_videos = vec![videos("V", &[1])];
        assert_eq!(merge(None, Some(only_videos.clone())), only_videos);
    }

    #[test]
    fn video_albums_never_join_each_other() {
        let merged = merge(
            None,
            Some(vec![videos("Same", &[1]), videos("Same", &[2])]),
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn duplicate_image_names_join_first_match() {
        let merged = merge(
            Some(vec![images("Dup", &[1]), images("Dup", &[2])]),
            Some(vec![videos("Dup", &[3])]),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].items.len(), 2);
        assert_eq!(merged[1].items.len(), 1);
    }
}
