use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collection keys that name the hero slider in older documents and clients.
pub const RESERVED_SLIDER_NAMES: [&str; 3] = ["home_slider", "home-slider", "homeSlider"];

pub const GALLERY_SCHEMA_VERSION: u64 = 1;

/// Folds a user-supplied collection name into a slug: ASCII alphanumerics,
/// `-`, `_` and spaces survive, runs of spaces become a single `_`.
pub fn sanitize_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_SLIDER_NAMES.contains(&name)
}

/// Hosted image. All three URLs point at the same object since media moved to
/// the object store; the fields are kept so clients can pick a rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub original_url: String,
    pub optimized_url: String,
    pub thumb_url: String,
    pub external_id: Option<String>,
}

impl ImageItem {
    pub fn hosted(url: impl Into<String>, external_id: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            original_url: url.clone(),
            optimized_url: url.clone(),
            thumb_url: url,
            external_id: Some(external_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLink {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMediaItem", into = "RawMediaItem")]
pub enum MediaItem {
    Image(ImageItem),
    Video(VideoLink),
}

impl MediaItem {
    pub fn video(url: impl Into<String>, title: Option<String>) -> Self {
        Self::Video(VideoLink {
            url: url.into(),
            title,
        })
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            Self::Image(_) => CollectionKind::Photos,
            Self::Video(_) => CollectionKind::Videos,
        }
    }

    /// Primary URL used for display.
    pub fn url(&self) -> &str {
        match self {
            Self::Image(image) => &image.original_url,
            Self::Video(video) => &video.url,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        match self {
            Self::Image(image) => image.external_id.as_deref(),
            Self::Video(_) => None,
        }
    }

    /// Key used to decide whether two entries are the same stored asset: the
    /// external id when there is one, otherwise the primary URL.
    pub fn identity(&self) -> &str {
        self.external_id().unwrap_or_else(|| self.url())
    }

    /// True when any URL field or the external id equals `needle`.
    pub fn matches(&self, needle: &str) -> bool {
        match self {
            Self::Image(image) => {
                image.original_url == needle
                    || image.optimized_url == needle
                    || image.thumb_url == needle
                    || image.external_id.as_deref() == Some(needle)
            }
            Self::Video(video) => video.url == needle,
        }
    }
}

/// Wire shape of a media item. Video links carry `isVideo: true`; everything
/// else is an image. Unknown fields are rejected.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawMediaItem {
    #[serde(default, skip_serializing_if = "is_false")]
    is_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    optimized_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_id: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TryFrom<RawMediaItem> for MediaItem {
    type Error = String;

    fn try_from(raw: RawMediaItem) -> Result<Self, Self::Error> {
        if raw.is_video {
            if raw.original_url.is_some()
                || raw.optimized_url.is_some()
                || raw.thumb_url.is_some()
                || raw.external_id.is_some()
            {
                return Err("video link must not carry image fields".to_string());
            }
            let url = raw.url.filter(|u| !u.is_empty()).ok_or("video link without url")?;
            return Ok(MediaItem::Video(VideoLink {
                url,
                title: raw.title,
            }));
        }

        if raw.url.is_some() || raw.title.is_some() {
            return Err("image item must not carry video fields".to_string());
        }
        let original_url = raw
            .original_url
            .filter(|u| !u.is_empty())
            .ok_or("image item without originalUrl")?;

        Ok(MediaItem::Image(ImageItem {
            optimized_url: raw.optimized_url.unwrap_or_else(|| original_url.clone()),
            thumb_url: raw.thumb_url.unwrap_or_else(|| original_url.clone()),
            original_url,
            external_id: raw.external_id,
        }))
    }
}

impl From<MediaItem> for RawMediaItem {
    fn from(item: MediaItem) -> Self {
        match item {
            MediaItem::Video(video) => RawMediaItem {
                is_video: true,
                url: Some(video.url),
                title: video.title,
                ..Default::default()
            },
            MediaItem::Image(image) => RawMediaItem {
                original_url: Some(image.original_url),
                optimized_url: Some(image.optimized_url),
                thumb_url: Some(image.thumb_url),
                external_id: image.external_id,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    #[default]
    Photos,
    Videos,
    Mixed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub kind: CollectionKind,
    pub items: Vec<MediaItem>,
}

impl Collection {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Appends in display order. An empty collection takes the kind of its first
    /// item; a second kind turns it `Mixed`.
    pub fn push(&mut self, item: MediaItem) {
        let item_kind = item.kind();
        if self.items.is_empty() {
            self.kind = item_kind;
        } else if self.kind != item_kind {
            self.kind = CollectionKind::Mixed;
        }
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = MediaItem>) {
        for item in items {
            self.push(item);
        }
    }

    pub fn is_video_collection(&self) -> bool {
        self.kind == CollectionKind::Videos
    }
}

/// Root metadata document, persisted whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryDocument {
    pub version: u64,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub collections: BTreeMap<String, Collection>,
    #[serde(default)]
    pub slider: Vec<MediaItem>,
}

impl Default for GalleryDocument {
    fn default() -> Self {
        Self {
            version: GALLERY_SCHEMA_VERSION,
            revision: 0,
            collections: BTreeMap::new(),
            slider: Vec::new(),
        }
    }
}

impl GalleryDocument {
    /// Adds to the slider unless an entry with the same identity is already there.
    pub fn push_slider(&mut self, item: MediaItem) -> bool {
        if self.slider.iter().any(|s| s.identity() == item.identity()) {
            return false;
        }
        self.slider.push(item);
        true
    }
}

/// JSON commands accepted by `POST /api/event-photos`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum GalleryCommand {
    CreateCollection {
        name: String,
        #[serde(default)]
        kind: Option<CollectionKind>,
    },
    AddVideoLink {
        collection: String,
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    RenameCollection { old_name: String, new_name: String },
    AttachUploads {
        #[serde(default)]
        collection: Option<String>,
        #[serde(default)]
        hero: bool,
        keys: Vec<String>,
    },
}

/// Body of `DELETE /api/event-photos`. A `url` selects a single item,
/// otherwise `collection` selects the whole collection.
#[derive(Debug, Deserialize)]
pub struct DeletePayload {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hero: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_keeps_slug_characters() {
        assert_eq!(sanitize_name("Sports Day"), "Sports_Day");
        assert_eq!(sanitize_name("  Annual   Meet 2024! "), "Annual_Meet_2024");
        assert_eq!(sanitize_name("a-b_c"), "a-b_c");
        assert_eq!(sanitize_name("Café"), "Caf");
        assert_eq!(sanitize_name("!!!"), "");
    }

    #[test]
    fn reserved_names_are_exact() {
        assert!(is_reserved_name("home_slider"));
        assert!(is_reserved_name("homeSlider"));
        assert!(!is_reserved_name("home_slider_2"));
    }

    #[test]
    fn video_link_wire_shape() {
        let item = MediaItem::video("https://youtu.be/abc123", None);
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"isVideo": true, "url": "https://youtu.be/abc123"})
        );
    }

    #[test]
    fn image_item_fills_missing_renditions() {
        let item: MediaItem =
            serde_json::from_value(json!({"originalUrl": "https://m/a.jpg", "externalId": "slider/a.jpg"}))
                .unwrap();
        let MediaItem::Image(image) = item else {
            panic!("expected image");
        };
        assert_eq!(image.thumb_url, "https://m/a.jpg");
        assert_eq!(image.external_id.as_deref(), Some("slider/a.jpg"));
    }

    #[test]
    fn rejects_unknown_and_mixed_shapes() {
        assert!(serde_json::from_value::<MediaItem>(json!({"original": "x"})).is_err());
        assert!(serde_json::from_value::<MediaItem>(json!({"isVideo": true})).is_err());
        assert!(serde_json::from_value::<MediaItem>(
            json!({"isVideo": true, "url": "u", "originalUrl": "o"})
        )
        .is_err());
        assert!(serde_json::from_value::<MediaItem>(json!({"originalUrl": "o", "title": "t"})).is_err());
    }

    #[test]
    fn matches_any_url_field_or_external_id() {
        let item = MediaItem::Image(ImageItem {
            original_url: "o".into(),
            optimized_url: "p".into(),
            thumb_url: "t".into(),
            external_id: Some("id".into()),
        });
        for needle in ["o", "p", "t", "id"] {
            assert!(item.matches(needle));
        }
        assert!(!item.matches("other"));
        assert_eq!(item.identity(), "id");
    }

    #[test]
    fn collection_kind_follows_contents() {
        let mut collection = Collection::new(CollectionKind::Photos);
        collection.push(MediaItem::video("v", None));
        assert_eq!(collection.kind, CollectionKind::Videos);
        collection.push(MediaItem::Image(ImageItem::hosted("u", "k")));
        assert_eq!(collection.kind, CollectionKind::Mixed);
    }

    #[test]
    fn commands_are_tagged_by_action() {
        let cmd: GalleryCommand = serde_json::from_value(
            json!({"action": "renameCollection", "oldName": "A", "newName": "B"}),
        )
        .unwrap();
        assert!(matches!(cmd, GalleryCommand::RenameCollection { ref old_name, .. } if old_name == "A"));

        let cmd: GalleryCommand =
            serde_json::from_value(json!({"action": "createCollection", "name": "Talks", "kind": "videos"}))
                .unwrap();
        assert!(matches!(
            cmd,
            GalleryCommand::CreateCollection { kind: Some(CollectionKind::Videos), .. }
        ));
        assert!(serde_json::from_value::<GalleryCommand>(json!({"action": "explode"})).is_err());
    }

    #[test]
    fn slider_skips_duplicate_identity() {
        let mut doc = GalleryDocument::default();
        assert!(doc.push_slider(MediaItem::Image(ImageItem::hosted("u", "k"))));
        assert!(!doc.push_slider(MediaItem::Image(ImageItem::hosted("u2", "k"))));
        assert_eq!(doc.slider.len(), 1);
    }
}
