//! One-way migration of unversioned gallery documents.
//!
//! Two historical shapes exist: the hosted-media era writes
//! `{ gallery: {..}, slider: [..], home_slider: [..] }` with items shaped
//! `{original, optimized, thumb, public_id}` or `{youtube: true, url}`; the older
//! local-file era stored the collection map at the top level. Items that fit
//! neither shape are dropped with a warning.

use serde_json::{Map, Value};

use super::model::{
    is_reserved_name, sanitize_name, Collection, GalleryDocument, ImageItem, MediaItem,
    RESERVED_SLIDER_NAMES,
};

pub fn migrate(value: Value) -> Result<GalleryDocument, String> {
    let Value::Object(root) = value else {
        return Err("legacy gallery document is not an object".to_string());
    };

    let mut doc = GalleryDocument::default();

    let collections: Map<String, Value> = match root.get("gallery") {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err("legacy `gallery` is not an object".to_string()),
        None => root
            .iter()
            .filter(|(key, value)| value.is_array() && key.as_str() != "slider")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    };

    let slider_source = ["slider"]
        .into_iter()
        .chain(RESERVED_SLIDER_NAMES)
        .find_map(|key| root.get(key).and_then(Value::as_array));
    for raw in slider_source.into_iter().flatten() {
        if let Some(item) = legacy_item(raw) {
            doc.push_slider(item);
        }
    }

    for (key, items) in collections {
        let Value::Array(items) = items else {
            tracing::warn!("Dropping legacy collection {}: not a list", key);
            continue;
        };
        let converted = items.iter().filter_map(legacy_item);

        if is_reserved_name(&key) {
            for item in converted {
                doc.push_slider(item);
            }
            continue;
        }

        let name = sanitize_name(&key);
        if name.is_empty() || is_reserved_name(&name) {
            tracing::warn!("Dropping legacy collection with unusable name {:?}", key);
            continue;
        }
        doc.collections
            .entry(name)
            .or_insert_with(Collection::default)
            .extend(converted);
    }

    Ok(doc)
}

fn legacy_item(raw: &Value) -> Option<MediaItem> {
    let text = |field: &str| {
        raw.get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    match raw {
        Value::String(url) if !url.trim().is_empty() => Some(MediaItem::Image(ImageItem {
            original_url: url.clone(),
            optimized_url: url.clone(),
            thumb_url: url.clone(),
            external_id: None,
        })),
        Value::Object(_) if raw.get("youtube").and_then(Value::as_bool) == Some(true) => {
            text("url").map(|url| MediaItem::video(url, text("title")))
        }
        Value::Object(_) => {
            let original = text("original")
                .or_else(|| text("optimized"))
                .or_else(|| text("thumb"))
                .or_else(|| text("url"))?;
            Some(MediaItem::Image(ImageItem {
                optimized_url: text("optimized").unwrap_or_else(|| original.clone()),
                thumb_url: text("thumb").unwrap_or_else(|| original.clone()),
                original_url: original,
                external_id: text("public_id"),
            }))
        }
        _ => {
            tracing::warn!("Dropping unrecognised legacy gallery item: {}", raw);
            None
        }
    }
}
