use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use super::legacy;
use super::model::{
    is_reserved_name, sanitize_name, Collection, CollectionKind, GalleryDocument, ImageItem,
    MediaItem, GALLERY_SCHEMA_VERSION,
};
use crate::document::{self, VersionedDocument};
use crate::error::{GalleryError, GalleryResult};
use crate::store::{object_key, ObjectStore, UploadFile};

impl VersionedDocument for GalleryDocument {
    const VERSION: u64 = GALLERY_SCHEMA_VERSION;

    fn migrate_legacy(value: Value) -> Result<Self, String> {
        legacy::migrate(value)
    }
}

/// Per-file outcome of an upload batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub succeeded: Vec<MediaItem>,
    pub failed: Vec<FailedUpload>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpload {
    pub file_name: String,
    pub reason: String,
}

/// Where new items land: a named collection or the hero slider.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Collection(String),
    Slider,
}

impl Target {
    fn resolve(collection: Option<&str>, is_hero: bool) -> GalleryResult<Self> {
        if is_hero {
            return Ok(Target::Slider);
        }
        let raw = collection.unwrap_or_default();
        if is_reserved_name(raw.trim()) {
            return Ok(Target::Slider);
        }
        Ok(Target::Collection(collection_name(raw)?))
    }

    fn folder(&self) -> String {
        match self {
            Target::Collection(name) => format!("events/{}", name),
            Target::Slider => "slider".to_string(),
        }
    }
}

/// Sanitizes `raw` and rejects empty or reserved results.
fn collection_name(raw: &str) -> GalleryResult<String> {
    if is_reserved_name(raw.trim()) {
        return Err(GalleryError::invalid_operation(
            "The hero slider cannot be used as a collection",
        ));
    }
    let name = sanitize_name(raw);
    if name.is_empty() {
        return Err(GalleryError::invalid_argument("Missing collection name"));
    }
    if is_reserved_name(&name) {
        return Err(GalleryError::invalid_operation(
            "The hero slider cannot be used as a collection",
        ));
    }
    Ok(name)
}

async fn commit(
    store: &dyn ObjectStore,
    doc_key: &str,
    doc: &mut GalleryDocument,
) -> GalleryResult<()> {
    doc.version = GALLERY_SCHEMA_VERSION;
    doc.revision += 1;
    document::save(store, doc_key, doc).await
}

/// Deletes the stored bytes behind `item`. Failures are logged, never returned.
async fn destroy_best_effort(store: &dyn ObjectStore, item: &MediaItem) {
    let Some(external_id) = item.external_id() else {
        if !item.is_video() {
            tracing::debug!("No external id for {}, nothing to destroy", item.url());
        }
        return;
    };
    if let Err(e) = store.destroy(external_id).await {
        tracing::warn!("Failed to destroy stored object {}: {}", external_id, e);
    }
}

/// Fetches the gallery document. Never fails; see `document::load_or_default`.
pub async fn read(store: &dyn ObjectStore, doc_key: &str) -> GalleryDocument {
    document::load_or_default(store, doc_key).await
}

pub async fn create_collection(
    store: &dyn ObjectStore,
    doc_key: &str,
    name: &str,
    kind: Option<CollectionKind>,
) -> GalleryResult<GalleryDocument> {
    let name = collection_name(name)?;
    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;

    if doc.collections.contains_key(&name) {
        tracing::debug!("Collection {} already exists", name);
        return Ok(doc);
    }

    doc.collections
        .insert(name.clone(), Collection::new(kind.unwrap_or_default()));
    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Created collection {}", name);
    Ok(doc)
}

/// Uploads `files` one at a time and appends an item per successful upload.
/// The document is written when at least one upload succeeded.
pub async fn add_items(
    store: &dyn ObjectStore,
    doc_key: &str,
    collection: Option<&str>,
    files: Vec<UploadFile>,
    is_hero: bool,
) -> GalleryResult<(GalleryDocument, UploadReport)> {
    if files.is_empty() {
        return Err(GalleryError::invalid_argument("No file"));
    }
    let target = Target::resolve(collection, is_hero)?;
    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;
    let folder = target.folder();

    let mut report = UploadReport::default();
    for file in files {
        let key = object_key(&folder, &file.file_name);
        match store
            .upload(&key, file.bytes, file.content_type.as_deref())
            .await
        {
            Ok(stored) => {
                tracing::info!("Uploaded {} as {}", file.file_name, stored.key);
                report
                    .succeeded
                    .push(MediaItem::Image(ImageItem::hosted(stored.url, stored.key)));
            }
            Err(e) => {
                tracing::warn!("Upload of {} failed: {}", file.file_name, e);
                report.failed.push(FailedUpload {
                    file_name: file.file_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.succeeded.is_empty() {
        return Ok((doc, report));
    }

    match &target {
        Target::Slider => {
            for item in &report.succeeded {
                doc.push_slider(item.clone());
            }
        }
        Target::Collection(name) => {
            doc.collections
                .entry(name.clone())
                .or_default()
                .extend(report.succeeded.iter().cloned());
        }
    }
    commit(store, doc_key, &mut doc).await?;
    Ok((doc, report))
}

/// Registers objects the browser already uploaded with a presigned URL.
///
/// Every key must exist in the store. Repeated keys and keys already present in
/// the target are skipped; only the items actually inserted are returned.
pub async fn attach_uploads(
    store: &dyn ObjectStore,
    doc_key: &str,
    collection: Option<&str>,
    is_hero: bool,
    keys: &[String],
) -> GalleryResult<(GalleryDocument, Vec<MediaItem>)> {
    if keys.is_empty() {
        return Err(GalleryError::invalid_argument("No uploaded keys"));
    }
    let target = Target::resolve(collection, is_hero)?;
    let prefix = format!("{}/", target.folder());

    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(keys.len());
    for key in keys {
        let inside = key
            .strip_prefix(&prefix)
            .is_some_and(|rest| !rest.split('/').any(|seg| seg.is_empty() || seg == "." || seg == ".."));
        if !inside {
            return Err(GalleryError::invalid_argument(format!(
                "Key {} is outside {}",
                key, prefix
            )));
        }
        if !seen.insert(key.as_str()) {
            continue;
        }
        if !store.exists(key).await? {
            return Err(GalleryError::not_found(format!("Uploaded object {} not found", key)));
        }
        candidates.push(MediaItem::Image(ImageItem::hosted(store.public_url(key), key.clone())));
    }

    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;
    let mut attached = Vec::with_capacity(candidates.len());
    match &target {
        Target::Slider => {
            for item in candidates {
                if doc.push_slider(item.clone()) {
                    attached.push(item);
                }
            }
        }
        Target::Collection(name) => {
            let list = doc.collections.entry(name.clone()).or_default();
            for item in candidates {
                if list.items.iter().any(|existing| existing.identity() == item.identity()) {
                    continue;
                }
                list.push(item.clone());
                attached.push(item);
            }
        }
    }

    if attached.is_empty() {
        tracing::debug!("Every key was already attached, nothing to write");
        return Ok((doc, attached));
    }
    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Attached {} uploaded object(s)", attached.len());
    Ok((doc, attached))
}

/// Appends a video link unless the collection already holds that exact URL.
pub async fn add_video_link(
    store: &dyn ObjectStore,
    doc_key: &str,
    collection: &str,
    url: &str,
    title: Option<String>,
) -> GalleryResult<GalleryDocument> {
    let name = collection_name(collection)?;
    let url = url.trim();
    if url.is_empty() {
        return Err(GalleryError::invalid_argument("Missing video url"));
    }
    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;

    let list = doc
        .collections
        .entry(name.clone())
        .or_insert_with(|| Collection::new(CollectionKind::Videos));
    if list.items.iter().any(|item| item.is_video() && item.url() == url) {
        tracing::debug!("Video {} already in {}", url, name);
        return Ok(doc);
    }
    list.push(MediaItem::video(url, title.filter(|t| !t.trim().is_empty())));

    commit(store, doc_key, &mut doc).await?;
    Ok(doc)
}

/// Renames a collection. When `new_name` already exists the old items are
/// appended to it.
pub async fn rename_collection(
    store: &dyn ObjectStore,
    doc_key: &str,
    old_name: &str,
    new_name: &str,
) -> GalleryResult<GalleryDocument> {
    let old_name = collection_name(old_name)?;
    let new_name = collection_name(new_name)?;
    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;

    if !doc.collections.contains_key(&old_name) {
        return Err(GalleryError::not_found(format!("Collection {} not found", old_name)));
    }
    if old_name == new_name {
        return Ok(doc);
    }

    let moved = doc.collections.remove(&old_name).unwrap_or_default();
    match doc.collections.get_mut(&new_name) {
        Some(existing) => existing.extend(moved.items),
        None => {
            doc.collections.insert(new_name.clone(), moved);
        }
    }

    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Renamed collection {} to {}", old_name, new_name);
    Ok(doc)
}

/// Removes a collection and attempts to delete every stored object it references.
pub async fn delete_collection(
    store: &dyn ObjectStore,
    doc_key: &str,
    name: &str,
) -> GalleryResult<GalleryDocument> {
    if is_reserved_name(name.trim()) || is_reserved_name(&sanitize_name(name)) {
        return Err(GalleryError::invalid_operation(
            "The hero slider cannot be deleted as a collection",
        ));
    }
    let name = collection_name(name)?;
    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;

    let Some(removed) = doc.collections.remove(&name) else {
        return Err(GalleryError::not_found(format!("Collection {} not found", name)));
    };
    for item in &removed.items {
        destroy_best_effort(store, item).await;
    }

    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Deleted collection {} ({} items)", name, removed.items.len());
    Ok(doc)
}

/// Removes the first item matching `url` (any URL field or the external id).
///
/// With `is_hero` (or a reserved slider name) only the slider is searched. With a
/// collection name only that collection is searched, otherwise every collection
/// in name order.
pub async fn delete_item(
    store: &dyn ObjectStore,
    doc_key: &str,
    collection: Option<&str>,
    url: &str,
    is_hero: bool,
) -> GalleryResult<GalleryDocument> {
    if url.is_empty() {
        return Err(GalleryError::invalid_argument("Missing url"));
    }
    let collection = collection.map(str::trim).filter(|c| !c.is_empty());
    let target = match collection {
        Some(name) => Some(Target::resolve(Some(name), is_hero)?),
        None if is_hero => Some(Target::Slider),
        None => None,
    };

    let mut doc: GalleryDocument = document::load_for_update(store, doc_key).await?;

    let removed = match target {
        Some(Target::Slider) => doc
            .slider
            .iter()
            .position(|item| item.matches(url))
            .map(|idx| doc.slider.remove(idx)),
        Some(Target::Collection(name)) => {
            let list = doc
                .collections
                .get_mut(&name)
                .ok_or_else(|| GalleryError::not_found(format!("Collection {} not found", name)))?;
            list.items
                .iter()
                .position(|item| item.matches(url))
                .map(|idx| list.items.remove(idx))
        }
        None => doc.collections.values_mut().find_map(|list| {
            list.items
                .iter()
                .position(|item| item.matches(url))
                .map(|idx| list.items.remove(idx))
        }),
    };

    let Some(removed) = removed else {
        return Err(GalleryError::not_found("Image not found"));
    };
    destroy_best_effort(store, &removed).await;

    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Deleted item {}", removed.identity());
    Ok(doc)
}
