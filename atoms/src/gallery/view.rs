use serde::Serialize;
use std::collections::HashSet;

use super::model::{is_reserved_name, CollectionKind, GalleryDocument, MediaItem};

/// Identity keys of every slider entry.
pub fn hero_keys(doc: &GalleryDocument) -> HashSet<&str> {
    doc.slider
        .iter()
        .flat_map(|item| [item.identity(), item.url()])
        .collect()
}

/// Items of `items` that are not also on the hero slider, in order.
pub fn without_hero<'a>(items: &'a [MediaItem], heroes: &HashSet<&str>) -> Vec<&'a MediaItem> {
    items
        .iter()
        .filter(|item| !heroes.contains(item.identity()))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct CollectionView<'a> {
    pub name: &'a str,
    pub kind: CollectionKind,
    pub items: Vec<&'a MediaItem>,
}

#[derive(Debug, Serialize)]
pub struct GalleryView<'a> {
    pub collections: Vec<CollectionView<'a>>,
    pub slider: &'a [MediaItem],
}

/// Public gallery projection: hero items filtered out of their collections,
/// reserved names and empty collections dropped, sorted by name.
pub fn display_view(doc: &GalleryDocument) -> GalleryView<'_> {
    let heroes = hero_keys(doc);
    let collections = doc
        .collections
        .iter()
        .filter(|(name, _)| !is_reserved_name(name))
        .map(|(name, collection)| CollectionView {
            name,
            kind: collection.kind,
            items: without_hero(&collection.items, &heroes),
        })
        .filter(|view| !view.items.is_empty())
        .collect();

    GalleryView {
        collections,
        slider: &doc.slider,
    }
}
