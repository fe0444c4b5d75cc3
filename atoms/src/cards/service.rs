use serde_json::Value;

use super::model::{migrate_legacy, Card, CardsDocument, CARDS_SCHEMA_VERSION};
use crate::document::{self, VersionedDocument};
use crate::error::{GalleryError, GalleryResult};
use crate::store::{object_key, ObjectStore, UploadFile};

/// Folder card images are uploaded under.
pub const CARDS_FOLDER: &str = "home_cards";

impl VersionedDocument for CardsDocument {
    const VERSION: u64 = CARDS_SCHEMA_VERSION;

    fn migrate_legacy(value: Value) -> Result<Self, String> {
        migrate_legacy(value)
    }
}

async fn commit(store: &dyn ObjectStore, doc_key: &str, doc: &mut CardsDocument) -> GalleryResult<()> {
    doc.version = CARDS_SCHEMA_VERSION;
    document::save(store, doc_key, doc).await
}

fn required_name(name: &str) -> GalleryResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GalleryError::invalid_argument("Card name is required"));
    }
    Ok(name.to_string())
}

/// Puts `card` first and writes the document. On a failed write the card's
/// uploaded image is removed again.
async fn prepend(
    store: &dyn ObjectStore,
    doc_key: &str,
    mut doc: CardsDocument,
    card: Card,
) -> GalleryResult<Card> {
    doc.cards.insert(0, card.clone());
    if let Err(e) = commit(store, doc_key, &mut doc).await {
        destroy_image(store, &card).await;
        return Err(e);
    }
    tracing::info!("Created card {} ({})", card.id, card.name);
    Ok(card)
}

async fn destroy_image(store: &dyn ObjectStore, card: &Card) {
    let Some(external_id) = card.external_id.as_deref() else {
        return;
    };
    if let Err(e) = store.destroy(external_id).await {
        tracing::warn!("Failed to destroy card image {}: {}", external_id, e);
    }
}

/// Cards, newest first. Never fails; an unreadable document reads as empty.
pub async fn list(store: &dyn ObjectStore, doc_key: &str) -> Vec<Card> {
    document::load_or_default::<CardsDocument>(store, doc_key)
        .await
        .cards
}

/// Creates a card, uploading `image` once the document is known to be writable.
pub async fn create(
    store: &dyn ObjectStore,
    doc_key: &str,
    name: &str,
    about: &str,
    image: Option<UploadFile>,
) -> GalleryResult<Card> {
    let name = required_name(name)?;
    let doc: CardsDocument = document::load_for_update(store, doc_key).await?;
    let mut card = Card::new(name, about.trim(), "");

    if let Some(file) = image {
        let key = object_key(CARDS_FOLDER, &file.file_name);
        let stored = store
            .upload(&key, file.bytes, file.content_type.as_deref())
            .await?;
        card.image_src = stored.url;
        card.external_id = Some(stored.key);
    }

    prepend(store, doc_key, doc, card).await
}

/// Creates a card around an image URL the caller already has.
pub async fn create_from_source(
    store: &dyn ObjectStore,
    doc_key: &str,
    name: &str,
    about: &str,
    src: &str,
) -> GalleryResult<Card> {
    let name = required_name(name)?;
    let doc: CardsDocument = document::load_for_update(store, doc_key).await?;
    prepend(store, doc_key, doc, Card::new(name, about.trim(), src.trim())).await
}

pub async fn delete_by_id(store: &dyn ObjectStore, doc_key: &str, id: &str) -> GalleryResult<Vec<Card>> {
    let mut doc: CardsDocument = document::load_for_update(store, doc_key).await?;
    let Some(idx) = doc.cards.iter().position(|card| card.id == id) else {
        return Err(GalleryError::not_found("Card not found"));
    };
    let removed = doc.cards.remove(idx);
    destroy_image(store, &removed).await;

    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Deleted card {}", removed.id);
    Ok(doc.cards)
}

/// Removes every card showing `src`. Matching nothing is not an error.
pub async fn delete_by_src(store: &dyn ObjectStore, doc_key: &str, src: &str) -> GalleryResult<Vec<Card>> {
    let mut doc: CardsDocument = document::load_for_update(store, doc_key).await?;
    let (removed, kept): (Vec<Card>, Vec<Card>) =
        doc.cards.into_iter().partition(|card| card.image_src == src);
    doc.cards = kept;
    for card in &removed {
        destroy_image(store, card).await;
    }

    commit(store, doc_key, &mut doc).await?;
    tracing::info!("Deleted {} card(s) showing {}", removed.len(), src);
    Ok(doc.cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const DOC: &str = "data/home-cards.json";

    fn stored_images(store: &MemoryStore) -> usize {
        store.object_keys().iter().filter(|k| k.starts_with("home_cards/")).count()
    }

    fn image(name: &str) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, 0x50],
        }
    }

    #[tokio::test]
    async fn new_cards_are_prepended() {
        let store = MemoryStore::new("https://media.test");
        create(&store, DOC, "First", "", None).await.unwrap();
        let second = create(&store, DOC, " Second ", " about ", Some(image("pic 1.png")))
            .await
            .unwrap();

        assert_eq!(second.name, "Second");
        assert_eq!(second.about, "about");
        let key = second.external_id.clone().unwrap();
        assert!(key.starts_with("home_cards/") && key.ends_with("-pic_1.png"));
        assert_eq!(second.image_src, format!("https://media.test/{}", key));
        assert!(store.contains(&key));

        let names: Vec<_> = list(&store, DOC).await.into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn name_is_required() {
        let store = MemoryStore::new("https://media.test");
        let err = create_from_source(&store, DOC, "  ", "", "x").await.unwrap_err();
        assert!(matches!(err, GalleryError::InvalidArgument(_)));
        assert!(!store.contains(DOC));
    }

    #[tokio::test]
    async fn failed_image_upload_creates_nothing() {
        let store = MemoryStore::new("https://media.test");
        store.reject_uploads_containing("home_cards/");
        let err = create(&store, DOC, "Card", "", Some(image("a.png"))).await.unwrap_err();
        assert!(matches!(err, GalleryError::UpstreamUnavailable(_)));
        assert!(list(&store, DOC).await.is_empty());
    }

    #[tokio::test]
    async fn delete_by_id_destroys_the_image() {
        let store = MemoryStore::new("https://media.test");
        let card = create(&store, DOC, "Card", "", Some(image("a.png"))).await.unwrap();
        let key = card.external_id.clone().unwrap();

        let cards = delete_by_id(&store, DOC, &card.id).await.unwrap();
        assert!(cards.is_empty());
        assert_eq!(store.destroyed_keys(), vec![key]);

        let err = delete_by_id(&store, DOC, &card.id).await.unwrap_err();
        assert!(matches!(err, GalleryError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_by_src_removes_every_match() {
        let store = MemoryStore::new("https://media.test");
        create_from_source(&store, DOC, "A", "", "https://m/x.jpg").await.unwrap();
        create_from_source(&store, DOC, "B", "", "https://m/y.jpg").await.unwrap();
        create_from_source(&store, DOC, "C", "", "https://m/x.jpg").await.unwrap();

        let cards = delete_by_src(&store, DOC, "https://m/x.jpg").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "B");

        let cards = delete_by_src(&store, DOC, "https://m/none.jpg").await.unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_document_lists_empty_but_blocks_writes() {
        let store = MemoryStore::new("https://media.test");
        store.put_raw(DOC, "{not json");
        assert!(list(&store, DOC).await.is_empty());

        let err = create_from_source(&store, DOC, "A", "", "").await.unwrap_err();
        assert!(matches!(err, GalleryError::UpstreamUnavailable(_)));

        let err = create(&store, DOC, "B", "", Some(image("b.png"))).await.unwrap_err();
        assert!(matches!(err, GalleryError::UpstreamUnavailable(_)));
        assert_eq!(store.get_raw(DOC).unwrap(), b"{not json");
        assert_eq!(stored_images(&store), 0);
    }

    #[tokio::test]
    async fn failed_document_write_removes_the_uploaded_image() {
        let store = MemoryStore::new("https://media.test");
        store.reject_uploads_containing("home-cards.json");

        let err = create(&store, DOC, "Card", "", Some(image("a.png"))).await.unwrap_err();
        assert!(matches!(err, GalleryError::UpstreamUnavailable(_)));
        assert_eq!(store.destroyed_keys().len(), 1);
        assert!(store.destroyed_keys()[0].starts_with("home_cards/"));
        assert_eq!(stored_images(&store), 0);
    }
}
