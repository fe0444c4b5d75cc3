use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CARDS_SCHEMA_VERSION: u64 = 1;

/// Home-page promotional block. `image_src` is empty for text-only cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub image_src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(name: impl Into<String>, about: impl Into<String>, image_src: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            about: about.into(),
            image_src: image_src.into(),
            external_id: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsDocument {
    pub version: u64,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Default for CardsDocument {
    fn default() -> Self {
        Self {
            version: CARDS_SCHEMA_VERSION,
            cards: Vec::new(),
        }
    }
}

/// Card shape written before the document was versioned.
#[derive(Debug, Deserialize)]
struct LegacyCard {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    about: String,
    #[serde(default)]
    src: String,
    #[serde(default)]
    public_id: Option<String>,
    #[serde(default, rename = "createdAt")]
    created_at: Option<String>,
}

impl From<LegacyCard> for Card {
    fn from(legacy: LegacyCard) -> Self {
        let id = match legacy.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        let created_at = legacy
            .created_at
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH);

        Card {
            id,
            name: legacy.name,
            about: legacy.about,
            image_src: legacy.src,
            external_id: legacy.public_id.filter(|id| !id.is_empty()),
            created_at,
        }
    }
}

pub(crate) fn migrate_legacy(value: Value) -> Result<CardsDocument, String> {
    let cards = match value {
        Value::Object(mut map) => map.remove("cards").unwrap_or(Value::Array(vec![])),
        Value::Array(items) => Value::Array(items),
        Value::Null => Value::Array(vec![]),
        other => return Err(format!("expected a cards object, found {}", other)),
    };
    let legacy: Vec<LegacyCard> = serde_json::from_value(cards).map_err(|e| e.to_string())?;

    Ok(CardsDocument {
        version: CARDS_SCHEMA_VERSION,
        cards: legacy.into_iter().map(Card::from).collect(),
    })
}

/// Body of `POST /api/home-cards` when sent as JSON.
#[derive(Debug, Deserialize)]
pub struct CreateCardPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub src: Option<String>,
}

/// Body of `DELETE /api/home-cards`.
#[derive(Debug, Deserialize)]
pub struct DeleteCardPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_cards_are_renamed() {
        let doc = migrate_legacy(json!({
            "cards": [
                {
                    "id": "1700000000000-1234567",
                    "name": "Food Drive",
                    "about": "Weekly",
                    "src": "https://res.example/home_cards/a.jpg",
                    "public_id": "home_cards/a",
                    "createdAt": "2024-03-01T10:00:00.000Z"
                },
                { "name": "Text only", "src": "" }
            ]
        }))
        .unwrap();

        assert_eq!(doc.version, 1);
        let card = &doc.cards[0];
        assert_eq!(card.id, "1700000000000-1234567");
        assert_eq!(card.image_src, "https://res.example/home_cards/a.jpg");
        assert_eq!(card.external_id.as_deref(), Some("home_cards/a"));
        assert_eq!(card.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");

        let text_only = &doc.cards[1];
        assert!(!text_only.id.is_empty());
        assert_eq!(text_only.external_id, None);
        assert_eq!(text_only.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn card_wire_shape_is_camel_case() {
        let mut card = Card::new("Camp", "Summer", "https://m/c.jpg");
        card.external_id = Some("home_cards/c".into());
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["imageSrc"], json!("https://m/c.jpg"));
        assert_eq!(value["externalId"], json!("home_cards/c"));
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn empty_legacy_document_has_no_cards() {
        assert!(migrate_legacy(json!({})).unwrap().cards.is_empty());
        assert!(migrate_legacy(json!("nope")).is_err());
    }
}
