use lambda_http::http::{HeaderMap, StatusCode};
use lambda_http::{Body, Error as LambdaError, Response};

use super::model::{CreateCardPayload, DeleteCardPayload};
use super::service::{create, create_from_source, delete_by_id, delete_by_src, list};
use crate::store::ObjectStore;
use crate::web::{
    body_kind, content_type, error_response, gallery_error_response, json_response,
    parse_multipart, unsupported_content_type, BodyKind,
};

/// HTTP Handler: GET /api/home-cards
pub async fn get_cards_handler(
    store: &dyn ObjectStore,
    doc_key: &str,
) -> Result<Response<Body>, LambdaError> {
    let cards = list(store, doc_key).await;
    json_response(StatusCode::OK, &serde_json::json!({ "cards": cards }))
}

/// HTTP Handler: POST /api/home-cards (multipart with optional `file`, or JSON)
pub async fn post_card_handler(
    store: &dyn ObjectStore,
    doc_key: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = match body_kind(headers) {
        BodyKind::Multipart => {
            let mut form = match parse_multipart(content_type(headers), body).await {
                Ok(form) => form,
                Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
            };
            let name = form.field("name").unwrap_or_default().to_string();
            let about = form.field("about").unwrap_or_default().to_string();
            let image = if form.files.is_empty() {
                None
            } else {
                Some(form.files.remove(0))
            };
            create(store, doc_key, &name, &about, image).await
        }
        BodyKind::Json => {
            let payload: CreateCardPayload = match serde_json::from_slice(body) {
                Ok(payload) => payload,
                Err(e) => {
                    return error_response(StatusCode::BAD_REQUEST, &format!("Invalid card: {}", e))
                }
            };
            let src = payload.src.unwrap_or_default();
            create_from_source(store, doc_key, &payload.name, &payload.about, &src).await
        }
        BodyKind::Other => return unsupported_content_type(),
    };

    match result {
        Ok(card) => json_response(StatusCode::CREATED, &serde_json::json!({ "card": card })),
        Err(e) => gallery_error_response(&e),
    }
}

/// HTTP Handler: DELETE /api/home-cards with `{id}` or `{src}`
pub async fn delete_card_handler(
    store: &dyn ObjectStore,
    doc_key: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: DeleteCardPayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid delete request: {}", e))
        }
    };

    let id = payload.id.filter(|id| !id.is_empty());
    let src = payload.src.filter(|src| !src.is_empty());
    let result = match (id, src) {
        (Some(id), _) => delete_by_id(store, doc_key, &id).await,
        (None, Some(src)) => delete_by_src(store, doc_key, &src).await,
        (None, None) => return error_response(StatusCode::BAD_REQUEST, "Missing id or src"),
    };

    match result {
        Ok(cards) => json_response(StatusCode::OK, &serde_json::json!({ "cards": cards })),
        Err(e) => gallery_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::web::test_support::multipart_body;
    use lambda_http::http::header::CONTENT_TYPE;
    use serde_json::{json, Value};

    const DOC: &str = "data/home-cards.json";

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    fn body_json(resp: &Response<Body>) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn multipart_card_with_image() {
        let store = MemoryStore::new("https://media.test");
        let body = multipart_body(
            "cardb",
            &[("name", "Medical Camp"), ("about", "Free checkups")],
            &[("file", "camp.jpg", b"jpg")],
        );
        let resp = post_card_handler(&store, DOC, &headers("multipart/form-data; boundary=cardb"), &body)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let card = &body_json(&resp)["card"];
        assert_eq!(card["name"], json!("Medical Camp"));
        assert!(card["imageSrc"].as_str().unwrap().starts_with("https://media.test/home_cards/"));

        let resp = get_cards_handler(&store, DOC).await.unwrap();
        assert_eq!(body_json(&resp)["cards"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn json_card_and_delete_by_src() {
        let store = MemoryStore::new("https://media.test");
        let resp = post_card_handler(
            &store,
            DOC,
            &headers("application/json"),
            json!({"name": "Library", "about": "Books", "src": "https://m/l.jpg"})
                .to_string()
                .as_bytes(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(&resp)["card"]["imageSrc"], json!("https://m/l.jpg"));

        let resp = delete_card_handler(&store, DOC, json!({"src": "https://m/l.jpg"}).to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(body_json(&resp), json!({"cards": []}));
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let store = MemoryStore::new("https://media.test");
        let resp = post_card_handler(&store, DOC, &headers("application/json"), b"{\"about\":\"x\"}")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = post_card_handler(&store, DOC, &headers("text/plain"), b"x").await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let resp = delete_card_handler(&store, DOC, b"{}").await.unwrap();
        assert_eq!(body_json(&resp), json!({"error": "Missing id or src"}));

        let resp = delete_card_handler(&store, DOC, b"{\"id\": ").await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let message = body_json(&resp)["error"].as_str().unwrap().to_string();
        assert!(message.starts_with("Invalid delete request: "));

        let resp = delete_card_handler(&store, DOC, json!({"id": "nope"}).to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
