use lambda_http::http::{HeaderMap, StatusCode};
use lambda_http::{Body, Error as LambdaError, Response};

use super::model::{DeletePayload, GalleryCommand};
use super::service::{
    add_items, add_video_link, attach_uploads, create_collection, delete_collection,
    delete_item, read, rename_collection,
};
use super::view::display_view;
use crate::store::ObjectStore;
use crate::web::{
    body_kind, content_type, error_response, gallery_error_response, json_response,
    parse_multipart, unsupported_content_type, BodyKind,
};

/// Collection used for multipart uploads that name no event.
const DEFAULT_COLLECTION: &str = "default_event";

/// HTTP Handler: GET /api/event-photos[?view=display]
pub async fn get_gallery_handler(
    store: &dyn ObjectStore,
    doc_key: &str,
    view: Option<&str>,
) -> Result<Response<Body>, LambdaError> {
    let doc = read(store, doc_key).await;
    match view {
        Some("display") => json_response(StatusCode::OK, &display_view(&doc)),
        _ => json_response(StatusCode::OK, &doc),
    }
}

/// HTTP Handler: POST /api/event-photos (JSON command or multipart upload)
pub async fn post_gallery_handler(
    store: &dyn ObjectStore,
    doc_key: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    match body_kind(headers) {
        BodyKind::Json => run_command(store, doc_key, body).await,
        BodyKind::Multipart => upload_files(store, doc_key, content_type(headers), body).await,
        BodyKind::Other => unsupported_content_type(),
    }
}

async fn run_command(
    store: &dyn ObjectStore,
    doc_key: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let command: GalleryCommand = match serde_json::from_slice(body) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Unsupported gallery command: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Unsupported JSON command: {}", e),
            );
        }
    };
    tracing::info!("Gallery command: {:?}", command);

    let result = match command {
        GalleryCommand::CreateCollection { name, kind } => {
            create_collection(store, doc_key, &name, kind).await
        }
        GalleryCommand::AddVideoLink {
            collection,
            url,
            title,
        } => add_video_link(store, doc_key, &collection, &url, title).await,
        GalleryCommand::RenameCollection { old_name, new_name } => {
            rename_collection(store, doc_key, &old_name, &new_name).await
        }
        GalleryCommand::AttachUploads {
            collection,
            hero,
            keys,
        } => {
            return match attach_uploads(store, doc_key, collection.as_deref(), hero, &keys).await {
                Ok((document, attached)) => json_response(
                    StatusCode::OK,
                    &serde_json::json!({ "document": document, "attached": attached }),
                ),
                Err(e) => gallery_error_response(&e),
            };
        }
    };

    match result {
        Ok(document) => json_response(StatusCode::OK, &document),
        Err(e) => gallery_error_response(&e),
    }
}

async fn upload_files(
    store: &dyn ObjectStore,
    doc_key: &str,
    content_type: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let form = match parse_multipart(content_type, body).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!("Rejected upload body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let hero = form.flag("hero");
    let collection = ["eventName", "eventname", "event"]
        .into_iter()
        .find_map(|name| form.field(name))
        .unwrap_or(DEFAULT_COLLECTION)
        .to_string();
    tracing::info!(
        "📎 Upload of {} file(s) to {}",
        form.files.len(),
        if hero { "slider" } else { collection.as_str() }
    );

    match add_items(store, doc_key, Some(&collection), form.files, hero).await {
        Ok((document, report)) if report.succeeded.is_empty() => json_response(
            StatusCode::BAD_GATEWAY,
            &serde_json::json!({
                "error": "No files were uploaded",
                "document": document,
                "report": report
            }),
        ),
        Ok((document, report)) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "document": document, "report": report }),
        ),
        Err(e) => gallery_error_response(&e),
    }
}

/// HTTP Handler: DELETE /api/event-photos
pub async fn delete_gallery_handler(
    store: &dyn ObjectStore,
    doc_key: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: DeletePayload = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid delete request: {}", e))
        }
    };

    let result = match (&payload.url, &payload.collection) {
        (Some(url), collection) => {
            delete_item(store, doc_key, collection.as_deref(), url, payload.hero).await
        }
        (None, Some(collection)) => delete_collection(store, doc_key, collection).await,
        (None, None) => return error_response(StatusCode::BAD_REQUEST, "Invalid delete request"),
    };

    match result {
        Ok(document) => json_response(StatusCode::OK, &document),
        Err(e) => gallery_error_response(&e),
    }
}
