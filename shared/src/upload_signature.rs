use lambda_http::{http::StatusCode, Body, Error, Response};
use std::time::Duration;

use vst_atoms::gallery::model::is_reserved_name;
use vst_atoms::gallery::sanitize_name;
use vst_atoms::store::object_key;
use vst_atoms::web::{error_response, json_response, UPSTREAM_FAILURE_MESSAGE};
use vst_atoms::{GalleryError, ObjectStore};

/// Resolves the `folder` query parameter to a storage folder the admin may
/// upload into: `slider`, `home_cards` or `events/{collection}`.
pub fn upload_folder(raw: &str) -> Result<String, GalleryError> {
    let raw = raw.trim().trim_matches('/');
    if matches!(raw, "slider" | "home_cards") {
        return Ok(raw.to_string());
    }
    let Some(collection) = raw.strip_prefix("events/") else {
        return Err(GalleryError::invalid_argument(format!("Unsupported upload folder {}", raw)));
    };
    let name = sanitize_name(collection);
    if name.is_empty() {
        return Err(GalleryError::invalid_argument("Missing collection name"));
    }
    if is_reserved_name(&name) {
        return Err(GalleryError::invalid_operation(
            "The hero slider cannot be used as a collection",
        ));
    }
    Ok(format!("events/{}", name))
}

/// HTTP Handler: GET /api/upload-signature?folder=..&fileName=..&contentType=..
pub async fn handle_upload_signature(
    store: &dyn ObjectStore,
    ttl: Duration,
    folder: Option<&str>,
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<Response<Body>, Error> {
    let Some(folder) = folder else {
        return error_response(StatusCode::BAD_REQUEST, "Missing folder");
    };
    let folder = match upload_folder(folder) {
        Ok(folder) => folder,
        Err(e) => return error_response(e.status(), &e.to_string()),
    };

    let key = object_key(&folder, file_name.unwrap_or_default());
    let content_type = content_type.filter(|ct| !ct.is_empty());
    match store.presign_upload(&key, content_type, ttl).await {
        Ok(upload) => {
            tracing::info!("Issued upload credential for {}", upload.key);
            json_response(StatusCode::OK, &upload)
        }
        Err(e) => {
            tracing::error!("Failed to presign {}: {}", key, e);
            error_response(StatusCode::BAD_GATEWAY, UPSTREAM_FAILURE_MESSAGE)
        }
    }
}
