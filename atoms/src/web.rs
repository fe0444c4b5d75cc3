//! Response builders and request body decoding shared by the lambda handlers.

use bytes::Bytes;
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::http::{HeaderMap, StatusCode};
use lambda_http::{Body, Error as LambdaError, Response};
use serde::Serialize;
use thiserror::Error;

use crate::error::GalleryError;
use crate::store::UploadFile;

pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, LambdaError> {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// Sentence returned in place of store failure details, which stay in the logs.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "The media store is unavailable. Please try again later.";

pub fn gallery_error_response(err: &GalleryError) -> Result<Response<Body>, LambdaError> {
    match err {
        GalleryError::UpstreamUnavailable(_) => {
            tracing::error!("{}", err);
            error_response(err.status(), UPSTREAM_FAILURE_MESSAGE)
        }
        _ => {
            tracing::info!("Rejected request: {}", err);
            error_response(err.status(), &err.to_string())
        }
    }
}

pub fn not_found() -> Result<Response<Body>, LambdaError> {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

pub fn method_not_allowed() -> Result<Response<Body>, LambdaError> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub fn unsupported_content_type() -> Result<Response<Body>, LambdaError> {
    error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported content-type")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Multipart,
    Other,
}

pub fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub fn body_kind(headers: &HeaderMap) -> BodyKind {
    let content_type = content_type(headers).to_ascii_lowercase();
    if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else if content_type.starts_with("application/json") {
        BodyKind::Json
    } else {
        BodyKind::Other
    }
}

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("invalid multipart boundary: {0}")]
    Boundary(multer::Error),

    #[error("invalid multipart body: {0}")]
    Body(#[from] multer::Error),
}

/// Decoded `multipart/form-data` body: text fields in arrival order plus every
/// part that carried a file name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadFile>,
}

impl MultipartForm {
    /// First value of a text field, trimmed; empty values count as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// True for `1` or `true`, the values admin forms send for checkboxes.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.field(name), Some("1") | Some("true"))
    }
}

pub async fn parse_multipart(content_type: &str, body: &[u8]) -> Result<MultipartForm, MultipartError> {
    let boundary = multer::parse_boundary(content_type).map_err(MultipartError::Boundary)?;
    let bytes = Bytes::copy_from_slice(body);
    let stream = futures::stream::once(async move { Ok::<Bytes, std::convert::Infallible>(bytes) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = MultipartForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(|mime| mime.to_string());
                let bytes = field.bytes().await?;
                if bytes.is_empty() && file_name.is_empty() {
                    // Browsers send an empty part for an untouched file input.
                    continue;
                }
                form.files.push(UploadFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            None => {
                let value = field.text().await?;
                form.fields.push((name, value));
            }
        }
    }
    Ok(form)
}


#[cfg(test)]
mod tests {
    use super::test_support::multipart_body;
    use super::*;

    #[tokio::test]
    async fn parses_fields_and_files() {
        let body = multipart_body(
            "XyZ",
            &[("eventName", " Sports Day "), ("hero", "1")],
            &[("file", "a.jpg", b"one"), ("file", "b c.jpg", b"two")],
        );
        let form = parse_multipart("multipart/form-data; boundary=XyZ", &body)
            .await
            .unwrap();

        assert_eq!(form.field("eventName"), Some("Sports Day"));
        assert!(form.flag("hero"));
        assert_eq!(form.files.len(), 2);
        assert_eq!(form.files[1].file_name, "b c.jpg");
        assert_eq!(form.files[1].bytes, b"two");
        assert_eq!(form.files[0].content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn missing_boundary_is_an_error() {
        let err = parse_multipart("multipart/form-data", b"").await.unwrap_err();
        assert!(matches!(err, MultipartError::Boundary(_)));
    }

    #[test]
    fn flags_and_blank_fields() {
        let form = MultipartForm {
            fields: vec![("hero".into(), "0".into()), ("name".into(), "  ".into())],
            files: vec![],
        };
        assert!(!form.flag("hero"));
        assert_eq!(form.field("name"), None);
    }

    #[test]
    fn classifies_bodies_by_content_type() {
        let mut headers = HeaderMap::new();
        assert_eq!(body_kind(&headers), BodyKind::Other);
        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert_eq!(body_kind(&headers), BodyKind::Json);
        headers.insert(CONTENT_TYPE, "multipart/form-data; boundary=x".parse().unwrap());
        assert_eq!(body_kind(&headers), BodyKind::Multipart);
    }

    #[test]
    fn error_bodies_are_plain_messages() {
        let resp = gallery_error_response(&GalleryError::not_found("Image not found")).unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Image not found"}));
    }

    #[test]
    fn store_failures_do_not_leak_keys() {
        let err = GalleryError::upstream("fetch of data/gallery.json failed: dispatch failure");
        let resp = gallery_error_response(&err).unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body, serde_json::json!({"error": UPSTREAM_FAILURE_MESSAGE}));
    }
}
