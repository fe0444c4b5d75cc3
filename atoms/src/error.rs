use lambda_http::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Failure taxonomy shared by the gallery and card units.
///
/// Messages are shown to admin users verbatim, so they stay plain sentences.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("media store unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl GalleryError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidOperation(_) => StatusCode::CONFLICT,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<StoreError> for GalleryError {
    fn from(err: StoreError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

pub type GalleryResult<T> = Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_kind_to_a_distinct_status() {
        assert_eq!(GalleryError::invalid_argument("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(GalleryError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(GalleryError::invalid_operation("x").status(), StatusCode::CONFLICT);
        assert_eq!(GalleryError::upstream("x").status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn store_errors_become_upstream_failures() {
        let err: GalleryError = StoreError::Transport("connection reset".into()).into();
        assert!(matches!(err, GalleryError::UpstreamUnavailable(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
