use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GALLERY_DOCUMENT_KEY: &str = "data/gallery.json";
pub const DEFAULT_CARDS_DOCUMENT_KEY: &str = "data/home-cards.json";
pub const DEFAULT_UPLOAD_URL_TTL_SECS: u64 = 600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaBackend {
    S3,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub media_backend: MediaBackend,
    pub media_bucket: String,
    pub media_public_base_url: String,
    pub gallery_document_key: String,
    pub cards_document_key: String,
    pub upload_url_ttl: Duration,
    pub contact_to_address: Option<String>,
    pub contact_from_address: Option<String>,
    pub allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let media_backend = match var("MEDIA_BACKEND").as_deref() {
            None | Some("s3") => MediaBackend::S3,
            Some("memory") => MediaBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "MEDIA_BACKEND",
                    value: other.to_string(),
                    reason: "expected s3 or memory".to_string(),
                })
            }
        };

        let media_bucket = match (media_backend, var("MEDIA_BUCKET")) {
            (_, Some(bucket)) => bucket,
            (MediaBackend::Memory, None) => String::new(),
            (MediaBackend::S3, None) => return Err(ConfigError::Missing("MEDIA_BUCKET")),
        };

        let media_public_base_url = match var("MEDIA_PUBLIC_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if media_backend == MediaBackend::S3 => {
                format!("https://{}.s3.amazonaws.com", media_bucket)
            }
            None => "http://localhost:9000/media".to_string(),
        };

        let upload_url_ttl = match var("UPLOAD_URL_TTL_SECS") {
            None => Duration::from_secs(DEFAULT_UPLOAD_URL_TTL_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: "UPLOAD_URL_TTL_SECS",
                        value: raw,
                        reason: "must be positive".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "UPLOAD_URL_TTL_SECS",
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
        };

        Ok(Self {
            media_backend,
            media_bucket,
            media_public_base_url,
            gallery_document_key: var("GALLERY_DOCUMENT_KEY")
                .unwrap_or_else(|| DEFAULT_GALLERY_DOCUMENT_KEY.to_string()),
            cards_document_key: var("CARDS_DOCUMENT_KEY")
                .unwrap_or_else(|| DEFAULT_CARDS_DOCUMENT_KEY.to_string()),
            upload_url_ttl,
            contact_to_address: var("CONTACT_TO_ADDRESS"),
            contact_from_address: var("CONTACT_FROM_ADDRESS"),
            allowed_origin: var("ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn s3_backend_needs_a_bucket() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("MEDIA_BUCKET"));
    }

    #[test]
    fn defaults_fill_the_rest() {
        let config = config(&[("MEDIA_BUCKET", "vst-media")]).unwrap();
        assert_eq!(config.media_backend, MediaBackend::S3);
        assert_eq!(config.media_public_base_url, "https://vst-media.s3.amazonaws.com");
        assert_eq!(config.gallery_document_key, "data/gallery.json");
        assert_eq!(config.cards_document_key, "data/home-cards.json");
        assert_eq!(config.upload_url_ttl, Duration::from_secs(600));
        assert_eq!(config.allowed_origin, "*");
        assert_eq!(config.contact_to_address, None);
    }

    #[test]
    fn memory_backend_and_overrides() {
        let config = config(&[
            ("MEDIA_BACKEND", "memory"),
            ("MEDIA_PUBLIC_BASE_URL", "https://cdn.example/"),
            ("UPLOAD_URL_TTL_SECS", "120"),
            ("CONTACT_TO_ADDRESS", " office@example.org "),
        ])
        .unwrap();
        assert_eq!(config.media_backend, MediaBackend::Memory);
        assert_eq!(config.media_public_base_url, "https://cdn.example");
        assert_eq!(config.upload_url_ttl, Duration::from_secs(120));
        assert_eq!(config.contact_to_address.as_deref(), Some("office@example.org"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("MEDIA_BACKEND", "cloudinary")]),
            Err(ConfigError::Invalid { name: "MEDIA_BACKEND", .. })
        ));
        assert!(matches!(
            config(&[("MEDIA_BACKEND", "memory"), ("UPLOAD_URL_TTL_SECS", "0")]),
            Err(ConfigError::Invalid { name: "UPLOAD_URL_TTL_SECS", .. })
        ));
    }
}
