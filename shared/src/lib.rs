//! AWS-backed services and the cross-cutting handlers (contact form, upload
//! credentials) used by the API lambda.

pub mod config;
pub mod contact;
pub mod email;
pub mod s3_store;
pub mod upload_signature;

use std::sync::Arc;

use vst_atoms::ObjectStore;

pub use config::{Config, ConfigError, MediaBackend};
pub use email::{Mailer, MailError, OutgoingMail, SesMailer};
pub use s3_store::S3Store;

/// Clients and settings built once per cold start and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}
