//! Domain units for the Versatile Service Trust site backend.
//!
//! Each unit owns its serde model, the service logic that reads and rewrites its
//! JSON document in the object store, and the lambda_http handlers that expose it.

pub mod cards;
pub mod document;
pub mod error;
pub mod gallery;
pub mod store;
pub mod web;

pub use error::GalleryError;
pub use store::{
    MemoryStore, ObjectStore, PresignedUpload, StoreError, StoredObject, UploadFile,
};
