pub mod http;
pub mod legacy;
pub mod model;
pub mod service;
pub mod view;

pub use http::*;
pub use model::{
    sanitize_name, Collection, CollectionKind, GalleryCommand, GalleryDocument, ImageItem,
    MediaItem, VideoLink,
};
pub use service::{FailedUpload, UploadReport};
pub use view::{display_view, GalleryView};
