//! Port for storing uploaded post images.

use async_trait::async_trait;

use crate::domain::{Error, ImageUpload};

use super::define_port_error;

define_port_error! {
    /// Errors raised by image store adapters.
    pub enum ImageStoreError {
        /// Writing or removing the file failed.
        Io { message: String } => "image store I/O failed: {message}",
    }
}

impl From<ImageStoreError> for Error {
    fn from(value: ImageStoreError) -> Self {
        match value {
            ImageStoreError::Io { message } => Self::internal(message),
        }
    }
}

/// Location of a stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// File name inside the upload directory.
    pub file_name: String,
    /// Public URL recorded on the post.
    pub url: String,
}

/// Storage contract for post images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the upload under a fresh, unique name.
    async fn save(&self, upload: &ImageUpload) -> Result<StoredImage, ImageStoreError>;

    /// Remove a previously stored file.
    async fn remove(&self, file_name: &str) -> Result<(), ImageStoreError>;
}
