//! Object storage contract for product photos.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// A photo ready to be stored under `name`. The extension of `name` must
/// agree with `content_type`, since readers derive the type from the name.
#[derive(Debug, Clone)]
pub struct PhotoObject {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl PhotoObject {
    /// Check that `content_type` is one of the types the name's extension
    /// maps to.
    pub fn ensure_content_type(&self) -> Result<(), StorageError> {
        let essence = self.content_type.split(';').next().unwrap_or_default().trim();
        if mime_guess::from_path(&self.name)
            .iter()
            .any(|guessed| guessed.essence_str().eq_ignore_ascii_case(essence))
        {
            return Ok(());
        }
        Err(StorageError::ContentTypeMismatch {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object reference `{0}` is not managed by this store")]
    ForeignReference(String),
    #[error("invalid object name `{0}`")]
    InvalidName(String),
    #[error("content type `{content_type}` does not match object name `{name}`")]
    ContentTypeMismatch { name: String, content_type: String },
    #[error("object payload is empty")]
    EmptyPayload,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store the object and return its public reference.
    async fn upload(&self, object: PhotoObject) -> Result<String, StorageError>;

    /// Remove a previously returned reference. Missing objects are not an
    /// error.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}
