//! Filesystem-backed photo storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

use crate::application::storage::{ObjectStorage, PhotoObject, StorageError};

/// Stores photos as flat files under `root` and hands out references of the
/// form `<public_base_url><name>`.
#[derive(Debug)]
pub struct FilesystemStorage {
    root: PathBuf,
    public_base_url: Url,
}

impl FilesystemStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base_url: Url) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a stored photo by object name.
    pub async fn read(&self, name: &str) -> Result<Bytes, StorageError> {
        let absolute = self.resolve(name)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn reference_for(&self, name: &str) -> Result<String, StorageError> {
        let reference = self
            .public_base_url
            .join(name)
            .map(String::from)
            .map_err(|_| StorageError::InvalidName(name.to_string()))?;
        // The name must survive URL parsing unchanged so `delete` can map the
        // reference back to the file.
        if self.name_from_reference(&reference).ok() != Some(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(reference)
    }

    /// Object name behind a reference previously returned by `upload`.
    fn name_from_reference<'a>(&self, reference: &'a str) -> Result<&'a str, StorageError> {
        reference
            .strip_prefix(self.public_base_url.as_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StorageError::ForeignReference(reference.to_string()))
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative)),
            _ => Err(StorageError::InvalidName(name.to_string())),
        }
    }
}

#[async_trait]
impl ObjectStorage for FilesystemStorage {
    async fn upload(&self, object: PhotoObject) -> Result<String, StorageError> {
        if object.data.is_empty() {
            return Err(StorageError::EmptyPayload);
        }

        object.ensure_content_type()?;
        let absolute = self.resolve(&object.name)?;
        let reference = self.reference_for(&object.name)?;

        let mut file = fs::File::create(&absolute).await?;
        if let Err(err) = file.write_all(&object.data).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(StorageError::Io(err));
        }
        file.flush().await?;

        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        let name = self.name_from_reference(reference)?;
        let absolute = self.resolve(name)?;
        match fs::remove_file(&absolute).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}
