use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::{BoxFuture, FutureExt};

use crate::errors::BackendError;

pub trait Store: Send + Sync {
    /// The type of successful result.
    type Output;

    /// The type of raw data.
    type Raw;

    /// Saves the given data under a name derived from the original
    /// filename.
    fn save(&self, filename: &str, raw: Self::Raw)
        -> BoxFuture<Result<Self::Output, BackendError>>;
}

/// A store that writes uploaded files to a local directory.
///
/// The directory must already exist; the store never creates it.
pub struct DiskStore {
    directory: PathBuf,
}

impl DiskStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Derives a storage name from the upload time in milliseconds
    /// and the sanitized original filename, so repeated uploads of
    /// the same file land under distinct names.
    fn storage_name(&self, filename: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis();

        format!("{}-{}", millis, sanitize(filename))
    }
}

impl Store for DiskStore {
    type Output = PathBuf;
    type Raw = Vec<u8>;

    fn save(&self, filename: &str, raw: Vec<u8>) -> BoxFuture<Result<PathBuf, BackendError>> {
        let path = self.directory.join(self.storage_name(filename));

        async move {
            tokio::fs::write(&path, &raw)
                .await
                .map_err(|source| BackendError::FileWriteFailed { source })?;

            Ok(path)
        }
        .boxed()
    }
}

/// Strips any path components and hostile characters from a
/// client-supplied filename.
fn sanitize(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_owned());

    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
