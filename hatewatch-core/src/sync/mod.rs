//! Remote sync gateway: push and pull named objects to durable storage.
//!
//! The pipeline only depends on [`RemoteSync`]; which storage backs it is a
//! configuration choice. A pull of an object that does not exist must return
//! [`SyncError::ObjectNotFound`] so callers can tell "nothing published yet"
//! apart from a broken transfer.

pub mod gsutil;
pub mod local;

pub use gsutil::GsutilSync;
pub use local::LocalBucketSync;

use crate::config::{SyncBackend, SyncConfig};
use crate::error::SyncError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Gateway to remote object storage.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Upload `local_path` into `bucket`, under its file name.
    async fn push(&self, bucket: &str, local_path: &Path) -> Result<(), SyncError>;

    /// Download `object_name` from `bucket` into `destination_dir`.
    ///
    /// Returns the local path of the downloaded file. An existing local copy
    /// is overwritten.
    async fn pull(
        &self,
        bucket: &str,
        object_name: &str,
        destination_dir: &Path,
    ) -> Result<PathBuf, SyncError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Shared gateway handle passed to every stage that talks to the bucket.
pub type SharedSync = Arc<dyn RemoteSync>;

/// Build the gateway selected in configuration.
pub fn from_config(config: &SyncConfig) -> SharedSync {
    match config.backend {
        SyncBackend::Local => Arc::new(LocalBucketSync::new(config.local_root.clone())),
        SyncBackend::Gsutil => Arc::new(GsutilSync::new(config.gsutil_binary.clone())),
    }
}

/// Object names are flat: no separators, no parent references.
pub(crate) fn check_object_name(object_name: &str) -> Result<(), SyncError> {
    let bad = object_name.is_empty()
        || object_name == "."
        || object_name == ".."
        || object_name.contains(['/', '\\']);
    if bad {
        return Err(SyncError::InvalidObjectName {
            object: object_name.to_string(),
        });
    }
    Ok(())
}

/// Object name a local file is published under.
pub(crate) fn object_name_of(local_path: &Path) -> Result<String, SyncError> {
    local_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| SyncError::InvalidObjectName {
            object: local_path.display().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_object_name() {
        assert!(check_object_name("model.json").is_ok());
        assert!(check_object_name("").is_err());
        assert!(check_object_name("..").is_err());
        assert!(check_object_name("models/model.json").is_err());
    }

    #[test]
    fn test_from_config_selects_backend() {
        let local = from_config(&SyncConfig::default());
        assert_eq!(local.name(), "local");

        let gsutil = from_config(&SyncConfig {
            backend: SyncBackend::Gsutil,
            ..SyncConfig::default()
        });
        assert_eq!(gsutil.name(), "gsutil");
    }
}
