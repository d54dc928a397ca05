//! Directory-backed buckets: `<root>/<bucket>/<object>`.

use super::{RemoteSync, check_object_name, object_name_of};
use crate::error::SyncError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A bucket store rooted at a local directory.
pub struct LocalBucketSync {
    root: PathBuf,
}

impl LocalBucketSync {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, SyncError> {
        check_object_name(bucket)?;
        Ok(self.root.join(bucket))
    }
}

#[async_trait]
impl RemoteSync for LocalBucketSync {
    async fn push(&self, bucket: &str, local_path: &Path) -> Result<(), SyncError> {
        if !tokio::fs::try_exists(local_path).await? {
            return Err(SyncError::LocalFileMissing {
                path: local_path.to_path_buf(),
            });
        }
        let object = object_name_of(local_path)?;
        let bucket_dir = self.bucket_dir(bucket)?;
        tokio::fs::create_dir_all(&bucket_dir).await?;
        tokio::fs::copy(local_path, bucket_dir.join(&object)).await?;
        debug!(bucket, object = %object, "Pushed object to local bucket");
        Ok(())
    }

    async fn pull(
        &self,
        bucket: &str,
        object_name: &str,
        destination_dir: &Path,
    ) -> Result<PathBuf, SyncError> {
        check_object_name(object_name)?;
        let source = self.bucket_dir(bucket)?.join(object_name);
        if !tokio::fs::try_exists(&source).await? {
            return Err(SyncError::ObjectNotFound {
                bucket: bucket.to_string(),
                object: object_name.to_string(),
            });
        }
        tokio::fs::create_dir_all(destination_dir).await?;
        let target = destination_dir.join(object_name);
        tokio::fs::copy(&source, &target).await?;
        debug!(bucket, object = object_name, target = %target.display(), "Pulled object from local bucket");
        Ok(target)
    }

    fn name(&self) -> &str {
        "local"
    }
}
