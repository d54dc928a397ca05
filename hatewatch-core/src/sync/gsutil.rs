//! Google Cloud Storage through the `gsutil` command-line tool.
//!
//! Follows the managed-subprocess pattern: spawn, wait, and turn a non-zero
//! exit status into a typed error instead of trusting the exit code blindly.

use super::{RemoteSync, check_object_name, object_name_of};
use crate::error::SyncError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Markers gsutil prints when the source URL matches nothing.
const NOT_FOUND_MARKERS: &[&str] = &["No URLs matched", "NotFoundException", "matched no objects"];

/// `gsutil cp` based gateway.
pub struct GsutilSync {
    binary: PathBuf,
}

impl GsutilSync {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    async fn run_cp(&self, source: &str, target: &str) -> Result<(), CpFailure> {
        let output = Command::new(&self.binary)
            .args(["cp", source, target])
            .output()
            .await
            .map_err(CpFailure::Spawn)?;
        if output.status.success() {
            return Ok(());
        }
        Err(CpFailure::Exit {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn command_line(&self, source: &str, target: &str) -> String {
        format!("{} cp {source} {target}", self.binary.display())
    }
}

enum CpFailure {
    Spawn(std::io::Error),
    Exit { status: i32, stderr: String },
}

#[async_trait]
impl RemoteSync for GsutilSync {
    async fn push(&self, bucket: &str, local_path: &Path) -> Result<(), SyncError> {
        if !tokio::fs::try_exists(local_path).await? {
            return Err(SyncError::LocalFileMissing {
                path: local_path.to_path_buf(),
            });
        }
        let object = object_name_of(local_path)?;
        let source = local_path.display().to_string();
        let target = format!("gs://{bucket}/{object}");
        let command = self.command_line(&source, &target);

        debug!(command = %command, "Running gsutil push");
        match self.run_cp(&source, &target).await {
            Ok(()) => {
                info!(bucket, object = %object, "Pushed object to GCS");
                Ok(())
            }
            Err(CpFailure::Spawn(source)) => Err(SyncError::Spawn { command, source }),
            Err(CpFailure::Exit { status, stderr }) => Err(SyncError::CommandFailed {
                command,
                status,
                stderr,
            }),
        }
    }

    async fn pull(
        &self,
        bucket: &str,
        object_name: &str,
        destination_dir: &Path,
    ) -> Result<PathBuf, SyncError> {
        check_object_name(object_name)?;
        tokio::fs::create_dir_all(destination_dir).await?;
        let source = format!("gs://{bucket}/{object_name}");
        let target_path = destination_dir.join(object_name);
        let target = target_path.display().to_string();
        let command = self.command_line(&source, &target);

        debug!(command = %command, "Running gsutil pull");
        match self.run_cp(&source, &target).await {
            Ok(()) => {
                info!(bucket, object = object_name, "Pulled object from GCS");
                Ok(target_path)
            }
            Err(CpFailure::Spawn(source)) => Err(SyncError::Spawn { command, source }),
            Err(CpFailure::Exit { stderr, .. })
                if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) =>
            {
                Err(SyncError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    object: object_name.to_string(),
                })
            }
            Err(CpFailure::Exit { status, stderr }) => Err(SyncError::CommandFailed {
                command,
                status,
                stderr,
            }),
        }
    }

    fn name(&self) -> &str {
        "gsutil"
    }
}
