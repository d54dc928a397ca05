//! Data ingestion stage: publish the local dataset archive if there is one,
//! fetch the archive from the bucket and unpack it.

use crate::error::IngestionError;
use hatewatch_core::config::IngestionConfig;
use hatewatch_core::{DataIngestionArtifact, SharedSync};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EXTRACT_DIR: &str = "extracted";

pub struct DataIngestion {
    config: IngestionConfig,
    bucket_name: String,
    sync: SharedSync,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig, bucket_name: impl Into<String>, sync: SharedSync) -> Self {
        Self {
            config,
            bucket_name: bucket_name.into(),
            sync,
        }
    }

    pub async fn initiate_data_ingestion(
        &self,
        ingestion_dir: &Path,
    ) -> Result<DataIngestionArtifact, IngestionError> {
        self.push_local_dataset().await?;

        tokio::fs::create_dir_all(ingestion_dir).await?;
        let archive = self
            .sync
            .pull(&self.bucket_name, &self.config.zip_file_name, ingestion_dir)
            .await?;
        info!(
            backend = self.sync.name(),
            archive = %archive.display(),
            "Dataset archive fetched"
        );

        let extract_dir = ingestion_dir.join(EXTRACT_DIR);
        let entries = extract_archive(&archive, &extract_dir)?;
        info!(entries, dir = %extract_dir.display(), "Archive extracted");

        let raw_file_path = require_file(extract_dir.join(&self.config.raw_file_name))?;
        let imbalance_file_path =
            require_file(extract_dir.join(&self.config.imbalance_file_name))?;

        Ok(DataIngestionArtifact {
            imbalance_file_path,
            raw_file_path,
        })
    }

    async fn push_local_dataset(&self) -> Result<(), IngestionError> {
        let local = &self.config.local_dataset_path;
        if !tokio::fs::try_exists(local).await? {
            warn!(
                path = %local.display(),
                "Local dataset not found, using the archive already in the bucket"
            );
            return Ok(());
        }
        let published_as = local.file_name().and_then(|n| n.to_str());
        if published_as != Some(self.config.zip_file_name.as_str()) {
            warn!(
                path = %local.display(),
                expected = %self.config.zip_file_name,
                "Local dataset name differs from the archive name that will be fetched"
            );
        }
        self.sync.push(&self.bucket_name, local).await?;
        info!(path = %local.display(), bucket = %self.bucket_name, "Local dataset published");
        Ok(())
    }
}

/// Unpack `archive` into `dest`, returning the number of entries.
fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, IngestionError> {
    let zip_err = |source| IngestionError::Archive {
        path: archive.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(zip_err)?;
    let entries = zip.len();
    std::fs::create_dir_all(dest)?;
    zip.extract(dest).map_err(zip_err)?;
    Ok(entries)
}

fn require_file(path: PathBuf) -> Result<PathBuf, IngestionError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(IngestionError::MissingFile { path })
    }
}
