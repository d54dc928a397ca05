//! Error types shared by every Hatewatch crate.
//!
//! Stage-specific failures (schema, training, evaluation, ...) live in
//! `hatewatch-ml`; this module only covers what the core itself can fail at:
//! talking to remote storage and loading configuration.

use std::path::PathBuf;

/// Errors from the remote sync gateway.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The requested object does not exist in the bucket.
    #[error("Object '{object}' not found in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, object: String },

    #[error("Local file not found: {}", path.display())]
    LocalFileMissing { path: PathBuf },

    #[error("Invalid object name '{object}'")]
    InvalidObjectName { object: String },

    #[error("Command '{command}' exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether this error means the remote object is absent, as opposed to
    /// the transfer itself failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound { .. })
    }
}

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let missing = SyncError::ObjectNotFound {
            bucket: "hatewatch-artifacts".into(),
            object: "model.json".into(),
        };
        let failed = SyncError::CommandFailed {
            command: "gsutil cp".into(),
            status: 1,
            stderr: "AccessDeniedException: 403".into(),
        };
        assert!(missing.is_not_found());
        assert!(!failed.is_not_found());
        assert_eq!(
            missing.to_string(),
            "Object 'model.json' not found in bucket 'hatewatch-artifacts'"
        );
    }
}
