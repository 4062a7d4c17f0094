//! Error types for the dub build plugins
//!
//! Every failure aborts the build step and is surfaced unchanged to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the build plugins
#[derive(Error, Debug)]
pub enum BuilderError {
    /// The external build command ran but exited unsuccessfully, or could not be started
    #[error("External command failed: {command}: {message}")]
    ExternalCommandFailed {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// The build output expected by the copy phase is absent or unreadable
    #[error("Artifact directory missing: {}", path.display())]
    ArtifactDirectoryMissing {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A destination that must be created fresh already exists
    #[error("Destination already exists: {}", path.display())]
    DestinationConflict { path: PathBuf },

    /// Plugin options are malformed or contradictory
    #[error("Invalid configuration: {message}")]
    ConfigurationInvalid { message: String },

    /// File system operation errors
    #[error("File system error: {operation} failed on {}", path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuilderError {
    /// Create a new external command error
    pub fn external_command(
        command: impl Into<String>,
        exit_code: Option<i32>,
        message: impl Into<String>,
    ) -> Self {
        Self::ExternalCommandFailed {
            command: command.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a new missing artifact directory error
    pub fn artifact_directory_missing<P: Into<PathBuf>>(
        path: P,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::ArtifactDirectoryMissing {
            path: path.into(),
            source,
        }
    }

    /// Create a new destination conflict error
    pub fn destination_conflict<P: Into<PathBuf>>(path: P) -> Self {
        Self::DestinationConflict { path: path.into() }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, BuilderError>;
