//! Error taxonomy for the launch pipeline
//!
//! Validation and install failures abort a launch before any process is
//! spawned; restore failures are logged at the exit callback instead of
//! being surfaced, since no synchronous caller is left to receive them.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed identity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identity '{0}': must be a hex string of at most 32 digits")]
pub struct InvalidIdentity(pub String);

#[derive(Debug, Error)]
pub enum LauncherError {
    /// A required field is empty at every configuration layer
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("wrong api library name '{found}': expected '{expected}'")]
    WrongLibraryName { expected: String, found: String },

    #[error("failed to create backup directory {path}")]
    BackupDirCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to back up api library {from} to {to}")]
    BackupCopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install emulator library {from} over {to}")]
    InstallCopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create save directory {path}")]
    SaveDirCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write emulator settings {path}")]
    SettingsWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn '{exe}'")]
    SpawnFailed {
        exe: PathBuf,
        #[source]
        source: io::Error,
    },
}
