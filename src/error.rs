//! Error taxonomy for the push workflow.
//!
//! Every failure a push can hit is a [`SyncError`] variant. Per-lesson errors
//! (`TranslationNotFound`, `Lookup`, `Upload`, `Link`, `Archive`) are returned
//! to the caller after the lesson's archive has been removed.
//! `Authentication` and `CancelledByUser` end the whole run.

use std::path::PathBuf;

use crate::contract::RemoteId;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("couldn't log in to {environment} (status {status})")]
    Authentication { environment: String, status: u16 },

    #[error("no '{locale}' translation found for lesson {lesson_id}")]
    TranslationNotFound { lesson_id: RemoteId, locale: String },

    #[error("request for {resource} failed with status {status}")]
    Lookup { resource: String, status: u16 },

    #[error("upload of {filename} failed with status {status}")]
    Upload { filename: String, status: u16 },

    #[error("linking upload to lesson {lesson_id} failed with status {status}")]
    Link { lesson_id: RemoteId, status: u16 },

    #[error("cancelled by user")]
    CancelledByUser,

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
