//! # contract: the seams between the push pipeline and the outside world
//!
//! The pipeline in [`crate::synchronise`] never talks to HTTP or the terminal
//! directly. It goes through two traits:
//! - [`LessonBackend`]: the fixed set of REST calls a push needs.
//! - [`CredentialPrompt`]: interactive email/password entry for logging in.
//!
//! Both are annotated for `mockall` so tests can script the backend and the
//! user without a network or a terminal.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Opaque identifier of a remote record.
///
/// The API hands out both numeric and string ids; the original JSON value is
/// kept so that it is sent back exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(serde_json::Value);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        RemoteId(serde_json::Value::String(s.to_owned()))
    }
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        RemoteId(serde_json::Value::String(s))
    }
}

impl From<i64> for RemoteId {
    fn from(n: i64) -> Self {
        RemoteId(serde_json::Value::from(n))
    }
}

/// A locale-specific variant of a lesson record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Translation {
    pub id: RemoteId,
    /// `None` when the record has no language assigned yet.
    pub languages_code: Option<String>,
}

/// Slug and parent course of a lesson, used to build its public URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LessonPage {
    pub slug: String,
    pub course: RemoteId,
}

/// Email/password pair exchanged for a bearer token.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// REST operations needed to push one lesson.
///
/// Implementations are already authenticated; every call carries the same
/// bearer token.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LessonBackend: Send + Sync {
    /// List the translations of a lesson.
    async fn translations(&self, lesson_id: &RemoteId) -> Result<Vec<Translation>, SyncError>;

    /// Upload an archive and return the id of the stored file.
    async fn upload_archive(&self, archive: &Path, filename: &str)
        -> Result<RemoteId, SyncError>;

    /// Point a lesson translation at an uploaded file.
    async fn link_translation(
        &self,
        lesson_id: &RemoteId,
        translation_id: &RemoteId,
        file_id: &RemoteId,
    ) -> Result<(), SyncError>;

    /// Fetch the slug and course of a lesson.
    async fn lesson_page(&self, lesson_id: &RemoteId) -> Result<LessonPage, SyncError>;

    /// Fetch the slug of a course.
    async fn course_slug(&self, course_id: &RemoteId) -> Result<String, SyncError>;
}

/// Interactive source of login credentials.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait CredentialPrompt {
    /// Ask for an email and a (masked) password for the named environment.
    fn credentials(&self, environment: &str) -> std::io::Result<Credentials>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_id_keeps_json_type() {
        let numeric: RemoteId = serde_json::from_str("42").unwrap();
        let text: RemoteId = serde_json::from_str("\"t1\"").unwrap();

        assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"t1\"");
        assert_eq!(numeric.to_string(), "42");
        assert_eq!(text.to_string(), "t1");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("a@b.c"));
        assert!(!printed.contains("hunter2"));
    }
}
