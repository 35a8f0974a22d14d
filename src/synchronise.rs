//! Push pipeline: translation lookup → archive → upload → link → cleanup.
//!
//! [`SyncClient`] owns an authenticated [`LessonBackend`] and pushes one
//! [`Lesson`] at a time. Each push runs its steps strictly in order behind a
//! single status line and stops at the first failing step.
//!
//! # Cleanup
//! The lesson's archive is deleted on every exit path before `push` returns:
//! success, a failing step, or a user interrupt. Interrupts surface as
//! [`SyncError::CancelledByUser`]; the CLI ends the process on it.
//!
//! # Translation lookup
//! The whole translation list is scanned for [`TARGET_LOCALE`]; an entry at
//! any position matches.

use std::future::Future;

use console::style;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Environment;
use crate::contract::{CredentialPrompt, LessonBackend, RemoteId, Translation};
use crate::error::SyncError;
use crate::lesson::Lesson;
use crate::progress::PushProgress;
use crate::upload::{login, HttpBackend};

/// Locale of the translation that receives the uploaded archive.
pub const TARGET_LOCALE: &str = "en-US";

/// Outcome of a successful push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushReport {
    pub lesson_id: RemoteId,
    pub admin_url: String,
    /// Public page of the lesson; `None` when URL lookup is switched off.
    pub web_page: Option<String>,
}

/// Find the translation for `locale`, looking at every entry.
/// Entries without a language code never match.
pub fn find_translation<'a>(
    translations: &'a [Translation],
    locale: &str,
) -> Option<&'a Translation> {
    translations
        .iter()
        .find(|t| t.languages_code.as_deref() == Some(locale))
}

pub struct SyncClient<B> {
    environment: Environment,
    backend: B,
    hide_urls: bool,
    show_progress: bool,
}

impl SyncClient<HttpBackend> {
    /// Authenticate against `environment`.
    ///
    /// A supplied `token` is used verbatim. Without one, credentials are read
    /// from `prompt` and exchanged at the login endpoint.
    pub async fn connect(
        environment: Environment,
        token: Option<String>,
        prompt: &dyn CredentialPrompt,
    ) -> Result<Self, SyncError> {
        let http = Client::new();
        let highlighted = environment.highlighted_name();

        let token = match token {
            Some(token) => {
                info!(environment = %environment.name, "Using supplied access token");
                println!("✅ Found token for {highlighted}");
                token
            }
            None => {
                println!("🔑 Log into {highlighted}:");
                let credentials = prompt.credentials(&environment.name)?;
                match login(&http, &environment.api_url, &environment.name, &credentials).await {
                    Ok(token) => {
                        println!("✅ Logged in");
                        token
                    }
                    Err(e) => {
                        println!("❌ Couldn't log in 😕");
                        return Err(e);
                    }
                }
            }
        };

        let backend = HttpBackend::new(http, environment.api_url.clone(), token);
        Ok(Self::with_backend(environment, backend))
    }
}

impl<B: LessonBackend> SyncClient<B> {
    pub fn with_backend(environment: Environment, backend: B) -> Self {
        Self {
            environment,
            backend,
            hide_urls: false,
            show_progress: true,
        }
    }

    /// Skip the lesson/course URL lookups after a push.
    pub fn hide_urls(mut self, hide: bool) -> Self {
        self.hide_urls = hide;
        self
    }

    /// Show or hide the live status line.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Push `lesson`, treating Ctrl-C as cancellation.
    pub async fn push(&self, lesson: &mut Lesson) -> Result<PushReport, SyncError> {
        let interrupted = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler: never cancel.
                std::future::pending::<()>().await;
            }
        };
        self.push_until(lesson, interrupted).await
    }

    /// Push `lesson`, cancelling when `cancel` completes first.
    pub async fn push_until<F>(
        &self,
        lesson: &mut Lesson,
        cancel: F,
    ) -> Result<PushReport, SyncError>
    where
        F: Future,
    {
        let progress = PushProgress::start(lesson.display_name(), self.show_progress);
        info!(
            lesson = lesson.display_name(),
            lesson_id = %lesson.remote_id(),
            environment = %self.environment.name,
            "Starting push"
        );

        tokio::pin!(cancel);
        let outcome = tokio::select! {
            biased;
            _ = &mut cancel => Err(SyncError::CancelledByUser),
            result = self.run_steps(lesson, &progress) => result,
        };

        if outcome.is_ok() {
            progress.step("Cleaning up...");
        }
        if let Err(e) = lesson.delete_archive() {
            warn!(lesson = lesson.display_name(), error = %e, "Failed to delete archive");
        }

        let outcome = match outcome {
            Ok(()) if !self.hide_urls => tokio::select! {
                biased;
                _ = &mut cancel => Err(SyncError::CancelledByUser),
                result = self.resolve_urls(lesson.remote_id(), &progress) => result,
            },
            Ok(()) => Ok(self.report(lesson.remote_id(), None)),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(report) => {
                progress.succeed();
                info!(lesson = lesson.display_name(), "Push complete");
                if let Some(web_page) = &report.web_page {
                    println!("   ╷ Web page: {}", style(web_page).cyan());
                    println!("   ╵ Lesson data: {}", style(&report.admin_url).cyan());
                }
            }
            Err(SyncError::CancelledByUser) => {
                progress.step("Cancelled by user");
                progress.fail();
                warn!(lesson = lesson.display_name(), "Push cancelled by user");
            }
            Err(e) => {
                progress.fail();
                error!(lesson = lesson.display_name(), error = %e, "Push failed");
            }
        }
        outcome
    }

    async fn run_steps(
        &self,
        lesson: &mut Lesson,
        progress: &PushProgress,
    ) -> Result<(), SyncError> {
        progress.step("Finding English translation...");
        let translations = self.backend.translations(lesson.remote_id()).await?;
        let translation_id = find_translation(&translations, TARGET_LOCALE)
            .map(|t| t.id.clone())
            .ok_or_else(|| SyncError::TranslationNotFound {
                lesson_id: lesson.remote_id().clone(),
                locale: TARGET_LOCALE.to_owned(),
            })?;

        progress.step("Zipping folder...");
        let archive = lesson.archive().await?.to_path_buf();
        let filename = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| lesson.display_name().to_owned());

        progress.step("Uploading...");
        let file_id = self.backend.upload_archive(&archive, &filename).await?;

        progress.step("Linking upload...");
        self.backend
            .link_translation(lesson.remote_id(), &translation_id, &file_id)
            .await
    }

    async fn resolve_urls(
        &self,
        lesson_id: &RemoteId,
        progress: &PushProgress,
    ) -> Result<PushReport, SyncError> {
        progress.step("Getting URLs...");
        let page = self.backend.lesson_page(lesson_id).await?;
        let course = self.backend.course_slug(&page.course).await?;
        let web_page = format!("{}/course/{course}/{}", self.environment.website_url, page.slug);
        Ok(self.report(lesson_id, Some(web_page)))
    }

    fn report(&self, lesson_id: &RemoteId, web_page: Option<String>) -> PushReport {
        PushReport {
            lesson_id: lesson_id.clone(),
            admin_url: format!("{}/admin/content/lessons/{lesson_id}", self.environment.api_url),
            web_page,
        }
    }
}
