//! # HTTP client for the learning platform API
//!
//! [`HttpBackend`] implements [`LessonBackend`] on top of `reqwest`. It is
//! built once per run with a bearer token, either supplied from the
//! environment or obtained through [`login`], and reuses that token for
//! every call.
//!
//! All responses are wrapped in a `{"data": ...}` envelope; [`Envelope`]
//! strips it. Non-success statuses become the matching [`SyncError`] variant
//! for the step that issued the request.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::contract::{Credentials, LessonBackend, LessonPage, RemoteId, Translation};
use crate::error::SyncError;

const TRANSLATION_FIELDS: &str = "translations.id,translations.languages_code";

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Deserialize)]
struct LessonTranslations {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct StoredFile {
    id: RemoteId,
}

#[derive(Deserialize)]
struct Slug {
    slug: String,
}

async fn data<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    Ok(response.json::<Envelope<T>>().await?.data)
}

/// Exchange credentials for a bearer token at `{api_url}/auth/login`.
pub async fn login(
    http: &Client,
    api_url: &str,
    environment: &str,
    credentials: &Credentials,
) -> Result<String, SyncError> {
    tracing::info!(environment, email = %credentials.email, "Logging in");
    let response = http
        .post(format!("{api_url}/auth/login"))
        .json(credentials)
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::error!(environment, status = %response.status(), "Login rejected");
        return Err(SyncError::Authentication {
            environment: environment.to_owned(),
            status: response.status().as_u16(),
        });
    }

    let token: AccessToken = data(response).await?;
    tracing::info!(environment, "Obtained access token");
    Ok(token.access_token)
}

pub struct HttpBackend {
    http: Client,
    api_url: String,
    token: String,
}

impl HttpBackend {
    pub fn new(http: Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    async fn get_data<T: DeserializeOwned>(&self, resource: String) -> Result<T, SyncError> {
        let response = self
            .http
            .get(format!("{}{resource}", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::error!(%resource, status = %response.status(), "Lookup failed");
            return Err(SyncError::Lookup {
                resource,
                status: response.status().as_u16(),
            });
        }
        data(response).await
    }
}

#[async_trait]
impl LessonBackend for HttpBackend {
    async fn translations(&self, lesson_id: &RemoteId) -> Result<Vec<Translation>, SyncError> {
        tracing::info!(%lesson_id, "Fetching lesson translations");
        let lesson: LessonTranslations = self
            .get_data(format!(
                "/items/lessons/{lesson_id}?fields[]={TRANSLATION_FIELDS}"
            ))
            .await?;
        tracing::debug!(%lesson_id, count = lesson.translations.len(), "Fetched translations");
        Ok(lesson.translations)
    }

    async fn upload_archive(
        &self,
        archive: &Path,
        filename: &str,
    ) -> Result<RemoteId, SyncError> {
        let bytes = tokio::fs::read(archive).await?;
        tracing::info!(filename, size = bytes.len(), "Uploading archive");

        let part_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{filename}.zip"));
        let form = Form::new()
            .text("filename", filename.to_owned())
            .part("file", Part::bytes(bytes).file_name(part_name));

        let response = self
            .http
            .post(format!("{}/files", self.api_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(filename, status = %response.status(), "Upload rejected");
            return Err(SyncError::Upload {
                filename: filename.to_owned(),
                status: response.status().as_u16(),
            });
        }

        let stored: StoredFile = data(response).await?;
        tracing::info!(filename, file_id = %stored.id, "Archive uploaded");
        Ok(stored.id)
    }

    async fn link_translation(
        &self,
        lesson_id: &RemoteId,
        translation_id: &RemoteId,
        file_id: &RemoteId,
    ) -> Result<(), SyncError> {
        tracing::info!(%lesson_id, %translation_id, %file_id, "Linking upload to lesson");
        let body = json!({
            "translations": [{ "id": translation_id, "temporal_file": file_id }]
        });
        let response = self
            .http
            .patch(format!("{}/items/lessons/{lesson_id}", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(%lesson_id, status = %response.status(), "Link rejected");
            return Err(SyncError::Link {
                lesson_id: lesson_id.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn lesson_page(&self, lesson_id: &RemoteId) -> Result<LessonPage, SyncError> {
        self.get_data(format!("/items/lessons/{lesson_id}")).await
    }

    async fn course_slug(&self, course_id: &RemoteId) -> Result<String, SyncError> {
        let course: Slug = self.get_data(format!("/items/courses/{course_id}")).await?;
        Ok(course.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(Client::new(), server.uri(), "tok")
    }

    #[tokio::test]
    async fn login_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "me@example.com", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"access_token": "abc", "expires": 900}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let creds = Credentials {
            email: "me@example.com".into(),
            password: "pw".into(),
        };
        let token = login(&Client::new(), &server.uri(), "staging", &creds)
            .await
            .unwrap();
        assert_eq!(token, "abc");
    }

    #[tokio::test]
    async fn login_rejection_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let creds = Credentials {
            email: "me@example.com".into(),
            password: "wrong".into(),
        };
        let err = login(&Client::new(), &server.uri(), "staging", &creds)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Authentication { status: 401, .. }));
    }

    #[tokio::test]
    async fn translations_request_selects_fields_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/lessons/42"))
            .and(query_param("fields[]", TRANSLATION_FIELDS))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [
                    {"id": 7, "languages_code": "ja-JP"},
                    {"id": 8, "languages_code": "en-US"}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let translations = backend(&server).translations(&"42".into()).await.unwrap();
        assert_eq!(translations.len(), 2);
        assert_eq!(translations[1].id, RemoteId::from(8_i64));
        assert_eq!(translations[1].languages_code.as_deref(), Some("en-US"));
    }

    #[tokio::test]
    async fn translations_lookup_failure_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/lessons/42"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = backend(&server)
            .translations(&"42".into())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Lookup { status: 403, .. }));
    }

    #[tokio::test]
    async fn link_sends_translation_and_file_ids() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/items/lessons/42"))
            .and(body_json(json!({
                "translations": [{"id": 8, "temporal_file": "f9"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .link_translation(&RemoteId::from(42_i64), &RemoteId::from(8_i64), &"f9".into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn page_lookups_read_slugs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/lessons/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"slug": "intro", "course": 3}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items/courses/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"slug": "basics"}})),
            )
            .mount(&server)
            .await;

        let backend = backend(&server);
        let page = backend.lesson_page(&"42".into()).await.unwrap();
        assert_eq!(page.slug, "intro");
        assert_eq!(backend.course_slug(&page.course).await.unwrap(), "basics");
    }
}
