//! [`HttpStageClient`]: drives the stages exposed by the study-kit web
//! service.
//!
//! | Stage      | Route                     | Body                         |
//! |------------|---------------------------|------------------------------|
//! | extract    | `POST /api/extract-text`  | multipart, field `file`      |
//! | generate   | `POST /api/generate-content` | `{text}`                  |
//! | render     | `POST /api/generate-pdf`  | `{summary, flashcards, title}` |
//! | synthesize | `POST /api/generate-audio`| `{text}`                     |
//!
//! Every non-2xx answer goes through [`translate_failure`]; connection
//! failures become [`StageErrorKind::Transport`].

use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Deserialize;

use crate::config::ServiceConfig;

use super::{
    require_speech_text, translate_failure, Artifact, ArtifactKind, Document, ExtractedText,
    SpokenSummary, Stage, StageClient, StageError, StageErrorKind, StudyMaterial,
};

#[derive(Deserialize)]
struct ExtractResponse {
    text: String,
}

#[derive(Deserialize)]
struct AudioResponse {
    text: String,
}

/// Calls the remote study-kit service.
pub struct HttpStageClient {
    client: reqwest::Client,
    base_url: String,
    speech_available: bool,
}

impl HttpStageClient {
    /// Build a client from config.  A default client is used if the builder
    /// fails.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            speech_available: false,
        }
    }

    /// Declare whether this machine can speak the summary aloud.  Without
    /// speech the synthesize stage yields a text fallback.
    pub fn with_speech(mut self, available: bool) -> Self {
        self.speech_available = available;
        self
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// Send `request`, turning transport failures and non-2xx statuses into
    /// a [`StageError`].
    async fn send(
        &self,
        stage: Stage,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StageError> {
        let response = request
            .send()
            .await
            .map_err(|e| StageError::transport(stage, &e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = translate_failure(stage, status.as_u16(), &body);
        log::warn!("{stage}: service answered {status}: {}", err.message);
        Err(err)
    }
}

/// Pull `filename` out of a `Content-Disposition` header value.
fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

#[async_trait]
impl StageClient for HttpStageClient {
    async fn extract(&self, document: &Document) -> Result<ExtractedText, StageError> {
        let stage = Stage::Extract;

        let part = reqwest::multipart::Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(&document.media_type)
            .map_err(|_| {
                StageError::new(
                    stage,
                    StageErrorKind::UnsupportedType,
                    "Unsupported file type. Please upload a PDF or text file.",
                )
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .send(stage, self.client.post(self.url("/api/extract-text")).multipart(form))
            .await?;

        let body: ExtractResponse = response.json().await.map_err(|e| {
            log::warn!("{stage}: malformed response: {e}");
            StageError::with_default_message(stage, StageErrorKind::Upstream)
        })?;

        ExtractedText::new(&body.text)
    }

    async fn generate(&self, text: &str) -> Result<StudyMaterial, StageError> {
        let stage = Stage::Generate;
        let body = serde_json::json!({ "text": text });

        let response = self
            .send(stage, self.client.post(self.url("/api/generate-content")).json(&body))
            .await?;

        response.json::<StudyMaterial>().await.map_err(|e| {
            log::warn!("{stage}: response does not match the study-material shape: {e}");
            StageError::with_default_message(stage, StageErrorKind::Generation)
        })
    }

    async fn render(
        &self,
        material: &StudyMaterial,
        title: &str,
    ) -> Result<Artifact, StageError> {
        let stage = Stage::Render;
        let body = serde_json::json!({
            "summary":    material.summary,
            "flashcards": material.flashcards,
            "title":      title,
        });

        let response = self
            .send(stage, self.client.post(self.url("/api/generate-pdf")).json(&body))
            .await?;

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| "study-guide.pdf".into());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StageError::transport(stage, &e))?;

        Ok(Artifact {
            kind: ArtifactKind::Guide,
            content_type,
            filename,
            bytes: bytes.to_vec(),
        })
    }

    async fn synthesize(&self, text: &str) -> Result<SpokenSummary, StageError> {
        let stage = Stage::Synthesize;
        require_speech_text(text)?;

        let body = serde_json::json!({ "text": text });
        let response = self
            .send(stage, self.client.post(self.url("/api/generate-audio")).json(&body))
            .await?;

        let audio: AudioResponse = response.json().await.map_err(|e| {
            log::warn!("{stage}: malformed response: {e}");
            StageError::with_default_message(stage, StageErrorKind::Upstream)
        })?;

        if self.speech_available {
            Ok(SpokenSummary::Playable { text: audio.text })
        } else {
            Ok(SpokenSummary::fallback(&audio.text))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
