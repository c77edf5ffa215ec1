// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an AllTalk synthesis server.
//!
//! Generation is two requests: a form POST to `/api/tts-generate` that
//! returns the URL of the rendered file, then a GET of that file.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use streambot_config::model::TtsConfig;
use streambot_core::traits::SynthesisRequest;
use streambot_core::{HealthStatus, PluginAdapter, StreambotError, SynthesisBackend, WavClip};
use tracing::debug;

/// Response of `/api/tts-generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    status: String,
    output_file_url: String,
}

/// Response of `/api/voices`.
#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AllTalkClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl AllTalkClient {
    pub fn new(config: &TtsConfig) -> Result<Self, StreambotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StreambotError::Synthesis {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn api(&self, method: &str) -> String {
        format!("{}/api/{method}", self.base_url)
    }

    /// `POST /api/ready`; any successful status counts as ready.
    pub async fn ready(&self) -> Result<(), StreambotError> {
        let response = self
            .client
            .post(self.api("ready"))
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StreambotError::synthesis(format!("ready check returned {status}")))
        }
    }

    /// Renders `request` and returns the raw WAV bytes.
    pub async fn generate_bytes(&self, request: &SynthesisRequest) -> Result<Vec<u8>, StreambotError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("text_input", request.text.as_str()),
            ("text_filtering", "html"),
            ("character_voice_gen", request.voice.as_str()),
            ("language", self.language.as_str()),
            ("output_file_name", "tts_output"),
            ("autoplay", "false"),
            ("text_not_inside", "character"),
            ("temperature", "1.0"),
        ];
        if let Some(narrator) = &request.narrator_voice {
            form.push(("narrator_enabled", "true"));
            form.push(("narrator_voice_gen", narrator.as_str()));
        }

        let response = self
            .client
            .post(self.api("tts-generate"))
            .form(&form)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreambotError::synthesis(format!(
                "generate returned {status}: {body}"
            )));
        }
        let generated: GenerateResponse = response.json().await.map_err(decode_error)?;
        debug!(status = %generated.status, url = %generated.output_file_url, "generated clip");

        let file_url = if generated.output_file_url.starts_with("http") {
            generated.output_file_url
        } else {
            format!("{}{}", self.base_url, generated.output_file_url)
        };
        let download = self
            .client
            .get(&file_url)
            .send()
            .await
            .map_err(request_error)?;
        let status = download.status();
        if !status.is_success() {
            return Err(StreambotError::synthesis(format!(
                "download of {file_url} returned {status}"
            )));
        }
        let bytes = download.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

fn request_error(e: reqwest::Error) -> StreambotError {
    StreambotError::Synthesis {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

fn decode_error(e: reqwest::Error) -> StreambotError {
    StreambotError::Synthesis {
        message: format!("failed to decode response: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for AllTalkClient {
    fn name(&self) -> &str {
        "alltalk"
    }

    async fn health_check(&self) -> Result<HealthStatus, StreambotError> {
        match self.ready().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl SynthesisBackend for AllTalkClient {
    async fn generate(&self, request: &SynthesisRequest) -> Result<WavClip, StreambotError> {
        WavClip::from_bytes(self.generate_bytes(request).await?)
    }

    async fn voices(&self) -> Result<Vec<String>, StreambotError> {
        let response = self
            .client
            .get(self.api("voices"))
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StreambotError::synthesis(format!("voices returned {status}")));
        }
        let voices: VoicesResponse = response.json().await.map_err(decode_error)?;
        Ok(voices.voices)
    }
}
