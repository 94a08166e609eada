//! Gemini `generateContent` transcription adapter

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::ports::{Transcriber, TranscriptionError};
use crate::domain::audio::AudioData;
use crate::domain::config::DEFAULT_MODEL;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Instruction sent with every segment. Segments are cut at arbitrary
/// points, so the model must not invent sentence boundaries or summaries.
const TRANSCRIPTION_INSTRUCTION: &str = "\
You are a verbatim transcription engine. The audio is one slice of a longer recording \
and may start or end mid-sentence. Transcribe exactly what is spoken, in the spoken \
language. Do not summarise, translate, add speaker labels, timestamps or commentary. \
Output only the transcript text. If the slice contains no speech, output nothing.";

// Wire types. Requests borrow from the caller; responses default missing
// arrays to empty.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Instruction<'a>,
    contents: [UserTurn<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Instruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    parts: [AudioPart<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioPart<'a> {
    inline_data: InlineAudio<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineAudio<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, or the reason there is none.
    /// Empty text from a normal finish is a silent slice, not an error.
    fn into_text(self) -> Result<String, TranscriptionError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(TranscriptionError::UnsupportedAudio(format!(
                "request blocked: {}",
                reason
            )));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(TranscriptionError::EmptyResponse)?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
        // A slice without speech legitimately comes back empty.
        match candidate.finish_reason {
            Some(reason) if matches!(reason.as_str(), "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT") => {
                Err(TranscriptionError::ApiError(format!(
                    "generation stopped: {}",
                    reason
                )))
            }
            _ => Ok(String::new()),
        }
    }
}

/// Transcribes segments with a Gemini model, sending audio inline
pub struct GeminiTranscriber {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiTranscriber {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the adapter at another endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The key travels in a header so it never shows up in logged URLs.
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body<'a>(audio: &'a AudioData) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: Instruction {
                parts: [TextPart {
                    text: TRANSCRIPTION_INSTRUCTION,
                }],
            },
            contents: [UserTurn {
                role: "user",
                parts: [AudioPart {
                    inline_data: InlineAudio {
                        mime_type: audio.mime_type(),
                        data: audio.to_base64(),
                    },
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        }
    }

    /// Map a non-success HTTP status onto the transient/permanent split
    fn classify_status(status: StatusCode, body: &str, payload_bytes: usize) -> TranscriptionError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        let described = || format!("HTTP {}: {}", status.as_u16(), message);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranscriptionError::InvalidApiKey,
            StatusCode::TOO_MANY_REQUESTS => TranscriptionError::RateLimited,
            StatusCode::PAYLOAD_TOO_LARGE => TranscriptionError::PayloadTooLarge(payload_bytes),
            StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                TranscriptionError::UnsupportedAudio(message)
            }
            StatusCode::REQUEST_TIMEOUT => TranscriptionError::RequestFailed(described()),
            s if s.is_server_error() => TranscriptionError::ServerError(described()),
            _ => TranscriptionError::ApiError(described()),
        }
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(&self, audio: &AudioData) -> Result<String, TranscriptionError> {
        tracing::debug!(
            model = %self.model,
            bytes = audio.size_bytes(),
            mime = audio.mime_type(),
            "Calling Gemini generateContent"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::request_body(audio))
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body, audio.size_bytes()));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.without_url().to_string()))?
            .into_text()
    }
}
