//! InferenceClient - REST client for the hosted-inference API.
//!
//! Routes each prompt to the conversational or quantitative model, threads
//! the conversation context into conversational requests and normalizes the
//! heterogeneous response bodies into plain text.
//!
//! One client owns one conversation. Mutating calls take `&mut self`; there is
//! no request queue, no retry loop and no cancellation beyond dropping the
//! returned future.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use shaman_core::{
    ClientConfig, Conversation, Credential, Exchange, GenerationMode, GenerationParameters,
    Result, ShamanError, TaskHint,
};
use std::time::Instant;

use crate::payload::{ErrorBody, InferenceRequest, InferenceResponse, OcrOutcome};
use crate::presets::QuickAction;

/// Short prompt used to verify the token and endpoint.
pub const PROBE_PROMPT: &str = "Привет! Ответь коротко.";

/// File name attached to OCR uploads.
const OCR_FILE_NAME: &str = "image";

/// Client for the hosted text and vision models.
pub struct InferenceClient {
    http: Client,
    config: ClientConfig,
    credential: Credential,
    conversation: Conversation,
    mode: GenerationMode,
    request_count: u64,
}

impl InferenceClient {
    /// Creates a client. Fails only when the HTTP client cannot be built.
    pub fn new(config: ClientConfig, credential: Credential) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ShamanError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            conversation: Conversation::new(config.max_context_exchanges),
            config,
            credential,
            mode: GenerationMode::default(),
            request_count: 0,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replaces the credential after the caller re-acquired one.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GenerationMode) {
        self.mode = mode;
    }

    /// Completed conversational exchanges, oldest first.
    pub fn transcript(&self) -> &[Exchange] {
        self.conversation.exchanges()
    }

    /// Context prefix the next conversational request will carry.
    pub fn context(&self) -> &str {
        self.conversation.context()
    }

    /// Number of prompts and quick actions answered successfully.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    /// Task hint the client would pick for `prompt`.
    pub fn classify(&self, prompt: &str) -> TaskHint {
        TaskHint::classify(prompt, &self.config.math_keywords)
    }

    /// Sends a prompt, choosing the profile from its keywords.
    pub async fn submit_prompt(&mut self, prompt: &str) -> Result<String> {
        let hint = self.classify(prompt);
        self.submit_prompt_with_hint(prompt, hint).await
    }

    /// Sends a prompt with an explicit profile.
    ///
    /// Only a successful conversational call changes the transcript and the
    /// context; every failure leaves both untouched.
    pub async fn submit_prompt_with_hint(&mut self, prompt: &str, hint: TaskHint) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ShamanError::EmptyPrompt);
        }

        let (model_id, request) = self.build_request(prompt, hint);
        let generated = self.query(&model_id, &request).await?.into_text()?;

        let reply = match hint {
            TaskHint::Conversational => {
                let reply = self.conversation.strip_injected(&request.inputs, &generated);
                self.conversation.record(prompt, reply.clone());
                reply
            }
            TaskHint::Quantitative => generated
                .strip_prefix(request.inputs.as_str())
                .unwrap_or(generated.as_str())
                .trim()
                .to_string(),
        };

        self.request_count += 1;
        tracing::debug!(
            hint = %hint,
            transcript_len = self.conversation.len(),
            "Prompt answered"
        );
        Ok(reply)
    }

    /// Runs a canned request. The transcript is not involved.
    pub async fn run_preset(&mut self, action: QuickAction) -> Result<String> {
        let (model_id, request) = action.request(&self.config);
        let generated = self.query(&model_id, &request).await?.into_text()?;
        self.request_count += 1;
        Ok(generated.trim().to_string())
    }

    /// Sends a short probe to the conversational model.
    ///
    /// Any successful status counts as connected, whatever the body shape.
    pub async fn check_connection(&self) -> Result<()> {
        let request = InferenceRequest {
            inputs: PROBE_PROMPT.to_string(),
            parameters: GenerationParameters::basic(20, 0.7),
        };
        self.post_inference(&self.config.conversational.model_id, &request)
            .await
            .map(|_| ())
    }

    /// Clears the transcript and the context string.
    pub fn reset_conversation(&mut self) {
        self.conversation.clear();
        tracing::info!("Conversation reset");
    }

    /// Uploads an image to the OCR model and returns the recognized text.
    pub async fn recognize_image_text(&self, image: impl Into<Vec<u8>>) -> Result<OcrOutcome> {
        let image = image.into();
        if image.is_empty() {
            return Err(ShamanError::EmptyImage);
        }

        let url = self.config.endpoint(&self.config.ocr_model);
        let size = image.len();
        let form = Form::new().part("file", Part::bytes(image).file_name(OCR_FILE_NAME));

        tracing::info!(model = %self.config.ocr_model, bytes = size, "Sending OCR request");
        let started = Instant::now();

        let response = self
            .http
            .post(&url)
            .header("Authorization", self.credential.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|err| ShamanError::connection(format!("OCR request failed: {err}")))?;

        let status = response.status();
        let body = read_body(response).await?;
        tracing::debug!(status = status.as_u16(), latency = ?started.elapsed(), "OCR response");

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let message = ErrorBody::parse(&text).message_or(&text);
            return Err(ShamanError::transport(status.as_u16(), message));
        }

        OcrOutcome::decode(&body)
    }

    /// Model id and request body for a prompt under the given profile.
    pub fn build_request(&self, prompt: &str, hint: TaskHint) -> (String, InferenceRequest) {
        let profile = self.config.profile(hint);
        let rendered = profile.render(prompt);

        let request = match hint {
            TaskHint::Conversational => {
                let mut parameters = profile.parameters.clone();
                if let Some(temperature) = self.mode.temperature_override() {
                    parameters = parameters.with_temperature(temperature);
                }
                InferenceRequest {
                    inputs: self.conversation.frame(&rendered),
                    parameters,
                }
            }
            TaskHint::Quantitative => InferenceRequest {
                inputs: rendered,
                parameters: profile.parameters.clone(),
            },
        };

        (profile.model_id.clone(), request)
    }

    async fn query(&self, model_id: &str, request: &InferenceRequest) -> Result<InferenceResponse> {
        let body = self.post_inference(model_id, request).await?;
        InferenceResponse::decode(&body)
    }

    async fn post_inference(&self, model_id: &str, request: &InferenceRequest) -> Result<Vec<u8>> {
        let url = self.config.endpoint(model_id);
        tracing::info!(model = %model_id, "Sending inference request");
        let started = Instant::now();

        let response = self
            .http
            .post(&url)
            .header("Authorization", self.credential.bearer())
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|err| ShamanError::connection(format!("Inference request failed: {err}")))?;

        let status = response.status();
        let body = read_body(response).await?;
        tracing::debug!(
            model = %model_id,
            status = status.as_u16(),
            latency = ?started.elapsed(),
            "Inference response"
        );

        if !status.is_success() {
            let error = self.map_http_error(status, &body);
            tracing::warn!(model = %model_id, status = status.as_u16(), error = %error, "Inference failed");
            return Err(error);
        }

        Ok(body)
    }

    fn map_http_error(&self, status: StatusCode, body: &[u8]) -> ShamanError {
        let text = String::from_utf8_lossy(body);
        let error_body = ErrorBody::parse(&text);

        match status {
            StatusCode::SERVICE_UNAVAILABLE => ShamanError::ModelWarmingUp {
                retry_after: error_body
                    .estimated_wait()
                    .unwrap_or_else(|| self.config.warmup_retry_delay()),
            },
            StatusCode::UNAUTHORIZED => ShamanError::InvalidCredential,
            _ => ShamanError::transport(status.as_u16(), error_body.message_or(&text)),
        }
    }
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>> {
    let status = response.status();
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|err| {
            ShamanError::transport(status.as_u16(), format!("Failed to read response body: {err}"))
        })
}
