//! Runware image inference client.
//!
//! One HTTP POST per generation: a JSON task array holding a single
//! `imageInference` task, authenticated with a bearer key.

use super::{
    BoxFuture, GeneratedImage, GenerationError, GenerationRequest, GenerationResult,
    ImageGenerator,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Default Runware REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.runware.ai/v1";

/// Default inference model.
pub const DEFAULT_MODEL: &str = "runware:100@1";

/// Strength applied when transforming a reference image.
const SEED_IMAGE_STRENGTH: f32 = 0.8;

/// Runware connection settings.
#[derive(Debug, Clone)]
pub struct RunwareConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    /// Output image format (`WEBP`, `PNG` or `JPG`).
    pub output_format: String,
    /// Replaces the guidance scale of every request when set.
    pub cfg_scale: Option<f32>,
}

impl RunwareConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

impl Default for RunwareConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            width: 1024,
            height: 1024,
            output_format: "WEBP".to_string(),
            cfg_scale: None,
        }
    }
}

/// HTTP client for the Runware inference API.
pub struct RunwareClient {
    config: RunwareConfig,
    client: reqwest::Client,
}

impl RunwareClient {
    /// Create a client. An empty API key is rejected before any call is made.
    pub fn new(config: RunwareConfig) -> GenerationResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    pub fn config(&self) -> &RunwareConfig {
        &self.config
    }

    /// JSON body for one inference call.
    fn request_body(&self, request: &GenerationRequest, task_uuid: &str) -> Value {
        let mut task = json!({
            "taskType": "imageInference",
            "taskUUID": task_uuid,
            "positivePrompt": request.positive_prompt,
            "model": self.config.model,
            "width": self.config.width,
            "height": self.config.height,
            "numberResults": request.number_results,
            "outputFormat": self.config.output_format,
            "CFGScale": self.config.cfg_scale.unwrap_or(request.cfg_scale),
        });
        if let Some(seed) = request.seed {
            task["seed"] = json!(seed);
        }
        if let Some(seed_image) = &request.seed_image {
            task["seedImage"] = json!(seed_image);
            task["strength"] = json!(SEED_IMAGE_STRENGTH);
        }
        json!([task])
    }
}

impl ImageGenerator for RunwareClient {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> BoxFuture<'_, GenerationResult<GeneratedImage>> {
        let task_uuid = Uuid::new_v4().to_string();
        let body = self.request_body(request, &task_uuid);
        let requested_seed = request.seed;

        Box::pin(async move {
            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| GenerationError::Transport(e.to_string()))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| GenerationError::Transport(e.to_string()))?;

            if !status.is_success() {
                return Err(GenerationError::Remote {
                    status: status.as_u16(),
                    message: service_error_message(&text).unwrap_or(text),
                });
            }

            parse_response(&text, &task_uuid, requested_seed)
        })
    }
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    data: Vec<InferenceResult>,
    #[serde(default)]
    errors: Vec<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct InferenceResult {
    #[serde(rename = "taskUUID")]
    task_uuid: Option<String>,
    #[serde(rename = "imageURL")]
    image_url: Option<String>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: String,
}

/// First error message in a Runware error payload, if any.
fn service_error_message(body: &str) -> Option<String> {
    let response: InferenceResponse = serde_json::from_str(body).ok()?;
    response.errors.into_iter().next().map(|e| e.message)
}

/// Extract the image for `task_uuid` from a response body.
///
/// Falls back to the requested seed if the service omits one.
fn parse_response(
    body: &str,
    task_uuid: &str,
    requested_seed: Option<u64>,
) -> GenerationResult<GeneratedImage> {
    let response: InferenceResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    if let Some(error) = response.errors.into_iter().next() {
        return Err(GenerationError::Rejected(error.message));
    }

    let result = response
        .data
        .into_iter()
        .filter(|r| r.task_uuid.as_deref().is_none_or(|id| id == task_uuid))
        .find(|r| r.image_url.is_some())
        .ok_or(GenerationError::EmptyResponse)?;

    let seed = result
        .seed
        .or(requested_seed)
        .ok_or_else(|| GenerationError::InvalidResponse("missing seed".to_string()))?;

    Ok(GeneratedImage {
        image_url: result.image_url.unwrap_or_default(),
        seed,
    })
}
