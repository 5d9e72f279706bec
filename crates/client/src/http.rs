//! [`reqwest`]-backed implementation of [`ImageApi`].

use async_trait::async_trait;
use dreamcanvas_core::image::{Image, VariationResult};
use dreamcanvas_core::pagination::PageWindow;
use dreamcanvas_core::prompt::EnhancedGeneration;
use dreamcanvas_core::training::Hyperparameters;
use dreamcanvas_core::types::DbId;

use crate::api::{ApiError, ImageApi};
use crate::models::{
    ErrorBody, FeedbackRequest, GeneratedImage, TrainingJobSnapshot, TrainingStatusReport,
    VariationsRequest,
};

/// HTTP client for one image service deployment.
pub struct HttpImageApi {
    client: reqwest::Client,
    api_url: String,
}

impl HttpImageApi {
    /// Create a client for the service rooted at `api_url`,
    /// e.g. `http://localhost:5000/api`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: normalize_base_url(api_url.into()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, turning failures into
    /// [`ApiError::Status`] with the service's message when one is present.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body);
            tracing::debug!(status = status.as_u16(), ?message, "Image service returned error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn generate_image(&self, body: &EnhancedGeneration) -> Result<GeneratedImage, ApiError> {
        let response = self
            .client
            .post(self.url("/generate"))
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn generate_variations(
        &self,
        body: &VariationsRequest,
    ) -> Result<Vec<VariationResult>, ApiError> {
        let response = self
            .client
            .post(self.url("/variations"))
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn list_images(&self, window: PageWindow) -> Result<Vec<Image>, ApiError> {
        let response = self
            .client
            .get(self.url("/images"))
            .query(&window)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn image_details(&self, id: DbId) -> Result<Image, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/images/{id}")))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn submit_feedback(&self, image_id: DbId, feedback: i32) -> Result<Image, ApiError> {
        let response = self
            .client
            .post(self.url("/feedback"))
            .json(&FeedbackRequest { image_id, feedback })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn start_retraining(
        &self,
        params: &Hyperparameters,
    ) -> Result<TrainingJobSnapshot, ApiError> {
        let response = self
            .client
            .post(self.url("/retrain"))
            .json(params)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn training_status(&self) -> Result<TrainingStatusReport, ApiError> {
        let response = self.client.get(self.url("/retrain/status")).send().await?;

        Self::parse_response(response).await
    }
}

/// Strip trailing slashes so paths can be appended directly.
fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Pull a human-readable message out of an error body.
///
/// Prefers the JSON `error` field; otherwise any non-empty body text.
fn extract_error_message(body: &str) -> Option<String> {
    if let Ok(ErrorBody { error: Some(error) }) = serde_json::from_str::<ErrorBody>(body) {
        return Some(error);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') {
        None
    } else {
        Some(trimmed.to_string())
    }
}
