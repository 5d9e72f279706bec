//! The image service boundary.
//!
//! Controllers hold an `Arc<dyn ImageApi>` handed to them at
//! construction, so tests can script responses without a live server.

use async_trait::async_trait;
use dreamcanvas_core::image::{Image, VariationResult};
use dreamcanvas_core::pagination::PageWindow;
use dreamcanvas_core::prompt::EnhancedGeneration;
use dreamcanvas_core::training::Hyperparameters;
use dreamcanvas_core::types::DbId;

use crate::models::{
    GeneratedImage, TrainingJobSnapshot, TrainingStatusReport, VariationsRequest,
};

/// Operations offered by the image service.
#[async_trait]
pub trait ImageApi: Send + Sync {
    /// `POST /generate`
    async fn generate_image(&self, body: &EnhancedGeneration) -> Result<GeneratedImage, ApiError>;

    /// `POST /variations`
    async fn generate_variations(
        &self,
        body: &VariationsRequest,
    ) -> Result<Vec<VariationResult>, ApiError>;

    /// `GET /images?limit=&offset=`
    async fn list_images(&self, window: PageWindow) -> Result<Vec<Image>, ApiError>;

    /// `GET /images/{id}`
    async fn image_details(&self, id: DbId) -> Result<Image, ApiError>;

    /// `POST /feedback`
    async fn submit_feedback(&self, image_id: DbId, feedback: i32) -> Result<Image, ApiError>;

    /// `POST /retrain`
    async fn start_retraining(
        &self,
        params: &Hyperparameters,
    ) -> Result<TrainingJobSnapshot, ApiError>;

    /// `GET /retrain/status`
    async fn training_status(&self) -> Result<TrainingStatusReport, ApiError>;
}

/// Errors from the image service boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Image service error ({status}): {}", message.as_deref().unwrap_or("<no message>"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// The payload's `error` field, or the raw body when it is not JSON.
        message: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Malformed response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// The message reported by the service, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// The server's message when present, else `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}
