//! Request and response bodies exchanged with the image service.

use dreamcanvas_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Response of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneratedImage {
    pub id: DbId,
    /// Encoded image payload (data URL or base64).
    pub image: String,
    /// The seed actually used, chosen by the server when none was sent.
    pub seed: i64,
}

/// Body of `POST /variations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationsRequest {
    /// Payload of the source image.
    pub image: String,
    pub prompt: String,
    pub num_variations: u32,
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackRequest {
    pub image_id: DbId,
    pub feedback: i32,
}

/// Snapshot returned by `POST /retrain`.
///
/// The service does not pin down this shape, so every field is optional
/// and unknown fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TrainingJobSnapshot {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of `GET /retrain/status`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TrainingStatusReport {
    /// Percentage in `0..=100`.
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub current_epoch: Option<u32>,
    #[serde(default)]
    pub current_loss: Option<f64>,
}

/// Error body carried by non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
