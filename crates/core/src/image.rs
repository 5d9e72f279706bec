//! Generated image records as returned by the image service.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Prefix applied to bare base64 payloads so they can be rendered directly.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Score sent by the "like" action.
pub const LIKE_SCORE: i32 = 1;

/// A generated artifact.
///
/// `id`, `prompt`, `seed`, `image_data` and `created_at` are fixed once the
/// server creates the record. Only `feedback_score` changes client-side,
/// and only from 0 to a positive value (see [`Image::apply_feedback`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: DbId,
    /// The enhanced prompt the image was generated from.
    pub prompt: String,
    #[serde(default)]
    pub seed: Option<i64>,
    /// Base64 payload, data URL or remote URL.
    pub image_data: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, rename = "feedback")]
    pub feedback_score: i32,
}

impl Image {
    /// Whether a positive feedback score has been recorded.
    pub fn is_liked(&self) -> bool {
        self.feedback_score > 0
    }

    /// Record a positive feedback score.
    ///
    /// Returns `Ok(true)` when the score was applied and `Ok(false)` when the
    /// image was already liked (the existing score is kept). Non-positive
    /// scores are rejected.
    pub fn apply_feedback(&mut self, score: i32) -> Result<bool, CoreError> {
        if score <= 0 {
            return Err(CoreError::Validation(format!(
                "Feedback score must be positive, got {score}"
            )));
        }
        if self.is_liked() {
            return Ok(false);
        }
        self.feedback_score = score;
        Ok(true)
    }

    /// A URL suitable for rendering the image.
    pub fn data_url(&self) -> String {
        to_data_url(&self.image_data)
    }
}

/// One entry of a variation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationResult {
    pub id: DbId,
    pub image: String,
    pub prompt: String,
}

impl VariationResult {
    pub fn data_url(&self) -> String {
        to_data_url(&self.image)
    }
}

/// Turn an image payload into something a renderer can load.
///
/// Data URLs and http(s) URLs pass through unchanged; anything else is
/// treated as bare base64 PNG.
pub fn to_data_url(payload: &str) -> String {
    if payload.starts_with("data:")
        || payload.starts_with("http://")
        || payload.starts_with("https://")
    {
        payload.to_string()
    } else {
        format!("{PNG_DATA_URL_PREFIX}{payload}")
    }
}

/// File name used when saving a generated image.
pub fn download_file_name(timestamp_millis: i64) -> String {
    format!("generated-image-{timestamp_millis}.png")
}

/// Accept RFC 3339 timestamps as well as offset-less ones (assumed UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&chrono::Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    Err(serde::de::Error::custom(format!(
        "invalid created_at timestamp '{raw}'"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Image {
        Image {
            id: 3,
            prompt: "a fox".into(),
            seed: Some(42),
            image_data: "iVBORw0KGgo".into(),
            created_at: None,
            feedback_score: 0,
        }
    }

    #[test]
    fn apply_feedback_sets_score_once() {
        let mut image = sample();
        assert!(image.apply_feedback(LIKE_SCORE).unwrap());
        assert!(image.is_liked());

        assert!(!image.apply_feedback(5).unwrap());
        assert_eq!(image.feedback_score, LIKE_SCORE);
    }

    #[test]
    fn apply_feedback_rejects_non_positive_scores() {
        let mut image = sample();
        assert!(image.apply_feedback(0).is_err());
        assert!(image.apply_feedback(-1).is_err());
        assert_eq!(image.feedback_score, 0);
    }

    #[test]
    fn data_url_prefixes_bare_base64() {
        assert_eq!(sample().data_url(), "data:image/png;base64,iVBORw0KGgo");
    }

    #[test]
    fn data_url_keeps_existing_urls() {
        assert_eq!(to_data_url("data:image/jpeg;base64,AAA"), "data:image/jpeg;base64,AAA");
        assert_eq!(to_data_url("https://cdn/x.png"), "https://cdn/x.png");
    }

    #[test]
    fn deserializes_server_record() {
        let json = serde_json::json!({
            "id": 9,
            "prompt": "a cat, anime style",
            "seed": 123,
            "image_data": "AAAA",
            "created_at": "2024-05-01T12:30:00.123456",
            "feedback": 1,
        });
        let image: Image = serde_json::from_value(json).unwrap();
        assert_eq!(image.id, 9);
        assert_eq!(image.seed, Some(123));
        assert_eq!(image.feedback_score, 1);
        assert!(image.created_at.is_some());
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = serde_json::json!({ "id": 1, "prompt": "p", "image_data": "x" });
        let image: Image = serde_json::from_value(json).unwrap();
        assert_eq!(image.seed, None);
        assert_eq!(image.created_at, None);
        assert_eq!(image.feedback_score, 0);
    }

    #[test]
    fn download_file_name_uses_timestamp() {
        assert_eq!(download_file_name(1700000000000), "generated-image-1700000000000.png");
    }
}
