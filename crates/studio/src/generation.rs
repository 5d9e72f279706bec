//! Single-image generation and variation batches.
//!
//! [`GenerationController`] owns two request lifecycles: `generate` (one
//! image from a prompt) and `generate_variations` (a bounded batch derived
//! from an existing image). Both publish into one [`GenerationState`].
//!
//! Overlapping calls are not queued. Each call takes a token from a
//! [`RequestSequence`] and only the newest call's response is applied;
//! older ones return [`StudioError::Superseded`] without touching state.

use std::sync::Arc;

use dreamcanvas_client::models::{GeneratedImage, VariationsRequest};
use dreamcanvas_client::ImageApi;
use dreamcanvas_core::image::{Image, VariationResult};
use dreamcanvas_core::prompt::{
    validate_prompt, validate_variation_count, GenerationRequest, DEFAULT_VARIATION_COUNT,
};
use dreamcanvas_core::seed::{format_seed, parse_seed, random_seed};
use dreamcanvas_core::types::DbId;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::StudioError;
use crate::feedback::FeedbackRecorder;
use crate::notify::{Notification, Notifier};
use crate::sequence::RequestSequence;

const GENERATE_FALLBACK: &str = "Failed to generate image. Please try again.";
const VARIATIONS_FALLBACK: &str = "Failed to generate variations";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Variations derived from one source image. Regenerating replaces the
/// whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariationBatch {
    pub source_id: Option<DbId>,
    pub items: Vec<VariationResult>,
}

/// Snapshot published by [`GenerationController`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationState {
    /// A generation call is in flight.
    pub busy: bool,
    /// Payload of the last successfully generated image.
    pub generated_image: Option<String>,
    pub image_id: Option<DbId>,
    /// Editable seed field; mirrors the resolved seed after each success.
    pub seed: String,
    /// Message of the last failed generation, cleared when a new one starts.
    pub error: Option<String>,
    pub variations: VariationBatch,
    pub variations_busy: bool,
    /// Message of the last failed variations call, tracked apart from `error`.
    pub variations_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct GenerationController {
    api: Arc<dyn ImageApi>,
    notifier: Arc<dyn Notifier>,
    feedback: Arc<FeedbackRecorder>,
    state: watch::Sender<GenerationState>,
    generate_seq: RequestSequence,
    variation_seq: RequestSequence,
    max_variations: u32,
}

impl GenerationController {
    pub fn new(
        api: Arc<dyn ImageApi>,
        notifier: Arc<dyn Notifier>,
        feedback: Arc<FeedbackRecorder>,
        max_variations: u32,
    ) -> Self {
        Self {
            api,
            notifier,
            feedback,
            state: watch::Sender::new(GenerationState::default()),
            generate_seq: RequestSequence::new(),
            variation_seq: RequestSequence::new(),
            max_variations,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Whether a generation call is in flight. Callers use this to avoid
    /// issuing overlapping generations.
    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    /// Overwrite the editable seed field.
    pub fn set_seed(&self, raw: impl Into<String>) {
        let raw = raw.into();
        self.state.send_modify(|s| s.seed = raw);
    }

    /// Fill the seed field with a random seed and return it.
    pub fn randomize_seed(&self) -> i64 {
        let seed = random_seed();
        self.set_seed(format_seed(Some(seed)));
        seed
    }

    /// Parse the current seed field (`None` when empty).
    pub fn seed_from_field(&self) -> Result<Option<i64>, StudioError> {
        Ok(parse_seed(&self.state.borrow().seed)?)
    }

    /// Generate one image.
    ///
    /// Empty or whitespace-only prompts are rejected before any network
    /// call. On failure the previously generated image stays in place.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage, StudioError> {
        if let Err(e) = request.validate() {
            self.notifier.notify(Notification::warning(
                "Missing Input",
                "Please enter a text prompt to generate an image",
            ));
            return Err(e.into());
        }

        let body = request.enhanced();
        let token = self.generate_seq.issue();
        self.state.send_modify(|s| {
            s.busy = true;
            s.error = None;
        });
        tracing::debug!(?token, seed = ?body.seed, "Dispatching generation");

        let result = self.api.generate_image(&body).await;

        if !self.generate_seq.is_latest(token) {
            tracing::debug!(?token, "Discarding superseded generation response");
            return Err(StudioError::Superseded);
        }

        match result {
            Ok(generated) => {
                tracing::info!(image_id = generated.id, seed = generated.seed, "Image generated");
                self.state.send_modify(|s| {
                    s.busy = false;
                    s.generated_image = Some(generated.image.clone());
                    s.image_id = Some(generated.id);
                    s.seed = format_seed(Some(generated.seed));
                });
                self.notifier.notify(Notification::success(
                    "Success!",
                    "Your anime-style image has been generated successfully",
                ));
                Ok(generated)
            }
            Err(e) => {
                let message = e.display_message(GENERATE_FALLBACK);
                tracing::error!(error = %e, "Image generation failed");
                self.state.send_modify(|s| {
                    s.busy = false;
                    s.error = Some(message.clone());
                });
                self.notifier
                    .notify(Notification::error("Generation Failed", message.clone()));
                Err(StudioError::Generation(message))
            }
        }
    }

    /// Generate a batch of variations of `source`.
    ///
    /// Uses `prompt_override` when given, else the source's own prompt.
    /// `count` defaults to 4 and must not exceed the configured maximum.
    /// A successful call replaces the previous batch; a failed one leaves it.
    pub async fn generate_variations(
        &self,
        source: &Image,
        prompt_override: Option<&str>,
        count: Option<u32>,
    ) -> Result<Vec<VariationResult>, StudioError> {
        let count = count.unwrap_or(DEFAULT_VARIATION_COUNT);
        validate_variation_count(count, self.max_variations)?;
        let prompt = prompt_override.unwrap_or(&source.prompt);
        validate_prompt(prompt)?;

        let body = VariationsRequest {
            image: source.image_data.clone(),
            prompt: prompt.to_string(),
            num_variations: count,
        };
        let token = self.variation_seq.issue();
        self.state.send_modify(|s| {
            s.variations_busy = true;
            s.variations_error = None;
        });

        let result = self.api.generate_variations(&body).await;

        if !self.variation_seq.is_latest(token) {
            tracing::debug!(?token, source_id = source.id, "Discarding superseded variations");
            return Err(StudioError::Superseded);
        }

        match result {
            Ok(mut items) => {
                if items.len() > count as usize {
                    tracing::warn!(
                        requested = count,
                        received = items.len(),
                        "Service returned more variations than requested, truncating",
                    );
                    items.truncate(count as usize);
                }
                tracing::info!(source_id = source.id, count = items.len(), "Variations generated");
                self.state.send_modify(|s| {
                    s.variations_busy = false;
                    s.variations = VariationBatch {
                        source_id: Some(source.id),
                        items: items.clone(),
                    };
                });
                self.notifier.notify(Notification::success(
                    "Variations Generated",
                    "Image variations have been created successfully",
                ));
                Ok(items)
            }
            Err(e) => {
                let message = e.display_message(VARIATIONS_FALLBACK);
                tracing::error!(source_id = source.id, error = %e, "Variation generation failed");
                self.state.send_modify(|s| {
                    s.variations_busy = false;
                    s.variations_error = Some(message.clone());
                });
                self.notifier
                    .notify(Notification::error("Generation Failed", message.clone()));
                Err(StudioError::Generation(message))
            }
        }
    }

    /// Record feedback for an image through the shared [`FeedbackRecorder`].
    pub async fn record_feedback(&self, image_id: DbId, score: i32) -> Result<Image, StudioError> {
        self.feedback.record(image_id, score).await
    }
}
