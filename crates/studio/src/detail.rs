//! A single image with its like and variation actions.

use std::sync::Arc;

use dreamcanvas_client::ImageApi;
use dreamcanvas_core::image::{Image, VariationResult, LIKE_SCORE};
use dreamcanvas_core::types::DbId;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::StudioError;
use crate::feedback::FeedbackRecorder;
use crate::generation::GenerationController;
use crate::notify::{Notification, Notifier};
use crate::sequence::RequestSequence;

const DETAIL_FALLBACK: &str = "Failed to fetch image details";

/// Snapshot published by [`ImageDetailView`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailState {
    pub loading: bool,
    pub image: Option<Image>,
    /// Editable prompt used for variations; seeded from the loaded image.
    pub variation_prompt: String,
    pub error: Option<String>,
}

pub struct ImageDetailView {
    api: Arc<dyn ImageApi>,
    notifier: Arc<dyn Notifier>,
    feedback: Arc<FeedbackRecorder>,
    generation: Arc<GenerationController>,
    state: watch::Sender<DetailState>,
    seq: RequestSequence,
}

impl ImageDetailView {
    pub fn new(
        api: Arc<dyn ImageApi>,
        notifier: Arc<dyn Notifier>,
        feedback: Arc<FeedbackRecorder>,
        generation: Arc<GenerationController>,
    ) -> Self {
        Self {
            api,
            notifier,
            feedback,
            generation,
            state: watch::Sender::new(DetailState::default()),
            seq: RequestSequence::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    /// Load an image by id, replacing the one currently shown.
    pub async fn load(&self, id: DbId) -> Result<Image, StudioError> {
        let token = self.seq.issue();
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.api.image_details(id).await;

        if !self.seq.is_latest(token) {
            tracing::debug!(image_id = id, "Discarding superseded image details");
            return Err(StudioError::Superseded);
        }

        match result {
            Ok(image) => {
                tracing::debug!(image_id = id, "Image details loaded");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.variation_prompt = image.prompt.clone();
                    s.image = Some(image.clone());
                });
                Ok(image)
            }
            Err(e) => {
                let message = e.display_message(DETAIL_FALLBACK);
                tracing::error!(image_id = id, error = %e, "Failed to fetch image details");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(message.clone());
                });
                self.notifier.notify(Notification::error("Error", message.clone()));
                Err(StudioError::Fetch(message))
            }
        }
    }

    pub fn set_variation_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.state.send_modify(|s| s.variation_prompt = prompt);
    }

    /// Like the shown image. Only its `feedback_score` changes.
    pub async fn like(&self) -> Result<Image, StudioError> {
        let image = self.loaded_image()?;
        if image.is_liked() {
            return Err(StudioError::Validation("Image already liked".into()));
        }

        self.feedback.record(image.id, LIKE_SCORE).await?;

        let mut updated = None;
        self.state.send_modify(|s| {
            if let Some(current) = s.image.as_mut().filter(|i| i.id == image.id) {
                match current.apply_feedback(LIKE_SCORE) {
                    Ok(true) => {}
                    Ok(false) => tracing::debug!(image_id = current.id, "Shown image already liked"),
                    Err(e) => tracing::warn!(image_id = current.id, error = %e, "Like score rejected"),
                }
                updated = Some(current.clone());
            }
        });
        Ok(updated.unwrap_or_else(|| {
            let mut image = image;
            image.feedback_score = LIKE_SCORE;
            image
        }))
    }

    /// Generate the default batch of variations from the shown image and
    /// the editable prompt.
    pub async fn generate_variations(&self) -> Result<Vec<VariationResult>, StudioError> {
        let image = self.loaded_image()?;
        let prompt = self.state.borrow().variation_prompt.clone();
        self.generation
            .generate_variations(&image, Some(prompt.as_str()), None)
            .await
    }

    fn loaded_image(&self) -> Result<Image, StudioError> {
        self.state
            .borrow()
            .image
            .clone()
            .ok_or_else(|| StudioError::Validation("No image loaded".into()))
    }
}
