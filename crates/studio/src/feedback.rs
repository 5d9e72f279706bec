//! The "like" mutation.
//!
//! A like sends a positive score once. The recorder remembers which images
//! it has seen liked and refuses to send a second like for them, so the
//! client does not depend on the service deduplicating.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use dreamcanvas_client::ImageApi;
use dreamcanvas_core::image::{Image, LIKE_SCORE};
use dreamcanvas_core::types::DbId;

use crate::error::StudioError;
use crate::notify::{Notification, Notifier};

const FEEDBACK_FALLBACK: &str = "Failed to save feedback";

pub struct FeedbackRecorder {
    api: Arc<dyn ImageApi>,
    notifier: Arc<dyn Notifier>,
    liked: Mutex<HashSet<DbId>>,
}

impl FeedbackRecorder {
    pub fn new(api: Arc<dyn ImageApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            liked: Mutex::new(HashSet::new()),
        }
    }

    /// Whether this recorder has seen `image_id` liked.
    pub fn is_liked(&self, image_id: DbId) -> bool {
        self.liked_ids().contains(&image_id)
    }

    /// Like a locally held record.
    ///
    /// On success only `feedback_score` of `image` changes; every other
    /// field is left as it was. Returns a copy of the updated record.
    pub async fn like(&self, image: &mut Image) -> Result<Image, StudioError> {
        if image.is_liked() {
            self.liked_ids().insert(image.id);
        }
        self.record(image.id, LIKE_SCORE).await?;
        image.apply_feedback(LIKE_SCORE)?;
        Ok(image.clone())
    }

    /// Send `score` for `image_id` and return the service's updated record.
    pub async fn record(&self, image_id: DbId, score: i32) -> Result<Image, StudioError> {
        if score <= 0 {
            return Err(StudioError::Validation(format!(
                "Feedback score must be positive, got {score}"
            )));
        }
        // Reserve the id before dispatch so an overlapping like is refused.
        if !self.liked_ids().insert(image_id) {
            tracing::debug!(image_id, "Image already liked, not resending feedback");
            return Err(StudioError::Validation("Image already liked".into()));
        }

        match self.api.submit_feedback(image_id, score).await {
            Ok(updated) => {
                tracing::info!(image_id, score, "Feedback recorded");
                self.notifier.notify(Notification::success(
                    "Image Liked",
                    "Your feedback has been saved",
                ));
                Ok(updated)
            }
            Err(e) => {
                self.liked_ids().remove(&image_id);
                let message = e.display_message(FEEDBACK_FALLBACK);
                tracing::error!(image_id, error = %e, "Failed to submit feedback");
                self.notifier.notify(Notification::error("Error", message.clone()));
                Err(StudioError::Feedback(message))
            }
        }
    }

    fn liked_ids(&self) -> std::sync::MutexGuard<'_, HashSet<DbId>> {
        self.liked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
