use std::sync::Arc;

use dreamcanvas_client::{ClientConfig, HttpImageApi, ImageApi};
use dreamcanvas_studio::detail::ImageDetailView;
use dreamcanvas_studio::feedback::FeedbackRecorder;
use dreamcanvas_studio::gallery::GalleryPager;
use dreamcanvas_studio::generation::GenerationController;
use dreamcanvas_studio::notify::{Notifier, TracingNotifier};
use dreamcanvas_studio::training::TrainingJobMonitor;

/// All controllers wired to one HTTP client and one notifier.
pub struct Studio {
    pub generation: Arc<GenerationController>,
    pub gallery: GalleryPager,
    pub detail: ImageDetailView,
    pub training: TrainingJobMonitor,
}

impl Studio {
    pub fn new(config: &ClientConfig) -> Self {
        let api: Arc<dyn ImageApi> = Arc::new(HttpImageApi::new(config.api_url.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        let feedback = Arc::new(FeedbackRecorder::new(api.clone(), notifier.clone()));
        let generation = Arc::new(GenerationController::new(
            api.clone(),
            notifier.clone(),
            feedback.clone(),
            config.max_variations,
        ));

        Self {
            gallery: GalleryPager::new(api.clone(), notifier.clone(), config.page_size),
            detail: ImageDetailView::new(
                api.clone(),
                notifier.clone(),
                feedback,
                generation.clone(),
            ),
            training: TrainingJobMonitor::new(api, notifier, config.poll_interval),
            generation,
        }
    }
}
