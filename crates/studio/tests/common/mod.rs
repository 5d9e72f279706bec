//! Shared fixtures for studio integration tests.
//!
//! [`FakeImageApi`] records every call and answers from per-endpoint
//! queues of scripted results. A scripted result can be gated: the call
//! then waits until the returned [`Gate`] is released (or dropped), which
//! lets tests hold a response in flight.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use dreamcanvas_client::models::{
    GeneratedImage, TrainingJobSnapshot, TrainingStatusReport, VariationsRequest,
};
use dreamcanvas_client::{ApiError, ImageApi};
use dreamcanvas_core::image::{Image, VariationResult};
use dreamcanvas_core::pagination::PageWindow;
use dreamcanvas_core::prompt::EnhancedGeneration;
use dreamcanvas_core::training::Hyperparameters;
use dreamcanvas_core::types::DbId;
use dreamcanvas_studio::notify::{Notification, Notifier};

// ---------------------------------------------------------------------------
// Recorded calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Generate(EnhancedGeneration),
    Variations(VariationsRequest),
    ListImages(PageWindow),
    ImageDetails(DbId),
    Feedback { image_id: DbId, feedback: i32 },
    StartRetraining(Hyperparameters),
    TrainingStatus,
}

// ---------------------------------------------------------------------------
// Gates
// ---------------------------------------------------------------------------

/// Holds a scripted response until released.
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

struct Scripted<T> {
    result: Result<T, ApiError>,
    gate: Option<oneshot::Receiver<()>>,
}

type Queue<T> = Mutex<VecDeque<Scripted<T>>>;

fn push<T>(queue: &Queue<T>, result: Result<T, ApiError>, gated: bool) -> Option<Gate> {
    let (gate, rx) = if gated {
        let (tx, rx) = oneshot::channel();
        (Some(Gate(tx)), Some(rx))
    } else {
        (None, None)
    };
    queue
        .lock()
        .unwrap()
        .push_back(Scripted { result, gate: rx });
    gate
}

async fn pop<T>(queue: &Queue<T>) -> Result<T, ApiError> {
    let scripted = queue.lock().unwrap().pop_front();
    match scripted {
        Some(Scripted { result, gate }) => {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            result
        }
        None => Err(api_error(500, "unscripted call")),
    }
}

// ---------------------------------------------------------------------------
// FakeImageApi
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeImageApi {
    calls: Mutex<Vec<Call>>,
    generate: Queue<GeneratedImage>,
    variations: Queue<Vec<VariationResult>>,
    pages: Queue<Vec<Image>>,
    details: Queue<Image>,
    feedback: Queue<Image>,
    retrain: Queue<TrainingJobSnapshot>,
    status: Queue<TrainingStatusReport>,
    status_panics: AtomicBool,
}

impl FakeImageApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub fn status_polls(&self) -> usize {
        self.count(|c| matches!(c, Call::TrainingStatus))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn push_generate(&self, result: Result<GeneratedImage, ApiError>) {
        push(&self.generate, result, false);
    }

    pub fn push_generate_gated(&self, result: Result<GeneratedImage, ApiError>) -> Gate {
        push(&self.generate, result, true).unwrap()
    }

    pub fn push_variations(&self, result: Result<Vec<VariationResult>, ApiError>) {
        push(&self.variations, result, false);
    }

    pub fn push_page(&self, result: Result<Vec<Image>, ApiError>) {
        push(&self.pages, result, false);
    }

    pub fn push_page_gated(&self, result: Result<Vec<Image>, ApiError>) -> Gate {
        push(&self.pages, result, true).unwrap()
    }

    pub fn push_details(&self, result: Result<Image, ApiError>) {
        push(&self.details, result, false);
    }

    pub fn push_details_gated(&self, result: Result<Image, ApiError>) -> Gate {
        push(&self.details, result, true).unwrap()
    }

    pub fn push_feedback(&self, result: Result<Image, ApiError>) {
        push(&self.feedback, result, false);
    }

    pub fn push_feedback_gated(&self, result: Result<Image, ApiError>) -> Gate {
        push(&self.feedback, result, true).unwrap()
    }

    pub fn push_retrain(&self, result: Result<TrainingJobSnapshot, ApiError>) {
        push(&self.retrain, result, false);
    }

    pub fn push_retrain_gated(&self, result: Result<TrainingJobSnapshot, ApiError>) -> Gate {
        push(&self.retrain, result, true).unwrap()
    }

    pub fn push_status(&self, result: Result<TrainingStatusReport, ApiError>) {
        push(&self.status, result, false);
    }

    /// Make every later status poll panic.
    pub fn panic_on_status(&self) {
        self.status_panics.store(true, Ordering::SeqCst);
    }

    pub fn push_status_gated(&self, result: Result<TrainingStatusReport, ApiError>) -> Gate {
        push(&self.status, result, true).unwrap()
    }
}

#[async_trait]
impl ImageApi for FakeImageApi {
    async fn generate_image(&self, body: &EnhancedGeneration) -> Result<GeneratedImage, ApiError> {
        self.record(Call::Generate(body.clone()));
        pop(&self.generate).await
    }

    async fn generate_variations(
        &self,
        body: &VariationsRequest,
    ) -> Result<Vec<VariationResult>, ApiError> {
        self.record(Call::Variations(body.clone()));
        pop(&self.variations).await
    }

    async fn list_images(&self, window: PageWindow) -> Result<Vec<Image>, ApiError> {
        self.record(Call::ListImages(window));
        pop(&self.pages).await
    }

    async fn image_details(&self, id: DbId) -> Result<Image, ApiError> {
        self.record(Call::ImageDetails(id));
        pop(&self.details).await
    }

    async fn submit_feedback(&self, image_id: DbId, feedback: i32) -> Result<Image, ApiError> {
        self.record(Call::Feedback { image_id, feedback });
        pop(&self.feedback).await
    }

    async fn start_retraining(
        &self,
        params: &Hyperparameters,
    ) -> Result<TrainingJobSnapshot, ApiError> {
        self.record(Call::StartRetraining(*params));
        pop(&self.retrain).await
    }

    async fn training_status(&self) -> Result<TrainingStatusReport, ApiError> {
        self.record(Call::TrainingStatus);
        if self.status_panics.load(Ordering::SeqCst) {
            panic!("scripted status poll panic");
        }
        pop(&self.status).await
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn titles(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.title.clone()).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn api_error(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: Some(message.to_string()),
    }
}

pub fn bare_error(status: u16) -> ApiError {
    ApiError::Status {
        status,
        message: None,
    }
}

pub fn image(id: DbId) -> Image {
    Image {
        id,
        prompt: format!("prompt {id}"),
        seed: Some(id * 10),
        image_data: format!("payload-{id}"),
        created_at: None,
        feedback_score: 0,
    }
}

/// Images with consecutive ids starting at `first`.
pub fn images(first: DbId, count: usize) -> Vec<Image> {
    (0..count as DbId).map(|i| image(first + i)).collect()
}

pub fn generated(id: DbId, seed: i64) -> GeneratedImage {
    GeneratedImage {
        id,
        image: format!("data:image/png;base64,img-{id}"),
        seed,
    }
}

pub fn variation(id: DbId, prompt: &str) -> VariationResult {
    VariationResult {
        id,
        image: format!("var-{id}"),
        prompt: prompt.to_string(),
    }
}

pub fn status(progress: f64, completed: bool) -> TrainingStatusReport {
    TrainingStatusReport {
        progress: Some(progress),
        completed,
        current_epoch: None,
        current_loss: None,
    }
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
