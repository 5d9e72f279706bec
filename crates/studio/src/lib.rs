//! Client-side controllers for the image studio.
//!
//! Each controller owns one slice of state, performs its calls through an
//! injected [`ImageApi`](dreamcanvas_client::ImageApi), and publishes
//! snapshots over a [`tokio::sync::watch`] channel that the presentation
//! layer renders:
//!
//! - [`generation::GenerationController`]: single-image generation and
//!   variation batches.
//! - [`gallery::GalleryPager`]: offset-paginated gallery with
//!   append/replace semantics.
//! - [`training::TrainingJobMonitor`]: retraining start and status polling.
//! - [`feedback::FeedbackRecorder`]: the "like" mutation.
//! - [`detail::ImageDetailView`]: a single image with like and variations.
//!
//! User-facing toasts go through an injected [`notify::Notifier`].

pub mod detail;
pub mod error;
pub mod feedback;
pub mod gallery;
pub mod generation;
pub mod notify;
pub mod sequence;
pub mod training;

pub use error::StudioError;
