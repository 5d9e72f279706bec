//! Integration tests for `ImageDetailView`.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{api_error, bare_error, image, variation, Call, FakeImageApi, RecordingNotifier};
use dreamcanvas_studio::detail::ImageDetailView;
use dreamcanvas_studio::feedback::FeedbackRecorder;
use dreamcanvas_studio::generation::GenerationController;
use dreamcanvas_studio::StudioError;

struct Fixture {
    api: Arc<FakeImageApi>,
    notifier: Arc<RecordingNotifier>,
    view: ImageDetailView,
    generation: Arc<GenerationController>,
}

fn fixture() -> Fixture {
    let api = FakeImageApi::new();
    let notifier = RecordingNotifier::new();
    let feedback = Arc::new(FeedbackRecorder::new(api.clone(), notifier.clone()));
    let generation = Arc::new(GenerationController::new(
        api.clone(),
        notifier.clone(),
        feedback.clone(),
        8,
    ));
    let view = ImageDetailView::new(
        api.clone(),
        notifier.clone(),
        feedback,
        generation.clone(),
    );
    Fixture {
        api,
        notifier,
        view,
        generation,
    }
}

// ---------------------------------------------------------------------------
// Test: loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_seeds_variation_prompt() {
    let f = fixture();
    f.api.push_details(Ok(image(21)));

    let loaded = f.view.load(21).await.unwrap();

    assert_eq!(loaded.id, 21);
    let state = f.view.state();
    assert!(!state.loading);
    assert_eq!(state.image, Some(image(21)));
    assert_eq!(state.variation_prompt, "prompt 21");
    assert_eq!(f.api.calls(), vec![Call::ImageDetails(21)]);
}

#[tokio::test]
async fn load_failure_reports_message() {
    let f = fixture();
    f.api.push_details(Err(bare_error(500)));
    f.api.push_details(Err(api_error(404, "Image not found")));

    let err = f.view.load(1).await.unwrap_err();
    assert_eq!(err, StudioError::Fetch("Failed to fetch image details".into()));

    let err = f.view.load(2).await.unwrap_err();
    assert_eq!(err, StudioError::Fetch("Image not found".into()));

    let state = f.view.state();
    assert!(!state.loading);
    assert_eq!(state.image, None);
    assert_eq!(state.error.as_deref(), Some("Image not found"));
    assert_eq!(f.notifier.titles(), vec!["Error", "Error"]);
}

#[tokio::test]
async fn stale_load_is_discarded() {
    let f = fixture();
    let gate = f.api.push_details_gated(Ok(image(1)));
    f.api.push_details(Ok(image(2)));

    let first = f.view.load(1);
    let second = async {
        let result = f.view.load(2).await;
        gate.release();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap_err(), StudioError::Superseded);
    assert_eq!(second.unwrap().id, 2);
    assert_eq!(f.view.state().image.map(|i| i.id), Some(2));
    assert_eq!(f.view.state().variation_prompt, "prompt 2");
}

// ---------------------------------------------------------------------------
// Test: like
// ---------------------------------------------------------------------------

#[tokio::test]
async fn like_updates_only_feedback_score() {
    let f = fixture();
    f.api.push_details(Ok(image(5)));
    let mut server_copy = image(5);
    server_copy.image_data = "different".into();
    server_copy.feedback_score = 1;
    f.api.push_feedback(Ok(server_copy));

    f.view.load(5).await.unwrap();
    let liked = f.view.like().await.unwrap();

    let mut expected = image(5);
    expected.feedback_score = 1;
    assert_eq!(liked, expected);
    assert_eq!(f.view.state().image, Some(expected));
    assert_eq!(f.notifier.last().unwrap().title, "Image Liked");
}

#[tokio::test]
async fn like_twice_is_refused() {
    let f = fixture();
    f.api.push_details(Ok(image(5)));
    f.api.push_feedback(Ok(image(5)));

    f.view.load(5).await.unwrap();
    f.view.like().await.unwrap();
    let err = f.view.like().await.unwrap_err();

    assert_eq!(err, StudioError::Validation("Image already liked".into()));
    assert_eq!(f.api.count(|c| matches!(c, Call::Feedback { .. })), 1);
}

#[tokio::test]
async fn like_without_image_is_refused() {
    let f = fixture();

    assert_matches!(f.view.like().await, Err(StudioError::Validation(_)));
    assert_eq!(f.api.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Test: variations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn variations_use_edited_prompt() {
    let f = fixture();
    f.api.push_details(Ok(image(8)));
    f.api
        .push_variations(Ok((0..4).map(|i| variation(80 + i, "a red fox")).collect()));

    f.view.load(8).await.unwrap();
    f.view.set_variation_prompt("a red fox");
    let items = f.view.generate_variations().await.unwrap();

    assert_eq!(items.len(), 4);
    let Call::Variations(body) = &f.api.calls()[1] else {
        panic!("expected a variations call");
    };
    assert_eq!(body.prompt, "a red fox");
    assert_eq!(body.image, "payload-8");
    assert_eq!(body.num_variations, 4);
    assert_eq!(f.generation.state().variations.source_id, Some(8));
}

#[tokio::test]
async fn variations_without_image_are_refused() {
    let f = fixture();

    assert_matches!(
        f.view.generate_variations().await,
        Err(StudioError::Validation(_))
    );
    assert_eq!(f.api.call_count(), 0);
}
