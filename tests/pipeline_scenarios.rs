//! End-to-end resolution scenarios against mocked collaborators.

mod common;

use std::time::Duration;

use geoverdict::cache::EntryState;
use geoverdict::geocoder::{GeocodeError, MockGeocoder};
use geoverdict::hashing::ImageFingerprint;
use geoverdict::signal::SignalSource;
use geoverdict::visual::{MockVisualModel, VisualModelError};
use geoverdict::ResolveError;

use common::fixtures::{
    COORDINATE_TOLERANCE, EIFFEL_TOWER, LONDON, NEW_YORK, NORTH_OF_LONDON, jpeg_with_gps,
    located_image, prediction, unlocated_image,
};
use common::{HarnessBuilder, assert_close};

#[tokio::test]
async fn test_gps_image_resolves_from_metadata_only() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NEW_YORK, 0.9)])
        .geocoder(MockGeocoder::answering("Paris, France"))
        .build();

    let image = jpeg_with_gps(EIFFEL_TOWER.0, EIFFEL_TOWER.1);
    let verdict = harness.pipeline.resolve(&image).await.unwrap();

    assert_close(verdict.latitude, EIFFEL_TOWER.0, COORDINATE_TOLERANCE);
    assert_close(verdict.longitude, EIFFEL_TOWER.1, COORDINATE_TOLERANCE);
    assert_close(verdict.confidence, 0.95, 1e-9);
    assert_close(verdict.uncertainty_meters, 30.0, 1e-9);
    assert_eq!(verdict.place_name.as_deref(), Some("Paris, France"));
    assert_eq!(verdict.fingerprint, ImageFingerprint::of(&image));

    assert_eq!(verdict.source_signals.len(), 1);
    assert_eq!(verdict.source_signals[0].source, SignalSource::Metadata);
    assert_eq!(harness.visual.calls(), 0, "visual model must not run");
}

#[tokio::test]
async fn test_unlocated_image_falls_back_to_visual() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NEW_YORK, 0.6)])
        .geocoder(MockGeocoder::answering("New York, United States"))
        .build();

    let verdict = harness
        .pipeline
        .resolve(&unlocated_image("nyc"))
        .await
        .unwrap();

    assert_eq!(harness.visual.calls(), 1);
    assert!(
        verdict
            .source_signals
            .iter()
            .all(|s| s.source == SignalSource::VisualModel)
    );
    assert!(verdict.confidence <= 0.7);
    assert_close(verdict.latitude, NEW_YORK.0, 1e-9);
    assert_close(verdict.longitude, NEW_YORK.1, 1e-9);
    assert_eq!(verdict.place_name.as_deref(), Some("New York, United States"));
}

#[tokio::test(start_paused = true)]
async fn test_geocoder_timeout_leaves_place_empty() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NEW_YORK, 0.6)])
        .geocoder(MockGeocoder::answering("too late").with_delay(Duration::from_secs(30)))
        .geocoder_timeout(Duration::from_millis(200))
        .build();

    let verdict = harness
        .pipeline
        .resolve(&unlocated_image("slow-geocoder"))
        .await
        .unwrap();

    assert_eq!(verdict.place_name, None);
    assert!(verdict.has_source(SignalSource::VisualModel));
    assert!(harness.geocoder.calls() >= 1);
}

#[tokio::test]
async fn test_geocoder_outage_still_publishes_verdict() {
    let harness = HarnessBuilder::new()
        .geocoder(MockGeocoder::failing(GeocodeError::Status { status: 500 }))
        .build();

    let verdict = harness
        .pipeline
        .resolve(&jpeg_with_gps(LONDON.0, LONDON.1))
        .await
        .unwrap();

    assert_eq!(verdict.place_name, None);
    assert_close(verdict.confidence, 0.95, 1e-9);
}

#[tokio::test]
async fn test_trusted_metadata_beats_distant_visual() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NORTH_OF_LONDON, 0.5)])
        .visual_always_runs()
        .geocoder(MockGeocoder::answering("London, United Kingdom"))
        .build();

    let verdict = harness
        .pipeline
        .resolve(&jpeg_with_gps(LONDON.0, LONDON.1))
        .await
        .unwrap();

    assert_eq!(harness.visual.calls(), 1);
    assert_close(verdict.latitude, LONDON.0, COORDINATE_TOLERANCE);
    assert_close(verdict.longitude, LONDON.1, COORDINATE_TOLERANCE);
    assert_close(verdict.confidence, 0.95, 1e-9);
    assert_close(verdict.uncertainty_meters, 30.0, 1e-9);
    assert!(verdict.has_source(SignalSource::Metadata));
}

#[tokio::test]
async fn test_no_signal_settles_as_failed() {
    let harness = HarnessBuilder::new()
        .visual(MockVisualModel::new())
        .build();

    let image = unlocated_image("nowhere");
    let fingerprint = ImageFingerprint::of(&image);

    let err = harness.pipeline.resolve(&image).await.unwrap_err();
    assert_eq!(err, ResolveError::NoSignalAvailable);

    let entry = harness.pipeline.gate().entry(&fingerprint).unwrap();
    assert!(matches!(entry.state, EntryState::Failed { .. }));
    assert!(!harness.pipeline.gate().is_in_flight(&fingerprint));
    assert_eq!(harness.geocoder.calls(), 0);
}

#[tokio::test]
async fn test_visual_failure_without_metadata_is_no_signal() {
    let harness = HarnessBuilder::new()
        .visual(MockVisualModel::failing(VisualModelError::Unavailable {
            message: "connection refused".into(),
        }))
        .build();

    let err = harness
        .pipeline
        .resolve(&unlocated_image("visual-down"))
        .await
        .unwrap_err();

    assert_eq!(err, ResolveError::NoSignalAvailable);
    assert_eq!(harness.visual.calls(), 1);
}

#[tokio::test]
async fn test_ready_verdict_is_idempotent() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NEW_YORK, 0.6)])
        .geocoder(MockGeocoder::answering("New York, United States"))
        .build();

    let image = unlocated_image("repeat");
    let first = harness.pipeline.resolve(&image).await.unwrap();
    let second = harness.pipeline.resolve(&image).await.unwrap();
    let third = harness.pipeline.resolve(&image).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(harness.visual.calls(), 1);
    assert_eq!(harness.geocoder.calls(), 1);

    let stats = harness.pipeline.stats();
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.resolutions, 1);
    assert_eq!(stats.cache_hits, 2);
}

#[tokio::test]
async fn test_nearby_images_share_geocoder_cell() {
    let harness = HarnessBuilder::new()
        .geocoder(MockGeocoder::answering("Paris, France"))
        .build();

    let a = located_image(EIFFEL_TOWER, "a");
    let b = located_image((EIFFEL_TOWER.0 + 0.00001, EIFFEL_TOWER.1), "b");

    harness.pipeline.resolve(&a).await.unwrap();
    let second = harness.pipeline.resolve(&b).await.unwrap();

    assert_eq!(second.place_name.as_deref(), Some("Paris, France"));
    assert_eq!(harness.geocoder.calls(), 1);
}

#[tokio::test]
async fn test_batch_preserves_order() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NEW_YORK, 0.6)])
        .build();

    let images = vec![
        jpeg_with_gps(LONDON.0, LONDON.1),
        unlocated_image("batch"),
        jpeg_with_gps(EIFFEL_TOWER.0, EIFFEL_TOWER.1),
    ];

    let results = harness.pipeline.resolve_batch(&images).await;

    assert_eq!(results.len(), 3);
    let london = results[0].as_ref().unwrap();
    let nyc = results[1].as_ref().unwrap();
    let paris = results[2].as_ref().unwrap();

    assert_close(london.latitude, LONDON.0, COORDINATE_TOLERANCE);
    assert!(nyc.has_source(SignalSource::VisualModel));
    assert_close(paris.latitude, EIFFEL_TOWER.0, COORDINATE_TOLERANCE);
}

#[tokio::test]
async fn test_verdict_serializes_to_json() {
    let harness = HarnessBuilder::new()
        .geocoder(MockGeocoder::answering("Paris, France"))
        .build();

    let verdict = harness
        .pipeline
        .resolve(&jpeg_with_gps(EIFFEL_TOWER.0, EIFFEL_TOWER.1))
        .await
        .unwrap();

    let json = serde_json::to_value(&*verdict).unwrap();
    assert_eq!(json["place_name"], "Paris, France");
    assert_eq!(json["source_signals"][0]["source"], "metadata");
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_clear_cache_forces_new_resolution() {
    let harness = HarnessBuilder::new()
        .visual_predicts(vec![prediction(NEW_YORK, 0.6)])
        .build();

    let image = unlocated_image("cleared");
    harness.pipeline.resolve(&image).await.unwrap();
    assert_eq!(harness.pipeline.stats().settled_entries, 1);

    harness.pipeline.clear_cache();
    harness.pipeline.resolve(&image).await.unwrap();

    assert_eq!(harness.visual.calls(), 2);
}
