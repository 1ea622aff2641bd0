use super::*;

fn metadata(lat: f64, lon: f64, confidence: f64) -> GeoSignal {
    GeoSignal::new(SignalSource::Metadata, lat, lon, 30.0, confidence).unwrap()
}

fn visual(lat: f64, lon: f64, confidence: f64) -> GeoSignal {
    GeoSignal::new(SignalSource::VisualModel, lat, lon, 25_000.0, confidence).unwrap()
}

fn coord(resolution: &Resolution) -> (f64, f64) {
    (resolution.latitude, resolution.longitude)
}

fn resolver() -> SignalResolver {
    SignalResolver::default()
}

#[test]
fn test_no_signals_fails() {
    assert_eq!(
        resolver().resolve(&[]),
        Err(ResolveError::NoSignalAvailable)
    );
}

#[test]
fn test_malformed_signals_are_ignored() {
    let mut broken = metadata(10.0, 10.0, 0.9);
    broken.latitude = f64::NAN;

    assert_eq!(
        resolver().resolve(&[broken.clone()]),
        Err(ResolveError::NoSignalAvailable)
    );

    let good = visual(1.0, 2.0, 0.5);
    let resolution = resolver().resolve(&[broken, good.clone()]).unwrap();
    assert_eq!(resolution.source_signals, vec![good]);
}

#[test]
fn test_single_metadata_adopted() {
    let m = metadata(48.8584, 2.2945, 0.95);
    let resolution = resolver().resolve(&[m.clone()]).unwrap();

    assert_eq!(coord(&resolution), (48.8584, 2.2945));
    assert_eq!(resolution.confidence, 0.95);
    assert_eq!(resolution.uncertainty_meters, 30.0);
    assert_eq!(
        resolution.strategy,
        MergeStrategy::SingleSource {
            source: SignalSource::Metadata
        }
    );
    assert_eq!(resolution.source_signals, vec![m]);
}

#[test]
fn test_single_visual_source_takes_best() {
    let weak = visual(1.0, 1.0, 0.3);
    let strong = visual(40.7128, -74.0060, 0.6);

    let resolution = resolver().resolve(&[weak, strong.clone()]).unwrap();

    assert_eq!(coord(&resolution), (40.7128, -74.0060));
    assert_eq!(resolution.source_signals, vec![strong]);
}

#[test]
fn test_trusted_metadata_wins_over_outlier() {
    let m = metadata(51.5074, -0.1278, 0.95);
    // ~50 km north of London.
    let v = visual(51.9570, -0.1278, 0.5);

    let resolution = resolver().resolve(&[v, m.clone()]).unwrap();

    assert_eq!(resolution.strategy, MergeStrategy::MetadataPreferred);
    assert_eq!(coord(&resolution), (51.5074, -0.1278));
    assert_eq!(resolution.confidence, 0.95);
    assert_eq!(resolution.uncertainty_meters, 30.0);
    assert_eq!(resolution.source_signals, vec![m]);
}

#[test]
fn test_trust_floor_is_strict() {
    let m = metadata(10.0, 10.0, 0.8);
    let v = visual(10.01, 10.01, 0.6);

    let resolution = resolver().resolve(&[m, v]).unwrap();
    assert!(matches!(
        resolution.strategy,
        MergeStrategy::WeightedMerge { .. }
    ));
}

#[test]
fn test_weighted_merge_nearby() {
    let m = metadata(10.0, 20.0, 0.6);
    let v = visual(10.1, 20.1, 0.4);

    let resolution = resolver().resolve(&[m.clone(), v.clone()]).unwrap();

    assert!((resolution.latitude - 10.04).abs() < 1e-9);
    assert!((resolution.longitude - 20.04).abs() < 1e-9);
    assert_eq!(resolution.confidence, 0.6);
    assert_eq!(resolution.uncertainty_meters, 25_000.0);
    assert_eq!(resolution.source_signals, vec![m, v]);
    assert!(matches!(
        resolution.strategy,
        MergeStrategy::WeightedMerge {
            diverged: false,
            ..
        }
    ));
}

#[test]
fn test_diverged_merge_is_penalized() {
    let m = metadata(51.5074, -0.1278, 0.6);
    let v = visual(48.8566, 2.3522, 0.5);

    let resolution = resolver().resolve(&[m.clone(), v.clone()]).unwrap();

    let MergeStrategy::WeightedMerge {
        distance_meters,
        diverged,
    } = resolution.strategy
    else {
        panic!("expected merge, got {:?}", resolution.strategy);
    };
    assert!(diverged);
    assert!(resolution.confidence <= m.confidence.max(v.confidence));
    assert!((resolution.confidence - 0.3).abs() < 1e-9);
    assert!(resolution.uncertainty_meters >= m.uncertainty_meters.max(v.uncertainty_meters));
    assert!(resolution.uncertainty_meters >= distance_meters);
}

#[test]
fn test_merge_uncertainty_never_shrinks() {
    let pairs = [
        (metadata(0.5, 0.5, 0.1), visual(0.6, 0.6, 0.7)),
        (metadata(-30.0, 150.0, 0.5), visual(-31.0, 151.0, 0.2)),
        (metadata(60.0, -10.0, 0.0), visual(60.0, -10.0, 0.0)),
    ];

    for (m, v) in pairs {
        let resolution = resolver().resolve(&[m.clone(), v.clone()]).unwrap();
        assert!(resolution.uncertainty_meters >= m.uncertainty_meters.max(v.uncertainty_meters));
        assert!((0.0..=1.0).contains(&resolution.confidence));
    }
}

#[test]
fn test_merge_across_antimeridian() {
    let m = metadata(0.0, 179.9, 0.5);
    let v = visual(0.0, -179.9, 0.5);

    let resolution = resolver().resolve(&[m, v]).unwrap();

    assert!(resolution.longitude.abs() > 179.0, "got {}", resolution.longitude);
}

#[test]
fn test_zero_confidence_merge_uses_midpoint() {
    let m = metadata(10.0, 10.0, 0.0);
    let v = visual(12.0, 10.0, 0.0);

    let resolution = resolver().resolve(&[m, v]).unwrap();
    assert!((resolution.latitude - 11.0).abs() < 1e-9);
    assert_eq!(resolution.confidence, 0.0);
}

#[test]
fn test_custom_policy() {
    let resolver = SignalResolver::new(ResolverConfig {
        trust_floor: 0.99,
        divergence_meters: 1_000.0,
        disagreement_penalty: 0.25,
    });
    let m = metadata(10.0, 10.0, 0.95);
    let v = visual(10.1, 10.0, 0.5);

    let resolution = resolver.resolve(&[m, v]).unwrap();
    assert!((resolution.confidence - 0.2375).abs() < 1e-9);
}
