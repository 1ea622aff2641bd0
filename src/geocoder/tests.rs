use std::time::Duration;

use super::*;

fn fast_config() -> GeocoderConfig {
    GeocoderConfig {
        timeout: Duration::from_millis(200),
        retry: RetryConfig {
            max_attempts: 3,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            multiplier: 2.0,
        },
        breaker: BreakerConfig {
            failure_threshold: 2,
            failure_window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
        },
        ..Default::default()
    }
}

fn client(upstream: MockGeocoder) -> (Arc<MockGeocoder>, GeocoderClient) {
    let upstream = Arc::new(upstream);
    let client = GeocoderClient::new(upstream.clone(), fast_config());
    (upstream, client)
}

fn unavailable() -> GeocodeError {
    GeocodeError::Status { status: 503 }
}

#[tokio::test]
async fn test_returns_place_name() {
    let (upstream, client) = client(MockGeocoder::answering("Paris, France"));

    let name = client.place_name(48.8584, 2.2945).await;

    assert_eq!(name.as_deref(), Some("Paris, France"));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_nearby_points_share_cache_cell() {
    let (upstream, client) = client(MockGeocoder::answering("Paris, France"));

    client.place_name(48.85840, 2.29450).await;
    let second = client.place_name(48.85841, 2.29451).await;

    assert_eq!(second.as_deref(), Some("Paris, France"));
    assert_eq!(upstream.calls(), 1);
    assert_eq!(client.cached_cells(), 1);
}

#[tokio::test]
async fn test_empty_answer_is_cached() {
    let (upstream, client) = client(MockGeocoder::empty());

    assert_eq!(client.place_name(30.0, -40.0).await, None);
    assert_eq!(client.place_name(30.0, -40.0).await, None);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let (upstream, client) = client(MockGeocoder::answering("Lyon, France"));
    upstream.push_response(Err(unavailable()));
    upstream.push_response(Err(GeocodeError::Transport {
        message: "reset".into(),
    }));

    let name = client.place_name(45.76, 4.83).await;

    assert_eq!(name.as_deref(), Some("Lyon, France"));
    assert_eq!(upstream.calls(), 3);
    assert!(client.breaker_state() == BreakerState::Closed);
}

#[tokio::test]
async fn test_attempts_are_capped() {
    let (upstream, client) = client(MockGeocoder::failing(unavailable()));

    assert_eq!(client.place_name(45.76, 4.83).await, None);
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let (upstream, client) = client(MockGeocoder::failing(GeocodeError::Status { status: 400 }));

    assert_eq!(client.place_name(45.76, 4.83).await, None);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let (upstream, client) = client(MockGeocoder::answering("Lyon, France"));
    for _ in 0..3 {
        upstream.push_response(Err(unavailable()));
    }

    assert_eq!(client.place_name(45.76, 4.83).await, None);
    assert_eq!(
        client.place_name(45.76, 4.83).await.as_deref(),
        Some("Lyon, France")
    );
    assert_eq!(upstream.calls(), 4);
}

#[tokio::test]
async fn test_breaker_short_circuits_after_repeated_failures() {
    let (upstream, client) = client(MockGeocoder::failing(unavailable()));

    client.place_name(1.0, 1.0).await;
    client.place_name(2.0, 2.0).await;
    assert!(matches!(client.breaker_state(), BreakerState::Open { .. }));
    let calls_when_opened = upstream.calls();

    assert_eq!(client.place_name(3.0, 3.0).await, None);
    assert_eq!(upstream.calls(), calls_when_opened);
}

#[tokio::test]
async fn test_cache_still_answers_while_open() {
    let (upstream, client) = client(MockGeocoder::answering("Rome, Italy"));
    client.place_name(41.9, 12.5).await;

    for _ in 0..6 {
        upstream.push_response(Err(unavailable()));
    }
    client.place_name(1.0, 1.0).await;
    client.place_name(2.0, 2.0).await;
    assert!(matches!(client.breaker_state(), BreakerState::Open { .. }));

    assert_eq!(
        client.place_name(41.9, 12.5).await.as_deref(),
        Some("Rome, Italy")
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_upstream_times_out() {
    let upstream = Arc::new(
        MockGeocoder::answering("Too late").with_delay(Duration::from_secs(10)),
    );
    let client = GeocoderClient::new(upstream.clone(), fast_config());

    assert_eq!(client.place_name(10.0, 10.0).await, None);
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_invalid_coordinate_skips_upstream() {
    let (upstream, client) = client(MockGeocoder::answering("Nowhere"));

    assert_eq!(client.place_name(f64::NAN, 0.0).await, None);
    assert_eq!(upstream.calls(), 0);
}

#[test]
fn test_transient_classification() {
    assert!(GeocodeError::Timeout { timeout_ms: 5 }.is_transient());
    assert!(GeocodeError::Status { status: 429 }.is_transient());
    assert!(GeocodeError::Status { status: 504 }.is_transient());
    assert!(!GeocodeError::Status { status: 404 }.is_transient());
    assert!(!GeocodeError::Status { status: 500 }.is_transient());
    assert!(
        !GeocodeError::MalformedResponse {
            message: "x".into()
        }
        .is_transient()
    );
}
