//! Integration tests for ForecastClient using wiremock.

use std::time::Duration;

use forecast_core::{EndpointConfig, ForecastApi, ForecastClient, ForecastError, NetworkError};
use tokio::sync::broadcast::error::TryRecvError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORECAST_PATH: &str = "/v1/forecast";

fn forecast_body(temps: &[f64]) -> serde_json::Value {
    let times: Vec<String> = (0..temps.len())
        .map(|h| format!("2025-12-01T{h:02}:00"))
        .collect();

    serde_json::json!({
        "latitude": 30.0625,
        "longitude": 31.25,
        "timezone": "Africa/Cairo",
        "current": {
            "time": "2025-12-01T12:00",
            "interval": 900,
            "is_day": 1,
            "temperature_2m": 21.5
        },
        "hourly": { "time": times, "temperature_2m": temps },
        "daily": {
            "time": ["2025-12-01", "2025-12-02"],
            "sunrise": ["2025-12-01T06:20", "2025-12-02T06:21"],
            "sunset": ["2025-12-01T16:59"],
            "temperature_2m_max": [24.0, 23.1],
            "temperature_2m_min": [14.2, 13.9]
        }
    })
}

fn client_for(server: &MockServer) -> ForecastClient {
    let endpoint = EndpointConfig {
        base_url: format!("{}{FORECAST_PATH}", server.uri()),
        ..EndpointConfig::default()
    };
    ForecastClient::new(&endpoint).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

#[tokio::test]
async fn test_fetch_success_publishes_before_returning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[15.0, 16.5])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut hourly = client.hourly_updates();
    let mut daily = client.daily_updates();

    let resp = client.fetch().await.unwrap();

    assert_eq!(resp.timezone, "Africa/Cairo");
    assert_eq!(resp.current.as_ref().and_then(|c| c.temperature), Some(21.5));

    // Already delivered by the time fetch returned.
    let hourly = hourly.try_recv().unwrap();
    assert_eq!(hourly.len(), 2);
    assert_eq!(hourly[1].time_iso, "2025-12-01T01:00");
    assert_eq!(hourly[1].temperature, 16.5);

    let daily = daily.try_recv().unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].sunset_iso.as_deref(), Some("2025-12-01T16:59"));
    assert_eq!(daily[1].sunset_iso, None);
    assert_eq!(daily[1].t_min, Some(13.9));
}

#[tokio::test]
async fn test_fetch_sends_fixed_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .and(query_param("latitude", "30.0626"))
        .and(query_param("longitude", "31.2497"))
        .and(query_param("timezone", "Africa/Cairo"))
        .and(query_param("hourly", "temperature_2m"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[1.0])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.fetch().await.unwrap();
}

#[tokio::test]
async fn test_fetch_for_location_uses_configured_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .and(query_param("latitude", "30.0626"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[9.0])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut hourly = client.hourly_updates();

    let resp = client.fetch_for_location("Paris").await.unwrap();

    assert_eq!(resp.timezone, "Africa/Cairo");
    assert_eq!(hourly.try_recv().unwrap()[0].temperature, 9.0);
}

#[tokio::test]
async fn test_fetch_server_error_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut hourly = client.hourly_updates();

    let err = client.fetch().await.unwrap_err();

    match &err {
        ForecastError::Network(NetworkError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(matches!(hourly.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_fetch_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "latitude": 1.0 })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut daily = client.daily_updates();

    let err = client.fetch().await.unwrap_err();

    assert!(err.is_decode());
    assert!(matches!(daily.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_fetch_unreachable_host_is_network_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let endpoint = EndpointConfig {
        base_url: format!("http://127.0.0.1:{port}{FORECAST_PATH}"),
        ..EndpointConfig::default()
    };
    let client = ForecastClient::new(&endpoint).unwrap();
    let mut hourly = client.hourly_updates();

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(
        err,
        ForecastError::Network(NetworkError::Transport(_))
    ));
    assert!(err.is_network());
    assert!(matches!(hourly.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_fetch_twice_emits_equal_points() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[3.0, 4.0])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut hourly = client.hourly_updates();
    let mut daily = client.daily_updates();

    client.fetch().await.unwrap();
    client.fetch().await.unwrap();

    let (h1, h2) = (hourly.try_recv().unwrap(), hourly.try_recv().unwrap());
    assert_eq!(h1, h2);
    assert_ne!(h1[0].id, h2[0].id);

    let (d1, d2) = (daily.try_recv().unwrap(), daily.try_recv().unwrap());
    assert_eq!(d1, d2);
}

#[tokio::test]
async fn test_polling_waits_one_interval_before_first_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[1.0])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handle = client.start_polling(Duration::from_millis(500));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(request_count(&server).await, 0);

    handle.cancel();
}

#[tokio::test]
async fn test_polling_survives_failed_tick() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[18.0, 19.0])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut hourly = client.hourly_updates();
    let handle = client.start_polling(Duration::from_millis(300));

    let points = tokio::time::timeout(Duration::from_secs(3), hourly.recv())
        .await
        .expect("second tick should emit")
        .unwrap();
    handle.cancel();

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].temperature, 18.0);
    assert_eq!(request_count(&server).await, 2);
    assert!(matches!(hourly.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_restarting_polling_keeps_single_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[5.0])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.start_polling(Duration::from_millis(200));
    let second = client.start_polling(Duration::from_millis(200));
    assert!(first.is_cancelled());

    // Ticks at ~200, ~400 and ~600 ms from the surviving loop only.
    tokio::time::sleep(Duration::from_millis(700)).await;
    second.cancel();

    let count = request_count(&server).await;
    assert!((2..=4).contains(&count), "unexpected request count {count}");
}

#[tokio::test]
async fn test_cancel_lets_in_flight_fetch_finish() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body(&[22.0]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut hourly = client.hourly_updates();
    let handle = client.start_polling(Duration::from_millis(100));

    // First tick at ~100 ms, response arrives at ~500 ms.
    tokio::time::sleep(Duration::from_millis(250)).await;
    handle.cancel();

    let points = tokio::time::timeout(Duration::from_secs(2), hourly.recv())
        .await
        .expect("in-flight fetch should still emit")
        .unwrap();
    assert_eq!(points[0].temperature, 22.0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_dropping_handle_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(&[5.0])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    drop(client.start_polling(Duration::from_millis(100)));

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(request_count(&server).await, 0);
}
