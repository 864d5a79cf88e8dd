//! Crowd data loading against a real socket: every failure mode must end in
//! the fallback set, never in an error.

mod common;

use common::{closed_port_url, Canned, TestServer};
use crowdflow::{
    data::{fallback_points, CrowdDataAdapter, CrowdDataSource, DataSourceError, HttpCrowdSource},
    geolocation::UnavailableGeolocation,
    CrowdMap, CrowdMapConfig, CrowdPoint, DataOrigin, NoticeSeverity, TokioSpawner,
};
use std::sync::Arc;
use std::time::Duration;

const GOOD_BODY: &str = r#"{"data": [
    {"lat": 40.7484, "lng": -73.9857, "intensity": 0.55, "location": "Empire State Building"},
    {"lat": 40.7527, "lng": -73.9772, "intensity": 0.8, "location": "Grand Central"}
]}"#;

fn source(url: String) -> HttpCrowdSource {
    HttpCrowdSource::new(url, Duration::from_secs(5)).unwrap()
}

async fn fetch_from(canned: Canned) -> crowdflow::data::CrowdFetch {
    let server = TestServer::start(vec![canned]).await;
    let adapter = CrowdDataAdapter::new(Arc::new(source(server.url("/api/crowd-data/"))));
    adapter.fetch().await
}

#[tokio::test]
async fn test_good_response_is_live() {
    let server = TestServer::start(vec![Canned::json(200, GOOD_BODY)]).await;
    let http = source(server.url("/api/crowd-data/"));

    let points = http.fetch_points().await.unwrap();
    assert_eq!(
        points,
        vec![
            CrowdPoint::new(40.7484, -73.9857, 0.55, "Empire State Building"),
            CrowdPoint::new(40.7527, -73.9772, 0.8, "Grand Central"),
        ]
    );
    assert_eq!(server.paths(), vec!["/api/crowd-data/"]);

    let fetch = CrowdDataAdapter::new(Arc::new(http)).fetch().await;
    assert_eq!(fetch.origin, DataOrigin::Live);
    assert!(!fetch.is_fallback());
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let fetch = fetch_from(Canned::json(500, r#"{"detail": "boom"}"#)).await;
    assert_eq!(fetch.origin, DataOrigin::Fallback);
    assert_eq!(fetch.points, fallback_points());
    assert!(matches!(fetch.failure, Some(DataSourceError::Status(500))));
}

#[tokio::test]
async fn test_malformed_json_falls_back() {
    let fetch = fetch_from(Canned::json(200, "{\"data\": [")).await;
    assert_eq!(fetch.points, fallback_points());
    assert!(matches!(fetch.failure, Some(DataSourceError::InvalidJson(_))));
}

#[tokio::test]
async fn test_data_not_an_array_falls_back() {
    let fetch = fetch_from(Canned::json(200, r#"{"data": "not an array"}"#)).await;
    assert_eq!(fetch.points, fallback_points());
    assert!(matches!(fetch.failure, Some(DataSourceError::UnexpectedShape(_))));
}

#[tokio::test]
async fn test_empty_data_is_a_valid_live_answer() {
    let fetch = fetch_from(Canned::json(200, r#"{"data": []}"#)).await;
    assert_eq!(fetch.origin, DataOrigin::Live);
    assert!(fetch.points.is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoint_falls_back() {
    let adapter = CrowdDataAdapter::new(Arc::new(source(closed_port_url().await)));
    let fetch = adapter.fetch().await;

    assert_eq!(fetch.origin, DataOrigin::Fallback);
    assert!(matches!(fetch.failure, Some(DataSourceError::Network(_))));
    assert_eq!(adapter.fetch_crowd_data().await, fallback_points());
}

#[tokio::test]
async fn test_data_error_banner_until_recovery() {
    let server = TestServer::start(vec![
        Canned::json(503, "unavailable"),
        Canned::json(200, GOOD_BODY),
    ])
    .await;
    let config = CrowdMapConfig::default().with_endpoint(server.url("/api/crowd-data/"));
    let adapter = CrowdDataAdapter::new(Arc::new(source(config.endpoint.clone())));
    let map = CrowdMap::new(
        config,
        adapter,
        Arc::new(UnavailableGeolocation::default()),
        TokioSpawner::current().unwrap().shared(),
    );
    let handle = map.handle();

    assert_eq!(handle.refresh_now().await, DataOrigin::Fallback);
    let notices = handle.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, NoticeSeverity::Error);
    assert_eq!(
        notices[0].title,
        "Failed to load crowd data. Using fallback data."
    );
    assert_eq!(handle.read(|s| s.markers().len()), 2);

    assert_eq!(handle.refresh_now().await, DataOrigin::Live);
    assert!(handle.notices().is_empty());
    assert_eq!(handle.points()[0].label, "Empire State Building");
}
