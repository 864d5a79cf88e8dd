use crowdflow::{
    constants::PLACE_SUGGESTIONS,
    data::{CrowdDataAdapter, StaticCrowdSource},
    geolocation::UnavailableGeolocation,
    CrowdMap, CrowdMapConfig, CrowdPoint, LatLng, SearchBox, SearchKey, TokioSpawner,
};
use std::sync::{Arc, Mutex};

fn places() -> Vec<String> {
    PLACE_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

fn map() -> CrowdMap {
    let points = vec![
        CrowdPoint::new(40.7829, -73.9654, 0.35, "Central Park"),
        CrowdPoint::new(40.7484, -73.9857, 0.8, "Empire State Building"),
    ];
    CrowdMap::new(
        CrowdMapConfig::default(),
        CrowdDataAdapter::new(Arc::new(StaticCrowdSource::new(points))),
        Arc::new(UnavailableGeolocation::default()),
        TokioSpawner::current().unwrap().shared(),
    )
}

#[tokio::test]
async fn test_suggestion_commit_focuses_map() {
    let map = map();
    let handle = map.handle();
    handle.refresh_now().await;

    let terms = Arc::new(Mutex::new(Vec::new()));
    let sink = terms.clone();
    handle.set_on_location_search(move |t| sink.lock().unwrap().push(t.to_string()));

    let mut search = SearchBox::new(places()).with_target(Arc::new(handle.clone()));
    search.set_query("empire");
    assert_eq!(search.suggestions(), ["Empire State Building"]);

    assert_eq!(
        search.click_suggestion(0),
        Some("Empire State Building".to_string())
    );
    assert!(!search.is_open());
    assert_eq!(*terms.lock().unwrap(), vec!["Empire State Building"]);

    let viewport = handle.viewport();
    assert!(viewport.center.approx_eq(&LatLng::new(40.7484, -73.9857), 1e-9));
    assert_eq!(viewport.zoom, 16.0);
}

#[tokio::test]
async fn test_unmatched_term_leaves_map_alone() {
    let map = map();
    let handle = map.handle();
    handle.refresh_now().await;
    let before = handle.viewport();

    // "Times Square" is suggested but not on this map
    let mut search = SearchBox::new(places()).with_target(Arc::new(handle.clone()));
    search.set_query("times");
    search.on_key(SearchKey::Down);
    assert_eq!(search.on_key(SearchKey::Enter), Some("Times Square".to_string()));

    assert_eq!(handle.viewport(), before);
    assert!(handle.read(|s| s.markers().open_marker().is_none()));
}
