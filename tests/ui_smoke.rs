#![cfg(feature = "egui")]

//! Headless frames through the full page

mod common;

use crowdflow::{
    core::config::DataSourceKind,
    tiles::{TemplateTileSource, TileCache, TileLoader, TileSourceOptions},
    ui::{CrowdFlowPage, TileLayerView},
    CrowdMap, CrowdMapConfig, DataOrigin, Point, SearchKey, TokioSpawner,
};
use egui::{Context, Pos2, RawInput, Rect, Vec2};
use std::sync::Arc;
use std::time::Duration;

fn raw_input() -> RawInput {
    RawInput {
        screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1024.0, 768.0))),
        ..Default::default()
    }
}

fn page(config: CrowdMapConfig) -> CrowdFlowPage {
    let map = CrowdMap::from_config(config, TokioSpawner::current().unwrap().shared()).unwrap();
    CrowdFlowPage::new(map, TileLayerView::disabled())
}

#[tokio::test]
async fn test_frame_sizes_the_viewport() {
    let ctx = Context::default();
    let mut page = page(CrowdMapConfig::default().with_data_source(DataSourceKind::Fallback));
    page.handle().refresh_now().await;

    let _ = ctx.run(raw_input(), |ctx| page.show(ctx));

    let size = page.handle().viewport().size;
    assert!((size.x - 1024.0).abs() < 1.0, "width {}", size.x);
    assert!((size.y - 768.0).abs() < 1.0, "height {}", size.y);
    assert_eq!(page.handle().read(|s| s.markers().len()), 2);
}

#[tokio::test]
async fn test_fallback_banner_renders() {
    let endpoint = common::closed_port_url().await;
    let ctx = Context::default();
    let mut page = page(CrowdMapConfig::default().with_endpoint(endpoint));

    assert_eq!(page.handle().refresh_now().await, DataOrigin::Fallback);
    for _ in 0..3 {
        let _ = ctx.run(raw_input(), |ctx| page.show(ctx));
    }
    assert_eq!(page.handle().notices().len(), 1);
}

#[tokio::test]
async fn test_search_box_drives_the_map() {
    let mut page = page(CrowdMapConfig::default().with_data_source(DataSourceKind::Fallback));
    page.handle().refresh_now().await;
    page.handle().set_size(Point::new(1024.0, 768.0));

    page.search().set_query("herald");
    page.search().on_key(SearchKey::Down);
    assert_eq!(
        page.search().on_key(SearchKey::Enter),
        Some("Herald Square".to_string())
    );

    let viewport = page.handle().viewport();
    assert_eq!(viewport.zoom, 16.0);
    assert!((viewport.center.lat - 40.7505).abs() < 1e-9);
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let ctx = Context::default();
    let mut page = page(CrowdMapConfig::default().with_data_source(DataSourceKind::Fallback));

    page.start(&ctx);
    page.start(&ctx);
    assert!(page.is_running());

    page.stop();
    assert!(!page.is_running());
}

#[tokio::test]
async fn test_frames_with_unreachable_tiles_draw_placeholders() {
    let base = common::closed_port_url().await;
    let spawner = TokioSpawner::current().unwrap().shared();
    let source = TemplateTileSource::new(TileSourceOptions {
        url_template: format!("{base}{{z}}/{{x}}/{{y}}.png"),
        subdomains: String::new(),
        ..Default::default()
    });
    let loader = TileLoader::new(Arc::new(source), spawner.clone(), TileCache::new(16));
    let map = CrowdMap::from_config(
        CrowdMapConfig::default().with_data_source(DataSourceKind::Fallback),
        spawner,
    )
    .unwrap();
    let mut page = CrowdFlowPage::new(map, TileLayerView::new(loader));
    page.handle().refresh_now().await;

    let ctx = Context::default();
    for _ in 0..3 {
        let _ = ctx.run(raw_input(), |ctx| page.show(ctx));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(page.handle().read(|s| s.markers().len()), 2);
}
