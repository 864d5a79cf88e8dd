use crowdflow::{
    tiles::{TemplateTileSource, TileCache, TileLoader},
    ui::{CrowdFlowPage, TileLayerView},
    CrowdMap, CrowdMapConfig, TokioSpawner,
};
use std::sync::Arc;

/// Standalone crowd map viewer
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // eframe owns the main thread; the map's loops run on this runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("crowdflow-worker")
        .enable_all()
        .build()?;
    let spawner = TokioSpawner::from_handle(runtime.handle().clone()).shared();

    let config = CrowdMapConfig::from_env();
    log::info!(
        "Starting CrowdFlow with {} data from {}",
        config.data_source,
        config.endpoint
    );

    let tile_source = Arc::new(TemplateTileSource::new(config.tiles.clone()));
    let loader = TileLoader::new(tile_source, spawner.clone(), TileCache::default());
    let map = CrowdMap::from_config(config, spawner)?;
    let page = CrowdFlowPage::new(map, TileLayerView::new(loader));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("CrowdFlow - Live Crowd Density"),
        ..Default::default()
    };

    eframe::run_native(
        "crowdflow-app",
        options,
        Box::new(|_cc| Box::new(CrowdFlowApp { page })),
    )?;

    drop(runtime);
    Ok(())
}

struct CrowdFlowApp {
    page: CrowdFlowPage,
}

impl eframe::App for CrowdFlowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // no-op once the loops are up
        self.page.start(ctx);
        self.page.show(ctx);
    }
}
