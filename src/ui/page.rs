//! The whole CrowdFlow screen: map plus floating overlays

use crate::{
    background::LoopGuard,
    core::map::CrowdMap,
    runtime::{self, AsyncHandle, AsyncSpawner},
    search::SearchBox,
    traits::{LocationCentering, LocationSearch},
    ui::{
        legend::Legend,
        location_button::{LocationButton, LocationButtonState},
        notice,
        search_bar::SearchBar,
        style::{MapStyle, OverlayStyle},
        widget::{CrowdMapWidget, TileLayerView},
    },
    CrowdMapHandle,
};
use egui::{Align2, Area, Context, Id, Order, RichText, Vec2};
use std::sync::Arc;

const EDGE: f32 = 16.0;

/// Repaints `ctx` whenever the map state changes
pub fn spawn_repaint_on_change(
    spawner: &dyn AsyncSpawner,
    handle: &CrowdMapHandle,
    ctx: Context,
) -> Box<dyn AsyncHandle> {
    let mut changes = handle.subscribe();
    runtime::spawn(spawner, async move {
        while changes.changed().await.is_ok() {
            ctx.request_repaint();
        }
    })
}

pub struct CrowdFlowPage {
    map: CrowdMap,
    handle: CrowdMapHandle,
    loops: Option<LoopGuard>,
    search: SearchBox,
    tiles: TileLayerView,
    location: LocationButtonState,
    overlay_style: OverlayStyle,
    map_style: MapStyle,
}

impl CrowdFlowPage {
    pub fn new(map: CrowdMap, tiles: TileLayerView) -> Self {
        let handle = map.handle();
        let target: Arc<dyn LocationSearch> = Arc::new(handle.clone());
        let search = SearchBox::new(map.config().suggestions.clone()).with_target(target);
        handle.set_on_location_search(|term| log::info!("Searching for: {term}"));

        Self {
            map,
            handle,
            loops: None,
            search,
            tiles,
            location: LocationButtonState::default(),
            overlay_style: OverlayStyle::default(),
            map_style: MapStyle::default(),
        }
    }

    pub fn handle(&self) -> &CrowdMapHandle {
        &self.handle
    }

    pub fn search(&mut self) -> &mut SearchBox {
        &mut self.search
    }

    /// Starts the refresh and simulation loops plus change-driven repaints
    pub fn start(&mut self, ctx: &Context) {
        if self.loops.is_some() {
            return;
        }
        let mut loops = self.map.start();
        loops.push(
            "repaint",
            spawn_repaint_on_change(self.map.spawner().as_ref(), &self.handle, ctx.clone()),
        );
        self.loops = Some(loops);
    }

    pub fn stop(&mut self) {
        if let Some(mut loops) = self.loops.take() {
            loops.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.loops.as_ref().map(LoopGuard::is_running).unwrap_or(false)
    }

    pub fn show(&mut self, ctx: &Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let widget = CrowdMapWidget::new(&self.handle, &mut self.tiles)
                    .style(self.map_style.clone());
                ui.add(widget);
            });

        self.show_header(ctx);
        self.show_search(ctx);
        self.show_legend(ctx);
        self.show_location_button(ctx);
        notice::show_notices(ctx, &self.handle, &self.overlay_style);
        notice::show_loading(ctx, &self.handle, &self.overlay_style);
    }

    fn show_header(&self, ctx: &Context) {
        let style = &self.overlay_style;
        Area::new(Id::new("crowdflow_title"))
            .order(Order::Middle)
            .anchor(Align2::LEFT_TOP, Vec2::new(EDGE, EDGE))
            .show(ctx, |ui| {
                style.card().show(ui, |ui| {
                    ui.label(RichText::new("CrowdFlow").font(style.title_font.clone()).strong());
                    ui.label(RichText::new("Live Crowd Density").color(style.muted_text_color));
                });
            });

        let origin = self.handle.snapshot().origin;
        let (dot, text) = if origin.is_degraded() {
            (self.map_style.degraded, "Fallback data")
        } else {
            (self.map_style.live, "Live")
        };
        Area::new(Id::new("crowdflow_status"))
            .order(Order::Middle)
            .anchor(Align2::RIGHT_TOP, Vec2::new(-EDGE, EDGE))
            .show(ctx, |ui| {
                style.card().rounding(999.0).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let (rect, _) =
                            ui.allocate_exact_size(Vec2::splat(10.0), egui::Sense::hover());
                        ui.painter().circle_filled(rect.center(), 4.0, dot);
                        ui.label(RichText::new(text).strong().color(style.text_color));
                    });
                });
            });
    }

    fn show_search(&mut self, ctx: &Context) {
        let search = &mut self.search;
        Area::new(Id::new("crowdflow_search"))
            .order(Order::Foreground)
            .anchor(Align2::CENTER_TOP, Vec2::new(0.0, EDGE))
            .show(ctx, |ui| {
                ui.add(SearchBar::new(search));
            });
    }

    fn show_legend(&self, ctx: &Context) {
        Area::new(Id::new("crowdflow_legend"))
            .order(Order::Middle)
            .anchor(Align2::LEFT_BOTTOM, Vec2::new(EDGE, -EDGE - 16.0))
            .show(ctx, |ui| {
                ui.add(Legend::new());
            });
    }

    fn show_location_button(&self, ctx: &Context) {
        let target: Arc<dyn LocationCentering> = Arc::new(self.handle.clone());
        let spawner = self.map.spawner();
        let state = &self.location;
        let offset = self.map_style.control_size * 2.0 + self.map_style.control_margin + 16.0;

        Area::new(Id::new("crowdflow_locate"))
            .order(Order::Middle)
            .anchor(Align2::RIGHT_BOTTOM, Vec2::new(-EDGE, -EDGE - offset))
            .show(ctx, |ui| {
                ui.add(LocationButton::new(state, target, spawner));
            });
    }
}
