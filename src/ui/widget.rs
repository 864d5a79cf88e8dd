use crate::{
    core::{
        constants::MAX_TILE_ZOOM,
        geo::{Point, TileCoord},
        viewport::Viewport,
    },
    layers::marker::CircleMarker,
    prelude::HashMap,
    tiles::{visible_tiles, TileLoader},
    ui::{
        popup,
        style::{with_opacity, MapStyle},
    },
    CrowdMapHandle,
};
use egui::{
    Color32, ColorImage, Pos2, Rect, Response, Sense, Stroke, TextureHandle, Ui, Vec2, Widget,
};
use std::time::Duration;

/// Fraction of a zoom level per scroll pixel
const SCROLL_ZOOM_SPEED: f64 = 0.002;
const PULSE_PERIOD_SECS: f64 = 1.5;
const MAX_TEXTURES: usize = 256;

/// Base tiles as egui textures
///
/// Downloads go through the [`TileLoader`]; decoded textures are kept until
/// there are more than a screenful or two.
pub struct TileLayerView {
    loader: Option<TileLoader>,
    textures: HashMap<TileCoord, TextureHandle>,
}

impl TileLayerView {
    pub fn new(loader: TileLoader) -> Self {
        Self {
            loader: Some(loader),
            textures: HashMap::default(),
        }
    }

    /// Draws placeholders only; for tests and offline use
    pub fn disabled() -> Self {
        Self {
            loader: None,
            textures: HashMap::default(),
        }
    }

    pub fn attribution(&self) -> Option<&str> {
        self.loader.as_ref().map(|l| l.source().attribution())
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn upload(&mut self, ctx: &egui::Context, coord: TileCoord, bytes: &[u8]) {
        match decode_tile(bytes) {
            Some(image) => {
                let name = format!("tile_{}_{}_{}", coord.z, coord.x, coord.y);
                let texture = ctx.load_texture(name, image, egui::TextureOptions::LINEAR);
                self.textures.insert(coord, texture);
            }
            None => log::warn!("could not decode tile {:?}", coord),
        }
    }

    pub fn paint(&mut self, ui: &Ui, rect: Rect, viewport: &Viewport, style: &MapStyle) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, style.background);

        let Some(loader) = self.loader.take() else {
            for tile in visible_tiles(viewport, MAX_TILE_ZOOM) {
                let target = tile_rect(rect, tile.screen_min, tile.size);
                painter.rect_stroke(target, 0.0, Stroke::new(1.0, style.tile_placeholder));
            }
            return;
        };

        for done in loader.drain() {
            if let Some(bytes) = done.bytes {
                self.upload(ui.ctx(), done.coord, &bytes);
            }
        }

        let tiles = visible_tiles(viewport, loader.source().max_zoom());
        for tile in &tiles {
            if !self.textures.contains_key(&tile.coord) {
                match loader.cache().get(&tile.coord) {
                    Some(bytes) => self.upload(ui.ctx(), tile.coord, &bytes),
                    None => {
                        loader.request(tile.coord);
                    }
                }
            }

            let target = tile_rect(rect, tile.screen_min, tile.size);
            match self.textures.get(&tile.coord) {
                Some(texture) => {
                    painter.image(
                        texture.id(),
                        target,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                None => {
                    painter.rect_filled(target.shrink(0.5), 0.0, style.tile_placeholder);
                }
            }
        }

        if self.textures.len() > MAX_TEXTURES {
            self.textures
                .retain(|coord, _| tiles.iter().any(|t| t.coord == *coord));
        }

        if loader.pending() > 0 {
            ui.ctx().request_repaint_after(Duration::from_millis(100));
        }
        self.loader = Some(loader);
    }
}

fn tile_rect(rect: Rect, screen_min: Point, size: f64) -> Rect {
    Rect::from_min_size(
        rect.min + Vec2::new(screen_min.x as f32, screen_min.y as f32),
        Vec2::splat(size as f32),
    )
}

pub fn decode_tile(bytes: &[u8]) -> Option<ColorImage> {
    let image = image::load_from_memory(bytes).ok()?.to_rgba8();
    let (width, height) = image.dimensions();
    Some(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        image.as_raw(),
    ))
}

/// The crowd map: tiles, density circles, the open popup and zoom buttons
///
/// All state lives in the [`CrowdMapHandle`]; the widget only translates
/// input into handle calls and paints what the handle holds.
pub struct CrowdMapWidget<'a> {
    handle: &'a CrowdMapHandle,
    tiles: &'a mut TileLayerView,
    style: MapStyle,
    interactive: bool,
    show_zoom_control: bool,
}

impl<'a> CrowdMapWidget<'a> {
    pub fn new(handle: &'a CrowdMapHandle, tiles: &'a mut TileLayerView) -> Self {
        Self {
            handle,
            tiles,
            style: MapStyle::default(),
            interactive: true,
            show_zoom_control: true,
        }
    }

    pub fn style(mut self, style: MapStyle) -> Self {
        self.style = style;
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn zoom_control(mut self, show: bool) -> Self {
        self.show_zoom_control = show;
        self
    }

    fn handle_input(&self, ui: &Ui, rect: Rect, response: &Response) {
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                let focus = ui
                    .input(|i| i.pointer.hover_pos())
                    .map(|p| Point::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64));
                let zoom = self.handle.viewport().zoom + scroll as f64 * SCROLL_ZOOM_SPEED;
                self.handle.zoom_around(zoom, focus);
            }
        }

        if response.dragged() {
            let delta = response.drag_delta();
            if delta.length_sq() > 0.0 {
                self.handle.pan(Point::new(delta.x as f64, delta.y as f64));
            }
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
                self.handle.click(local);
            }
        }
    }

    fn paint_markers(&self, ui: &Ui, rect: Rect) -> bool {
        let painter = ui.painter_at(rect);
        let time = ui.input(|i| i.time);
        let mut pulsing = false;

        self.handle.read(|state| {
            let viewport = state.viewport();
            for marker in state.markers().markers() {
                let center = to_screen(rect, viewport.lat_lng_to_pixel(&marker.position()));
                if !rect.expand(marker.radius() as f32 * 2.0).contains(center) {
                    continue;
                }
                paint_circle(&painter, center, marker, time);
                pulsing |= marker.bucket().pulsing;
            }
        });
        pulsing
    }

    fn paint_zoom_control(&self, ui: &mut Ui, rect: Rect) {
        let size = self.style.control_size;
        let margin = self.style.control_margin;
        let zoom_out = Rect::from_min_size(
            rect.right_bottom() - Vec2::new(margin + size, margin + size),
            Vec2::splat(size),
        );
        let zoom_in = zoom_out.translate(Vec2::new(0.0, -size - 4.0));

        for (button, label, zoom_in_pressed) in [(zoom_in, "+", true), (zoom_out, "−", false)] {
            let response = ui.allocate_rect(button, Sense::click());
            let fill = if response.hovered() {
                Color32::from_gray(245)
            } else {
                Color32::WHITE
            };
            ui.painter().rect_filled(button, 4.0, fill);
            ui.painter()
                .rect_stroke(button, 4.0, Stroke::new(1.0, Color32::from_gray(200)));
            ui.painter().text(
                button.center(),
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(16.0),
                Color32::from_gray(40),
            );

            if response.clicked() {
                if zoom_in_pressed {
                    self.handle.zoom_in();
                } else {
                    self.handle.zoom_out();
                }
            }
        }
    }

    fn paint_attribution(&self, ui: &Ui, rect: Rect) {
        if let Some(text) = self.tiles.attribution().filter(|t| !t.is_empty()) {
            ui.painter().text(
                rect.left_bottom() + Vec2::new(6.0, -4.0),
                egui::Align2::LEFT_BOTTOM,
                text,
                self.style.attribution_font.clone(),
                self.style.attribution_color,
            );
        }
    }
}

fn to_screen(rect: Rect, pixel: Point) -> Pos2 {
    rect.min + Vec2::new(pixel.x as f32, pixel.y as f32)
}

fn paint_circle(painter: &egui::Painter, center: Pos2, marker: &CircleMarker, time: f64) {
    let bucket = marker.bucket();
    let radius = marker.radius() as f32;

    if bucket.pulsing {
        let phase = (time % PULSE_PERIOD_SECS / PULSE_PERIOD_SECS) as f32;
        painter.circle_stroke(
            center,
            radius * (1.0 + 0.5 * phase),
            Stroke::new(2.0, with_opacity(bucket.color, (1.0 - phase) * 0.6)),
        );
    }

    painter.circle(
        center,
        radius,
        with_opacity(bucket.color, bucket.fill_opacity),
        Stroke::new(
            marker.stroke_weight(),
            with_opacity(bucket.color, marker.stroke_opacity()),
        ),
    );
}

impl Widget for CrowdMapWidget<'_> {
    fn ui(mut self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.handle
            .set_size(Point::new(rect.width() as f64, rect.height() as f64));

        if self.interactive {
            self.handle_input(ui, rect, &response);
        }

        let viewport = self.handle.viewport();
        self.tiles.paint(ui, rect, &viewport, &self.style);
        let pulsing = self.paint_markers(ui, rect);

        let open = self.handle.read(|state| {
            state.markers().open_marker().map(|m| {
                let center = to_screen(rect, state.viewport().lat_lng_to_pixel(&m.position()));
                let text = m.popup_text().unwrap_or(m.label()).to_string();
                (center - Vec2::new(0.0, m.radius() as f32), text)
            })
        });
        if let Some((anchor, text)) = open {
            if rect.contains(anchor) && popup::show_popup(ui.ctx(), anchor, &text) {
                self.handle.close_popup();
            }
        }

        if self.show_zoom_control {
            self.paint_zoom_control(ui, rect);
        }
        self.paint_attribution(ui, rect);

        if pulsing {
            ui.ctx().request_repaint_after(Duration::from_millis(33));
        }
        response
    }
}
