use crate::core::{
    constants::TILE_SIZE,
    geo::{Point, TileCoord},
    viewport::Viewport,
};

/// A tile and where its top-left corner lands on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub coord: TileCoord,
    pub screen_min: Point,
    /// Edge length on screen; differs from 256 at fractional zoom
    pub size: f64,
}

/// Tiles covering `viewport`, nearest to the center first
///
/// Tiles come from the integer zoom closest to the view zoom, capped at
/// `max_zoom`, and are scaled to fit. Columns wrap around the antimeridian;
/// rows outside the world are skipped.
pub fn visible_tiles(viewport: &Viewport, max_zoom: u8) -> Vec<PlacedTile> {
    let tile_zoom = viewport.zoom.round().clamp(0.0, f64::from(max_zoom)) as u8;
    let size = f64::from(TILE_SIZE) * 2_f64.powf(viewport.zoom - f64::from(tile_zoom));
    if size <= 0.0 || !size.is_finite() {
        return Vec::new();
    }

    let origin = viewport.pixel_origin();
    let n = 1_i64 << tile_zoom;

    let min_x = (origin.x / size).floor() as i64;
    let max_x = ((origin.x + viewport.size.x) / size).ceil() as i64 - 1;
    let min_y = ((origin.y / size).floor() as i64).max(0);
    let max_y = (((origin.y + viewport.size.y) / size).ceil() as i64 - 1).min(n - 1);

    let center = viewport.size.multiply(0.5);
    let mut tiles = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let screen_min = Point::new(x as f64 * size - origin.x, y as f64 * size - origin.y);
            tiles.push(PlacedTile {
                coord: TileCoord::new(x.rem_euclid(n) as u32, y as u32, tile_zoom),
                screen_min,
                size,
            });
        }
    }

    tiles.sort_by(|a, b| {
        let da = a.screen_min.add(&Point::new(a.size / 2.0, a.size / 2.0)).distance_to(&center);
        let db = b.screen_min.add(&Point::new(b.size / 2.0, b.size / 2.0)).distance_to(&center);
        da.total_cmp(&db)
    });
    tiles
}
