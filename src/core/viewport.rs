use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const EARTH_RADIUS: f64 = 6378137.0;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center: Self::clamp_center(center),
            zoom: zoom.clamp(0.0, 20.0),
            size,
            min_zoom: 0.0,
            max_zoom: 20.0,
        }
    }

    /// Pans and zooms in one step
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.set_center(center);
        self.set_zoom(zoom);
    }

    /// Sets the center of the viewport, clamping latitude to the projectable range
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(LatLng::clamp_lat(center.lat), center.lng)
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates (EPSG:3857) at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let scale = 256.0 * 2_f64.powf(z);

        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + LatLng::clamp_lat(lat_lng.lat).to_radians() / 2.0).tan().ln())
            * EARTH_RADIUS;

        let circumference = 2.0 * PI * EARTH_RADIUS;
        let pixel_x = (x + PI * EARTH_RADIUS) / circumference * scale;
        let pixel_y = (-y + PI * EARTH_RADIUS) / circumference * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = 256.0 * 2_f64.powf(z);

        let circumference = 2.0 * PI * EARTH_RADIUS;
        let x = (pixel.x / scale) * circumference - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * circumference;

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    /// World pixel of the top-left corner of the viewport
    pub fn pixel_origin(&self) -> Point {
        self.project(&self.center, None)
            .subtract(&self.size.multiply(0.5))
    }

    /// Converts geographical coordinates to pixel coordinates inside the viewport
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Converts pixel coordinates inside the viewport back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// Pans the viewport by a pixel offset (drag direction)
    pub fn pan(&mut self, delta: Point) {
        let center_px = self.project(&self.center, None);
        let new_center = self.unproject(&center_px.subtract(&delta), None);
        self.set_center(LatLng::new(new_center.lat, wrap_lng(new_center.lng)));
    }

    /// Zooms while keeping the coordinate under `focus` (a viewport pixel) fixed
    pub fn zoom_around(&mut self, zoom: f64, focus: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        let Some(focus) = focus else {
            self.zoom = new_zoom;
            return;
        };

        let anchor = self.pixel_to_lat_lng(&focus);
        self.zoom = new_zoom;
        let anchor_px = self.lat_lng_to_pixel(&anchor);
        self.pan(focus.subtract(&anchor_px));
    }
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(LatLng::new(40.7589, -73.9851), 14.0, Point::new(800.0, 600.0));

        assert_eq!(viewport.zoom, 14.0);
        assert_eq!(viewport.center.lat, 40.7589);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_center_projects_to_middle_of_viewport() {
        let viewport = Viewport::new(LatLng::new(40.7589, -73.9851), 14.0, Point::new(800.0, 600.0));
        let px = viewport.lat_lng_to_pixel(&viewport.center);

        assert!((px.x - 400.0).abs() < 1e-6);
        assert!((px.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center_lat_lng = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center_lat_lng.lat.abs() < 0.01);
        assert!(center_lat_lng.lng.abs() < 0.01);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_pan_moves_center_against_drag() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 3.0, Point::new(512.0, 512.0));
        viewport.pan(Point::new(10.0, 0.0));

        // Dragging the map to the right reveals what lies to the west
        assert!(viewport.center.lng < 0.0);
    }

    #[test]
    fn test_zoom_around_keeps_focus_fixed() {
        let mut viewport = Viewport::new(LatLng::new(40.7589, -73.9851), 12.0, Point::new(800.0, 600.0));
        let focus = Point::new(600.0, 150.0);
        let before = viewport.pixel_to_lat_lng(&focus);

        viewport.zoom_around(14.0, Some(focus));
        let after = viewport.pixel_to_lat_lng(&focus);

        assert_eq!(viewport.zoom, 14.0);
        assert!(before.approx_eq(&after, 1e-6));
    }
}
