use crate::{
    core::{
        constants::{MARKER_BASE_RADIUS, MARKER_MATCH_TOLERANCE, MARKER_RADIUS_SCALE},
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    data::crowd::CrowdPoint,
    layers::density::{classify, DensityBucket, STROKE_OPACITY, STROKE_WEIGHT},
};

/// A circle drawn at a crowd point, sized and colored by intensity
#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarker {
    id: String,
    position: LatLng,
    label: String,
    intensity: f64,
    bucket: DensityBucket,
    popup_text: Option<String>,
}

impl CircleMarker {
    pub fn new(id: String, position: LatLng, intensity: f64) -> Self {
        Self {
            id,
            position,
            label: String::new(),
            intensity,
            bucket: classify(intensity),
            popup_text: None,
        }
    }

    pub fn from_point(id: String, point: &CrowdPoint) -> Self {
        Self::new(id, point.position(), point.intensity)
            .with_label(point.label.clone())
            .with_popup(point.popup_text())
    }

    pub fn with_label(mut self, label: String) -> Self {
        self.label = label;
        self
    }

    pub fn with_popup(mut self, text: String) -> Self {
        self.popup_text = Some(text);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn bucket(&self) -> &DensityBucket {
        &self.bucket
    }

    pub fn popup_text(&self) -> Option<&str> {
        self.popup_text.as_deref()
    }

    /// Screen radius in pixels; not a physical distance
    pub fn radius(&self) -> f64 {
        MARKER_BASE_RADIUS + self.intensity * MARKER_RADIUS_SCALE
    }

    pub fn stroke_weight(&self) -> f32 {
        STROKE_WEIGHT
    }

    pub fn stroke_opacity(&self) -> f32 {
        STROKE_OPACITY
    }

    /// Whether `pixel` (viewport coordinates) falls inside the circle
    pub fn contains_pixel(&self, pixel: &Point, viewport: &Viewport) -> bool {
        let center = viewport.lat_lng_to_pixel(&self.position);
        center.distance_to(pixel) <= self.radius()
    }
}

/// All crowd markers plus the one popup that may be open
///
/// Markers are rebuilt from scratch on every point-set change. That is fine
/// for tens of points; a much larger set would want diffing by a stable id.
#[derive(Debug, Clone)]
pub struct MarkerLayer {
    markers: Vec<CircleMarker>,
    open_popup: Option<usize>,
    tolerance: f64,
}

impl MarkerLayer {
    pub fn new(tolerance: f64) -> Self {
        Self {
            markers: Vec::new(),
            open_popup: None,
            tolerance,
        }
    }

    /// Discards every marker and creates one per point
    ///
    /// An open popup survives when a marker with the same label still sits
    /// at the same coordinate.
    pub fn sync(&mut self, points: &[CrowdPoint]) {
        let reopen = self
            .open_marker()
            .map(|m| (m.position, m.label.clone()));

        self.markers = points
            .iter()
            .enumerate()
            .map(|(i, point)| CircleMarker::from_point(format!("crowd-{i}"), point))
            .collect();

        self.open_popup = reopen.and_then(|(position, label)| {
            self.markers
                .iter()
                .position(|m| m.label == label && m.position.approx_eq(&position, self.tolerance))
        });
    }

    pub fn markers(&self) -> &[CircleMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// First marker within the match tolerance of `position`
    pub fn find_at(&self, position: &LatLng) -> Option<&CircleMarker> {
        self.index_at(position).map(|i| &self.markers[i])
    }

    fn index_at(&self, position: &LatLng) -> Option<usize> {
        self.markers
            .iter()
            .position(|m| m.position.approx_eq(position, self.tolerance))
    }

    /// Opens the popup of the marker at `position`; false when none is there
    pub fn open_popup_at(&mut self, position: &LatLng) -> bool {
        match self.index_at(position) {
            Some(i) => {
                self.open_popup = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn open_popup_by_index(&mut self, index: usize) -> bool {
        if index < self.markers.len() {
            self.open_popup = Some(index);
            true
        } else {
            false
        }
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }

    pub fn open_marker(&self) -> Option<&CircleMarker> {
        self.open_popup.and_then(|i| self.markers.get(i))
    }

    /// Topmost marker under `pixel`; later markers draw above earlier ones
    pub fn hit_test(&self, pixel: &Point, viewport: &Viewport) -> Option<usize> {
        self.markers
            .iter()
            .rposition(|m| m.contains_pixel(pixel, viewport))
    }
}

impl Default for MarkerLayer {
    fn default() -> Self {
        Self::new(MARKER_MATCH_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::density::DensityLevel;

    fn points() -> Vec<CrowdPoint> {
        vec![
            CrowdPoint::new(40.7589, -73.9851, 0.9, "Times Square"),
            CrowdPoint::new(40.7505, -73.9934, 0.2, "Herald Square"),
        ]
    }

    #[test]
    fn test_radius_and_style() {
        let marker = CircleMarker::from_point("m".into(), &points()[0]);
        assert!((marker.radius() - 47.0).abs() < 1e-9);
        assert_eq!(marker.bucket().level, DensityLevel::High);
        assert_eq!(marker.stroke_weight(), 2.0);
        assert_eq!(marker.popup_text(), Some("Times Square\nCrowd Level: 90%"));
    }

    #[test]
    fn test_sync_replaces_everything() {
        let mut layer = MarkerLayer::new(0.001);
        layer.sync(&points());
        assert_eq!(layer.len(), 2);

        layer.sync(&points()[..1]);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.markers()[0].id(), "crowd-0");
    }

    #[test]
    fn test_popup_survives_resync_at_same_place() {
        let mut layer = MarkerLayer::new(0.001);
        layer.sync(&points());
        assert!(layer.open_popup_at(&LatLng::new(40.7505, -73.9934)));

        let mut jittered = points();
        jittered[1].intensity = 0.25;
        layer.sync(&jittered);
        assert_eq!(layer.open_marker().map(|m| m.label()), Some("Herald Square"));

        layer.sync(&points()[..1]);
        assert!(layer.open_marker().is_none());
    }

    #[test]
    fn test_find_at_tolerance() {
        let mut layer = MarkerLayer::new(0.001);
        layer.sync(&points());

        assert!(layer.find_at(&LatLng::new(40.7592, -73.9849)).is_some());
        assert!(layer.find_at(&LatLng::new(40.7700, -73.9851)).is_none());
        assert!(!layer.open_popup_at(&LatLng::new(0.0, 0.0)));
    }

    #[test]
    fn test_hit_test() {
        let mut layer = MarkerLayer::new(0.001);
        layer.sync(&points());
        let viewport = Viewport::new(LatLng::new(40.7589, -73.9851), 14.0, Point::new(800.0, 600.0));

        assert_eq!(layer.hit_test(&Point::new(400.0, 300.0), &viewport), Some(0));
        assert_eq!(layer.hit_test(&Point::new(5.0, 5.0), &viewport), None);
    }
}
