use crate::core::geo::LatLng;
use serde::{Deserialize, Serialize};

/// A single crowd density sample
///
/// Field names follow the wire format of the crowd data endpoint
/// (`lat`, `lng`, `intensity`, `location`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrowdPoint {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Normalized density, 0 (empty) to 1 (extreme)
    pub intensity: f64,
    #[serde(rename = "location")]
    pub label: String,
}

impl CrowdPoint {
    pub fn new(latitude: f64, longitude: f64, intensity: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            intensity,
            label: label.into(),
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Clamps intensity into `[0, 1]`; non-finite values become 0
    pub fn normalized(mut self) -> Self {
        self.intensity = if self.intensity.is_finite() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Intensity as a whole percentage, as shown in the marker popup
    pub fn crowd_level_percent(&self) -> u32 {
        (self.intensity * 100.0).round().clamp(0.0, 100.0) as u32
    }

    pub fn popup_text(&self) -> String {
        format!("{}\nCrowd Level: {}%", self.label, self.crowd_level_percent())
    }

    pub fn matches(&self, term_lowercase: &str) -> bool {
        self.label.to_lowercase().contains(term_lowercase)
    }
}

/// Body of a successful crowd data response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrowdDataResponse {
    pub data: Vec<CrowdPoint>,
}

/// Where the currently displayed points came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Nothing has been loaded yet
    Empty,
    /// Fresh data from the crowd data endpoint
    Live,
    /// Locally generated demo data
    Mock,
    /// A fixed data set configured on purpose
    Static,
    /// The source failed and the fallback set was substituted
    Fallback,
}

impl DataOrigin {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// The known-good points shown whenever the real source fails
pub fn fallback_points() -> Vec<CrowdPoint> {
    vec![
        CrowdPoint::new(40.7589, -73.9851, 0.9, "Times Square"),
        CrowdPoint::new(40.7505, -73.9934, 0.7, "Herald Square"),
    ]
}
