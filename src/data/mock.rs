//! Local stand-in for the crowd data backend
//!
//! Produces the same payload the demo backend serves: twenty samples
//! scattered around Times Square plus a handful of fixed named locations,
//! each with a fresh random intensity on every call.

use crate::data::crowd::{CrowdPoint, DataOrigin};
use crate::data::source::{CrowdDataSource, DataSourceError};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Mutex;

const SCATTER_CENTER: (f64, f64) = (40.7589, -73.9851);
const SCATTER_COUNT: usize = 20;
/// Scattered samples land within ±SCATTER_SPAN/2 degrees of the center
const SCATTER_SPAN: f64 = 0.01;

const FIXED_LOCATIONS: [(f64, f64, &str); 5] = [
    (40.7505, -73.9934, "Herald Square"),
    (40.7614, -73.9776, "Central Park South"),
    (40.7580, -73.9855, "Broadway Theater District"),
    (40.7549, -73.9840, "Garment District"),
    (40.7527, -73.9772, "Koreatown"),
];

/// Builds one mock payload from `rng`
pub fn generate_crowd_data<R: Rng + ?Sized>(rng: &mut R) -> Vec<CrowdPoint> {
    let mut points = Vec::with_capacity(SCATTER_COUNT + FIXED_LOCATIONS.len());

    for _ in 0..SCATTER_COUNT {
        points.push(CrowdPoint::new(
            SCATTER_CENTER.0 + (rng.gen::<f64>() - 0.5) * SCATTER_SPAN,
            SCATTER_CENTER.1 + (rng.gen::<f64>() - 0.5) * SCATTER_SPAN,
            rng.gen::<f64>(),
            "Times Square",
        ));
    }

    for (lat, lng, name) in FIXED_LOCATIONS {
        points.push(CrowdPoint::new(lat, lng, rng.gen::<f64>(), name));
    }

    points
}

pub struct MockCrowdSource {
    rng: Mutex<StdRng>,
}

impl MockCrowdSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for tests and reproducible demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for MockCrowdSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrowdDataSource for MockCrowdSource {
    async fn fetch_points(&self) -> Result<Vec<CrowdPoint>, DataSourceError> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Ok(generate_crowd_data(&mut *rng))
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Mock
    }

    fn name(&self) -> &str {
        "mock"
    }
}
