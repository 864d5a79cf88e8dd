//! Local "liveliness" jitter
//!
//! Between real refreshes every displayed intensity drifts by a small uniform
//! random step. The jitter is applied to a copy; the points the data source
//! returned are kept untouched next to it.

use crate::core::config::JitterConfig;
use crate::data::crowd::CrowdPoint;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Moves `current` by `delta` and clamps into `[floor, ceiling]`
///
/// A NaN result lands on the floor so the marker stays visible.
pub fn jitter_intensity(current: f64, delta: f64, config: &JitterConfig) -> f64 {
    let next = current + delta;
    if next.is_nan() {
        config.floor
    } else {
        next.clamp(config.floor, config.ceiling)
    }
}

pub struct Simulation {
    config: JitterConfig,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: JitterConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(config: JitterConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &JitterConfig {
        &self.config
    }

    /// Uniform step in `[-amplitude, +amplitude]`
    pub fn delta(&mut self) -> f64 {
        let amplitude = self.config.amplitude;
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }

    /// One tick: a jittered copy of `points`
    pub fn apply(&mut self, points: &[CrowdPoint]) -> Vec<CrowdPoint> {
        points
            .iter()
            .map(|point| {
                let delta = self.delta();
                CrowdPoint {
                    intensity: jitter_intensity(point.intensity, delta, &self.config),
                    ..point.clone()
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_to_bounds() {
        let config = JitterConfig::default();
        assert_eq!(jitter_intensity(0.12, -0.05, &config), 0.1);
        assert_eq!(jitter_intensity(0.98, 0.05, &config), 1.0);
        assert_eq!(jitter_intensity(0.0, 0.0, &config), 0.1);
        assert!((jitter_intensity(0.5, 0.03, &config) - 0.53).abs() < 1e-12);
        assert_eq!(jitter_intensity(f64::NAN, 0.01, &config), 0.1);
    }

    #[test]
    fn test_jitter_never_leaves_range() {
        let mut sim = Simulation::seeded(JitterConfig::default(), 11);
        let mut points = vec![
            CrowdPoint::new(40.75, -73.98, 0.0, "a"),
            CrowdPoint::new(40.75, -73.98, 1.0, "b"),
            CrowdPoint::new(40.75, -73.98, 0.5, "c"),
        ];

        for _ in 0..2_000 {
            points = sim.apply(&points);
            for p in &points {
                assert!((0.1..=1.0).contains(&p.intensity), "{} escaped", p.intensity);
            }
        }
    }

    #[test]
    fn test_step_is_bounded_and_positions_fixed() {
        let mut sim = Simulation::seeded(JitterConfig::default(), 5);
        let before = vec![CrowdPoint::new(40.7589, -73.9851, 0.5, "Times Square")];
        let after = sim.apply(&before);

        assert_eq!(after[0].label, "Times Square");
        assert_eq!(after[0].position(), before[0].position());
        assert!((after[0].intensity - 0.5).abs() <= 0.05 + 1e-12);
    }

    #[test]
    fn test_zero_amplitude_only_clamps() {
        let config = JitterConfig {
            amplitude: 0.0,
            ..JitterConfig::default()
        };
        let mut sim = Simulation::seeded(config, 1);
        assert_eq!(sim.delta(), 0.0);
        let out = sim.apply(&[CrowdPoint::new(0.0, 0.0, 0.05, "x")]);
        assert_eq!(out[0].intensity, 0.1);
    }
}
