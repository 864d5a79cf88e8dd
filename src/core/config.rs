//! Configuration for the crowd map view model
//!
//! Everything the view model needs to know lives in [`CrowdMapConfig`]. The
//! defaults reproduce the stock behaviour (30 s refresh, 3 s jitter, Times
//! Square fallback); [`CrowdMapConfig::from_env`] lets a deployment override
//! the handful of values that differ between environments.

use crate::{
    core::{constants, geo::LatLng},
    data::crowd::{fallback_points, CrowdPoint},
    geolocation::GeolocationOptions,
    tiles::source::TileSourceOptions,
    MapError, Result,
};
use std::{env, fmt::Display, str::FromStr, time::Duration};

/// Which crowd data source the app should build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    /// Best-effort HTTP GET against `endpoint`
    Http,
    /// Locally generated points shaped like the backend payload
    Mock,
    /// Always serve the static fallback set
    Fallback,
}

impl FromStr for DataSourceKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            "fallback" | "static" => Ok(Self::Fallback),
            other => Err(MapError::Config(format!("unknown data source '{other}'"))),
        }
    }
}

impl Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Mock => write!(f, "mock"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrowdMapConfig {
    pub endpoint: String,
    pub data_source: DataSourceKind,
    pub request_timeout: Duration,
    pub refresh_interval: Duration,
    pub simulation_interval: Duration,
    pub jitter: JitterConfig,
    pub default_center: LatLng,
    pub default_zoom: f64,
    pub focus_zoom: f64,
    pub marker_match_tolerance: f64,
    pub geolocation: GeolocationOptions,
    pub notice_ttl: Duration,
    pub suggestions: Vec<String>,
    pub fallback_points: Vec<CrowdPoint>,
    pub tiles: TileSourceOptions,
}

/// Bounds and amplitude of the liveliness simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterConfig {
    pub amplitude: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            amplitude: constants::JITTER_AMPLITUDE,
            floor: constants::INTENSITY_FLOOR,
            ceiling: constants::INTENSITY_CEILING,
        }
    }
}

impl Default for CrowdMapConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            data_source: DataSourceKind::Http,
            request_timeout: Duration::from_secs(constants::REQUEST_TIMEOUT_SECS),
            refresh_interval: Duration::from_secs(constants::REFRESH_INTERVAL_SECS),
            simulation_interval: Duration::from_secs(constants::SIMULATION_INTERVAL_SECS),
            jitter: JitterConfig::default(),
            default_center: constants::DEFAULT_CENTER,
            default_zoom: constants::DEFAULT_ZOOM,
            focus_zoom: constants::FOCUS_ZOOM,
            marker_match_tolerance: constants::MARKER_MATCH_TOLERANCE,
            geolocation: GeolocationOptions::default(),
            notice_ttl: Duration::from_secs(constants::NOTICE_TTL_SECS),
            suggestions: constants::PLACE_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback_points: fallback_points(),
            tiles: TileSourceOptions::default(),
        }
    }
}

impl CrowdMapConfig {
    /// Defaults, overridden by any `CROWDFLOW_*` variables that are set and parse
    ///
    /// Each variable stands alone: an unparsable or zero value keeps its own
    /// default without discarding the other overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(endpoint) = var("CROWDFLOW_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(kind) = try_load::<DataSourceKind>("CROWDFLOW_DATA_SOURCE") {
            config.data_source = kind;
        }
        if let Some(period) = try_load_secs("CROWDFLOW_REFRESH_SECS") {
            config.refresh_interval = period;
        }
        if let Some(period) = try_load_secs("CROWDFLOW_SIMULATION_SECS") {
            config.simulation_interval = period;
        }
        if let Some(timeout) = try_load_secs("CROWDFLOW_GEOLOCATION_TIMEOUT_SECS") {
            config.geolocation.timeout = timeout;
        }

        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_data_source(mut self, kind: DataSourceKind) -> Self {
        self.data_source = kind;
        self
    }

    pub fn with_intervals(mut self, refresh: Duration, simulation: Duration) -> Self {
        self.refresh_interval = refresh;
        self.simulation_interval = simulation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() || self.simulation_interval.is_zero() {
            return Err(MapError::Config("loop periods must be non-zero".into()));
        }
        if self.jitter.floor > self.jitter.ceiling {
            return Err(MapError::Config(format!(
                "intensity floor {} exceeds ceiling {}",
                self.jitter.floor, self.jitter.ceiling
            )));
        }
        if self.jitter.amplitude < 0.0 {
            return Err(MapError::Config("jitter amplitude must not be negative".into()));
        }
        if !self.default_center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "{}, {}",
                self.default_center.lat, self.default_center.lng
            )));
        }
        Ok(())
    }
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            log::info!("{key} set, overriding default");
            Some(value)
        }
        _ => None,
    }
}

fn try_load<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: Display,
{
    let raw = var(key)?;
    raw.trim()
        .parse()
        .map_err(|e| {
            log::warn!("Invalid {key} value '{raw}': {e}, keeping default");
        })
        .ok()
}

/// A whole number of seconds; zero is rejected like any other bad value
fn try_load_secs(key: &str) -> Option<Duration> {
    match try_load::<u64>(key)? {
        0 => {
            log::warn!("{key} must be at least 1 second, keeping default");
            None
        }
        secs => Some(Duration::from_secs(secs)),
    }
}
