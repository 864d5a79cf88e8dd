//! Defaults for the crowd map, kept in one place so the engine-wide magic
//! numbers are easy to find and tweak.

use crate::core::geo::LatLng;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Map center before any data or location is known (Times Square).
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.7589,
    lng: -73.9851,
};

/// Zoom used at start-up and when falling back to the default center.
pub const DEFAULT_ZOOM: f64 = 14.0;

/// Zoom used when focusing a searched point or the device location.
pub const FOCUS_ZOOM: f64 = 16.0;

/// Highest zoom the base tiles are served at.
pub const MAX_TILE_ZOOM: u8 = 20;

/// Crowd data endpoint when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/crowd-data/";

/// Period of the real data refresh loop, in seconds.
pub const REFRESH_INTERVAL_SECS: u64 = 30;

/// Period of the local jitter simulation loop, in seconds.
pub const SIMULATION_INTERVAL_SECS: u64 = 3;

/// Per-tick jitter amplitude; deltas are drawn uniformly from `[-a, +a]`.
pub const JITTER_AMPLITUDE: f64 = 0.05;

/// Jittered intensities never drop below this, so a marker never vanishes.
pub const INTENSITY_FLOOR: f64 = 0.1;

/// Upper bound for jittered intensities.
pub const INTENSITY_CEILING: f64 = 1.0;

/// Degrees within which a marker is considered to sit on a point.
pub const MARKER_MATCH_TOLERANCE: f64 = 0.001;

/// Circle marker radius in pixels is `BASE + intensity * SCALE`.
pub const MARKER_BASE_RADIUS: f64 = 20.0;
pub const MARKER_RADIUS_SCALE: f64 = 30.0;

/// Geolocation request timeout, in seconds.
pub const GEOLOCATION_TIMEOUT_SECS: u64 = 5;

/// Age after which a cached device position is no longer reused, in seconds.
pub const GEOLOCATION_MAX_AGE_SECS: u64 = 300;

/// Upper bound on a single crowd data request, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// How long a toast stays on screen, in seconds.
pub const NOTICE_TTL_SECS: u64 = 5;

/// Known place names offered by the search box.
pub const PLACE_SUGGESTIONS: [&str; 10] = [
    "Times Square",
    "Central Park",
    "Herald Square",
    "Broadway Theater District",
    "Penn Station",
    "Columbus Circle",
    "Garment District",
    "Koreatown",
    "Madison Square Garden",
    "Empire State Building",
];
