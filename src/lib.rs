//! # CrowdFlow
//!
//! A live crowd-density map built on a Leaflet-style view model.
//!
//! The library is headless: [`CrowdMap`] owns the viewport, the periodic
//! refresh and simulation loops, the circle markers and their popups, and
//! hands out a cloneable [`CrowdMapHandle`] that sibling components (search
//! box, location button) use instead of global callbacks. The optional
//! `egui` feature adds widgets that draw all of this.

pub mod background;
pub mod core;
pub mod data;
pub mod geolocation;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod search;
pub mod tiles;
pub mod traits;

#[cfg(feature = "egui")]
pub mod ui;

pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::CrowdMapConfig,
    geo::{LatLng, Point, TileCoord},
    map::{CrowdMap, CrowdMapHandle, CrowdSnapshot, MapState},
    notice::{Notice, NoticeBoard, NoticeSeverity},
    viewport::Viewport,
};

pub use data::{
    crowd::{CrowdPoint, DataOrigin},
    source::{CrowdDataSource, CrowdFetch, DataSourceError, HttpCrowdSource},
};

pub use geolocation::{GeolocationError, GeolocationOptions, GeolocationProvider};

pub use layers::{
    density::{classify, DensityBucket, DensityLevel},
    marker::{CircleMarker, MarkerLayer},
};

pub use background::LoopGuard;

pub use runtime::{AsyncSpawner, TokioSpawner};

pub use search::{SearchBox, SearchKey};

pub use traits::{CenterOutcome, LocationCentering, LocationSearch};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors that reach the caller
///
/// Data source and geolocation failures never do: they become fallback data
/// and notices inside the view model.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Error type alias for convenience
pub type Error = MapError;
