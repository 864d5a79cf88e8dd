//! Capabilities the map hands to sibling components
//!
//! The search bar and the location button never see the map itself, only
//! these two traits. [`crate::CrowdMapHandle`] implements both.

use crate::core::geo::LatLng;
use async_trait::async_trait;

/// Focus the map on a named location
pub trait LocationSearch: Send + Sync {
    /// Case-insensitive substring search over the current point labels
    ///
    /// On a match the viewport moves to the first matching point and its
    /// popup opens; the matched label is returned. No match is a silent
    /// no-op.
    fn search_and_focus(&self, term: &str) -> Option<String>;
}

/// Which way a centering request resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CenterOutcome {
    /// The device position was found and the map moved there
    CurrentLocation(LatLng),
    /// Geolocation failed; the map moved to the default location
    DefaultLocation(LatLng),
}

impl CenterOutcome {
    pub fn center(&self) -> LatLng {
        match self {
            Self::CurrentLocation(c) | Self::DefaultLocation(c) => *c,
        }
    }

    pub fn is_current_location(&self) -> bool {
        matches!(self, Self::CurrentLocation(_))
    }
}

/// Center the map on the device, or on the default location
#[async_trait]
pub trait LocationCentering: Send + Sync {
    /// Always moves the viewport somewhere; never fails
    async fn center_to_current_or_default_location(&self) -> CenterOutcome;
}
