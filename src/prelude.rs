//! Commonly used types, for `use crowdflow::prelude::*;`

pub use crate::core::{
    config::{CrowdMapConfig, DataSourceKind, JitterConfig},
    geo::{LatLng, Point, TileCoord},
    map::{CrowdMap, CrowdMapHandle, CrowdSnapshot},
    notice::{Notice, NoticeSeverity},
    viewport::Viewport,
};

pub use crate::data::{
    CrowdDataAdapter, CrowdDataSource, CrowdPoint, DataOrigin, HttpCrowdSource, MockCrowdSource,
    StaticCrowdSource,
};

pub use crate::geolocation::{
    CachedGeolocation, FixedGeolocation, GeolocationProvider, IpGeolocation, UnavailableGeolocation,
};

pub use crate::layers::{classify, CircleMarker, DensityBucket, DensityLevel};

pub use crate::background::LoopGuard;

pub use crate::runtime::{AsyncHandle, AsyncSpawner, TokioSpawner};

pub use crate::search::{SearchBox, SearchKey};

pub use crate::traits::{CenterOutcome, LocationCentering, LocationSearch};

#[cfg(feature = "egui")]
pub use crate::ui::{CrowdFlowPage, CrowdMapWidget, TileLayerView};

pub use crate::{MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHashSet};

pub use futures::future::BoxFuture;
