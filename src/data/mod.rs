//! Crowd data: the point model, the sources that produce it, and the
//! adapter that turns any source failure into the static fallback set.

pub mod crowd;
pub mod mock;
pub mod source;

pub use crowd::{fallback_points, CrowdDataResponse, CrowdPoint, DataOrigin};
pub use mock::MockCrowdSource;
pub use source::{
    parse_crowd_response, CrowdDataAdapter, CrowdDataSource, CrowdFetch, DataSourceError,
    HttpCrowdSource, StaticCrowdSource,
};
