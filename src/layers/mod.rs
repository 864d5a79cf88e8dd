pub mod density;
pub mod marker;

pub use density::{classify, DensityBucket, DensityLevel, LegendEntry, Rgb, LEGEND};
pub use marker::{CircleMarker, MarkerLayer};
