//! Base map tiles: URL templates, covering grid, cache and loader

pub mod cache;
pub mod grid;
pub mod loader;
pub mod source;

pub use cache::TileCache;
pub use grid::{visible_tiles, PlacedTile};
pub use loader::{LoadedTile, TileLoader};
pub use source::{TemplateTileSource, TileSource, TileSourceOptions};
