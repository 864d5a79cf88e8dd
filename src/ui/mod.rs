//! egui front end for the crowd map

pub mod legend;
pub mod location_button;
pub mod notice;
pub mod page;
pub mod popup;
pub mod search_bar;
pub mod style;
pub mod widget;

pub use legend::Legend;
pub use location_button::{LocationButton, LocationButtonState};
pub use page::{spawn_repaint_on_change, CrowdFlowPage};
pub use search_bar::SearchBar;
pub use style::{MapStyle, OverlayStyle};
pub use widget::{CrowdMapWidget, TileLayerView};
