//! Work that runs on a timer, off the render path
//!
//! [`scheduler`] owns the periodic loops and their cancellation;
//! [`simulation`] is the intensity jitter applied between real refreshes.

pub mod scheduler;
pub mod simulation;

pub use scheduler::{spawn_delayed_periodic, spawn_periodic, LoopGuard};
pub use simulation::{jitter_intensity, Simulation};
