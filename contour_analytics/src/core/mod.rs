//! Shared numeric traits and 2D math used by the polygon, metric and aperture modules.

pub mod math;
pub mod traits;
