//! Geometric analysis of radiotherapy structures and delivered beam apertures.
//!
//! Structures are stacks of planar slices ([planes::SetsOfPlanes]) composed from raw contour
//! loops. On top of them the crate computes volume, surface area, centroid, spread and cross
//! section ([metrics]), unions and overlaps between structures ([ops]) and surface to surface
//! distances ([distance]). Beams are scored for aperture complexity ([aperture]). [pipeline]
//! runs all of it over a study.
extern crate static_aabb2d_index;

#[macro_use]
mod macros;

pub mod aperture;
pub mod config;
pub mod core;
pub mod distance;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod pipeline;
pub mod planes;
pub mod polygon;
pub mod ranking;
pub mod stats;

pub use static_aabb2d_index::AABB;

pub use crate::config::AnalysisConfig;
pub use crate::error::{AnalysisError, Result};
pub use crate::pipeline::{Study, StudyReport, analyze_study};
pub use crate::planes::{SetsOfPlanes, Structure, StructureKind};
pub use crate::polygon::{Region, Ring};
