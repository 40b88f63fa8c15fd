//! Reconstruction of water depth and tectonic subsidence histories from
//! drill-site stratigraphy.
//!
//! Two drivers sit on top of the decompaction machinery in
//! [`paleobath_core`] and the subsidence models in [`paleobath_models`]:
//!
//! - [`backtrack`]: the paleo water depth is unknown. A tectonic subsidence
//!   model (oceanic age-to-depth, or continental rifting) provides the
//!   subsidence history and the decompacted sediment load is subtracted
//!   isostatically to yield water depth at each stratigraphic age.
//! - [`backstrip`]: the paleo water depth was recorded with the
//!   stratigraphy. The same isostatic balance is inverted to yield the
//!   tectonic subsidence history, with no subsidence model involved.
//!
//! The [`io`] module reads drill-site files and formats the decompacted
//! outputs; all raster access goes through
//! [`paleobath_core::raster::GridSampler`] so file formats stay outside the
//! engine.

pub mod backstrip;
pub mod backtrack;
pub mod io;

pub use backstrip::backstrip_well;
pub use backtrack::{backtrack_well, BacktrackConfig, BacktrackContext, RiftingPeriod};
