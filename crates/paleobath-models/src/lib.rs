//! Tectonic subsidence models for paleobathymetry reconstruction.
//!
//! # Module organisation
//!
//! - `age_to_depth`: oceanic age-to-depth curves (GDH1, CROSBY_2007, RHCW18
//!   and user-supplied tables)
//! - `rifting`: syn-rift and post-rift subsidence of a continental passive
//!   margin and estimation of the stretching factor beta
//! - `reconstruction`: the plate-reconstruction interface used to carry a
//!   present-day site back through time
//! - `dynamic_topography`: time-dependent mantle-frame elevation grids
//!   sampled at reconstructed site locations
//!
//! The backtracking driver in the `paleobath` crate combines these with the
//! decompaction machinery in `paleobath-core`.

pub mod age_to_depth;
pub mod dynamic_topography;
pub mod reconstruction;
pub mod rifting;
