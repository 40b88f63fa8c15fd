//! Core building blocks for paleobathymetry reconstruction.
//!
//! This crate holds the pieces shared by the backtracking and backstripping
//! drivers in the `paleobath` crate:
//!
//! - `lithology`: registry of lithology parameters (grain density, surface
//!   porosity, porosity decay) loaded from text sources
//! - `stratigraphy`: stratigraphic columns (wells) and porosity-driven
//!   sediment decompaction
//! - `sea_level`: eustatic sea-level curves and their time averages
//! - `raster`: sampling of regular lat/lon grids
//! - `interpolate` and `utils`: piecewise-linear curves and 1-D root finding
//!
//! All quantities use SI units (metres, kg/m3) except ages, which are in Ma
//! (millions of years before present).

pub mod errors;
pub mod interpolate;
pub mod lithology;
pub mod raster;
pub mod sea_level;
pub mod stratigraphy;
pub mod utils;

/// Floating point type used throughout the crate.
pub type FloatValue = f64;

/// Geological time in Ma (millions of years before present).
pub type Time = FloatValue;

/// Density of sea water (kg/m3).
pub const DENSITY_WATER: FloatValue = 1030.0;

/// Density of the upper mantle (kg/m3).
pub const DENSITY_MANTLE: FloatValue = 3330.0;
