//! Oceanic age-to-depth curves.
//!
//! Each model converts the age of oceanic crust (Ma) to unloaded basement
//! depth (metres, positive down). Three published curves are built in and a
//! user-supplied piecewise-linear table is accepted as an alternative:
//!
//! - **GDH1** — Stein and Stein (1992), "Model for the global variation in
//!   oceanic depth and heat flow with lithospheric age". Piecewise
//!   root-age / exponential fit.
//! - **CROSBY_2007** — Crosby (2007) plate-model fit to the data of Crosby
//!   et al. (2006), "The relationship between depth, age and gravity in the
//!   oceans", including the 60–120 Ma perturbation term.
//! - **RHCW18** — Richards, Hoggard, Crosby and White (2018) plate cooling
//!   model with a mantle potential temperature of 1333 degrees C, a plate
//!   thickness of 130 km and a zero-age ridge depth of 2500 m.
//!
//! The plate-model curves evaluate the cooling series
//!
//! ```text
//! w(t) = sum_{n odd} -2/n^2 * exp(-n^2 pi^2 kappa t / L^2)
//! ```
//!
//! to a relative tolerance, then scale by the thermal-expansion amplitude.

use serde::{Deserialize, Serialize};

use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::interpolate::{parse_curve, Curve, OutOfBounds};
use paleobath_core::{FloatValue, Time};

/// Seconds per million years.
const SECONDS_PER_MY: FloatValue = 1.0e6 * 365.25 * 24.0 * 3600.0;

/// Relative tolerance of the plate-cooling series.
const SERIES_TOLERANCE: FloatValue = 1.0e-6;

// CROSBY_2007 plate parameters (from Crosby's age2depth fit).
const CROSBY_DENSITY_MANTLE: FloatValue = 3300.0; // kg/m3
const CROSBY_DENSITY_WATER: FloatValue = 1030.0; // kg/m3
const CROSBY_KAPPA: FloatValue = 7.8e-7; // thermal diffusivity, m2/s
const CROSBY_ALPHA: FloatValue = 3.2e-5; // thermal expansivity, 1/K
const CROSBY_TM: FloatValue = 1333.0; // mantle temperature, C
const CROSBY_RIDGE_DEPTH: FloatValue = 2600.0; // zero-age depth, m
const CROSBY_PLATE_THICKNESS: FloatValue = 1.02e5; // m

// CROSBY_2007 perturbation: a damped oscillation centred near 94 Ma.
const CROSBY_PERT_A: FloatValue = 300.0;
const CROSBY_PERT_B: FloatValue = 15.0;
const CROSBY_PERT_C: FloatValue = 0.2;
const CROSBY_PERT_D: FloatValue = 94.0;
const CROSBY_PERT_E: FloatValue = 30.0;

// RHCW18 plate parameters.
const RHCW18_DENSITY_MANTLE: FloatValue = 3330.0; // kg/m3
const RHCW18_DENSITY_WATER: FloatValue = 1030.0; // kg/m3
const RHCW18_KAPPA: FloatValue = 1.0e-6; // thermal diffusivity, m2/s
const RHCW18_ALPHA: FloatValue = 3.28e-5; // thermal expansivity, 1/K
const RHCW18_TM: FloatValue = 1333.0; // potential temperature, C
/// Zero-age ridge depth of the RHCW18 model (m).
pub const RHCW18_RIDGE_DEPTH: FloatValue = 2500.0;
const RHCW18_PLATE_THICKNESS: FloatValue = 1.3e5; // m

/// An oceanic age-to-depth model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgeToDepthModel {
    /// Stein and Stein (1992).
    Gdh1,
    /// Crosby (2007) plate model with perturbation.
    Crosby2007,
    /// Richards, Hoggard, Crosby and White (2018) plate model.
    Rhcw18,
    /// User-supplied piecewise-linear `age -> depth` table, clamped at its
    /// endpoints.
    Table(Curve),
}

impl Default for AgeToDepthModel {
    fn default() -> Self {
        Self::Gdh1
    }
}

impl AgeToDepthModel {
    /// Build a table model from two-column text. `age_column` and
    /// `depth_column` select the columns.
    pub fn parse_table(
        source: &str,
        source_name: &str,
        age_column: usize,
        depth_column: usize,
    ) -> PaleobathResult<Self> {
        Ok(Self::Table(parse_curve(
            source,
            source_name,
            age_column,
            depth_column,
            OutOfBounds::Clamp,
        )?))
    }

    /// Unloaded basement depth (m, positive down) for oceanic crust of
    /// `age` (Ma). The age must be non-negative.
    pub fn depth(&self, age: Time) -> PaleobathResult<FloatValue> {
        if age < 0.0 {
            return Err(PaleobathError::Error(format!(
                "age must be non-negative, got {}",
                age
            )));
        }
        Ok(match self {
            Self::Gdh1 => gdh1_depth(age),
            Self::Crosby2007 => crosby_2007_depth(age),
            Self::Rhcw18 => rhcw18_depth(age),
            Self::Table(curve) => curve
                .evaluate(age)
                .expect("clamped curve evaluation cannot be out of range"),
        })
    }
}

fn gdh1_depth(age: Time) -> FloatValue {
    if age < 20.0 {
        2600.0 + 365.0 * age.sqrt()
    } else {
        5651.0 - 2473.0 * (-0.0278 * age).exp()
    }
}

/// Sum of the plate-cooling series for an `age` in seconds, over odd
/// harmonics until the relative change drops below [`SERIES_TOLERANCE`].
fn cooling_series(age_seconds: FloatValue, kappa: FloatValue, plate_thickness: FloatValue) -> FloatValue {
    let decay = kappa * age_seconds * (std::f64::consts::PI / plate_thickness).powi(2);

    let mut sum = 0.0;
    let mut n = 1.0;
    loop {
        let previous = sum;
        sum += -2.0 * (-n * n * decay).exp() / (n * n);

        // Covers both exact convergence and exponent underflow at old ages.
        if sum == previous {
            return sum;
        }
        if ((sum - previous) / sum).abs() <= SERIES_TOLERANCE {
            return sum;
        }
        n += 2.0;
    }
}

fn crosby_2007_subsidence(age: Time) -> FloatValue {
    let age_seconds = age * SECONDS_PER_MY;
    let sum = cooling_series(age_seconds, CROSBY_KAPPA, CROSBY_PLATE_THICKNESS);

    let mut subsidence = sum * 2.0 * CROSBY_TM * CROSBY_PLATE_THICKNESS
        / (std::f64::consts::PI * std::f64::consts::PI);
    subsidence += CROSBY_TM * CROSBY_PLATE_THICKNESS / 2.0;
    subsidence * CROSBY_DENSITY_MANTLE * CROSBY_ALPHA
        / (CROSBY_DENSITY_MANTLE - CROSBY_DENSITY_WATER)
}

fn crosby_2007_perturbation(age: Time) -> FloatValue {
    let envelope = {
        let centred = (age - CROSBY_PERT_D) / CROSBY_PERT_E;
        (-centred * centred).exp()
    };
    CROSBY_PERT_A * envelope * ((age / CROSBY_PERT_B) - CROSBY_PERT_C).sin()
}

fn crosby_2007_depth(age: Time) -> FloatValue {
    CROSBY_RIDGE_DEPTH + crosby_2007_subsidence(age) - crosby_2007_perturbation(age)
}

fn rhcw18_depth(age: Time) -> FloatValue {
    if age == 0.0 {
        return RHCW18_RIDGE_DEPTH;
    }
    let age_seconds = age * SECONDS_PER_MY;
    let sum = cooling_series(age_seconds, RHCW18_KAPPA, RHCW18_PLATE_THICKNESS);

    let mut subsidence = sum * 2.0 * RHCW18_TM * RHCW18_PLATE_THICKNESS
        / (std::f64::consts::PI * std::f64::consts::PI);
    subsidence += RHCW18_TM * RHCW18_PLATE_THICKNESS / 2.0;
    subsidence *= RHCW18_DENSITY_MANTLE * RHCW18_ALPHA
        / (RHCW18_DENSITY_MANTLE - RHCW18_DENSITY_WATER);

    RHCW18_RIDGE_DEPTH + subsidence
}
