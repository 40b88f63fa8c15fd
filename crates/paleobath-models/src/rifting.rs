//! Continental passive-margin rifting subsidence.
//!
//! Uniform-extension (McKenzie) model of a rifted continental margin.
//! Rifting is treated as thermally instantaneous: crustal thinning happens
//! over the rift period, but thermal contraction only starts once rifting
//! has ended.
//!
//! # Physics overview
//!
//! Stretching the lithosphere by a factor `beta` thins the crust from its
//! pre-rift thickness `tc` to `tc / beta` and replaces it with hot mantle.
//! The immediate isostatic response (water filled) is the *syn-rift*
//! subsidence
//!
//! ```text
//! S_syn = y_L * (1 - 1/beta)
//!         * ((rho_m - rho_c) * (tc/y_L) * (1 - alpha * Tm * tc / y_L)
//!            - alpha * Tm * rho_m / 2)
//!         / (rho_m * (1 - alpha * Tm) - rho_w)
//! ```
//!
//! Afterwards the stretched lithosphere cools and contracts, adding the
//! *post-rift* thermal subsidence
//!
//! ```text
//! S_post(t) = E0 * (beta/pi) * sin(pi/beta) * (1 - exp(-t / tau))
//! ```
//!
//! with amplitude `E0 = 4 y_L rho_m alpha Tm / (pi^2 (rho_m - rho_w))` and
//! thermal time constant `tau = y_L^2 / (pi^2 kappa)`.
//!
//! Subsidence is water-loaded; the drivers fold the sediment load in
//! separately through the isostatic correction of the decompacted column.

use tracing::warn;

use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::utils::root_find::{bisect, BracketResult};
use paleobath_core::{FloatValue, Time};

/// Initial lithospheric thickness (m).
pub const LITHOSPHERIC_THICKNESS: FloatValue = 125_000.0;

/// Volumetric coefficient of thermal expansion (1/K).
const ALPHA_V: FloatValue = 3.28e-5;

/// Temperature of the mantle (C).
const TEMPERATURE_MANTLE: FloatValue = 1333.0;

/// Thermal diffusivity (m2/s).
const KAPPA: FloatValue = 1.0e-6;

// Densities of mantle, crust and water (kg/m3).
const DENSITY_MANTLE: FloatValue = 3330.0;
const DENSITY_CRUST: FloatValue = 2800.0;
const DENSITY_WATER: FloatValue = 1030.0;

const SECONDS_PER_MY: FloatValue = 365.0 * 24.0 * 3600.0 * 1.0e6;

/// Residual (m) above which a clamped beta estimate triggers a warning.
pub const MAX_SUBSIDENCE_RESIDUAL: FloatValue = 100.0;

/// Initial subsidence (m) due to continental stretching by `beta`, starting
/// from `pre_rift_crustal_thickness` (m).
///
/// The subsided basin is assumed water filled; sediment loading is handled
/// by the caller's isostatic correction.
pub fn syn_rift_subsidence(beta: FloatValue, pre_rift_crustal_thickness: FloatValue) -> FloatValue {
    let tc = pre_rift_crustal_thickness;
    let alpha_tm = ALPHA_V * TEMPERATURE_MANTLE;
    LITHOSPHERIC_THICKNESS
        * (1.0 - 1.0 / beta)
        * ((DENSITY_MANTLE - DENSITY_CRUST) * (tc / LITHOSPHERIC_THICKNESS)
            * (1.0 - alpha_tm * tc / LITHOSPHERIC_THICKNESS)
            - alpha_tm * DENSITY_MANTLE / 2.0)
        / (DENSITY_MANTLE * (1.0 - alpha_tm) - DENSITY_WATER)
}

/// Thermal subsidence (m) of lithosphere stretched by `beta`, `time` (My)
/// after the end of rifting.
pub fn post_rift_subsidence(beta: FloatValue, time: Time) -> FloatValue {
    let pi = std::f64::consts::PI;
    let amplitude = 4.0 * LITHOSPHERIC_THICKNESS * DENSITY_MANTLE * ALPHA_V * TEMPERATURE_MANTLE
        / (pi * pi * (DENSITY_MANTLE - DENSITY_WATER));
    let tau = LITHOSPHERIC_THICKNESS * LITHOSPHERIC_THICKNESS / (pi * pi * KAPPA);

    let time_seconds = time * SECONDS_PER_MY;

    amplitude * (beta / pi) * (pi / beta).sin() * (1.0 - (-time_seconds / tau).exp())
}

/// Total subsidence (m) at `time` (Ma) for a margin that rifted from
/// `rift_start_time` to `rift_end_time` with final stretching factor `beta`.
///
/// After the end of rifting this is syn-rift plus thermal subsidence. During
/// the rift period the stretching factor grows from 1 at a constant strain
/// rate (Jarvis and McKenzie 1980), so `ln beta(t)` interpolates linearly;
/// only the partial syn-rift subsidence applies. Before rifting started (or
/// at/before `rift_end_time` when no start time is given, rifting then being
/// instantaneous) there is no subsidence yet.
pub fn total_subsidence(
    beta: FloatValue,
    pre_rift_crustal_thickness: FloatValue,
    time: Time,
    rift_end_time: Time,
    rift_start_time: Option<Time>,
) -> FloatValue {
    if time < rift_end_time {
        return syn_rift_subsidence(beta, pre_rift_crustal_thickness)
            + post_rift_subsidence(beta, rift_end_time - time);
    }

    let rift_start_time = match rift_start_time {
        // Stretching is instantaneous at rift end, so prior to that nothing
        // has subsided yet.
        None => return 0.0,
        Some(start) => start,
    };
    debug_assert!(
        rift_start_time > rift_end_time,
        "rift start time must be prior to rift end time"
    );

    if time >= rift_start_time {
        return 0.0;
    }

    // Constant strain rate G over the rift period gives beta = exp(G * T),
    // so at a time inside the period beta(t) = exp(G * (t_start - t)).
    let strain_rate = beta.ln() / (rift_start_time - rift_end_time);
    let partial_beta = (strain_rate * (rift_start_time - time)).exp();

    syn_rift_subsidence(partial_beta, pre_rift_crustal_thickness)
}

/// Result of estimating the stretching factor from observed subsidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaEstimate {
    /// The estimated (possibly clamped) stretching factor.
    pub beta: FloatValue,
    /// Modelled minus observed present-day subsidence at `beta` (m).
    pub residual: FloatValue,
    /// Whether `beta` was clamped to the feasible range `[1, y_L / y_c]`.
    pub clamped: bool,
}

/// Estimate the stretching factor `beta` whose modelled present-day
/// subsidence matches `present_day_subsidence` (m, sediment unloaded).
///
/// The pre-rift crustal thickness is `beta * present_day_crustal_thickness`.
/// Modelled subsidence is strictly increasing in `beta`, so a bracketed
/// bisection over `[1, beta_max]` is used, where `beta_max` keeps the
/// pre-rift crustal thickness within the lithospheric thickness. When the
/// observed subsidence is outside the achievable range, `beta` is clamped to
/// the nearer bound; a residual beyond [`MAX_SUBSIDENCE_RESIDUAL`] warns
/// that the subsidence curve will be inaccurate by about that much.
///
/// Fails with [`PaleobathError::InfeasibleStretching`] only when no estimate
/// exists at all, i.e. a non-positive crustal thickness.
pub fn estimate_beta(
    present_day_subsidence: FloatValue,
    present_day_crustal_thickness: FloatValue,
    rift_end_time: Time,
) -> PaleobathResult<BetaEstimate> {
    if present_day_crustal_thickness <= 0.0 {
        return Err(PaleobathError::InfeasibleStretching {
            subsidence: present_day_subsidence,
            crustal_thickness: present_day_crustal_thickness,
            residual: present_day_subsidence,
        });
    }

    let modelled = |beta: FloatValue| {
        total_subsidence(
            beta,
            beta * present_day_crustal_thickness,
            0.0,
            rift_end_time,
            None,
        )
    };

    let min_beta = 1.0;
    // Pre-rift crustal thickness must not exceed the lithospheric thickness.
    let max_beta = (LITHOSPHERIC_THICKNESS / present_day_crustal_thickness).max(min_beta);

    let result = bisect(
        |beta| modelled(beta) - present_day_subsidence,
        min_beta,
        max_beta,
        1e-6,
        1e-3,
    );

    let (beta, clamped) = match result {
        BracketResult::Root(beta) => (beta, false),
        BracketResult::NoSignChange(beta) => (beta, true),
    };

    let estimate = BetaEstimate {
        beta,
        residual: modelled(beta) - present_day_subsidence,
        clamped,
    };
    warn_if_inaccurate(&estimate, present_day_subsidence, present_day_crustal_thickness);
    Ok(estimate)
}

fn warn_if_inaccurate(
    estimate: &BetaEstimate,
    present_day_subsidence: FloatValue,
    present_day_crustal_thickness: FloatValue,
) {
    if estimate.residual.abs() > MAX_SUBSIDENCE_RESIDUAL {
        warn!(
            beta = estimate.beta,
            residual = estimate.residual,
            subsidence = present_day_subsidence,
            crustal_thickness = present_day_crustal_thickness,
            "unable to accurately estimate stretching factor; tectonic subsidence \
             estimates will be inaccurate on the order of the residual"
        );
    }
}
