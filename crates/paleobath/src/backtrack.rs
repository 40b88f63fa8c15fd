//! Backtracking: solving for paleo water depth.
//!
//! Backtracking combines a tectonic subsidence model with the decompacted
//! sediment load. At each stratigraphic age `t` the water depth follows
//! from the isostatic balance
//!
//! ```text
//! W(t) = S(t) - (rho_m - rho_avg) / (rho_m - rho_w) * T(t)
//!        + sea_level(t) * rho_m / (rho_m - rho_w)
//! ```
//!
//! where `S` is the modelled tectonic subsidence, `T` and `rho_avg` the
//! decompacted thickness and density of the column, and the sea-level term
//! accounts for eustatic changes relative to present day.
//!
//! The subsidence model depends on the crust under the site:
//!
//! - **Oceanic** (inside the age grid): an age-to-depth curve, shifted by a
//!   constant offset so it passes through the observed present-day
//!   subsidence (anomalous crust correction).
//! - **Continental** (outside the age grid): McKenzie-style rifting. The
//!   stretching factor is estimated so the modelled present-day subsidence
//!   matches the observed one.
//!
//! A dynamic-topography model, when supplied, contributes its elevation
//! change relative to present day (oceanic) or rift start (continental).

use tracing::warn;

use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::lithology::{LithologyRegistry, DEFAULT_BASE_LITHOLOGY_NAME};
use paleobath_core::raster::GridSampler;
use paleobath_core::sea_level::SeaLevel;
use paleobath_core::stratigraphy::{DecompactedWell, StratigraphicUnit, Well};
use paleobath_core::{FloatValue, Time};
use paleobath_models::age_to_depth::AgeToDepthModel;
use paleobath_models::dynamic_topography::DynamicTopography;
use paleobath_models::rifting;

/// Fractional excess of drill-site depth over the total-sediment-thickness
/// raster that triggers a warning.
const SEDIMENT_THICKNESS_EXCESS_WARN_RATIO: FloatValue = 0.01;

/// A rifting period supplied by the caller, overriding any values read from
/// the drill-site file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiftingPeriod {
    /// Time rifting started (Ma). When absent, stretching is treated as
    /// instantaneous at the rift end.
    pub start_age: Option<Time>,
    /// Time rifting ended (Ma).
    pub end_age: Option<Time>,
}

/// Configuration of a backtracking run.
#[derive(Debug, Clone)]
pub struct BacktrackConfig {
    /// Age-to-depth model for oceanic crust.
    pub age_to_depth: AgeToDepthModel,
    /// Lithology of a synthesized base unit (must be in the registry).
    pub base_lithology_name: String,
    /// Rifting period override for continental sites.
    pub rifting_period: Option<RiftingPeriod>,
    /// Treat nodata from the topography, sediment-thickness and
    /// crustal-thickness rasters as fatal instead of falling back to zero.
    pub strict_grids: bool,
}

impl Default for BacktrackConfig {
    fn default() -> Self {
        Self {
            age_to_depth: AgeToDepthModel::default(),
            base_lithology_name: DEFAULT_BASE_LITHOLOGY_NAME.to_string(),
            rifting_period: None,
            strict_grids: false,
        }
    }
}

/// The rasters and optional models a backtracking run samples at the site.
pub struct BacktrackContext<'a> {
    /// Ocean-floor age grid. Nodata selects the continental branch.
    pub age_grid: &'a dyn GridSampler,
    /// Topography/bathymetry grid (negative below sea level).
    pub topography_grid: &'a dyn GridSampler,
    /// Present-day total sediment thickness grid.
    pub total_sediment_thickness_grid: &'a dyn GridSampler,
    /// Present-day crustal thickness grid (continental branch).
    pub crustal_thickness_grid: &'a dyn GridSampler,
    /// Rift start-age grid, consulted when the drill site carries no
    /// rifting metadata (continental branch).
    pub rift_start_grid: Option<&'a dyn GridSampler>,
    /// Rift end-age grid, consulted when the drill site carries no rifting
    /// metadata (continental branch).
    pub rift_end_grid: Option<&'a dyn GridSampler>,
    /// Dynamic-topography model bound to the site, if any.
    pub dynamic_topography: Option<&'a DynamicTopography>,
    /// Eustatic sea-level model, if any.
    pub sea_level: Option<&'a SeaLevel>,
}

/// Backtrack a drill site.
///
/// Returns the well — amended with a base sediment unit when the recorded
/// stratigraphy is thinner than the total-sediment-thickness raster — and
/// one decompacted column per stratigraphic age, each with its tectonic
/// subsidence attached, plus a final empty column at basement age.
pub fn backtrack_well(
    mut well: Well,
    registry: &LithologyRegistry,
    context: &BacktrackContext<'_>,
    config: &BacktrackConfig,
) -> PaleobathResult<(Well, Vec<DecompactedWell>)> {
    if let Some(rifting_period) = config.rifting_period {
        if rifting_period.start_age.is_some() {
            well.rift_start_age = rifting_period.start_age;
        }
        if rifting_period.end_age.is_some() {
            well.rift_end_age = rifting_period.end_age;
        }
    }

    let (longitude, latitude) = site_location(&well)?;

    if well.units().is_empty() {
        return Ok((well, Vec::new()));
    }

    // Nodata in the age grid means the site sits on continental crust near a
    // passive margin; rifting then provides the subsidence model. The rift
    // period comes from the drill-site file (or the caller's override),
    // falling back to the rift grids.
    let crust_age = context.age_grid.sample(longitude, latitude);
    if crust_age.is_none() {
        if well.rift_end_age.is_none() {
            if let Some(grid) = context.rift_end_grid {
                match grid.sample(longitude, latitude) {
                    Some(age) => well.rift_end_age = Some(age),
                    None if config.strict_grids => {
                        return Err(PaleobathError::LocationOutOfGrid {
                            grid_name: "rift end age".to_string(),
                            longitude,
                            latitude,
                        })
                    }
                    None => {}
                }
            }
        }
        if well.rift_start_age.is_none() {
            if let Some(grid) = context.rift_start_grid {
                well.rift_start_age = grid.sample(longitude, latitude);
            }
        }
        if well.rift_end_age.is_none() {
            return Err(PaleobathError::RiftParametersMissing {
                longitude,
                latitude,
            });
        }
    }

    let sample_or_zero = |grid: &dyn GridSampler, grid_name: &str| -> PaleobathResult<FloatValue> {
        match grid.sample(longitude, latitude) {
            Some(value) => Ok(value),
            None if config.strict_grids => Err(PaleobathError::LocationOutOfGrid {
                grid_name: grid_name.to_string(),
                longitude,
                latitude,
            }),
            None => Ok(0.0),
        }
    };

    // Topography is negative in the ocean but water depth is positive down,
    // and never above sea level. A recorded water depth wins over the grid.
    let present_day_water_depth = match well.water_depth {
        Some(depth) => depth,
        None => (-sample_or_zero(context.topography_grid, "topography")?).max(0.0),
    };

    let total_sediment_thickness =
        sample_or_zero(context.total_sediment_thickness_grid, "total sediment thickness")?;

    add_base_unit_to_basement(&mut well, total_sediment_thickness, registry, config, crust_age)?;

    let mut decompacted_wells = well.decompact_all();
    let deepest_unit = well.deepest_unit().expect("well has units").clone();
    decompacted_wells.push(DecompactedWell::at_basement(&deepest_unit));

    if let Some(sea_level) = context.sea_level {
        add_sea_level(&mut decompacted_wells, sea_level);
    }

    // Unloading the present-day column gives the observed tectonic
    // subsidence the models are anchored to. Sea level is zero at present
    // day so no eustatic term enters here.
    let present_day_tectonic_subsidence =
        present_day_water_depth + decompacted_wells[0].sediment_isostatic_correction();

    match crust_age {
        Some(crust_age) => add_oceanic_tectonic_subsidence(
            &mut decompacted_wells,
            present_day_tectonic_subsidence,
            &config.age_to_depth,
            crust_age,
            context.dynamic_topography,
        )?,
        None => {
            let crustal_thickness =
                sample_or_zero(context.crustal_thickness_grid, "crustal thickness")?;
            add_continental_tectonic_subsidence(
                &mut decompacted_wells,
                present_day_tectonic_subsidence,
                crustal_thickness,
                well.rift_end_age.expect("checked above"),
                well.rift_start_age,
                context.dynamic_topography,
            )?;
        }
    }

    Ok((well, decompacted_wells))
}

fn site_location(well: &Well) -> PaleobathResult<(FloatValue, FloatValue)> {
    match (well.longitude, well.latitude) {
        (Some(longitude), Some(latitude)) => Ok((longitude, latitude)),
        _ => Err(PaleobathError::Error(
            "drill-site location was not in the file and was not supplied".to_string(),
        )),
    }
}

/// Append a base unit covering the gap between the recorded stratigraphy
/// and the total sediment thickness at the site.
///
/// The base unit's bottom age is the basement age: the crust age on oceanic
/// crust, or the rift start age (falling back to the rift end age) on
/// continental crust. A drill site deeper than the raster's total sediment
/// thickness leaves the well unchanged with a warning.
fn add_base_unit_to_basement(
    well: &mut Well,
    total_sediment_thickness: FloatValue,
    registry: &LithologyRegistry,
    config: &BacktrackConfig,
    crust_age: Option<Time>,
) -> PaleobathResult<()> {
    let deepest = well.deepest_unit().expect("well has units").clone();
    let well_thickness = deepest.bottom_depth;

    if well_thickness < total_sediment_thickness {
        let top_age = deepest.bottom_age;
        let bottom_age = match crust_age {
            Some(age) => age,
            // Sediment presumably started filling when rifting (and hence
            // subsidence) began.
            None => well
                .rift_start_age
                .or(well.rift_end_age)
                .expect("continental site has a rift age"),
        }
        .max(top_age);

        let lithology = registry
            .combine(&[(config.base_lithology_name.clone(), 1.0)])
            .map_err(|_| PaleobathError::UnknownLithology(config.base_lithology_name.clone()))?;

        well.add_unit(
            StratigraphicUnit::new(
                top_age,
                bottom_age,
                well_thickness,
                total_sediment_thickness,
                lithology,
            )
            .with_components(vec![(config.base_lithology_name.clone(), 1.0)]),
        )?;
    } else if well_thickness - total_sediment_thickness
        > SEDIMENT_THICKNESS_EXCESS_WARN_RATIO * well_thickness
    {
        // Large uncertainties in the sediment thickness grid make this
        // common enough to tolerate.
        warn!(
            well_thickness,
            total_sediment_thickness,
            "drill site is deeper than the total sediment thickness grid; \
             ignoring the grid"
        );
    }
    Ok(())
}

/// Attach the mean sea level over each column's deposition interval.
fn add_sea_level(decompacted_wells: &mut [DecompactedWell], sea_level: &SeaLevel) {
    for decompacted_well in decompacted_wells {
        decompacted_well.sea_level = Some(sea_level.average_level(
            decompacted_well.surface_unit.bottom_age,
            decompacted_well.surface_unit.top_age,
        ));
    }
}

/// Oceanic branch: age-to-depth curve anchored to the observed present-day
/// subsidence.
fn add_oceanic_tectonic_subsidence(
    decompacted_wells: &mut [DecompactedWell],
    present_day_tectonic_subsidence: FloatValue,
    age_to_depth: &AgeToDepthModel,
    crust_age: Time,
    dynamic_topography: Option<&DynamicTopography>,
) -> PaleobathResult<()> {
    // Anomalous-crust offset: the constant difference between the observed
    // unloaded water depth and the model, assumed to hold at all ages.
    let model_at_present_day = age_to_depth.depth(crust_age)?;
    let model_adjustment = present_day_tectonic_subsidence - model_at_present_day;

    let dynamic_topography = resolve_dynamic_topography(dynamic_topography);
    let dynamic_topography_at_present_day =
        dynamic_topography.and_then(|model| model.sample_clamped(0.0));

    for decompacted_well in decompacted_wells {
        let decompaction_time = decompacted_well.age;

        // Age of the ocean basin at this decompaction time.
        let paleo_crust_age = (crust_age - decompaction_time).max(0.0);
        let mut subsidence = age_to_depth.depth(paleo_crust_age)? + model_adjustment;

        if let (Some(model), Some(at_present_day)) =
            (dynamic_topography, dynamic_topography_at_present_day)
        {
            if let Some(at_decompaction_time) = model.sample_clamped(decompaction_time) {
                let relative = at_decompaction_time - at_present_day;
                // Dynamic topography is elevation, so its rise reduces
                // subsidence.
                subsidence -= relative;
                decompacted_well.dynamic_topography = Some(relative);
            }
        }

        decompacted_well.tectonic_subsidence = Some(subsidence);
    }
    Ok(())
}

/// Continental branch: rifting subsidence with the stretching factor
/// estimated from the observed present-day subsidence.
fn add_continental_tectonic_subsidence(
    decompacted_wells: &mut [DecompactedWell],
    mut present_day_tectonic_subsidence: FloatValue,
    present_day_crustal_thickness: FloatValue,
    rift_end_age: Time,
    rift_start_age: Option<Time>,
    dynamic_topography: Option<&DynamicTopography>,
) -> PaleobathResult<()> {
    let dynamic_topography = resolve_dynamic_topography(dynamic_topography);

    // Remove the dynamic-topography contribution accumulated since rift
    // start, leaving the subsidence due to stretching and cooling alone.
    let reference_age = rift_start_age.unwrap_or(rift_end_age);
    let mut dynamic_topography_reference = None;
    if let Some(model) = dynamic_topography {
        if let (Some(at_present_day), Some(at_rift_start)) = (
            model.sample_clamped(0.0),
            model.sample_clamped(reference_age),
        ) {
            present_day_tectonic_subsidence += at_present_day - at_rift_start;
            dynamic_topography_reference = Some((at_present_day, at_rift_start));
        }
    }

    let estimate = rifting::estimate_beta(
        present_day_tectonic_subsidence,
        present_day_crustal_thickness,
        rift_end_age,
    )?;
    let pre_rift_crustal_thickness = estimate.beta * present_day_crustal_thickness;

    for decompacted_well in decompacted_wells {
        let decompaction_time = decompacted_well.age;

        let mut subsidence = rifting::total_subsidence(
            estimate.beta,
            pre_rift_crustal_thickness,
            decompaction_time,
            rift_end_age,
            rift_start_age,
        );

        if let (Some(model), Some((at_present_day, at_rift_start))) =
            (dynamic_topography, dynamic_topography_reference)
        {
            if let Some(at_decompaction_time) = model.sample_clamped(decompaction_time) {
                subsidence -= at_decompaction_time - at_rift_start;
                decompacted_well.dynamic_topography =
                    Some(at_decompaction_time - at_present_day);
            }
        }

        decompacted_well.tectonic_subsidence = Some(subsidence);
    }
    Ok(())
}

/// Drop a dynamic-topography model that cannot provide a present-day value
/// at the site. Mantle-frame grids normally have global coverage, so this
/// only fires on malformed models.
fn resolve_dynamic_topography(model: Option<&DynamicTopography>) -> Option<&DynamicTopography> {
    let model = model?;
    if model.sample_clamped(0.0).is_none() {
        warn!("dynamic topography model does not cover the site at present day; ignoring it");
        return None;
    }
    Some(model)
}
