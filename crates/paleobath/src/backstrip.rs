//! Backstripping: solving for tectonic subsidence.
//!
//! Backstripping starts from paleo water depths recorded with the
//! stratigraphy (as min/max brackets per unit) and inverts the isostatic
//! balance used by backtracking:
//!
//! ```text
//! S(t) = W(t) + (rho_m - rho_avg) / (rho_m - rho_w) * T(t)
//!        - sea_level(t) * rho_m / (rho_m - rho_w)
//! ```
//!
//! No tectonic subsidence model enters: oceanic age-to-depth and rifting
//! are irrelevant here, and dynamic topography does not apply (it is not a
//! subsidence model in this direction). The result is a min/max/average
//! subsidence history that a subsidence model could later be fitted to.

use tracing::warn;

use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::lithology::{LithologyRegistry, DEFAULT_BASE_LITHOLOGY_NAME};
use paleobath_core::raster::GridSampler;
use paleobath_core::sea_level::SeaLevel;
use paleobath_core::stratigraphy::{DecompactedWell, StratigraphicUnit, Well};
use paleobath_core::FloatValue;

/// Fractional excess of drill-site depth over the total-sediment-thickness
/// raster that triggers a warning.
const SEDIMENT_THICKNESS_EXCESS_WARN_RATIO: FloatValue = 0.01;

/// Backstrip a drill site whose units carry recorded min/max water depths.
///
/// When a total-sediment-thickness grid is supplied and shows more sediment
/// than the drill site recorded, a base unit of `base_lithology_name` fills
/// the gap; its age span is collapsed to the deepest recorded bottom age
/// and it inherits that unit's recorded water depths.
///
/// Returns the (possibly amended) well and one decompacted column per
/// stratigraphic age. Min/max/average tectonic subsidence are derived on
/// demand from the recorded water depths via
/// [`DecompactedWell::min_max_tectonic_subsidence`].
pub fn backstrip_well(
    mut well: Well,
    registry: &LithologyRegistry,
    total_sediment_thickness_grid: Option<&dyn GridSampler>,
    sea_level: Option<&SeaLevel>,
    base_lithology_name: Option<&str>,
) -> PaleobathResult<(Well, Vec<DecompactedWell>)> {
    if well.units().is_empty() {
        return Ok((well, Vec::new()));
    }

    for unit in well.units() {
        if unit.min_water_depth.is_none() || unit.max_water_depth.is_none() {
            return Err(PaleobathError::Error(format!(
                "backstripping requires recorded min/max water depths on every unit \
                 (missing on the unit with bottom age {})",
                unit.bottom_age
            )));
        }
    }

    if let Some(grid) = total_sediment_thickness_grid {
        let (longitude, latitude) = match (well.longitude, well.latitude) {
            (Some(longitude), Some(latitude)) => Ok((longitude, latitude)),
            _ => Err(PaleobathError::Error(
                "drill-site location was not in the file and was not supplied".to_string(),
            )),
        }?;
        // Nodata here only means no base unit can be synthesized; the site
        // is probably near the coast where the well records everything.
        let total_sediment_thickness = grid.sample(longitude, latitude).unwrap_or(0.0);
        add_base_unit(
            &mut well,
            total_sediment_thickness,
            registry,
            base_lithology_name.unwrap_or(DEFAULT_BASE_LITHOLOGY_NAME),
        )?;
    }

    let mut decompacted_wells = well.decompact_all();

    if let Some(sea_level) = sea_level {
        for decompacted_well in &mut decompacted_wells {
            decompacted_well.sea_level = Some(sea_level.average_level(
                decompacted_well.surface_unit.bottom_age,
                decompacted_well.surface_unit.top_age,
            ));
        }
    }

    Ok((well, decompacted_wells))
}

/// Append a base unit filling the gap to the total sediment thickness.
///
/// Unlike backtracking there is no basement age to assign, so the base
/// unit's bottom age equals its top age and its water depths are copied
/// from the deepest recorded unit.
fn add_base_unit(
    well: &mut Well,
    total_sediment_thickness: FloatValue,
    registry: &LithologyRegistry,
    base_lithology_name: &str,
) -> PaleobathResult<()> {
    let deepest = well.deepest_unit().expect("well has units").clone();
    let well_thickness = deepest.bottom_depth;

    if well_thickness < total_sediment_thickness {
        let lithology = registry
            .combine(&[(base_lithology_name.to_string(), 1.0)])
            .map_err(|_| PaleobathError::UnknownLithology(base_lithology_name.to_string()))?;

        well.add_unit(
            StratigraphicUnit::new(
                deepest.bottom_age,
                deepest.bottom_age,
                well_thickness,
                total_sediment_thickness,
                lithology,
            )
            .with_components(vec![(base_lithology_name.to_string(), 1.0)])
            .with_water_depths(
                deepest.min_water_depth.expect("validated above"),
                deepest.max_water_depth.expect("validated above"),
            ),
        )?;
    } else if well_thickness - total_sediment_thickness
        > SEDIMENT_THICKNESS_EXCESS_WARN_RATIO * well_thickness
    {
        warn!(
            well_thickness,
            total_sediment_thickness,
            "drill site is deeper than the total sediment thickness grid; \
             ignoring the grid"
        );
    }
    Ok(())
}
