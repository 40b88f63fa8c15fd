//! Stratigraphic columns and sediment decompaction.
//!
//! A [`Well`] is an ordered stack of [`StratigraphicUnit`]s recorded at a
//! drill site, youngest at the surface. Decompacting the column at a past
//! age strips the units deposited after that age and lets the remaining
//! units expand as the overburden is removed.
//!
//! # Porosity model
//!
//! Porosity decays exponentially with burial depth,
//!
//! ```text
//! porosity(z) = surface_porosity * exp(-z / porosity_decay)
//! ```
//!
//! and the volume of sediment grains per unit area in a unit never changes.
//! Between depths `z_top` and `z_bot` the grain volume is
//!
//! ```text
//! G = (z_bot - z_top)
//!     - surface_porosity * decay * (exp(-z_top / decay) - exp(-z_bot / decay))
//! ```
//!
//! Moving a unit to a new top depth, its new bottom depth is the solution of
//! `G(new) = G(present day)` — a monotone 1-D equation solved by fixed-point
//! iteration in [`StratigraphicUnit::decompacted_thickness`].
//!
//! Decompaction of the whole column proceeds from the surface down: the
//! topmost surviving unit is placed with its top at zero depth and each
//! deeper unit's top rests on the solved bottom of the unit above.

mod decompacted;
mod unit;

pub use decompacted::{DecompactedUnit, DecompactedWell};
pub use unit::StratigraphicUnit;

use serde::{Deserialize, Serialize};

use crate::errors::{PaleobathError, PaleobathResult};
use crate::{FloatValue, Time};

/// Tolerance when matching adjacent unit ages and depths.
const CONTIGUITY_TOLERANCE: FloatValue = 1e-6;

/// A drill site and its stratigraphic units, sorted youngest to oldest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Well {
    /// Site longitude in degrees, if known.
    pub longitude: Option<FloatValue>,
    /// Site latitude in degrees, if known.
    pub latitude: Option<FloatValue>,
    /// Age of the top of the youngest unit (Ma). Defaults to 0 (present
    /// day); sedimentation may have ended earlier.
    pub surface_age: Option<Time>,
    /// Time rifting started (Ma), for sites on continental crust.
    pub rift_start_age: Option<Time>,
    /// Time rifting ended (Ma), for sites on continental crust.
    pub rift_end_age: Option<Time>,
    /// Recorded present-day water depth (m), overriding the bathymetry
    /// raster when present.
    pub water_depth: Option<FloatValue>,

    units: Vec<StratigraphicUnit>,
}

impl Well {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stratigraphic units, youngest (surface) first.
    pub fn units(&self) -> &[StratigraphicUnit] {
        &self.units
    }

    /// The deepest (oldest) unit, if any.
    pub fn deepest_unit(&self) -> Option<&StratigraphicUnit> {
        self.units.last()
    }

    /// Total recorded (compacted) sediment thickness of the column (m).
    pub fn sediment_thickness(&self) -> FloatValue {
        self.units.last().map_or(0.0, |unit| unit.bottom_depth)
    }

    /// Append the next deeper stratigraphic unit.
    ///
    /// Units must be added youngest to oldest. The first unit must start at
    /// zero depth; each later unit must continue exactly where the previous
    /// one ended, in both age and depth (no gaps). The fully decompacted
    /// depths of the unit are filled in as it is added.
    pub fn add_unit(&mut self, mut unit: StratigraphicUnit) -> PaleobathResult<()> {
        match self.units.last() {
            None => {
                if unit.top_depth != 0.0 {
                    return Err(PaleobathError::Error(
                        "top stratigraphic unit in well must have zero top depth".to_string(),
                    ));
                }
                unit.decompacted_top_depth = 0.0;
            }
            Some(previous) => {
                if (previous.bottom_age - unit.top_age).abs() > CONTIGUITY_TOLERANCE {
                    return Err(PaleobathError::Error(format!(
                        "adjacent stratigraphic units must have matching ages \
                         (bottom {} vs top {})",
                        previous.bottom_age, unit.top_age
                    )));
                }
                if (previous.bottom_depth - unit.top_depth).abs() > CONTIGUITY_TOLERANCE {
                    return Err(PaleobathError::Error(format!(
                        "adjacent stratigraphic units must have matching depths \
                         (bottom {} vs top {})",
                        previous.bottom_depth, unit.top_depth
                    )));
                }
                unit.decompacted_top_depth = previous.decompacted_bottom_depth;
            }
        }
        unit.decompacted_bottom_depth =
            unit.decompacted_top_depth + unit.fully_decompacted_thickness();
        self.units.push(unit);
        Ok(())
    }

    /// Decompact the column at the top age of every unit, youngest first.
    ///
    /// The first entry is the present-day (or surface-age) column; it is
    /// effectively unchanged by decompaction, so its decompacted thickness
    /// equals its compacted thickness.
    pub fn decompact_all(&self) -> Vec<DecompactedWell> {
        (0..self.units.len())
            .map(|surface| self.decompact_units(&self.units[surface..], None))
            .collect()
    }

    /// Decompact the column at an arbitrary `age`.
    ///
    /// Units younger than `age` are stripped; if `age` falls inside a unit
    /// the unit is trimmed to a partial unit whose top age is `age` (grain
    /// volume of the remaining part preserved, assuming a constant
    /// deposition rate). Returns `None` when `age` is not younger than the
    /// bottom age of the column.
    pub fn decompact_at(&self, age: Time) -> Option<DecompactedWell> {
        for (index, unit) in self.units.iter().enumerate() {
            if age < unit.bottom_age {
                let partial = if age > unit.top_age {
                    Some(unit.partial_unit(age))
                } else {
                    None
                };
                return Some(self.decompact_units(&self.units[index..], partial));
            }
        }
        None
    }

    /// Decompact `units` (a surface unit at some age and everything below
    /// it), top down. `replace_surface` substitutes a trimmed surface unit.
    fn decompact_units(
        &self,
        units: &[StratigraphicUnit],
        replace_surface: Option<StratigraphicUnit>,
    ) -> DecompactedWell {
        let surface_unit = replace_surface.as_ref().unwrap_or(&units[0]);
        let mut decompacted = DecompactedWell::new(surface_unit.top_age, surface_unit.clone());

        let mut depth_to_top = 0.0;
        for (index, unit) in units.iter().enumerate() {
            let unit = if index == 0 { surface_unit } else { unit };
            let thickness = unit.decompacted_thickness(depth_to_top);
            let density = unit.decompacted_density(thickness, depth_to_top);
            decompacted.add_decompacted_unit(unit.clone(), thickness, density);
            depth_to_top += thickness;
        }

        decompacted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lithology::Lithology;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn shale() -> Lithology {
        Lithology::new(2700.0, 0.63, 1960.0)
    }

    fn mud() -> Lithology {
        Lithology::new(2438.0, 0.36, 2015.0)
    }

    fn two_layer_well() -> Well {
        let mut well = Well::new();
        well.add_unit(StratigraphicUnit::new(0.0, 10.0, 0.0, 100.0, mud()))
            .unwrap();
        well.add_unit(StratigraphicUnit::new(10.0, 30.0, 100.0, 200.0, mud()))
            .unwrap();
        well
    }

    #[test]
    fn first_unit_must_start_at_surface() {
        let mut well = Well::new();
        let err = well
            .add_unit(StratigraphicUnit::new(0.0, 10.0, 50.0, 100.0, shale()))
            .unwrap_err();
        assert!(matches!(err, PaleobathError::Error(_)));
    }

    #[test]
    fn units_must_be_contiguous() {
        let mut well = Well::new();
        well.add_unit(StratigraphicUnit::new(0.0, 10.0, 0.0, 100.0, shale()))
            .unwrap();
        // Depth gap.
        assert!(well
            .add_unit(StratigraphicUnit::new(10.0, 30.0, 150.0, 200.0, shale()))
            .is_err());
        // Age gap.
        assert!(well
            .add_unit(StratigraphicUnit::new(12.0, 30.0, 100.0, 200.0, shale()))
            .is_err());
    }

    #[test]
    fn present_day_column_is_unchanged_by_decompaction() {
        let well = two_layer_well();
        let decompacted = well.decompact_all();
        assert_eq!(decompacted.len(), 2);

        // At the surface age the column is already compacted to its present
        // day state.
        let present = &decompacted[0];
        assert_relative_eq!(present.total_compacted_thickness, 200.0);
        assert_abs_diff_eq!(present.total_decompacted_thickness, 200.0, epsilon = 1e-3);
    }

    #[test]
    fn decompacted_column_is_thicker() {
        let well = two_layer_well();
        let decompacted = well.decompact_all();

        // With the surface unit stripped, the deeper unit rises to the
        // surface and expands.
        let older = &decompacted[1];
        assert_relative_eq!(older.age, 10.0);
        assert_relative_eq!(older.total_compacted_thickness, 100.0);
        assert!(older.total_decompacted_thickness > 100.0);
    }

    #[test]
    fn fully_decompacted_depths_accumulate() {
        let well = two_layer_well();
        let units = well.units();
        assert_relative_eq!(units[0].decompacted_top_depth, 0.0);
        assert_relative_eq!(
            units[0].decompacted_bottom_depth,
            units[1].decompacted_top_depth
        );
        assert!(units[1].decompacted_bottom_depth > units[1].decompacted_top_depth);
    }

    #[test]
    fn decompact_at_mid_unit_age_trims_surface_unit() {
        let well = two_layer_well();
        // Halfway through deposition of the surface unit.
        let decompacted = well.decompact_at(5.0).unwrap();
        assert_relative_eq!(decompacted.age, 5.0);
        // Part of the surface unit is stripped, so less than the full
        // column thickness remains compacted.
        assert!(decompacted.total_compacted_thickness < 200.0);
        assert!(decompacted.total_compacted_thickness > 100.0);
    }

    #[test]
    fn decompact_at_basement_age_returns_none() {
        let well = two_layer_well();
        assert!(well.decompact_at(30.0).is_none());
        assert!(well.decompact_at(45.0).is_none());
    }

    #[test]
    fn decompact_at_unit_top_matches_decompact_all() {
        let well = two_layer_well();
        let all = well.decompact_all();
        let at = well.decompact_at(10.0).unwrap();
        assert_abs_diff_eq!(
            at.total_decompacted_thickness,
            all[1].total_decompacted_thickness,
            epsilon = 1e-9
        );
    }
}
