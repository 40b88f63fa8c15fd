use serde::{Deserialize, Serialize};

use super::unit::StratigraphicUnit;
use crate::{FloatValue, Time, DENSITY_MANTLE, DENSITY_WATER};

/// A stratigraphic unit decompacted at a specific age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompactedUnit {
    /// The stratigraphic unit this entry was decompacted from.
    pub unit: StratigraphicUnit,
    /// Decompacted thickness (m).
    pub decompacted_thickness: FloatValue,
    /// Average decompacted density (kg/m3).
    pub decompacted_density: FloatValue,
}

/// The state of the whole column decompacted at a specific age.
///
/// Built unit by unit from the surface down by [`super::Well::decompact_all`]
/// or [`super::Well::decompact_at`]. The drivers then attach the quantities
/// they solve for: backtracking sets `tectonic_subsidence` (and optionally
/// `dynamic_topography`); backstripping relies on the recorded min/max water
/// depths of the surface unit; either may set `sea_level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompactedWell {
    /// Age of the surface of the decompacted column (Ma).
    pub age: Time,
    /// The unit at the surface at this age (trimmed if the age falls inside
    /// it).
    pub surface_unit: StratigraphicUnit,
    /// Decompacted units, surface down.
    pub units: Vec<DecompactedUnit>,
    /// Sum of present-day thicknesses of the surviving units (m).
    pub total_compacted_thickness: FloatValue,
    /// Sum of decompacted thicknesses (m).
    pub total_decompacted_thickness: FloatValue,
    /// Tectonic subsidence from a subsidence model (m). Backtracking only.
    pub tectonic_subsidence: Option<FloatValue>,
    /// Mean eustatic sea level over the surface unit's deposition interval,
    /// relative to present day (m). Set when a sea-level model is supplied.
    pub sea_level: Option<FloatValue>,
    /// Dynamic topography elevation relative to the driver's reference time
    /// (m). Backtracking with a dynamic-topography model only.
    pub dynamic_topography: Option<FloatValue>,

    thickness_times_density: FloatValue,
}

impl DecompactedWell {
    pub fn new(age: Time, surface_unit: StratigraphicUnit) -> Self {
        Self {
            age,
            surface_unit,
            units: Vec::new(),
            total_compacted_thickness: 0.0,
            total_decompacted_thickness: 0.0,
            tectonic_subsidence: None,
            sea_level: None,
            dynamic_topography: None,
            thickness_times_density: 0.0,
        }
    }

    /// An empty decompacted column at the basement age of `deepest_unit`.
    ///
    /// Represents the moment just before any surviving sediment was
    /// deposited: zero thickness, so water depth equals tectonic subsidence.
    pub fn at_basement(deepest_unit: &StratigraphicUnit) -> Self {
        let mut surface = deepest_unit.clone();
        surface.top_age = deepest_unit.bottom_age;
        surface.top_depth = deepest_unit.bottom_depth;
        surface.decompacted_top_depth = deepest_unit.decompacted_bottom_depth;
        Self::new(surface.top_age, surface)
    }

    /// Append the next deeper decompacted unit.
    pub fn add_decompacted_unit(
        &mut self,
        unit: StratigraphicUnit,
        decompacted_thickness: FloatValue,
        decompacted_density: FloatValue,
    ) {
        self.total_compacted_thickness += unit.compacted_thickness();
        self.total_decompacted_thickness += decompacted_thickness;
        self.thickness_times_density += decompacted_thickness * decompacted_density;
        self.units.push(DecompactedUnit {
            unit,
            decompacted_thickness,
            decompacted_density,
        });
    }

    /// Thickness-weighted average density of the decompacted column (kg/m3).
    pub fn average_decompacted_density(&self) -> FloatValue {
        if self.total_decompacted_thickness == 0.0 {
            return 0.0;
        }
        self.thickness_times_density / self.total_decompacted_thickness
    }

    /// Isostatic correction of the decompacted sediment load (m).
    ///
    /// Adding the correction to a known (loaded) water depth gives the
    /// deeper, sediment-free, isostatically compensated water depth
    /// (tectonic subsidence); subtracting it from a known tectonic
    /// subsidence gives the depth of the sediment/water interface.
    pub fn sediment_isostatic_correction(&self) -> FloatValue {
        self.total_decompacted_thickness * (DENSITY_MANTLE - self.average_decompacted_density())
            / (DENSITY_MANTLE - DENSITY_WATER)
    }

    /// Water depth implied by a tectonic subsidence (m). Inverse of
    /// [`Self::min_max_tectonic_subsidence_from_water_depth`].
    pub fn water_depth_from_tectonic_subsidence(
        &self,
        tectonic_subsidence: FloatValue,
        sea_level: Option<FloatValue>,
    ) -> FloatValue {
        tectonic_subsidence - self.isostatic_correction_with_sea_level(sea_level)
    }

    /// Minimum and maximum tectonic subsidence implied by recorded minimum
    /// and maximum water depths (m).
    pub fn min_max_tectonic_subsidence_from_water_depth(
        &self,
        min_water_depth: FloatValue,
        max_water_depth: FloatValue,
        sea_level: Option<FloatValue>,
    ) -> (FloatValue, FloatValue) {
        let correction = self.isostatic_correction_with_sea_level(sea_level);
        (min_water_depth + correction, max_water_depth + correction)
    }

    /// Tectonic subsidence: directly from the subsidence model when
    /// backtracking, or the midpoint of the min/max subsidence derived from
    /// recorded water depths when backstripping.
    ///
    /// `None` when neither a model value nor recorded water depths exist.
    pub fn tectonic_subsidence(&self) -> Option<FloatValue> {
        self.min_max_tectonic_subsidence()
            .map(|(min, max)| 0.5 * (min + max))
    }

    /// Minimum and maximum tectonic subsidence. Both equal the model value
    /// when backtracking.
    pub fn min_max_tectonic_subsidence(&self) -> Option<(FloatValue, FloatValue)> {
        if let Some(subsidence) = self.tectonic_subsidence {
            return Some((subsidence, subsidence));
        }
        match (
            self.surface_unit.min_water_depth,
            self.surface_unit.max_water_depth,
        ) {
            (Some(min), Some(max)) => {
                Some(self.min_max_tectonic_subsidence_from_water_depth(min, max, self.sea_level))
            }
            _ => None,
        }
    }

    /// Water depth: derived from the subsidence model when backtracking, or
    /// the midpoint of the recorded water depths when backstripping.
    pub fn water_depth(&self) -> Option<FloatValue> {
        self.min_max_water_depth().map(|(min, max)| 0.5 * (min + max))
    }

    /// Minimum and maximum water depth. Both equal the derived value when
    /// backtracking.
    pub fn min_max_water_depth(&self) -> Option<(FloatValue, FloatValue)> {
        if let Some(subsidence) = self.tectonic_subsidence {
            let depth = self.water_depth_from_tectonic_subsidence(subsidence, self.sea_level);
            return Some((depth, depth));
        }
        match (
            self.surface_unit.min_water_depth,
            self.surface_unit.max_water_depth,
        ) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    fn isostatic_correction_with_sea_level(&self, sea_level: Option<FloatValue>) -> FloatValue {
        let mut correction = self.sediment_isostatic_correction();
        if let Some(sea_level) = sea_level {
            correction -= sea_level * DENSITY_MANTLE / (DENSITY_MANTLE - DENSITY_WATER);
        }
        correction
    }
}
