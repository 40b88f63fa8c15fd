use serde::{Deserialize, Serialize};

use crate::lithology::Lithology;
use crate::{FloatValue, Time, DENSITY_WATER};

/// Convergence tolerance of the fixed-point thickness solves (m).
const THICKNESS_TOLERANCE: FloatValue = 1e-6;

/// Iteration cap for the fixed-point solves. Convergence normally takes
/// around 20 iterations.
const MAX_ITERATIONS: usize = 1000;

/// A stratigraphic unit: a depth interval of the drill site deposited over
/// an age interval, with an (effective) lithology.
///
/// Depths are metres below the present-day sediment surface, i.e. compacted
/// geometry. `decompacted_top_depth` / `decompacted_bottom_depth` describe
/// the fully decompacted column (surface porosity throughout, as if no part
/// of any unit had ever been buried); they are filled in when the unit is
/// added to a [`super::Well`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratigraphicUnit {
    /// Age of the top of the unit (Ma).
    pub top_age: Time,
    /// Age of the bottom of the unit (Ma).
    pub bottom_age: Time,
    /// Present-day depth of the top of the unit (m).
    pub top_depth: FloatValue,
    /// Present-day depth of the bottom of the unit (m).
    pub bottom_depth: FloatValue,
    /// Effective (mixture-averaged) lithology.
    pub lithology: Lithology,
    /// The weighted lithology names this unit was built from. Retained for
    /// output; empty for units built directly from a [`Lithology`].
    pub lithology_components: Vec<(String, FloatValue)>,
    /// Recorded minimum paleo water depth (m), for backstripping.
    pub min_water_depth: Option<FloatValue>,
    /// Recorded maximum paleo water depth (m), for backstripping.
    pub max_water_depth: Option<FloatValue>,
    /// Fully decompacted depth of the top of the unit (m).
    pub decompacted_top_depth: FloatValue,
    /// Fully decompacted depth of the bottom of the unit (m).
    pub decompacted_bottom_depth: FloatValue,
}

impl StratigraphicUnit {
    pub fn new(
        top_age: Time,
        bottom_age: Time,
        top_depth: FloatValue,
        bottom_depth: FloatValue,
        lithology: Lithology,
    ) -> Self {
        debug_assert!(bottom_age >= top_age);
        debug_assert!(bottom_depth >= top_depth);
        Self {
            top_age,
            bottom_age,
            top_depth,
            bottom_depth,
            lithology,
            lithology_components: Vec::new(),
            min_water_depth: None,
            max_water_depth: None,
            decompacted_top_depth: 0.0,
            decompacted_bottom_depth: 0.0,
        }
    }

    /// Attach the weighted lithology names the unit was mixed from.
    pub fn with_components(mut self, components: Vec<(String, FloatValue)>) -> Self {
        self.lithology_components = components;
        self
    }

    /// Attach recorded min/max paleo water depths (backstripping input).
    pub fn with_water_depths(mut self, min: FloatValue, max: FloatValue) -> Self {
        self.min_water_depth = Some(min);
        self.max_water_depth = Some(max);
        self
    }

    /// Present-day (compacted) thickness of the unit (m).
    pub fn compacted_thickness(&self) -> FloatValue {
        self.bottom_depth - self.top_depth
    }

    /// Decompacted thickness of this unit when its top sits at decompacted
    /// depth `depth_to_top`.
    ///
    /// Solves grain-volume invariance for the new thickness `T`:
    ///
    /// ```text
    /// T + decay * porosity(0) * exp(-D/decay) * (exp(-T/decay) - 1)
    ///     = t + decay * porosity(0) * exp(-d/decay) * (exp(-t/decay) - 1)
    /// ```
    ///
    /// with `D = depth_to_top`, and `d`, `t` the present-day top depth and
    /// thickness. Rearranged as `T = a * exp(-T/decay) + b` this converges
    /// under fixed-point iteration starting from `t`.
    pub fn decompacted_thickness(&self, depth_to_top: FloatValue) -> FloatValue {
        let thickness = self.compacted_thickness();
        if thickness == 0.0 {
            return 0.0;
        }

        let porosity = self.lithology.surface_porosity;
        let decay = self.lithology.porosity_decay;

        let a = -decay * porosity * (-depth_to_top / decay).exp();
        let b = -a
            + thickness
            + decay
                * porosity
                * (-self.top_depth / decay).exp()
                * ((-thickness / decay).exp() - 1.0);

        let mut decompacted = thickness;
        for _ in 0..MAX_ITERATIONS {
            let next = a * (-decompacted / decay).exp() + b;
            if (next - decompacted).abs() < THICKNESS_TOLERANCE {
                return next;
            }
            decompacted = next;
        }
        decompacted
    }

    /// Average density of this unit decompacted to thickness
    /// `decompacted_thickness` with its top at `depth_to_top` (kg/m3).
    ///
    /// Sediment density at depth `z` is
    /// `density_water * porosity(z) + grain_density * (1 - porosity(z))`;
    /// integrating the exponential porosity over the unit gives
    ///
    /// ```text
    /// average = grain_density
    ///     + (density_water - grain_density) * decay * porosity(0)
    ///       * exp(-D/decay) * (1 - exp(-T/decay)) / T
    /// ```
    pub fn decompacted_density(
        &self,
        decompacted_thickness: FloatValue,
        depth_to_top: FloatValue,
    ) -> FloatValue {
        if decompacted_thickness == 0.0 {
            return 0.0;
        }

        let density = self.lithology.density;
        let porosity = self.lithology.surface_porosity;
        let decay = self.lithology.porosity_decay;

        density
            + (DENSITY_WATER - density)
                * decay
                * porosity
                * (-depth_to_top / decay).exp()
                * (1.0 - (-decompacted_thickness / decay).exp())
                / decompacted_thickness
    }

    /// Thickness of this unit fully decompacted to the surface, ignoring
    /// porosity decay within the unit itself (m).
    ///
    /// With `porosity(0)` throughout, grain-volume invariance reduces to the
    /// closed form
    ///
    /// ```text
    /// T = [t + decay * porosity(0) * exp(-d/decay) * (exp(-t/decay) - 1)]
    ///     / (1 - porosity(0))
    /// ```
    pub fn fully_decompacted_thickness(&self) -> FloatValue {
        let thickness = self.compacted_thickness();
        if thickness == 0.0 {
            return 0.0;
        }

        let porosity = self.lithology.surface_porosity;
        let decay = self.lithology.porosity_decay;

        (thickness
            + decay
                * porosity
                * (-self.top_depth / decay).exp()
                * ((-thickness / decay).exp() - 1.0))
            / (1.0 - porosity)
    }

    /// Fully decompacted deposition rate of this unit (m/Ma).
    pub fn decompacted_sediment_rate(&self) -> FloatValue {
        let thickness = self.fully_decompacted_thickness();
        let interval = self.bottom_age - self.top_age;
        if thickness == 0.0 || interval == 0.0 {
            return 0.0;
        }
        thickness / interval
    }

    /// A copy of this unit with the sediment deposited after `top_age`
    /// stripped off, assuming a constant deposition rate.
    ///
    /// `top_age` must lie between the unit's top and bottom ages. The new
    /// unit's top depth is the compacted depth corresponding to `top_age`,
    /// so decompacting it preserves the grain volume of the remaining part.
    pub fn partial_unit(&self, top_age: Time) -> Self {
        let mut partial = self.clone();
        partial.top_age = top_age;
        partial.top_depth = self.compacted_depth_at(top_age);
        // The partial unit is thinner, so its fully decompacted top moves
        // down while its bottom stays put.
        partial.decompacted_top_depth =
            partial.decompacted_bottom_depth - partial.fully_decompacted_thickness();
        partial
    }

    /// The depth within the compacted unit corresponding to `age`, assuming
    /// a constant deposition rate over the unit's age interval.
    ///
    /// The grain volume deposited from `age` to the bottom age is the
    /// deposition-ratio share of the whole unit's grain volume; solving the
    /// porosity integral for the matching compacted thickness `ta` above the
    /// unit's bottom gives `ta = a * exp(ta/decay) + b`, iterated to a fixed
    /// point from `ratio * t`.
    fn compacted_depth_at(&self, age: Time) -> FloatValue {
        debug_assert!(age >= self.top_age && age <= self.bottom_age);

        let thickness = self.compacted_thickness();
        if thickness == 0.0 {
            return self.bottom_depth;
        }

        let deposition_ratio = (self.bottom_age - age) / (self.bottom_age - self.top_age);

        let porosity = self.lithology.surface_porosity;
        let decay = self.lithology.porosity_decay;

        let a = decay * porosity * (-self.bottom_depth / decay).exp();
        let b = -a
            + deposition_ratio
                * (thickness
                    + decay
                        * porosity
                        * (-self.bottom_depth / decay).exp()
                        * (1.0 - (thickness / decay).exp()));

        let mut thickness_at_age = deposition_ratio * thickness;
        for _ in 0..MAX_ITERATIONS {
            let next = a * (thickness_at_age / decay).exp() + b;
            if (next - thickness_at_age).abs() < THICKNESS_TOLERANCE {
                thickness_at_age = next;
                break;
            }
            thickness_at_age = next;
        }

        self.bottom_depth - thickness_at_age
    }

    /// Grain volume per unit area between the unit's present-day top and
    /// bottom depths (m). Invariant under decompaction.
    pub fn grain_volume(&self) -> FloatValue {
        let porosity = self.lithology.surface_porosity;
        let decay = self.lithology.porosity_decay;
        self.compacted_thickness()
            - porosity
                * decay
                * ((-self.top_depth / decay).exp() - (-self.bottom_depth / decay).exp())
    }
}
