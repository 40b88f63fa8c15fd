//! Time-dependent dynamic topography.
//!
//! A dynamic-topography model is a set of mantle-frame elevation grids at
//! increasing ages together with a plate-reconstruction model. Sampling the
//! model at a past time reconstructs the site to the two grid ages bounding
//! that time, samples both grids at the reconstructed locations and
//! interpolates linearly in time.
//!
//! Values are elevations (m): an *increase* in dynamic topography is a
//! *decrease* in tectonic subsidence. The drivers use the elevation change
//! relative to a reference time (present day for oceanic crust, rift start
//! for continental crust).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::raster::GridSampler;
use paleobath_core::{FloatValue, Time};

use crate::reconstruction::{PlateAssignment, PlateReconstruction};

/// Tolerance when matching a sample time against a grid age (My).
const AGE_TOLERANCE: Time = 1e-6;

/// The files making up a dynamic-topography model: mantle-frame grids with
/// their ages, the static polygons assigning plate IDs, and the rotation
/// files of the reconstruction.
///
/// The descriptor only names the files. Loading the rasters and the
/// rotation model is the caller's concern, as with every other raster in
/// the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicTopographyDescriptor {
    /// Grid files and their ages (Ma), as listed in the manifest.
    pub grids: Vec<(String, Time)>,
    /// Static-polygons file.
    pub static_polygons: String,
    /// Rotation files.
    pub rotations: Vec<String>,
}

impl DynamicTopographyDescriptor {
    /// Parse the grid manifest: one `filename age` row per grid, `#`
    /// comments allowed. The same rules as [`TimeDependentGrid`] apply —
    /// at least two grids, no duplicate ages.
    pub fn parse_manifest(
        manifest: &str,
        manifest_name: &str,
        static_polygons: impl Into<String>,
        rotations: Vec<String>,
    ) -> PaleobathResult<Self> {
        let mut grids: Vec<(String, Time)> = Vec::new();

        for (line_index, line) in manifest.lines().enumerate() {
            let line_number = line_index + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() || fields[0].starts_with('#') {
                continue;
            }
            if fields.len() != 2 {
                return Err(PaleobathError::BadInputFormat {
                    source_name: manifest_name.to_string(),
                    line: line_number,
                    reason: "expected two columns: grid filename and age".to_string(),
                });
            }
            let age: Time = fields[1].parse().map_err(|_| PaleobathError::BadInputFormat {
                source_name: manifest_name.to_string(),
                line: line_number,
                reason: format!("cannot parse {:?} as an age", fields[1]),
            })?;
            if grids.iter().any(|(_, existing)| (existing - age).abs() <= AGE_TOLERANCE) {
                return Err(PaleobathError::BadInputFormat {
                    source_name: manifest_name.to_string(),
                    line: line_number,
                    reason: format!("two grids share the age {}", age),
                });
            }
            grids.push((fields[0].to_string(), age));
        }

        if grids.len() < 2 {
            return Err(PaleobathError::BadInputFormat {
                source_name: manifest_name.to_string(),
                line: 0,
                reason: "a dynamic-topography manifest needs at least two grids".to_string(),
            });
        }
        grids.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("grid ages must not be NaN"));

        Ok(Self {
            grids,
            static_polygons: static_polygons.into(),
            rotations,
        })
    }
}

/// A sequence of grids at increasing ages.
///
/// Needs at least two grids; ages must be unique. Grids are sorted by age on
/// construction.
pub struct TimeDependentGrid {
    grids: Vec<(Time, Box<dyn GridSampler>)>,
}

impl TimeDependentGrid {
    pub fn new(mut grids: Vec<(Time, Box<dyn GridSampler>)>) -> PaleobathResult<Self> {
        if grids.len() < 2 {
            return Err(PaleobathError::Error(
                "a time-dependent grid needs at least two grids".to_string(),
            ));
        }
        grids.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("grid ages must not be NaN"));
        for pair in grids.windows(2) {
            if (pair[0].0 - pair[1].0).abs() <= AGE_TOLERANCE {
                return Err(PaleobathError::Error(format!(
                    "two grids share the age {}",
                    pair[0].0
                )));
            }
        }
        Ok(Self { grids })
    }

    /// Age of the oldest grid (Ma).
    pub fn oldest_age(&self) -> Time {
        self.grids.last().expect("at least two grids").0
    }

    /// Age of the youngest grid (Ma).
    pub fn youngest_age(&self) -> Time {
        self.grids.first().expect("at least two grids").0
    }

    /// The pair of adjacent grids whose ages bracket `time`, or `None` when
    /// `time` lies outside the covered age span.
    fn bounding_pair(&self, time: Time) -> Option<(&(Time, Box<dyn GridSampler>), &(Time, Box<dyn GridSampler>))> {
        if time < self.youngest_age() - AGE_TOLERANCE {
            return None;
        }
        for pair in self.grids.windows(2) {
            if time < pair[1].0 + AGE_TOLERANCE {
                return Some((&pair[0], &pair[1]));
            }
        }
        None
    }

    /// Sample the grids at a fixed location, interpolating linearly in time.
    ///
    /// Returns `None` when `time` is outside the age span or either bounding
    /// grid has nodata at the location.
    pub fn sample(&self, longitude: FloatValue, latitude: FloatValue, time: Time) -> Option<FloatValue> {
        let ((age_0, grid_0), (age_1, grid_1)) = self.bounding_pair(time)?;

        if (time - age_0).abs() < AGE_TOLERANCE {
            return grid_0.sample(longitude, latitude);
        }
        if (time - age_1).abs() < AGE_TOLERANCE {
            return grid_1.sample(longitude, latitude);
        }

        let value_0 = grid_0.sample(longitude, latitude)?;
        let value_1 = grid_1.sample(longitude, latitude)?;

        // Ages are distinct by construction.
        Some(((age_1 - time) * value_0 + (time - age_0) * value_1) / (age_1 - age_0))
    }
}

/// A dynamic-topography model bound to a drill-site location.
///
/// Construction assigns the site a reconstruction plate via the static
/// polygons; each sample reconstructs the site to the bounding grid ages
/// before sampling the mantle-frame grids.
pub struct DynamicTopography {
    grids: TimeDependentGrid,
    reconstruction: Arc<dyn PlateReconstruction>,
    longitude: FloatValue,
    latitude: FloatValue,
    plate_id: u32,
    /// Oldest time the location can be reconstructed to (Ma).
    age: Time,
    clamp_warned: AtomicBool,
}

impl DynamicTopography {
    /// Bind a model to a site.
    ///
    /// `age` is the age of the crust at the site; when `None` (continental
    /// site outside the age grid) the appearance age of the containing
    /// static polygon is used instead.
    pub fn new(
        grids: TimeDependentGrid,
        reconstruction: Arc<dyn PlateReconstruction>,
        longitude: FloatValue,
        latitude: FloatValue,
        age: Option<Time>,
    ) -> Self {
        let assignment = reconstruction.assign_plate(longitude, latitude);
        let (plate_id, appearance_age) = match assignment {
            Some(PlateAssignment {
                plate_id,
                appearance_age,
            }) => (plate_id, appearance_age),
            None => (0, 0.0),
        };
        let age = age.unwrap_or(appearance_age);

        Self {
            grids,
            reconstruction,
            longitude,
            latitude,
            plate_id,
            age,
            clamp_warned: AtomicBool::new(false),
        }
    }

    /// The oldest time the site can be sampled at (Ma).
    pub fn age(&self) -> Time {
        self.age
    }

    /// Sample dynamic topography at `time` (Ma).
    ///
    /// Returns `None` when `time` is outside the grids' age span, when
    /// either bounding grid is older than the site's appearance age, or when
    /// a reconstructed location falls in a nodata region.
    pub fn sample(&self, time: Time) -> Option<FloatValue> {
        let ((age_0, _), (age_1, _)) = self.grids.bounding_pair(time)?;
        let (age_0, age_1) = (*age_0, *age_1);
        // The older bounding grid must not predate the location itself.
        if age_1 > self.age + AGE_TOLERANCE {
            return None;
        }

        if (time - age_0).abs() < AGE_TOLERANCE {
            return self.sample_grid_at(age_0);
        }
        if (time - age_1).abs() < AGE_TOLERANCE {
            return self.sample_grid_at(age_1);
        }

        let value_0 = self.sample_grid_at(age_0)?;
        let value_1 = self.sample_grid_at(age_1)?;
        Some(((age_1 - time) * value_0 + (time - age_0) * value_1) / (age_1 - age_0))
    }

    /// Sample the oldest grid not older than the site's appearance age.
    ///
    /// Fallback for times [`Self::sample`] cannot interpolate. Returns the
    /// sampled value and the age of the grid used.
    pub fn sample_oldest(&self) -> Option<(FloatValue, Time)> {
        for (grid_age, _) in self.grids.grids.iter().rev() {
            if *grid_age < self.age + AGE_TOLERANCE {
                if let Some(value) = self.sample_grid_at(*grid_age) {
                    return Some((value, *grid_age));
                }
            }
        }
        None
    }

    /// Sample at `time`, clamping to the covered age range.
    ///
    /// Times beyond the oldest usable grid (or younger than the youngest)
    /// fall back to the nearest usable grid with a once-per-model warning.
    /// Returns `None` only when no grid covers the location at all.
    pub fn sample_clamped(&self, time: Time) -> Option<FloatValue> {
        if let Some(value) = self.sample(time) {
            return Some(value);
        }

        let fallback = if time < self.grids.youngest_age() {
            self.sample_grid_at(self.grids.youngest_age())
        } else {
            self.sample_oldest().map(|(value, _)| value)
        };

        if fallback.is_some() && !self.clamp_warned.swap(true, Ordering::Relaxed) {
            warn!(
                time,
                longitude = self.longitude,
                latitude = self.latitude,
                "dynamic topography model does not cover the requested time; \
                 using the nearest grid"
            );
        }
        fallback
    }

    /// Reconstruct the site to `grid_age` and sample the grid of that age.
    fn sample_grid_at(&self, grid_age: Time) -> Option<FloatValue> {
        let (longitude, latitude) =
            self.reconstruction
                .reconstruct(self.longitude, self.latitude, self.plate_id, grid_age);
        self.grids
            .grids
            .iter()
            .find(|(age, _)| (age - grid_age).abs() <= AGE_TOLERANCE)
            .and_then(|(_, grid)| grid.sample(longitude, latitude))
    }
}
