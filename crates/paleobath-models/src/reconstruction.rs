//! Plate-reconstruction interface.
//!
//! Dynamic-topography grids live in the mantle reference frame while drill
//! sites drift with the plates, so sampling a grid at a past time first
//! carries the site location back through time. The engine does not
//! implement plate reconstruction itself; it consumes the three operations
//! below through a trait, and an adapter over a reconstruction library (or a
//! test stub) provides them. Implementations load their rotation files at
//! construction time and own them for their lifetime.

use paleobath_core::{FloatValue, Time};

/// Identifier of a reconstruction plate.
pub type PlateId = u32;

/// The plate assignment of a present-day location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateAssignment {
    /// Plate the location belongs to, from a static-polygon partition.
    pub plate_id: PlateId,
    /// Age of appearance of the containing polygon (Ma); the location
    /// cannot be reconstructed to older times.
    pub appearance_age: Time,
}

/// A plate-reconstruction model.
///
/// Implementations must be shareable across worker threads (`Sync`).
pub trait PlateReconstruction: Sync {
    /// Assign a plate to a present-day longitude/latitude (degrees) by
    /// point-in-polygon test against the static polygons.
    ///
    /// Returns `None` when the location is inside no polygon; callers fall
    /// back to plate 0 with a present-day appearance age.
    fn assign_plate(&self, longitude: FloatValue, latitude: FloatValue) -> Option<PlateAssignment>;

    /// Reconstruct a present-day longitude/latitude (degrees) to `time` (Ma)
    /// using the rotation of `plate_id`.
    fn reconstruct(
        &self,
        longitude: FloatValue,
        latitude: FloatValue,
        plate_id: PlateId,
        time: Time,
    ) -> (FloatValue, FloatValue);
}

/// A reconstruction that keeps every location fixed.
///
/// Stands in when no rotation model is available, and anchors tests: with it,
/// mantle-frame grids are sampled at the present-day location at all times.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticReconstruction {
    /// Appearance age reported for every location (Ma).
    pub appearance_age: Time,
}

impl StaticReconstruction {
    pub fn with_appearance_age(appearance_age: Time) -> Self {
        Self { appearance_age }
    }
}

impl PlateReconstruction for StaticReconstruction {
    fn assign_plate(&self, _longitude: FloatValue, _latitude: FloatValue) -> Option<PlateAssignment> {
        Some(PlateAssignment {
            plate_id: 0,
            appearance_age: self.appearance_age,
        })
    }

    fn reconstruct(
        &self,
        longitude: FloatValue,
        latitude: FloatValue,
        _plate_id: PlateId,
        _time: Time,
    ) -> (FloatValue, FloatValue) {
        (longitude, latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_reconstruction_is_identity() {
        let model = StaticReconstruction::with_appearance_age(200.0);
        let assignment = model.assign_plate(143.5, -31.2).unwrap();
        assert_eq!(assignment.plate_id, 0);
        assert_eq!(assignment.appearance_age, 200.0);
        assert_eq!(model.reconstruct(143.5, -31.2, 0, 50.0), (143.5, -31.2));
    }
}
