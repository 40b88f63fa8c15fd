//! Sampling of regular lat/lon grids.
//!
//! Rasters (bathymetry, ocean age, total sediment thickness, crustal
//! thickness, mantle-frame dynamic topography) enter the engine through the
//! [`GridSampler`] trait: a `sample(lon, lat)` capability returning `None`
//! for nodata. File-format concerns stay with the caller — a NetCDF reader,
//! a shell-out to an external tool, or the in-memory [`LatLonGrid`] below
//! all satisfy the same trait.

use ndarray::Array2;

use crate::errors::{PaleobathError, PaleobathResult};
use crate::FloatValue;

/// Point-sampling capability over a geographic grid.
///
/// Implementations must be usable from multiple worker threads at once:
/// sampling takes `&self` and implementors are expected to be `Sync`.
pub trait GridSampler: Sync {
    /// Sample the grid at a longitude/latitude (in degrees).
    ///
    /// Returns `None` when the location falls in a nodata region or outside
    /// the grid extent.
    fn sample(&self, longitude: FloatValue, latitude: FloatValue) -> Option<FloatValue>;
}

/// A regular lat/lon grid held in memory, sampled with bilinear
/// interpolation.
///
/// Rows index latitude (south to north), columns index longitude (west to
/// east), both uniformly spaced. Nodata cells are stored as NaN; any NaN
/// corner of the interpolation cell makes the sample nodata.
#[derive(Debug, Clone)]
pub struct LatLonGrid {
    values: Array2<FloatValue>,
    west: FloatValue,
    south: FloatValue,
    lon_spacing: FloatValue,
    lat_spacing: FloatValue,
}

impl LatLonGrid {
    /// Create a grid from its south-west corner and node spacings.
    ///
    /// `values` has shape `(n_lat, n_lon)` with row 0 at `south` and
    /// column 0 at `west`. Both dimensions need at least two nodes.
    pub fn new(
        values: Array2<FloatValue>,
        west: FloatValue,
        south: FloatValue,
        lon_spacing: FloatValue,
        lat_spacing: FloatValue,
    ) -> PaleobathResult<Self> {
        let (n_lat, n_lon) = values.dim();
        if n_lat < 2 || n_lon < 2 {
            return Err(PaleobathError::Error(format!(
                "lat/lon grid must have at least 2x2 nodes, got {}x{}",
                n_lat, n_lon
            )));
        }
        if lon_spacing <= 0.0 || lat_spacing <= 0.0 {
            return Err(PaleobathError::Error(
                "lat/lon grid spacings must be positive".to_string(),
            ));
        }
        Ok(Self {
            values,
            west,
            south,
            lon_spacing,
            lat_spacing,
        })
    }

    /// Create a global 1-degree-style grid spanning `[-180, 180] x [-90, 90]`
    /// from a `(n_lat, n_lon)` array.
    pub fn global(values: Array2<FloatValue>) -> PaleobathResult<Self> {
        let (n_lat, n_lon) = values.dim();
        if n_lat < 2 || n_lon < 2 {
            return Err(PaleobathError::Error(format!(
                "lat/lon grid must have at least 2x2 nodes, got {}x{}",
                n_lat, n_lon
            )));
        }
        let lon_spacing = 360.0 / (n_lon - 1) as FloatValue;
        let lat_spacing = 180.0 / (n_lat - 1) as FloatValue;
        Self::new(values, -180.0, -90.0, lon_spacing, lat_spacing)
    }

    fn east(&self) -> FloatValue {
        self.west + self.lon_spacing * (self.values.ncols() - 1) as FloatValue
    }

    fn north(&self) -> FloatValue {
        self.south + self.lat_spacing * (self.values.nrows() - 1) as FloatValue
    }
}

impl GridSampler for LatLonGrid {
    fn sample(&self, longitude: FloatValue, latitude: FloatValue) -> Option<FloatValue> {
        // Normalise longitude into the grid's wrap-around range.
        let mut lon = longitude;
        while lon < self.west {
            lon += 360.0;
        }
        while lon > self.east() {
            lon -= 360.0;
        }
        if lon < self.west || latitude < self.south || latitude > self.north() {
            return None;
        }

        let x = (lon - self.west) / self.lon_spacing;
        let y = (latitude - self.south) / self.lat_spacing;

        let col = (x.floor() as usize).min(self.values.ncols() - 2);
        let row = (y.floor() as usize).min(self.values.nrows() - 2);
        let fx = x - col as FloatValue;
        let fy = y - row as FloatValue;

        let v00 = self.values[(row, col)];
        let v01 = self.values[(row, col + 1)];
        let v10 = self.values[(row + 1, col)];
        let v11 = self.values[(row + 1, col + 1)];

        if v00.is_nan() || v01.is_nan() || v10.is_nan() || v11.is_nan() {
            return None;
        }

        let south_edge = v00 * (1.0 - fx) + v01 * fx;
        let north_edge = v10 * (1.0 - fx) + v11 * fx;
        Some(south_edge * (1.0 - fy) + north_edge * fy)
    }
}

/// A grid holding a single constant value everywhere. Useful in tests and
/// for sites where a raster is replaced by a known scalar.
#[derive(Debug, Clone, Copy)]
pub struct ConstantGrid(pub FloatValue);

impl GridSampler for ConstantGrid {
    fn sample(&self, _longitude: FloatValue, _latitude: FloatValue) -> Option<FloatValue> {
        if self.0.is_nan() {
            None
        } else {
            Some(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn plane() -> LatLonGrid {
        // value = lon + 10 * lat over a small patch.
        let values = array![
            [0.0, 1.0, 2.0],  // lat 0
            [10.0, 11.0, 12.0], // lat 1
            [20.0, 21.0, 22.0], // lat 2
        ];
        LatLonGrid::new(values, 0.0, 0.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn samples_at_nodes() {
        let grid = plane();
        assert_relative_eq!(grid.sample(0.0, 0.0).unwrap(), 0.0);
        assert_relative_eq!(grid.sample(2.0, 2.0).unwrap(), 22.0);
        assert_relative_eq!(grid.sample(1.0, 2.0).unwrap(), 21.0);
    }

    #[test]
    fn bilinear_between_nodes() {
        let grid = plane();
        // A plane is reproduced exactly by bilinear interpolation.
        assert_relative_eq!(grid.sample(0.5, 0.5).unwrap(), 5.5);
        assert_relative_eq!(grid.sample(1.25, 1.75).unwrap(), 18.75);
    }

    #[test]
    fn nodata_corner_propagates() {
        let values = array![
            [0.0, f64::NAN, 2.0],
            [10.0, 11.0, 12.0],
            [20.0, 21.0, 22.0],
        ];
        let grid = LatLonGrid::new(values, 0.0, 0.0, 1.0, 1.0).unwrap();
        // Cell (0..1, 0..1) has a NaN corner.
        assert!(grid.sample(0.5, 0.5).is_none());
        // Cells away from the NaN are unaffected.
        assert!(grid.sample(0.5, 1.5).is_some());
    }

    #[test]
    fn outside_latitude_range_is_nodata() {
        let grid = plane();
        assert!(grid.sample(1.0, -0.5).is_none());
        assert!(grid.sample(1.0, 2.5).is_none());
    }

    #[test]
    fn longitude_wraps() {
        let grid = plane();
        // 361 degrees wraps to 1 degree.
        assert_relative_eq!(grid.sample(361.0, 1.0).unwrap(), 11.0);
        assert_relative_eq!(grid.sample(-359.0, 1.0).unwrap(), 11.0);
    }

    #[test]
    fn global_grid_covers_poles() {
        let values = Array2::from_elem((3, 5), 7.0);
        let grid = LatLonGrid::global(values).unwrap();
        assert_relative_eq!(grid.sample(0.0, 90.0).unwrap(), 7.0);
        assert_relative_eq!(grid.sample(-180.0, -90.0).unwrap(), 7.0);
    }

    #[test]
    fn constant_grid() {
        assert_relative_eq!(ConstantGrid(3.5).sample(12.0, -45.0).unwrap(), 3.5);
        assert!(ConstantGrid(f64::NAN).sample(0.0, 0.0).is_none());
    }
}
