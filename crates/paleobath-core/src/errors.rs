use thiserror::Error;

use crate::FloatValue;

/// Error type for invalid inputs and unrecoverable model failures.
///
/// Recoverable conditions (a drill site deeper than the sediment-thickness
/// grid, a clamped stretching factor, a dynamic-topography query beyond the
/// oldest grid) are not errors: they emit a `tracing` warning and continue
/// with a documented fallback.
#[derive(Error, Debug)]
pub enum PaleobathError {
    #[error("{0}")]
    Error(String),
    #[error("line {line} of {source_name}: {reason}")]
    BadInputFormat {
        source_name: String,
        line: usize,
        reason: String,
    },
    #[error("lithology name {0:?} does not exist in the lithology registry")]
    UnknownLithology(String),
    #[error("{grid_name} grid has no data at location ({longitude}, {latitude})")]
    LocationOutOfGrid {
        grid_name: String,
        longitude: FloatValue,
        latitude: FloatValue,
    },
    #[error(
        "site at ({longitude}, {latitude}) is on continental crust but has no rift end age; \
         add RiftEndAge to the drill-site file or supply a rifting period"
    )]
    RiftParametersMissing {
        longitude: FloatValue,
        latitude: FloatValue,
    },
    #[error(
        "cannot estimate stretching factor: present-day subsidence {subsidence} m is \
         unreachable with crustal thickness {crustal_thickness} m (residual {residual} m)"
    )]
    InfeasibleStretching {
        subsidence: FloatValue,
        crustal_thickness: FloatValue,
        residual: FloatValue,
    },
}

/// Convenience type for `Result<T, PaleobathError>`.
pub type PaleobathResult<T> = Result<T, PaleobathError>;
