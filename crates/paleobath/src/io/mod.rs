//! Drill-site text I/O.
//!
//! Drill-site files carry `# Key = value` metadata lines followed by one
//! whitespace-separated row per stratigraphic unit:
//!
//! ```text
//! # SiteLongitude = 143.20
//! # SiteLatitude  = -31.50
//! # SurfaceAge    = 0.0
//! #
//! # bottom_age  bottom_depth  lithology
//! 23.5          310.0         Shale 0.70 Sand 0.30
//! 45.0          530.0         Shale 1.00
//! ```
//!
//! Column positions are configurable through [`WellColumns`]; backstripping
//! inserts recorded min/max water-depth columns before the lithology. The
//! lithology occupies the trailing columns as `(name, fraction)` pairs whose
//! fractions must sum to one.
//!
//! [`write_well`] echoes a well back out (including any synthesized base
//! unit) and [`write_decompacted_wells`] formats the decompacted outputs
//! with a caller-selected column layout.

mod reader;
mod writer;

pub use reader::{read_well, WellColumns};
pub use writer::{write_decompacted_wells, write_well, DecompactedColumn};
