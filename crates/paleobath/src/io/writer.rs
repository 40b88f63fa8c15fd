use std::fmt::Write as _;
use std::str::FromStr;

use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::stratigraphy::{DecompactedWell, Well};
use paleobath_core::FloatValue;

use super::reader::WellColumns;

/// Width of a numeric output column.
const FIELD_WIDTH: usize = 9;

/// A selectable column of the decompacted output.
///
/// Quantities a run did not produce (for example `tectonic_subsidence` when
/// backstripping without recorded water depths, or `dynamic_topography`
/// without a model) are written as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompactedColumn {
    Age,
    CompactedDepth,
    CompactedThickness,
    DecompactedThickness,
    DecompactedDensity,
    DecompactedSedimentRate,
    DecompactedDepth,
    DynamicTopography,
    TectonicSubsidence,
    WaterDepth,
    MinTectonicSubsidence,
    MaxTectonicSubsidence,
    AverageTectonicSubsidence,
    MinWaterDepth,
    MaxWaterDepth,
    AverageWaterDepth,
    /// Lithology components of the surface unit. Must be the last column.
    Lithology,
}

impl DecompactedColumn {
    /// The column's name in output headers and column selections.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::CompactedDepth => "compacted_depth",
            Self::CompactedThickness => "compacted_thickness",
            Self::DecompactedThickness => "decompacted_thickness",
            Self::DecompactedDensity => "decompacted_density",
            Self::DecompactedSedimentRate => "decompacted_sediment_rate",
            Self::DecompactedDepth => "decompacted_depth",
            Self::DynamicTopography => "dynamic_topography",
            Self::TectonicSubsidence => "tectonic_subsidence",
            Self::WaterDepth => "water_depth",
            Self::MinTectonicSubsidence => "min_tectonic_subsidence",
            Self::MaxTectonicSubsidence => "max_tectonic_subsidence",
            Self::AverageTectonicSubsidence => "average_tectonic_subsidence",
            Self::MinWaterDepth => "min_water_depth",
            Self::MaxWaterDepth => "max_water_depth",
            Self::AverageWaterDepth => "average_water_depth",
            Self::Lithology => "lithology",
        }
    }

    fn value(&self, well: &DecompactedWell) -> FloatValue {
        match self {
            Self::Age => well.age,
            Self::CompactedDepth => well.surface_unit.top_depth,
            Self::CompactedThickness => well.total_compacted_thickness,
            Self::DecompactedThickness => well.total_decompacted_thickness,
            Self::DecompactedDensity => well.average_decompacted_density(),
            Self::DecompactedSedimentRate => well.surface_unit.decompacted_sediment_rate(),
            Self::DecompactedDepth => well.surface_unit.decompacted_top_depth,
            Self::DynamicTopography => well.dynamic_topography.unwrap_or(FloatValue::NAN),
            Self::TectonicSubsidence | Self::AverageTectonicSubsidence => {
                well.tectonic_subsidence().unwrap_or(FloatValue::NAN)
            }
            Self::WaterDepth | Self::AverageWaterDepth => {
                well.water_depth().unwrap_or(FloatValue::NAN)
            }
            Self::MinTectonicSubsidence => well
                .min_max_tectonic_subsidence()
                .map_or(FloatValue::NAN, |(min, _)| min),
            Self::MaxTectonicSubsidence => well
                .min_max_tectonic_subsidence()
                .map_or(FloatValue::NAN, |(_, max)| max),
            Self::MinWaterDepth => well
                .min_max_water_depth()
                .map_or(FloatValue::NAN, |(min, _)| min),
            Self::MaxWaterDepth => well
                .min_max_water_depth()
                .map_or(FloatValue::NAN, |(_, max)| max),
            Self::Lithology => FloatValue::NAN,
        }
    }
}

impl FromStr for DecompactedColumn {
    type Err = PaleobathError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let column = match name {
            "age" => Self::Age,
            "compacted_depth" => Self::CompactedDepth,
            "compacted_thickness" => Self::CompactedThickness,
            "decompacted_thickness" => Self::DecompactedThickness,
            "decompacted_density" => Self::DecompactedDensity,
            "decompacted_sediment_rate" => Self::DecompactedSedimentRate,
            "decompacted_depth" => Self::DecompactedDepth,
            "dynamic_topography" => Self::DynamicTopography,
            "tectonic_subsidence" => Self::TectonicSubsidence,
            "water_depth" => Self::WaterDepth,
            "min_tectonic_subsidence" => Self::MinTectonicSubsidence,
            "max_tectonic_subsidence" => Self::MaxTectonicSubsidence,
            "average_tectonic_subsidence" => Self::AverageTectonicSubsidence,
            "min_water_depth" => Self::MinWaterDepth,
            "max_water_depth" => Self::MaxWaterDepth,
            "average_water_depth" => Self::AverageWaterDepth,
            "lithology" => Self::Lithology,
            other => {
                return Err(PaleobathError::Error(format!(
                    "unrecognised decompacted column name {:?}",
                    other
                )))
            }
        };
        Ok(column)
    }
}

/// Write the well's metadata as `# Key = value` lines.
fn write_metadata(output: &mut String, well: &Well) {
    let mut metadata = |key: &str, value: Option<FloatValue>| {
        if let Some(value) = value {
            let _ = writeln!(output, "# {} = {}", key, value);
        }
    };
    metadata("SiteLongitude", well.longitude);
    metadata("SiteLatitude", well.latitude);
    metadata("SurfaceAge", well.surface_age);
    metadata("RiftStartAge", well.rift_start_age);
    metadata("RiftEndAge", well.rift_end_age);
    metadata("WaterDepth", well.water_depth);
}

/// Format a well back into drill-site text, including any synthesized base
/// unit. Rows follow the standard order of `columns` (water-depth columns
/// are written only when the layout has them).
pub fn write_well(well: &Well, columns: WellColumns) -> String {
    let mut output = String::new();
    write_metadata(&mut output, well);

    let with_water_depths = columns.min_water_depth.is_some() && columns.max_water_depth.is_some();
    let _ = writeln!(
        output,
        "# bottom_age bottom_depth{} lithology",
        if with_water_depths {
            " min_water_depth max_water_depth"
        } else {
            ""
        }
    );

    for unit in well.units() {
        let _ = write!(
            output,
            "{:<width$.3} {:<width$.3}",
            unit.bottom_age,
            unit.bottom_depth,
            width = FIELD_WIDTH
        );
        if with_water_depths {
            let _ = write!(
                output,
                " {:<width$.3} {:<width$.3}",
                unit.min_water_depth.unwrap_or(FloatValue::NAN),
                unit.max_water_depth.unwrap_or(FloatValue::NAN),
                width = FIELD_WIDTH
            );
        }
        let _ = write!(output, " {}", format_lithology(unit.lithology_components.as_slice()));
        let _ = writeln!(output);
    }

    output
}

/// Format decompacted wells as fixed-width columns, one row per age.
///
/// `columns` selects the quantities and their order; `lithology`, if
/// present, must be last.
pub fn write_decompacted_wells(
    decompacted_wells: &[DecompactedWell],
    well: &Well,
    columns: &[DecompactedColumn],
) -> PaleobathResult<String> {
    if let Some(position) = columns
        .iter()
        .position(|column| *column == DecompactedColumn::Lithology)
    {
        if position != columns.len() - 1 {
            return Err(PaleobathError::Error(
                "the lithology column must be the last decompacted column".to_string(),
            ));
        }
    }

    let mut output = String::new();
    write_metadata(&mut output, well);
    let _ = writeln!(output, "#");

    // Header row; column widths accommodate long names.
    let widths: Vec<usize> = columns
        .iter()
        .map(|column| FIELD_WIDTH.max(column.name().len()))
        .collect();
    let _ = write!(output, "# ");
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            let _ = write!(output, " ");
        }
        let _ = write!(output, "{:<width$}", column.name(), width = widths[index]);
    }
    let _ = writeln!(output);

    for decompacted_well in decompacted_wells {
        // Two leading spaces line values up under the '#'-prefixed header.
        let _ = write!(output, "  ");
        for (index, column) in columns.iter().enumerate() {
            if index > 0 {
                let _ = write!(output, " ");
            }
            if *column == DecompactedColumn::Lithology {
                let _ = write!(
                    output,
                    "{}",
                    format_lithology(decompacted_well.surface_unit.lithology_components.as_slice())
                );
            } else {
                let _ = write!(
                    output,
                    "{:<width$.3}",
                    column.value(decompacted_well),
                    width = widths[index]
                );
            }
        }
        let _ = writeln!(output);
    }

    Ok(output)
}

fn format_lithology(components: &[(String, FloatValue)]) -> String {
    let mut formatted = String::new();
    for (name, fraction) in components {
        let _ = write!(formatted, "{:<15} {:<10.2} ", name, fraction);
    }
    formatted.trim_end().to_string()
}
