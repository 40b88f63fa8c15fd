use paleobath_core::errors::{PaleobathError, PaleobathResult};
use paleobath_core::lithology::LithologyRegistry;
use paleobath_core::stratigraphy::{StratigraphicUnit, Well};
use paleobath_core::{FloatValue, Time};

/// Column layout of the data rows of a drill-site file.
///
/// The lithology `(name, fraction)` pairs must occupy the trailing columns,
/// so `lithology` has to be the largest index.
#[derive(Debug, Clone, Copy)]
pub struct WellColumns {
    /// Column holding the unit's bottom age (Ma).
    pub bottom_age: usize,
    /// Column holding the unit's bottom depth (m).
    pub bottom_depth: usize,
    /// Column holding the recorded minimum paleo water depth (m), if any.
    pub min_water_depth: Option<usize>,
    /// Column holding the recorded maximum paleo water depth (m), if any.
    pub max_water_depth: Option<usize>,
    /// First column of the lithology pairs.
    pub lithology: usize,
}

impl WellColumns {
    /// The backtracking layout: `bottom_age bottom_depth lithology...`.
    pub fn backtrack() -> Self {
        Self {
            bottom_age: 0,
            bottom_depth: 1,
            min_water_depth: None,
            max_water_depth: None,
            lithology: 2,
        }
    }

    /// The backstripping layout:
    /// `bottom_age bottom_depth min_water_depth max_water_depth lithology...`.
    pub fn backstrip() -> Self {
        Self {
            bottom_age: 0,
            bottom_depth: 1,
            min_water_depth: Some(2),
            max_water_depth: Some(3),
            lithology: 4,
        }
    }

    fn validate(&self) -> PaleobathResult<()> {
        let mut largest = self.bottom_age.max(self.bottom_depth);
        if let Some(column) = self.min_water_depth {
            largest = largest.max(column);
        }
        if let Some(column) = self.max_water_depth {
            largest = largest.max(column);
        }
        if largest >= self.lithology {
            return Err(PaleobathError::Error(
                "lithology must occupy the last columns of a drill-site file".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a drill site from text.
///
/// Metadata is taken from `# Key = value` lines (SiteLongitude,
/// SiteLatitude, SurfaceAge, RiftStartAge, RiftEndAge, WaterDepth). Data
/// rows become stratigraphic units: the top age/depth of each unit is the
/// bottom age/depth of the previous one, with the first unit starting at
/// the surface age (default 0 Ma) and zero depth.
pub fn read_well(
    source: &str,
    source_name: &str,
    registry: &LithologyRegistry,
    columns: WellColumns,
) -> PaleobathResult<Well> {
    columns.validate()?;

    let mut well = Well::new();
    let mut rows: Vec<(usize, Vec<&str>)> = Vec::new();

    for (line_index, line) in source.lines().enumerate() {
        let line_number = line_index + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields[0].starts_with('#') {
            read_metadata(line, source_name, line_number, &mut well)?;
            continue;
        }
        rows.push((line_number, fields));
    }

    let bad_row = |line: usize, reason: String| PaleobathError::BadInputFormat {
        source_name: source_name.to_string(),
        line,
        reason,
    };

    let mut top_age = well.surface_age.unwrap_or(0.0);
    let mut top_depth = 0.0;

    for (line_number, fields) in rows {
        if fields.len() < columns.lithology + 2 {
            return Err(bad_row(
                line_number,
                format!(
                    "expected at least {} columns followed by lithology pairs",
                    columns.lithology
                ),
            ));
        }

        let number = |column: usize| -> PaleobathResult<FloatValue> {
            fields[column].parse().map_err(|_| {
                bad_row(
                    line_number,
                    format!("cannot parse {:?} as a number", fields[column]),
                )
            })
        };

        let bottom_age: Time = number(columns.bottom_age)?;
        let bottom_depth = number(columns.bottom_depth)?;

        if bottom_age <= top_age {
            return Err(bad_row(
                line_number,
                format!(
                    "bottom age {} must be older than the age above it ({})",
                    bottom_age, top_age
                ),
            ));
        }
        if bottom_depth <= top_depth {
            return Err(bad_row(
                line_number,
                format!(
                    "bottom depth {} must be deeper than the depth above it ({})",
                    bottom_depth, top_depth
                ),
            ));
        }

        let water_depths = match (columns.min_water_depth, columns.max_water_depth) {
            (Some(min_column), Some(max_column)) => {
                Some((number(min_column)?, number(max_column)?))
            }
            _ => None,
        };

        let lithology_fields = &fields[columns.lithology..];
        if lithology_fields.len() % 2 != 0 {
            return Err(bad_row(
                line_number,
                "lithology columns must be (name, fraction) pairs".to_string(),
            ));
        }
        let components: Vec<(String, FloatValue)> = lithology_fields
            .chunks(2)
            .map(|pair| -> PaleobathResult<(String, FloatValue)> {
                let fraction = pair[1].parse().map_err(|_| {
                    bad_row(
                        line_number,
                        format!("cannot parse lithology fraction {:?}", pair[1]),
                    )
                })?;
                Ok((pair[0].to_string(), fraction))
            })
            .collect::<PaleobathResult<_>>()?;

        let lithology = registry.combine(&components).map_err(|error| match error {
            // Unknown names surface as-is; a bad fraction sum is a format
            // problem of this row.
            PaleobathError::UnknownLithology(_) => error,
            other => bad_row(line_number, other.to_string()),
        })?;

        let mut unit = StratigraphicUnit::new(top_age, bottom_age, top_depth, bottom_depth, lithology)
            .with_components(components);
        if let Some((min, max)) = water_depths {
            unit = unit.with_water_depths(min, max);
        }
        well.add_unit(unit)?;

        top_age = bottom_age;
        top_depth = bottom_depth;
    }

    Ok(well)
}

/// Parse a `# Key = value` metadata line into the well's attributes.
fn read_metadata(
    line: &str,
    source_name: &str,
    line_number: usize,
    well: &mut Well,
) -> PaleobathResult<()> {
    let body = line.trim_start().trim_start_matches('#').trim();
    let Some((key, value)) = body.split_once('=') else {
        // An ordinary comment.
        return Ok(());
    };
    let key = key.trim();
    let value = value.trim();

    let parse = |range: Option<(FloatValue, FloatValue)>| -> PaleobathResult<FloatValue> {
        let parsed: FloatValue = value.parse().map_err(|_| PaleobathError::BadInputFormat {
            source_name: source_name.to_string(),
            line: line_number,
            reason: format!("cannot parse {:?} as a number for {}", value, key),
        })?;
        if let Some((low, high)) = range {
            if parsed < low || parsed > high {
                return Err(PaleobathError::BadInputFormat {
                    source_name: source_name.to_string(),
                    line: line_number,
                    reason: format!("{} {} is outside [{}, {}]", key, parsed, low, high),
                });
            }
        }
        Ok(parsed)
    };

    match key {
        "SiteLongitude" => well.longitude = Some(parse(Some((-360.0, 360.0)))?),
        "SiteLatitude" => well.latitude = Some(parse(Some((-90.0, 90.0)))?),
        "SurfaceAge" => well.surface_age = Some(parse(Some((0.0, FloatValue::INFINITY)))?),
        "RiftStartAge" => well.rift_start_age = Some(parse(Some((0.0, FloatValue::INFINITY)))?),
        "RiftEndAge" => well.rift_end_age = Some(parse(Some((0.0, FloatValue::INFINITY)))?),
        "WaterDepth" => well.water_depth = Some(parse(Some((0.0, FloatValue::INFINITY)))?),
        // Unrecognised keys inside comments are ignored.
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn registry() -> LithologyRegistry {
        LithologyRegistry::parse(
            "Shale 2700 0.63 1960\nSand 2650 0.49 3700\nMud 2438 0.36 2015\n",
            "lithologies.txt",
        )
    }

    const SITE: &str = "\
# Drill site ODP-760A
# SiteLongitude = 112.25
# SiteLatitude = -16.92
#
# bottom_age bottom_depth lithology
23.5   310.0  Shale 0.70 Sand 0.30
45.0   530.0  Shale 1.00
";

    #[test]
    fn reads_metadata_and_units() {
        let well = read_well(SITE, "site.txt", &registry(), WellColumns::backtrack()).unwrap();
        assert_relative_eq!(well.longitude.unwrap(), 112.25);
        assert_relative_eq!(well.latitude.unwrap(), -16.92);
        assert_eq!(well.units().len(), 2);

        let first = &well.units()[0];
        assert_relative_eq!(first.top_age, 0.0);
        assert_relative_eq!(first.bottom_age, 23.5);
        assert_relative_eq!(first.top_depth, 0.0);
        assert_relative_eq!(first.bottom_depth, 310.0);
        // Mixture-averaged lithology.
        assert_relative_eq!(first.lithology.density, 0.7 * 2700.0 + 0.3 * 2650.0);

        let second = &well.units()[1];
        assert_relative_eq!(second.top_age, 23.5);
        assert_relative_eq!(second.top_depth, 310.0);
    }

    #[test]
    fn surface_age_offsets_first_unit() {
        let text = "# SurfaceAge = 5.0\n23.5 310.0 Shale 1.0\n";
        let well = read_well(text, "site.txt", &registry(), WellColumns::backtrack()).unwrap();
        assert_relative_eq!(well.units()[0].top_age, 5.0);
    }

    #[test]
    fn rift_ages_read_from_metadata() {
        let text = "# RiftStartAge = 150\n# RiftEndAge = 100\n23.5 310.0 Shale 1.0\n";
        let well = read_well(text, "site.txt", &registry(), WellColumns::backtrack()).unwrap();
        assert_relative_eq!(well.rift_start_age.unwrap(), 150.0);
        assert_relative_eq!(well.rift_end_age.unwrap(), 100.0);
    }

    #[test]
    fn backstrip_columns_capture_water_depths() {
        let text = "23.5 310.0 150 250 Shale 1.0\n45.0 530.0 200 400 Mud 1.0\n";
        let well = read_well(text, "site.txt", &registry(), WellColumns::backstrip()).unwrap();
        assert_relative_eq!(well.units()[0].min_water_depth.unwrap(), 150.0);
        assert_relative_eq!(well.units()[1].max_water_depth.unwrap(), 400.0);
    }

    #[test]
    fn zero_span_age_rejected() {
        let text = "23.5 310.0 Shale 1.0\n23.5 530.0 Shale 1.0\n";
        let err = read_well(text, "site.txt", &registry(), WellColumns::backtrack()).unwrap_err();
        assert!(matches!(err, PaleobathError::BadInputFormat { line: 2, .. }));
    }

    #[test]
    fn decreasing_depth_rejected() {
        let text = "23.5 310.0 Shale 1.0\n45.0 250.0 Shale 1.0\n";
        assert!(read_well(text, "site.txt", &registry(), WellColumns::backtrack()).is_err());
    }

    #[test]
    fn fractions_must_sum_to_one() {
        // 0.7 + 0.2 is outside the 1e-3 tolerance.
        let text = "23.5 310.0 Shale 0.7 Sand 0.2\n";
        let err = read_well(text, "site.txt", &registry(), WellColumns::backtrack()).unwrap_err();
        assert!(matches!(err, PaleobathError::BadInputFormat { .. }));

        // Inside the tolerance.
        let text = "23.5 310.0 Shale 0.7004 Sand 0.3\n";
        assert!(read_well(text, "site.txt", &registry(), WellColumns::backtrack()).is_ok());
    }

    #[test]
    fn unknown_lithology_surfaces() {
        let text = "23.5 310.0 Marble 1.0\n";
        let err = read_well(text, "site.txt", &registry(), WellColumns::backtrack()).unwrap_err();
        assert!(matches!(err, PaleobathError::UnknownLithology(name) if name == "Marble"));
    }

    #[test]
    fn dangling_lithology_name_rejected() {
        let text = "23.5 310.0 Shale 0.5 Sand\n";
        assert!(read_well(text, "site.txt", &registry(), WellColumns::backtrack()).is_err());
    }

    #[test]
    fn out_of_range_latitude_rejected() {
        let text = "# SiteLatitude = 95\n23.5 310.0 Shale 1.0\n";
        assert!(read_well(text, "site.txt", &registry(), WellColumns::backtrack()).is_err());
    }

    #[test]
    fn lithology_must_be_last_column() {
        let columns = WellColumns {
            bottom_age: 0,
            bottom_depth: 3,
            min_water_depth: None,
            max_water_depth: None,
            lithology: 2,
        };
        assert!(read_well("0 1 Shale 1.0\n", "site.txt", &registry(), columns).is_err());
    }
}
