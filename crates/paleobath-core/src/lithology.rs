//! Lithology parameters and the lithology registry.
//!
//! Each lithology carries the three parameters of the exponential porosity
//! model: grain density, surface porosity and porosity decay length. A
//! [`LithologyRegistry`] maps names to lithologies; it can be merged from
//! several text sources with later sources overriding earlier ones, which is
//! how a site-specific set extends a primary set.
//!
//! Text format, one lithology per row:
//!
//! ```text
//! # name       density  porosity  decay
//! Shale        2700     0.63      1960
//! Sand         2650     0.49      3700
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{PaleobathError, PaleobathResult};
use crate::FloatValue;

/// Name of the lithology used for a synthesized base stratigraphic unit.
pub const DEFAULT_BASE_LITHOLOGY_NAME: &str = "Shale";

/// Tolerance on the sum of lithology fractions in a mixture.
pub const FRACTION_TOLERANCE: FloatValue = 1e-3;

/// Parameters of a (possibly mixed) lithology.
///
/// The porosity profile is `porosity(z) = surface_porosity *
/// exp(-z / porosity_decay)` with `z` the burial depth in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lithology {
    /// Grain density (kg/m3).
    pub density: FloatValue,
    /// Porosity at zero burial depth (unit-less, in `(0, 1)`).
    pub surface_porosity: FloatValue,
    /// Exponential decay length of porosity with depth (m).
    pub porosity_decay: FloatValue,
}

impl Lithology {
    pub fn new(density: FloatValue, surface_porosity: FloatValue, porosity_decay: FloatValue) -> Self {
        Self {
            density,
            surface_porosity,
            porosity_decay,
        }
    }
}

/// A mapping of lithology names to their parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LithologyRegistry {
    lithologies: HashMap<String, Lithology>,
}

impl LithologyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered lithologies.
    pub fn len(&self) -> usize {
        self.lithologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lithologies.is_empty()
    }

    /// Look up a lithology by name.
    pub fn get(&self, name: &str) -> Option<&Lithology> {
        self.lithologies.get(name)
    }

    /// Register a lithology, replacing any previous definition of `name`.
    pub fn insert(&mut self, name: impl Into<String>, lithology: Lithology) {
        self.lithologies.insert(name.into(), lithology);
    }

    /// Merge another registry into this one.
    ///
    /// Definitions in `other` override existing definitions with the same
    /// name, so later sources win.
    pub fn merge(&mut self, other: LithologyRegistry) {
        self.lithologies.extend(other.lithologies);
    }

    /// Parse a registry from whitespace-separated text.
    ///
    /// Rows that are blank or start with `#` or `>` are skipped. Malformed
    /// rows (fewer than 4 columns, or a 5th column that is not a comment,
    /// or unparsable numbers) are skipped with a warning rather than
    /// aborting the whole source.
    pub fn parse(source: &str, source_name: &str) -> Self {
        let mut registry = Self::new();

        for (line_index, line) in source.lines().enumerate() {
            let line_number = line_index + 1;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() || fields[0].starts_with('#') || fields[0].starts_with('>') {
                continue;
            }

            if fields.len() < 4 || (fields.len() > 4 && !fields[4].starts_with('#')) {
                warn!(
                    source = source_name,
                    line = line_number,
                    "ignoring lithology: row does not have 4 whitespace-separated columns"
                );
                continue;
            }

            let parsed: Option<(FloatValue, FloatValue, FloatValue)> = (|| {
                Some((
                    fields[1].parse().ok()?,
                    fields[2].parse().ok()?,
                    fields[3].parse().ok()?,
                ))
            })();

            match parsed {
                Some((density, surface_porosity, porosity_decay)) => {
                    registry.insert(
                        fields[0],
                        Lithology::new(density, surface_porosity, porosity_decay),
                    );
                }
                None => {
                    warn!(
                        source = source_name,
                        line = line_number,
                        "ignoring lithology: cannot read density/porosity/decay values"
                    );
                }
            }
        }

        registry
    }

    /// Parse several sources and merge them, later sources overriding
    /// earlier ones on name collisions.
    pub fn parse_all<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut registry = Self::new();
        for (source, source_name) in sources {
            registry.merge(Self::parse(source, source_name));
        }
        registry
    }

    /// Combine weighted lithology components into a single lithology.
    ///
    /// The effective parameters are the fraction-weighted averages. Fails
    /// with [`PaleobathError::UnknownLithology`] if a component name is not
    /// registered, and with [`PaleobathError::Error`] if the fractions do
    /// not sum to 1 within [`FRACTION_TOLERANCE`].
    pub fn combine(&self, components: &[(String, FloatValue)]) -> PaleobathResult<Lithology> {
        let mut density = 0.0;
        let mut surface_porosity = 0.0;
        let mut porosity_decay = 0.0;
        let mut total_fraction = 0.0;

        for (name, fraction) in components {
            let lithology = self
                .get(name)
                .ok_or_else(|| PaleobathError::UnknownLithology(name.clone()))?;
            density += fraction * lithology.density;
            surface_porosity += fraction * lithology.surface_porosity;
            porosity_decay += fraction * lithology.porosity_decay;
            total_fraction += fraction;
        }

        if (total_fraction - 1.0).abs() > FRACTION_TOLERANCE {
            return Err(PaleobathError::Error(format!(
                "lithology fractions sum to {} instead of 1.0",
                total_fraction
            )));
        }

        Ok(Lithology::new(density, surface_porosity, porosity_decay))
    }
}
