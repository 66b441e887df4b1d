//! GRIB2 parameter lookup table.
//!
//! Maps the numeric parameter code of a message, optionally qualified by
//! its first fixed surface, to the short identifier used in the variable
//! catalog (e.g. `(0, 0, 0)` at 2 m above ground -> `"2t"`).
//!
//! The built-in table covers the default catalog. A replacement can be
//! loaded from YAML:
//!
//! ```yaml
//! parameters:
//!   - short_name: 2t
//!     discipline: 0
//!     category: 0
//!     number: 0
//!     surface_type: 103
//!     surface_value: 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Grib2Error, Result};
use crate::message::{ParameterCode, SurfaceLevel};

/// Tolerance when comparing surface values.
const SURFACE_VALUE_TOLERANCE: f64 = 1e-6;

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub short_name: String,
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
    /// Required first fixed surface type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<u8>,
    /// Required first fixed surface value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_value: Option<f64>,
}

impl ParameterEntry {
    fn new(short_name: &str, code: (u8, u8, u8), surface: Option<(u8, Option<f64>)>) -> Self {
        let (discipline, category, number) = code;
        Self {
            short_name: short_name.to_string(),
            discipline,
            category,
            number,
            surface_type: surface.map(|(t, _)| t),
            surface_value: surface.and_then(|(_, v)| v),
        }
    }

    fn matches(&self, code: ParameterCode, surface: Option<SurfaceLevel>) -> bool {
        if self.discipline != code.discipline
            || self.category != code.category
            || self.number != code.number
        {
            return false;
        }
        if let Some(kind) = self.surface_type {
            if surface.map(|s| s.kind) != Some(kind) {
                return false;
            }
        }
        if let Some(value) = self.surface_value {
            match surface {
                Some(s) if (s.value - value).abs() <= SURFACE_VALUE_TOLERANCE => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct TableFile {
    parameters: Vec<ParameterEntry>,
}

/// Ordered parameter table. The first matching entry wins, so entries with
/// surface qualifiers should precede unqualified ones for the same code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    entries: Vec<ParameterEntry>,
}

impl ParameterTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn add(&mut self, entry: ParameterEntry) {
        self.entries.push(entry);
    }

    /// Resolve the short identifier of a message.
    pub fn resolve(&self, code: ParameterCode, surface: Option<SurfaceLevel>) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.matches(code, surface))
            .map(|e| e.short_name.as_str())
    }

    /// Parse a table from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: TableFile =
            serde_yaml::from_str(yaml).map_err(|e| Grib2Error::Table(e.to_string()))?;
        Ok(Self {
            entries: file.parameters,
        })
    }

    /// Load a table from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
            .map_err(|e| Grib2Error::Table(format!("{}: {}", path.display(), e)))
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Surface types (code table 4.5) used by the built-in table.
const GROUND_OR_WATER: u8 = 1;
const HEIGHT_ABOVE_GROUND: u8 = 103;
const SOIL_LEVEL: u8 = 151;

impl ParameterTable {
    /// Table covering the default variable catalog.
    pub fn builtin() -> Self {
        let above_ground = |m: f64| Some((HEIGHT_ABOVE_GROUND, Some(m)));
        let soil_layer = |n: f64| Some((SOIL_LEVEL, Some(n)));
        let surface = Some((GROUND_OR_WATER, None));

        let entries = vec![
            ParameterEntry::new("2t", (0, 0, 0), above_ground(2.0)),
            ParameterEntry::new("2d", (0, 0, 6), above_ground(2.0)),
            ParameterEntry::new("10u", (0, 2, 2), above_ground(10.0)),
            ParameterEntry::new("10v", (0, 2, 3), above_ground(10.0)),
            ParameterEntry::new("u", (0, 2, 2), above_ground(100.0)),
            ParameterEntry::new("v", (0, 2, 3), above_ground(100.0)),
            ParameterEntry::new("tp", (0, 1, 8), surface),
            ParameterEntry::new("swvl1", (2, 0, 25), soil_layer(1.0)),
            ParameterEntry::new("swvl2", (2, 0, 25), soil_layer(2.0)),
            ParameterEntry::new("swvl3", (2, 0, 25), soil_layer(3.0)),
            ParameterEntry::new("swvl4", (2, 0, 25), soil_layer(4.0)),
            ParameterEntry::new("slt", (2, 3, 0), surface),
            ParameterEntry::new("lsm", (2, 0, 0), surface),
            ParameterEntry::new("cl", (1, 2, 2), surface),
            ParameterEntry::new("z", (0, 3, 4), surface),
        ];
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(kind: u8, value: f64) -> Option<SurfaceLevel> {
        Some(SurfaceLevel { kind, value })
    }

    #[test]
    fn test_builtin_lookup() {
        let table = ParameterTable::builtin();

        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), level(103, 2.0)), Some("2t"));
        assert_eq!(table.resolve(ParameterCode::new(0, 1, 8), level(1, 0.0)), Some("tp"));
        assert_eq!(table.resolve(ParameterCode::new(2, 0, 0), level(1, 0.0)), Some("lsm"));
        assert_eq!(table.resolve(ParameterCode::new(2, 0, 25), level(151, 3.0)), Some("swvl3"));
    }

    #[test]
    fn test_surface_value_disambiguates() {
        let table = ParameterTable::builtin();
        let u = ParameterCode::new(0, 2, 2);

        assert_eq!(table.resolve(u, level(103, 10.0)), Some("10u"));
        assert_eq!(table.resolve(u, level(103, 100.0)), Some("u"));
        assert_eq!(table.resolve(u, level(100, 85000.0)), None);
        assert_eq!(table.resolve(u, None), None);
    }

    #[test]
    fn test_unknown_code() {
        let table = ParameterTable::builtin();
        assert_eq!(table.resolve(ParameterCode::new(99, 99, 99), None), None);
    }

    #[test]
    fn test_unqualified_entry_matches_any_surface() {
        let mut table = ParameterTable::new();
        table.add(ParameterEntry::new("t", (0, 0, 0), None));

        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), None), Some("t"));
        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), level(100, 500.0)), Some("t"));
    }

    #[test]
    fn test_first_entry_wins() {
        let mut table = ParameterTable::new();
        table.add(ParameterEntry::new("2t", (0, 0, 0), Some((103, Some(2.0)))));
        table.add(ParameterEntry::new("t", (0, 0, 0), None));

        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), level(103, 2.0)), Some("2t"));
        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), level(100, 500.0)), Some("t"));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
parameters:
  - short_name: 2t
    discipline: 0
    category: 0
    number: 0
    surface_type: 103
    surface_value: 2
  - short_name: msl
    discipline: 0
    category: 3
    number: 0
"#;
        let table = ParameterTable::from_yaml_str(yaml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), level(103, 2.0)), Some("2t"));
        assert_eq!(table.resolve(ParameterCode::new(0, 3, 0), None), Some("msl"));
    }

    #[test]
    fn test_from_yaml_invalid() {
        let result = ParameterTable::from_yaml_str("parameters: 3");
        assert!(matches!(result, Err(Grib2Error::Table(_))));
    }

    #[test]
    fn test_empty_table() {
        let table = ParameterTable::new();
        assert!(table.is_empty());
        assert_eq!(table.resolve(ParameterCode::new(0, 0, 0), None), None);
    }
}
