//! Variable definitions and the default conversion catalog.

use serde::{Deserialize, Serialize};

/// Last forecast step (hours) of the default configuration.
pub const DEFAULT_MAX_STEP: u32 = 48;

/// Forecast steps of the default configuration: hourly, 0 through 48.
pub fn default_forecast_steps() -> Vec<u32> {
    (0..=DEFAULT_MAX_STEP).collect()
}

/// How a field's value relates to its forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Valid at an exact forecast hour.
    Instantaneous,
    /// Integrated from initialization up to the forecast hour.
    Accumulated,
}

/// Whether a variable carries a step dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableCategory {
    /// Varies with forecast step; stored as `(time, step, latitude, longitude)`.
    Forecast,
    /// Static per run; stored as `(time, latitude, longitude)`.
    Analysis,
}

/// Message selection rule applied by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Select by step range, falling back to the message whose period ends
    /// at the step.
    StepRange,
    /// Zero at step 0; otherwise select by end of the accumulation period.
    EndOfAccumulation,
    /// Select by identifier alone, one field per run.
    Static,
}

impl ExtractionStrategy {
    /// True if the field is identically zero at the initialization time.
    pub fn zero_at_initialization(&self) -> bool {
        matches!(self, Self::EndOfAccumulation)
    }

    /// True if the strategy yields one field per forecast step.
    pub fn has_steps(&self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// A variable to extract from the source files and store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Short identifier used in the source messages (e.g. "2t").
    pub short_id: String,
    /// Array name in the store (e.g. "2m_temperature").
    pub display_name: String,
    /// Descriptive name written to the array attributes.
    #[serde(default)]
    pub long_name: String,
    /// Physical units, if known.
    #[serde(default)]
    pub units: Option<String>,
    pub kind: VariableKind,
    pub category: VariableCategory,
}

impl VariableSpec {
    /// A step-dependent variable.
    pub fn forecast(
        short_id: &str,
        display_name: &str,
        long_name: &str,
        units: &str,
        kind: VariableKind,
    ) -> Self {
        Self {
            short_id: short_id.to_string(),
            display_name: display_name.to_string(),
            long_name: long_name.to_string(),
            units: Some(units.to_string()),
            kind,
            category: VariableCategory::Forecast,
        }
    }

    /// A static (analysis) variable.
    pub fn analysis(short_id: &str, display_name: &str, long_name: &str, units: &str) -> Self {
        Self {
            short_id: short_id.to_string(),
            display_name: display_name.to_string(),
            long_name: long_name.to_string(),
            units: Some(units.to_string()),
            kind: VariableKind::Instantaneous,
            category: VariableCategory::Analysis,
        }
    }

    /// The selection rule for this variable.
    pub fn strategy(&self) -> ExtractionStrategy {
        match (self.category, self.kind) {
            (VariableCategory::Analysis, _) => ExtractionStrategy::Static,
            (VariableCategory::Forecast, VariableKind::Instantaneous) => {
                ExtractionStrategy::StepRange
            }
            (VariableCategory::Forecast, VariableKind::Accumulated) => {
                ExtractionStrategy::EndOfAccumulation
            }
        }
    }

    /// Logical dimension names of the variable's array, in index order.
    pub fn dimensions(&self) -> &'static [&'static str] {
        match self.category {
            VariableCategory::Forecast => &["time", "step", "latitude", "longitude"],
            VariableCategory::Analysis => &["time", "latitude", "longitude"],
        }
    }

    pub fn is_forecast(&self) -> bool {
        self.category == VariableCategory::Forecast
    }
}

/// The variables converted by default: surface forecast fields from the
/// hourly runs plus the static fields of the analysis.
pub fn default_catalog() -> Vec<VariableSpec> {
    use VariableKind::{Accumulated, Instantaneous};

    vec![
        // Forecast
        VariableSpec::forecast("tp", "total_precipitation", "Total precipitation", "m", Accumulated),
        VariableSpec::forecast("2t", "2m_temperature", "2 metre temperature", "K", Instantaneous),
        VariableSpec::forecast(
            "2d",
            "2m_dewpoint_temperature",
            "2 metre dewpoint temperature",
            "K",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "10u",
            "10m_u_component_of_wind",
            "10 metre U wind component",
            "m s**-1",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "10v",
            "10m_v_component_of_wind",
            "10 metre V wind component",
            "m s**-1",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "u",
            "100m_u_component_of_wind",
            "100 metre U wind component",
            "m s**-1",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "v",
            "100m_v_component_of_wind",
            "100 metre V wind component",
            "m s**-1",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "swvl1",
            "volumetric_soil_water_layer_1",
            "Volumetric soil water layer 1",
            "m**3 m**-3",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "swvl2",
            "volumetric_soil_water_layer_2",
            "Volumetric soil water layer 2",
            "m**3 m**-3",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "swvl3",
            "volumetric_soil_water_layer_3",
            "Volumetric soil water layer 3",
            "m**3 m**-3",
            Instantaneous,
        ),
        VariableSpec::forecast(
            "swvl4",
            "volumetric_soil_water_layer_4",
            "Volumetric soil water layer 4",
            "m**3 m**-3",
            Instantaneous,
        ),
        // Analysis
        VariableSpec::analysis("slt", "soil_type", "Soil type", "~"),
        VariableSpec::analysis("lsm", "land_sea_mask", "Land-sea mask", "(0 - 1)"),
        VariableSpec::analysis("cl", "lake_cover", "Lake cover", "(0 - 1)"),
        VariableSpec::analysis("z", "geopotential", "Geopotential", "m**2 s**-2"),
    ]
}
