// 📏 Unit Table - static registry of categories, units and temperature formulas
//
// Linear categories convert through a base unit whose factor is 1.
// Temperature needs additive offsets, so its units carry a scale tag instead
// of a factor and convert through an explicit pairwise formula table.

use crate::error::{ConversionError, ConversionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TEMPERATURE SCALES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureScale {
    pub fn name(&self) -> &'static str {
        match self {
            TemperatureScale::Celsius => "Celsius",
            TemperatureScale::Fahrenheit => "Fahrenheit",
            TemperatureScale::Kelvin => "Kelvin",
        }
    }

    /// Convert `value` from this scale to `to`
    pub fn convert_to(self, to: TemperatureScale, value: f64) -> f64 {
        use TemperatureScale::*;

        match (self, to) {
            (Celsius, Celsius) | (Fahrenheit, Fahrenheit) | (Kelvin, Kelvin) => value,
            (Celsius, Fahrenheit) => value * 9.0 / 5.0 + 32.0,
            (Celsius, Kelvin) => value + 273.15,
            (Fahrenheit, Celsius) => (value - 32.0) * 5.0 / 9.0,
            (Fahrenheit, Kelvin) => (value - 32.0) * 5.0 / 9.0 + 273.15,
            (Kelvin, Celsius) => value - 273.15,
            (Kelvin, Fahrenheit) => (value - 273.15) * 9.0 / 5.0 + 32.0,
        }
    }
}

// ============================================================================
// UNIT DEFINITION
// ============================================================================

/// How a unit relates to the rest of its category
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitKind {
    /// Multiplier to convert to the category's base unit
    Linear(f64),

    /// Formula-based unit (Temperature only)
    Temperature(TemperatureScale),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDefinition {
    pub name: &'static str,
    pub kind: UnitKind,
}

impl UnitDefinition {
    const fn linear(name: &'static str, factor: f64) -> Self {
        UnitDefinition {
            name,
            kind: UnitKind::Linear(factor),
        }
    }

    const fn temperature(scale: TemperatureScale) -> Self {
        let name = match scale {
            TemperatureScale::Celsius => "Celsius",
            TemperatureScale::Fahrenheit => "Fahrenheit",
            TemperatureScale::Kelvin => "Kelvin",
        };
        UnitDefinition {
            name,
            kind: UnitKind::Temperature(scale),
        }
    }

    /// Scale factor relative to the base unit, if this is a linear unit
    pub fn factor(&self) -> Option<f64> {
        match self.kind {
            UnitKind::Linear(factor) => Some(factor),
            UnitKind::Temperature(_) => None,
        }
    }
}

// Length (base: meters)
const LENGTH_UNITS: &[UnitDefinition] = &[
    UnitDefinition::linear("Meter", 1.0),
    UnitDefinition::linear("Kilometer", 1000.0),
    UnitDefinition::linear("Centimeter", 0.01),
    UnitDefinition::linear("Inch", 0.0254),
    UnitDefinition::linear("Foot", 0.3048),
];

// Weight (base: kilograms)
const WEIGHT_UNITS: &[UnitDefinition] = &[
    UnitDefinition::linear("Kilogram", 1.0),
    UnitDefinition::linear("Gram", 0.001),
    UnitDefinition::linear("Pound", 0.453592),
    UnitDefinition::linear("Ounce", 0.0283495),
];

// Speed (base: m/s)
const SPEED_UNITS: &[UnitDefinition] = &[
    UnitDefinition::linear("m/s", 1.0),
    UnitDefinition::linear("km/h", 0.277778),
    UnitDefinition::linear("mph", 0.44704),
    UnitDefinition::linear("knot", 0.514444),
];

const TEMPERATURE_UNITS: &[UnitDefinition] = &[
    UnitDefinition::temperature(TemperatureScale::Celsius),
    UnitDefinition::temperature(TemperatureScale::Fahrenheit),
    UnitDefinition::temperature(TemperatureScale::Kelvin),
];

// Time (base: seconds)
const TIME_UNITS: &[UnitDefinition] = &[
    UnitDefinition::linear("Second", 1.0),
    UnitDefinition::linear("Minute", 60.0),
    UnitDefinition::linear("Hour", 3600.0),
    UnitDefinition::linear("Day", 86400.0),
];

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Length,
    Weight,
    Speed,
    Temperature,
    Time,
}

impl Category {
    /// Display order of the category tabs
    pub const ALL: [Category; 5] = [
        Category::Length,
        Category::Weight,
        Category::Speed,
        Category::Temperature,
        Category::Time,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Length => "Length",
            Category::Weight => "Weight",
            Category::Speed => "Speed",
            Category::Temperature => "Temperature",
            Category::Time => "Time",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Length => "📏",
            Category::Weight => "⚖️",
            Category::Speed => "🚀",
            Category::Temperature => "🌡️",
            Category::Time => "⏳",
        }
    }

    /// Tab label, e.g. "📏 Length"
    pub fn label(&self) -> String {
        format!("{} {}", self.icon(), self.name())
    }

    pub fn units(&self) -> &'static [UnitDefinition] {
        match self {
            Category::Length => LENGTH_UNITS,
            Category::Weight => WEIGHT_UNITS,
            Category::Speed => SPEED_UNITS,
            Category::Temperature => TEMPERATURE_UNITS,
            Category::Time => TIME_UNITS,
        }
    }

    pub fn unit_names(&self) -> Vec<&'static str> {
        self.units().iter().map(|u| u.name).collect()
    }

    pub fn is_temperature(&self) -> bool {
        matches!(self, Category::Temperature)
    }

    /// Parse a category name (case-insensitive); the icon-prefixed label is accepted too
    pub fn parse(text: &str) -> ConversionResult<Category> {
        let trimmed = text.trim();
        let bare = trimmed
            .rsplit_once(' ')
            .map(|(_, name)| name)
            .unwrap_or(trimmed);

        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| ConversionError::UnknownCategory(text.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s)
    }
}

// ============================================================================
// UNIT TABLE
// ============================================================================

/// Lookups over the static category/unit registry
pub struct UnitTable;

impl UnitTable {
    pub fn categories() -> &'static [Category] {
        Category::all()
    }

    /// Find a unit by name within a category.
    ///
    /// Exact names win; otherwise a case-insensitive match is accepted so that
    /// typed input ("kilometer") resolves to the listed unit ("Kilometer").
    pub fn unit(category: Category, name: &str) -> ConversionResult<&'static UnitDefinition> {
        let units = category.units();
        let name = name.trim();

        units
            .iter()
            .find(|u| u.name == name)
            .or_else(|| units.iter().find(|u| u.name.eq_ignore_ascii_case(name)))
            .ok_or_else(|| ConversionError::UnknownUnit {
                category: category.name().to_string(),
                unit: name.to_string(),
            })
    }

    /// Scale factor of a linear unit relative to its category's base unit
    pub fn factor_of(category: Category, unit: &str) -> ConversionResult<f64> {
        UnitTable::unit(category, unit)?
            .factor()
            .ok_or_else(|| ConversionError::NotLinear {
                category: category.name().to_string(),
            })
    }

    /// The unit whose factor is exactly 1 (None for Temperature)
    pub fn base_unit(category: Category) -> Option<&'static UnitDefinition> {
        category.units().iter().find(|u| u.factor() == Some(1.0))
    }
}
