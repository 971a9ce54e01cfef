// 🔄 Conversion Engine - converts a value between two units of one category
//
// Linear categories go through the base unit:
//   result = value * factor(from) / factor(to)
// Temperature delegates to the pairwise formula table in `units`.

use crate::error::{ConversionError, ConversionResult};
use crate::units::{Category, UnitKind, UnitTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Convert `value` from `from_unit` to `to_unit` within `category`.
///
/// Returns the full-precision result; rounding is a display concern.
pub fn convert(category: Category, value: f64, from_unit: &str, to_unit: &str) -> ConversionResult<f64> {
    let from = UnitTable::unit(category, from_unit)?;
    let to = UnitTable::unit(category, to_unit)?;

    match (from.kind, to.kind) {
        (UnitKind::Temperature(from_scale), UnitKind::Temperature(to_scale)) => {
            Ok(from_scale.convert_to(to_scale, value))
        }
        (UnitKind::Linear(_), UnitKind::Linear(_)) if from.name == to.name => Ok(value),
        (UnitKind::Linear(from_factor), UnitKind::Linear(to_factor)) => {
            Ok(value * (from_factor / to_factor))
        }
        // Categories never mix kinds, the table guarantees this
        _ => Err(ConversionError::NotLinear {
            category: category.name().to_string(),
        }),
    }
}

/// Display form used by the result box and the history log.
///
/// The input keeps its decimal point ("1000.0 Meter"), the result is rounded to 2 places.
pub fn format_conversion(value: f64, from_unit: &str, result: f64, to_unit: &str) -> String {
    format!("{:?} {} = {:.2} {}", value, from_unit, result, to_unit)
}

// ============================================================================
// CONVERSION REQUEST
// ============================================================================

/// A conversion as collected by a front end (tab, two selects, one number)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub category: Category,
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
}

impl ConversionRequest {
    pub fn new(category: Category, value: f64, from_unit: impl Into<String>, to_unit: impl Into<String>) -> Self {
        ConversionRequest {
            category,
            value,
            from_unit: from_unit.into(),
            to_unit: to_unit.into(),
        }
    }

    /// Input rules of the number field: finite and non-negative
    pub fn validate(&self) -> ConversionResult<()> {
        if !self.value.is_finite() {
            return Err(ConversionError::NonFiniteValue);
        }
        if self.value < 0.0 {
            return Err(ConversionError::NegativeValue(self.value));
        }
        Ok(())
    }
}

// ============================================================================
// CONVERSION RECORD
// ============================================================================

/// One successful conversion. Lives in a session's history, never on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub category: Category,
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,

    /// Full precision result
    pub result: f64,

    /// "{value} {from} = {result:.2} {to}"
    pub formatted: String,

    pub created_at: DateTime<Utc>,
}

impl From<ConversionRecord> for String {
    fn from(record: ConversionRecord) -> Self {
        record.formatted
    }
}

impl From<&ConversionRecord> for String {
    fn from(record: &ConversionRecord) -> Self {
        record.formatted.clone()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct ConversionEngine;

impl ConversionEngine {
    /// Validate, convert and build the record for a request
    pub fn run(request: &ConversionRequest) -> ConversionResult<ConversionRecord> {
        request.validate()?;

        // Canonical unit names, so "kilometer" is displayed as "Kilometer"
        let from_unit = UnitTable::unit(request.category, &request.from_unit)?.name;
        let to_unit = UnitTable::unit(request.category, &request.to_unit)?.name;

        let result = convert(request.category, request.value, from_unit, to_unit)?;
        let formatted = format_conversion(request.value, from_unit, result, to_unit);

        debug!(category = %request.category, %formatted, "conversion");

        Ok(ConversionRecord {
            category: request.category,
            value: request.value,
            from_unit: from_unit.to_string(),
            to_unit: to_unit.to_string(),
            result,
            formatted,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPSILON * b.abs().max(1.0)
    }

    #[test]
    fn test_concrete_cases() {
        let km = convert(Category::Length, 1000.0, "Meter", "Kilometer").unwrap();
        assert_eq!(format!("{:.2}", km), "1.00");

        let f = convert(Category::Temperature, 0.0, "Celsius", "Fahrenheit").unwrap();
        assert_eq!(format!("{:.2}", f), "32.00");

        let k = convert(Category::Temperature, 100.0, "Celsius", "Kelvin").unwrap();
        assert_eq!(format!("{:.2}", k), "373.15");

        let h = convert(Category::Time, 60.0, "Minute", "Hour").unwrap();
        assert_eq!(format!("{:.2}", h), "1.00");
    }

    #[test]
    fn test_linear_round_trip() {
        for category in Category::all().iter().filter(|c| !c.is_temperature()) {
            for a in category.units() {
                for b in category.units() {
                    for v in [0.0, 1.0, 12.5, 1234.567] {
                        let there = convert(*category, v, a.name, b.name).unwrap();
                        let back = convert(*category, there, b.name, a.name).unwrap();
                        assert!(approx(back, v), "{} {} -> {} -> {}", v, a.name, b.name, back);
                    }
                }
            }
        }
    }

    #[test]
    fn test_temperature_round_trip() {
        let pairs = [
            ("Celsius", "Fahrenheit"),
            ("Celsius", "Kelvin"),
            ("Fahrenheit", "Kelvin"),
        ];
        for (a, b) in pairs {
            for v in [0.0, 37.0, 100.0, 451.0] {
                let there = convert(Category::Temperature, v, a, b).unwrap();
                let back = convert(Category::Temperature, there, b, a).unwrap();
                assert!(approx(back, v), "{} {} -> {} -> {}", v, a, b, back);
            }
        }
    }

    #[test]
    fn test_identity_for_every_unit() {
        for category in Category::all() {
            for unit in category.units() {
                assert_eq!(convert(*category, 42.25, unit.name, unit.name).unwrap(), 42.25);
            }
        }
    }

    #[test]
    fn test_result_keeps_full_precision() {
        let inches = convert(Category::Length, 1.0, "Meter", "Inch").unwrap();
        assert!(approx(inches, 1.0 / 0.0254));
        assert_ne!(inches, 39.37);
    }

    #[test]
    fn test_unknown_unit_is_error() {
        assert!(matches!(
            convert(Category::Speed, 1.0, "m/s", "Meter"),
            Err(ConversionError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn test_engine_run_formats_record() {
        let request = ConversionRequest::new(Category::Length, 1000.0, "meter", "Kilometer");
        let record = ConversionEngine::run(&request).unwrap();

        assert_eq!(record.from_unit, "Meter");
        assert_eq!(record.formatted, "1000.0 Meter = 1.00 Kilometer");
        assert!(approx(record.result, 1.0));
        assert_eq!(String::from(record), "1000.0 Meter = 1.00 Kilometer");
    }

    #[test]
    fn test_format_keeps_input_decimal_point() {
        assert_eq!(format_conversion(60.0, "Minute", 1.0, "Hour"), "60.0 Minute = 1.00 Hour");
        assert_eq!(format_conversion(12.5, "Meter", 0.0125, "Kilometer"), "12.5 Meter = 0.01 Kilometer");
    }

    #[test]
    fn test_engine_rejects_negative_and_nan() {
        let negative = ConversionRequest::new(Category::Time, -1.0, "Second", "Minute");
        assert_eq!(
            ConversionEngine::run(&negative).unwrap_err(),
            ConversionError::NegativeValue(-1.0)
        );

        let nan = ConversionRequest::new(Category::Time, f64::NAN, "Second", "Minute");
        assert_eq!(ConversionEngine::run(&nan).unwrap_err(), ConversionError::NonFiniteValue);
    }
}
