//! Calculation inputs and outputs.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CalculationError;

/// Named input values, in the order the caller supplied them.
pub type Values = IndexMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    Area,
    Volume,
    Linear,
    Weight,
    Conversion,
    Custom,
}

impl CalculationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationType::Area => "area",
            CalculationType::Volume => "volume",
            CalculationType::Linear => "linear",
            CalculationType::Weight => "weight",
            CalculationType::Conversion => "conversion",
            CalculationType::Custom => "custom",
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationType {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "area" => Ok(CalculationType::Area),
            "volume" => Ok(CalculationType::Volume),
            "linear" => Ok(CalculationType::Linear),
            "weight" => Ok(CalculationType::Weight),
            "conversion" => Ok(CalculationType::Conversion),
            "custom" => Ok(CalculationType::Custom),
            other => Err(CalculationError::UnknownType(other.to_string())),
        }
    }
}

/// A typed calculation request.
///
/// Deserializes from the `calculate_quantity` tool arguments. Numeric strings
/// in `values` are accepted ("4.5" reads as 4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub calculation_type: CalculationType,
    #[serde(default, deserialize_with = "lenient_values")]
    pub values: Values,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_to: Option<String>,
}

impl CalculationRequest {
    pub fn new(calculation_type: CalculationType) -> Self {
        Self {
            calculation_type,
            values: Values::new(),
            formula: None,
            unit_from: None,
            unit_to: None,
        }
    }

    pub fn value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn units(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.unit_from = Some(from.into());
        self.unit_to = Some(to.into());
        self
    }
}

/// A successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub result: f64,
    /// The arithmetic performed, e.g. `Area = length × width = 4 × 5 = 20`.
    pub explanation: String,
    pub calculation_type: CalculationType,
    pub values: Values,
    /// Unit of `result`, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

fn lenient_values<'de, D>(deserializer: D) -> Result<Values, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: IndexMap<String, Value> = IndexMap::deserialize(deserializer)?;
    let mut values = Values::with_capacity(raw.len());

    for (name, value) in raw {
        let number = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let number = number.ok_or_else(|| {
            serde::de::Error::custom(format!("value '{}' is not a number: {}", name, value))
        })?;
        values.insert(name, number);
    }

    Ok(values)
}
