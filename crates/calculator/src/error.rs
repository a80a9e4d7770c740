//! Error types for calculations.

use thiserror::Error;

use crate::request::CalculationType;

/// A calculation that could not be performed.
///
/// The `Display` text is what tool callers and API clients see.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    /// The inputs required by the calculation type are absent.
    #[error("missing required values for {calculation} calculation: provide {expected}")]
    MissingValues {
        calculation: CalculationType,
        expected: &'static str,
    },

    /// Conversion without both units.
    #[error("conversion requires unit_from and unit_to")]
    MissingUnits,

    /// No factor is known for this pair of units.
    #[error("unsupported conversion: {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Custom calculation without a formula.
    #[error("custom calculation requires a formula")]
    MissingFormula,

    /// The formula failed to parse or referenced an unknown name.
    #[error("invalid formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    /// Division by zero, overflow and similar.
    #[error("calculation produced a non-finite result")]
    NonFinite,

    #[error("unknown calculation type: {0}")]
    UnknownType(String),
}
