//! Construction quantity calculations.
//!
//! [`calculate`] evaluates a typed [`CalculationRequest`]: rectangular and
//! circular areas, volumes, linear runs, weights, unit conversions through a
//! fixed factor table, and custom arithmetic formulas evaluated with `meval`
//! over named variables.
//!
//! # Example
//!
//! ```rust
//! use calculator::{calculate, CalculationRequest, CalculationType};
//!
//! let request = CalculationRequest::new(CalculationType::Area)
//!     .value("length", 4.0)
//!     .value("width", 5.0);
//! let calc = calculate(&request).unwrap();
//! assert_eq!(calc.result, 20.0);
//! ```

pub mod conversion;
mod engine;
mod error;
mod request;

pub use engine::{calculate, format_number};
pub use error::CalculationError;
pub use request::{Calculation, CalculationRequest, CalculationType, Values};
