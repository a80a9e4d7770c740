//! Typed construction calculations.

use std::f64::consts::PI;

use tracing::debug;

use crate::conversion;
use crate::error::CalculationError;
use crate::request::{Calculation, CalculationRequest, CalculationType, Values};

/// Evaluate a calculation request.
///
/// Deterministic and pure. Every failure is a [`CalculationError`]; no input
/// makes this panic.
pub fn calculate(request: &CalculationRequest) -> Result<Calculation, CalculationError> {
    debug!(
        calculation = %request.calculation_type,
        values = ?request.values,
        "Evaluating calculation"
    );

    let values = &request.values;
    let (result, explanation, unit) = match request.calculation_type {
        CalculationType::Area => area(values)?,
        CalculationType::Volume => volume(values)?,
        CalculationType::Linear => linear(values)?,
        CalculationType::Weight => weight(values)?,
        CalculationType::Conversion => convert(
            values,
            request.unit_from.as_deref(),
            request.unit_to.as_deref(),
        )?,
        CalculationType::Custom => custom(values, request.formula.as_deref())?,
    };

    if !result.is_finite() {
        return Err(CalculationError::NonFinite);
    }

    Ok(Calculation {
        result,
        explanation,
        calculation_type: request.calculation_type,
        values: values.clone(),
        unit,
    })
}

type Outcome = Result<(f64, String, Option<String>), CalculationError>;

fn get(values: &Values, name: &str) -> Option<f64> {
    values.get(name).copied()
}

fn missing(calculation: CalculationType, expected: &'static str) -> CalculationError {
    CalculationError::MissingValues {
        calculation,
        expected,
    }
}

fn area(values: &Values) -> Outcome {
    if let (Some(length), Some(width)) = (get(values, "length"), get(values, "width")) {
        let result = length * width;
        return Ok((
            result,
            format!(
                "Area = length × width = {} × {} = {}",
                format_number(length),
                format_number(width),
                format_number(result)
            ),
            None,
        ));
    }

    if let Some(radius) = get(values, "radius") {
        let result = PI * radius * radius;
        return Ok((
            result,
            format!(
                "Area = π × radius² = π × {}² = {}",
                format_number(radius),
                format_number(result)
            ),
            None,
        ));
    }

    Err(missing(CalculationType::Area, "length and width, or radius"))
}

fn volume(values: &Values) -> Outcome {
    if let (Some(length), Some(width), Some(height)) = (
        get(values, "length"),
        get(values, "width"),
        get(values, "height"),
    ) {
        let result = length * width * height;
        return Ok((
            result,
            format!(
                "Volume = length × width × height = {} × {} × {} = {}",
                format_number(length),
                format_number(width),
                format_number(height),
                format_number(result)
            ),
            None,
        ));
    }

    if let (Some(area), Some(depth)) = (get(values, "area"), get(values, "depth")) {
        let result = area * depth;
        return Ok((
            result,
            format!(
                "Volume = area × depth = {} × {} = {}",
                format_number(area),
                format_number(depth),
                format_number(result)
            ),
            None,
        ));
    }

    Err(missing(
        CalculationType::Volume,
        "length, width and height, or area and depth",
    ))
}

fn linear(values: &Values) -> Outcome {
    match (get(values, "quantity"), get(values, "unit_length")) {
        (Some(quantity), Some(unit_length)) => {
            let result = quantity * unit_length;
            Ok((
                result,
                format!(
                    "Linear = quantity × unit_length = {} × {} = {}",
                    format_number(quantity),
                    format_number(unit_length),
                    format_number(result)
                ),
                None,
            ))
        }
        _ => Err(missing(CalculationType::Linear, "quantity and unit_length")),
    }
}

fn weight(values: &Values) -> Outcome {
    if let (Some(volume), Some(density)) = (get(values, "volume"), get(values, "density")) {
        let result = volume * density;
        return Ok((
            result,
            format!(
                "Weight = volume × density = {} × {} = {}",
                format_number(volume),
                format_number(density),
                format_number(result)
            ),
            None,
        ));
    }

    if let (Some(quantity), Some(unit_weight)) =
        (get(values, "quantity"), get(values, "unit_weight"))
    {
        let result = quantity * unit_weight;
        return Ok((
            result,
            format!(
                "Weight = quantity × unit_weight = {} × {} = {}",
                format_number(quantity),
                format_number(unit_weight),
                format_number(result)
            ),
            None,
        ));
    }

    Err(missing(
        CalculationType::Weight,
        "volume and density, or quantity and unit_weight",
    ))
}

fn convert(values: &Values, from: Option<&str>, to: Option<&str>) -> Outcome {
    let (Some(from), Some(to)) = (from, to) else {
        return Err(CalculationError::MissingUnits);
    };
    let value = get(values, "value").ok_or_else(|| missing(CalculationType::Conversion, "value"))?;

    let conversion =
        conversion::lookup(from, to).ok_or_else(|| CalculationError::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        })?;

    let result = value * conversion.factor;
    debug!(category = conversion.category, factor = conversion.factor, "Resolved conversion");

    Ok((
        result,
        format!(
            "{} {} × {} = {} {}",
            format_number(value),
            from,
            format_number(conversion.factor),
            format_number(result),
            to
        ),
        Some(to.to_string()),
    ))
}

/// Evaluate an arithmetic formula with `values` bound as variables.
///
/// Names are bound, never spliced into the text, so `w` and `width` are
/// distinct variables.
fn custom(values: &Values, formula: Option<&str>) -> Outcome {
    let formula = formula
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(CalculationError::MissingFormula)?;

    let invalid = |reason: String| CalculationError::InvalidFormula {
        formula: formula.to_string(),
        reason,
    };

    let expr: meval::Expr = formula.parse().map_err(|e: meval::Error| invalid(e.to_string()))?;

    let mut context = meval::Context::new();
    for (name, value) in values {
        context.var(name.as_str(), *value);
    }

    let result = expr
        .eval_with_context(context)
        .map_err(|e| invalid(e.to_string()))?;

    let bindings = values
        .iter()
        .map(|(name, value)| format!("{} = {}", name, format_number(*value)))
        .collect::<Vec<_>>()
        .join(", ");
    let explanation = if bindings.is_empty() {
        format!("{} = {}", formula, format_number(result))
    } else {
        format!("{} where {} = {}", formula, bindings, format_number(result))
    };

    Ok((result, explanation, None))
}

/// Format a number for explanations: integers without decimals, others
/// trimmed to at most four places.
pub fn format_number(value: f64) -> String {
    if value != 0.0 && (value.abs() < 0.0001 || value.abs() >= 1e12) {
        format!("{:.4e}", value)
    } else if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else if value.abs() < 1.0 {
        format!("{:.6}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        format!("{:.4}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
