//! Parsing of user-supplied production rates

use regex::Regex;

use crate::error::{CalcError, Result};

/// Parse a rate such as `120`, `120/min`, `2/s` or `7200/h` into units per
/// minute. Bare numbers are already per minute.
pub fn parse_rate(text: &str) -> Result<f64> {
    let rate_re = Regex::new(
        r"^\s*(\d+(?:\.\d*)?|\.\d+)(?:[eE]([+-]?\d+))?\s*(?:/\s*(s|sec|m|min|h|hr)\s*)?$",
    )?;
    let cap = rate_re
        .captures(text)
        .ok_or_else(|| CalcError::InvalidInput(format!("unrecognised rate '{text}'")))?;

    let mut value: f64 = cap[1]
        .parse()
        .map_err(|_| CalcError::InvalidInput(format!("unrecognised rate '{text}'")))?;
    if let Some(exp) = cap.get(2) {
        let exp: i32 = exp
            .as_str()
            .parse()
            .map_err(|_| CalcError::InvalidInput(format!("unrecognised rate '{text}'")))?;
        value *= 10f64.powi(exp);
    }

    let per_minute = match cap.get(3).map(|unit| unit.as_str()) {
        Some("s" | "sec") => value * 60.0,
        Some("h" | "hr") => value / 60.0,
        _ => value,
    };

    if !per_minute.is_finite() || per_minute <= 0.0 {
        return Err(CalcError::InvalidInput(format!(
            "rate must be positive, got '{text}'"
        )));
    }
    Ok(per_minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_normalised_to_per_minute() {
        assert_eq!(parse_rate("120").unwrap(), 120.0);
        assert_eq!(parse_rate("120/min").unwrap(), 120.0);
        assert_eq!(parse_rate(" 2 / s ").unwrap(), 120.0);
        assert_eq!(parse_rate("7200/h").unwrap(), 120.0);
        assert_eq!(parse_rate("0.5/sec").unwrap(), 30.0);
        assert_eq!(parse_rate("1.5e2").unwrap(), 150.0);
    }

    #[test]
    fn rejects_garbage_and_non_positive_rates() {
        for text in ["", "fast", "-5", "0", "0/min", "12/day", "1e400"] {
            assert!(
                matches!(parse_rate(text), Err(CalcError::InvalidInput(_))),
                "accepted {text:?}"
            );
        }
    }
}
