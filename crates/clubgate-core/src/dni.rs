//! DNI (national identity document) normalization.
//!
//! A DNI is the canonical key of a member. Input arrives in many shapes
//! (`"12.345.678"`, `"12-345-678"`, `12345678` as a spreadsheet number) and
//! must collapse to the same key before it is compared or stored.

use crate::{Result, constants::DNI_SEPARATORS, error::Error};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Normalize a raw field value into a canonical DNI key.
///
/// Strings and numbers are rendered to text and stripped of separators
/// (`.`, `-` and whitespace). Anything else (null, booleans, arrays,
/// objects, absent values) yields an empty string.
///
/// # Examples
///
/// ```
/// use clubgate_core::dni::normalize;
/// use serde_json::json;
///
/// assert_eq!(normalize(&json!("12.345.678")), "12345678");
/// assert_eq!(normalize(&json!(12345678)), "12345678");
/// assert_eq!(normalize(&json!(null)), "");
/// ```
pub fn normalize(raw: &Value) -> String {
    match raw {
        Value::String(s) => normalize_str(s),
        Value::Number(n) => normalize_str(&number_text(n)),
        _ => String::new(),
    }
}

/// Strip DNI separators from text.
///
/// Idempotent: `normalize_str(&normalize_str(x)) == normalize_str(x)`.
pub fn normalize_str(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !DNI_SEPARATORS.contains(c))
        .collect()
}

/// Render a JSON number the way a spreadsheet cell shows it.
///
/// Integral floats (`12345678.0`) print without the fractional part so the
/// decimal point is not mistaken for a separator.
pub(crate) fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// A validated, normalized DNI.
///
/// Construction normalizes the input and rejects values that are empty
/// once separators are removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dni(String);

impl Dni {
    /// Create a DNI from text.
    ///
    /// # Errors
    /// Returns `Error::InvalidDni` if nothing remains after normalization.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = normalize_str(raw);
        if normalized.is_empty() {
            return Err(Error::InvalidDni(format!(
                "'{raw}' is empty after removing separators"
            )));
        }
        Ok(Dni(normalized))
    }

    /// Get the DNI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the normalized key.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Dni {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Dni {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Dni::new(s)
    }
}

impl AsRef<str> for Dni {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("12345678"), "12345678")]
    #[case(json!("12.345.678"), "12345678")]
    #[case(json!("12-345-678"), "12345678")]
    #[case(json!(" 12 345 678 "), "12345678")]
    #[case(json!("12.345-678\t"), "12345678")]
    #[case(json!(12345678), "12345678")]
    #[case(json!(12345678.0), "12345678")]
    #[case(json!(-5), "5")]
    fn test_normalize_values(#[case] input: Value, #[case] expected: &str) {
        assert_eq!(normalize(&input), expected);
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!(true))]
    #[case(json!([1, 2]))]
    #[case(json!({"dni": "1"}))]
    #[case(json!(""))]
    #[case(json!(" . - "))]
    fn test_normalize_yields_empty(#[case] input: Value) {
        assert_eq!(normalize(&input), "");
    }

    #[test]
    fn test_dni_new() {
        let dni = Dni::new("30.123.456").unwrap();
        assert_eq!(dni.as_str(), "30123456");
        assert_eq!(dni.to_string(), "30123456");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("..--")]
    fn test_dni_invalid(#[case] input: &str) {
        let result: Result<Dni> = input.parse();
        assert!(matches!(result, Err(Error::InvalidDni(_))));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in ".*") {
            let once = normalize_str(&raw);
            prop_assert_eq!(normalize_str(&once), once.clone());
        }

        #[test]
        fn prop_normalized_has_no_separators(raw in "[0-9 .\\-]{0,24}") {
            let normalized = normalize_str(&raw);
            prop_assert!(normalized.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn prop_integers_roundtrip(n in 0u64..100_000_000_000u64) {
            prop_assert_eq!(normalize(&json!(n)), n.to_string());
        }
    }
}
