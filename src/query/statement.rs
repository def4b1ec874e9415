//! Statement text and parameter preparation.
//!
//! This module provides the `Parameter` type used for bindings and the
//! normalization applied to statements and bindings before they are
//! submitted to the server.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest scale representable by an `i128` mantissa.
const MAX_DECIMAL_SCALE: u32 = 38;

/// Exact decimal number: `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

/// Error parsing a decimal literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid decimal literal '{0}'")]
pub struct ParseDecimalError(String);

impl Decimal {
    /// Create a decimal from its unscaled value and scale.
    ///
    /// Returns `None` if the scale exceeds 38 digits.
    pub fn new(mantissa: i128, scale: u32) -> Option<Self> {
        (scale <= MAX_DECIMAL_SCALE).then_some(Self { mantissa, scale })
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Nearest `f64` to this decimal.
    pub fn to_f64(&self) -> f64 {
        // Parsing the exact text gives a correctly rounded result
        self.to_string()
            .parse()
            .unwrap_or_else(|_| self.mantissa as f64 / 10f64.powi(self.scale as i32))
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let text = s.trim();

        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integer.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let scale = fraction.len() as u32;
        if scale > MAX_DECIMAL_SCALE {
            return Err(invalid());
        }

        let digits = format!("{}{}", integer, fraction);
        let magnitude: i128 = digits.parse().map_err(|_| invalid())?;

        Ok(Self {
            mantissa: if negative { -magnitude } else { magnitude },
            scale,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let magnitude = self.mantissa.unsigned_abs();

        if self.scale == 0 {
            return write!(f, "{}{}", sign, magnitude);
        }

        let divisor = 10u128.pow(self.scale);
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            magnitude / divisor,
            magnitude % divisor,
            width = self.scale as usize
        )
    }
}

/// Binding value for a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// NULL value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Exact decimal value
    Decimal(Decimal),
    /// String value
    String(String),
    /// Binary data
    Binary(Vec<u8>),
}

impl From<bool> for Parameter {
    fn from(value: bool) -> Self {
        Parameter::Boolean(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Integer(value as i64)
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Integer(value)
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Float(value)
    }
}

impl From<Decimal> for Parameter {
    fn from(value: Decimal) -> Self {
        Parameter::Decimal(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::String(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::String(value)
    }
}

impl From<Vec<u8>> for Parameter {
    fn from(value: Vec<u8>) -> Self {
        Parameter::Binary(value)
    }
}

impl<T: Into<Parameter>> From<Option<T>> for Parameter {
    fn from(value: Option<T>) -> Self {
        value.map_or(Parameter::Null, Into::into)
    }
}

/// Remove one trailing `;` from a statement.
///
/// The server rejects terminated statements. When a terminator is present the
/// statement is trimmed first and exactly one `;` is removed; otherwise the
/// text is left as is.
pub fn prepare_statement(sql: &str) -> String {
    let trimmed = sql.trim();
    match trimmed.strip_suffix(';') {
        Some(stripped) => stripped.to_string(),
        None => sql.to_string(),
    }
}

/// Convert bindings into values the session can bind.
///
/// Decimals become floats because the session cannot bind exact decimals;
/// every other value passes through unchanged, in order.
pub fn normalize_bindings(bindings: &[Parameter]) -> Vec<Parameter> {
    bindings
        .iter()
        .map(|binding| match binding {
            Parameter::Decimal(d) => Parameter::Float(d.to_f64()),
            other => other.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_statement_strips_one_terminator() {
        assert_eq!(prepare_statement(" select 1 ; "), "select 1 ");
        assert_eq!(prepare_statement("select 1;;"), "select 1;");
        assert_eq!(prepare_statement("select 1;"), "select 1");
    }

    #[test]
    fn test_prepare_statement_without_terminator() {
        assert_eq!(prepare_statement("select 1"), "select 1");
        assert_eq!(prepare_statement("  select 1\n"), "  select 1\n");
    }

    #[test]
    fn test_normalize_bindings() {
        let bindings = vec![
            Parameter::Decimal("1.5".parse().unwrap()),
            Parameter::from("x"),
            Parameter::from(3i64),
        ];

        assert_eq!(
            normalize_bindings(&bindings),
            vec![
                Parameter::Float(1.5),
                Parameter::String("x".to_string()),
                Parameter::Integer(3),
            ]
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_bindings(&[]).is_empty());
    }

    #[test]
    fn test_decimal_parse_and_display() {
        let d: Decimal = "-0.05".parse().unwrap();
        assert_eq!(d.mantissa(), -5);
        assert_eq!(d.scale(), 2);
        assert_eq!(d.to_string(), "-0.05");

        assert_eq!("42".parse::<Decimal>().unwrap().to_string(), "42");
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.5");
        assert_eq!("+12.340".parse::<Decimal>().unwrap().to_string(), "12.340");
    }

    #[test]
    fn test_decimal_parse_errors() {
        assert!("".parse::<Decimal>().is_err());
        assert!(".".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("1e5".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_decimal_to_f64() {
        assert_eq!("1.5".parse::<Decimal>().unwrap().to_f64(), 1.5);
        assert_eq!("-2.25".parse::<Decimal>().unwrap().to_f64(), -2.25);
        assert_eq!(Decimal::new(1, 1).unwrap().to_f64(), 0.1);
        assert!(Decimal::new(1, 39).is_none());
    }

    #[test]
    fn test_parameter_conversions() {
        assert_eq!(Parameter::from(true), Parameter::Boolean(true));
        assert_eq!(Parameter::from(42i64), Parameter::Integer(42));
        assert_eq!(Parameter::from(None::<i64>), Parameter::Null);
        assert_eq!(Parameter::from(vec![1u8, 2]), Parameter::Binary(vec![1, 2]));
    }
}
