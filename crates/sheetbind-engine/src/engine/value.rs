//! Runtime values produced by literals and expression evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{EngineError, EngineResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Interpret literal cell input.
    /// - Empty string or whitespace -> Empty
    /// - Leading `'` -> Text (without the quote)
    /// - Valid number -> Number
    /// - `TRUE` / `FALSE` (any case) -> Bool
    /// - Otherwise -> Text
    pub fn from_input(input: &str) -> Value {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }
        if let Some(text) = input.trim_start().strip_prefix('\'') {
            return Value::Text(text.to_string());
        }
        if trimmed.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return Value::Number(n);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::Text(input.to_string())
    }

    /// Text that `from_input` maps back to this value.
    pub fn to_input(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Value::Text(s) => {
                if Value::from_input(s) == Value::Text(s.clone()) && !s.starts_with('\'') {
                    s.clone()
                } else {
                    format!("'{}", s)
                }
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view used by arithmetic: booleans count as 0/1 and empty as 0.
    pub fn as_number(&self) -> EngineResult<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Ok(0.0),
            Value::Text(s) => Err(EngineError::Evaluation(format!(
                "expected a number, found text \"{}\"",
                s
            ))),
        }
    }

    pub fn as_bool(&self) -> EngineResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Empty => Ok(false),
            Value::Text(s) => Err(EngineError::Evaluation(format!(
                "expected a boolean, found text \"{}\"",
                s
            ))),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) if n.is_nan() => write!(f, "#NAN!"),
            Value::Number(n) if n.is_infinite() => write!(f, "#INF!"),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Format a value for display, rounding numbers to `precision` digits when given.
pub fn format_value(value: &Value, precision: Option<usize>) -> String {
    match (value, precision) {
        (Value::Number(n), _) if !n.is_finite() => value.to_string(),
        (Value::Number(n), Some(digits)) => format_number(*n, digits),
        _ => value.to_string(),
    }
}

/// Format a number with at most `digits` decimals, without trailing zeros.
pub fn format_number(n: f64, digits: usize) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{:.0}", n);
    }
    let text = format!("{:.*}", digits, n);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
