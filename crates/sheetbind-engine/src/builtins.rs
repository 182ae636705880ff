//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Function names are matched case-insensitively and listed ALL CAPS.
//! - Range arguments arrive expanded (occupied cells only, row-major).
//! - `IF` is evaluated lazily by the evaluator and never reaches `call_builtin`.
//! - If you add a built-in, add it to `BUILTINS` and to the match in `call_builtin`.

use crate::engine::{EngineError, EngineResult, Value};

pub struct Builtin {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` means variadic.
    pub max_args: Option<usize>,
    /// One-line summary shown in `--help`.
    pub description: &'static str,
}

const fn builtin(
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    description: &'static str,
) -> Builtin {
    Builtin {
        name,
        min_args,
        max_args,
        description,
    }
}

pub const BUILTINS: &[Builtin] = &[
    builtin("SUM", 0, None, "Sum of numeric values"),
    builtin("AVERAGE", 1, None, "Average of numeric values"),
    builtin("AVG", 1, None, "Alias of AVERAGE"),
    builtin("MIN", 1, None, "Minimum numeric value"),
    builtin("MAX", 1, None, "Maximum numeric value"),
    builtin("COUNT", 0, None, "Count of numeric values"),
    builtin("ABS", 1, Some(1), "Absolute value"),
    builtin("ROUND", 1, Some(2), "Round to a number of decimals (default 0)"),
    builtin("FLOOR", 1, Some(1), "Round down to an integer"),
    builtin("CEIL", 1, Some(1), "Round up to an integer"),
    builtin("SQRT", 1, Some(1), "Square root"),
    builtin("POW", 2, Some(2), "Raise to a power"),
    builtin("MOD", 2, Some(2), "Remainder of a division"),
    builtin("PI", 0, Some(0), "The constant pi"),
    builtin("SIN", 1, Some(1), "Sine (radians)"),
    builtin("COS", 1, Some(1), "Cosine (radians)"),
    builtin("TAN", 1, Some(1), "Tangent (radians)"),
    builtin("IF", 2, Some(3), "Choose between two values"),
    builtin("AND", 1, None, "True if every argument is true"),
    builtin("OR", 1, None, "True if any argument is true"),
    builtin("NOT", 1, Some(1), "Logical negation"),
    builtin("CONCAT", 0, None, "Concatenate values as text"),
    builtin("LEN", 1, Some(1), "Length of a text value"),
    builtin("UPPER", 1, Some(1), "Upper-case text"),
    builtin("LOWER", 1, Some(1), "Lower-case text"),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

/// An evaluated function argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Scalar(Value),
    Range(Vec<Value>),
}

impl Arg {
    fn scalar(&self, func: &str) -> EngineResult<&Value> {
        match self {
            Arg::Scalar(v) => Ok(v),
            Arg::Range(_) => Err(EngineError::Evaluation(format!(
                "{} expects a single value, not a range",
                func
            ))),
        }
    }

    fn number(&self, func: &str) -> EngineResult<f64> {
        self.scalar(func)?.as_number()
    }
}

/// Numbers taken by aggregate functions: range cells that are not numeric are skipped,
/// scalar arguments must coerce.
fn numbers(args: &[Arg]) -> EngineResult<Vec<f64>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Arg::Scalar(v) => out.push(v.as_number()?),
            Arg::Range(values) => out.extend(values.iter().filter_map(|v| match v {
                Value::Number(n) => Some(*n),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            })),
        }
    }
    Ok(out)
}

fn booleans(args: &[Arg]) -> EngineResult<Vec<bool>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Arg::Scalar(v) => out.push(v.as_bool()?),
            Arg::Range(values) => {
                for v in values.iter().filter(|v| !matches!(v, Value::Text(_))) {
                    out.push(v.as_bool()?);
                }
            }
        }
    }
    Ok(out)
}

fn text_of(arg: &Arg, func: &str) -> EngineResult<String> {
    Ok(arg.scalar(func)?.to_string())
}

fn finite(func: &str, n: f64) -> EngineResult<Value> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(EngineError::Evaluation(format!("{} produced a non-finite result", func)))
    }
}

/// Call the built-in `name` with already evaluated arguments.
pub fn call_builtin(name: &str, args: &[Arg]) -> EngineResult<Value> {
    let builtin = lookup(name)
        .ok_or_else(|| EngineError::Evaluation(format!("unknown function {}", name)))?;
    let func = builtin.name;
    if args.len() < builtin.min_args || builtin.max_args.is_some_and(|max| args.len() > max) {
        return Err(EngineError::Evaluation(format!(
            "wrong number of arguments to {} ({})",
            func,
            args.len()
        )));
    }

    match func {
        "SUM" => Ok(Value::Number(numbers(args)?.iter().sum())),
        "AVERAGE" | "AVG" => {
            let values = numbers(args)?;
            if values.is_empty() {
                return Err(EngineError::Evaluation(format!("{} of no values", func)));
            }
            Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
        }
        "MIN" | "MAX" => {
            let values = numbers(args)?;
            let folded = if func == "MIN" {
                values.iter().copied().reduce(f64::min)
            } else {
                values.iter().copied().reduce(f64::max)
            };
            Ok(Value::Number(folded.unwrap_or(0.0)))
        }
        "COUNT" => Ok(Value::Number(numbers(args)?.len() as f64)),
        "ABS" => Ok(Value::Number(args[0].number(func)?.abs())),
        "ROUND" => {
            let x = args[0].number(func)?;
            let digits = match args.get(1) {
                Some(arg) => arg.number(func)?.trunc() as i32,
                None => 0,
            };
            let factor = 10f64.powi(digits);
            finite(func, (x * factor).round() / factor)
        }
        "FLOOR" => Ok(Value::Number(args[0].number(func)?.floor())),
        "CEIL" => Ok(Value::Number(args[0].number(func)?.ceil())),
        "SQRT" => {
            let x = args[0].number(func)?;
            if x < 0.0 {
                return Err(EngineError::Evaluation("SQRT of a negative number".to_string()));
            }
            Ok(Value::Number(x.sqrt()))
        }
        "POW" => finite(func, args[0].number(func)?.powf(args[1].number(func)?)),
        "MOD" => {
            let divisor = args[1].number(func)?;
            if divisor == 0.0 {
                return Err(EngineError::Evaluation("MOD by zero".to_string()));
            }
            Ok(Value::Number(args[0].number(func)?.rem_euclid(divisor)))
        }
        "PI" => Ok(Value::Number(std::f64::consts::PI)),
        "SIN" => Ok(Value::Number(args[0].number(func)?.sin())),
        "COS" => Ok(Value::Number(args[0].number(func)?.cos())),
        "TAN" => finite(func, args[0].number(func)?.tan()),
        "AND" => Ok(Value::Bool(booleans(args)?.iter().all(|b| *b))),
        "OR" => Ok(Value::Bool(booleans(args)?.iter().any(|b| *b))),
        "NOT" => Ok(Value::Bool(!args[0].scalar(func)?.as_bool()?)),
        "CONCAT" => {
            let mut out = String::new();
            for arg in args {
                match arg {
                    Arg::Scalar(v) => out.push_str(&v.to_string()),
                    Arg::Range(values) => values.iter().for_each(|v| out.push_str(&v.to_string())),
                }
            }
            Ok(Value::Text(out))
        }
        "LEN" => Ok(Value::Number(text_of(&args[0], func)?.chars().count() as f64)),
        "UPPER" => Ok(Value::Text(text_of(&args[0], func)?.to_uppercase())),
        "LOWER" => Ok(Value::Text(text_of(&args[0], func)?.to_lowercase())),
        other => Err(EngineError::Evaluation(format!(
            "{} must be evaluated by the interpreter",
            other
        ))),
    }
}
