//! Expression evaluation.
//!
//! The evaluator walks an [`Expr`] and asks a [`Resolver`] for the value of every reference
//! it meets. It never looks at documents itself; the workspace implements the resolver
//! on top of its cached node values.

use std::cmp::Ordering;

use super::address::CellRange;
use super::ast::{BinaryOp, Expr, RefTarget, Reference, UnaryOp};
use super::error::{EngineError, EngineResult};
use super::value::Value;
use crate::builtins::{Arg, call_builtin};

/// Source of reference values during evaluation.
pub trait Resolver {
    /// Value of a cell, alias or property reference.
    fn value(&self, reference: &Reference) -> EngineResult<Value>;

    /// Values of the occupied cells of a range reference, row-major.
    fn range_values(&self, reference: &Reference, range: CellRange) -> EngineResult<Vec<Value>>;
}

/// Evaluate `expr` against `resolver`.
pub fn evaluate<R: Resolver + ?Sized>(expr: &Expr, resolver: &R) -> EngineResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::RefError => Err(EngineError::UnresolvedReference("#REF!".to_string())),
        Expr::Reference(reference) => match reference.target {
            RefTarget::Range(range) if range.len() == 1 => {
                Ok(resolver
                    .range_values(reference, range)?
                    .into_iter()
                    .next()
                    .unwrap_or_default())
            }
            RefTarget::Range(_) => Err(EngineError::Evaluation(format!(
                "range {} used as a single value",
                reference
            ))),
            _ => resolver.value(reference),
        },
        Expr::Group(inner) => evaluate(inner, resolver),
        Expr::Unary { op, expr } => {
            let n = evaluate(expr, resolver)?.as_number()?;
            Ok(Value::Number(match op {
                UnaryOp::Neg => -n,
                UnaryOp::Plus => n,
            }))
        }
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, resolver)?;
            let r = evaluate(right, resolver)?;
            binary(*op, &l, &r)
        }
        Expr::Call { name, args } if name.eq_ignore_ascii_case("IF") => {
            if !(2..=3).contains(&args.len()) {
                return Err(EngineError::Evaluation(format!(
                    "wrong number of arguments to IF ({})",
                    args.len()
                )));
            }
            if evaluate(&args[0], resolver)?.as_bool()? {
                evaluate(&args[1], resolver)
            } else if let Some(otherwise) = args.get(2) {
                evaluate(otherwise, resolver)
            } else {
                Ok(Value::Bool(false))
            }
        }
        Expr::Call { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(argument(arg, resolver)?);
            }
            call_builtin(name, &values)
        }
    }
}

fn argument<R: Resolver + ?Sized>(arg: &Expr, resolver: &R) -> EngineResult<Arg> {
    match arg {
        Expr::Reference(
            reference @ Reference {
                target: RefTarget::Range(range),
                ..
            },
        ) => Ok(Arg::Range(resolver.range_values(reference, *range)?)),
        _ => Ok(Arg::Scalar(evaluate(arg, resolver)?)),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> EngineResult<Value> {
    match op {
        BinaryOp::Concat => Ok(Value::Text(format!("{}{}", l, r))),
        BinaryOp::Eq => Ok(Value::Bool(compare(l, r)? == Ordering::Equal)),
        BinaryOp::Ne => Ok(Value::Bool(compare(l, r)? != Ordering::Equal)),
        BinaryOp::Lt => Ok(Value::Bool(compare(l, r)? == Ordering::Less)),
        BinaryOp::Gt => Ok(Value::Bool(compare(l, r)? == Ordering::Greater)),
        BinaryOp::Le => Ok(Value::Bool(compare(l, r)? != Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare(l, r)? != Ordering::Less)),
        _ => {
            let a = l.as_number()?;
            let b = r.as_number()?;
            let n = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => {
                    if b == 0.0 {
                        return Err(EngineError::Evaluation("division by zero".to_string()));
                    }
                    a / b
                }
                BinaryOp::Mod => {
                    if b == 0.0 {
                        return Err(EngineError::Evaluation("modulo by zero".to_string()));
                    }
                    a % b
                }
                _ => a.powf(b),
            };
            Ok(Value::Number(n))
        }
    }
}

/// Text compares with text (case-insensitively), everything else numerically.
/// Text against a non-text value orders text last.
fn compare(l: &Value, r: &Value) -> EngineResult<Ordering> {
    match (l, r) {
        (Value::Text(a), Value::Text(b)) => Ok(a.to_lowercase().cmp(&b.to_lowercase())),
        (Value::Text(_), Value::Empty) => Ok(Ordering::Greater),
        (Value::Empty, Value::Text(_)) => Ok(Ordering::Less),
        (Value::Text(_), _) => Ok(Ordering::Greater),
        (_, Value::Text(_)) => Ok(Ordering::Less),
        _ => {
            let a = l.as_number()?;
            let b = r.as_number()?;
            a.partial_cmp(&b)
                .ok_or_else(|| EngineError::Evaluation("cannot compare NaN".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellAddress, Expression};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapResolver {
        cells: HashMap<CellAddress, Value>,
        names: HashMap<String, Value>,
    }

    impl Resolver for MapResolver {
        fn value(&self, reference: &Reference) -> EngineResult<Value> {
            match &reference.target {
                RefTarget::Cell(addr) => Ok(self.cells.get(addr).cloned().unwrap_or_default()),
                RefTarget::Name(name) => self
                    .names
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownAlias(name.clone())),
                RefTarget::Range(_) => unreachable!(),
            }
        }

        fn range_values(&self, _: &Reference, range: CellRange) -> EngineResult<Vec<Value>> {
            Ok(range.iter().filter_map(|a| self.cells.get(&a).cloned()).collect())
        }
    }

    fn eval(src: &str, resolver: &MapResolver) -> EngineResult<Value> {
        evaluate(Expression::parse(src).unwrap().ast(), resolver)
    }

    fn sample() -> MapResolver {
        let mut r = MapResolver::default();
        r.cells.insert(CellAddress::new(0, 0), Value::Number(1.0));
        r.cells.insert(CellAddress::new(1, 0), Value::Number(2.0));
        r.cells.insert(CellAddress::new(2, 0), Value::Bool(true));
        r.names.insert("alias1".to_string(), Value::Number(41.0));
        r
    }

    #[test]
    fn test_arithmetic_and_coercion() {
        let r = sample();
        assert_eq!(eval("=A1 + A2 * 3", &r).unwrap(), Value::Number(7.0));
        assert_eq!(eval("A3 + 1", &r).unwrap(), Value::Number(2.0));
        assert_eq!(eval("B9 + 1", &r).unwrap(), Value::Number(1.0));
        assert_eq!(eval("-2 ^ 2", &r).unwrap(), Value::Number(-4.0));
        assert_eq!(eval("alias1 + 1", &r).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        let err = eval("1 / (A1 - 1)", &sample()).unwrap_err();
        assert_eq!(err, EngineError::Evaluation("division by zero".to_string()));
    }

    #[test]
    fn test_text_in_arithmetic_is_an_error() {
        assert!(matches!(
            eval("\"x\" + 1", &sample()),
            Err(EngineError::Evaluation(_))
        ));
    }

    #[test]
    fn test_concat_and_comparison() {
        let r = sample();
        assert_eq!(eval("\"n=\" & A2", &r).unwrap(), Value::Text("n=2".to_string()));
        assert_eq!(eval("A1 < A2", &r).unwrap(), Value::Bool(true));
        assert_eq!(eval("\"abc\" = \"ABC\"", &r).unwrap(), Value::Bool(true));
        assert_eq!(eval("A3 = 1", &r).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_if_is_lazy() {
        let r = sample();
        assert_eq!(eval("IF(A1 > 0, 10, 1 / 0)", &r).unwrap(), Value::Number(10.0));
        assert_eq!(eval("IF(FALSE, 1)", &r).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_ranges_expand_in_function_calls() {
        let r = sample();
        assert_eq!(eval("SUM(A1:A5)", &r).unwrap(), Value::Number(4.0));
        assert_eq!(eval("COUNT(A1:B9)", &r).unwrap(), Value::Number(3.0));
        assert!(eval("A1:A2 + 1", &r).is_err());
    }

    #[test]
    fn test_ref_error_is_unresolved() {
        let err = eval("#REF! + 1", &sample()).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedReference(_)));
    }

    #[test]
    fn test_unresolved_names_propagate() {
        assert_eq!(
            eval("nope * 2", &sample()).unwrap_err(),
            EngineError::UnknownAlias("nope".to_string())
        );
    }
}
