//! Expression bindings and their recompute state.

use std::fmt;

use sheetbind_engine::engine::{EngineError, Expression, Value};

/// Recompute state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Cached value is valid.
    Clean,
    /// Must be recomputed before the next read.
    Dirty,
    /// Scheduled in the recompute pass currently running.
    Computing,
    /// Last recompute failed; the cached value is the last known-good one.
    Error,
}

/// Status of a binding as seen by the objects consuming it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingStatus {
    UpToDate,
    Dirty,
    Error,
}

impl BindingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BindingStatus::UpToDate => "Up-to-date",
            BindingStatus::Dirty => "Touched",
            BindingStatus::Error => "Invalid",
        }
    }

    /// Combine the statuses of several bindings: any error wins, then any dirty one.
    pub fn aggregate(statuses: impl IntoIterator<Item = BindingStatus>) -> BindingStatus {
        statuses
            .into_iter()
            .fold(BindingStatus::UpToDate, |acc, s| match (acc, s) {
                (BindingStatus::Error, _) | (_, BindingStatus::Error) => BindingStatus::Error,
                (BindingStatus::Dirty, _) | (_, BindingStatus::Dirty) => BindingStatus::Dirty,
                _ => BindingStatus::UpToDate,
            })
    }
}

impl fmt::Display for BindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An expression bound to a cell or a feature property.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    expression: Expression,
    state: NodeState,
    value: Value,
    error: Option<EngineError>,
}

impl Formula {
    /// A new, dirty binding. `last_value` becomes the value reported until the first recompute.
    pub fn new(expression: Expression, last_value: Value) -> Self {
        Formula {
            expression,
            state: NodeState::Dirty,
            value: last_value,
            error: None,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn source(&self) -> &str {
        self.expression.source()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Last known-good value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    pub fn status(&self) -> BindingStatus {
        match self.state {
            NodeState::Clean => BindingStatus::UpToDate,
            NodeState::Dirty | NodeState::Computing => BindingStatus::Dirty,
            NodeState::Error => BindingStatus::Error,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.state, NodeState::Dirty | NodeState::Computing)
    }

    /// Replace the expression after a rewrite; the node must be recomputed.
    pub fn set_expression(&mut self, expression: Expression) {
        self.expression = expression;
        self.state = NodeState::Dirty;
    }

    pub fn mark_dirty(&mut self) {
        self.state = NodeState::Dirty;
    }

    pub(crate) fn mark_computing(&mut self) {
        self.state = NodeState::Computing;
    }

    /// Store a recompute result. Errors keep the last good value.
    pub fn set_result(&mut self, result: Result<Value, EngineError>) {
        match result {
            Ok(value) => {
                self.value = value;
                self.error = None;
                self.state = NodeState::Clean;
            }
            Err(error) => {
                self.error = Some(error);
                self.state = NodeState::Error;
            }
        }
    }

    /// Value to hand to readers: the cached value, or the stored error.
    pub fn read(&self) -> Result<Value, EngineError> {
        match (&self.state, &self.error) {
            (NodeState::Error, Some(error)) => Err(error.clone()),
            _ => Ok(self.value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(src: &str) -> Formula {
        Formula::new(Expression::parse(src).unwrap(), Value::Empty)
    }

    #[test]
    fn test_new_formula_is_dirty() {
        let f = formula("=1 + 1");
        assert_eq!(f.state(), NodeState::Dirty);
        assert_eq!(f.status().label(), "Touched");
        assert_eq!(f.source(), "1 + 1");
    }

    #[test]
    fn test_error_keeps_last_good_value() {
        let mut f = formula("A1");
        f.set_result(Ok(Value::Number(3.0)));
        assert_eq!(f.status(), BindingStatus::UpToDate);
        f.mark_dirty();
        f.set_result(Err(EngineError::CyclicDependency("A1".to_string())));
        assert_eq!(f.status(), BindingStatus::Error);
        assert_eq!(f.value(), &Value::Number(3.0));
        assert!(f.read().is_err());
    }

    #[test]
    fn test_aggregate_status() {
        use BindingStatus::*;
        assert_eq!(BindingStatus::aggregate(Vec::new()), UpToDate);
        assert_eq!(BindingStatus::aggregate([UpToDate, Dirty]), Dirty);
        assert_eq!(BindingStatus::aggregate([Dirty, Error, UpToDate]), Error);
    }
}
