//! Pull-based recomputation of dirty nodes.

use sheetbind_engine::engine::{
    CellRange, EngineError, EngineResult, ErrorKind, Expression, Reference, Resolver, Value,
    evaluate, schedule,
};
use tracing::{debug, info_span, warn};

use super::resolve::Resolved;
use super::{RecomputeReport, Workspace};
use crate::document::{NodeKey, NodeRef, NodeState};
use crate::error::Result;

/// Evaluation context: references are resolved as if written in `object` of `document`.
struct ScopeResolver<'a> {
    workspace: &'a Workspace,
    document: &'a str,
    object: &'a str,
}

impl Resolver for ScopeResolver<'_> {
    fn value(&self, reference: &Reference) -> EngineResult<Value> {
        match self.workspace.resolve(self.document, self.object, reference)? {
            Resolved::Cell(node) | Resolved::Property(node) => self.workspace.read_node(&node),
            Resolved::Range { .. } => Err(EngineError::Evaluation(format!(
                "range {} used as a single value",
                reference
            ))),
        }
    }

    fn range_values(&self, reference: &Reference, range: CellRange) -> EngineResult<Vec<Value>> {
        let unresolved = || EngineError::UnresolvedReference(reference.to_string());
        let Resolved::Range {
            document, object, ..
        } = self.workspace.resolve(self.document, self.object, reference)?
        else {
            return Err(unresolved());
        };
        let sheet = self
            .workspace
            .doc_by_name(&document)
            .and_then(|d| d.object(&object))
            .and_then(|o| o.as_sheet())
            .ok_or_else(unresolved)?;
        sheet
            .cells_in(range)
            .map(|(address, _)| sheet.read(address))
            .collect()
    }
}

impl Workspace {
    /// Current value of a node as seen by readers, without recomputing it.
    pub(crate) fn read_node(&self, node: &NodeRef) -> EngineResult<Value> {
        let unresolved = || EngineError::UnresolvedReference(node.to_string());
        let object = self
            .doc_by_name(&node.document)
            .and_then(|d| d.object(node.object()))
            .ok_or_else(unresolved)?;
        match &node.key {
            NodeKey::Cell { address, .. } => {
                object.as_sheet().ok_or_else(unresolved)?.read(*address)
            }
            NodeKey::Property { property, .. } => object
                .as_feature()
                .and_then(|f| f.property(property))
                .ok_or_else(unresolved)?
                .read(),
        }
    }

    /// First dependency of `node` still waiting for a value. Reaching one after the
    /// schedule ran means the two are on a cycle.
    fn pending_dependency(&self, node: &NodeRef) -> Option<NodeRef> {
        self.dependencies_of(node).into_iter().find(|dep| {
            self.formula(dep)
                .is_some_and(|f| matches!(f.state(), NodeState::Computing | NodeState::Dirty))
        })
    }

    /// Recompute the stale nodes reachable from `roots`, dependencies first.
    pub(crate) fn recompute_nodes(&mut self, roots: Vec<NodeRef>) -> RecomputeReport {
        let _span = info_span!("recompute", roots = roots.len()).entered();
        let plan = schedule(
            roots,
            |n| self.formula(n).is_some_and(|f| f.is_stale()),
            |n| self.dependencies_of(n),
        );
        for node in &plan.order {
            if let Some(formula) = self.formula_mut(node) {
                formula.mark_computing();
            }
        }

        let mut report = RecomputeReport::default();
        for node in plan.order {
            let result = if plan.cyclic.contains(&node) {
                Err(EngineError::CyclicDependency(node.to_string()))
            } else if let Some(pending) = self.pending_dependency(&node) {
                Err(EngineError::CyclicDependency(pending.to_string()))
            } else {
                let Some(formula) = self.formula(&node) else {
                    continue;
                };
                let resolver = ScopeResolver {
                    workspace: self,
                    document: &node.document,
                    object: node.object(),
                };
                evaluate(formula.expression().ast(), &resolver)
            };

            match &result {
                Err(e) if e.kind() == ErrorKind::CyclicDependency => {
                    warn!(node = %node, "dependency cycle");
                    report.errors.push((node.clone(), e.clone()));
                }
                Err(e) => {
                    debug!(node = %node, error = %e, "evaluation failed");
                    report.errors.push((node.clone(), e.clone()));
                }
                Ok(_) => {}
            }
            if let Some(formula) = self.formula_mut(&node) {
                formula.set_result(result);
            }
            report.evaluated += 1;
        }
        report
    }

    /// Bring `node` up to date if it is stale.
    pub(crate) fn refresh(&mut self, node: &NodeRef) {
        if self.formula(node).is_some_and(|f| f.is_stale()) {
            self.recompute_nodes(vec![node.clone()]);
        }
    }

    /// Recompute every stale binding in every open document.
    pub fn recompute(&mut self) -> RecomputeReport {
        let roots = self.formula_nodes();
        self.recompute_nodes(roots)
    }

    /// Recompute the stale bindings of one document, pulling in whatever they read from
    /// other documents.
    pub fn recompute_document(&mut self, document: &str) -> Result<RecomputeReport> {
        let index = self.doc_index(document)?;
        let roots = self.documents[index]
            .formulas()
            .into_iter()
            .map(|(node, _)| node)
            .collect();
        Ok(self.recompute_nodes(roots))
    }

    /// Evaluate a one-off expression as if it were bound in `object` of `document`.
    ///
    /// Nothing is stored; the nodes it reads are brought up to date first.
    pub fn evaluate_expression(
        &mut self,
        document: &str,
        object: &str,
        text: &str,
    ) -> Result<Value> {
        let index = self.doc_index(document)?;
        let object = self.documents[index].require_object(object)?;
        let object = self.documents[index].object_at(object).name().to_string();
        let document = self.documents[index].name().to_string();

        let expression = Expression::parse(text)?;
        let deps = self.dependencies_for(&document, &object, &expression);
        self.recompute_nodes(deps.into_iter().collect());

        let resolver = ScopeResolver {
            workspace: self,
            document: &document,
            object: &object,
        };
        Ok(evaluate(expression.ast(), &resolver)?)
    }
}
