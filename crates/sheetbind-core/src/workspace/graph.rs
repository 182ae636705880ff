//! Dependency registration and dirty propagation across documents.

use std::collections::{BTreeSet, HashSet};

use sheetbind_engine::engine::{
    CellTargets, Expression, RefTarget, cell_targets, detect_cycle, transitive_dependents,
};

use super::Workspace;
use crate::document::{Document, LinkTable, NodeKey, NodeRef, Object};

impl Workspace {
    /// Nodes read by `expression` when written in `object` of `document`.
    ///
    /// References that do not resolve contribute nothing; they are reported when the
    /// expression is evaluated.
    pub(crate) fn dependencies_for(
        &self,
        document: &str,
        object: &str,
        expression: &Expression,
    ) -> BTreeSet<NodeRef> {
        let mut deps = BTreeSet::new();
        for reference in expression.references() {
            let Ok(target) = self.resolve_object(document, object, reference) else {
                continue;
            };
            let doc = &self.documents[target.doc];
            match doc.object_at(target.object) {
                Object::Sheet(sheet) => {
                    let cell = |address| NodeRef::cell(doc.name(), sheet.name(), address);
                    match cell_targets(reference, self.settings.max_range_cells) {
                        CellTargets::Cells(addresses) => {
                            deps.extend(addresses.into_iter().map(cell))
                        }
                        CellTargets::Sparse(range) => {
                            deps.extend(sheet.cells_in(range).map(|(address, _)| cell(address)))
                        }
                        CellTargets::Named(name) => {
                            if let Ok(address) = sheet.aliases().resolve(&name) {
                                deps.insert(cell(address));
                            }
                        }
                    }
                }
                Object::Feature(feature) => match &reference.target {
                    RefTarget::Name(name) if feature.property(name).is_some() => {
                        deps.insert(NodeRef::property(doc.name(), feature.name(), name));
                    }
                    _ => {}
                },
            }
        }
        deps
    }

    /// Re-register every expression's dependencies and refresh the link tables.
    ///
    /// Forward edges live in the reader's document; reverse registrations go to the
    /// document owning the target, when it is open. Returns the nodes whose dependency
    /// set changed.
    pub(crate) fn rebuild_graphs(&mut self) -> Vec<NodeRef> {
        let edges: Vec<(NodeRef, BTreeSet<NodeRef>)> = self
            .documents
            .iter()
            .flat_map(|d| d.formulas())
            .map(|(node, formula)| {
                let deps =
                    self.dependencies_for(&node.document, node.object(), formula.expression());
                (node, deps)
            })
            .collect();
        let links = self.collect_links();

        let current: HashSet<&NodeRef> = edges.iter().map(|(node, _)| node).collect();
        for (document, links) in self.documents.iter_mut().zip(links) {
            let gone: Vec<NodeRef> = document
                .graph
                .nodes()
                .filter(|n| !current.contains(n))
                .cloned()
                .collect();
            for node in gone {
                document.graph.remove_node(&node);
            }
            document.graph.remove_dependents_where(|_| true);
            document.links = links;
        }

        let mut changed = Vec::new();
        for (node, deps) in edges {
            for dep in &deps {
                if let Some(target) = self.doc_by_name_mut(&dep.document) {
                    target.graph.add_dependent(dep.clone(), node.clone());
                }
            }
            if let Some(document) = self.doc_by_name_mut(&node.document) {
                let delta = document.graph.set_dependencies(node.clone(), deps);
                if !delta.added.is_empty() || !delta.removed.is_empty() {
                    changed.push(node);
                }
            }
        }
        changed
    }

    /// New link table for every document, in document order.
    fn collect_links(&self) -> Vec<LinkTable> {
        self.documents.iter().map(|d| self.links_for(d)).collect()
    }

    /// New link table for `document`.
    ///
    /// A qualified reference that resolves records where it currently leads. One that does
    /// not keeps its previous entry, so it can be re-bound when the target is reopened.
    fn links_for(&self, document: &Document) -> LinkTable {
        let mut links = LinkTable::new();
        for (node, formula) in document.formulas() {
            for reference in formula.expression().references() {
                let (Some(docq), Some(objq)) = (&reference.document, &reference.object) else {
                    continue;
                };
                let key = (docq.clone(), objq.clone());
                match self.resolve_object(&node.document, node.object(), reference) {
                    Ok(target) => {
                        let doc = &self.documents[target.doc];
                        let object = doc.object_at(target.object).name().to_string();
                        links.insert(key, (doc.name().to_string(), object));
                    }
                    Err(_) => {
                        if let Some(previous) = document.links.get(&key) {
                            links.insert(key, previous.clone());
                        }
                    }
                }
            }
        }
        links
    }

    /// Re-register the edges of `nodes` alone. Only valid for edits that leave every
    /// object, alias and label as it was. Returns the nodes whose dependency set changed.
    fn update_edges(&mut self, nodes: &[NodeRef]) -> Vec<NodeRef> {
        let mut changed = Vec::new();
        for node in nodes {
            let deps = match self.formula(node) {
                Some(formula) => {
                    self.dependencies_for(&node.document, node.object(), formula.expression())
                }
                None => BTreeSet::new(),
            };
            let Some(document) = self.doc_by_name_mut(&node.document) else {
                continue;
            };
            let delta = document.graph.set_dependencies(node.clone(), deps);
            if delta.added.is_empty() && delta.removed.is_empty() {
                continue;
            }
            for dep in &delta.removed {
                if let Some(target) = self.doc_by_name_mut(&dep.document) {
                    target.graph.remove_dependent(dep, node);
                }
            }
            for dep in delta.added {
                if let Some(target) = self.doc_by_name_mut(&dep.document) {
                    target.graph.add_dependent(dep, node.clone());
                }
            }
            changed.push(node.clone());
        }

        let documents: BTreeSet<&str> = nodes.iter().map(|n| n.document.as_str()).collect();
        for index in 0..self.documents.len() {
            if documents.contains(self.documents[index].name()) {
                let links = self.links_for(&self.documents[index]);
                self.documents[index].links = links;
            }
        }
        changed
    }

    /// Bindings that read `cell` through a range too large to expand, and so depend only
    /// on the cells of that range that exist.
    fn sparse_readers(&self, cell: &NodeRef) -> Vec<NodeRef> {
        let NodeKey::Cell { object, address } = &cell.key else {
            return Vec::new();
        };
        let mut readers = Vec::new();
        for (node, formula) in self.documents.iter().flat_map(|d| d.formulas()) {
            let reads = formula.expression().references().iter().any(|reference| {
                match &reference.target {
                    RefTarget::Range(range)
                        if range.len() > self.settings.max_range_cells
                            && range.contains(*address) =>
                    {
                        self.resolve_object(&node.document, node.object(), reference)
                            .is_ok_and(|target| {
                                let doc = &self.documents[target.doc];
                                doc.name() == cell.document
                                    && doc.object_at(target.object).name() == object.as_str()
                            })
                    }
                    _ => false,
                }
            });
            if reads {
                readers.push(node);
            }
        }
        readers
    }

    pub(crate) fn dependencies_of(&self, node: &NodeRef) -> Vec<NodeRef> {
        self.doc_by_name(&node.document)
            .map(|d| d.graph.dependencies(node).cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn dependents_of(&self, node: &NodeRef) -> Vec<NodeRef> {
        self.doc_by_name(&node.document)
            .map(|d| d.graph.dependents(node).cloned().collect())
            .unwrap_or_default()
    }

    /// Mark `roots` and everything downstream of them dirty.
    pub(crate) fn mark_dirty(&mut self, roots: impl IntoIterator<Item = NodeRef>) {
        let mut affected = Vec::new();
        for root in roots {
            affected.extend(transitive_dependents(&root, |n| self.dependents_of(n)));
            affected.push(root);
        }
        for node in affected {
            if let Some(formula) = self.formula_mut(&node) {
                formula.mark_dirty();
            }
        }
    }

    /// Rebuild the graphs after a mutation that may change what references resolve to
    /// (objects, aliases, labels, documents, structural edits), then dirty `touched` plus
    /// every node whose dependencies moved.
    pub(crate) fn after_edit(&mut self, touched: Vec<NodeRef>) {
        let changed = self.rebuild_graphs();
        self.mark_dirty(touched.into_iter().chain(changed));
    }

    /// Like [`Workspace::after_edit`] for edits of content only: cell inputs, property
    /// values and bindings. Only the touched nodes, and the readers of any new or removed
    /// cell through a large range, are re-registered.
    pub(crate) fn after_content_edit(&mut self, touched: Vec<NodeRef>) {
        let mut nodes = touched.clone();
        for node in &touched {
            for reader in self.sparse_readers(node) {
                if !nodes.contains(&reader) {
                    nodes.push(reader);
                }
            }
        }
        let changed = self.update_edges(&nodes);
        self.mark_dirty(touched.into_iter().chain(changed));
    }

    /// The dependency cycle through `node`, if its expression closes one.
    pub(crate) fn find_cycle(&self, node: &NodeRef) -> Option<Vec<NodeRef>> {
        detect_cycle(node, |n| self.dependencies_of(n))
    }
}
