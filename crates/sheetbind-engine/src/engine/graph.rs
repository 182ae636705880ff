//! Dependency graph storage and recompute scheduling.
//!
//! [`DependencyGraph`] keeps forward edges (`node -> what it reads`) and reverse edges
//! (`target -> who reads it`) as two independent maps. They are maintained separately
//! because a reader and its target may live in different graphs: the reader's graph owns
//! the forward edge while the target's graph holds the reverse registration.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Edges added and removed by [`DependencyGraph::set_dependencies`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyDelta<N> {
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

#[derive(Clone, Debug)]
pub struct DependencyGraph<N: Ord> {
    depends_on: BTreeMap<N, BTreeSet<N>>,
    dependents: BTreeMap<N, BTreeSet<N>>,
}

impl<N: Ord> Default for DependencyGraph<N> {
    fn default() -> Self {
        DependencyGraph {
            depends_on: BTreeMap::new(),
            dependents: BTreeMap::new(),
        }
    }
}

impl<N: Ord + Clone> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the forward edges of `node`. Reverse registrations are left to the caller,
    /// which applies the returned delta to whichever graph owns each target.
    pub fn set_dependencies(&mut self, node: N, deps: BTreeSet<N>) -> DependencyDelta<N> {
        let old = self.depends_on.remove(&node).unwrap_or_default();
        let delta = DependencyDelta {
            added: deps.difference(&old).cloned().collect(),
            removed: old.difference(&deps).cloned().collect(),
        };
        if !deps.is_empty() {
            self.depends_on.insert(node, deps);
        }
        delta
    }

    /// Drop the forward edges of `node`, returning what it depended on.
    pub fn remove_node(&mut self, node: &N) -> BTreeSet<N> {
        self.depends_on.remove(node).unwrap_or_default()
    }

    pub fn dependencies(&self, node: &N) -> impl Iterator<Item = &N> {
        self.depends_on.get(node).into_iter().flatten()
    }

    pub fn add_dependent(&mut self, target: N, dependent: N) {
        self.dependents.entry(target).or_default().insert(dependent);
    }

    pub fn remove_dependent(&mut self, target: &N, dependent: &N) {
        if let Some(set) = self.dependents.get_mut(target) {
            set.remove(dependent);
            if set.is_empty() {
                self.dependents.remove(target);
            }
        }
    }

    /// Remove every reverse registration made by a reader matching `pred`.
    pub fn remove_dependents_where(&mut self, mut pred: impl FnMut(&N) -> bool) {
        self.dependents.retain(|_, set| {
            set.retain(|n| !pred(n));
            !set.is_empty()
        });
    }

    pub fn dependents(&self, target: &N) -> impl Iterator<Item = &N> {
        self.dependents.get(target).into_iter().flatten()
    }

    /// Every node with forward edges.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.depends_on.keys()
    }
}

/// Breadth-first closure of dependents, excluding `start` unless it depends on itself
/// transitively.
pub fn transitive_dependents<N, F>(start: &N, mut dependents_of: F) -> Vec<N>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> Vec<N>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut queue = VecDeque::from([start.clone()]);
    while let Some(node) = queue.pop_front() {
        for dep in dependents_of(&node) {
            if seen.insert(dep.clone()) {
                out.push(dep.clone());
                queue.push_back(dep);
            }
        }
    }
    out
}

/// Evaluation plan produced by [`schedule`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule<N: Eq + Hash> {
    /// Nodes in dependency order: every node comes after the nodes it reads.
    pub order: Vec<N>,
    /// Nodes found on a cycle.
    pub cyclic: HashSet<N>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Computing,
    Done,
}

/// Order the stale nodes reachable from `roots` so dependencies come first.
///
/// Iterative depth-first walk: a node is marked `Computing` while its dependencies are
/// being visited, and meeting a `Computing` node again means the stack between the two
/// visits is a cycle. Nodes for which `is_stale` is false are treated as settled and not
/// walked through.
pub fn schedule<N, S, D>(
    roots: impl IntoIterator<Item = N>,
    is_stale: S,
    mut dependencies_of: D,
) -> Schedule<N>
where
    N: Clone + Eq + Hash,
    S: Fn(&N) -> bool,
    D: FnMut(&N) -> Vec<N>,
{
    let mut marks: HashMap<N, Mark> = HashMap::new();
    let mut order = Vec::new();
    let mut cyclic = HashSet::new();

    for root in roots {
        if marks.contains_key(&root) || !is_stale(&root) {
            continue;
        }
        marks.insert(root.clone(), Mark::Computing);
        let deps = dependencies_of(&root);
        let mut stack: Vec<(N, Vec<N>, usize)> = vec![(root, deps, 0)];

        while let Some((node, deps, next)) = stack.last_mut() {
            let Some(dep) = deps.get(*next).cloned() else {
                let node = node.clone();
                stack.pop();
                marks.insert(node.clone(), Mark::Done);
                order.push(node);
                continue;
            };
            *next += 1;

            match marks.get(&dep) {
                Some(Mark::Done) => {}
                Some(Mark::Computing) => {
                    if let Some(pos) = stack.iter().position(|(n, _, _)| *n == dep) {
                        cyclic.extend(stack[pos..].iter().map(|(n, _, _)| n.clone()));
                    }
                }
                None if is_stale(&dep) => {
                    marks.insert(dep.clone(), Mark::Computing);
                    let dep_deps = dependencies_of(&dep);
                    stack.push((dep, dep_deps, 0));
                }
                None => {}
            }
        }
    }

    Schedule { order, cyclic }
}
