//! Circular dependency detection.
//!
//! When an expression is stored we check whether it closes a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1) so the edit can report it.
//! The walk is a depth-first search over whatever dependency lookup the caller supplies,
//! which lets the workspace follow edges across documents.

use std::collections::HashSet;
use std::hash::Hash;

/// Detect circular dependencies starting from `start`.
/// Returns `Some(cycle_path)` if a cycle is found, `None` otherwise. The path starts at the
/// first node of the cycle and ends with that node repeated.
pub fn detect_cycle<N, F>(start: &N, mut dependencies_of: F) -> Option<Vec<N>>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> Vec<N>,
{
    let mut visiting = HashSet::new();
    let mut finished = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, &mut dependencies_of, &mut visiting, &mut finished, &mut path) {
        let last = path.last()?.clone();
        let first = path.iter().position(|n| *n == last)?;
        Some(path.split_off(first))
    } else {
        None
    }
}

fn detect_cycle_dfs<N, F>(
    current: &N,
    dependencies_of: &mut F,
    visiting: &mut HashSet<N>,
    finished: &mut HashSet<N>,
    path: &mut Vec<N>,
) -> bool
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> Vec<N>,
{
    if visiting.contains(current) {
        path.push(current.clone());
        return true;
    }
    if finished.contains(current) {
        return false;
    }

    let deps = dependencies_of(current);

    visiting.insert(current.clone());
    path.push(current.clone());

    for dep in &deps {
        if detect_cycle_dfs(dep, dependencies_of, visiting, finished, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    finished.insert(current.clone());
    false
}
