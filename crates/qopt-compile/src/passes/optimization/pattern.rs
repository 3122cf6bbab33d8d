//! Neighbourhood queries shared by the rewrite rules.
//!
//! All lookups walk the immediate adjacency of a vertex in ascending id
//! order, so the first match is deterministic.

use qopt_ir::{CircuitDag, Gate, IrError, VertexId};
use rustc_hash::FxHashSet;

use crate::error::CompileResult;

/// The gate of a live vertex.
pub(super) fn gate_of(dag: &CircuitDag, id: VertexId) -> CompileResult<&Gate> {
    Ok(dag.gate(id).ok_or(IrError::VertexNotFound(id))?)
}

fn successors(dag: &CircuitDag, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    dag.vertex(id)
        .into_iter()
        .flat_map(|v| v.successors().iter().copied())
}

fn predecessors(dag: &CircuitDag, id: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    dag.vertex(id)
        .into_iter()
        .flat_map(|v| v.predecessors().iter().copied())
}

/// Every `(a, b)` with `a` a successor of `id` and `b` a successor of `a`.
pub(super) fn forward_pairs(dag: &CircuitDag, id: VertexId) -> Vec<(VertexId, VertexId)> {
    successors(dag, id)
        .flat_map(|a| successors(dag, a).map(move |b| (a, b)))
        .collect()
}

/// The single successor of `id`, if it has exactly one.
pub(super) fn only_successor(dag: &CircuitDag, id: VertexId) -> Option<VertexId> {
    let mut iter = successors(dag, id);
    match (iter.next(), iter.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// First successor of `id` whose gate satisfies `matches`.
pub(super) fn successor_where(
    dag: &CircuitDag,
    id: VertexId,
    matches: impl Fn(&Gate) -> bool,
) -> Option<VertexId> {
    successors(dag, id).find(|&s| dag.gate(s).is_some_and(&matches))
}

/// First predecessor of `id` whose gate satisfies `matches`.
pub(super) fn predecessor_where(
    dag: &CircuitDag,
    id: VertexId,
    matches: impl Fn(&Gate) -> bool,
) -> Option<VertexId> {
    predecessors(dag, id).find(|&p| dag.gate(p).is_some_and(&matches))
}

/// Check whether `to` is reachable from a successor of `from` other than `via`.
///
/// A commute of `from` towards `to` is only sound when every dependency
/// path between them runs through `via`.
pub(super) fn has_detour(dag: &CircuitDag, from: VertexId, via: VertexId, to: VertexId) -> bool {
    let mut stack: Vec<VertexId> = successors(dag, from).filter(|&s| s != via).collect();
    let mut visited: FxHashSet<VertexId> = FxHashSet::default();

    while let Some(id) = stack.pop() {
        if id == to {
            return true;
        }
        if visited.insert(id) {
            stack.extend(successors(dag, id).filter(|s| !visited.contains(s)));
        }
    }
    false
}
