//! Rotation and CNOT cancellation.
//!
//! Each candidate gate is slid forward through gates it commutes with until
//! it meets a partner it can merge with: an `R_z` on the same wire (angles
//! add) or an identical CNOT (both vanish). A search that runs out of slides
//! restores the DAG as it was before the search started.

use std::collections::VecDeque;

use qopt_ir::{CircuitDag, Gate, GateKind, Renumbering, Snapshot, VertexId};
use tracing::{debug, trace};

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;

use super::pattern::{forward_pairs, gate_of, has_detour, only_successor, successor_where};

/// Result of one merge search.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The candidate was merged with a partner; the live DAG is kept.
    Merged,
    /// No merge and no slide applied; the DAG was not touched.
    Unchanged,
    /// Slides were tried without reaching a partner and the DAG was rebuilt
    /// from its snapshot. Vertex ids held by the caller must be remapped.
    RolledBack(Renumbering),
}

/// Which search applies to a candidate vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    Rotation,
    Cnot,
}

impl Candidate {
    fn of(gate: &Gate) -> Option<Self> {
        match gate.kind {
            GateKind::Rz(_) if gate.controls.is_empty() => Some(Candidate::Rotation),
            GateKind::Cnot if gate.controls.len() == 1 => Some(Candidate::Cnot),
            _ => None,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Candidate::Rotation => "R_z",
            Candidate::Cnot => "CNOT",
        }
    }

    fn check(self, dag: &CircuitDag, v: VertexId) -> CompileResult<()> {
        let gate = gate_of(dag, v)?;
        if Candidate::of(gate) == Some(self) {
            Ok(())
        } else {
            Err(CompileError::UnexpectedGate {
                vertex: v,
                expected: self.expected(),
                found: gate.name().to_string(),
            })
        }
    }

    /// Merge `v` with its partner if the partner is its only successor.
    fn try_merge(self, dag: &mut CircuitDag, v: VertexId) -> CompileResult<bool> {
        match self {
            Candidate::Rotation => merge_rotation(dag, v),
            Candidate::Cnot => merge_cnot(dag, v),
        }
    }

    /// The vertices `v` should be commuted past, in order, if a slide applies.
    fn find_slide(self, dag: &CircuitDag, v: VertexId) -> CompileResult<Option<Vec<VertexId>>> {
        match self {
            Candidate::Rotation => find_rotation_slide(dag, v),
            Candidate::Cnot => find_cnot_slide(dag, v),
        }
    }
}

fn merge_rotation(dag: &mut CircuitDag, v: VertexId) -> CompileResult<bool> {
    let Some(next) = only_successor(dag, v) else {
        return Ok(false);
    };
    let wire = gate_of(dag, v)?.target;
    let next_gate = gate_of(dag, next)?;
    if !next_gate.is_single(&GateKind::Rz(0.0), wire) {
        return Ok(false);
    }
    let Some(next_theta) = next_gate.theta() else {
        return Ok(false);
    };

    dag.remove_vertex(next)?;
    if let Some(theta) = dag.gate_mut(v).and_then(Gate::theta_mut) {
        *theta += next_theta;
    }
    trace!(vertex = %v, merged = %next, "R_z merge");
    Ok(true)
}

fn merge_cnot(dag: &mut CircuitDag, v: VertexId) -> CompileResult<bool> {
    let Some(next) = only_successor(dag, v) else {
        return Ok(false);
    };
    if gate_of(dag, next)? != gate_of(dag, v)? {
        return Ok(false);
    }

    dag.remove_vertex(next)?;
    dag.remove_vertex(v)?;
    trace!(vertex = %v, merged = %next, "CNOT cancellation");
    Ok(true)
}

/// Slides for an `R_z` on wire `t`:
///
/// 1. `H(t)`, `CNOT(target t)`, `H(t)`
/// 2. `CNOT(c -> t)`, `R_z(t)`, `CNOT(c -> t)` with nothing between the
///    two CNOTs on `c`
/// 3. a CNOT controlled by `t`
fn find_rotation_slide(dag: &CircuitDag, v: VertexId) -> CompileResult<Option<Vec<VertexId>>> {
    let wire = gate_of(dag, v)?.target;
    let Some(next) = only_successor(dag, v) else {
        return Ok(None);
    };
    let next_gate = gate_of(dag, next)?;

    if next_gate.is_single(&GateKind::H, wire) {
        let cnot = only_successor(dag, next)
            .filter(|&c| dag.gate(c).is_some_and(|g| g.kind == GateKind::Cnot && g.target == wire));
        if let Some(cnot) = cnot {
            if let Some(closing) =
                successor_where(dag, cnot, |g| g.is_single(&GateKind::H, wire))
            {
                return Ok(Some(vec![next, cnot, closing]));
            }
        }
    }

    if next_gate.kind == GateKind::Cnot && next_gate.target == wire {
        if let [control] = next_gate.controls[..] {
            let rotation =
                successor_where(dag, next, |g| g.is_single(&GateKind::Rz(0.0), wire));
            if let Some(rotation) = rotation {
                let closing = only_successor(dag, rotation).filter(|&c| {
                    dag.gate(c).is_some_and(|g| g == &Gate::cnot(control, wire))
                        && dag.vertex(next).is_some_and(|n| n.successors().contains(&c))
                });
                if let Some(closing) = closing {
                    return Ok(Some(vec![next, rotation, closing]));
                }
            }
        }
    }

    if next_gate.kind == GateKind::Cnot && next_gate.controls == [wire] {
        return Ok(Some(vec![next]));
    }

    Ok(None)
}

/// Slides for a CNOT `c -> t`:
///
/// 1. a CNOT with the same target and different controls, or the same
///    controls and a different target, reachable from `v` only directly
/// 2. `H(t)`, `CNOT(t -> x)` with `x` not `c`, `H(t)`
fn find_cnot_slide(dag: &CircuitDag, v: VertexId) -> CompileResult<Option<Vec<VertexId>>> {
    let gate = gate_of(dag, v)?;
    let Some(vertex) = dag.vertex(v) else {
        return Ok(None);
    };

    for &next in vertex.successors() {
        let next_gate = gate_of(dag, next)?;
        if next_gate.kind != GateKind::Cnot {
            continue;
        }
        let shares_target = next_gate.target == gate.target && next_gate.controls != gate.controls;
        let shares_controls =
            next_gate.controls == gate.controls && next_gate.target != gate.target;
        if (shares_target || shares_controls) && !has_detour(dag, v, next, next) {
            return Ok(Some(vec![next]));
        }
    }

    let wire = gate.target;
    for (hadamard, cnot) in forward_pairs(dag, v) {
        if !gate_of(dag, hadamard)?.is_single(&GateKind::H, wire) {
            continue;
        }
        let cnot_gate = gate_of(dag, cnot)?;
        if cnot_gate.kind != GateKind::Cnot
            || cnot_gate.controls != [wire]
            || gate.controls.contains(&cnot_gate.target)
        {
            continue;
        }
        let Some(closing) = successor_where(dag, cnot, |g| g.is_single(&GateKind::H, wire)) else {
            continue;
        };
        if !has_detour(dag, v, hadamard, cnot) {
            return Ok(Some(vec![hadamard, cnot, closing]));
        }
    }

    Ok(None)
}

/// Merge search shared by both candidate kinds.
fn find_merge(
    dag: &mut CircuitDag,
    v: VertexId,
    candidate: Candidate,
) -> CompileResult<MergeOutcome> {
    candidate.check(dag, v)?;
    let mut snapshot: Option<Snapshot> = None;

    loop {
        if candidate.try_merge(dag, v)? {
            return Ok(MergeOutcome::Merged);
        }
        let Some(path) = candidate.find_slide(dag, v)? else {
            break;
        };
        if snapshot.is_none() {
            snapshot = Some(dag.snapshot());
        }
        for next in path {
            dag.commute_adjacent(v, next)?;
        }
        trace!(vertex = %v, "slid forward");
    }

    match snapshot {
        Some(snapshot) => {
            debug!(vertex = %v, "no merge partner, rolling back");
            Ok(MergeOutcome::RolledBack(dag.restore(&snapshot)?))
        }
        None => Ok(MergeOutcome::Unchanged),
    }
}

/// Search for a rotation to merge the `R_z` at `v` with.
///
/// The DAG is snapshotted before the first slide; if the search ends without
/// a merge the snapshot is restored and the renumbering is returned.
pub fn find_rotation_merge(dag: &mut CircuitDag, v: VertexId) -> CompileResult<MergeOutcome> {
    find_merge(dag, v, Candidate::Rotation)
}

/// Search for an identical CNOT to cancel the CNOT at `v` against.
///
/// Same protocol as [`find_rotation_merge`].
pub fn find_cnot_merge(dag: &mut CircuitDag, v: VertexId) -> CompileResult<MergeOutcome> {
    find_merge(dag, v, Candidate::Cnot)
}

/// Run one cancellation sweep over every `R_z` and CNOT in the DAG.
///
/// Candidates are collected up front. A rollback renumbers the DAG, so the
/// ids still pending are remapped and those no longer present are dropped.
/// Returns the number of gates removed.
pub fn cancel_single_qubit_and_cnot(dag: &mut CircuitDag) -> CompileResult<usize> {
    let ops_before = dag.num_ops();
    let mut pending: VecDeque<VertexId> = dag
        .vertices()
        .filter(|v| Candidate::of(v.gate()).is_some())
        .map(|v| v.id())
        .collect();

    while let Some(v) = pending.pop_front() {
        let Some(candidate) = dag.gate(v).and_then(Candidate::of) else {
            continue;
        };
        if let MergeOutcome::RolledBack(renumbering) = find_merge(dag, v, candidate)? {
            pending = pending
                .into_iter()
                .filter_map(|id| renumbering.get(&id).copied())
                .collect();
        }
    }

    Ok(ops_before - dag.num_ops())
}

/// Rotation and CNOT cancellation pass.
///
/// Wraps [`cancel_single_qubit_and_cnot`].
pub struct RotationCnotCancellation;

impl RotationCnotCancellation {
    /// Create a new cancellation pass.
    pub fn new() -> Self {
        Self
    }
}

impl Default for RotationCnotCancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for RotationCnotCancellation {
    fn name(&self) -> &'static str {
        "RotationCnotCancellation"
    }

    fn run(&self, dag: &mut CircuitDag) -> CompileResult<()> {
        let removed = cancel_single_qubit_and_cnot(dag)?;
        debug!("RotationCnotCancellation removed {} gates", removed);
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag) -> bool {
        dag.vertices().any(|v| Candidate::of(v.gate()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qopt_ir::{Netlist, QubitId};

    fn dag(source: &str) -> CircuitDag {
        Netlist::parse(source).unwrap().into_dag().unwrap()
    }

    fn gates(lines: &[&str]) -> Vec<Gate> {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[test]
    fn test_adjacent_rotations_merge() {
        let mut dag = dag("INIT 1\nR_z 1.5 0\nR_z 2 0");
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(dag.linearize(), gates(&["R_z 3.5 0"]));
    }

    #[test]
    fn test_rotation_slides_past_controlled_cnots() {
        let mut dag = dag("INIT 2\nR_z 3 0\nCNOT 0 1\nCNOT 0 1\nCNOT 0 1\nR_z 2 0");
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(
            dag.linearize(),
            gates(&["CNOT 0 1", "CNOT 0 1", "CNOT 0 1", "R_z 5 0"])
        );
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_rotation_slides_past_hadamard_sandwich() {
        let mut dag = dag("INIT 2\nR_z 1 1\nH 1\nCNOT 0 1\nH 1\nR_z 1 1");
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(
            dag.linearize(),
            gates(&["H 1", "CNOT 0 1", "H 1", "R_z 2 1"])
        );
    }

    #[test]
    fn test_rotation_slides_past_phase_gadget() {
        let mut dag = dag("INIT 2\nR_z 1 1\nCNOT 0 1\nR_z 4 1\nCNOT 0 1\nR_z 1 1");
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(
            dag.linearize(),
            gates(&["CNOT 0 1", "R_z 4 1", "CNOT 0 1", "R_z 2 1"])
        );
    }

    #[test]
    fn test_phase_gadget_blocked_on_control_wire() {
        let mut dag = dag("INIT 2\nR_z 1 1\nCNOT 0 1\nR_z 4 1\nX 0\nCNOT 0 1\nR_z 1 1");
        let before = dag.linearize();
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Unchanged);
        assert_eq!(dag.linearize(), before);
    }

    #[test]
    fn test_rotation_rollback() {
        let mut dag = dag("INIT 2\nR_z 3 0\nCNOT 0 1\nCZ 0 1\nCNOT 0 1\nR_z 2 0");
        let before = dag.linearize();
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();

        let MergeOutcome::RolledBack(renumbering) = outcome else {
            panic!("expected rollback, got {outcome:?}");
        };
        assert_eq!(renumbering.len(), 5);
        assert_eq!(dag.linearize(), before);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_rotation_slides_past_control_into_partner() {
        let mut dag = dag("INIT 2\nR_z 1 0\nCNOT 0 1\nR_z 2 0\nCNOT 0 1");
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(
            dag.linearize(),
            gates(&["CNOT 0 1", "R_z 3 0", "CNOT 0 1"])
        );
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_controlled_rotation_is_not_a_partner() {
        let mut dag = CircuitDag::build(
            2,
            &[
                Gate::rz(1.0, 0u32),
                Gate::new(GateKind::Rz(2.0), QubitId(0), vec![QubitId(1)]),
            ],
        )
        .unwrap();
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Unchanged);
        assert_eq!(dag.num_ops(), 2);

        let removed = cancel_single_qubit_and_cnot(&mut dag).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(dag.gate(VertexId(1)).unwrap().controls, vec![QubitId(1)]);
    }

    #[test]
    fn test_rotation_without_successor() {
        let mut dag = dag("INIT 1\nR_z 1 0");
        let outcome = find_rotation_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Unchanged);
    }

    #[test]
    fn test_wrong_candidate_kind() {
        let mut dag = dag("INIT 2\nH 0\nCNOT 0 1");
        assert!(matches!(
            find_rotation_merge(&mut dag, VertexId(1)),
            Err(CompileError::UnexpectedGate { expected: "R_z", .. })
        ));
        assert!(matches!(
            find_cnot_merge(&mut dag, VertexId(0)),
            Err(CompileError::UnexpectedGate { expected: "CNOT", .. })
        ));
        assert!(matches!(
            find_cnot_merge(&mut dag, VertexId(9)),
            Err(CompileError::Ir(_))
        ));
    }

    #[test]
    fn test_identical_cnots_cancel() {
        let mut dag = dag("INIT 2\nCNOT 0 1\nCNOT 0 1");
        assert_eq!(
            find_cnot_merge(&mut dag, VertexId(0)).unwrap(),
            MergeOutcome::Merged
        );
        assert!(dag.is_empty());
    }

    #[test]
    fn test_reversed_cnots_do_not_cancel() {
        let mut dag = dag("INIT 2\nCNOT 0 1\nCNOT 1 0");
        assert_eq!(
            find_cnot_merge(&mut dag, VertexId(0)).unwrap(),
            MergeOutcome::Unchanged
        );
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_cnot_slides_past_shared_target() {
        let mut dag = dag("INIT 3\nCNOT 0 2\nCNOT 1 2\nCNOT 0 2");
        let outcome = find_cnot_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(dag.linearize(), gates(&["CNOT 1 2"]));
    }

    #[test]
    fn test_cnot_slides_past_shared_control() {
        let mut dag = dag("INIT 3\nCNOT 0 1\nCNOT 0 2\nCNOT 0 1");
        let outcome = find_cnot_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(dag.linearize(), gates(&["CNOT 0 2"]));
    }

    #[test]
    fn test_cnot_slide_blocked_by_detour() {
        // CZ 0 1 orders CNOT 1 2 after CNOT 0 2 through wire 0 as well.
        let mut dag = dag("INIT 3\nCNOT 0 2\nCZ 0 1\nCNOT 1 2\nCNOT 0 2");
        let before = dag.linearize();
        let outcome = find_cnot_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Unchanged);
        assert_eq!(dag.linearize(), before);
    }

    #[test]
    fn test_cnot_slides_past_hadamard_sandwich() {
        let mut dag = dag("INIT 3\nCNOT 0 1\nH 1\nCNOT 1 2\nH 1\nCNOT 2 1\nCNOT 0 1");
        let outcome = find_cnot_merge(&mut dag, VertexId(0)).unwrap();
        assert_eq!(outcome, MergeOutcome::Merged);
        assert_eq!(
            dag.linearize(),
            gates(&["H 1", "CNOT 1 2", "H 1", "CNOT 2 1"])
        );
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_cnot_rollback() {
        let mut dag = dag("INIT 3\nCNOT 0 2\nCNOT 1 2\nX 2\nCNOT 0 2");
        let before = dag.linearize();
        let outcome = find_cnot_merge(&mut dag, VertexId(0)).unwrap();
        assert!(matches!(outcome, MergeOutcome::RolledBack(_)));
        assert_eq!(dag.linearize(), before);
    }

    #[test]
    fn test_sweep_rotation_example() {
        let mut dag = dag("INIT 2\nR_z 3 0\nCNOT 0 1\nCNOT 0 1\nCNOT 0 1\nR_z 2 0");
        let removed = cancel_single_qubit_and_cnot(&mut dag).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(dag.linearize(), gates(&["CNOT 0 1", "R_z 5 0"]));
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_sweep_continues_after_rollback() {
        // R_z 1 0 rolls back against the CZ, then the CNOT pair still cancels.
        let mut dag = dag("INIT 3\nR_z 1 0\nCNOT 0 1\nCZ 0 1\nCNOT 1 2\nCNOT 1 2");
        let removed = cancel_single_qubit_and_cnot(&mut dag).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(dag.linearize(), gates(&["R_z 1 0", "CNOT 0 1", "CZ 0 1"]));
    }

    #[test]
    fn test_should_run() {
        assert!(RotationCnotCancellation.should_run(&dag("INIT 1\nR_z 1 0")));
        assert!(!RotationCnotCancellation.should_run(&dag("INIT 1\nH 0")));
    }
}
