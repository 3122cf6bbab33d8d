//! Hadamard gate reduction.
//!
//! Rewrites local patterns around `H` gates into equivalent circuits with
//! fewer Hadamards:
//!
//! ```text
//! 1. H P H             -> P_dag H P_dag
//! 2. H P_dag H         -> P H P
//! 3. H⊗H CNOT H⊗H      -> CNOT with control and target swapped
//! 4. H P CNOT P_dag H  -> P_dag CNOT P      (P gates on the CNOT target)
//! 5. H P_dag CNOT P H  -> P CNOT P_dag
//! ```
//!
//! Only uncontrolled `H` gates seed the work queue; a controlled `H` is
//! never the first gate of a match.

use std::collections::VecDeque;

use qopt_ir::{CircuitDag, GateKind, IrError, QubitId, VertexId};
use tracing::{debug, trace};

use crate::error::CompileResult;
use crate::pass::Pass;

use super::pattern::{forward_pairs, predecessor_where, successor_where};

/// A matched Hadamard rewrite, ready to apply.
#[derive(Debug, Clone, PartialEq)]
enum HadamardRewrite {
    /// Rules 1 and 2: the outer H gates become `outer`, the phase becomes H.
    FlipPhase {
        first: VertexId,
        middle: VertexId,
        last: VertexId,
        outer: GateKind,
    },
    /// Rule 3: four Hadamards around a CNOT vanish and the CNOT reverses.
    ReverseCnot {
        hadamards: [VertexId; 4],
        cnot: VertexId,
        control: QubitId,
        target: QubitId,
    },
    /// Rules 4 and 5: the outer H gates vanish and both phases invert.
    PhaseCnot {
        first: VertexId,
        last: VertexId,
        phases: [(VertexId, GateKind); 2],
    },
}

impl HadamardRewrite {
    fn rule(&self) -> &'static str {
        match self {
            HadamardRewrite::FlipPhase { .. } => "flip_phase",
            HadamardRewrite::ReverseCnot { .. } => "reverse_cnot",
            HadamardRewrite::PhaseCnot { .. } => "phase_cnot",
        }
    }
}

fn inverse_phase(kind: &GateKind) -> Option<GateKind> {
    match kind {
        GateKind::P => Some(GateKind::PDag),
        GateKind::PDag => Some(GateKind::P),
        _ => None,
    }
}

/// Rules 1 and 2.
fn match_flip_phase(dag: &CircuitDag, h: VertexId, wire: QubitId) -> Option<HadamardRewrite> {
    forward_pairs(dag, h).into_iter().find_map(|(middle, last)| {
        let phase = dag.gate(middle)?;
        let outer = inverse_phase(&phase.kind)?;
        if !phase.is_single(&phase.kind, wire) || !dag.gate(last)?.is_single(&GateKind::H, wire) {
            return None;
        }
        Some(HadamardRewrite::FlipPhase {
            first: h,
            middle,
            last,
            outer,
        })
    })
}

/// Rule 3.
fn match_reverse_cnot(dag: &CircuitDag, h: VertexId, wire: QubitId) -> Option<HadamardRewrite> {
    forward_pairs(dag, h).into_iter().find_map(|(cnot, last)| {
        let gate = dag.gate(cnot)?;
        if gate.kind != GateKind::Cnot
            || gate.controls != [wire]
            || !dag.gate(last)?.is_single(&GateKind::H, wire)
        {
            return None;
        }
        let other = gate.target;
        let bottom_left = predecessor_where(dag, cnot, |g| g.target == other)?;
        let bottom_right = successor_where(dag, cnot, |g| g.target == other)?;
        if !dag.gate(bottom_left)?.is_single(&GateKind::H, other)
            || !dag.gate(bottom_right)?.is_single(&GateKind::H, other)
        {
            return None;
        }
        Some(HadamardRewrite::ReverseCnot {
            hadamards: [h, last, bottom_left, bottom_right],
            cnot,
            control: other,
            target: wire,
        })
    })
}

/// Rules 4 and 5.
fn match_phase_cnot(dag: &CircuitDag, h: VertexId, wire: QubitId) -> Option<HadamardRewrite> {
    forward_pairs(dag, h).into_iter().find_map(|(phase, cnot)| {
        let phase_gate = dag.gate(phase)?;
        let inverse = inverse_phase(&phase_gate.kind)?;
        let cnot_gate = dag.gate(cnot)?;
        if !phase_gate.is_single(&phase_gate.kind, wire)
            || cnot_gate.kind != GateKind::Cnot
            || cnot_gate.target != wire
        {
            return None;
        }
        let (closing, last) = forward_pairs(dag, cnot).into_iter().find(|&(closing, last)| {
            dag.gate(closing)
                .is_some_and(|g| g.is_single(&inverse, wire))
                && dag.gate(last).is_some_and(|g| g.is_single(&GateKind::H, wire))
        })?;
        Some(HadamardRewrite::PhaseCnot {
            first: h,
            last,
            phases: [(phase, inverse), (closing, phase_gate.kind.clone())],
        })
    })
}

/// Find the first rule that fires for the Hadamard at `h`.
fn find_rewrite(dag: &CircuitDag, h: VertexId, wire: QubitId) -> Option<HadamardRewrite> {
    match_flip_phase(dag, h, wire)
        .or_else(|| match_reverse_cnot(dag, h, wire))
        .or_else(|| match_phase_cnot(dag, h, wire))
}

fn set_kind(dag: &mut CircuitDag, id: VertexId, kind: GateKind) -> CompileResult<()> {
    let gate = dag
        .gate_mut(id)
        .ok_or(IrError::VertexNotFound(id))?;
    gate.kind = kind;
    Ok(())
}

fn apply(
    dag: &mut CircuitDag,
    rewrite: HadamardRewrite,
    queue: &mut VecDeque<VertexId>,
) -> CompileResult<()> {
    match rewrite {
        HadamardRewrite::FlipPhase {
            first,
            middle,
            last,
            outer,
        } => {
            set_kind(dag, first, outer.clone())?;
            set_kind(dag, middle, GateKind::H)?;
            set_kind(dag, last, outer)?;
            queue.push_back(middle);
        }
        HadamardRewrite::ReverseCnot {
            hadamards,
            cnot,
            control,
            target,
        } => {
            for h in hadamards {
                dag.remove_vertex(h)?;
            }
            let gate = dag
                .gate_mut(cnot)
                .ok_or(IrError::VertexNotFound(cnot))?;
            gate.target = target;
            gate.controls = vec![control];
        }
        HadamardRewrite::PhaseCnot {
            first,
            last,
            phases,
        } => {
            dag.remove_vertex(first)?;
            dag.remove_vertex(last)?;
            for (id, kind) in phases {
                set_kind(dag, id, kind)?;
            }
        }
    }
    Ok(())
}

/// Run the Hadamard rewrite rules to a fixpoint.
///
/// Every vertex named `H` is queued in ascending id order. Entries whose
/// vertex was removed or renamed by an earlier rewrite are skipped. Returns
/// the number of rewrites applied.
pub fn reduce_hadamards(dag: &mut CircuitDag) -> CompileResult<usize> {
    let mut queue: VecDeque<VertexId> = dag.collect_gate_ids(GateKind::H.name()).into();
    let mut applied = 0;

    while let Some(h) = queue.pop_front() {
        let wire = match dag.gate(h) {
            Some(gate) if gate.is_single(&GateKind::H, gate.target) => gate.target,
            _ => continue,
        };
        let Some(rewrite) = find_rewrite(dag, h, wire) else {
            continue;
        };
        trace!(vertex = %h, rule = rewrite.rule(), "Hadamard rewrite");
        apply(dag, rewrite, &mut queue)?;
        applied += 1;
    }

    Ok(applied)
}

/// Hadamard gate reduction pass.
///
/// Wraps [`reduce_hadamards`].
pub struct HadamardReduction;

impl HadamardReduction {
    /// Create a new Hadamard reduction pass.
    pub fn new() -> Self {
        Self
    }
}

impl Default for HadamardReduction {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for HadamardReduction {
    fn name(&self) -> &'static str {
        "HadamardReduction"
    }

    fn run(&self, dag: &mut CircuitDag) -> CompileResult<()> {
        let applied = reduce_hadamards(dag)?;
        debug!("HadamardReduction applied {} rewrites", applied);
        Ok(())
    }

    fn should_run(&self, dag: &CircuitDag) -> bool {
        dag.vertices().any(|v| v.gate().kind == GateKind::H)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qopt_ir::{Gate, Netlist};

    fn run(source: &str) -> (Vec<Gate>, usize) {
        let mut dag = Netlist::parse(source).unwrap().into_dag().unwrap();
        let applied = reduce_hadamards(&mut dag).unwrap();
        dag.verify_integrity().unwrap();
        (dag.linearize(), applied)
    }

    fn gates(lines: &[&str]) -> Vec<Gate> {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[test]
    fn test_rule_1() {
        let (out, applied) = run("INIT 1\nH 0\nP 0\nH 0");
        assert_eq!(out, gates(&["P_dag 0", "H 0", "P_dag 0"]));
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_rule_2() {
        let (out, _) = run("INIT 1\nH 0\nP_dag 0\nH 0");
        assert_eq!(out, gates(&["P 0", "H 0", "P 0"]));
    }

    #[test]
    fn test_rule_1_needs_single_wire_phase() {
        let (out, applied) = run("INIT 2\nH 0\nP 1 0\nH 0");
        assert_eq!(out, gates(&["H 0", "P 1 0", "H 0"]));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_controlled_hadamard_does_not_open_a_match() {
        let (out, applied) = run("INIT 2\nH 1 0\nP 0\nH 0");
        assert_eq!(out, gates(&["H 1 0", "P 0", "H 0"]));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_rule_3() {
        let (out, applied) = run("INIT 2\nH 0\nH 1\nCNOT 0 1\nH 0\nH 1");
        assert_eq!(out, gates(&["CNOT 1 0"]));
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_rule_3_needs_bottom_hadamards() {
        let (out, applied) = run("INIT 2\nH 0\nX 1\nCNOT 0 1\nH 0\nH 1");
        assert_eq!(out, gates(&["H 0", "X 1", "CNOT 0 1", "H 0", "H 1"]));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_rule_3_without_bottom_neighbour() {
        let (out, applied) = run("INIT 2\nH 0\nCNOT 0 1\nH 0");
        assert_eq!(out, gates(&["H 0", "CNOT 0 1", "H 0"]));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_rule_4() {
        let (out, applied) = run("INIT 2\nH 1\nP 1\nCNOT 0 1\nP_dag 1\nH 1");
        assert_eq!(out, gates(&["P_dag 1", "CNOT 0 1", "P 1"]));
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_rule_5() {
        let (out, _) = run("INIT 2\nH 1\nP_dag 1\nCNOT 0 1\nP 1\nH 1");
        assert_eq!(out, gates(&["P 1", "CNOT 0 1", "P_dag 1"]));
    }

    #[test]
    fn test_rule_4_needs_cnot_target() {
        let (out, applied) = run("INIT 2\nH 1\nP 1\nCNOT 1 0\nP_dag 1\nH 1");
        assert_eq!(out, gates(&["H 1", "P 1", "CNOT 1 0", "P_dag 1", "H 1"]));
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_requeued_middle_hadamard() {
        // The H produced by the first rewrite starts H P_dag H with the last gate.
        let (out, applied) = run("INIT 1\nH 0\nP 0\nH 0\nH 0");
        assert_eq!(applied, 2);
        assert_eq!(out, gates(&["P_dag 0", "P 0", "H 0", "P 0"]));
    }

    #[test]
    fn test_untouched_without_hadamards() {
        let (out, applied) = run("INIT 2\nCNOT 0 1\nR_z 1 0");
        assert_eq!(out, gates(&["CNOT 0 1", "R_z 1 0"]));
        assert_eq!(applied, 0);
        assert!(!HadamardReduction.should_run(&CircuitDag::build(2, &out).unwrap()));
    }
}
