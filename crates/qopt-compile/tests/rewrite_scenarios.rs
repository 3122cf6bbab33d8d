//! End-to-end rewrite scenarios driven through the pass manager.

use qopt_compile::{PassManager, PassManagerBuilder, PassReport};
use qopt_ir::{Gate, Netlist};

fn optimize_with(pm: &PassManager, source: &str) -> (Netlist, Vec<PassReport>) {
    let mut dag = Netlist::parse(source).unwrap().into_dag().unwrap();
    let reports = pm.run(&mut dag).unwrap();
    dag.verify_integrity().unwrap();
    (Netlist::from_dag(&dag), reports)
}

fn optimize(source: &str) -> Netlist {
    let pm = PassManagerBuilder::new().with_verification(true).build();
    optimize_with(&pm, source).0
}

fn gates(lines: &[&str]) -> Vec<Gate> {
    lines.iter().map(|l| l.parse().unwrap()).collect()
}

#[test]
fn phase_between_hadamards() {
    let out = optimize("INIT 1\nH 0\nP 0\nH 0\n");
    assert_eq!(out.gates, gates(&["P_dag 0", "H 0", "P_dag 0"]));
}

#[test]
fn hadamard_sandwich_reverses_cnot() {
    let out = optimize("INIT 2\nH 0\nH 1\nCNOT 0 1\nH 0\nH 1\n");
    assert_eq!(out.gates, gates(&["CNOT 1 0"]));
}

#[test]
fn rotations_merge_across_cnot_pair() {
    let out = optimize("INIT 2\nR_z 3 0\nCNOT 0 1\nCNOT 0 1\nCNOT 0 1\nR_z 2 0\n");
    assert_eq!(out.gates, gates(&["CNOT 0 1", "R_z 5 0"]));
}

#[test]
fn rotation_merges_between_repeated_cnots() {
    let out = optimize("INIT 2\nR_z 1 0\nCNOT 0 1\nR_z 2 0\nCNOT 0 1\n");
    assert_eq!(out.gates, gates(&["CNOT 0 1", "R_z 3 0", "CNOT 0 1"]));
}

#[test]
fn cz_blocks_rotation_merge() {
    let source = "INIT 2\nR_z 3 0\nCNOT 0 1\nCZ 0 1\nCNOT 0 1\nR_z 2 0\n";
    let out = optimize(source);
    assert_eq!(out, Netlist::parse(source).unwrap());
}

#[test]
fn cnot_pair_cancels_past_shared_target() {
    let out = optimize("INIT 3\nCNOT 0 2\nCNOT 1 2\nCNOT 0 2\n");
    assert_eq!(out.gates, gates(&["CNOT 1 2"]));
}

#[test]
fn reversed_cnot_cancels_after_hadamard_reduction() {
    let out = optimize("INIT 2\nCNOT 1 0\nH 0\nH 1\nCNOT 0 1\nH 0\nH 1\n");
    assert!(out.is_empty());
    assert_eq!(out.num_qubits, 2);
}

#[test]
fn disabled_passes_leave_circuit_alone() {
    let pm = PassManagerBuilder::new()
        .with_hadamard_reduction(false)
        .with_cancellation(false)
        .build();
    let source = "INIT 2\nH 0\nH 1\nCNOT 0 1\nH 0\nH 1\n";
    let (out, reports) = optimize_with(&pm, source);
    assert!(reports.is_empty());
    assert_eq!(out, Netlist::parse(source).unwrap());
}

#[test]
fn second_round_runs_only_while_shrinking() {
    let pm = PassManagerBuilder::new().with_iterations(5).build();
    let (out, reports) = optimize_with(&pm, "INIT 1\nR_z 1 0\nR_z 2 0\nX 0\n");
    assert_eq!(out.gates, gates(&["R_z 3 0", "X 0"]));

    // Round 1 removes a gate, round 2 removes nothing and ends the run.
    let rounds: Vec<usize> = reports.iter().map(|r| r.round).collect();
    assert_eq!(rounds, vec![1, 2]);
    assert_eq!(reports[0].removed(), 1);
    assert_eq!(reports[1].removed(), 0);
}

#[test]
fn reports_serialize_to_json() {
    let pm = PassManagerBuilder::new().build();
    let (_, reports) = optimize_with(&pm, "INIT 2\nH 0\nH 1\nCNOT 0 1\nH 0\nH 1\n");

    let json = serde_json::to_value(&reports).unwrap();
    let passes: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["pass"].as_str().unwrap())
        .collect();
    assert_eq!(passes, vec!["HadamardReduction", "RotationCnotCancellation"]);
    assert_eq!(json[0]["ops_before"], 5);
    assert_eq!(json[0]["ops_after"], 1);
    assert_eq!(json[1]["ops_after"], 1);
}
