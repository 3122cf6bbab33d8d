//! Built-in rewrite passes.
//!
//! - [`HadamardReduction`]: local rewrites that remove `H` gates
//! - [`RotationCnotCancellation`]: commute-and-merge search for `R_z` and
//!   CNOT pairs

pub mod optimization;

pub use optimization::{
    HadamardReduction, MergeOutcome, RotationCnotCancellation, cancel_single_qubit_and_cnot,
    find_cnot_merge, find_rotation_merge, reduce_hadamards,
};
