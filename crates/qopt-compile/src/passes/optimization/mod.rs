//! Optimization passes.

mod cancel;
mod hadamard;
mod pattern;


pub use cancel::{
    MergeOutcome, RotationCnotCancellation, cancel_single_qubit_and_cnot, find_cnot_merge,
    find_rotation_merge,
};
pub use hadamard::{HadamardReduction, reduce_hadamards};
