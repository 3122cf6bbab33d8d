//! Peephole Optimization Passes for Quantum Netlists
//!
//! This crate rewrites a [`CircuitDag`](qopt_ir::CircuitDag) in place to
//! reduce the number of gates while keeping the circuit unitary unchanged.
//! It implements a pass-based architecture: each rewrite is a [`Pass`] and a
//! [`PassManager`] runs them in order.
//!
//! # Architecture
//!
//! ```text
//! Netlist ──► CircuitDag
//!                 │
//!                 ▼
//!          ┌─────────────┐
//!          │ PassManager │
//!          └─────────────┘
//!                 │
//!                 ├── HadamardReduction
//!                 └── RotationCnotCancellation
//!                 │
//!                 ▼
//!          Netlist (fewer gates)
//! ```
//!
//! # Example
//!
//! ```rust
//! use qopt_compile::PassManagerBuilder;
//! use qopt_ir::Netlist;
//!
//! let netlist = Netlist::parse("INIT 1\nR_z 0.25 0\nR_z 0.5 0\n").unwrap();
//! let mut dag = netlist.into_dag().unwrap();
//!
//! let pm = PassManagerBuilder::new().build();
//! let reports = pm.run(&mut dag).unwrap();
//!
//! assert_eq!(dag.num_ops(), 1);
//! assert_eq!(reports.iter().map(|r| r.removed()).sum::<usize>(), 1);
//! ```
//!
//! # Built-in Passes
//!
//! - [`passes::HadamardReduction`]: rewrites H P H, H⊗H CNOT H⊗H and
//!   H P CNOT P_dag H patterns into forms with fewer Hadamards
//! - [`passes::RotationCnotCancellation`]: merges R_z rotations and cancels
//!   CNOT pairs, commuting gates out of the way when needed
//!
//! # Custom Passes
//!
//! ```rust
//! use qopt_compile::{CompileResult, Pass};
//! use qopt_ir::CircuitDag;
//!
//! struct Noop;
//!
//! impl Pass for Noop {
//!     fn name(&self) -> &str { "noop" }
//!
//!     fn run(&self, _dag: &mut CircuitDag) -> CompileResult<()> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod manager;
pub mod pass;

// Built-in passes
pub mod passes;

pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, PassManagerBuilder, PassReport};
pub use pass::Pass;
