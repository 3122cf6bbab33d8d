//! qopt Netlist Intermediate Representation
//!
//! This crate holds the data structures the qopt optimizer works on: gates
//! parsed from a textual netlist and the dependency DAG built over them.
//!
//! # Overview
//!
//! A [`Netlist`] is an ordered gate list over a fixed number of wires. It is
//! turned into a [`CircuitDag`] in which every gate is a vertex and edges
//! link nearest neighbours on each wire. Rewrite passes mutate the DAG in
//! place and the result is linearized back into a netlist.
//!
//! # Core Components
//!
//! - **Wires**: [`QubitId`]
//! - **Gates**: [`Gate`] and [`GateKind`], parsed from and printed as
//!   instruction lines
//! - **DAG**: [`CircuitDag`], [`Vertex`], [`VertexId`], with
//!   [`Snapshot`]/[`Renumbering`] for rollback
//! - **Netlists**: [`Netlist`] loader and emitter
//!
//! # Example
//!
//! ```rust
//! use qopt_ir::{Netlist, VertexId};
//!
//! let netlist = Netlist::parse("INIT 2\nH 0\nCNOT 0 1\nH 0\n").unwrap();
//! let mut dag = netlist.into_dag().unwrap();
//!
//! assert_eq!(dag.num_ops(), 3);
//! assert_eq!(dag.depth().unwrap(), 3);
//!
//! dag.remove_vertex(VertexId(1)).unwrap();
//! assert!(dag.vertex(VertexId(0)).unwrap().successors().contains(&VertexId(2)));
//!
//! let out = qopt_ir::Netlist::from_dag(&dag);
//! assert_eq!(out.emit(), "INIT 2\nH 0\nH 0\n");
//! ```
//!
//! # Recognised Gates
//!
//! | Gate | Wires | Notes |
//! |------|-------|-------|
//! | `H` | 1 | Hadamard |
//! | `P`, `P_dag` | 1 | Phase gate and its inverse |
//! | `R_z θ` | 1 | Z rotation, angles add when merged |
//! | `CNOT` | 2 | Controlled-NOT |
//!
//! Any other name is kept as an opaque gate and passed through untouched.

pub mod dag;
pub mod error;
pub mod gate;
pub mod netlist;
pub mod qubit;

pub use dag::{CircuitDag, Renumbering, Snapshot, Vertex, VertexId};
pub use error::{IrError, IrResult};
pub use gate::{Gate, GateKind};
pub use netlist::Netlist;
pub use qubit::QubitId;
