//! Error types for the IR crate.

use thiserror::Error;

use crate::dag::VertexId;
use crate::qubit::QubitId;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An instruction line had no tokens.
    #[error("Empty instruction")]
    EmptyInstruction,

    /// A gate was given without a target wire.
    #[error("Gate '{0}' has no target qubit")]
    MissingTarget(String),

    /// `R_z` must be followed by exactly one angle and one target.
    #[error("R_z expects an angle and a target, got {found} operand(s)")]
    RotationArity {
        /// Number of operands after the gate name.
        found: usize,
    },

    /// A wire token is not a non-negative integer.
    #[error("Invalid qubit index '{0}'")]
    InvalidQubit(String),

    /// A rotation angle token is not a number.
    #[error("Invalid rotation angle '{0}'")]
    InvalidParameter(String),

    /// The `INIT` declaration is malformed.
    #[error("Invalid qubit count declaration: {0}")]
    InvalidQubitCount(String),

    /// The netlist never declared its qubit count.
    #[error("Netlist has no INIT declaration")]
    MissingQubitCount,

    /// Error annotated with the 1-based source line it came from.
    #[error("line {line}: {source}")]
    AtLine {
        /// Line number in the netlist source.
        line: usize,
        /// The underlying error.
        #[source]
        source: Box<IrError>,
    },

    /// Gate refers to a wire outside the circuit.
    #[error("Qubit {qubit} out of range for {num_qubits}-qubit circuit{}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the circuit.
        num_qubits: usize,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Vertex not present in the DAG.
    #[error("Vertex {0} not found in DAG")]
    VertexNotFound(VertexId),

    /// Commutation requested on a pair that is not directly connected.
    #[error("Vertex {to} is not an immediate successor of vertex {from}")]
    NotAdjacent {
        /// The vertex expected to come first.
        from: VertexId,
        /// The vertex expected to follow it.
        to: VertexId,
    },

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Failure reading a netlist from disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IrError {
    /// Attach a source line number to this error.
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        IrError::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
