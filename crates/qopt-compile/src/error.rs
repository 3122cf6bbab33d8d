//! Error types for the compilation crate.

use qopt_ir::{IrError, VertexId};
use thiserror::Error;

/// Errors that can occur during optimization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// A search routine was handed a vertex of the wrong kind.
    #[error("Vertex {vertex} holds '{found}', expected {expected}")]
    UnexpectedGate {
        vertex: VertexId,
        expected: &'static str,
        found: String,
    },

    /// Pass execution failed.
    #[error("Pass '{name}' failed: {reason}")]
    PassFailed { name: String, reason: String },
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
