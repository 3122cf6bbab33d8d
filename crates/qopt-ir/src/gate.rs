//! Gate values and the instruction-line format.
//!
//! A gate is written as `NAME [CONTROL...] TARGET`, or `R_z THETA TARGET`
//! for Z rotations. Every token after the name except the last is a
//! control wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::qubit::QubitId;

const H_NAME: &str = "H";
const P_NAME: &str = "P";
const P_DAG_NAME: &str = "P_dag";
const CNOT_NAME: &str = "CNOT";
const RZ_NAME: &str = "R_z";
const DELETED_NAME: &str = "DELETED";

/// The kind of a gate.
///
/// The rewrite rules only look at the named variants. Everything else is
/// carried through as [`GateKind::Other`] and never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// Hadamard gate.
    H,
    /// Phase gate.
    P,
    /// Inverse phase gate.
    PDag,
    /// Controlled-NOT gate.
    Cnot,
    /// Rotation around Z by the given angle.
    Rz(f64),
    /// A gate the optimizer does not know, kept by name.
    Other(String),
    /// Tombstone left on a gate that was removed from its DAG.
    Deleted,
}

impl GateKind {
    /// Resolve a non-rotation gate name.
    ///
    /// `R_z` carries an angle and is handled by the parser directly.
    pub fn from_name(name: &str) -> Self {
        match name {
            H_NAME => GateKind::H,
            P_NAME => GateKind::P,
            P_DAG_NAME => GateKind::PDag,
            CNOT_NAME => GateKind::Cnot,
            other => GateKind::Other(other.to_string()),
        }
    }

    /// Get the name of this gate kind as written in a netlist.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::H => H_NAME,
            GateKind::P => P_NAME,
            GateKind::PDag => P_DAG_NAME,
            GateKind::Cnot => CNOT_NAME,
            GateKind::Rz(_) => RZ_NAME,
            GateKind::Other(name) => name,
            GateKind::Deleted => DELETED_NAME,
        }
    }
}

/// One operation in a netlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// What the gate does.
    pub kind: GateKind,
    /// The wire the gate acts on.
    pub target: QubitId,
    /// Control wires, in the order they were written.
    pub controls: Vec<QubitId>,
}

impl Gate {
    /// Create a gate from its parts.
    pub fn new(kind: GateKind, target: QubitId, controls: Vec<QubitId>) -> Self {
        Self {
            kind,
            target,
            controls,
        }
    }

    /// Create an uncontrolled gate.
    pub fn single(kind: GateKind, target: impl Into<QubitId>) -> Self {
        Self::new(kind, target.into(), vec![])
    }

    /// Create a CNOT.
    pub fn cnot(control: impl Into<QubitId>, target: impl Into<QubitId>) -> Self {
        Self::new(GateKind::Cnot, target.into(), vec![control.into()])
    }

    /// Create a Z rotation.
    pub fn rz(theta: f64, target: impl Into<QubitId>) -> Self {
        Self::single(GateKind::Rz(theta), target)
    }

    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Rotation angle, present only for `R_z`.
    #[inline]
    pub fn theta(&self) -> Option<f64> {
        match self.kind {
            GateKind::Rz(theta) => Some(theta),
            _ => None,
        }
    }

    /// Mutable rotation angle, present only for `R_z`.
    #[inline]
    pub fn theta_mut(&mut self) -> Option<&mut f64> {
        match &mut self.kind {
            GateKind::Rz(theta) => Some(theta),
            _ => None,
        }
    }

    /// All wires touched by the gate: controls first, then the target.
    pub fn all_qubits(&self) -> Vec<QubitId> {
        let mut qubits = self.controls.clone();
        qubits.push(self.target);
        qubits
    }

    /// Check whether the gate touches `qubit`.
    #[inline]
    pub fn touches(&self, qubit: QubitId) -> bool {
        self.target == qubit || self.controls.contains(&qubit)
    }

    /// Check whether two gates share at least one wire.
    pub fn shares_wire_with(&self, other: &Gate) -> bool {
        self.all_qubits().into_iter().any(|q| other.touches(q))
    }

    /// Check whether this is an uncontrolled gate of `kind` on `qubit`.
    ///
    /// Angles are ignored, so any `R_z` matches `GateKind::Rz(_)`.
    pub fn is_single(&self, kind: &GateKind, qubit: QubitId) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
            && self.target == qubit
            && self.controls.is_empty()
    }

    /// Mark the gate as deleted.
    pub fn delete(&mut self) {
        self.kind = GateKind::Deleted;
    }

    /// Check whether the gate carries the deletion tombstone.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.kind == GateKind::Deleted
    }
}

fn parse_qubit(token: &str) -> IrResult<QubitId> {
    token
        .parse::<u32>()
        .map(QubitId)
        .map_err(|_| IrError::InvalidQubit(token.to_string()))
}

impl FromStr for Gate {
    type Err = IrError;

    fn from_str(line: &str) -> IrResult<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, operands)) = tokens.split_first() else {
            return Err(IrError::EmptyInstruction);
        };

        if name == RZ_NAME {
            let [theta, target] = operands else {
                return Err(IrError::RotationArity {
                    found: operands.len(),
                });
            };
            let theta = theta
                .parse::<f64>()
                .map_err(|_| IrError::InvalidParameter((*theta).to_string()))?;
            return Ok(Gate::rz(theta, parse_qubit(target)?));
        }

        let Some((target, controls)) = operands.split_last() else {
            return Err(IrError::MissingTarget(name.to_string()));
        };
        let controls = controls
            .iter()
            .map(|token| parse_qubit(token))
            .collect::<IrResult<Vec<_>>>()?;

        Ok(Gate::new(
            GateKind::from_name(name),
            parse_qubit(target)?,
            controls,
        ))
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let GateKind::Rz(theta) = self.kind {
            write!(f, " {theta}")?;
        }
        for control in &self.controls {
            write!(f, " {}", control.0)?;
        }
        write!(f, " {}", self.target.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_qubit() {
        let gate: Gate = "H 1".parse().unwrap();
        assert_eq!(gate.kind, GateKind::H);
        assert_eq!(gate.name(), "H");
        assert_eq!(gate.target, QubitId(1));
        assert!(gate.controls.is_empty());
        assert_eq!(gate.all_qubits(), vec![QubitId(1)]);
        assert_eq!(gate.theta(), None);
    }

    #[test]
    fn test_two_qubit() {
        let gate: Gate = "CNOT 1 3".parse().unwrap();
        assert_eq!(gate.kind, GateKind::Cnot);
        assert_eq!(gate.target, QubitId(3));
        assert_eq!(gate.controls, vec![QubitId(1)]);
        assert_eq!(gate.all_qubits(), vec![QubitId(1), QubitId(3)]);
    }

    #[test]
    fn test_rotation() {
        let gate: Gate = "R_z 0.25 2".parse().unwrap();
        assert_eq!(gate.kind, GateKind::Rz(0.25));
        assert_eq!(gate.theta(), Some(0.25));
        assert_eq!(gate.target, QubitId(2));
        assert_eq!(gate.all_qubits(), vec![QubitId(2)]);
    }

    #[test]
    fn test_unknown_gate_passes_through() {
        let gate: Gate = "CCZ 0 3 4".parse().unwrap();
        assert_eq!(gate.kind, GateKind::Other("CCZ".into()));
        assert_eq!(gate.controls, vec![QubitId(0), QubitId(3)]);
        assert_eq!(gate.to_string(), "CCZ 0 3 4");
    }

    #[test]
    fn test_malformed_instructions() {
        assert!(matches!(
            "".parse::<Gate>(),
            Err(IrError::EmptyInstruction)
        ));
        assert!(matches!(
            "H".parse::<Gate>(),
            Err(IrError::MissingTarget(name)) if name == "H"
        ));
        assert!(matches!(
            "R_z 0".parse::<Gate>(),
            Err(IrError::RotationArity { found: 1 })
        ));
        assert!(matches!(
            "R_z 1 2 3".parse::<Gate>(),
            Err(IrError::RotationArity { found: 3 })
        ));
        assert!(matches!(
            "R_z pi 0".parse::<Gate>(),
            Err(IrError::InvalidParameter(_))
        ));
        assert!(matches!(
            "CNOT a 1".parse::<Gate>(),
            Err(IrError::InvalidQubit(token)) if token == "a"
        ));
        assert!(matches!(
            "X -1".parse::<Gate>(),
            Err(IrError::InvalidQubit(_))
        ));
    }

    #[test]
    fn test_equality_compares_all_fields() {
        assert_eq!(Gate::cnot(0u32, 1u32), "CNOT 0 1".parse().unwrap());
        assert_ne!(Gate::cnot(0u32, 1u32), Gate::cnot(1u32, 0u32));
        assert_ne!(Gate::rz(1.0, 0u32), Gate::rz(2.0, 0u32));
        assert_ne!(
            Gate::single(GateKind::P, 0u32),
            Gate::single(GateKind::PDag, 0u32)
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Gate::cnot(0u32, 1u32);
        let mut copy = original.clone();
        copy.controls.push(QubitId(2));
        copy.delete();
        assert_eq!(original.controls, vec![QubitId(0)]);
        assert!(!original.is_deleted());
        assert!(copy.is_deleted());
    }

    #[test]
    fn test_display_round_trip() {
        for line in ["H 0", "P_dag 3", "CNOT 0 2", "R_z 5 0", "R_z -0.5 1", "CCX 0 1 2"] {
            let gate: Gate = line.parse().unwrap();
            assert_eq!(gate.to_string(), line);
            assert_eq!(gate.to_string().parse::<Gate>().unwrap(), gate);
        }
    }

    #[test]
    fn test_is_single() {
        let h = Gate::single(GateKind::H, 1u32);
        assert!(h.is_single(&GateKind::H, QubitId(1)));
        assert!(!h.is_single(&GateKind::H, QubitId(0)));
        assert!(Gate::rz(3.0, 0u32).is_single(&GateKind::Rz(0.0), QubitId(0)));
        assert!(!Gate::cnot(0u32, 1u32).is_single(&GateKind::Cnot, QubitId(1)));
    }

    #[test]
    fn test_shares_wire() {
        let a = Gate::cnot(0u32, 2u32);
        assert!(a.shares_wire_with(&Gate::single(GateKind::H, 2u32)));
        assert!(a.shares_wire_with(&Gate::cnot(0u32, 1u32)));
        assert!(!a.shares_wire_with(&Gate::single(GateKind::H, 1u32)));
    }
}
