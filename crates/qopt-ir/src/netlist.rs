//! Loading and emitting textual netlists.
//!
//! A netlist is one instruction per line:
//!
//! ```text
//! # comment
//! INIT 3
//! CNOT 0 1
//! R_z 0.5 1
//! H 2
//! ```
//!
//! `INIT n` declares the number of wires and must appear exactly once,
//! before any gate. Blank lines and lines starting with `#` or `//` are
//! ignored.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::Gate;

const INIT_KEYWORD: &str = "INIT";

/// Wires are addressed by `u32` indices.
const MAX_WIRES: usize = (u32::MAX as usize).saturating_add(1);

/// An ordered gate list over a fixed number of wires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Netlist {
    /// Number of wires.
    pub num_qubits: usize,
    /// Gates in program order.
    pub gates: Vec<Gate>,
}

impl Netlist {
    /// Create a netlist from its parts.
    pub fn new(num_qubits: usize, gates: Vec<Gate>) -> Self {
        Self { num_qubits, gates }
    }

    /// Parse netlist source text.
    pub fn parse(source: &str) -> IrResult<Self> {
        let mut num_qubits: Option<usize> = None;
        let mut gates = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }

            let mut tokens = line.split_whitespace();
            if tokens.next() == Some(INIT_KEYWORD) {
                if num_qubits.is_some() {
                    return Err(IrError::InvalidQubitCount("INIT declared twice".into())
                        .at_line(line_no));
                }
                num_qubits = Some(parse_init(tokens).map_err(|e| e.at_line(line_no))?);
                continue;
            }

            if num_qubits.is_none() {
                return Err(IrError::MissingQubitCount.at_line(line_no));
            }
            gates.push(line.parse::<Gate>().map_err(|e| e.at_line(line_no))?);
        }

        let num_qubits = num_qubits.ok_or(IrError::MissingQubitCount)?;
        Ok(Self { num_qubits, gates })
    }

    /// Read and parse a netlist file.
    pub fn from_file(path: impl AsRef<Path>) -> IrResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Build the dependency DAG for this netlist.
    pub fn to_dag(&self) -> IrResult<CircuitDag> {
        CircuitDag::build(self.num_qubits, &self.gates)
    }

    /// Consume the netlist into its dependency DAG.
    pub fn into_dag(self) -> IrResult<CircuitDag> {
        self.to_dag()
    }

    /// Linearize a DAG back into a netlist.
    pub fn from_dag(dag: &CircuitDag) -> Self {
        Self {
            num_qubits: dag.num_qubits(),
            gates: dag.linearize(),
        }
    }

    /// Render the netlist in the format accepted by [`Netlist::parse`].
    pub fn emit(&self) -> String {
        let mut out = String::with_capacity(16 + self.gates.len() * 12);
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{INIT_KEYWORD} {}", self.num_qubits);
        for gate in &self.gates {
            let _ = writeln!(out, "{gate}");
        }
        out
    }

    /// Number of gates.
    #[inline]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if the netlist has no gates.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Count gates by name.
    pub fn gate_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for gate in &self.gates {
            *counts.entry(gate.name().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

fn parse_init<'a>(mut operands: impl Iterator<Item = &'a str>) -> IrResult<usize> {
    let (Some(count), None) = (operands.next(), operands.next()) else {
        return Err(IrError::InvalidQubitCount(
            "INIT takes exactly one operand".into(),
        ));
    };
    let count = count
        .parse::<usize>()
        .map_err(|_| IrError::InvalidQubitCount(format!("'{count}' is not a wire count")))?;
    if count > MAX_WIRES {
        return Err(IrError::InvalidQubitCount(format!(
            "{count} wires exceed the limit of {MAX_WIRES}"
        )));
    }
    Ok(count)
}
