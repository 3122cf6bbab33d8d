//! Stats command implementation.

use std::collections::BTreeMap;

use anyhow::Result;
use console::style;
use serde::Serialize;

use super::common::{OutputFormat, load_netlist};

#[derive(Debug, Serialize)]
struct NetlistStats {
    num_qubits: usize,
    num_ops: usize,
    depth: usize,
    gate_counts: BTreeMap<String, usize>,
}

/// Execute the stats command.
pub fn execute(input: &str, format: OutputFormat) -> Result<()> {
    let netlist = load_netlist(input)?;
    let dag = netlist.to_dag()?;

    let stats = NetlistStats {
        num_qubits: netlist.num_qubits,
        num_ops: dag.num_ops(),
        depth: dag.depth()?,
        gate_counts: netlist.gate_counts(),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            println!("{} {}", style("Netlist:").bold(), style(input).green());
            println!("  Qubits: {}", stats.num_qubits);
            println!("  Ops:    {}", stats.num_ops);
            println!("  Depth:  {}", stats.depth);
            if !stats.gate_counts.is_empty() {
                println!("  Gates:");
                for (name, count) in &stats.gate_counts {
                    println!("    {:<8} {:>6}", style(name).cyan(), count);
                }
            }
        }
    }

    Ok(())
}
