//! Optimize command implementation.

use anyhow::Result;
use console::style;
use serde::Serialize;
use tracing::debug;

use qopt_compile::{PassManagerBuilder, PassReport};
use qopt_ir::Netlist;

use super::common::{OutputFormat, load_netlist, write_netlist};

/// Pass selection and reporting options for `qopt optimize`.
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub hadamard: bool,
    pub cancel: bool,
    pub iterations: usize,
    pub verify: bool,
    pub stats: OutputFormat,
}

/// Machine-readable summary of one optimization run.
#[derive(Debug, Serialize)]
struct OptimizeSummary<'a> {
    input: &'a str,
    num_qubits: usize,
    ops_before: usize,
    ops_after: usize,
    depth_before: usize,
    depth_after: usize,
    passes: Vec<PassReport>,
}

/// Execute the optimize command.
///
/// The optimized netlist goes to `output`, or to stdout when no output file
/// is given. In the latter case the summary is printed to stderr so stdout
/// stays a valid netlist.
pub fn execute(input: &str, output: Option<&str>, options: &OptimizeOptions) -> Result<()> {
    let netlist = load_netlist(input)?;
    let num_qubits = netlist.num_qubits;
    let mut dag = netlist.into_dag()?;
    let ops_before = dag.num_ops();
    let depth_before = dag.depth()?;
    debug!("Loaded {} ops on {} qubits from {}", ops_before, num_qubits, input);

    let pm = PassManagerBuilder::new()
        .with_hadamard_reduction(options.hadamard)
        .with_cancellation(options.cancel)
        .with_iterations(options.iterations)
        .with_verification(options.verify)
        .build();

    let passes = pm.run(&mut dag)?;
    let optimized = Netlist::from_dag(&dag);
    write_netlist(&optimized, output)?;

    let summary = OptimizeSummary {
        input,
        num_qubits,
        ops_before,
        ops_after: dag.num_ops(),
        depth_before,
        depth_after: dag.depth()?,
        passes,
    };
    let text = match options.stats {
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
        OutputFormat::Text => render_summary(&summary, output),
    };

    if output.is_some() {
        println!("{text}");
    } else {
        eprintln!("{text}");
    }

    Ok(())
}

fn render_summary(summary: &OptimizeSummary<'_>, output: Option<&str>) -> String {
    let mut lines = vec![
        format!(
            "{} Optimized {} ({} qubits)",
            style("✓").green().bold(),
            style(summary.input).green(),
            summary.num_qubits
        ),
        format!(
            "  Ops:   {} -> {}",
            summary.ops_before,
            style(summary.ops_after).yellow()
        ),
        format!(
            "  Depth: {} -> {}",
            summary.depth_before,
            style(summary.depth_after).yellow()
        ),
    ];

    for report in &summary.passes {
        lines.push(format!(
            "  [round {}] {:<26} removed {}",
            report.round,
            report.pass,
            report.removed()
        ));
    }

    if let Some(path) = output {
        lines.push(format!("  Output: {}", style(path).green()));
    }

    lines.join("\n")
}
