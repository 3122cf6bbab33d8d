//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - peephole optimizer for quantum netlists",
        style("qopt").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qopt-ir       Netlist format and wire-adjacency DAG");
    println!("  qopt-compile  Hadamard reduction and rotation/CNOT cancellation");
    println!("  qopt-cli      Command-line interface");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
