//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use qopt_ir::Netlist;

/// How summaries are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, styled text.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Load a netlist from a file.
pub fn load_netlist(path: &str) -> Result<Netlist> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    Netlist::parse(&source).with_context(|| format!("Failed to parse netlist: {path}"))
}

/// Write emitted netlist text to `path`, or to stdout when no path is given.
pub fn write_netlist(netlist: &Netlist, path: Option<&str>) -> Result<()> {
    let content = netlist.emit();
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))
        }
        None => {
            print!("{content}");
            Ok(())
        }
    }
}
