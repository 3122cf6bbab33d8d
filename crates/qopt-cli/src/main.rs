//! qopt Command-Line Interface
//!
//! The main entry point for the `qopt` netlist optimizer.
//!
//! ```text
//! qopt optimize -i circuit.txt -o optimized.txt --stats json
//! qopt stats -i circuit.txt
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::OutputFormat;
use commands::optimize::OptimizeOptions;
use commands::{optimize, stats, version};

/// qopt - peephole optimizer for quantum gate netlists
#[derive(Parser)]
#[command(name = "qopt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a netlist
    Optimize {
        /// Input netlist file
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Skip Hadamard gate reduction
        #[arg(long)]
        no_hadamard: bool,

        /// Skip rotation and CNOT cancellation
        #[arg(long)]
        no_cancel: bool,

        /// Maximum number of optimization rounds
        #[arg(long, default_value = "1")]
        iterations: usize,

        /// Check DAG integrity after every pass
        #[arg(long)]
        verify: bool,

        /// Summary format (text, json)
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        stats: OutputFormat,
    },

    /// Show gate counts and depth of a netlist
    Stats {
        /// Input netlist file
        #[arg(short, long)]
        input: String,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging, RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Optimize {
            input,
            output,
            no_hadamard,
            no_cancel,
            iterations,
            verify,
            stats,
        } => {
            let options = OptimizeOptions {
                hadamard: !no_hadamard,
                cancel: !no_cancel,
                iterations,
                verify,
                stats,
            };
            optimize::execute(&input, output.as_deref(), &options)
        }

        Commands::Stats { input, format } => stats::execute(&input, format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
