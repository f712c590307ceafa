use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Main CLI entry point for gantry.
///
/// Compiles typed Rust configuration declarations into the `.github/`
/// artifacts GitHub actually reads.
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(about = "Compile typed Rust configuration into .github/ artifacts")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline and write artifacts under `.github/`.
    #[command(about = "Discover, evaluate, and write .github/ artifacts")]
    Generate {
        /// Configuration crate to scan.
        #[arg(
            long,
            value_name = "DIR",
            default_value = ".",
            env = "GANTRY_ROOT",
            help = "Configuration crate to scan"
        )]
        root: PathBuf,

        /// Directory that receives the `.github/` tree.
        #[arg(
            long,
            value_name = "DIR",
            help = "Directory receiving the .github/ tree (defaults to the root)"
        )]
        out: Option<PathBuf>,

        /// Print target paths without writing anything.
        #[arg(long, help = "Print target paths without writing any file")]
        dry_run: bool,
    },
    /// Print discovered declarations without evaluating anything.
    #[command(about = "List discovered declarations without evaluating them")]
    List {
        /// Configuration crate to scan.
        #[arg(
            long,
            value_name = "DIR",
            default_value = ".",
            env = "GANTRY_ROOT",
            help = "Configuration crate to scan"
        )]
        root: PathBuf,

        /// Print the discovery result as JSON.
        #[arg(long, help = "Print the discovery result as JSON")]
        json: bool,
    },
}

/// Parse command line arguments into a CLI structure.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
