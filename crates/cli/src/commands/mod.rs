pub mod generate;
pub mod list;

use crate::cli::{Cli, Commands};

/// Dispatch the parsed command line to its implementation.
pub fn run(cli: Cli) -> miette::Result<()> {
    match cli.command {
        Commands::Generate { root, out, dry_run } => {
            generate::execute(&root, out.as_deref(), dry_run)
        }
        Commands::List { root, json } => list::execute(&root, json),
    }
}
