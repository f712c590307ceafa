//! The `list` command: print discovered declarations without evaluating.

use std::path::Path;

use gantry_discover::{Declaration, Discovery, Kind};

/// Execute the `list` command.
///
/// Prints one line per declaration with its kind, name, source location,
/// and references. With `json` the full discovery result is printed
/// instead, parse failures included.
///
/// # Errors
///
/// Returns an error if the source tree cannot be scanned.
pub fn execute(root: &Path, json: bool) -> miette::Result<()> {
    let discovery = gantry_discover::discover(root)
        .map_err(|e| miette::miette!("Failed to scan {}: {e}", root.display()))?;

    if json {
        let rendered = serde_json::to_string_pretty(&discovery)
            .map_err(|e| miette::miette!("Failed to serialize discovery: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    for failure in &discovery.failures {
        eprintln!(
            "warning: failed to parse {}: {}",
            failure.file.display(),
            failure.message
        );
    }
    if discovery.is_empty() {
        println!("no declarations found under {}", root.display());
        return Ok(());
    }
    print!("{}", render_table(&discovery));
    Ok(())
}

fn render_table(discovery: &Discovery) -> String {
    let mut table = String::new();
    for declaration in discovery.iter() {
        table.push_str(&render_line(declaration));
        table.push('\n');
    }
    table
}

fn render_line(declaration: &Declaration) -> String {
    let kind = declaration.kind.to_string();
    let mut line = format!(
        "{kind:<22} {:<24} {}:{}",
        declaration.name,
        declaration.file.display(),
        declaration.line
    );
    if !declaration.references.is_empty() {
        let label = if declaration.kind == Kind::Job {
            "needs"
        } else {
            "jobs"
        };
        line.push_str(&format!(
            "  {label}: {}",
            declaration.references.join(", ")
        ));
    }
    line
}
