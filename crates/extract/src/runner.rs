//! Runs the synthesized project under Cargo and captures its output.
//!
//! The project lives in a [`tempfile::TempDir`], which is deleted when the
//! guard drops, so scratch state never outlives a batch even on error
//! paths. Two blocking invocations per batch: `cargo generate-lockfile`
//! resolves the user crate's dependency graph, then `cargo run --quiet`
//! compiles and evaluates the declarations.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{ExtractError, Result};

/// The Cargo binary, resolved once per process: `$CARGO` when set (as it
/// is when gantry itself runs under Cargo), plain `cargo` otherwise.
fn cargo_binary() -> &'static Path {
    static CARGO: OnceLock<PathBuf> = OnceLock::new();
    CARGO
        .get_or_init(|| {
            std::env::var_os("CARGO").map_or_else(|| PathBuf::from("cargo"), PathBuf::from)
        })
        .as_path()
}

/// Materialize the runner project and evaluate it, returning its stdout.
pub(crate) fn evaluate(manifest: &str, program: &str) -> Result<String> {
    let scratch = tempfile::TempDir::new().map_err(ExtractError::Scratch)?;
    write_file(scratch.path().join("Cargo.toml"), manifest)?;
    write_file(scratch.path().join("src").join("main.rs"), program)?;

    run(scratch.path(), &["generate-lockfile"])?;
    run(scratch.path(), &["run", "--quiet"])
}

fn write_file(path: PathBuf, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ExtractError::WriteRunner {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, content).map_err(|source| ExtractError::WriteRunner { path, source })
}

fn run(dir: &Path, args: &[&str]) -> Result<String> {
    let command = format!("{} {}", cargo_binary().display(), args.join(" "));
    debug!("running `{command}` in {}", dir.display());

    let output = Command::new(cargo_binary())
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| ExtractError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(ExtractError::Evaluation {
            command,
            status: output.status,
            output: combined_output(&output),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Stdout followed by stderr, for error reports. Compile errors from the
/// user's declarations land on stderr and must not be lost.
fn combined_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }
    text
}
