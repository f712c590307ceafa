//! Error types for declaration extraction.
//!
//! Every failure here is terminal for its batch: extraction either returns
//! a complete envelope or nothing. Subprocess failures carry the captured
//! output so compile errors in user declarations surface verbatim.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that abort a whole extraction batch.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The configuration crate's directory could not be resolved.
    #[error("cannot resolve configuration crate directory {}", path.display())]
    ResolveRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No manifest file where one was expected.
    #[error("no Cargo.toml at {}", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("failed to read {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The manifest carries no `[package].name`, so the crate cannot be
    /// imported by the runner.
    #[error("{} declares no [package] name", path.display())]
    PackageName { path: PathBuf },

    /// The crate has no library target; declarations are only reachable
    /// through one.
    #[error(
        "crate at {} has no library target ({} does not exist)",
        root.display(),
        lib.display()
    )]
    NoLibraryTarget { root: PathBuf, lib: PathBuf },

    #[error("failed to render the runner manifest")]
    RenderManifest(#[source] toml::ser::Error),

    #[error("failed to create a scratch directory for the runner")]
    Scratch(#[source] std::io::Error),

    #[error("failed to write {}", path.display())]
    WriteRunner {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Cargo ran but did not succeed. `output` is the combined
    /// stdout/stderr of the failed invocation.
    #[error("`{command}` failed ({status})\n{output}")]
    Evaluation {
        command: String,
        status: ExitStatus,
        output: String,
    },

    /// The runner exited cleanly but printed something other than the
    /// expected envelope.
    #[error("runner output is not the expected JSON envelope: {source}\n{output}")]
    Envelope {
        #[source]
        source: serde_json::Error,
        output: String,
    },
}
