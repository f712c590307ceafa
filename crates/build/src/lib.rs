//! Assembly of evaluated configuration values into `.github/` file bodies.
//!
//! Discovery says what exists and extraction says what each declaration
//! evaluates to; this crate joins the two. Each kind gets a batch
//! function taking the discovered declarations and the matching envelope
//! and returning a [`BuildOutput`]: rendered artifacts in declaration
//! order plus per-declaration failures. Workflows are the one kind with
//! cross-declaration structure, so [`workflows`] also builds the job
//! dependency graph and can fail outright on a cycle.

use std::collections::HashMap;

use gantry_discover::{Declaration, Kind};
use gantry_extract::ValueEntry;

mod codeowners;
mod dependabot;
mod error;
mod templates;
mod value;
mod workflow;

pub use codeowners::codeowners;
pub use dependabot::dependabot;
pub use error::{BuildError, BuildIssue, IssueKind, Result, ShapeError};
pub use templates::{discussion_templates, issue_templates, pr_templates};
pub use workflow::workflows;

/// One rendered file body, named after its declaration.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Declaration identifier; file naming derives from it.
    pub name: String,
    pub kind: Kind,
    pub content: String,
}

/// Everything one batch produced.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Rendered artifacts, in declaration order.
    pub artifacts: Vec<Artifact>,
    /// Declarations that produced no artifact, with the reason.
    pub errors: Vec<BuildIssue>,
}

impl BuildOutput {
    /// Fold another batch's results into this one.
    pub fn merge(&mut self, other: Self) {
        self.artifacts.extend(other.artifacts);
        self.errors.extend(other.errors);
    }

    /// True when every declaration rendered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Shared join loop for the kinds without cross-declaration structure:
/// look up each declaration's extracted value, check the object shape,
/// and hand the fields to a kind-specific renderer.
fn build_kind(
    declarations: &[Declaration],
    entries: &[ValueEntry],
    kind: Kind,
    render: impl Fn(&value::Fields) -> std::result::Result<String, IssueKind>,
) -> BuildOutput {
    let extracted: HashMap<&str, &serde_json::Value> = entries
        .iter()
        .map(|entry| (entry.name.as_str(), &entry.data))
        .collect();

    let mut output = BuildOutput::default();
    for declaration in declarations {
        let Some(data) = extracted.get(declaration.name.as_str()) else {
            output.errors.push(BuildIssue::missing(&declaration.name));
            continue;
        };
        let rendered = value::object_root(data)
            .map_err(IssueKind::from)
            .and_then(|fields| render(fields));
        match rendered {
            Ok(content) => output.artifacts.push(Artifact {
                name: declaration.name.clone(),
                kind,
                content,
            }),
            Err(reason) => output
                .errors
                .push(BuildIssue::new(&declaration.name, reason)),
        }
    }
    output
}
