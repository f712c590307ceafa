//! Static discovery of configuration declarations.
//!
//! Walks a crate's source tree and parses each file with syn, without ever
//! compiling or executing user code. A declaration is a `pub` item whose
//! type (or struct-literal body, for type aliases) names one of the
//! `gantry_config` configuration types, in a file that actually imports the
//! matching module. The result records enough to evaluate each declaration
//! later: its name, kind, location, access form, and the identifiers its
//! `jobs` or `needs` field references.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

mod source;
mod walk;

pub use source::analyze;

/// The configuration kinds a declaration can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Workflow,
    Job,
    Dependabot,
    IssueTemplate,
    DiscussionTemplate,
    PrTemplate,
    Codeowners,
}

impl Kind {
    /// Every kind, in a fixed order.
    pub const ALL: [Self; 7] = [
        Self::Workflow,
        Self::Job,
        Self::Dependabot,
        Self::IssueTemplate,
        Self::DiscussionTemplate,
        Self::PrTemplate,
        Self::Codeowners,
    ];

    /// The `gantry_config` type name declarations of this kind annotate.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Workflow => "Workflow",
            Self::Job => "Job",
            Self::Dependabot => "Dependabot",
            Self::IssueTemplate => "IssueTemplate",
            Self::DiscussionTemplate => "DiscussionTemplate",
            Self::PrTemplate => "PrTemplate",
            Self::Codeowners => "Codeowners",
        }
    }

    /// The `gantry_config` module that defines this kind's type. A file
    /// only produces declarations of a kind if it imports this module.
    #[must_use]
    pub const fn module_segment(self) -> &'static str {
        match self {
            Self::Workflow | Self::Job => "workflow",
            Self::Dependabot => "dependabot",
            Self::IssueTemplate | Self::DiscussionTemplate | Self::PrTemplate => "templates",
            Self::Codeowners => "codeowners",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Workflow => "workflow",
            Self::Job => "job",
            Self::Dependabot => "dependabot config",
            Self::IssueTemplate => "issue template",
            Self::DiscussionTemplate => "discussion template",
            Self::PrTemplate => "pull request template",
            Self::Codeowners => "codeowners",
        };
        f.write_str(label)
    }
}

/// How generated code must evaluate a declaration to reach its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessForm {
    /// Zero-argument function: `name()`.
    Call,
    /// Plain const or static: `&NAME`.
    Path,
    /// Lazily initialized static: `&*NAME`.
    Deref,
}

/// One discovered configuration declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    /// Item identifier, which names the emitted artifact.
    pub name: String,
    pub kind: Kind,
    /// Source file the item was found in.
    pub file: PathBuf,
    /// 1-based line of the item's identifier.
    pub line: usize,
    pub access: AccessForm,
    /// Identifiers appearing in the declaration's `jobs` (workflows) or
    /// `needs` (jobs) field, in first-use order. This is how job membership
    /// and dependency edges are recovered without evaluating the macros.
    /// Empty for the other kinds.
    pub references: Vec<String>,
}

/// A file that could not be scanned. Discovery keeps going; failures are
/// reported alongside whatever else was found.
#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub file: PathBuf,
    pub message: String,
}

/// Everything discovery found across a source tree, bucketed by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    pub workflows: Vec<Declaration>,
    pub jobs: Vec<Declaration>,
    pub dependabot: Vec<Declaration>,
    pub issue_templates: Vec<Declaration>,
    pub discussion_templates: Vec<Declaration>,
    pub pr_templates: Vec<Declaration>,
    pub codeowners: Vec<Declaration>,
    pub failures: Vec<ParseFailure>,
}

impl Discovery {
    /// File deposit order inside each bucket follows the walk order, which
    /// is sorted by path, so discovery output is deterministic.
    pub fn push(&mut self, declaration: Declaration) {
        match declaration.kind {
            Kind::Workflow => self.workflows.push(declaration),
            Kind::Job => self.jobs.push(declaration),
            Kind::Dependabot => self.dependabot.push(declaration),
            Kind::IssueTemplate => self.issue_templates.push(declaration),
            Kind::DiscussionTemplate => self.discussion_templates.push(declaration),
            Kind::PrTemplate => self.pr_templates.push(declaration),
            Kind::Codeowners => self.codeowners.push(declaration),
        }
    }

    /// All declarations of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: Kind) -> &[Declaration] {
        match kind {
            Kind::Workflow => &self.workflows,
            Kind::Job => &self.jobs,
            Kind::Dependabot => &self.dependabot,
            Kind::IssueTemplate => &self.issue_templates,
            Kind::DiscussionTemplate => &self.discussion_templates,
            Kind::PrTemplate => &self.pr_templates,
            Kind::Codeowners => &self.codeowners,
        }
    }

    /// Iterate every declaration, kind by kind.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        Kind::ALL.into_iter().flat_map(|kind| self.of_kind(kind))
    }

    /// Total number of declarations found.
    #[must_use]
    pub fn declaration_count(&self) -> usize {
        Kind::ALL
            .into_iter()
            .map(|kind| self.of_kind(kind).len())
            .sum()
    }

    /// True when no declaration of any kind was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declaration_count() == 0
    }
}

/// Errors that end discovery outright. Per-file problems never do; they
/// become [`ParseFailure`] entries instead.
#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to walk source tree at {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Discover every configuration declaration under `root`.
///
/// Files are visited in sorted path order. Unreadable or unparsable files
/// are recorded as failures and skipped; only an unwalkable root is fatal.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn discover(root: &Path) -> Result<Discovery, DiscoverError> {
    let mut discovery = Discovery::default();

    for file in walk::source_files(root)? {
        let content = match std::fs::read_to_string(&file) {
            Ok(content) => content,
            Err(err) => {
                warn!("skipping unreadable file {}: {err}", file.display());
                discovery.failures.push(ParseFailure {
                    file,
                    message: format!("unreadable: {err}"),
                });
                continue;
            }
        };

        match source::analyze(&file, &content) {
            Ok(declarations) => {
                for declaration in declarations {
                    discovery.push(declaration);
                }
            }
            Err(err) => {
                warn!("skipping unparsable file {}: {err}", file.display());
                discovery.failures.push(ParseFailure {
                    message: format!("parse error at line {}: {err}", err.span().start().line),
                    file,
                });
            }
        }
    }

    tracing::info!(
        declarations = discovery.declaration_count(),
        failures = discovery.failures.len(),
        "discovery complete"
    );
    Ok(discovery)
}
