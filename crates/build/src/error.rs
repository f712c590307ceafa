//! Build failures, split by blast radius.
//!
//! A [`BuildError`] abandons the whole batch; a [`BuildIssue`] pins a
//! problem to one declaration and lets the rest of the batch render.

use gantry_graph::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

/// Failures that no declaration can be blamed for alone.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The job dependency graph admits no order.
    #[error(transparent)]
    Cycle(#[from] GraphError),
}

/// Extracted data whose JSON shape does not match any configuration type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("extracted data is not an object")]
    NotAnObject,

    #[error("step {index} is not an object")]
    StepNotAnObject { index: usize },

    #[error("body element {index} is not an object")]
    FormElementNotAnObject { index: usize },

    /// The element's fields match none of the form element variants.
    #[error("body element {index} matches no form element shape")]
    UnknownFormElement { index: usize },
}

/// What went wrong with one declaration.
#[derive(Debug, Clone, Error)]
pub enum IssueKind {
    /// Discovery saw the declaration but the evaluation envelope carries
    /// no entry under its name.
    #[error("extraction data not found")]
    MissingExtraction,

    /// A `needs` edge that points outside the discovered job set.
    #[error(transparent)]
    Dependency(#[from] GraphError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("failed to render: {0}")]
    Emit(String),
}

/// A declaration that produced no artifact, and why.
#[derive(Debug, Clone)]
pub struct BuildIssue {
    /// Name of the declaration at fault.
    pub declaration: String,
    pub kind: IssueKind,
}

impl BuildIssue {
    pub(crate) fn new(declaration: &str, kind: IssueKind) -> Self {
        Self {
            declaration: declaration.to_string(),
            kind,
        }
    }

    pub(crate) fn missing(declaration: &str) -> Self {
        Self::new(declaration, IssueKind::MissingExtraction)
    }
}

impl std::fmt::Display for BuildIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.declaration, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_extraction_issue_names_the_declaration() {
        let issue = BuildIssue::missing("release");
        assert_eq!(issue.to_string(), "release: extraction data not found");
    }

    #[test]
    fn test_shape_error_carries_the_element_index() {
        let issue = BuildIssue::new(
            "bug-report",
            IssueKind::Shape(ShapeError::UnknownFormElement { index: 3 }),
        );
        assert_eq!(
            issue.to_string(),
            "bug-report: body element 3 matches no form element shape"
        );
    }

    #[test]
    fn test_cycle_error_is_terminal_not_an_issue() {
        let mut graph = gantry_graph::JobGraph::new();
        graph.add_job("a");
        graph.add_job("b");
        graph.add_dependency("a", "b").unwrap();
        graph.add_dependency("b", "a").unwrap();
        let error = BuildError::from(graph.topological_order().unwrap_err());
        assert!(error.to_string().contains("cycle"));
    }
}
