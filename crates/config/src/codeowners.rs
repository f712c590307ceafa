//! CODEOWNERS declarations (`.github/CODEOWNERS`).

use serde::Serialize;

/// An ordered set of ownership rules. Order matters to GitHub: the last
/// matching pattern wins, so rules are kept exactly as declared.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Codeowners {
    pub rules: Vec<Rule>,
}

impl Codeowners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Shorthand for appending a comment-free rule.
    #[must_use]
    pub fn rule(self, pattern: impl Into<String>, owners: &[&str]) -> Self {
        self.with_rule(Rule::new(pattern, owners))
    }
}

/// One CODEOWNERS line: a path pattern and the owners it assigns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Rule {
    pub pattern: String,
    pub owners: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Rule {
    #[must_use]
    pub fn new(pattern: impl Into<String>, owners: &[&str]) -> Self {
        Self {
            pattern: pattern.into(),
            owners: owners.iter().map(|owner| (*owner).to_string()).collect(),
            comment: String::new(),
        }
    }

    /// Attach a comment rendered on its own line above the rule.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}
