//! Dependabot configuration declarations (`.github/dependabot.yml`).

use serde::Serialize;

/// Top-level Dependabot configuration. `version` is the schema version and
/// is always 2 for current GitHub.
#[derive(Debug, Clone, Serialize)]
pub struct Dependabot {
    pub version: u32,
    pub updates: Vec<Update>,
}

impl Default for Dependabot {
    fn default() -> Self {
        Self {
            version: 2,
            updates: Vec::new(),
        }
    }
}

impl Dependabot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_update(mut self, update: Update) -> Self {
        self.updates.push(update);
        self
    }
}

/// One package-ecosystem update block.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Update {
    pub package_ecosystem: String,
    pub directory: String,
    pub schedule: Schedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_pull_requests_limit: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<String>,
}

impl Update {
    #[must_use]
    pub fn new(
        package_ecosystem: impl Into<String>,
        directory: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            package_ecosystem: package_ecosystem.into(),
            directory: directory.into(),
            schedule: Schedule {
                interval: interval.into(),
                ..Schedule::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.open_pull_requests_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

/// Update cadence for one ecosystem.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schedule {
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}
