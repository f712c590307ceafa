//! GitHub Actions workflow and job declarations.
//!
//! The types here serialize to the exact key spelling GitHub expects
//! (`runs-on`, `paths-ignore`, `if`, ...), so a fully assembled [`Workflow`]
//! turns into a valid `.github/workflows/*.yml` body with no further
//! mapping.

use indexmap::IndexMap;
use serde::Serialize;

/// Insertion-ordered job mapping, keyed by job id.
pub type JobMap = IndexMap<String, Job>;

/// A complete GitHub Actions workflow.
///
/// Construct one per top-level declaration; the `jobs` field is usually
/// filled with the [`jobs!`](crate::jobs) macro so each referenced job stays
/// visible as an identifier in the source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Workflow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "on")]
    pub on: On,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub permissions: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Concurrency>,
    pub jobs: JobMap,
}

/// Workflow trigger set. Every trigger is optional; presence alone decides
/// whether the trigger appears in the output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct On {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<Push>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_dispatch: Option<WorkflowDispatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_call: Option<WorkflowCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<Schedule>>,
}

/// `on.push` trigger.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Push {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths_ignore: Vec<String>,
}

/// `on.pull_request` trigger.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PullRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths_ignore: Vec<String>,
}

/// `on.workflow_dispatch` trigger with optional typed inputs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowDispatch {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, DispatchInput>,
}

/// One `workflow_dispatch` input definition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchInput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// `on.workflow_call` trigger. GitHub accepts it bare, so there is nothing
/// to configure.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowCall {}

/// One `on.schedule` entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schedule {
    pub cron: String,
}

/// Workflow- or job-level concurrency group.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Concurrency {
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_in_progress: Option<bool>,
}

/// Runner selection: a single label or a label list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RunsOn {
    Label(String),
    Labels(Vec<String>),
}

impl Default for RunsOn {
    fn default() -> Self {
        Self::Label("ubuntu-latest".to_string())
    }
}

impl From<&str> for RunsOn {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for RunsOn {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}

impl From<Vec<String>> for RunsOn {
    fn from(labels: Vec<String>) -> Self {
        Self::Labels(labels)
    }
}

/// A single job inside a workflow.
///
/// `name` is optional; when set it becomes the job's key in the workflow
/// job mapping (and its display name), otherwise the declaration's own
/// identifier is used. `needs` lists declaration identifiers, normally via
/// the [`needs!`](crate::needs) macro.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub runs_on: RunsOn,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_cond: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

/// A single step within a job.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_cond: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(rename = "with", skip_serializing_if = "IndexMap::is_empty")]
    pub with_inputs: IndexMap<String, serde_yaml::Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
}

impl Step {
    /// Create a step that runs an action.
    #[must_use]
    pub fn uses(action: impl Into<String>) -> Self {
        Self {
            uses: Some(action.into()),
            ..Self::default()
        }
    }

    /// Create a step that runs a shell command.
    #[must_use]
    pub fn run(command: impl Into<String>) -> Self {
        Self {
            run: Some(command.into()),
            ..Self::default()
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the step id for cross-step references.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `if:` condition.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.if_cond = Some(condition.into());
        self
    }

    /// Add an action input (`with:` entry).
    #[must_use]
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.with_inputs.insert(key.into(), value.into());
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

/// Build a [`JobMap`] from job declaration identifiers.
///
/// `jobs![build, test]` calls each identifier as a zero-argument function
/// and keys the result under the identifier's own name. Keeping the
/// identifiers bare in the source is what lets static discovery see which
/// jobs a workflow references without evaluating anything.
#[macro_export]
macro_rules! jobs {
    ($($job:ident),* $(,)?) => {{
        let mut map = $crate::workflow::JobMap::new();
        $(
            map.insert(stringify!($job).to_string(), $job());
        )*
        map
    }};
}

/// Build a `needs` list from job declaration identifiers.
///
/// `needs![build, lint]` evaluates to `vec!["build", "lint"]`; the
/// identifiers stay visible to static discovery, which is how the job
/// dependency graph is assembled.
#[macro_export]
macro_rules! needs {
    ($($job:ident),* $(,)?) => {
        ::std::vec![$(stringify!($job).to_string()),*]
    };
}
