//! Workflow assembly.
//!
//! Extracted workflow and job values come back as plain JSON. This module
//! re-types them into [`Workflow`] and [`Job`], orders the jobs by one
//! global topological sort over the statically harvested `needs` edges,
//! and attaches to each workflow the jobs its `jobs` field referenced.

use std::collections::{HashMap, HashSet};

use gantry_config::emit;
use gantry_config::workflow::{
    Concurrency, DispatchInput, Job, JobMap, On, PullRequest, Push, RunsOn, Schedule, Step,
    Workflow, WorkflowCall, WorkflowDispatch,
};
use gantry_discover::{Declaration, Kind};
use gantry_extract::WorkflowEnvelope;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{BuildIssue, IssueKind, Result, ShapeError};
use crate::value::{self, Fields};
use crate::{Artifact, BuildOutput};

/// Build every discovered workflow against the evaluation envelope.
///
/// A dependency cycle poisons the shared job order and fails the whole
/// batch; every other problem is pinned to one declaration and the rest
/// of the batch still renders.
#[tracing::instrument(skip_all, fields(workflows = workflows.len(), jobs = jobs.len()))]
pub fn workflows(
    workflows: &[Declaration],
    jobs: &[Declaration],
    envelope: &WorkflowEnvelope,
) -> Result<BuildOutput> {
    let mut output = BuildOutput::default();

    let extracted_jobs: HashMap<&str, &Value> = envelope
        .jobs
        .iter()
        .map(|entry| (entry.name.as_str(), &entry.data))
        .collect();
    let built_jobs = reconstruct_jobs(jobs, &extracted_jobs, &mut output);
    let order = job_order(jobs, &mut output)?;
    debug!(jobs = order.len(), "job order resolved");

    let extracted_workflows: HashMap<&str, &Value> = envelope
        .workflows
        .iter()
        .map(|entry| (entry.name.as_str(), &entry.data))
        .collect();
    for declaration in workflows {
        let Some(data) = extracted_workflows.get(declaration.name.as_str()) else {
            output.errors.push(BuildIssue::missing(&declaration.name));
            continue;
        };
        match assemble(declaration, data, &order, &built_jobs) {
            Ok(artifact) => output.artifacts.push(artifact),
            Err(kind) => output.errors.push(BuildIssue::new(&declaration.name, kind)),
        }
    }

    Ok(output)
}

/// Re-type every extracted job. Failures land on the job declaration
/// itself, not on the workflows that reference it.
fn reconstruct_jobs<'a>(
    jobs: &'a [Declaration],
    extracted: &HashMap<&str, &Value>,
    output: &mut BuildOutput,
) -> HashMap<&'a str, Job> {
    let mut built = HashMap::new();
    for declaration in jobs {
        let Some(data) = extracted.get(declaration.name.as_str()) else {
            output.errors.push(BuildIssue::missing(&declaration.name));
            continue;
        };
        match value::object_root(data).and_then(job_from) {
            Ok(job) => {
                built.insert(declaration.name.as_str(), job);
            }
            Err(shape) => output
                .errors
                .push(BuildIssue::new(&declaration.name, shape.into())),
        }
    }
    built
}

/// One global ordering over all discovered jobs. A `needs` reference to
/// an unknown job is reported and its edge dropped; a cycle is terminal.
fn job_order(jobs: &[Declaration], output: &mut BuildOutput) -> Result<Vec<String>> {
    let mut graph = gantry_graph::JobGraph::new();
    for declaration in jobs {
        graph.add_job(&declaration.name);
    }
    for declaration in jobs {
        for needed in &declaration.references {
            if let Err(error) = graph.add_dependency(&declaration.name, needed) {
                output
                    .errors
                    .push(BuildIssue::new(&declaration.name, IssueKind::Dependency(error)));
            }
        }
    }
    Ok(graph.topological_order()?)
}

fn assemble(
    declaration: &Declaration,
    data: &Value,
    order: &[String],
    built_jobs: &HashMap<&str, Job>,
) -> std::result::Result<Artifact, IssueKind> {
    let fields = value::object_root(data)?;
    let mut workflow = workflow_from(fields);

    let referenced: HashSet<&str> = declaration.references.iter().map(String::as_str).collect();
    for name in order.iter().filter(|name| referenced.contains(name.as_str())) {
        // A referenced job absent here was already reported during
        // reconstruction; the workflow renders without it.
        let Some(job) = built_jobs.get(name.as_str()) else {
            continue;
        };
        let key = if job.name.is_empty() {
            name.clone()
        } else {
            job.name.clone()
        };
        workflow.jobs.insert(key, job.clone());
    }

    let content = emit::workflow(&workflow).map_err(|error| IssueKind::Emit(error.to_string()))?;
    Ok(Artifact {
        name: declaration.name.clone(),
        kind: Kind::Workflow,
        content,
    })
}

/// Everything except `jobs`, which assembly owns. The extracted value
/// carries an evaluation-time job map too, but its entries lost their
/// order crossing JSON, so it is ignored in favor of the envelope's
/// per-job entries placed in dependency order.
fn workflow_from(fields: &Fields) -> Workflow {
    Workflow {
        name: value::string(fields, "name"),
        on: triggers_from(fields.get("on")),
        permissions: value::string_map(fields, "permissions"),
        env: value::string_map(fields, "env"),
        concurrency: concurrency_from(fields.get("concurrency")),
        jobs: JobMap::new(),
    }
}

fn triggers_from(value: Option<&Value>) -> On {
    let Some(Value::Object(on)) = value else {
        return On::default();
    };
    On {
        push: on.get("push").and_then(Value::as_object).map(push_from),
        pull_request: on
            .get("pull_request")
            .and_then(Value::as_object)
            .map(pull_request_from),
        workflow_dispatch: on
            .get("workflow_dispatch")
            .and_then(Value::as_object)
            .map(dispatch_from),
        workflow_call: on.contains_key("workflow_call").then(WorkflowCall::default),
        schedule: on
            .get("schedule")
            .and_then(Value::as_array)
            .map(|entries| schedule_from(entries)),
    }
}

fn push_from(fields: &Fields) -> Push {
    Push {
        branches: value::string_list(fields, "branches"),
        tags: value::string_list(fields, "tags"),
        paths: value::string_list(fields, "paths"),
        paths_ignore: value::string_list(fields, "paths-ignore"),
    }
}

fn pull_request_from(fields: &Fields) -> PullRequest {
    PullRequest {
        branches: value::string_list(fields, "branches"),
        types: value::string_list(fields, "types"),
        paths: value::string_list(fields, "paths"),
        paths_ignore: value::string_list(fields, "paths-ignore"),
    }
}

fn dispatch_from(fields: &Fields) -> WorkflowDispatch {
    let mut inputs = IndexMap::new();
    if let Some(Value::Object(raw)) = fields.get("inputs") {
        for (name, input) in raw {
            let Some(input) = input.as_object() else {
                continue;
            };
            inputs.insert(
                name.clone(),
                DispatchInput {
                    description: value::string(input, "description"),
                    required: value::boolean(input, "required"),
                    default: value::opt_string(input, "default"),
                    input_type: value::opt_string(input, "type"),
                    options: value::string_list(input, "options"),
                },
            );
        }
    }
    WorkflowDispatch { inputs }
}

fn schedule_from(entries: &[Value]) -> Vec<Schedule> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| Schedule {
            cron: value::string(entry, "cron"),
        })
        .collect()
}

fn concurrency_from(value: Option<&Value>) -> Option<Concurrency> {
    let fields = value?.as_object()?;
    Some(Concurrency {
        group: value::string(fields, "group"),
        cancel_in_progress: value::boolean(fields, "cancel-in-progress"),
    })
}

/// Job fields as evaluation serialized them. `needs` passes through
/// verbatim; the dependency graph is built from the statically harvested
/// references, not from this field.
fn job_from(fields: &Fields) -> std::result::Result<Job, ShapeError> {
    let mut steps = Vec::new();
    if let Some(raw) = fields.get("steps").and_then(Value::as_array) {
        for (index, step) in raw.iter().enumerate() {
            let Some(step) = step.as_object() else {
                return Err(ShapeError::StepNotAnObject { index });
            };
            steps.push(step_from(step));
        }
    }
    Ok(Job {
        name: value::string(fields, "name"),
        runs_on: runs_on_from(fields.get("runs-on")),
        needs: value::string_list(fields, "needs"),
        if_cond: value::opt_string(fields, "if"),
        env: value::string_map(fields, "env"),
        timeout_minutes: value::unsigned(fields, "timeout-minutes"),
        continue_on_error: value::boolean(fields, "continue-on-error"),
        steps,
    })
}

fn runs_on_from(value: Option<&Value>) -> RunsOn {
    match value {
        Some(Value::String(label)) => RunsOn::Label(label.clone()),
        Some(Value::Array(labels)) => RunsOn::Labels(
            labels
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        _ => RunsOn::default(),
    }
}

fn step_from(fields: &Fields) -> Step {
    Step {
        name: value::string(fields, "name"),
        id: value::opt_string(fields, "id"),
        if_cond: value::opt_string(fields, "if"),
        uses: value::opt_string(fields, "uses"),
        run: value::opt_string(fields, "run"),
        shell: value::opt_string(fields, "shell"),
        working_directory: value::opt_string(fields, "working-directory"),
        with_inputs: step_inputs(fields.get("with")),
        env: value::string_map(fields, "env"),
        continue_on_error: value::boolean(fields, "continue-on-error"),
    }
}

/// `with:` values keep their full YAML type range, not just strings.
fn step_inputs(value: Option<&Value>) -> IndexMap<String, serde_yaml::Value> {
    let mut inputs = IndexMap::new();
    if let Some(Value::Object(raw)) = value {
        for (key, value) in raw {
            if let Ok(converted) = serde_yaml::to_value(value) {
                inputs.insert(key.clone(), converted);
            }
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gantry_discover::AccessForm;
    use gantry_extract::ValueEntry;
    use serde_json::json;

    use super::*;

    fn declaration(name: &str, kind: Kind, references: &[&str]) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            file: PathBuf::from("src/lib.rs"),
            line: 1,
            access: AccessForm::Call,
            references: references.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    fn entry<T: serde::Serialize>(name: &str, value: &T) -> ValueEntry {
        ValueEntry {
            name: name.to_string(),
            data: serde_json::to_value(value).unwrap(),
        }
    }

    fn checkout_job() -> Job {
        Job {
            runs_on: "ubuntu-latest".into(),
            steps: vec![
                Step::uses("actions/checkout@v4").with_name("Checkout"),
                Step::run("cargo test").with_env("RUST_BACKTRACE", "1"),
            ],
            ..Job::default()
        }
    }

    #[test]
    fn test_workflow_fields_round_trip() {
        let mut inputs = IndexMap::new();
        inputs.insert(
            "environment".to_string(),
            DispatchInput {
                description: "Target environment".to_string(),
                required: Some(true),
                default: Some("staging".to_string()),
                input_type: Some("choice".to_string()),
                options: vec!["staging".to_string(), "production".to_string()],
            },
        );
        let original = Workflow {
            name: "Release".to_string(),
            on: On {
                push: Some(Push {
                    tags: vec!["v*".to_string()],
                    ..Push::default()
                }),
                workflow_dispatch: Some(WorkflowDispatch { inputs }),
                workflow_call: Some(WorkflowCall {}),
                schedule: Some(vec![Schedule {
                    cron: "0 4 * * 1".to_string(),
                }]),
                ..On::default()
            },
            concurrency: Some(Concurrency {
                group: "release-${{ github.ref }}".to_string(),
                cancel_in_progress: Some(true),
            }),
            ..Workflow::default()
        };
        let data = serde_json::to_value(&original).unwrap();

        let rebuilt = workflow_from(data.as_object().unwrap());
        assert_eq!(serde_json::to_value(&rebuilt).unwrap(), data);
    }

    #[test]
    fn test_job_fields_round_trip() {
        let original = Job {
            name: "Integration".to_string(),
            runs_on: RunsOn::Labels(vec!["self-hosted".to_string(), "linux".to_string()]),
            needs: vec!["build".to_string()],
            if_cond: Some("github.ref == 'refs/heads/main'".to_string()),
            timeout_minutes: Some(30),
            continue_on_error: Some(false),
            steps: vec![
                Step::uses("actions/cache@v4")
                    .with_id("cache")
                    .with_input("path", "~/.cargo")
                    .with_input("fail-on-cache-miss", serde_yaml::Value::Bool(true)),
                Step::run("cargo test --workspace")
                    .with_condition("steps.cache.outputs.cache-hit != 'true'")
                    .with_working_directory("crates")
                    .with_env("RUST_LOG", "debug"),
            ],
            ..Job::default()
        };
        let data = serde_json::to_value(&original).unwrap();

        let rebuilt = job_from(data.as_object().unwrap()).unwrap();
        assert_eq!(serde_json::to_value(&rebuilt).unwrap(), data);
    }

    #[test]
    fn test_runs_on_forms() {
        assert_eq!(
            runs_on_from(Some(&json!("macos-14"))),
            RunsOn::Label("macos-14".to_string())
        );
        assert_eq!(
            runs_on_from(Some(&json!(["self-hosted", "gpu"]))),
            RunsOn::Labels(vec!["self-hosted".to_string(), "gpu".to_string()])
        );
        assert_eq!(runs_on_from(None), RunsOn::default());
    }

    #[test]
    fn test_malformed_step_is_a_shape_error() {
        let data = json!({"runs-on": "ubuntu-latest", "steps": [{"run": "ok"}, 42]});
        let error = job_from(data.as_object().unwrap()).unwrap_err();
        assert_eq!(error, ShapeError::StepNotAnObject { index: 1 });
    }

    #[test]
    fn test_assembly_orders_jobs_and_ignores_the_inline_map() {
        let declarations = [declaration("ci", Kind::Workflow, &["test", "build"])];
        let jobs = [
            declaration("test", Kind::Job, &["build"]),
            declaration("build", Kind::Job, &[]),
        ];
        // The workflow's own job map carries a decoy entry that assembly
        // must discard in favor of the envelope's job entries.
        let mut inline = JobMap::new();
        inline.insert("decoy".to_string(), Job::default());
        let workflow = Workflow {
            name: "CI".to_string(),
            jobs: inline,
            ..Workflow::default()
        };
        let envelope = WorkflowEnvelope {
            workflows: vec![entry("ci", &workflow)],
            jobs: vec![
                entry("test", &Job { needs: vec!["build".to_string()], ..checkout_job() }),
                entry("build", &checkout_job()),
            ],
        };

        let output = workflows(&declarations, &jobs, &envelope).unwrap();
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.artifacts.len(), 1);

        let yaml = &output.artifacts[0].content;
        assert!(yaml.contains("name: CI"));
        assert!(!yaml.contains("decoy"));
        let build_at = yaml.find("\n  build:").unwrap();
        let test_at = yaml.find("\n  test:").unwrap();
        assert!(build_at < test_at, "build must precede its dependent:\n{yaml}");
    }

    #[test]
    fn test_unknown_needs_reports_and_renders_the_rest() {
        let declarations = [declaration("ci", Kind::Workflow, &["build"])];
        let jobs = [declaration("build", Kind::Job, &["ghost"])];
        let envelope = WorkflowEnvelope {
            workflows: vec![entry("ci", &Workflow::default())],
            jobs: vec![entry("build", &checkout_job())],
        };

        let output = workflows(&declarations, &jobs, &envelope).unwrap();
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.errors.len(), 1);
        let message = output.errors[0].to_string();
        assert!(message.contains("ghost"), "got: {message}");
        assert!(output.artifacts[0].content.contains("build:"));
    }

    #[test]
    fn test_extracted_display_name_becomes_the_job_key() {
        let declarations = [declaration("ci", Kind::Workflow, &["build"])];
        let jobs = [declaration("build", Kind::Job, &[])];
        let named = Job {
            name: "Build and Test".to_string(),
            ..checkout_job()
        };
        let envelope = WorkflowEnvelope {
            workflows: vec![entry("ci", &Workflow::default())],
            jobs: vec![entry("build", &named)],
        };

        let output = workflows(&declarations, &jobs, &envelope).unwrap();
        assert!(output.artifacts[0].content.contains("Build and Test:"));
    }

    #[test]
    fn test_missing_job_extraction_is_reported() {
        let jobs = [declaration("build", Kind::Job, &[])];
        let envelope = WorkflowEnvelope::default();

        let output = workflows(&[], &jobs, &envelope).unwrap();
        assert!(output.artifacts.is_empty());
        assert_eq!(output.errors.len(), 1);
        assert_eq!(
            output.errors[0].to_string(),
            "build: extraction data not found"
        );
    }
}
