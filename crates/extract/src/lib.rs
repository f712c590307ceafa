//! Evaluation of discovered configuration declarations.
//!
//! Static discovery knows where declarations live; this crate finds out
//! what they evaluate to. It never loads user code into its own process.
//! Instead each batch synthesizes a scratch Cargo project that depends on
//! the user's crate by path, calls every declaration, and prints one JSON
//! envelope on stdout; the envelope is parsed back here. The scratch
//! directory is deleted afterwards in every case.
//!
//! Batches are per kind, except that workflows and jobs travel together
//! because workflows embed jobs by reference. An empty batch returns an
//! empty envelope without creating a scratch directory or spawning
//! anything.

use std::path::PathBuf;

use gantry_discover::Declaration;
use tracing::debug;

mod codegen;
mod envelope;
mod error;
mod manifest;
mod modules;
mod runner;

pub use envelope::{
    CodeownersEnvelope, ConfigEnvelope, ContentEntry, OwnerRule, OwnersEntry, PrTemplateEnvelope,
    TemplateEnvelope, ValueEntry, WorkflowEnvelope,
};
pub use error::{ExtractError, Result};

use codegen::Shape;
use manifest::UserManifest;

/// Evaluates declaration batches against one configuration crate.
#[derive(Debug, Clone)]
pub struct Extractor {
    root: PathBuf,
}

impl Extractor {
    /// An extractor for the configuration crate at `root`. The manifest is
    /// read per batch, so a missing crate only fails once a non-empty
    /// batch needs it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Evaluate the workflow batch: all workflow and job declarations.
    #[tracing::instrument(skip_all, fields(workflows = workflows.len(), jobs = jobs.len()))]
    pub fn workflows(
        &self,
        workflows: &[Declaration],
        jobs: &[Declaration],
    ) -> Result<WorkflowEnvelope> {
        let declarations: Vec<&Declaration> = workflows.iter().chain(jobs).collect();
        self.evaluate_batch(Shape::Workflows, &declarations)
    }

    /// Evaluate the Dependabot batch.
    #[tracing::instrument(skip_all, fields(declarations = configs.len()))]
    pub fn dependabot(&self, configs: &[Declaration]) -> Result<ConfigEnvelope> {
        self.evaluate_batch(Shape::Dependabot, &refs(configs))
    }

    /// Evaluate the issue template batch.
    #[tracing::instrument(skip_all, fields(declarations = templates.len()))]
    pub fn issue_templates(&self, templates: &[Declaration]) -> Result<TemplateEnvelope> {
        self.evaluate_batch(Shape::IssueTemplates, &refs(templates))
    }

    /// Evaluate the discussion template batch.
    #[tracing::instrument(skip_all, fields(declarations = templates.len()))]
    pub fn discussion_templates(&self, templates: &[Declaration]) -> Result<TemplateEnvelope> {
        self.evaluate_batch(Shape::DiscussionTemplates, &refs(templates))
    }

    /// Evaluate the pull request template batch.
    #[tracing::instrument(skip_all, fields(declarations = templates.len()))]
    pub fn pr_templates(&self, templates: &[Declaration]) -> Result<PrTemplateEnvelope> {
        self.evaluate_batch(Shape::PrTemplates, &refs(templates))
    }

    /// Evaluate the CODEOWNERS batch.
    #[tracing::instrument(skip_all, fields(declarations = configs.len()))]
    pub fn codeowners(&self, configs: &[Declaration]) -> Result<CodeownersEnvelope> {
        self.evaluate_batch(Shape::Codeowners, &refs(configs))
    }

    fn evaluate_batch<E>(&self, shape: Shape, declarations: &[&Declaration]) -> Result<E>
    where
        E: serde::de::DeserializeOwned + Default,
    {
        if declarations.is_empty() {
            return Ok(E::default());
        }
        let manifest = UserManifest::load(&self.root)?;
        let plan = modules::plan(&manifest, declarations);
        if plan.modules.is_empty() {
            // Everything sat outside the library tree; the runner would
            // print an empty envelope anyway.
            debug!("no importable declarations in batch");
            return Ok(E::default());
        }

        let cargo_toml = codegen::runner_manifest(&manifest)?;
        let program = codegen::runner_program(&plan, shape);
        let stdout = runner::evaluate(&cargo_toml, &program)?;
        tracing::info!(
            declarations = declarations.len(),
            "extraction run complete"
        );
        match serde_json::from_str(&stdout) {
            Ok(parsed) => Ok(parsed),
            Err(source) => Err(ExtractError::Envelope {
                source,
                output: stdout,
            }),
        }
    }
}

fn refs(declarations: &[Declaration]) -> Vec<&Declaration> {
    declarations.iter().collect()
}
