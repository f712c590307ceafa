//! The `generate` command: discover, evaluate, build, write.

use std::fs;
use std::path::{Path, PathBuf};

use gantry_build::{Artifact, BuildOutput};
use gantry_config::emit::sanitize_filename;
use gantry_discover::{Discovery, Kind};
use gantry_extract::Extractor;
use tracing::debug;

/// Execute the `generate` command.
///
/// Scans `root` for declarations, evaluates them, and writes the resulting
/// artifacts under `<out>/.github/`, where `out` defaults to the root.
/// Per-file and per-declaration problems go to stderr and turn the exit
/// status non-zero only after every healthy artifact has been written.
///
/// # Errors
///
/// Returns an error if the source tree cannot be scanned, evaluation cannot
/// run at all, the job graph has a cycle, an artifact cannot be written, or
/// any declaration failed along the way.
pub fn execute(root: &Path, out: Option<&Path>, dry_run: bool) -> miette::Result<()> {
    let discovery = gantry_discover::discover(root)
        .map_err(|e| miette::miette!("Failed to scan {}: {e}", root.display()))?;
    debug!(
        declarations = discovery.declaration_count(),
        "discovery finished"
    );

    for failure in &discovery.failures {
        eprintln!(
            "warning: failed to parse {}: {}",
            failure.file.display(),
            failure.message
        );
    }

    let output = evaluate(root, &discovery)?;
    tracing::info!(
        artifacts = output.artifacts.len(),
        errors = output.errors.len(),
        "build complete"
    );

    let target_root = out.unwrap_or(root);
    let (files, skipped) = place(&output.artifacts);
    for notice in &skipped {
        eprintln!("warning: {notice}");
    }
    for file in &files {
        let path = target_root.join(&file.path);
        if dry_run {
            println!("{}", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| miette::miette!("Failed to create {}: {e}", parent.display()))?;
        }
        fs::write(&path, file.content)
            .map_err(|e| miette::miette!("Failed to write {}: {e}", path.display()))?;
        println!("wrote {}", path.display());
    }

    for error in &output.errors {
        eprintln!("error: {error}");
    }
    let problems = discovery.failures.len() + output.errors.len();
    if problems > 0 {
        miette::bail!("generate finished with {problems} error(s)");
    }
    Ok(())
}

/// Run every evaluation batch and fold the build results together.
fn evaluate(root: &Path, discovery: &Discovery) -> miette::Result<BuildOutput> {
    let extractor = Extractor::new(root);
    let mut output = BuildOutput::default();

    let workflows = extractor
        .workflows(&discovery.workflows, &discovery.jobs)
        .map_err(|e| miette::miette!("Failed to evaluate workflows: {e}"))?;
    output.merge(
        gantry_build::workflows(&discovery.workflows, &discovery.jobs, &workflows)
            .map_err(|e| miette::miette!("Failed to assemble workflows: {e}"))?,
    );

    let dependabot = extractor
        .dependabot(&discovery.dependabot)
        .map_err(|e| miette::miette!("Failed to evaluate dependabot configs: {e}"))?;
    output.merge(gantry_build::dependabot(&discovery.dependabot, &dependabot));

    let issues = extractor
        .issue_templates(&discovery.issue_templates)
        .map_err(|e| miette::miette!("Failed to evaluate issue templates: {e}"))?;
    output.merge(gantry_build::issue_templates(
        &discovery.issue_templates,
        &issues,
    ));

    let discussions = extractor
        .discussion_templates(&discovery.discussion_templates)
        .map_err(|e| miette::miette!("Failed to evaluate discussion templates: {e}"))?;
    output.merge(gantry_build::discussion_templates(
        &discovery.discussion_templates,
        &discussions,
    ));

    let prs = extractor
        .pr_templates(&discovery.pr_templates)
        .map_err(|e| miette::miette!("Failed to evaluate pull request templates: {e}"))?;
    output.merge(gantry_build::pr_templates(&discovery.pr_templates, &prs));

    let codeowners = extractor
        .codeowners(&discovery.codeowners)
        .map_err(|e| miette::miette!("Failed to evaluate codeowners configs: {e}"))?;
    output.merge(gantry_build::codeowners(&discovery.codeowners, &codeowners));

    Ok(output)
}

/// A rendered artifact with its destination, relative to the output root.
struct Placement<'a> {
    path: PathBuf,
    content: &'a str,
}

/// Map artifacts to their `.github/` destinations.
///
/// GitHub reads exactly one `dependabot.yml` and one `CODEOWNERS`, so the
/// first of each kind wins and the rest come back as skip notices. A lone
/// pull request template lands at `PULL_REQUEST_TEMPLATE.md`; several share
/// the `PULL_REQUEST_TEMPLATE/` directory.
fn place(artifacts: &[Artifact]) -> (Vec<Placement<'_>>, Vec<String>) {
    let github = Path::new(".github");
    let several_pr_templates = artifacts
        .iter()
        .filter(|a| a.kind == Kind::PrTemplate)
        .count()
        > 1;
    let mut dependabot_placed = false;
    let mut codeowners_placed = false;
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for artifact in artifacts {
        let path = match artifact.kind {
            Kind::Workflow => github
                .join("workflows")
                .join(format!("{}.yml", sanitize_filename(&artifact.name))),
            // Jobs render inside their workflows, never on their own.
            Kind::Job => continue,
            Kind::Dependabot => {
                if dependabot_placed {
                    skipped.push(format!(
                        "dependabot config `{}` skipped: .github/dependabot.yml is already taken",
                        artifact.name
                    ));
                    continue;
                }
                dependabot_placed = true;
                github.join("dependabot.yml")
            }
            Kind::IssueTemplate => github
                .join("ISSUE_TEMPLATE")
                .join(format!("{}.yml", sanitize_filename(&artifact.name))),
            Kind::DiscussionTemplate => github
                .join("DISCUSSION_TEMPLATE")
                .join(format!("{}.yml", sanitize_filename(&artifact.name))),
            Kind::PrTemplate => {
                if several_pr_templates {
                    github
                        .join("PULL_REQUEST_TEMPLATE")
                        .join(format!("{}.md", sanitize_filename(&artifact.name)))
                } else {
                    github.join("PULL_REQUEST_TEMPLATE.md")
                }
            }
            Kind::Codeowners => {
                if codeowners_placed {
                    skipped.push(format!(
                        "codeowners config `{}` skipped: .github/CODEOWNERS is already taken",
                        artifact.name
                    ));
                    continue;
                }
                codeowners_placed = true;
                github.join("CODEOWNERS")
            }
        };
        files.push(Placement {
            path,
            content: &artifact.content,
        });
    }
    (files, skipped)
}
