//! Synthesis of the runner: a throwaway Cargo project whose only job is to
//! evaluate the discovered declarations in-process and print one JSON
//! envelope on stdout.
//!
//! The runner depends on the user's crate by path, so declarations run
//! exactly as written, against whatever dependency graph the user crate
//! resolves. Any `[patch]` tables from the user manifest are carried over
//! for that reason.

use crate::error::{ExtractError, Result};
use crate::manifest::UserManifest;
use crate::modules::{ModulePlan, PlannedAccess};
use gantry_discover::Kind;

/// Which envelope the generated program prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `{"workflows": [{name, data}], "jobs": [{name, data}]}`
    Workflows,
    /// `{"configs": [{name, data}]}`
    Dependabot,
    /// `{"templates": [{name, data}]}`
    IssueTemplates,
    /// `{"templates": [{name, data}]}`
    DiscussionTemplates,
    /// `{"templates": [{name, content}]}`
    PrTemplates,
    /// `{"configs": [{name, rules}]}`
    Codeowners,
}

/// The manifest of the runner project. Rendered through the toml
/// serializer, so user-controlled strings (paths, patch tables) never need
/// hand escaping.
pub(crate) fn runner_manifest(manifest: &UserManifest) -> Result<String> {
    let mut package = toml::Table::new();
    package.insert("name".to_string(), "gantry-extract-runner".into());
    package.insert("version".to_string(), "0.0.0".into());
    package.insert("edition".to_string(), "2021".into());

    let mut serde_spec = toml::Table::new();
    serde_spec.insert("version".to_string(), "1".into());
    serde_spec.insert(
        "features".to_string(),
        toml::Value::Array(vec!["derive".into()]),
    );

    let mut user_spec = toml::Table::new();
    user_spec.insert(
        "path".to_string(),
        manifest.dependency_root.display().to_string().into(),
    );

    let mut dependencies = toml::Table::new();
    dependencies.insert("serde".to_string(), serde_spec.into());
    dependencies.insert("serde_json".to_string(), "1".into());
    dependencies.insert(manifest.package_name.clone(), user_spec.into());

    let mut root = toml::Table::new();
    root.insert("package".to_string(), package.into());
    // An empty [workspace] keeps the runner out of any workspace above the
    // scratch directory.
    root.insert("workspace".to_string(), toml::Table::new().into());
    root.insert("dependencies".to_string(), dependencies.into());
    if !manifest.patches.is_empty() {
        root.insert("patch".to_string(), manifest.patches.clone().into());
    }

    toml::to_string(&root).map_err(ExtractError::RenderManifest)
}

/// The runner's `main.rs`.
pub(crate) fn runner_program(plan: &ModulePlan, shape: Shape) -> String {
    let mut out = String::from(
        "// Generated by gantry. Evaluates configuration declarations and prints\n\
         // a single JSON envelope on stdout.\n\n",
    );

    let mut wrote_use = false;
    for module in &plan.modules {
        if !module.is_root {
            out.push_str(&format!("use {} as {};\n", module.path, module.alias));
            wrote_use = true;
        }
    }
    if wrote_use {
        out.push('\n');
    }

    if shape != Shape::Codeowners {
        out.push_str(
            "fn reduce<T: serde::Serialize>(value: &T) -> serde_json::Value {\n    \
             serde_json::to_value(value).expect(\"configuration values serialize to JSON\")\n\
             }\n\n",
        );
    }

    out.push_str("fn main() {\n");
    match shape {
        Shape::Workflows => {
            out.push_str(&list_binding("workflows"));
            out.push_str(&list_binding("jobs"));
            for access in declarations(plan) {
                let target = if access.kind == Kind::Workflow {
                    "workflows"
                } else {
                    "jobs"
                };
                out.push_str(&data_entry(target, access));
            }
            out.push_str(
                "    let envelope = serde_json::json!({ \"workflows\": workflows, \"jobs\": jobs });\n",
            );
        }
        Shape::Dependabot => {
            out.push_str(&list_binding("configs"));
            for access in declarations(plan) {
                out.push_str(&data_entry("configs", access));
            }
            out.push_str("    let envelope = serde_json::json!({ \"configs\": configs });\n");
        }
        Shape::IssueTemplates | Shape::DiscussionTemplates => {
            out.push_str(&list_binding("templates"));
            for access in declarations(plan) {
                out.push_str(&data_entry("templates", access));
            }
            out.push_str("    let envelope = serde_json::json!({ \"templates\": templates });\n");
        }
        Shape::PrTemplates => {
            out.push_str(&list_binding("templates"));
            for access in declarations(plan) {
                out.push_str(&format!(
                    "    templates.push(serde_json::json!({{ \"name\": \"{}\", \"content\": reduce({}) }}));\n",
                    access.name, access.expr
                ));
            }
            out.push_str("    let envelope = serde_json::json!({ \"templates\": templates });\n");
        }
        Shape::Codeowners => {
            out.push_str(&list_binding("configs"));
            for access in declarations(plan) {
                out.push_str(&owners_entry(access));
            }
            out.push_str("    let envelope = serde_json::json!({ \"configs\": configs });\n");
        }
    }
    out.push_str("    println!(\"{envelope}\");\n}\n");
    out
}

fn declarations(plan: &ModulePlan) -> impl Iterator<Item = &PlannedAccess> {
    plan.modules.iter().flat_map(|module| &module.declarations)
}

/// Lists are annotated so a list that stays empty still infers.
fn list_binding(name: &str) -> String {
    format!("    let mut {name}: Vec<serde_json::Value> = Vec::new();\n")
}

fn data_entry(target: &str, access: &PlannedAccess) -> String {
    format!(
        "    {target}.push(serde_json::json!({{ \"name\": \"{}\", \"data\": reduce({}) }}));\n",
        access.name, access.expr
    )
}

/// CODEOWNERS values are copied field by field instead of through the
/// reducer, so the envelope shape does not depend on how the type
/// serializes.
fn owners_entry(access: &PlannedAccess) -> String {
    format!(
        "    {{\n        \
         let config = {};\n        \
         let mut rules: Vec<serde_json::Value> = Vec::new();\n        \
         for rule in &config.rules {{\n            \
         rules.push(serde_json::json!({{\n                \
         \"pattern\": rule.pattern,\n                \
         \"owners\": rule.owners,\n                \
         \"comment\": rule.comment,\n            \
         }}));\n        \
         }}\n        \
         configs.push(serde_json::json!({{ \"name\": \"{}\", \"rules\": rules }}));\n    \
         }}\n",
        access.expr, access.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::plan;
    use gantry_discover::{AccessForm, Declaration};
    use std::path::PathBuf;

    fn manifest_fixture() -> UserManifest {
        UserManifest {
            root: PathBuf::from("/work/repo-config"),
            dependency_root: PathBuf::from("/work/repo-config"),
            package_name: "repo-config".to_string(),
            import_name: "repo_config".to_string(),
            lib_root: PathBuf::from("/work/repo-config/src/lib.rs"),
            patches: toml::Table::new(),
        }
    }

    fn declaration(name: &str, kind: Kind, file: &str, access: AccessForm) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            file: PathBuf::from(file),
            line: 1,
            access,
            references: Vec::new(),
        }
    }

    #[test]
    fn test_runner_manifest_shape() {
        let manifest = manifest_fixture();
        let rendered = runner_manifest(&manifest).unwrap();
        assert!(rendered.contains("name = \"gantry-extract-runner\""));
        assert!(rendered.contains("version = \"0.0.0\""));
        assert!(rendered.contains("[workspace]"));
        assert!(rendered.contains("[dependencies.repo-config]"));
        assert!(rendered.contains("path = \"/work/repo-config\""));
        assert!(rendered.contains("serde_json = \"1\""));
        assert!(!rendered.contains("[patch"));
    }

    #[test]
    fn test_runner_manifest_carries_patches() {
        let mut manifest = manifest_fixture();
        manifest.patches = toml::from_str(
            "[crates-io]\nlocal-dep = { path = \"/abs/local-dep\" }\n",
        )
        .unwrap();
        let rendered = runner_manifest(&manifest).unwrap();
        assert!(rendered.contains("[patch.crates-io"));
        assert!(rendered.contains("path = \"/abs/local-dep\""));
    }

    #[test]
    fn test_workflow_program_routes_kinds_to_their_lists() {
        let manifest = manifest_fixture();
        let ci = declaration(
            "ci",
            Kind::Workflow,
            "/work/repo-config/src/lib.rs",
            AccessForm::Call,
        );
        let build = declaration(
            "build",
            Kind::Job,
            "/work/repo-config/src/ci.rs",
            AccessForm::Call,
        );
        let modules = plan(&manifest, &[&ci, &build]);
        let program = runner_program(&modules, Shape::Workflows);

        assert!(program.contains("use repo_config::ci as ci;"));
        assert!(program.contains("fn reduce<T: serde::Serialize>"));
        assert!(program.contains(
            "workflows.push(serde_json::json!({ \"name\": \"ci\", \"data\": reduce(&repo_config::ci()) }));"
        ));
        assert!(program.contains(
            "jobs.push(serde_json::json!({ \"name\": \"build\", \"data\": reduce(&ci::build()) }));"
        ));
        assert!(program.contains(
            "serde_json::json!({ \"workflows\": workflows, \"jobs\": jobs })"
        ));
        assert!(program.contains("println!(\"{envelope}\");"));
    }

    #[test]
    fn test_root_module_needs_no_use_item() {
        let manifest = manifest_fixture();
        let deps = declaration(
            "deps",
            Kind::Dependabot,
            "/work/repo-config/src/lib.rs",
            AccessForm::Call,
        );
        let modules = plan(&manifest, &[&deps]);
        let program = runner_program(&modules, Shape::Dependabot);
        assert!(!program.contains("use repo_config"));
        assert!(program.contains("reduce(&repo_config::deps())"));
        assert!(program.contains("serde_json::json!({ \"configs\": configs })"));
    }

    #[test]
    fn test_pr_template_entries_carry_content() {
        let manifest = manifest_fixture();
        let pr = declaration(
            "pr",
            Kind::PrTemplate,
            "/work/repo-config/src/lib.rs",
            AccessForm::Path,
        );
        let modules = plan(&manifest, &[&pr]);
        let program = runner_program(&modules, Shape::PrTemplates);
        assert!(program.contains("\"content\": reduce(&repo_config::pr)"));
        assert!(!program.contains("\"data\""));
    }

    #[test]
    fn test_codeowners_program_copies_fields_without_the_reducer() {
        let manifest = manifest_fixture();
        let owners = declaration(
            "OWNERS",
            Kind::Codeowners,
            "/work/repo-config/src/lib.rs",
            AccessForm::Deref,
        );
        let modules = plan(&manifest, &[&owners]);
        let program = runner_program(&modules, Shape::Codeowners);

        assert!(!program.contains("fn reduce"));
        assert!(program.contains("let config = &*repo_config::OWNERS;"));
        assert!(program.contains("\"pattern\": rule.pattern"));
        assert!(program.contains("\"owners\": rule.owners"));
        assert!(program.contains("\"comment\": rule.comment"));
        assert!(program.contains(
            "configs.push(serde_json::json!({ \"name\": \"OWNERS\", \"rules\": rules }));"
        ));
    }

    #[test]
    fn test_lazy_static_access_is_dereferenced() {
        let manifest = manifest_fixture();
        let ci = declaration(
            "CI",
            Kind::Workflow,
            "/work/repo-config/src/pipelines.rs",
            AccessForm::Deref,
        );
        let modules = plan(&manifest, &[&ci]);
        let program = runner_program(&modules, Shape::Workflows);
        assert!(program.contains("use repo_config::pipelines as pipelines;"));
        assert!(program.contains("reduce(&*pipelines::CI)"));
    }
}
