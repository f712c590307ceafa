//! Grouping of declarations by Rust module path, plus the aliases the
//! generated program imports those modules under.
//!
//! Module paths are derived purely from file layout relative to the
//! library root: `src/lib.rs` is the crate root, `src/ci.rs` and
//! `src/ci/mod.rs` are `ci`, `src/ci/release.rs` is `ci::release`. Files
//! outside the library tree (binary roots, `src/bin/`, anything not under
//! the lib directory) cannot be imported and are left out; their
//! declarations surface later as missing extraction data.

use std::collections::HashSet;
use std::path::Path;

use gantry_discover::{AccessForm, Declaration, Kind};
use indexmap::IndexMap;
use tracing::debug;

use crate::manifest::UserManifest;

/// Everything the generated program needs to reach the declarations.
#[derive(Debug)]
pub(crate) struct ModulePlan {
    pub modules: Vec<PlannedModule>,
}

/// One module of the user crate, with the declarations found in it.
#[derive(Debug)]
pub(crate) struct PlannedModule {
    /// Full use-path from the runner, e.g. `repo_config::ci::release`.
    pub path: String,
    /// Collision-free local name the module is imported under. For the
    /// crate root this is the crate's own import name and no `use` item is
    /// emitted.
    pub alias: String,
    pub is_root: bool,
    pub declarations: Vec<PlannedAccess>,
}

/// One declaration, with the expression that evaluates it.
#[derive(Debug)]
pub(crate) struct PlannedAccess {
    pub name: String,
    pub kind: Kind,
    /// Expression yielding a reference to the declaration's value, e.g.
    /// `&ci::build()` or `&*ci::PIPELINE`.
    pub expr: String,
}

/// Local names the generated program already uses for itself.
const RESERVED_ALIASES: &[&str] = &["main", "reduce", "serde", "serde_json"];

/// Group `declarations` by module and assign aliases. Order follows the
/// declarations' own order, so the plan is deterministic.
pub(crate) fn plan(manifest: &UserManifest, declarations: &[&Declaration]) -> ModulePlan {
    let mut groups: IndexMap<Vec<String>, Vec<&Declaration>> = IndexMap::new();
    for declaration in declarations {
        match module_segments(&declaration.file, &manifest.lib_root) {
            Some(segments) => groups.entry(segments).or_default().push(declaration),
            None => debug!(
                "declaration '{}' in {} is outside the library tree; skipping",
                declaration.name,
                declaration.file.display()
            ),
        }
    }

    let mut used: HashSet<String> = RESERVED_ALIASES
        .iter()
        .map(|reserved| (*reserved).to_string())
        .collect();
    used.insert(manifest.import_name.clone());

    let mut modules = Vec::new();
    for (segments, group) in groups {
        let is_root = segments.is_empty();
        let (path, alias) = if is_root {
            (manifest.import_name.clone(), manifest.import_name.clone())
        } else {
            let path = format!("{}::{}", manifest.import_name, segments.join("::"));
            let alias = unique_alias(segments.last().map_or("", String::as_str), &mut used);
            (path, alias)
        };
        let declarations = group
            .into_iter()
            .map(|declaration| PlannedAccess {
                name: declaration.name.clone(),
                kind: declaration.kind,
                expr: access_expr(&alias, declaration),
            })
            .collect();
        modules.push(PlannedModule {
            path,
            alias,
            is_root,
            declarations,
        });
    }

    ModulePlan { modules }
}

fn access_expr(alias: &str, declaration: &Declaration) -> String {
    match declaration.access {
        AccessForm::Call => format!("&{alias}::{}()", declaration.name),
        AccessForm::Path => format!("&{alias}::{}", declaration.name),
        AccessForm::Deref => format!("&*{alias}::{}", declaration.name),
    }
}

/// The module path of `file`, as segments, relative to the library root.
/// `None` when the file is not an importable module of the library.
fn module_segments(file: &Path, lib_root: &Path) -> Option<Vec<String>> {
    if file == lib_root {
        return Some(Vec::new());
    }
    let lib_dir = lib_root.parent()?;
    let relative = file.strip_prefix(lib_dir).ok()?;
    if relative == Path::new("main.rs") || relative.starts_with("bin") {
        return None;
    }

    let mut segments = Vec::new();
    for component in relative.components() {
        segments.push(component.as_os_str().to_str()?.to_string());
    }
    let file_name = segments.pop()?;
    let stem = file_name.strip_suffix(".rs")?;
    if stem != "mod" {
        segments.push(stem.to_string());
    }
    Some(segments)
}

fn unique_alias(segment: &str, used: &mut HashSet<String>) -> String {
    let base = sanitize_alias(segment);
    let mut candidate = base.clone();
    let mut counter = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}{counter}");
        counter += 1;
    }
    candidate
}

/// Reduce a module segment to a valid local identifier.
fn sanitize_alias(segment: &str) -> String {
    let mut alias: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if alias.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    alias
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn declaration(name: &str, file: &str, access: AccessForm) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind: Kind::Job,
            file: PathBuf::from(file),
            line: 1,
            access,
            references: Vec::new(),
        }
    }

    #[test]
    fn test_module_segments_follow_file_layout() {
        let lib = PathBuf::from("/w/src/lib.rs");
        let segments = |file: &str| module_segments(&PathBuf::from(file), &lib);
        assert_eq!(segments("/w/src/lib.rs"), Some(vec![]));
        assert_eq!(segments("/w/src/ci.rs"), Some(vec!["ci".to_string()]));
        assert_eq!(segments("/w/src/ci/mod.rs"), Some(vec!["ci".to_string()]));
        assert_eq!(
            segments("/w/src/ci/release.rs"),
            Some(vec!["ci".to_string(), "release".to_string()])
        );
    }

    #[test]
    fn test_non_library_files_are_not_modules() {
        let lib = PathBuf::from("/w/src/lib.rs");
        assert_eq!(module_segments(&PathBuf::from("/w/src/main.rs"), &lib), None);
        assert_eq!(
            module_segments(&PathBuf::from("/w/src/bin/tool.rs"), &lib),
            None
        );
        assert_eq!(
            module_segments(&PathBuf::from("/elsewhere/src/ci.rs"), &lib),
            None
        );
    }

    #[test]
    fn test_plan_groups_by_module_in_declaration_order() {
        let manifest = manifest_fixture();
        let a = declaration("build", "/work/repo-config/src/ci.rs", AccessForm::Call);
        let b = declaration("ci", "/work/repo-config/src/lib.rs", AccessForm::Call);
        let c = declaration("test", "/work/repo-config/src/ci.rs", AccessForm::Call);
        let plan = plan(&manifest, &[&a, &b, &c]);

        assert_eq!(plan.modules.len(), 2);
        assert_eq!(plan.modules[0].path, "repo_config::ci");
        assert_eq!(plan.modules[0].alias, "ci");
        assert_eq!(plan.modules[0].declarations.len(), 2);
        assert!(plan.modules[1].is_root);
        assert_eq!(plan.modules[1].alias, "repo_config");
    }

    #[test]
    fn test_access_expressions_match_access_forms() {
        let manifest = manifest_fixture();
        let call = declaration("build", "/work/repo-config/src/lib.rs", AccessForm::Call);
        let path = declaration("OWNERS", "/work/repo-config/src/lib.rs", AccessForm::Path);
        let deref = declaration("CI", "/work/repo-config/src/lib.rs", AccessForm::Deref);
        let plan = plan(&manifest, &[&call, &path, &deref]);

        let exprs: Vec<&str> = plan.modules[0]
            .declarations
            .iter()
            .map(|access| access.expr.as_str())
            .collect();
        assert_eq!(
            exprs,
            vec![
                "&repo_config::build()",
                "&repo_config::OWNERS",
                "&*repo_config::CI",
            ]
        );
    }

    #[test]
    fn test_colliding_aliases_get_counters() {
        let manifest = manifest_fixture();
        let a = declaration("a", "/work/repo-config/src/ci/util.rs", AccessForm::Call);
        let b = declaration("b", "/work/repo-config/src/release/util.rs", AccessForm::Call);
        let plan = plan(&manifest, &[&a, &b]);
        assert_eq!(plan.modules[0].alias, "util");
        assert_eq!(plan.modules[1].alias, "util2");
    }

    #[test]
    fn test_reserved_names_are_never_aliases() {
        let manifest = manifest_fixture();
        let a = declaration("a", "/work/repo-config/src/serde_json.rs", AccessForm::Call);
        let plan = plan(&manifest, &[&a]);
        assert_eq!(plan.modules[0].alias, "serde_json2");
    }

    #[test]
    fn test_out_of_tree_declarations_are_dropped_from_the_plan() {
        let manifest = manifest_fixture();
        let a = declaration("tool", "/work/repo-config/src/main.rs", AccessForm::Call);
        let plan = plan(&manifest, &[&a]);
        assert!(plan.modules.is_empty());
    }
}
