//! Single-file AST analysis.
//!
//! One file is parsed with syn and scanned for `pub` items whose type
//! names a configuration type. Nothing is compiled or executed; the import
//! gate keeps lookalike types from unrelated crates out, and reference
//! harvesting records the identifiers named by a declaration's `jobs` or
//! `needs` field so job membership and dependency edges can be recovered
//! later without evaluating macros.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use proc_macro2::{TokenStream, TokenTree};
use syn::visit::{self, Visit};
use syn::{
    Expr, File, GenericArgument, Item, PathArguments, ReturnType, StaticMutability, Type, UseTree,
    Visibility,
};

use crate::{AccessForm, Declaration, Kind};

/// Module segments that open an import gate.
const KIND_MODULES: &[&str] = &["workflow", "dependabot", "templates", "codeowners"];

/// Identifiers that are never declaration references: macro names, common
/// constructors and literals that show up inside declaration bodies.
const SKIP_IDENTS: &[&str] = &[
    "vec", "jobs", "needs", "format", "concat", "stringify", "include_str", "env", "Some", "None",
    "Ok", "Err", "String", "Vec", "Default", "Box", "new", "default", "from", "into", "to_string",
    "to_owned", "clone", "true", "false",
];

/// Analyze one source file's content, returning the declarations it holds.
///
/// # Errors
///
/// Returns the syn parse error when the file is not valid Rust.
pub fn analyze(file: &Path, content: &str) -> Result<Vec<Declaration>, syn::Error> {
    let ast: File = syn::parse_file(content)?;
    let gates = ImportGates::collect(&ast);
    if gates.is_closed() {
        // No configuration module imported, so nothing here can match.
        return Ok(Vec::new());
    }

    let mut declarations = Vec::new();
    for item in &ast.items {
        match item {
            Item::Fn(item_fn) => {
                if !is_public(&item_fn.vis) || !item_fn.sig.inputs.is_empty() {
                    continue;
                }
                let ReturnType::Type(_, return_type) = &item_fn.sig.output else {
                    continue;
                };
                let annotated = type_kind(return_type, &gates);
                let Some(kind) = annotated.or_else(|| block_tail_kind(&item_fn.block, &gates))
                else {
                    continue;
                };
                let name = item_fn.sig.ident.to_string();
                let references = harvest_references(kind, block_tail(&item_fn.block), &name);
                declarations.push(Declaration {
                    name,
                    kind,
                    file: file.to_path_buf(),
                    line: item_fn.sig.ident.span().start().line,
                    access: AccessForm::Call,
                    references,
                });
            }
            Item::Const(item_const) => {
                if !is_public(&item_const.vis) {
                    continue;
                }
                let annotated = type_kind(&item_const.ty, &gates);
                let Some(kind) = annotated.or_else(|| literal_kind(&item_const.expr, &gates))
                else {
                    continue;
                };
                let name = item_const.ident.to_string();
                let references = harvest_references(kind, Some(&item_const.expr), &name);
                declarations.push(Declaration {
                    name,
                    kind,
                    file: file.to_path_buf(),
                    line: item_const.ident.span().start().line,
                    access: AccessForm::Path,
                    references,
                });
            }
            Item::Static(item_static) => {
                if !is_public(&item_static.vis) {
                    continue;
                }
                if !matches!(item_static.mutability, StaticMutability::None) {
                    continue;
                }
                let lazy_inner = lazy_inner_type(&item_static.ty);
                let annotated = match lazy_inner {
                    Some(inner) => type_kind(inner, &gates),
                    None => type_kind(&item_static.ty, &gates),
                };
                let Some(kind) = annotated.or_else(|| literal_kind(&item_static.expr, &gates))
                else {
                    continue;
                };
                let access = if lazy_inner.is_some() {
                    AccessForm::Deref
                } else {
                    AccessForm::Path
                };
                let name = item_static.ident.to_string();
                let references = harvest_references(kind, Some(&item_static.expr), &name);
                declarations.push(Declaration {
                    name,
                    kind,
                    file: file.to_path_buf(),
                    line: item_static.ident.span().start().line,
                    access,
                    references,
                });
            }
            _ => {}
        }
    }

    Ok(declarations)
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

/// Which configuration modules a file imports, and what its `use ... as`
/// renames point back to.
struct ImportGates {
    modules: HashSet<&'static str>,
    aliases: HashMap<String, String>,
}

impl ImportGates {
    fn collect(ast: &File) -> Self {
        let mut gates = Self {
            modules: HashSet::new(),
            aliases: HashMap::new(),
        };
        for item in &ast.items {
            if let Item::Use(item_use) = item {
                gates.visit_tree(&item_use.tree);
            }
        }
        gates
    }

    fn visit_tree(&mut self, tree: &UseTree) {
        match tree {
            UseTree::Path(path) => {
                self.note_segment(&path.ident.to_string());
                self.visit_tree(&path.tree);
            }
            UseTree::Name(name) => self.note_segment(&name.ident.to_string()),
            UseTree::Rename(rename) => {
                self.note_segment(&rename.ident.to_string());
                self.aliases
                    .insert(rename.rename.to_string(), rename.ident.to_string());
            }
            UseTree::Group(group) => {
                for tree in &group.items {
                    self.visit_tree(tree);
                }
            }
            UseTree::Glob(_) => {}
        }
    }

    fn note_segment(&mut self, segment: &str) {
        if let Some(module) = KIND_MODULES.iter().find(|module| **module == segment) {
            self.modules.insert(module);
        }
    }

    fn is_closed(&self) -> bool {
        self.modules.is_empty()
    }

    fn is_open(&self, kind: Kind) -> bool {
        self.modules.contains(kind.module_segment())
    }
}

/// Match a type path against the configuration kinds, honoring local
/// renames for bare names and requiring the correct module qualifier for
/// qualified ones.
fn match_kind(path: &syn::Path, gates: &ImportGates) -> Option<Kind> {
    let segments = &path.segments;
    let last = segments.last()?.ident.to_string();

    let type_name = if segments.len() == 1 {
        gates.aliases.get(&last).cloned().unwrap_or(last)
    } else {
        last
    };

    let kind = Kind::ALL
        .into_iter()
        .find(|kind| kind.type_name() == type_name)?;
    if !gates.is_open(kind) {
        return None;
    }
    if segments.len() >= 2 {
        let qualifier = segments[segments.len() - 2].ident.to_string();
        if qualifier != kind.module_segment() {
            return None;
        }
    }
    Some(kind)
}

fn type_kind(ty: &Type, gates: &ImportGates) -> Option<Kind> {
    match ty {
        Type::Path(type_path) => match_kind(&type_path.path, gates),
        Type::Reference(reference) => type_kind(&reference.elem, gates),
        _ => None,
    }
}

/// The payload type of a `LazyLock<T>` or `Lazy<T>` static, if that is
/// what the annotation is.
fn lazy_inner_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let last = type_path.path.segments.last()?;
    let name = last.ident.to_string();
    if name != "LazyLock" && name != "Lazy" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

/// Fallback for type aliases: when the annotation does not match, the
/// struct literal in tail position still names the real type. Blocks,
/// references, closures and single-call wrappers (`Lazy::new(|| ...)`) are
/// unwrapped on the way.
fn literal_kind(expr: &Expr, gates: &ImportGates) -> Option<Kind> {
    match expr {
        Expr::Struct(expr_struct) => match_kind(&expr_struct.path, gates),
        Expr::Block(block) => block_tail_kind(&block.block, gates),
        Expr::Reference(reference) => literal_kind(&reference.expr, gates),
        Expr::Closure(closure) => literal_kind(&closure.body, gates),
        Expr::Call(call) => call.args.first().and_then(|arg| literal_kind(arg, gates)),
        _ => None,
    }
}

fn block_tail_kind(block: &syn::Block, gates: &ImportGates) -> Option<Kind> {
    block_tail(block).and_then(|expr| literal_kind(expr, gates))
}

fn block_tail(block: &syn::Block) -> Option<&Expr> {
    match block.stmts.last()? {
        syn::Stmt::Expr(expr, None) => Some(expr),
        _ => None,
    }
}

/// The struct field whose value expression carries graph references for
/// this kind, when there is one.
fn reference_field(kind: Kind) -> Option<&'static str> {
    match kind {
        Kind::Workflow => Some("jobs"),
        Kind::Job => Some("needs"),
        _ => None,
    }
}

/// The struct literal an initializer ultimately produces, unwrapped the
/// same way [`literal_kind`] unwraps it.
fn struct_literal(expr: &Expr) -> Option<&syn::ExprStruct> {
    match expr {
        Expr::Struct(expr_struct) => Some(expr_struct),
        Expr::Block(block) => block_tail(&block.block).and_then(struct_literal),
        Expr::Reference(reference) => struct_literal(&reference.expr),
        Expr::Closure(closure) => struct_literal(&closure.body),
        Expr::Call(call) => call.args.first().and_then(struct_literal),
        _ => None,
    }
}

/// Identifiers appearing in the declaration's `jobs` (Workflow) or `needs`
/// (Job) field value, in first-use order. Other kinds carry no references,
/// and an initializer that never spells out a struct literal yields none.
fn harvest_references(kind: Kind, init: Option<&Expr>, own_name: &str) -> Vec<String> {
    let Some(field_name) = reference_field(kind) else {
        return Vec::new();
    };
    let Some(literal) = init.and_then(struct_literal) else {
        return Vec::new();
    };
    let Some(field) = literal.fields.iter().find(|field| {
        matches!(&field.member, syn::Member::Named(ident) if ident == field_name)
    }) else {
        return Vec::new();
    };
    let mut collector = IdentCollector::new(own_name);
    collector.visit_expr(&field.expr);
    collector.order
}

/// Collects bare identifiers from a reference field's value in first-use
/// order.
///
/// Plain expression paths with a single segment count, and so does every
/// identifier inside macro invocation token streams. That second source is
/// what sees through `jobs![build, test]` and `needs![build]`.
struct IdentCollector {
    own_name: String,
    seen: HashSet<String>,
    order: Vec<String>,
}

impl IdentCollector {
    fn new(own_name: &str) -> Self {
        Self {
            own_name: own_name.to_string(),
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }

    fn note(&mut self, ident: String) {
        if ident == self.own_name || SKIP_IDENTS.contains(&ident.as_str()) {
            return;
        }
        if Kind::ALL.into_iter().any(|kind| kind.type_name() == ident) {
            return;
        }
        if self.seen.insert(ident.clone()) {
            self.order.push(ident);
        }
    }

    fn collect_tokens(&mut self, tokens: TokenStream) {
        for tree in tokens {
            match tree {
                TokenTree::Ident(ident) => self.note(ident.to_string()),
                TokenTree::Group(group) => self.collect_tokens(group.stream()),
                _ => {}
            }
        }
    }
}

impl<'ast> Visit<'ast> for IdentCollector {
    fn visit_expr_path(&mut self, expr: &'ast syn::ExprPath) {
        if expr.qself.is_none() && expr.path.segments.len() == 1 {
            self.note(expr.path.segments[0].ident.to_string());
        }
        visit::visit_expr_path(self, expr);
    }

    fn visit_macro(&mut self, mac: &'ast syn::Macro) {
        self.collect_tokens(mac.tokens.clone());
        visit::visit_macro(self, mac);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn analyze_str(content: &str) -> Vec<Declaration> {
        analyze(&PathBuf::from("src/lib.rs"), content).unwrap()
    }

    #[test]
    fn test_fn_declaration_is_found() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Workflow;

            pub fn ci() -> Workflow {
                Workflow::default()
            }
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ci");
        assert_eq!(found[0].kind, Kind::Workflow);
        assert_eq!(found[0].access, AccessForm::Call);
        assert_eq!(found[0].line, 4);
    }

    #[test]
    fn test_import_gate_blocks_lookalike_types() {
        // Same type name, but no configuration module imported.
        let found = analyze_str(
            r"
            use other_crate::models::Workflow;

            pub fn ci() -> Workflow {
                Workflow::default()
            }
            ",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_qualified_path_needs_matching_module() {
        let found = analyze_str(
            r"
            use gantry_config::workflow;
            use unrelated::stuff;

            pub fn ci() -> workflow::Workflow {
                workflow::Workflow::default()
            }

            pub fn fake() -> stuff::Workflow {
                stuff::Workflow::default()
            }
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "ci");
    }

    #[test]
    fn test_renamed_import_still_matches() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Workflow as Pipeline;

            pub fn ci() -> Pipeline {
                Pipeline::default()
            }
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Kind::Workflow);
    }

    #[test]
    fn test_private_items_are_ignored() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Job;

            fn helper() -> Job {
                Job::default()
            }

            pub(crate) fn internal() -> Job {
                Job::default()
            }

            pub fn build() -> Job {
                Job::default()
            }
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "build");
    }

    #[test]
    fn test_fn_with_arguments_is_ignored() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Job;

            pub fn parameterized(os: &str) -> Job {
                let _ = os;
                Job::default()
            }
            ",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_const_and_static_forms() {
        let found = analyze_str(
            r#"
            use gantry_config::templates::PrTemplate;

            pub const PR_BODY: PrTemplate = PrTemplate(String::new());

            pub static PR_NOTES: PrTemplate = PrTemplate(String::new());
            "#,
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].access, AccessForm::Path);
        assert_eq!(found[1].access, AccessForm::Path);
        assert_eq!(found[0].name, "PR_BODY");
    }

    #[test]
    fn test_lazy_static_unwraps_to_deref_access() {
        let found = analyze_str(
            r"
            use std::sync::LazyLock;
            use gantry_config::dependabot::Dependabot;

            pub static DEPS: LazyLock<Dependabot> = LazyLock::new(Dependabot::new);
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Kind::Dependabot);
        assert_eq!(found[0].access, AccessForm::Deref);
    }

    #[test]
    fn test_once_cell_lazy_also_matches() {
        let found = analyze_str(
            r"
            use once_cell::sync::Lazy;
            use gantry_config::codeowners::Codeowners;

            pub static OWNERS: Lazy<Codeowners> = Lazy::new(Codeowners::new);
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].access, AccessForm::Deref);
    }

    #[test]
    fn test_type_alias_falls_back_to_tail_literal() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Workflow;

            type Pipeline = Workflow;

            pub fn ci() -> Pipeline {
                Workflow {
                    ..Workflow::default()
                }
            }
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, Kind::Workflow);
    }

    #[test]
    fn test_references_come_in_first_use_order() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Workflow;
            use gantry_config::jobs;

            pub fn ci() -> Workflow {
                Workflow {
                    jobs: jobs![deploy, build, test, build],
                    ..Workflow::default()
                }
            }
            ",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].references, vec!["deploy", "build", "test"]);
    }

    #[test]
    fn test_needs_macro_references_are_harvested() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Job;
            use gantry_config::needs;

            pub fn deploy() -> Job {
                Job {
                    needs: needs![build, test],
                    ..Job::default()
                }
            }
            ",
        );
        assert_eq!(found[0].references, vec!["build", "test"]);
    }

    #[test]
    fn test_identifiers_outside_the_needs_field_stay_out() {
        // Helper calls and let bindings elsewhere in the body are not
        // dependency references.
        let found = analyze_str(
            r"
            use gantry_config::workflow::Job;
            use gantry_config::needs;

            pub fn deploy() -> Job {
                let image = default_image();
                Job {
                    name: image,
                    needs: needs![build],
                    ..Job::default()
                }
            }
            ",
        );
        assert_eq!(found[0].references, vec!["build"]);
    }

    #[test]
    fn test_lazy_static_references_are_harvested() {
        let found = analyze_str(
            r"
            use std::sync::LazyLock;
            use gantry_config::workflow::Workflow;
            use gantry_config::jobs;

            pub static CI: LazyLock<Workflow> = LazyLock::new(|| Workflow {
                jobs: jobs![build, test],
                ..Workflow::default()
            });
            ",
        );
        assert_eq!(found[0].access, AccessForm::Deref);
        assert_eq!(found[0].references, vec!["build", "test"]);
    }

    #[test]
    fn test_builder_style_declaration_has_no_references() {
        let found = analyze_str(
            r"
            use gantry_config::workflow::Job;

            pub fn build() -> Job {
                Job::default()
            }
            ",
        );
        assert!(found[0].references.is_empty());
    }

    #[test]
    fn test_every_kind_is_recognized() {
        let found = analyze_str(
            r"
            use gantry_config::codeowners::Codeowners;
            use gantry_config::dependabot::Dependabot;
            use gantry_config::templates::{DiscussionTemplate, IssueTemplate, PrTemplate};
            use gantry_config::workflow::{Job, Workflow};

            pub fn a() -> Workflow { Workflow::default() }
            pub fn b() -> Job { Job::default() }
            pub fn c() -> Dependabot { Dependabot::new() }
            pub fn d() -> IssueTemplate { IssueTemplate::default() }
            pub fn e() -> DiscussionTemplate { DiscussionTemplate::default() }
            pub fn f() -> PrTemplate { PrTemplate::new(String::new()) }
            pub fn g() -> Codeowners { Codeowners::new() }
            ",
        );
        let kinds: Vec<Kind> = found.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, Kind::ALL.to_vec());
    }

    #[test]
    fn test_parse_error_carries_location() {
        let err = analyze(&PathBuf::from("src/bad.rs"), "pub fn broken( {").unwrap_err();
        assert!(err.span().start().line >= 1);
    }
}
