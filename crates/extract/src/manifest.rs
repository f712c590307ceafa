//! The configuration crate's own manifest, reduced to what the runner
//! needs: an importable package name, the library root, and any `[patch]`
//! tables that must be carried over for dependency resolution to succeed.

use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// Facts about the user's configuration crate, read from its Cargo.toml.
#[derive(Debug, Clone)]
pub(crate) struct UserManifest {
    /// Crate directory exactly as the caller passed it. Declaration file
    /// paths are rooted here, so module paths are computed against it.
    pub root: PathBuf,
    /// Canonical crate directory, used for the runner's path dependency
    /// (the runner lives in a scratch directory elsewhere).
    pub dependency_root: PathBuf,
    /// `[package].name` as written.
    pub package_name: String,
    /// The package name as an import path: `-` becomes `_`.
    pub import_name: String,
    /// The library crate root source file, `[lib].path` or `src/lib.rs`.
    pub lib_root: PathBuf,
    /// `[patch]` tables to carry into the runner manifest, with relative
    /// `path` entries already resolved against the crate directory.
    pub patches: toml::Table,
}

impl UserManifest {
    /// Read and validate the manifest under `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let dependency_root =
            std::fs::canonicalize(root).map_err(|source| ExtractError::ResolveRoot {
                path: root.to_path_buf(),
                source,
            })?;

        let path = root.join("Cargo.toml");
        if !path.is_file() {
            return Err(ExtractError::ManifestMissing { path });
        }
        let text =
            std::fs::read_to_string(&path).map_err(|source| ExtractError::ManifestRead {
                path: path.clone(),
                source,
            })?;
        let value: toml::Table =
            toml::from_str(&text).map_err(|source| ExtractError::ManifestParse {
                path: path.clone(),
                source,
            })?;

        let Some(package_name) = value
            .get("package")
            .and_then(|package| package.get("name"))
            .and_then(toml::Value::as_str)
        else {
            return Err(ExtractError::PackageName { path });
        };

        let lib_path = value
            .get("lib")
            .and_then(|lib| lib.get("path"))
            .and_then(toml::Value::as_str)
            .unwrap_or("src/lib.rs");
        let lib_root = root.join(lib_path);
        if !lib_root.is_file() {
            return Err(ExtractError::NoLibraryTarget {
                root: root.to_path_buf(),
                lib: lib_root,
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            patches: carried_patches(&value, &dependency_root),
            package_name: package_name.to_string(),
            import_name: package_name.replace('-', "_"),
            lib_root,
            dependency_root,
        })
    }
}

/// Clone the `[patch]` tables, rewriting relative `path` entries so they
/// stay valid from the scratch directory.
fn carried_patches(manifest: &toml::Table, root: &Path) -> toml::Table {
    let Some(toml::Value::Table(patch)) = manifest.get("patch") else {
        return toml::Table::new();
    };
    let mut carried = patch.clone();
    for (_, registry) in carried.iter_mut() {
        let Some(entries) = registry.as_table_mut() else {
            continue;
        };
        for (_, spec) in entries.iter_mut() {
            let Some(spec) = spec.as_table_mut() else {
                continue;
            };
            let Some(path) = spec.get("path").and_then(toml::Value::as_str) else {
                continue;
            };
            if Path::new(path).is_relative() {
                let absolute = root.join(path).display().to_string();
                spec.insert("path".to_string(), toml::Value::String(absolute));
            }
        }
    }
    carried
}
