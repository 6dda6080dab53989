//! Loading package models from disk.
//!
//! A model path is either a single JSON file or a directory whose `*.json`
//! files are partial models of one package, combined in file-name order.

use anyhow::{bail, Context, Result};
use govern_core::Package;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A package model together with where it came from.
#[derive(Debug)]
pub struct LoadedModel {
    pub source: String,
    pub package: Package,
}

/// Load a model file or directory, warning on structural problems.
pub fn load(path: &str) -> Result<LoadedModel> {
    let package = load_package(Path::new(path))?;
    if let Err(e) = package.scope.validate() {
        warn!("{}: model is malformed: {}", path, e);
    }
    Ok(LoadedModel {
        source: path.to_string(),
        package,
    })
}

pub fn load_package(path: &Path) -> Result<Package> {
    if path.is_dir() {
        let files = model_files(path)?;
        let Some((first, rest)) = files.split_first() else {
            bail!("no *.json model files in {}", path.display());
        };
        let mut package = read_model(first)?;
        for file in rest {
            package
                .combine(read_model(file)?)
                .with_context(|| format!("failed to merge {}", file.display()))?;
        }
        Ok(package)
    } else {
        read_model(path)
    }
}

fn model_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    debug!("{}: {} model files", dir.display(), files.len());
    Ok(files)
}

fn read_model(path: &Path) -> Result<Package> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse model {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use govern_core::{Scope, Symbol, SymbolKind, TypeArena};
    use tempfile::TempDir;

    fn make_package(name: &str, symbol: &str) -> Package {
        let mut types = TypeArena::new();
        let int = types.basic(govern_core::types::BasicKind::Int);
        let mut scope = Scope::with_types(types);
        scope
            .insert(Symbol::new(symbol, true, SymbolKind::Variable, int))
            .unwrap();
        Package::new(name, scope)
    }

    fn write(dir: &Path, file: &str, package: &Package) {
        std::fs::write(dir.join(file), serde_json::to_string(package).unwrap()).unwrap();
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "v1.json", &make_package("geometry", "Origin"));

        let package = load_package(&dir.path().join("v1.json")).unwrap();
        assert_eq!(package.name, "geometry");
        assert!(package.scope.get("Origin").is_some());
    }

    #[test]
    fn test_load_directory_combines_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", &make_package("geometry", "Origin"));
        write(dir.path(), "b.json", &make_package("geometry", "Unit"));
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let package = load_package(dir.path()).unwrap();
        assert_eq!(package.scope.len(), 2);
        assert!(package.scope.validate().is_ok());
    }

    #[test]
    fn test_load_directory_rejects_mixed_packages() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", &make_package("geometry", "Origin"));
        write(dir.path(), "b.json", &make_package("algebra", "Unit"));

        let err = load_package(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to merge"));
    }

    #[test]
    fn test_load_empty_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_package(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no *.json model files"));
    }

    #[test]
    fn test_load_invalid_json_fails_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_package(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
