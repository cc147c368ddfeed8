use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use cached::stores::DiskCacheBuildError;
use cached::{DiskCache, DiskCacheError, IOCached};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exclusion::PathExclusions;
use crate::filesystem::{read_file_content, walk_pyfiles};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to access the computation cache.")]
    Disk(#[from] DiskCacheError),
    #[error("Failed to build the computation cache.")]
    Build(#[from] DiskCacheBuildError),
    #[error("Failed to serialize a cached result.")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

pub const CACHE_DIR: &str = ".fence";

/// The cached outcome of an affected-tests run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationCacheValue {
    pub output: String,
    pub exit_code: i32,
}

#[derive(Debug)]
struct CacheKey {
    hash: String,
}

impl FromIterator<String> for CacheKey {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let mut hasher = DefaultHasher::new();
        for item in iter {
            item.hash(&mut hasher);
        }
        let hash = format!("{:016X}", hasher.finish());
        CacheKey { hash }
    }
}

fn build_computation_cache<P: AsRef<Path>>(project_root: P) -> Result<DiskCache<String, String>> {
    Ok(DiskCache::<String, String>::new("computation-cache")
        .set_disk_directory(
            project_root
                .as_ref()
                .join(CACHE_DIR)
                .join("computation-cache"),
        )
        .build()?)
}

/// Derive the cache key from everything the computation depends on: the
/// source tree contents, the project configuration, the interpreter, and the
/// declared file and environment dependencies.
pub fn create_computation_cache_key(
    project_root: &Path,
    source_roots: &[std::path::PathBuf],
    action: String,
    py_interpreter_version: String,
    file_dependencies: Vec<String>,
    env_dependencies: Vec<String>,
) -> String {
    let exclusions = PathExclusions::empty(project_root);
    let source_contents = source_roots.iter().flat_map(|source_root| {
        walk_pyfiles(&source_root.display().to_string(), &exclusions)
            .filter_map(move |path| read_file_content(source_root.join(path)).ok())
    });

    let file_dependency_contents = file_dependencies
        .into_iter()
        .filter_map(|path| read_file_content(project_root.join(path)).ok());

    let env_values = env_dependencies
        .into_iter()
        .map(|var| std::env::var(&var).unwrap_or_default());

    CacheKey::from_iter(
        source_contents
            .chain(std::iter::once(action))
            .chain(std::iter::once(py_interpreter_version))
            .chain(file_dependency_contents)
            .chain(env_values),
    )
    .hash
}

pub fn check_computation_cache(
    project_root: &Path,
    cache_key: String,
) -> Result<Option<ComputationCacheValue>> {
    let cache = build_computation_cache(project_root)?;
    match cache.cache_get(&cache_key)? {
        Some(serialized) => Ok(Some(serde_json::from_str(&serialized)?)),
        None => Ok(None),
    }
}

pub fn update_computation_cache(
    project_root: &Path,
    cache_key: String,
    value: ComputationCacheValue,
) -> Result<Option<ComputationCacheValue>> {
    let cache = build_computation_cache(project_root)?;
    let previous = cache.cache_set(cache_key, serde_json::to_string(&value)?)?;
    match previous {
        Some(serialized) => Ok(Some(serde_json::from_str(&serialized)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn scratch_project() -> tempfile::TempDir {
        let scratch = tempfile::tempdir().unwrap();
        fs::create_dir_all(scratch.path().join("src")).unwrap();
        fs::write(scratch.path().join("src/app.py"), "import os\n").unwrap();
        scratch
    }

    #[test]
    #[serial]
    fn cache_round_trips_values() {
        let scratch = scratch_project();
        let key = create_computation_cache_key(
            scratch.path(),
            &[scratch.path().join("src")],
            "test".to_string(),
            "3.12".to_string(),
            vec![],
            vec![],
        );

        assert_eq!(
            check_computation_cache(scratch.path(), key.clone()).unwrap(),
            None
        );

        let value = ComputationCacheValue {
            output: "4 passed".to_string(),
            exit_code: 0,
        };
        update_computation_cache(scratch.path(), key.clone(), value.clone()).unwrap();
        assert_eq!(
            check_computation_cache(scratch.path(), key).unwrap(),
            Some(value)
        );
    }

    #[test]
    #[serial]
    fn source_changes_change_the_key() {
        let scratch = scratch_project();
        let make_key = |root: &Path| {
            create_computation_cache_key(
                root,
                &[root.join("src")],
                "test".to_string(),
                "3.12".to_string(),
                vec![],
                vec![],
            )
        };

        let before = make_key(scratch.path());
        fs::write(scratch.path().join("src/app.py"), "import sys\n").unwrap();
        let after = make_key(scratch.path());
        assert_ne!(before, after);
    }
}
