use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};
use std::sync::Arc;

use dashmap::DashMap;
use ignore::WalkBuilder;
use thiserror::Error;

use crate::config::ModuleConfig;
use crate::exclusion::PathExclusions;

#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct FileSystemError {
    pub message: String,
}

pub type Result<T> = std::result::Result<T, FileSystemError>;

pub const PACKAGE_FILE_NAME: &str = "__init__.py";
pub const PYTHON_EXTENSION: &str = "py";

pub fn relative_to<P: AsRef<Path>, R: AsRef<Path>>(path: P, root: R) -> Result<PathBuf> {
    let path = path.as_ref();
    let diff_path = path
        .strip_prefix(root.as_ref())
        .map_err(|_| FileSystemError {
            message: format!(
                "Failed to compute path of '{}' relative to '{}'",
                path.display(),
                root.as_ref().display()
            ),
        })?;

    Ok(diff_path.to_path_buf())
}

pub fn read_file_content<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut file = fs::File::open(path.as_ref()).map_err(|_| FileSystemError {
        message: format!("Could not open path: {}", path.as_ref().display()),
    })?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|_| FileSystemError {
            message: format!("Could not read path: {}", path.as_ref().display()),
        })?;
    Ok(content)
}

/// Shared cache of file contents, keyed by `(cwd, path)`.
///
/// Reads may happen concurrently from the worker pool; invalidation is only
/// called from the single-threaded sync step after rewriting configuration.
#[derive(Debug, Default)]
pub struct FileReadCache {
    cwd: PathBuf,
    contents: DashMap<PathBuf, Arc<String>>,
}

impl FileReadCache {
    pub fn new<P: AsRef<Path>>(cwd: P) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            contents: DashMap::new(),
        }
    }

    fn cache_key<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        if path.as_ref().is_absolute() {
            path.as_ref().to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    pub fn read<P: AsRef<Path>>(&self, path: P) -> Result<Arc<String>> {
        let key = self.cache_key(&path);
        if let Some(contents) = self.contents.get(&key) {
            return Ok(Arc::clone(&contents));
        }
        let contents = Arc::new(read_file_content(&key)?);
        self.contents.insert(key, Arc::clone(&contents));
        Ok(contents)
    }

    pub fn invalidate<P: AsRef<Path>>(&self, path: P) {
        self.contents.remove(&self.cache_key(path));
    }
}

/// A source file within the project, with its contents loaded.
#[derive(Debug)]
pub struct ProjectFile {
    pub file_path: PathBuf,          // absolute
    pub relative_file_path: PathBuf, // relative to the project root
    pub contents: Arc<String>,
}

impl ProjectFile {
    pub fn try_new(
        project_root: &Path,
        source_root: &Path,
        file_path: &Path,
        file_cache: &FileReadCache,
    ) -> Result<Self> {
        let absolute_file_path = source_root.join(file_path);
        let relative_file_path = relative_to(&absolute_file_path, project_root)?;
        let contents = file_cache.read(&absolute_file_path)?;
        Ok(Self {
            file_path: absolute_file_path,
            relative_file_path,
            contents,
        })
    }

    pub fn is_package(&self) -> bool {
        self.file_path.ends_with(PACKAGE_FILE_NAME)
    }
}

/// Convert a file path under one of the source roots into its dotted module path.
///
/// Package-initializer files map to the path of their containing package; a
/// top-level initializer maps to the root path `"."`.
pub fn file_to_module_path(source_roots: &[PathBuf], file_path: &Path) -> Result<String> {
    let matching_root = source_roots
        .iter()
        .find(|root| file_path.starts_with(root))
        .ok_or(FileSystemError {
            message: format!(
                "File path '{}' is not within any source root.",
                file_path.display()
            ),
        })?;

    let relative_path = file_path
        .strip_prefix(matching_root)
        .map_err(|_| FileSystemError {
            message: format!(
                "Failed to strip source root from file path '{}'",
                file_path.display()
            ),
        })?;

    let relative = relative_path.to_string_lossy();
    let module_path = relative.replace(MAIN_SEPARATOR, ".");

    let mut module_path = match module_path.strip_suffix(".py") {
        Some(stripped) => stripped.to_string(),
        None => module_path,
    };

    if module_path.ends_with(".__init__") {
        module_path.truncate(module_path.len() - ".__init__".len());
    }

    if module_path == "__init__" || module_path.is_empty() {
        return Ok(".".to_string());
    }

    Ok(module_path)
}

#[derive(Debug, PartialEq)]
pub struct ResolvedModule {
    pub file_path: PathBuf,
    pub member_name: Option<String>,
}

/// Resolve a dotted module path to a source file under one of the source roots.
///
/// With `check_members`, a path whose last segment is not itself a module is
/// retried as a member of its parent module (e.g. `pkg.mod.func`).
pub fn module_to_file_path<P: AsRef<Path>>(
    source_roots: &[P],
    mod_path: &str,
    check_members: bool,
) -> Option<ResolvedModule> {
    let mod_as_file_path = mod_path.replace('.', MAIN_SEPARATOR_STR);
    for root in source_roots {
        let root = root.as_ref();
        let fs_path = root.join(&mod_as_file_path);
        let package_init = fs_path.join(PACKAGE_FILE_NAME);
        if package_init.is_file() {
            return Some(ResolvedModule {
                file_path: package_init,
                member_name: None,
            });
        }

        let py_file_path = fs_path.with_extension(PYTHON_EXTENSION);
        if py_file_path.is_file() {
            return Some(ResolvedModule {
                file_path: py_file_path,
                member_name: None,
            });
        }

        // Namespace packages have no initializer file
        if fs_path.is_dir() {
            return Some(ResolvedModule {
                file_path: fs_path,
                member_name: None,
            });
        }

        if !check_members {
            continue;
        }

        // mod_path may refer to a member within a module
        if let (Some(parent), Some(member_name)) = (
            fs_path.parent(),
            fs_path.file_name().map(|name| name.to_string_lossy()),
        ) {
            let parent_init = parent.join(PACKAGE_FILE_NAME);
            if parent_init.is_file() {
                return Some(ResolvedModule {
                    file_path: parent_init,
                    member_name: Some(member_name.to_string()),
                });
            }
            let parent_py_file = parent.with_extension(PYTHON_EXTENSION);
            if parent_py_file.is_file() {
                return Some(ResolvedModule {
                    file_path: parent_py_file,
                    member_name: Some(member_name.to_string()),
                });
            }
        }
    }
    None
}

/// Resolve a module path to the file or package directory which defines it.
pub fn module_to_pyfile_or_dir_path(source_roots: &[PathBuf], mod_path: &str) -> Option<PathBuf> {
    if mod_path == "." {
        return source_roots.first().cloned();
    }

    let mod_as_file_path = mod_path.replace('.', MAIN_SEPARATOR_STR);
    for root in source_roots {
        let fs_path = root.join(&mod_as_file_path);
        if fs_path.is_dir() {
            return Some(fs_path);
        }
        let py_file_path = fs_path.with_extension(PYTHON_EXTENSION);
        if py_file_path.is_file() {
            return Some(py_file_path);
        }
    }
    None
}

/// Partition configured modules into those which resolve to a file or
/// directory on disk and those which do not.
pub fn validate_project_modules(
    source_roots: &[PathBuf],
    modules: Vec<ModuleConfig>,
) -> (Vec<ModuleConfig>, Vec<ModuleConfig>) {
    let mut valid_modules = Vec::new();
    let mut invalid_modules = Vec::new();

    for module in modules {
        if module.is_root() || module_to_pyfile_or_dir_path(source_roots, &module.path).is_some() {
            valid_modules.push(module);
        } else {
            invalid_modules.push(module);
        }
    }

    (valid_modules, invalid_modules)
}

fn walk_files(root: &str) -> impl Iterator<Item = ignore::DirEntry> {
    // Hidden entries are skipped; VCS ignore files are not consulted so that
    // analysis is a pure function of the configuration and the source tree.
    WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_type()
                .map(|file_type| file_type.is_file())
                .unwrap_or(false)
        })
}

/// Walk all Python files under `root`, yielding paths relative to `root`.
pub fn walk_pyfiles<'a>(
    root: &str,
    exclusions: &'a PathExclusions,
) -> impl Iterator<Item = PathBuf> + 'a {
    let root_path = PathBuf::from(root);
    walk_files(root)
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == PYTHON_EXTENSION)
                .unwrap_or(false)
        })
        .filter(move |entry| !exclusions.is_path_excluded(entry.path()))
        .filter_map(move |entry| entry.path().strip_prefix(&root_path).ok().map(PathBuf::from))
}

/// Walk all `pyproject.toml` manifests under `root`, yielding absolute paths.
pub fn walk_pyprojects<'a>(
    root: &str,
    exclusions: &'a PathExclusions,
) -> impl Iterator<Item = PathBuf> + 'a {
    walk_files(root)
        .filter(|entry| entry.file_name() == "pyproject.toml")
        .filter(move |entry| !exclusions.is_path_excluded(entry.path()))
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("__init__.py", ".")]
    #[case("domain.py", "domain")]
    #[case("domain/__init__.py", "domain")]
    #[case("domain/services.py", "domain.services")]
    #[case("domain/inner/__init__.py", "domain.inner")]
    fn file_to_module_path_single_root(#[case] file_path: &str, #[case] expected: &str) {
        let source_roots = vec![PathBuf::from("")];
        let result = file_to_module_path(&source_roots, Path::new(file_path)).unwrap();
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case("src/domain/services.py", "domain.services")]
    #[case("src/__init__.py", ".")]
    fn file_to_module_path_nested_root(#[case] file_path: &str, #[case] expected: &str) {
        let source_roots = vec![PathBuf::from("src")];
        let result = file_to_module_path(&source_roots, Path::new(file_path)).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn file_to_module_path_outside_roots_is_an_error() {
        let source_roots = vec![PathBuf::from("src")];
        assert!(file_to_module_path(&source_roots, Path::new("scripts/run.py")).is_err());
    }

    #[test]
    fn file_read_cache_returns_cached_contents() {
        let scratch = tempfile::tempdir().unwrap();
        let file_path = scratch.path().join("module.py");
        fs::write(&file_path, "x = 1\n").unwrap();

        let cache = FileReadCache::new(scratch.path());
        let first = cache.read(&file_path).unwrap();
        fs::write(&file_path, "x = 2\n").unwrap();
        let second = cache.read(&file_path).unwrap();
        assert_eq!(first, second);

        cache.invalidate(&file_path);
        let third = cache.read(&file_path).unwrap();
        assert_eq!(third.as_str(), "x = 2\n");
    }
}
