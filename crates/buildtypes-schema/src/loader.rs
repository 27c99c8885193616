//! Reading, decoding and caching of the build types document.

use crate::document::BuildTypesDocument;
use crate::failure::Failure;
use crate::validate::validate_document;
use crate::value::{decode_str, DecodeError, SourceFormat};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Conventional file name of the document, relative to the project root.
pub const BUILDS_FILE_NAME: &str = "builds.yml";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("{0}")]
    Validation(ValidationReport),
}

impl LoadError {
    pub fn failures(&self) -> &[Failure] {
        match self {
            Self::Validation(report) => &report.failures,
            Self::Io { .. } | Self::Decode { .. } => &[],
        }
    }
}

/// All validation failures of one document, with the file they came from.
///
/// Displays as a header line followed by one indented line per failure:
///
/// ```text
/// Validation of "builds.yml" failed:
///   - Array contains duplicated values (builds.yml:buildTypes/beta/env)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub failures: Vec<Failure>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_name = self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        write!(f, "Validation of \"{file_name}\" failed:")?;
        for failure in &self.failures {
            if failure.path.is_root() {
                write!(f, "\n  - {} ({})", failure.message, self.path.display())?;
            } else {
                write!(
                    f,
                    "\n  - {} ({}:{})",
                    failure.message,
                    self.path.display(),
                    failure.path
                )?;
            }
        }
        Ok(())
    }
}

/// Decode and validate a document held in memory. `path` only labels errors.
pub fn load_from_str(
    input: &str,
    format: SourceFormat,
    path: &Path,
) -> Result<BuildTypesDocument, LoadError> {
    let raw = decode_str(input, format).map_err(|source| LoadError::Decode {
        path: path.to_owned(),
        source,
    })?;
    validate_document(&raw).map_err(|failures| {
        warn!(
            "{} failed validation with {} failure(s)",
            path.display(),
            failures.len()
        );
        LoadError::Validation(ValidationReport {
            path: path.to_owned(),
            failures,
        })
    })
}

/// Read, decode and validate the document at `path`, without caching.
pub fn load_path(path: &Path) -> Result<BuildTypesDocument, LoadError> {
    debug!("reading build types from {}", path.display());
    let input = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let document = load_from_str(&input, SourceFormat::from_path(path), path)?;
    info!(
        "loaded {} build types and {} features from {}",
        document.build_types.len(),
        document.features.len(),
        path.display()
    );
    Ok(document)
}

/// Loads one document at most once and hands out the cached result.
///
/// The cache is never invalidated: a changed file is only seen by a new
/// loader. A failed load caches nothing, so a later call reads the file again.
#[derive(Debug)]
pub struct BuildTypesLoader {
    path: PathBuf,
    cached: OnceLock<BuildTypesDocument>,
}

impl BuildTypesLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceLock::new(),
        }
    }

    /// Loader for `builds.yml` under `root`.
    pub fn for_project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(BUILDS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.get().is_some()
    }

    pub fn load(&self) -> Result<&BuildTypesDocument, LoadError> {
        if let Some(document) = self.cached.get() {
            debug!("using cached build types for {}", self.path.display());
            return Ok(document);
        }
        let document = load_path(&self.path)?;
        Ok(self.cached.get_or_init(|| document))
    }
}

static PROJECT_LOADER: LazyLock<BuildTypesLoader> =
    LazyLock::new(|| BuildTypesLoader::new(BUILDS_FILE_NAME));

/// Process-wide document for `builds.yml` in the current directory.
///
/// The first successful call reads and validates the file; every later call
/// returns the same instance.
pub fn load_build_types_config() -> Result<&'static BuildTypesDocument, LoadError> {
    PROJECT_LOADER.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    const VALID: &str = r"
default: main
buildTypes:
  main:
    features: [build-main]
    manifestOverrides: false
    buildNameOverride: false
  beta:
    isPrerelease: true
    manifestOverrides: ./app/build-types/beta/manifest/
    buildNameOverride: Beta
features:
  build-main:
env:
  - INFURA_PROJECT_ID
";

    fn write_builds(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_yaml_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        write_builds(dir.path(), BUILDS_FILE_NAME, VALID);
        let loader = BuildTypesLoader::for_project(dir.path());
        let document = loader.load().unwrap();
        assert_eq!(document.default, "main");
        assert_eq!(document.build_types.len(), 2);
    }

    #[test]
    fn second_load_returns_cached_instance_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_builds(dir.path(), BUILDS_FILE_NAME, VALID);
        let loader = BuildTypesLoader::new(&path);
        assert!(!loader.is_loaded());

        let first = loader.load().unwrap();
        fs::remove_file(&path).unwrap();
        let second = loader.load().expect("cached document should not need the file");

        assert!(std::ptr::eq(first, second));
        assert!(loader.is_loaded());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BUILDS_FILE_NAME);
        let loader = BuildTypesLoader::new(&path);

        assert!(matches!(loader.load(), Err(LoadError::Io { .. })));
        assert!(!loader.is_loaded());

        fs::write(&path, VALID).unwrap();
        assert!(loader.load().is_ok());
    }

    #[test]
    fn loads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_builds(
            dir.path(),
            "builds.json",
            r#"{"default": "main", "buildTypes": {"main": {"manifestOverrides": false, "buildNameOverride": false}}, "features": {"a": null}, "env": []}"#,
        );
        let document = load_path(&path).unwrap();
        assert!(document.feature("a").unwrap().is_empty());
    }

    #[test]
    fn syntax_error_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_builds(dir.path(), BUILDS_FILE_NAME, "default: [main\n");
        let err = load_path(&path).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(err.to_string().starts_with("failed to parse"));
        assert!(err.failures().is_empty());
    }

    #[test]
    fn validation_report_lists_every_failure() {
        let input = r"
default: missing
buildTypes:
  beta:
    env: [A, A]
    manifestOverrides: false
    buildNameOverride: false
features: {}
env: []
";
        let err = load_from_str(input, SourceFormat::Yaml, Path::new("builds.yml")).unwrap_err();
        assert_eq!(err.failures().len(), 2);
        assert_eq!(err.failures()[0].kind, FailureKind::Uniqueness);
        assert_eq!(err.failures()[1].kind, FailureKind::Referential);
        assert_eq!(
            err.to_string(),
            "Validation of \"builds.yml\" failed:\n\
             \x20 - Array contains duplicated values (builds.yml:buildTypes/beta/env)\n\
             \x20 - Default build type \"missing\" does not exist in builds declarations (builds.yml:default)"
        );
    }

    #[test]
    fn root_failure_line_has_no_field_path() {
        let err = load_from_str("- main\n", SourceFormat::Yaml, Path::new("builds.yml")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation of \"builds.yml\" failed:\n  \
             - Expected the document to be an object, but received: an array (builds.yml)"
        );
    }

    #[test]
    fn report_header_uses_file_name_and_lines_use_full_path() {
        let report = ValidationReport {
            path: PathBuf::from("project/builds.yml"),
            failures: vec![Failure::new(
                FailureKind::Shape,
                "Expected an array, but received: 1",
                crate::failure::FailurePath::root().key("env"),
            )],
        };
        let rendered = report.to_string();
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("Validation of \"builds.yml\" failed:"));
        assert_eq!(
            lines.next(),
            Some("  - Expected an array, but received: 1 (project/builds.yml:env)")
        );
        assert_eq!(lines.next(), None);
    }
}
