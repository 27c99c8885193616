//! Build types document model, validation, and loading.
//!
//! This crate defines the schema layer for `builds.yml`: decoding source text
//! into a generic tree (`value`), validating and normalizing that tree into a
//! canonical `BuildTypesDocument` (`validate_document`), and loading the file
//! once per process (`BuildTypesLoader`, `load_build_types_config`).

pub mod document;
pub mod failure;
pub mod loader;
pub mod types;
pub mod validate;
pub mod value;

pub use document::{Asset, BuildType, BuildTypesDocument, EnvEntry, Feature, Override};
pub use failure::{Failure, FailureKind, FailurePath, PathSegment};
pub use loader::{
    load_build_types_config, load_from_str, load_path, BuildTypesLoader, LoadError,
    ValidationReport, BUILDS_FILE_NAME,
};
pub use types::{BuildTypeName, FeatureName};
pub use validate::validate_document;
pub use value::{decode_str, DecodeError, SourceFormat};
