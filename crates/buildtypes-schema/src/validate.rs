//! Schema validation and normalization of a decoded build types document.
//!
//! Each field has its own parser that either returns the canonical value or
//! records a failure at the field's path and returns `None`. Parsers keep
//! going after a failure, so one pass reports every independent problem.
//! A `None` from a parser means the node failed shape validation; such nodes
//! are left out of the cross-reference checks (feature env conflicts and the
//! default build type) so a single mistake does not cascade.

use crate::document::{Asset, BuildType, BuildTypesDocument, EnvEntry, Feature, Override};
use crate::failure::{Failure, FailureKind, FailurePath};
use crate::types::{BuildTypeName, FeatureName};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

const DOCUMENT_KEYS: &[&str] = &["default", "buildTypes", "features", "env"];
const BUILD_TYPE_KEYS: &[&str] = &[
    "features",
    "env",
    "isPrerelease",
    "manifestOverrides",
    "buildNameOverride",
];
const FEATURE_KEYS: &[&str] = &["env", "assets"];

pub const DUPLICATED_VALUES: &str = "Array contains duplicated values";
pub const ENV_DECLARATION_SHAPE: &str = "Declaration should have only one property, the name";

/// Validate and normalize a decoded document.
///
/// Returns the canonical document, or every failure found. The failure list
/// is never empty.
pub fn validate_document(raw: &Value) -> Result<BuildTypesDocument, Vec<Failure>> {
    let mut validator = Validator::default();
    let document = validator.document(raw);
    match document {
        Some(document) if validator.failures.is_empty() => Ok(document),
        _ => Err(validator.failures),
    }
}

#[derive(Default)]
struct Validator {
    failures: Vec<Failure>,
}

impl Validator {
    fn fail(&mut self, kind: FailureKind, message: impl Into<String>, path: &FailurePath) {
        self.failures.push(Failure::new(kind, message, path.clone()));
    }

    fn shape(&mut self, message: impl Into<String>, path: &FailurePath) {
        self.fail(FailureKind::Shape, message, path);
    }

    fn document(&mut self, raw: &Value) -> Option<BuildTypesDocument> {
        let root = FailurePath::root();
        let Value::Object(map) = raw else {
            self.shape(
                format!(
                    "Expected the document to be an object, but received: {}",
                    describe(raw)
                ),
                &root,
            );
            return None;
        };
        self.reject_unknown_keys(map, DOCUMENT_KEYS, &root);

        let default_path = root.key("default");
        let default = self
            .required(map, "default", &root)
            .and_then(|v| self.string(v, &default_path));

        let build_types_path = root.key("buildTypes");
        let build_types = self
            .required(map, "buildTypes", &root)
            .and_then(|v| self.build_types(v, &build_types_path));

        let features_path = root.key("features");
        let features = self
            .required(map, "features", &root)
            .and_then(|v| self.features(v, &features_path));

        let env_path = root.key("env");
        let env = self
            .required(map, "env", &root)
            .and_then(|v| self.env_list(v, &env_path));

        if let Some(features) = &features {
            self.check_feature_conflicts(features, &features_path);
        }
        if let (Some(default), Some(build_types)) = (&default, &build_types) {
            if !build_types.contains_key(default.as_str()) {
                self.fail(
                    FailureKind::Referential,
                    format!(
                        "Default build type \"{default}\" does not exist in builds declarations"
                    ),
                    &default_path,
                );
            }
        }

        Some(BuildTypesDocument {
            default: BuildTypeName::new(default?),
            build_types: complete(build_types?)?,
            features: complete(features?)?,
            env: env?,
        })
    }

    /// Parses every entry of the mapping. A `None` entry failed validation,
    /// but its name is still known.
    fn build_types(
        &mut self,
        raw: &Value,
        path: &FailurePath,
    ) -> Option<BTreeMap<BuildTypeName, Option<BuildType>>> {
        let map = self.object(raw, path)?;
        Some(
            map.iter()
                .map(|(name, value)| {
                    let build_type = self.build_type(value, &path.key(name));
                    (BuildTypeName::new(name.as_str()), build_type)
                })
                .collect(),
        )
    }

    fn build_type(&mut self, raw: &Value, path: &FailurePath) -> Option<BuildType> {
        let map = self.object(raw, path)?;
        self.reject_unknown_keys(map, BUILD_TYPE_KEYS, path);

        let features = self.optional(map, "features", path, |v, p, cx| cx.feature_names(v, p));
        let env = self.optional(map, "env", path, |v, p, cx| cx.env_list(v, p));
        let is_prerelease = self.optional(map, "isPrerelease", path, |v, p, cx| cx.boolean(v, p));
        let manifest_overrides_path = path.key("manifestOverrides");
        let manifest_overrides = self
            .required(map, "manifestOverrides", path)
            .and_then(|v| self.override_value(v, &manifest_overrides_path));
        let build_name_override_path = path.key("buildNameOverride");
        let build_name_override = self
            .required(map, "buildNameOverride", path)
            .and_then(|v| self.override_value(v, &build_name_override_path));

        Some(BuildType {
            features: features?,
            env: env?,
            is_prerelease: is_prerelease?,
            manifest_overrides: manifest_overrides?,
            build_name_override: build_name_override?,
        })
    }

    fn features(
        &mut self,
        raw: &Value,
        path: &FailurePath,
    ) -> Option<BTreeMap<FeatureName, Option<Feature>>> {
        let map = self.object(raw, path)?;
        Some(
            map.iter()
                .map(|(name, value)| {
                    let feature = self.feature(value, &path.key(name));
                    (FeatureName::new(name.as_str()), feature)
                })
                .collect(),
        )
    }

    fn feature(&mut self, raw: &Value, path: &FailurePath) -> Option<Feature> {
        if raw.is_null() {
            return Some(Feature::default());
        }
        let map = self.object(raw, path)?;
        self.reject_unknown_keys(map, FEATURE_KEYS, path);

        let env = self.optional(map, "env", path, |v, p, cx| cx.env_list(v, p));
        let assets = self.optional(map, "assets", path, |v, p, cx| cx.assets(v, p));

        Some(Feature {
            env: env?,
            assets: assets?,
        })
    }

    /// A sequence of env declarations with unique keys.
    ///
    /// Duplicates are reported once per sequence but do not make the sequence
    /// a shape failure: every entry is well formed.
    fn env_list(&mut self, raw: &Value, path: &FailurePath) -> Option<Vec<EnvEntry>> {
        let items = self.array(raw, path)?;
        let entries: Vec<Option<EnvEntry>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.env_entry(item, &path.index(i)))
            .collect();
        let entries: Vec<EnvEntry> = entries.into_iter().collect::<Option<_>>()?;

        if has_duplicates(entries.iter().map(|entry| entry.key.as_str())) {
            self.fail(FailureKind::Uniqueness, DUPLICATED_VALUES, path);
        }
        Some(entries)
    }

    fn env_entry(&mut self, raw: &Value, path: &FailurePath) -> Option<EnvEntry> {
        match raw {
            Value::String(key) => Some(EnvEntry::bare(key.as_str())),
            Value::Object(map) => {
                if map.len() == 1 {
                    let (key, value) = map.iter().next()?;
                    return Some(EnvEntry {
                        key: key.clone(),
                        value: non_null(value),
                    });
                }
                if let Some(entry) = canonical_env_entry(map) {
                    return Some(entry);
                }
                self.shape(ENV_DECLARATION_SHAPE, path);
                None
            }
            other => {
                self.shape(
                    format!(
                        "Expected a string or an object, but received: {}",
                        describe(other)
                    ),
                    path,
                );
                None
            }
        }
    }

    fn feature_names(&mut self, raw: &Value, path: &FailurePath) -> Option<Vec<FeatureName>> {
        let items = self.array(raw, path)?;
        let names: Vec<Option<String>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.string(item, &path.index(i)))
            .collect();
        let names: Vec<String> = names.into_iter().collect::<Option<_>>()?;

        if has_duplicates(names.iter().map(String::as_str)) {
            self.fail(FailureKind::Uniqueness, DUPLICATED_VALUES, path);
        }
        Some(names.into_iter().map(FeatureName::from).collect())
    }

    /// Either a sequence of asset rules or a single rule.
    fn assets(&mut self, raw: &Value, path: &FailurePath) -> Option<Vec<Asset>> {
        let Value::Array(items) = raw else {
            return self.asset(raw, path).map(|asset| vec![asset]);
        };
        let assets: Vec<Option<Asset>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.asset(item, &path.index(i)))
            .collect();
        assets.into_iter().collect()
    }

    fn asset(&mut self, raw: &Value, path: &FailurePath) -> Option<Asset> {
        match raw {
            Value::String(include) => Some(Asset::exclusive_include(include.as_str())),
            Value::Object(map) if map.contains_key("exclusiveInclude") => {
                self.reject_unknown_keys(map, &["exclusiveInclude"], path);
                let include_path = path.key("exclusiveInclude");
                let include = self.string(&map["exclusiveInclude"], &include_path)?;
                (map.len() == 1).then(|| Asset::exclusive_include(include))
            }
            Value::Object(map) => {
                self.reject_unknown_keys(map, &["src", "dest"], path);
                let src_path = path.key("src");
                let src = self
                    .required(map, "src", path)
                    .and_then(|v| self.string(v, &src_path));
                let dest_path = path.key("dest");
                let dest = self
                    .required(map, "dest", path)
                    .and_then(|v| self.string(v, &dest_path));
                let (src, dest) = (src?, dest?);
                (map.len() == 2).then_some(Asset::Copy { src, dest })
            }
            other => {
                self.shape(
                    format!(
                        "Expected an asset path or an object, but received: {}",
                        describe(other)
                    ),
                    path,
                );
                None
            }
        }
    }

    fn override_value(&mut self, raw: &Value, path: &FailurePath) -> Option<Override> {
        match raw {
            Value::String(s) => Some(Override::Path(s.clone())),
            Value::Bool(false) => Some(Override::Disabled),
            other => {
                self.shape(
                    format!(
                        "Expected a string or `false`, but received: {}",
                        describe(other)
                    ),
                    path,
                );
                None
            }
        }
    }

    /// Reports every env key that a feature redeclares after an earlier
    /// feature already declared it. Duplicates inside one feature are a
    /// uniqueness problem and are not counted here.
    fn check_feature_conflicts(
        &mut self,
        features: &BTreeMap<FeatureName, Option<Feature>>,
        path: &FailurePath,
    ) {
        let mut seen: HashSet<&str> = HashSet::new();
        for (name, feature) in features {
            let Some(feature) = feature else { continue };
            let mut own: HashSet<&str> = HashSet::new();
            for (i, entry) in feature.env_entries().iter().enumerate() {
                let key = entry.key.as_str();
                if !own.insert(key) {
                    continue;
                }
                if seen.contains(key) {
                    self.fail(
                        FailureKind::Conflict,
                        format!(
                            "Multiple defined features have a definition of \"{key}\" env variable, resulting in a conflict"
                        ),
                        &path.key(name).key("env").index(i),
                    );
                }
            }
            seen.extend(own);
        }
    }

    fn required<'a>(
        &mut self,
        map: &'a Map<String, Value>,
        key: &str,
        path: &FailurePath,
    ) -> Option<&'a Value> {
        let value = map.get(key);
        if value.is_none() {
            self.shape(format!("Missing required property \"{key}\""), &path.key(key));
        }
        value
    }

    /// Parses `key` when present. The outer `Option` is the shape result, the
    /// inner one records whether the field was declared at all.
    fn optional<T>(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &FailurePath,
        parse: impl FnOnce(&Value, &FailurePath, &mut Self) -> Option<T>,
    ) -> Option<Option<T>> {
        match map.get(key) {
            None => Some(None),
            Some(value) => parse(value, &path.key(key), self).map(Some),
        }
    }

    fn reject_unknown_keys(&mut self, map: &Map<String, Value>, known: &[&str], path: &FailurePath) {
        for key in map.keys() {
            if !known.contains(&key.as_str()) {
                self.shape(format!("Unknown property \"{key}\""), &path.key(key));
            }
        }
    }

    fn object<'a>(&mut self, raw: &'a Value, path: &FailurePath) -> Option<&'a Map<String, Value>> {
        if let Value::Object(map) = raw {
            Some(map)
        } else {
            self.shape(
                format!("Expected an object, but received: {}", describe(raw)),
                path,
            );
            None
        }
    }

    fn array<'a>(&mut self, raw: &'a Value, path: &FailurePath) -> Option<&'a [Value]> {
        if let Value::Array(items) = raw {
            Some(items)
        } else {
            self.shape(
                format!("Expected an array, but received: {}", describe(raw)),
                path,
            );
            None
        }
    }

    fn string(&mut self, raw: &Value, path: &FailurePath) -> Option<String> {
        if let Value::String(s) = raw {
            Some(s.clone())
        } else {
            self.shape(
                format!("Expected a string, but received: {}", describe(raw)),
                path,
            );
            None
        }
    }

    fn boolean(&mut self, raw: &Value, path: &FailurePath) -> Option<bool> {
        if let Value::Bool(b) = raw {
            Some(*b)
        } else {
            self.shape(
                format!("Expected a boolean, but received: {}", describe(raw)),
                path,
            );
            None
        }
    }
}

/// The already-canonical `{key, value}` form, as produced by serializing a
/// validated document.
fn canonical_env_entry(map: &Map<String, Value>) -> Option<EnvEntry> {
    if map.len() != 2 || !map.contains_key("value") {
        return None;
    }
    let Value::String(key) = map.get("key")? else {
        return None;
    };
    Some(EnvEntry {
        key: key.clone(),
        value: non_null(&map["value"]),
    })
}

fn non_null(value: &Value) -> Option<Value> {
    (!value.is_null()).then(|| value.clone())
}

fn has_duplicates<'a>(mut keys: impl Iterator<Item = &'a str>) -> bool {
    let mut seen = HashSet::new();
    keys.any(|key| !seen.insert(key))
}

fn complete<K: Ord, V>(entries: BTreeMap<K, Option<V>>) -> Option<BTreeMap<K, V>> {
    entries
        .into_iter()
        .map(|(name, value)| value.map(|value| (name, value)))
        .collect()
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(_) => "an array".to_owned(),
        Value::Object(_) => "an object".to_owned(),
        scalar => scalar.to_string(),
    }
}
