use crate::types::{BuildTypeName, FeatureName};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Canonical, validated representation of a build types document.
///
/// Every shorthand form has been resolved: env entries are key/value pairs,
/// asset rules are one of the two rule variants, and feature bodies are never
/// null. Consumers can read it without any further shape checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTypesDocument {
    pub default: BuildTypeName,
    pub build_types: BTreeMap<BuildTypeName, BuildType>,
    pub features: BTreeMap<FeatureName, Feature>,
    pub env: Vec<EnvEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<FeatureName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_prerelease: Option<bool>,
    pub manifest_overrides: Override,
    pub build_name_override: Override,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<Asset>>,
}

/// One environment variable declaration.
///
/// `value` is `None` when the source declared the name only, or mapped it to
/// null; the value is then expected to come from the build environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvEntry {
    pub key: String,
    pub value: Option<Value>,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A name-only declaration.
    pub fn bare(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

/// Asset inclusion rule contributed by a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Asset {
    /// Copy `src` to `dest` in the build output.
    Copy { src: String, dest: String },
    /// Include the path only in builds that select the owning feature.
    ExclusiveInclude {
        #[serde(rename = "exclusiveInclude")]
        exclusive_include: String,
    },
}

impl Asset {
    pub fn exclusive_include(path: impl Into<String>) -> Self {
        Self::ExclusiveInclude {
            exclusive_include: path.into(),
        }
    }
}

/// A field that is either a string or the literal `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override {
    Path(String),
    Disabled,
}

impl Override {
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(path) => Some(path),
            Self::Disabled => None,
        }
    }
}

impl Serialize for Override {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Path(path) => serializer.serialize_str(path),
            Self::Disabled => serializer.serialize_bool(false),
        }
    }
}

impl BuildType {
    pub fn is_prerelease(&self) -> bool {
        self.is_prerelease.unwrap_or(false)
    }

    pub fn feature_names(&self) -> &[FeatureName] {
        self.features.as_deref().unwrap_or_default()
    }

    pub fn env_entries(&self) -> &[EnvEntry] {
        self.env.as_deref().unwrap_or_default()
    }
}

impl Feature {
    pub fn env_entries(&self) -> &[EnvEntry] {
        self.env.as_deref().unwrap_or_default()
    }

    pub fn asset_rules(&self) -> &[Asset] {
        self.assets.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.env_entries().is_empty() && self.asset_rules().is_empty()
    }
}

impl BuildTypesDocument {
    /// The build type named by `default`. Always present in a validated document.
    pub fn default_build_type(&self) -> Option<&BuildType> {
        self.build_types.get(&self.default)
    }

    pub fn build_type(&self, name: &str) -> Option<&BuildType> {
        self.build_types.get(name)
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }

    pub fn build_type_names(&self) -> impl Iterator<Item = &BuildTypeName> {
        self.build_types.keys()
    }

    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The canonical form as a generic tree, accepted unchanged by the validator.
    pub fn to_tree(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> BuildTypesDocument {
        let mut build_types = BTreeMap::new();
        build_types.insert(
            BuildTypeName::from("main"),
            BuildType {
                features: Some(vec![FeatureName::from("build-main")]),
                env: Some(vec![EnvEntry::new("SUPPORT_LINK", "https://example.com")]),
                is_prerelease: None,
                manifest_overrides: Override::Disabled,
                build_name_override: Override::Path("Main".to_owned()),
            },
        );
        let mut features = BTreeMap::new();
        features.insert(
            FeatureName::from("build-main"),
            Feature {
                env: None,
                assets: Some(vec![
                    Asset::exclusive_include("app/images/main"),
                    Asset::Copy {
                        src: "a".to_owned(),
                        dest: "b".to_owned(),
                    },
                ]),
            },
        );
        BuildTypesDocument {
            default: BuildTypeName::from("main"),
            build_types,
            features,
            env: vec![EnvEntry::bare("INFURA_PROJECT_ID")],
        }
    }

    #[test]
    fn serializes_in_canonical_shape() {
        let tree = sample().to_tree().unwrap();
        assert_eq!(
            tree,
            json!({
                "default": "main",
                "buildTypes": {
                    "main": {
                        "features": ["build-main"],
                        "env": [{"key": "SUPPORT_LINK", "value": "https://example.com"}],
                        "manifestOverrides": false,
                        "buildNameOverride": "Main"
                    }
                },
                "features": {
                    "build-main": {
                        "assets": [
                            {"exclusiveInclude": "app/images/main"},
                            {"src": "a", "dest": "b"}
                        ]
                    }
                },
                "env": [{"key": "INFURA_PROJECT_ID", "value": null}]
            })
        );
    }

    #[test]
    fn accessors_resolve_defaults() {
        let doc = sample();
        let main = doc.default_build_type().unwrap();
        assert!(!main.is_prerelease());
        assert_eq!(main.feature_names(), &[FeatureName::from("build-main")]);
        assert!(doc.build_type("flask").is_none());
        assert!(doc.feature("build-main").unwrap().env_entries().is_empty());
        assert_eq!(doc.build_type_names().count(), 1);
    }

    #[test]
    fn override_path_accessor() {
        assert_eq!(Override::Path("x.json".to_owned()).as_path(), Some("x.json"));
        assert_eq!(Override::Disabled.as_path(), None);
    }

    #[test]
    fn empty_feature_serializes_to_empty_object() {
        let feature = Feature::default();
        assert!(feature.is_empty());
        assert_eq!(serde_json::to_value(&feature).unwrap(), json!({}));
    }
}
