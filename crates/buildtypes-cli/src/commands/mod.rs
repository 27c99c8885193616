pub mod check;
pub mod completions;
pub mod list;
pub mod show;

use buildtypes_schema::{BuildTypesDocument, BuildTypesLoader};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn yaml(value: &impl serde::Serialize) -> Result<String, String> {
    serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
}

pub fn load(loader: &BuildTypesLoader) -> Result<&BuildTypesDocument, String> {
    loader.load().map_err(|e| e.to_string())
}

pub fn yes_no(flag: bool) -> String {
    use console::Style;
    if flag {
        Style::new().green().apply_to("yes").to_string()
    } else {
        Style::new().dim().apply_to("no").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn yaml_serializes_object() {
        let val = serde_json::json!({"default": "main"});
        assert_eq!(yaml(&val).unwrap().trim(), "default: main");
    }

    #[test]
    fn yes_no_keeps_text() {
        assert!(yes_no(true).contains("yes"));
        assert!(yes_no(false).contains("no"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = BuildTypesLoader::for_project(dir.path());
        let err = load(&loader).unwrap_err();
        assert!(err.starts_with("failed to read"));
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_CONFIG_ERROR);
    }
}
