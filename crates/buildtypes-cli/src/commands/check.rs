use super::{json_pretty, EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use buildtypes_schema::{BuildTypesLoader, LoadError};
use console::Style;

pub fn run(loader: &BuildTypesLoader, json: bool) -> Result<u8, String> {
    match loader.load() {
        Ok(document) => {
            if json {
                let payload = serde_json::json!({
                    "file": loader.path(),
                    "valid": true,
                    "build_types": document.build_types.len(),
                    "features": document.features.len(),
                    "failures": [],
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                println!(
                    "{} {} is valid ({} build types, {} features)",
                    Style::new().green().apply_to("✓"),
                    loader.path().display(),
                    document.build_types.len(),
                    document.features.len()
                );
            }
            Ok(EXIT_SUCCESS)
        }
        Err(LoadError::Validation(report)) if json => {
            let payload = serde_json::json!({
                "file": loader.path(),
                "valid": false,
                "failures": report.failures,
            });
            println!("{}", json_pretty(&payload)?);
            Ok(EXIT_CONFIG_ERROR)
        }
        Err(e) => Err(e.to_string()),
    }
}
