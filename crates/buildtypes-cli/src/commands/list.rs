use super::{json_pretty, load, yes_no, EXIT_SUCCESS};
use buildtypes_schema::{BuildTypesLoader, FeatureName};

pub fn run(loader: &BuildTypesLoader, json: bool) -> Result<u8, String> {
    let document = load(loader)?;
    if json {
        let entries: Vec<_> = document
            .build_types
            .iter()
            .map(|(name, build_type)| {
                serde_json::json!({
                    "name": name,
                    "default": *name == document.default,
                    "prerelease": build_type.is_prerelease(),
                    "features": build_type.feature_names(),
                })
            })
            .collect();
        println!("{}", json_pretty(&entries)?);
    } else if document.build_types.is_empty() {
        println!("no build types declared");
    } else {
        println!("{:<16} {:<8} {:<11} FEATURES", "NAME", "DEFAULT", "PRERELEASE");
        for (name, build_type) in &document.build_types {
            let features: Vec<&str> = build_type
                .feature_names()
                .iter()
                .map(FeatureName::as_str)
                .collect();
            println!(
                "{:<16} {:<8} {:<11} {}",
                name.as_str(),
                yes_no(*name == document.default),
                yes_no(build_type.is_prerelease()),
                features.join(", ")
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
