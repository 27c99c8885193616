use super::{json_pretty, load, yaml, EXIT_SUCCESS};
use buildtypes_schema::BuildTypesLoader;

pub fn run(loader: &BuildTypesLoader, build_type: Option<&str>, json: bool) -> Result<u8, String> {
    let document = load(loader)?;
    let rendered = match build_type {
        Some(name) => {
            let build_type = document
                .build_type(name)
                .ok_or_else(|| format!("no build type named '{name}'"))?;
            if json {
                json_pretty(build_type)?
            } else {
                yaml(build_type)?
            }
        }
        None if json => json_pretty(document)?,
        None => yaml(document)?,
    };
    println!("{}", rendered.trim_end());
    Ok(EXIT_SUCCESS)
}
