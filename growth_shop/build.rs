use common::{config::Config, yaml_include::load_yaml_with_includes};
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

/// Environment whose `config/<env>.yaml` gets merged, `dev` when unset.
const ENV_VAR: &str = "STOREFRONT_ENV";

/// `target/<profile>/config/total_config.yaml`, next to the built binary.
fn merged_config_path(out_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());
    let target = out_dir
        .ancestors()
        .find(|p| p.ends_with("target"))
        .ok_or("Could not find target directory")?;
    Ok(target.join(profile).join("config").join("total_config.yaml"))
}

fn render(env: &str, config_dir: &Path) -> Result<String, Box<dyn Error>> {
    let merged = load_yaml_with_includes(&config_dir.join(format!("{}.yaml", env)))?;
    let mut rendered = String::new();
    yaml_rust2::YamlEmitter::new(&mut rendered).dump(&merged)?;

    // fail the build rather than the first server start
    Config::from_yaml(&rendered)
        .map_err(|e| format!("{} config does not parse: {}", env, e))?
        .validate()
        .map_err(|e| format!("{} config is invalid: {}", env, e))?;
    Ok(rendered)
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=config");
    println!("cargo:rerun-if-env-changed={}", ENV_VAR);

    let env = std::env::var(ENV_VAR).unwrap_or_else(|_| "dev".to_string());
    let config_dir = Path::new(&std::env::var("CARGO_MANIFEST_DIR")?).join("config");
    let rendered = render(&env, &config_dir)?;

    let destination = merged_config_path(Path::new(&std::env::var("OUT_DIR")?))?;
    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&destination, rendered)?;
    println!("cargo:warning=Storefront {} config written to {}", env, destination.display());
    Ok(())
}
