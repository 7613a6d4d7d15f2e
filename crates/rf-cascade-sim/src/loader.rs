//! Engine configuration files

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rf_cascade::EngineConfig;

/// Load a YAML (`.yaml` / `.yml`) or JSON configuration and validate it
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;

    let config: EngineConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yml::from_str(&text)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
        _ => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
    };

    config
        .validate()
        .with_context(|| format!("Rejected config {}", path.display()))?;
    Ok(config)
}

/// Built-in configuration by name
pub fn preset(name: &str) -> Result<EngineConfig> {
    match name {
        "ways" | "reference" => Ok(EngineConfig::default()),
        "cluster" => Ok(EngineConfig::cluster_pays()),
        other => bail!("Unknown preset '{}' (expected ways or cluster)", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("rf-cascade-sim-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_presets() {
        assert!(preset("ways").is_ok());
        assert!(preset("cluster").is_ok());
        assert!(preset("lines").is_err());
    }

    #[test]
    fn test_load_json_and_yaml() {
        let config = EngineConfig::cluster_pays();

        let json_path = write_temp("config.json", &serde_json::to_string(&config).unwrap());
        let loaded = load_config(&json_path).unwrap();
        assert_eq!(loaded.name, config.name);

        let yaml_path = write_temp("config.yaml", &serde_yml::to_string(&config).unwrap());
        let loaded = load_config(&yaml_path).unwrap();
        assert_eq!(loaded.cascade.win_mechanism, config.cascade.win_mechanism);

        let _ = fs::remove_file(json_path);
        let _ = fs::remove_file(yaml_path);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.algorithm.weight_tables.pop();
        let path = write_temp("bad.json", &serde_json::to_string(&config).unwrap());
        assert!(load_config(&path).is_err());
        let _ = fs::remove_file(path);

        assert!(load_config(Path::new("/nonexistent/rf-cascade.json")).is_err());
    }
}
