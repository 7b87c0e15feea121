// src/config.rs
use serde::{Serialize, Deserialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use log::{info, warn};
use toml;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct QrParams {
    pub endpoint: String,
    pub size: u32, // pixels, square
    pub default_location: String, // used when no location URL is configured
}

impl Default for QrParams {
    fn default() -> Self {
        QrParams {
            endpoint: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            size: 120,
            default_location: "https://maps.google.com".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub seed_path: PathBuf,
    pub data_dir: Option<PathBuf>, // None: the platform data directory
    pub export_dir: PathBuf,
    pub qr: QrParams,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed_path: PathBuf::from("data/db.json"),
            data_dir: None,
            export_dir: PathBuf::from("."),
            qr: QrParams::default(),
        }
    }
}

impl Config {
    /// Where the key-value store lives.
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("store"))
            .unwrap_or_else(|| PathBuf::from("data").join("store"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "Mehmansara", "Mehmansara")
}

fn get_config_path() -> Option<PathBuf> {
    project_dirs().map(|proj_dirs| proj_dirs.config_dir().join("mehmansara_config.toml"))
}

fn save_default_config(config_path: &Path, config: &Config) -> Result<(), String> {
    info!("Attempting to save default config to {:?}", config_path);
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)
                .map_err(|e| format!("Failed to create config directory {:?}: {}", parent_dir, e))?;
            info!("Created config directory: {:?}", parent_dir);
        }
    }

    let toml_string = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize default config to TOML: {}", e))?;

    let mut file = fs::File::create(config_path)
        .map_err(|e| format!("Failed to create default config file {:?}: {}", config_path, e))?;

    file.write_all(toml_string.as_bytes())
        .map_err(|e| format!("Failed to write default config to {:?}: {}", config_path, e))?;

    info!("Saved default configuration to {:?}", config_path);
    Ok(())
}

/// Reads a config file, falling back to defaults when it is missing or broken.
/// A missing file is created with the defaults.
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(
            "Config file not found at {:?}. Creating and using default configuration.",
            config_path
        );
        let default_config = Config::default();
        if let Err(e) = save_default_config(config_path, &default_config) {
            warn!("Failed to save default configuration: {}", e);
        }
        return default_config;
    }

    info!("Loading configuration from {:?}", config_path);
    match fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(loaded_config) => {
                info!("Configuration loaded successfully.");
                loaded_config
            }
            Err(e) => {
                warn!(
                    "Failed to parse config file at {:?}: {}. Using default configuration.",
                    config_path, e
                );
                Config::default()
            }
        },
        Err(e) => {
            warn!(
                "Failed to read config file at {:?}: {}. Using default configuration.",
                config_path, e
            );
            Config::default()
        }
    }
}

pub fn load_config(explicit: Option<&Path>) -> Config {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    match get_config_path() {
        Some(config_path) => load_config_from(&config_path),
        None => {
            warn!("Could not determine config directory. Using default configuration.");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.qr.size, 120);
        assert_eq!(config.qr.default_location, "https://maps.google.com");
        assert_eq!(config.seed_path, PathBuf::from("data/db.json"));
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("non_existent_dir").join("mehmansara_config.toml");

        let config = load_config_from(&config_path);
        assert!(config_path.exists());
        assert_eq!(config.qr, QrParams::default());

        let content = fs::read_to_string(&config_path).unwrap();
        let reloaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(reloaded.export_dir, config.export_dir);
    }

    #[test]
    fn test_load_config_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, r#"
seed_path = "/srv/guesthouses/db.json"
data_dir = "/srv/guesthouses/store"
export_dir = "/tmp/letters"

[qr]
endpoint = "https://qr.example/make"
size = 200
default_location = "https://maps.example"
"#).unwrap();

        let config = load_config_from(&config_path);
        assert_eq!(config.qr.size, 200);
        assert_eq!(config.resolved_data_dir(), PathBuf::from("/srv/guesthouses/store"));
    }

    #[test]
    fn test_load_config_invalid_toml_falls_back() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("invalid_config.toml");
        fs::write(&config_path, "this is not valid toml content = definitely_broken").unwrap();

        let config = load_config_from(&config_path);
        assert_eq!(config.qr, QrParams::default());
    }

    #[test]
    fn test_load_config_partial_file_keeps_given_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("partial_config.toml");
        fs::write(&config_path, "seed_path = \"seed.json\"\ndata_dir = \"store\"\n\n[qr]\nsize = 300\n").unwrap();

        let config = load_config_from(&config_path);
        assert_eq!(config.seed_path, PathBuf::from("seed.json"));
        assert_eq!(config.resolved_data_dir(), PathBuf::from("store"));
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.qr.size, 300);
        assert_eq!(config.qr.endpoint, QrParams::default().endpoint);
    }

    #[test]
    fn test_load_config_missing_qr_table_uses_default_qr() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("no_qr.toml");
        fs::write(&config_path, "seed_path = \"seed.json\"\n").unwrap();

        let config = load_config_from(&config_path);
        assert_eq!(config.seed_path, PathBuf::from("seed.json"));
        assert_eq!(config.qr, QrParams::default());
    }
}
