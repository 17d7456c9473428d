use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let base_url = &config.worker.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("worker.base_url must be an http(s) URL, got '{}'", base_url),
        });
    }

    if config.worker.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "worker.request_timeout_secs must be greater than zero".to_string(),
        });
    }
    if config.worker.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "worker.connect_timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.merge.output_base_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "merge.output_base_dir must not be empty".to_string(),
        });
    }

    Ok(())
}
