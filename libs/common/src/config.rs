//! Configuration loading
//!
//! Priority (highest to lowest):
//! 1. Environment variables (`{PREFIX}_KEY`)
//! 2. Config file (toml, yaml or json, picked by extension)
//! 3. Default values of the target type

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Load configuration from defaults, an optional file and prefixed env vars
pub fn load_config<T>(prefix: &str, path: Option<&Path>) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Default,
{
    let mut figment = Figment::from(Serialized::defaults(T::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        figment = merge_file(figment, path)?;
    }

    figment
        .merge(Env::prefixed(&format!("{}_", prefix.to_uppercase())))
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

    match extension {
        "toml" => Ok(figment.merge(Toml::file(path))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        "json" => Ok(figment.merge(Json::file(path))),
        _ => Err(Error::Config(format!(
            "Unsupported config file format: {}",
            extension
        ))),
    }
}
