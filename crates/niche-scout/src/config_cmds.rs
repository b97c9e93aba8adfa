use std::path::Path;

use anyhow::Result;
use scout_config::ScoutConfig;
use scout_config::oracle::mask_api_key;
use scout_core::OutputFormat;

pub(crate) fn handle_config_show(
    config_path: Option<&Path>,
    template: bool,
    format: OutputFormat,
) -> Result<()> {
    if template {
        print!("{}", ScoutConfig::default_template());
        return Ok(());
    }

    let config = ScoutConfig::load(config_path)?;
    let key_status = credential_status(&config);

    match format {
        OutputFormat::Json => {
            let mut value = serde_json::to_value(&config)?;
            value["oracle"]["api_key"] = serde_json::Value::String(key_status);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            print!("{}", toml::to_string_pretty(&config)?);
            println!("\n# {} = {key_status}", config.oracle.api_key_env);
        }
    }
    Ok(())
}

/// Masked key, or a note that it is missing. Never the key itself.
fn credential_status(config: &ScoutConfig) -> String {
    match config.oracle.resolve_api_key() {
        Ok(key) => mask_api_key(&key),
        Err(_) => "(not set)".to_string(),
    }
}
