//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use tavola_data::ApiClient;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Get { key } => get_config(&key, ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    ctx.output.info("[api]");
    ctx.output.kv("base_url", &ctx.config.api.base_url);
    if let Some(ms) = ctx.config.api.timeout_ms {
        ctx.output.kv("timeout_ms", &ms.to_string());
    }

    ctx.output.info("[session]");
    ctx.output.kv("dir", &ctx.session_dir().display().to_string());
    ctx.output.kv("id", &ctx.config.session.id);

    ctx.output.info("[checkout]");
    ctx.output
        .kv("default_type", ctx.config.checkout.default_type.as_str());
    ctx.output
        .kv("payment_method", ctx.config.checkout.payment_method.as_str());

    if !ctx.config.environments.is_empty() {
        ctx.output.info("Environments:");
        let mut names: Vec<&String> = ctx.config.environments.keys().collect();
        names.sort();
        for env in names {
            ctx.output.list_item(env);
        }
    }

    Ok(())
}

fn get_config(key: &str, ctx: &Context) -> Result<()> {
    let value = get_config_value(&ctx.config, key)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{}", value);
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check_config(&ctx.config);

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Errors and warnings for a config.
fn check_config(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if ApiClient::new(&config.api.base_url).is_err() {
        errors.push(format!(
            "api.base_url '{}' must start with http:// or https://",
            config.api.base_url
        ));
    } else if config.api.base_url.starts_with("http://")
        && !config.api.base_url.contains("localhost")
        && !config.api.base_url.contains("127.0.0.1")
    {
        warnings.push("api.base_url uses plain http outside localhost".to_string());
    }

    match config.api.timeout_ms {
        Some(0) => errors.push("api.timeout_ms must be greater than 0".to_string()),
        Some(ms) if ms < 200 => {
            warnings.push(format!("api.timeout_ms {} is likely too short for order submission", ms))
        }
        _ => {}
    }

    if config.session.id.trim().is_empty() {
        errors.push("session.id must not be empty".to_string());
    }

    for (name, env) in &config.environments {
        if let Some(ref api) = env.api {
            if ApiClient::new(&api.base_url).is_err() {
                errors.push(format!("environments.{}.api.base_url is not an http(s) URL", name));
            }
        }
    }

    (errors, warnings)
}

fn get_config_value(config: &CliConfig, key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["api", "base_url"] => Ok(config.api.base_url.clone()),
        ["api", "timeout_ms"] => Ok(config
            .api
            .timeout_ms
            .map(|ms| ms.to_string())
            .unwrap_or_else(|| "null".to_string())),
        ["session", "id"] => Ok(config.session.id.clone()),
        ["session", "dir"] => Ok(config.session.dir.clone().unwrap_or_else(|| "null".to_string())),
        ["checkout", "default_type"] => Ok(config.checkout.default_type.as_str().to_string()),
        ["checkout", "payment_method"] => Ok(config.checkout.payment_method.as_str().to_string()),
        _ => bail!("Unknown config key: {}", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        let (errors, warnings) = check_config(&config);
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut config = CliConfig::default();
        config.api.base_url = "api.tavola.app".to_string();
        config.api.timeout_ms = Some(0);
        config.session.id = " ".to_string();

        let (errors, _) = check_config(&config);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_get_config_value() {
        let config = CliConfig::default();
        assert_eq!(get_config_value(&config, "session.id").unwrap(), "default");
        assert_eq!(get_config_value(&config, "checkout.default_type").unwrap(), "on_site");
        assert!(get_config_value(&config, "api.token").is_err());
    }
}
