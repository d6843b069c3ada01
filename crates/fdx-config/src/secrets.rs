//! Credential resolution for the EDSM log API.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** under `/edsm/keys_env`.
//! - Callers invoke [`resolve_credentials`] once at startup and pass the
//!   result into the provider constructor. No other code reads credentials
//!   from the environment.
//! - `Debug` redacts values; errors name the env var, never its value.

use anyhow::{bail, Result};
use serde_json::Value;

const DEFAULT_COMMANDER_VAR: &str = "COMMANDER";
const DEFAULT_API_KEY_VAR: &str = "API_KEY";

/// Commander identity and API key for the discovery log endpoint.
#[derive(Clone)]
pub struct EdsmCredentials {
    pub commander: String,
    pub api_key: String,
}

impl std::fmt::Debug for EdsmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The commander name is not secret on its own, but it is half of the
        // credential pair, so both are withheld from logs.
        f.debug_struct("EdsmCredentials")
            .field("commander", &"<REDACTED>")
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Resolve the credential pair from the environment.
///
/// # Errors
/// `CONFIG_CREDENTIALS_MISSING` naming the first env var that is unset or
/// blank. This is fatal: no fetch may start without credentials.
pub fn resolve_credentials(config_json: &Value) -> Result<EdsmCredentials> {
    let commander_var = read_str_at(config_json, "/edsm/keys_env/commander")
        .unwrap_or_else(|| DEFAULT_COMMANDER_VAR.to_string());
    let api_key_var = read_str_at(config_json, "/edsm/keys_env/api_key")
        .unwrap_or_else(|| DEFAULT_API_KEY_VAR.to_string());

    let Some(commander) = resolve_env(&commander_var) else {
        bail!(
            "CONFIG_CREDENTIALS_MISSING: required env var '{}' (commander) is not set or empty",
            commander_var
        );
    };
    let Some(api_key) = resolve_env(&api_key_var) else {
        bail!(
            "CONFIG_CREDENTIALS_MISSING: required env var '{}' (api_key) is not set or empty",
            api_key_var
        );
    };

    Ok(EdsmCredentials { commander, api_key })
}
