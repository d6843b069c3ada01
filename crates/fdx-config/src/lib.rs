//! fdx-config
//!
//! Layered YAML configuration for the harvester.
//!
//! - YAML documents are deep-merged in order (later layers override).
//! - The merged document is canonicalised and hashed so every run can log
//!   exactly which effective config it used.
//! - YAML must hold env var NAMES, never credential values; leaf strings that
//!   look like literal secrets (including a bare EDSM API key) abort
//!   loading, as does a base URL with credential query parameters.
//! - Typed settings are extracted once into [`HarvestConfig`] and passed by
//!   parameter from there on.

mod consumption;
mod harvest;
mod secrets;

pub use consumption::{report_unused_keys, UnusedKeyPolicy, UnusedKeyReport, CONSUMED_POINTERS};
pub use harvest::{CachePaths, DelaySettings, HarvestConfig};
pub use secrets::{resolve_credentials, EdsmCredentials};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// Known secret-like prefixes. A leaf string starting with one of these is
/// treated as a pasted credential.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",
    "sk_live",
    "sk_test",
    "AKIA",
    "-----BEGIN",
    "ghp_",
    "gho_",
    "glpat-",
    "xoxb-",
    "xoxp-",
];

/// EDSM API keys are 40 hex characters.
const EDSM_API_KEY_LEN: usize = 40;

/// Leaf keys whose value must always be an env var name.
const KEYS_ENV_POINTER: &str = "/edsm/keys_env";

const BASE_URL_POINTER: &str = "/edsm/base_url";

/// Query parameters the logs endpoint authenticates with. They belong in the
/// environment, never baked into the configured base URL.
const CREDENTIAL_QUERY_PARAMS: &[&str] = &["apikey=", "commandername="];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

/// Load and merge YAML files in the given order.
///
/// An empty `paths` slice yields the empty document, so every setting falls
/// back to its built-in default.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty YAML document parses as null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;
    enforce_keys_env_are_names(&merged)?;
    enforce_base_url_has_no_credentials(&merged)?;

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default Map is key-sorted, so compact output is canonical.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub(crate) fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

/// `keys_env` entries must look like env var names (`[A-Za-z0-9_]+`).
/// Anything else is almost certainly a pasted credential.
fn enforce_keys_env_are_names(v: &Value) -> Result<()> {
    let Some(Value::Object(map)) = v.pointer(KEYS_ENV_POINTER) else {
        return Ok(());
    };
    for (k, val) in map {
        let Some(s) = val.as_str() else {
            bail!("CONFIG_INVALID {}/{} must be a string env var name", KEYS_ENV_POINTER, k);
        };
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            bail!(
                "CONFIG_SECRET_DETECTED leaf={}/{} value=REDACTED (expected an env var name)",
                KEYS_ENV_POINTER,
                k
            );
        }
    }
    Ok(())
}

fn enforce_base_url_has_no_credentials(v: &Value) -> Result<()> {
    let Some(url) = v.pointer(BASE_URL_POINTER).and_then(Value::as_str) else {
        return Ok(());
    };
    let lower = url.to_ascii_lowercase();
    if let Some(param) = CREDENTIAL_QUERY_PARAMS.iter().find(|p| lower.contains(*p)) {
        bail!(
            "CONFIG_SECRET_DETECTED leaf={} carries '{}' value=REDACTED (credentials come from keys_env)",
            BASE_URL_POINTER,
            param.trim_end_matches('=')
        );
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p)) || looks_like_edsm_api_key(t)
}

fn looks_like_edsm_api_key(t: &str) -> bool {
    t.len() == EDSM_API_KEY_LEN && t.chars().all(|c| c.is_ascii_hexdigit())
}
