//! fdx-edsm
//!
//! Upstream provider boundary and the concrete EDSM HTTP client.
//!
//! This crate does **not** touch the discovery store; callers (the
//! reconciliation engine, the enrichment phase) hand results to the
//! store themselves.

pub mod provider;

pub use provider::{DiscoveryProvider, ProviderError, TrafficProvider};

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fdx_schemas::{Interval, Observation, TrafficRecord};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// `msgnum` value the logs endpoint uses for success.
pub const EDSM_MSGNUM_OK: i64 = 100;

/// EDSM expects `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_edsm_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// EDSM-backed discovery and traffic provider.
///
/// Credentials are resolved by the caller and passed in; they are never
/// logged.
#[derive(Clone)]
pub struct EdsmClient {
    commander: String,
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for EdsmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdsmClient")
            .field("base_url", &self.base_url)
            .field("commander", &"<REDACTED>")
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl EdsmClient {
    pub fn new(
        commander: String,
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if commander.trim().is_empty() || api_key.trim().is_empty() {
            return Err(ProviderError::Config(
                "commander and api_key must be non-empty".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            commander,
            api_key,
            http,
            base_url,
        })
    }

    fn logs_url(&self) -> String {
        format!("{}/api-logs-v1/get-logs", self.base_url.trim_end_matches('/'))
    }

    fn traffic_url(&self) -> String {
        format!("{}/api-system-v1/traffic", self.base_url.trim_end_matches('/'))
    }

    /// Send a GET and return the body text, mapping HTTP-level failures.
    async fn get_text(&self, req: reqwest::RequestBuilder) -> Result<String, ProviderError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("edsm request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(format!(
                "edsm http status={}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "edsm http error status={}",
                status.as_u16()
            )));
        }

        resp.text()
            .await
            .map_err(|e| ProviderError::Transport(format!("edsm body read failed: {e}")))
    }
}

#[async_trait]
impl DiscoveryProvider for EdsmClient {
    fn name(&self) -> &'static str {
        "edsm"
    }

    async fn fetch_first_discoveries(
        &self,
        interval: &Interval,
    ) -> Result<Vec<Observation>, ProviderError> {
        let start_s = format_edsm_datetime(interval.start);
        let end_s = format_edsm_datetime(interval.end);

        let req = self.http.get(self.logs_url()).query(&[
            ("commanderName", self.commander.as_str()),
            ("apiKey", self.api_key.as_str()),
            ("startDateTime", start_s.as_str()),
            ("endDateTime", end_s.as_str()),
            ("showId", "1"),
        ]);
        let body = self.get_text(req).await?;
        let out = parse_logs_body(&body)?;
        debug!(interval = %interval.key(), records = out.len(), "edsm logs fetched");
        Ok(out)
    }
}

#[async_trait]
impl TrafficProvider for EdsmClient {
    async fn fetch_traffic(&self, system_id: &str) -> Result<TrafficRecord, ProviderError> {
        let req = self
            .http
            .get(self.traffic_url())
            .query(&[("systemId", system_id)]);
        let body = self.get_text(req).await?;
        let v: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Decode(format!("edsm traffic json decode failed: {e}")))?;
        traffic_from_value(&v)
    }
}

// ---------------------------------------------------------------------------
// Wire decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct LogsResponse {
    msgnum: Option<i64>,
    msg: Option<String>,
    #[serde(default)]
    logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct LogEntry {
    system: String,
    #[serde(rename = "systemId")]
    system_id: Value,
    #[serde(rename = "firstDiscover")]
    first_discover: bool,
    date: String,
}

fn parse_logs_body(body: &str) -> Result<Vec<Observation>, ProviderError> {
    let parsed: LogsResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("edsm logs json decode failed: {e}")))?;

    if parsed.msgnum != Some(EDSM_MSGNUM_OK) {
        return Err(ProviderError::Api {
            code: parsed.msgnum,
            message: parsed.msg.unwrap_or_else(|| "unknown".to_string()),
        });
    }

    let mut out = Vec::new();
    for entry in parsed.logs.into_iter().filter(|e| e.first_discover) {
        let id = match &entry.system_id {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            other => {
                return Err(ProviderError::Decode(format!(
                    "edsm log entry has unusable systemId: {other}"
                )))
            }
        };
        out.push(Observation::new(id, entry.system, entry.date));
    }
    Ok(out)
}

/// EDSM answers unknown systems with `[]` or `{}`; both mean "no traffic".
fn traffic_from_value(v: &Value) -> Result<TrafficRecord, ProviderError> {
    let obj = match v {
        Value::Object(map) => map,
        Value::Array(arr) if arr.is_empty() => return Ok(TrafficRecord::default()),
        other => {
            return Err(ProviderError::Decode(format!(
                "edsm traffic payload is not an object: {other}"
            )))
        }
    };

    let counter = |name: &str| -> Result<u64, ProviderError> {
        match obj.get("traffic").and_then(|t| t.get(name)) {
            None | Some(Value::Null) => Ok(0),
            Some(n) => n.as_u64().ok_or_else(|| {
                ProviderError::Decode(format!("edsm traffic.{name} is not a count: {n}"))
            }),
        }
    };

    let mut breakdown = BTreeMap::new();
    match obj.get("breakdown") {
        None | Some(Value::Null) => {}
        Some(Value::Array(arr)) if arr.is_empty() => {}
        Some(Value::Object(map)) => {
            for (ship, n) in map {
                let n = n.as_u64().ok_or_else(|| {
                    ProviderError::Decode(format!("edsm breakdown.{ship} is not a count: {n}"))
                })?;
                breakdown.insert(ship.clone(), n);
            }
        }
        Some(other) => {
            return Err(ProviderError::Decode(format!(
                "edsm breakdown has unexpected shape: {other}"
            )))
        }
    }

    Ok(TrafficRecord {
        total: counter("total")?,
        week: counter("week")?,
        day: counter("day")?,
        breakdown,
    })
}

// -----------------
// Tests (no network)
// -----------------
