//! Provider boundary for upstream discovery and traffic lookups.
//!
//! This module defines **only** the traits and the error taxonomy. The
//! reconciliation engine and the enrichment phase program against these
//! traits; the concrete HTTP client lives in `lib.rs`.

use std::fmt;

use async_trait::async_trait;
use fdx_schemas::{Interval, Observation, TrafficRecord};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that a provider implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network failure, timeout, or a non-2xx HTTP status.
    Transport(String),
    /// The upstream asked us to slow down (HTTP 429).
    RateLimited(String),
    /// The upstream API answered with a non-success application status.
    Api { code: Option<i64>, message: String },
    /// A response payload was missing expected fields or was not JSON.
    Decode(String),
    /// A required configuration value is missing or invalid.
    Config(String),
}

impl ProviderError {
    /// Stable short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Transport(_) => "transport",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::Api { .. } => "api",
            ProviderError::Decode(_) => "decode",
            ProviderError::Config(_) => "config",
        }
    }

    /// `true` when the payload itself was unexpected, as opposed to the
    /// request never completing.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, ProviderError::Api { .. } | ProviderError::Decode(_))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::RateLimited(msg) => write!(f, "rate limited: {msg}"),
            ProviderError::Api {
                code: Some(c),
                message,
            } => write!(f, "provider api error code={c}: {message}"),
            ProviderError::Api {
                code: None,
                message,
            } => write!(f, "provider api error: {message}"),
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Upstream source of first-discovery events.
///
/// One call covers exactly one interval. Implementations return only
/// records flagged as first discoveries, in upstream order.
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_first_discoveries(
        &self,
        interval: &Interval,
    ) -> Result<Vec<Observation>, ProviderError>;
}

/// Upstream source of per-system visit counters.
#[async_trait]
pub trait TrafficProvider: Send + Sync {
    async fn fetch_traffic(&self, system_id: &str) -> Result<TrafficRecord, ProviderError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider {
        records: Vec<Observation>,
    }

    #[async_trait]
    impl DiscoveryProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn fetch_first_discoveries(
            &self,
            _interval: &Interval,
        ) -> Result<Vec<Observation>, ProviderError> {
            Ok(self.records.clone())
        }
    }

    #[test]
    fn provider_is_object_safe_via_box() {
        let _p: Box<dyn DiscoveryProvider> = Box::new(MockProvider { records: vec![] });
    }

    #[test]
    fn error_display_api_with_code() {
        let err = ProviderError::Api {
            code: Some(203),
            message: "Commander name/API Key not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "provider api error code=203: Commander name/API Key not found"
        );
    }

    #[test]
    fn error_display_transport() {
        let err = ProviderError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn malformed_kinds_are_distinguished_from_transport() {
        assert!(ProviderError::Decode("x".into()).is_malformed_response());
        assert!(ProviderError::Api {
            code: None,
            message: "x".into()
        }
        .is_malformed_response());
        assert!(!ProviderError::Transport("x".into()).is_malformed_response());
        assert!(!ProviderError::RateLimited("x".into()).is_malformed_response());
        assert_eq!(ProviderError::RateLimited("x".into()).kind(), "rate_limited");
    }
}
