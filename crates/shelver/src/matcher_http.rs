//! Semantic matcher clients.
//!
//! [`HttpSemanticMatcher`] talks to the external embedding matcher
//! service over JSON HTTP, with a per-request timeout from
//! configuration. [`DisabledMatcher`] reports no matches, which makes
//! every audit heuristic-only; it backs the `provider = "disabled"`
//! configuration and is also convenient in tests.
//!
//! All transport failures surface as
//! [`AuditError::UpstreamUnavailable`]; the audit catches that and
//! degrades rather than failing.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use shelver_core::error::AuditError;
use shelver_core::semantic::{MatchOptions, SemanticMatcher, SemanticResult};

use crate::config::MatcherConfig;

/// Build the matcher the configuration asks for.
pub fn build_matcher(config: &MatcherConfig) -> Result<Box<dyn SemanticMatcher>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledMatcher)),
        "http" => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| anyhow::anyhow!("matcher.endpoint is required for provider 'http'"))?;
            Ok(Box::new(HttpSemanticMatcher::new(
                endpoint,
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        other => anyhow::bail!("Unknown matcher provider: '{}'", other),
    }
}

/// No-op matcher: never matches, never fails.
pub struct DisabledMatcher;

#[async_trait]
impl SemanticMatcher for DisabledMatcher {
    async fn match_text(
        &self,
        _text: &str,
        _owner_id: &str,
        _options: &MatchOptions,
    ) -> Result<SemanticResult> {
        Ok(SemanticResult::default())
    }
}

/// JSON HTTP client for the external semantic matcher service.
pub struct HttpSemanticMatcher {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct MatchRequestBody<'a> {
    text: &'a str,
    owner_id: &'a str,
    min_score: f64,
    skip_keyword_filter: bool,
    force_embedding_match: bool,
}

impl HttpSemanticMatcher {
    /// `endpoint` is the service base URL; match requests go to
    /// `{endpoint}/match`.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SemanticMatcher for HttpSemanticMatcher {
    async fn match_text(
        &self,
        text: &str,
        owner_id: &str,
        options: &MatchOptions,
    ) -> Result<SemanticResult> {
        let url = format!("{}/match", self.endpoint);
        let body = MatchRequestBody {
            text,
            owner_id,
            min_score: options.min_score,
            skip_keyword_filter: options.skip_keyword_filter,
            force_embedding_match: options.force_embedding_match,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuditError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuditError::UpstreamUnavailable(format!(
                "matcher returned HTTP {}",
                response.status()
            ))
            .into());
        }

        let result: SemanticResult = response
            .json()
            .await
            .map_err(|e| AuditError::UpstreamUnavailable(e.to_string()))?;

        Ok(result)
    }
}
