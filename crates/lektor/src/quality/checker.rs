//! Spell-checking service client.
//!
//! The estimator only needs the number of flagged matches, so the match
//! objects are kept as raw JSON values.

use crate::{LektorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Form parameters of a check submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    pub language: String,
    pub text: String,
    #[serde(rename = "enabledRules")]
    pub enabled_rules: String,
    #[serde(rename = "enabledOnly")]
    pub enabled_only: bool,
}

/// Checker answer, one entry per flagged error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckResponse {
    pub matches: Vec<Value>,
}

/// A service that flags misspelled words.
#[async_trait]
pub trait SpellChecker: Send + Sync {
    /// Connectivity probe. Never fails, unreachable means `false`.
    async fn is_available(&self) -> bool;

    /// Submit text for checking.
    ///
    /// # Errors
    ///
    /// - `LektorError::Connection` if the service cannot be reached
    /// - `LektorError::InvalidData` for a non-success status or an
    ///   unexpected response body
    async fn check(&self, request: &CheckRequest) -> Result<CheckResponse>;
}

/// HTTP client for a LanguageTool `/v2/check` endpoint.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    service_url: String,
    client: reqwest::Client,
}

impl LanguageToolClient {
    pub fn new(service_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LektorError::connection_with_source("Failed to create HTTP client", e))?;
        Ok(Self {
            service_url: service_url.into(),
            client,
        })
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }
}

#[async_trait]
impl SpellChecker for LanguageToolClient {
    async fn is_available(&self) -> bool {
        match self.client.head(&self.service_url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("checker '{}' not reachable: {}", self.service_url, e);
                false
            }
        }
    }

    async fn check(&self, request: &CheckRequest) -> Result<CheckResponse> {
        let response = self
            .client
            .post(&self.service_url)
            .form(request)
            .send()
            .await
            .map_err(|e| LektorError::connection_with_source(format!("Request to '{}' failed", self.service_url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LektorError::invalid_data(format!(
                "Checker '{}' returned status: {}",
                self.service_url, status
            )));
        }

        response
            .json::<CheckResponse>()
            .await
            .map_err(|e| LektorError::invalid_data_with_source("Failed to parse checker response", e))
    }
}
