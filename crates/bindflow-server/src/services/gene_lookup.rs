//! Gene symbol resolution to canonical Ensembl gene identifiers
//!
//! Symbols that already look like Ensembl gene ids are mapped syntactically
//! without a remote call; everything else goes to the lookup service in a
//! single batched request. A failed batch resolves to nothing: absence of a
//! mapping, not an error, is what propagates to callers.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Timeout for the batched lookup call.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    symbols: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    mappings: HashMap<String, String>,
}

/// Client for the gene symbol batch-lookup service
#[derive(Clone)]
pub struct GeneLookupClient {
    base_url: Option<String>,
    client: Client,
    ensembl_pattern: Regex,
}

impl GeneLookupClient {
    pub fn new(base_url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent("bindflow-server/0.1")
            .build()?;

        // Ensembl gene id, optionally carrying a version suffix to strip.
        let ensembl_pattern = Regex::new(r"^(ENSG\d+)(\.\d+)?$")?;

        Ok(Self {
            base_url,
            client,
            ensembl_pattern,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Resolve each symbol to an Ensembl gene id where possible.
    ///
    /// The returned map is keyed by the original symbol strings, so target
    /// rows sharing an identical symbol share one resolution. Symbols absent
    /// from the map are unresolved.
    #[tracing::instrument(skip(self, symbols), fields(count = symbols.len()))]
    pub async fn resolve(&self, symbols: &BTreeSet<String>) -> HashMap<String, String> {
        let mut resolved = HashMap::new();
        let mut remaining: Vec<&String> = Vec::new();

        for symbol in symbols {
            let trimmed = symbol.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(captures) = self.ensembl_pattern.captures(trimmed) {
                resolved.insert(symbol.clone(), captures[1].to_string());
            } else {
                remaining.push(symbol);
            }
        }

        if remaining.is_empty() {
            return resolved;
        }

        match self.lookup_batch(&remaining).await {
            Ok(mappings) => {
                for symbol in remaining {
                    if let Some(id) = mappings.get(symbol.trim()) {
                        resolved.insert(symbol.clone(), id.clone());
                    }
                }
            },
            Err(error) => {
                tracing::warn!(%error, "Gene symbol lookup failed; leaving symbols unresolved");
            },
        }

        resolved
    }

    async fn lookup_batch(
        &self,
        symbols: &[&String],
    ) -> anyhow::Result<HashMap<String, String>> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("gene lookup service URL is not configured"))?;
        let url = format!("{}/lookup", base_url.trim_end_matches('/'));

        let request = LookupRequest {
            symbols: symbols.iter().map(|s| s.trim()).collect(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("gene lookup service returned {}", response.status());
        }

        let body: LookupResponse = response.json().await?;
        Ok(body.mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeneLookupClient {
        GeneLookupClient::new(None).unwrap()
    }

    #[tokio::test]
    async fn test_syntactic_path_needs_no_remote_call() {
        let symbols: BTreeSet<String> =
            ["ENSG00000141510".to_string(), "ENSG00000012048.12".to_string()]
                .into_iter()
                .collect();

        // No base URL configured, so a remote call would fail; the syntactic
        // path must not reach it.
        let resolved = client().resolve(&symbols).await;

        assert_eq!(
            resolved.get("ENSG00000141510").map(String::as_str),
            Some("ENSG00000141510")
        );
        assert_eq!(
            resolved.get("ENSG00000012048.12").map(String::as_str),
            Some("ENSG00000012048")
        );
    }

    #[tokio::test]
    async fn test_unresolvable_batch_is_fail_open() {
        let symbols: BTreeSet<String> = ["TP53".to_string()].into_iter().collect();
        let resolved = client().resolve(&symbols).await;
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_blank_symbols_are_skipped() {
        let symbols: BTreeSet<String> =
            ["".to_string(), "   ".to_string()].into_iter().collect();
        let resolved = client().resolve(&symbols).await;
        assert!(resolved.is_empty());
    }
}
