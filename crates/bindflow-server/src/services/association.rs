//! Disease-association score lookup against the ranking service
//!
//! Pages through the ranked association list for a target until the
//! requested indication shows up, the service reports no more rows, or a
//! page request fails. Failures yield no score instead of an error;
//! association enrichment never blocks a submission.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Rows requested per page of the ranked association list.
pub const PAGE_SIZE: u64 = 50;

/// Timeout for each page request.
const PAGE_TIMEOUT: Duration = Duration::from_secs(12);

const ASSOCIATED_DISEASES_QUERY: &str = r#"
query targetAssociations($targetId: String!, $index: Int!, $size: Int!) {
  target(ensemblId: $targetId) {
    associatedDiseases(page: { index: $index, size: $size }) {
      count
      rows {
        disease { id }
        score
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    target: Option<TargetData>,
}

#[derive(Debug, Deserialize)]
struct TargetData {
    #[serde(rename = "associatedDiseases")]
    associated_diseases: AssociationPage,
}

#[derive(Debug, Default, Deserialize)]
struct AssociationPage {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    rows: Vec<AssociationRow>,
}

#[derive(Debug, Deserialize)]
struct AssociationRow {
    disease: DiseaseRef,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct DiseaseRef {
    id: String,
}

/// Client for the disease-association ranking service
#[derive(Clone)]
pub struct AssociationClient {
    base_url: Option<String>,
    client: Client,
}

impl AssociationClient {
    pub fn new(base_url: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(PAGE_TIMEOUT)
            .user_agent("bindflow-server/0.1")
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Find the association score linking a target to an indication.
    ///
    /// Pages are scanned in rank order starting at index 0. The first row
    /// whose disease id matches short-circuits; an empty page or reaching
    /// the server-reported total ends the search with no score. A failed
    /// page request aborts the whole fetch for this pair.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_score(&self, target_identifier: &str, indication_id: &str) -> Option<f64> {
        let mut page_index: u64 = 0;

        loop {
            let page = match self.fetch_page(target_identifier, page_index).await {
                Ok(page) => page,
                Err(error) => {
                    tracing::warn!(
                        %error,
                        page_index,
                        "Association page fetch failed; no score attached"
                    );
                    return None;
                },
            };

            if let Some(row) = page.rows.iter().find(|row| row.disease.id == indication_id) {
                return Some(row.score);
            }

            page_index += 1;
            if page.rows.is_empty() || page_index * PAGE_SIZE >= page.count {
                return None;
            }
        }
    }

    async fn fetch_page(
        &self,
        target_identifier: &str,
        page_index: u64,
    ) -> anyhow::Result<AssociationPage> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("association service URL is not configured"))?;
        let url = format!("{}/graphql", base_url.trim_end_matches('/'));

        let body = json!({
            "query": ASSOCIATED_DISEASES_QUERY,
            "variables": {
                "targetId": target_identifier,
                "index": page_index,
                "size": PAGE_SIZE,
            },
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("association service returned {}", response.status());
        }

        let envelope: GraphqlResponse = response.json().await?;

        // An unknown target yields an empty page, which ends the search.
        Ok(envelope
            .data
            .and_then(|data| data.target)
            .map(|target| target.associated_diseases)
            .unwrap_or_default())
    }
}
