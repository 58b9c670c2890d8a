//! Run submission command
//!
//! The whole ingestion pipeline for one submission: parse the uploaded
//! ligand and target tables, expand them into every ligand×target pair,
//! resolve gene symbols to Ensembl identifiers, recognize already-computed
//! results by content hash, optionally attach disease-association scores,
//! and insert one run record per pair in a single transaction.
//!
//! Association enrichment is an optional stage: it runs only when the
//! submission names an indication, and its failures degrade to missing
//! scores rather than errors.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};

use crate::db;
use crate::ingest::tabular;
use crate::services::ExternalServices;

use super::super::indications;
use super::super::pairs;
use super::super::records::{self, BuildContext};
use super::super::types::{LigandInput, RunSummary, TargetInput};

/// Command to submit a batch of affinity prediction runs
#[derive(Debug, Clone)]
pub struct SubmitRunsCommand {
    pub user_id: String,
    pub memo: String,
    pub indication_id: Option<String>,
    pub ligand_csv: String,
    pub target_csv: String,
}

/// Response from submitting a run batch
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRunsResponse {
    pub summary: RunSummary,
}

/// Errors that can occur when submitting a run batch
#[derive(Debug, thiserror::Error)]
pub enum SubmitRunsError {
    #[error("Ligand file is required and cannot be empty")]
    LigandFileRequired,
    #[error("Target file is required and cannot be empty")]
    TargetFileRequired,
    #[error("Ligand file must contain a 'smiles' column")]
    SmilesColumnMissing,
    #[error("Target file must contain a 'sequence' column")]
    SequenceColumnMissing,
    #[error("Ligand file contains no data rows")]
    NoLigandRows,
    #[error("Target file contains no data rows")]
    NoTargetRows,
    #[error("Unknown indication id: {0}")]
    UnknownIndication(String),
    #[error("Server configuration error: {0}")]
    Config(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handles the submit runs command
///
/// Validation happens up front; nothing is persisted unless every input
/// checks out. A row that merely fails per-pair validation is still
/// persisted, with `status = failed`.
#[tracing::instrument(skip(pool, services, command), fields(user_id = %command.user_id))]
pub async fn handle(
    pool: PgPool,
    services: &ExternalServices,
    model_version: &str,
    command: SubmitRunsCommand,
) -> Result<SubmitRunsResponse, SubmitRunsError> {
    if command.ligand_csv.trim().is_empty() {
        return Err(SubmitRunsError::LigandFileRequired);
    }
    if command.target_csv.trim().is_empty() {
        return Err(SubmitRunsError::TargetFileRequired);
    }

    let indication_id = match command.indication_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(id) if indications::is_allowed(id) => Some(id.to_string()),
        Some(id) => return Err(SubmitRunsError::UnknownIndication(id.to_string())),
    };

    let ligand_doc = tabular::parse(&command.ligand_csv, ',');
    let target_doc = tabular::parse(&command.target_csv, ',');

    let smiles_col = ligand_doc
        .column_index("smiles")
        .ok_or(SubmitRunsError::SmilesColumnMissing)?;
    let ligand_name_col = ligand_doc.column_index("name");
    let sequence_col = target_doc
        .column_index("sequence")
        .ok_or(SubmitRunsError::SequenceColumnMissing)?;
    let target_name_col = target_doc.column_index("name");

    let ligands: Vec<LigandInput> = ligand_doc
        .rows
        .iter()
        .map(|row| LigandInput {
            smiles: cell(row, smiles_col),
            name: ligand_name_col
                .map(|index| cell(row, index))
                .filter(|name| !name.is_empty()),
        })
        .collect();
    if ligands.is_empty() {
        return Err(SubmitRunsError::NoLigandRows);
    }

    let mut targets: Vec<TargetInput> = target_doc
        .rows
        .iter()
        .map(|row| TargetInput {
            sequence: cell(row, sequence_col),
            name: target_name_col
                .map(|index| cell(row, index))
                .filter(|name| !name.is_empty()),
            resolved_identifier: None,
        })
        .collect();
    if targets.is_empty() {
        return Err(SubmitRunsError::NoTargetRows);
    }

    if !services.gene_lookup.is_configured() {
        return Err(SubmitRunsError::Config(
            "gene lookup service URL is not configured".to_string(),
        ));
    }
    if indication_id.is_some() && !services.association.is_configured() {
        return Err(SubmitRunsError::Config(
            "association service URL is not configured".to_string(),
        ));
    }

    // Resolve unique gene symbols once; rows sharing a symbol share the
    // result. Resolution failures leave identifiers unset, never abort.
    let symbols: BTreeSet<String> = targets
        .iter()
        .filter_map(|target| target.name.clone())
        .collect();
    let resolved = services.gene_lookup.resolve(&symbols).await;
    for target in &mut targets {
        target.resolved_identifier = target
            .name
            .as_ref()
            .and_then(|name| resolved.get(name).cloned());
    }

    let candidates = pairs::generate(&ligands, &targets, model_version);

    let hashes: BTreeSet<String> = candidates
        .iter()
        .filter_map(|candidate| candidate.input_hash.clone())
        .collect();
    let prior_done = db::runs::find_done(&pool, &hashes).await?;

    let mut association_scores: HashMap<String, f64> = HashMap::new();
    if let Some(indication) = indication_id.as_deref() {
        let target_ids: BTreeSet<String> = candidates
            .iter()
            .filter_map(|candidate| candidate.target_identifier.clone())
            .collect();

        let pairs_wanted: BTreeSet<(String, String)> = target_ids
            .iter()
            .map(|target| (indication.to_string(), target.clone()))
            .collect();
        let known = db::runs::find_known_scores(&pool, &pairs_wanted).await?;

        for target_id in target_ids {
            let key = (indication.to_string(), target_id.clone());
            if let Some(score) = known.get(&key) {
                association_scores.insert(target_id, *score);
            } else if let Some(score) =
                services.association.fetch_score(&target_id, indication).await
            {
                association_scores.insert(target_id, score);
            }
        }
    }

    let ctx = BuildContext {
        user_id: &command.user_id,
        memo: &command.memo,
        model_version,
        indication_id: indication_id.as_deref(),
        now: Utc::now(),
    };
    let (run_records, summary) = records::build(candidates, &prior_done, &association_scores, &ctx);

    db::runs::insert_runs(&pool, &run_records).await?;

    tracing::info!(
        total = summary.total,
        queued = summary.queued,
        done = summary.done,
        failed = summary.failed,
        "Run batch submitted"
    );

    Ok(SubmitRunsResponse { summary })
}

/// Cell at a column index, trimmed; short rows yield an empty cell.
fn cell(row: &[String], index: usize) -> String {
    row.get(index)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}
