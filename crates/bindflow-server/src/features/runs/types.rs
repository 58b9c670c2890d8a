//! Domain types for run submission

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Lifecycle status of a run record.
///
/// Records created by a submission start as `queued`, `done` (copied from a
/// prior completed run), or `failed` (validation warnings). The pipeline
/// never mutates a record after creation; `running` is written by the
/// downstream scoring worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Done => "done",
            RunStatus::Failed => "failed",
        }
    }
}

/// Validation warning attached to a pair candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    InvalidSmiles,
    SequenceMissing,
    SequenceTooLong,
    PreviousResultAvailable,
}

impl WarningKind {
    pub fn code(&self) -> &'static str {
        match self {
            WarningKind::InvalidSmiles => "invalid_smiles",
            WarningKind::SequenceMissing => "sequence_missing",
            WarningKind::SequenceTooLong => "sequence_too_long",
            WarningKind::PreviousResultAvailable => "previous_result_available",
        }
    }
}

/// One ligand row parsed from the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigandInput {
    pub smiles: String,
    pub name: Option<String>,
}

/// One target row parsed from the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInput {
    pub sequence: String,
    pub name: Option<String>,
    /// Canonical Ensembl gene id, filled in by symbol resolution
    pub resolved_identifier: Option<String>,
}

/// One ligand/target combination produced by the cross product, before
/// persistence.
///
/// `input_hash` is present iff both trimmed `smiles` and `sequence` are
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairCandidate {
    pub smiles: String,
    pub sequence: String,
    pub ligand_name: Option<String>,
    pub gene_name: Option<String>,
    pub target_identifier: Option<String>,
    pub warnings: BTreeSet<WarningKind>,
    pub input_hash: Option<String>,
}

/// Affinity result copied from a prior completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorResult {
    pub affinity_value: Option<f64>,
    pub affinity_prob: Option<f64>,
}

/// Persistable run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub user_id: String,
    pub status: RunStatus,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub smiles: String,
    pub sequence: String,
    pub ligand_name: Option<String>,
    pub gene_name: Option<String>,
    pub indication_id: Option<String>,
    pub target_identifier: Option<String>,
    pub association_score: Option<f64>,
    pub affinity_value: Option<f64>,
    pub affinity_prob: Option<f64>,
    pub input_hash: Option<String>,
    pub warnings: Option<BTreeSet<WarningKind>>,
    pub model_version: String,
}

/// Status counts returned to the caller after a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: u64,
    pub queued: u64,
    pub done: u64,
    pub failed: u64,
}
