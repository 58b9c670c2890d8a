//! Assembly of persistable run records from validated pair candidates

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use super::types::{PairCandidate, PriorResult, RunRecord, RunStatus, RunSummary, WarningKind};

/// Submission-level inputs shared by every record in the batch.
pub struct BuildContext<'a> {
    pub user_id: &'a str,
    pub memo: &'a str,
    pub model_version: &'a str,
    pub indication_id: Option<&'a str>,
    pub now: DateTime<Utc>,
}

/// Build one run record per candidate plus the status summary.
///
/// Per candidate, in order: a warning-free candidate whose hash matches a
/// prior completed run is emitted as `done` with the prior affinity copied
/// and `previous_result_available` replacing the empty warning set; a
/// candidate with warnings is emitted as `failed`; everything else is
/// `queued`. Association scores are attached by target identifier.
///
/// No side effects; persistence is the caller's responsibility.
pub fn build(
    candidates: Vec<PairCandidate>,
    prior_done: &HashMap<String, PriorResult>,
    association_scores: &HashMap<String, f64>,
    ctx: &BuildContext<'_>,
) -> (Vec<RunRecord>, RunSummary) {
    let mut records = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let prior = if candidate.warnings.is_empty() {
            candidate
                .input_hash
                .as_deref()
                .and_then(|hash| prior_done.get(hash))
        } else {
            None
        };

        let (status, affinity_value, affinity_prob, warnings) = match prior {
            Some(prior) => {
                let mut warnings = BTreeSet::new();
                warnings.insert(WarningKind::PreviousResultAvailable);
                (
                    RunStatus::Done,
                    prior.affinity_value,
                    prior.affinity_prob,
                    Some(warnings),
                )
            },
            None if !candidate.warnings.is_empty() => (
                RunStatus::Failed,
                None,
                None,
                Some(candidate.warnings.clone()),
            ),
            None => (RunStatus::Queued, None, None, None),
        };

        let association_score = candidate
            .target_identifier
            .as_deref()
            .and_then(|id| association_scores.get(id))
            .copied();

        records.push(RunRecord {
            id: Uuid::new_v4(),
            user_id: ctx.user_id.to_string(),
            status,
            memo: ctx.memo.to_string(),
            created_at: ctx.now,
            smiles: candidate.smiles,
            sequence: candidate.sequence,
            ligand_name: candidate.ligand_name,
            gene_name: candidate.gene_name,
            indication_id: ctx.indication_id.map(str::to_string),
            target_identifier: candidate.target_identifier,
            association_score,
            affinity_value,
            affinity_prob,
            input_hash: candidate.input_hash,
            warnings,
            model_version: ctx.model_version.to_string(),
        });
    }

    let mut summary = RunSummary {
        total: records.len() as u64,
        ..RunSummary::default()
    };
    for record in &records {
        match record.status {
            RunStatus::Queued => summary.queued += 1,
            RunStatus::Done => summary.done += 1,
            RunStatus::Failed => summary.failed += 1,
            RunStatus::Running => {},
        }
    }

    (records, summary)
}
