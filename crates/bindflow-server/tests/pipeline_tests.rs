//! End-to-end tests of the submission pipeline stages
//!
//! These exercise parse -> pair generation -> record assembly as one flow,
//! without a database or live services: the dedup and association inputs are
//! supplied directly as the maps the store queries would produce.

use chrono::Utc;
use std::collections::{BTreeSet, HashMap};

use bindflow_common::hash::input_hash;
use bindflow_server::features::runs::pairs;
use bindflow_server::features::runs::records::{self, BuildContext};
use bindflow_server::features::runs::types::{
    LigandInput, PairCandidate, PriorResult, RunStatus, TargetInput, WarningKind,
};
use bindflow_server::ingest::tabular;

const MODEL_VERSION: &str = "affinity-v1";

fn ligands_from_csv(csv: &str) -> Vec<LigandInput> {
    let doc = tabular::parse(csv, ',');
    let smiles_col = doc.column_index("smiles").expect("smiles column");
    let name_col = doc.column_index("name");
    doc.rows
        .iter()
        .map(|row| LigandInput {
            smiles: row.get(smiles_col).map(|s| s.trim().to_string()).unwrap_or_default(),
            name: name_col
                .and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
        .collect()
}

fn targets_from_csv(csv: &str) -> Vec<TargetInput> {
    let doc = tabular::parse(csv, ',');
    let sequence_col = doc.column_index("sequence").expect("sequence column");
    let name_col = doc.column_index("name");
    doc.rows
        .iter()
        .map(|row| TargetInput {
            sequence: row
                .get(sequence_col)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            name: name_col
                .and_then(|i| row.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            resolved_identifier: None,
        })
        .collect()
}

fn build_ctx(now: chrono::DateTime<chrono::Utc>) -> BuildContext<'static> {
    BuildContext {
        user_id: "user-1",
        memo: "nightly sweep",
        model_version: MODEL_VERSION,
        indication_id: None,
        now,
    }
}

#[test]
fn clean_single_pair_is_queued() {
    let ligands = ligands_from_csv("smiles,name\nCCO,ethanol\n");
    let targets = targets_from_csv("sequence,name\nMKV,BRCA1\n");

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].warnings.is_empty());

    let now = Utc::now();
    let (records, summary) =
        records::build(candidates, &HashMap::new(), &HashMap::new(), &build_ctx(now));

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, RunStatus::Queued);
    assert_eq!(records[0].created_at, now);
    assert!(records[0].warnings.is_none());
    assert!(records[0].affinity_value.is_none());

    assert_eq!(summary.total, 1);
    assert_eq!(summary.queued, 1);
    assert_eq!(summary.done, 0);
    assert_eq!(summary.failed, 0);
}

#[test]
fn resubmission_of_completed_pair_reuses_prior_result() {
    let ligands = ligands_from_csv("smiles\nCCO\n");
    let targets = targets_from_csv("sequence\nMKV\n");

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    let hash = candidates[0].input_hash.clone().expect("hash");

    let mut prior = HashMap::new();
    prior.insert(
        hash,
        PriorResult {
            affinity_value: Some(7.25),
            affinity_prob: Some(0.91),
        },
    );

    let (records, summary) =
        records::build(candidates, &prior, &HashMap::new(), &build_ctx(Utc::now()));

    assert_eq!(records[0].status, RunStatus::Done);
    assert_eq!(records[0].affinity_value, Some(7.25));
    assert_eq!(records[0].affinity_prob, Some(0.91));

    let warnings = records[0].warnings.as_ref().expect("warnings");
    assert!(warnings.contains(&WarningKind::PreviousResultAvailable));
    assert_eq!(warnings.len(), 1);

    assert_eq!(summary.done, 1);
    assert_eq!(summary.queued, 0);
}

#[test]
fn empty_sequence_fails_without_prior_lookup() {
    let ligands = ligands_from_csv("smiles\nCCO\n");
    let targets = targets_from_csv("sequence,name\n,BRCA1\n");

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    assert!(candidates[0]
        .warnings
        .contains(&WarningKind::SequenceMissing));
    assert!(candidates[0].input_hash.is_none());

    let (records, summary) = records::build(
        candidates,
        &HashMap::new(),
        &HashMap::new(),
        &build_ctx(Utc::now()),
    );

    assert_eq!(records[0].status, RunStatus::Failed);
    assert_eq!(
        records[0].warnings.as_ref().map(BTreeSet::len),
        Some(1)
    );
    assert_eq!(summary.failed, 1);
}

#[test]
fn cross_product_covers_every_pair_in_order() {
    let ligands = ligands_from_csv("smiles\nCCO\nCCC\nCCN\n");
    let targets = targets_from_csv("sequence\nMKV\nMAA\n");

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    assert_eq!(candidates.len(), 6);

    // Ligand-major order: each ligand visits every target before the next.
    let pairs: Vec<(&str, &str)> = candidates
        .iter()
        .map(|c| (c.smiles.as_str(), c.sequence.as_str()))
        .collect();
    assert_eq!(pairs[0], ("CCO", "MKV"));
    assert_eq!(pairs[1], ("CCO", "MAA"));
    assert_eq!(pairs[2], ("CCC", "MKV"));
    assert_eq!(pairs[5], ("CCN", "MAA"));
}

#[test]
fn mixed_batch_summary_counts_every_status() {
    let ligands = ligands_from_csv("smiles,name\nCCO,ethanol\n,unnamed\n");
    let targets = targets_from_csv("sequence\nMKV\n");

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    assert_eq!(candidates.len(), 2);

    let done_hash = candidates[0].input_hash.clone().expect("hash");
    let mut prior = HashMap::new();
    prior.insert(
        done_hash,
        PriorResult {
            affinity_value: Some(5.0),
            affinity_prob: None,
        },
    );

    let (records, summary) =
        records::build(candidates, &prior, &HashMap::new(), &build_ctx(Utc::now()));

    assert_eq!(summary.total, 2);
    assert_eq!(summary.done, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.queued, 0);
    assert_eq!(records.len(), 2);
}

#[test]
fn overlong_sequence_is_flagged_but_still_hashed() {
    let sequence = "M".repeat(1281);
    let csv = format!("sequence\n{}\n", sequence);
    let ligands = ligands_from_csv("smiles\nCCO\n");
    let targets = targets_from_csv(&csv);

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    assert!(candidates[0]
        .warnings
        .contains(&WarningKind::SequenceTooLong));
    assert!(!candidates[0]
        .warnings
        .contains(&WarningKind::SequenceMissing));

    // Both parts are present, so the hash is still computed.
    assert_eq!(
        candidates[0].input_hash.as_deref(),
        Some(input_hash("CCO", &sequence, MODEL_VERSION).as_str())
    );
}

#[test]
fn hash_is_stable_across_generation_and_direct_computation() {
    let ligands = ligands_from_csv("smiles\nCCO\n");
    let targets = targets_from_csv("sequence\nMKV\n");

    let candidates = pairs::generate(&ligands, &targets, MODEL_VERSION);
    assert_eq!(
        candidates[0].input_hash.as_deref(),
        Some(input_hash("CCO", "MKV", MODEL_VERSION).as_str())
    );

    // A different model version produces a different hash for the same pair.
    let other = pairs::generate(&ligands, &targets, "affinity-v2");
    assert_ne!(candidates[0].input_hash, other[0].input_hash);
}

#[test]
fn association_scores_attach_by_resolved_target_identifier() {
    let ligands = ligands_from_csv("smiles\nCCO\n");
    let mut targets = targets_from_csv("sequence,name\nMKV,TP53\nMAA,KRAS\n");
    targets[0].resolved_identifier = Some("ENSG00000141510".to_string());

    let candidates: Vec<PairCandidate> = pairs::generate(&ligands, &targets, MODEL_VERSION);

    let mut scores = HashMap::new();
    scores.insert("ENSG00000141510".to_string(), 0.72);

    let ctx = BuildContext {
        indication_id: Some("EFO_0000305"),
        ..build_ctx(Utc::now())
    };
    let (records, _) = records::build(candidates, &HashMap::new(), &scores, &ctx);

    assert_eq!(records[0].association_score, Some(0.72));
    assert_eq!(records[0].indication_id.as_deref(), Some("EFO_0000305"));
    // Unresolved target gets no score but still carries the indication.
    assert_eq!(records[1].association_score, None);
    assert_eq!(records[1].indication_id.as_deref(), Some("EFO_0000305"));
}
