//! Ligand×target cross product and per-pair validation

use std::collections::BTreeSet;

use bindflow_common::hash::input_hash;

use super::types::{LigandInput, PairCandidate, TargetInput, WarningKind};

/// Maximum accepted target sequence length in characters.
pub const MAX_SEQUENCE_LEN: usize = 1280;

/// One validation rule evaluated against a trimmed (smiles, sequence) pair.
///
/// The rules are independent predicates kept in evaluation order so their
/// mutual exclusivity stays auditable: a sequence is flagged as missing or
/// as too long, never both.
struct WarningRule {
    kind: WarningKind,
    applies: fn(smiles: &str, sequence: &str) -> bool,
}

const WARNING_RULES: &[WarningRule] = &[
    WarningRule {
        kind: WarningKind::InvalidSmiles,
        applies: |smiles, _| smiles.is_empty(),
    },
    WarningRule {
        kind: WarningKind::SequenceMissing,
        applies: |_, sequence| sequence.is_empty(),
    },
    WarningRule {
        kind: WarningKind::SequenceTooLong,
        applies: |_, sequence| {
            !sequence.is_empty() && sequence.chars().count() > MAX_SEQUENCE_LEN
        },
    },
];

/// Evaluate the validation rules against a trimmed (smiles, sequence) pair.
pub fn validation_warnings(smiles: &str, sequence: &str) -> BTreeSet<WarningKind> {
    WARNING_RULES
        .iter()
        .filter(|rule| (rule.applies)(smiles, sequence))
        .map(|rule| rule.kind)
        .collect()
}

/// Expand ligands × targets into pair candidates, ligands outer.
///
/// Produces exactly `ligands.len() * targets.len()` candidates in a
/// deterministic order. A too-long sequence still gets a hash; the warning
/// alone routes the record to failed status later.
pub fn generate(
    ligands: &[LigandInput],
    targets: &[TargetInput],
    model_version: &str,
) -> Vec<PairCandidate> {
    let mut candidates = Vec::with_capacity(ligands.len() * targets.len());

    for ligand in ligands {
        for target in targets {
            let smiles = ligand.smiles.trim();
            let sequence = target.sequence.trim();

            let warnings = validation_warnings(smiles, sequence);

            let hash = if !smiles.is_empty() && !sequence.is_empty() {
                Some(input_hash(smiles, sequence, model_version))
            } else {
                None
            };

            candidates.push(PairCandidate {
                smiles: smiles.to_string(),
                sequence: sequence.to_string(),
                ligand_name: ligand.name.clone(),
                gene_name: target.name.clone(),
                target_identifier: target.resolved_identifier.clone(),
                warnings,
                input_hash: hash,
            });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ligand(smiles: &str) -> LigandInput {
        LigandInput {
            smiles: smiles.to_string(),
            name: None,
        }
    }

    fn target(sequence: &str) -> TargetInput {
        TargetInput {
            sequence: sequence.to_string(),
            name: None,
            resolved_identifier: None,
        }
    }

    #[test]
    fn test_cross_product_size_and_order() {
        let ligands = vec![ligand("CCO"), ligand("C")];
        let targets = vec![target("MKT"), target("MAA"), target("MGG")];

        let candidates = generate(&ligands, &targets, "v1");

        assert_eq!(candidates.len(), 6);
        // Ligands outer, targets inner.
        assert_eq!(candidates[0].smiles, "CCO");
        assert_eq!(candidates[0].sequence, "MKT");
        assert_eq!(candidates[2].sequence, "MGG");
        assert_eq!(candidates[3].smiles, "C");
    }

    #[test]
    fn test_clean_pair_has_hash_and_no_warnings() {
        let candidates = generate(&[ligand(" CCO ")], &[target(" MKT ")], "v1");
        assert!(candidates[0].warnings.is_empty());
        assert!(candidates[0].input_hash.is_some());
        assert_eq!(candidates[0].smiles, "CCO");
    }

    #[test]
    fn test_empty_smiles_is_flagged() {
        let candidates = generate(&[ligand("  ")], &[target("MKT")], "v1");
        assert!(candidates[0].warnings.contains(&WarningKind::InvalidSmiles));
        assert!(candidates[0].input_hash.is_none());
    }

    #[test]
    fn test_empty_sequence_never_flagged_too_long() {
        let warnings = validation_warnings("CCO", "");
        assert!(warnings.contains(&WarningKind::SequenceMissing));
        assert!(!warnings.contains(&WarningKind::SequenceTooLong));
    }

    #[test]
    fn test_over_long_sequence_flagged_only_too_long() {
        let sequence = "M".repeat(MAX_SEQUENCE_LEN + 1);
        let warnings = validation_warnings("CCO", &sequence);
        assert!(warnings.contains(&WarningKind::SequenceTooLong));
        assert!(!warnings.contains(&WarningKind::SequenceMissing));
    }

    #[test]
    fn test_sequence_at_limit_is_clean() {
        let sequence = "M".repeat(MAX_SEQUENCE_LEN);
        assert!(validation_warnings("CCO", &sequence).is_empty());
    }

    #[test]
    fn test_over_long_sequence_still_gets_hash() {
        let sequence = "M".repeat(MAX_SEQUENCE_LEN + 1);
        let candidates = generate(&[ligand("CCO")], &[target(&sequence)], "v1");
        assert!(candidates[0].input_hash.is_some());
        assert!(!candidates[0].warnings.is_empty());
    }

    #[test]
    fn test_identical_pairs_hash_equal_across_model_versions() {
        let a = generate(&[ligand("CCO")], &[target("MKT")], "v1");
        let b = generate(&[ligand(" CCO")], &[target("MKT ")], "v1");
        let c = generate(&[ligand("CCO")], &[target("MKT")], "v2");

        assert_eq!(a[0].input_hash, b[0].input_hash);
        assert_ne!(a[0].input_hash, c[0].input_hash);
    }
}
