//! Fixed indication allow-list for association enrichment

use serde::Serialize;

/// One disease indication accepted by the submission endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Indication {
    pub id: &'static str,
    pub label: &'static str,
}

/// Indications the submission endpoint accepts for association enrichment.
pub const INDICATIONS: &[Indication] = &[
    Indication { id: "EFO_0000305", label: "Breast carcinoma" },
    Indication { id: "EFO_0001071", label: "Lung carcinoma" },
    Indication { id: "EFO_0000692", label: "Prostate carcinoma" },
    Indication { id: "EFO_0005842", label: "Colorectal cancer" },
    Indication { id: "EFO_0000222", label: "Acute myeloid leukemia" },
];

pub fn is_allowed(id: &str) -> bool {
    INDICATIONS.iter().any(|indication| indication.id == id)
}
