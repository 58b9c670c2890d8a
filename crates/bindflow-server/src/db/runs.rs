//! Chunked dedup lookups and batch insert for the runs table

use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::{BTreeSet, HashMap};

use crate::features::runs::types::{PriorResult, RunRecord};

/// Upper bound on values bound into a single dedup query.
const QUERY_CHUNK_SIZE: usize = 200;

/// Rows per INSERT statement within the submission transaction.
const INSERT_CHUNK_SIZE: usize = 500;

/// Find prior completed runs for the given input hashes.
///
/// Hashes are looked up in chunks so a large submission never exceeds query
/// parameter limits. Only `status = 'done'` rows count as prior results.
pub async fn find_done(
    pool: &PgPool,
    hashes: &BTreeSet<String>,
) -> Result<HashMap<String, PriorResult>, sqlx::Error> {
    let mut found = HashMap::new();
    let hashes: Vec<&String> = hashes.iter().collect();

    for chunk in hashes.chunks(QUERY_CHUNK_SIZE) {
        let chunk: Vec<String> = chunk.iter().map(|hash| (*hash).clone()).collect();

        let rows = sqlx::query(
            "SELECT input_hash, affinity_value, affinity_prob \
             FROM runs \
             WHERE status = 'done' AND input_hash = ANY($1)",
        )
        .bind(&chunk)
        .fetch_all(pool)
        .await?;

        for row in rows {
            let hash: Option<String> = row.try_get("input_hash")?;
            if let Some(hash) = hash {
                found.insert(
                    hash,
                    PriorResult {
                        affinity_value: row.try_get("affinity_value")?,
                        affinity_prob: row.try_get("affinity_prob")?,
                    },
                );
            }
        }
    }

    Ok(found)
}

/// Find association scores already known from any prior run.
///
/// Any row carrying a non-null score for an (indication, target) pair counts,
/// independent of status or which submission produced it: association
/// scoring is a durable cross-submission cache.
pub async fn find_known_scores(
    pool: &PgPool,
    pairs: &BTreeSet<(String, String)>,
) -> Result<HashMap<(String, String), f64>, sqlx::Error> {
    let mut found = HashMap::new();
    let pairs: Vec<&(String, String)> = pairs.iter().collect();

    for chunk in pairs.chunks(QUERY_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT indication_id, target_identifier, association_score \
             FROM runs \
             WHERE association_score IS NOT NULL \
             AND (indication_id, target_identifier) IN ",
        );
        builder.push_tuples(chunk.iter(), |mut b, pair| {
            b.push_bind(&pair.0).push_bind(&pair.1);
        });

        let rows = builder.build().fetch_all(pool).await?;

        for row in rows {
            let indication: Option<String> = row.try_get("indication_id")?;
            let target: Option<String> = row.try_get("target_identifier")?;
            let score: Option<f64> = row.try_get("association_score")?;
            if let (Some(indication), Some(target), Some(score)) = (indication, target, score) {
                found.insert((indication, target), score);
            }
        }
    }

    Ok(found)
}

/// Insert a submission's record batch in one transaction.
///
/// All-or-nothing: a failure rolls back the whole batch.
pub async fn insert_runs(pool: &PgPool, records: &[RunRecord]) -> Result<(), sqlx::Error> {
    if records.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    for chunk in records.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO runs (id, user_id, status, memo, created_at, smiles, sequence, \
             ligand_name, gene_name, indication_id, target_identifier, association_score, \
             affinity_value, affinity_prob, input_hash, warnings, model_version) ",
        );

        builder.push_values(chunk, |mut b, record| {
            let warnings = record.warnings.as_ref().map(|warnings| {
                serde_json::Value::from(
                    warnings.iter().map(|kind| kind.code()).collect::<Vec<_>>(),
                )
            });

            b.push_bind(record.id)
                .push_bind(&record.user_id)
                .push_bind(record.status.as_str())
                .push_bind(&record.memo)
                .push_bind(record.created_at)
                .push_bind(&record.smiles)
                .push_bind(&record.sequence)
                .push_bind(&record.ligand_name)
                .push_bind(&record.gene_name)
                .push_bind(&record.indication_id)
                .push_bind(&record.target_identifier)
                .push_bind(record.association_score)
                .push_bind(record.affinity_value)
                .push_bind(record.affinity_prob)
                .push_bind(&record.input_hash)
                .push_bind(warnings)
                .push_bind(&record.model_version);
        });

        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    Ok(())
}

/// One run row as returned to the listing endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunListItem {
    pub id: uuid::Uuid,
    pub status: String,
    pub memo: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub smiles: String,
    pub sequence: String,
    pub ligand_name: Option<String>,
    pub gene_name: Option<String>,
    pub indication_id: Option<String>,
    pub target_identifier: Option<String>,
    pub association_score: Option<f64>,
    pub affinity_value: Option<f64>,
    pub affinity_prob: Option<f64>,
    pub warnings: Option<Vec<String>>,
    pub model_version: String,
}

/// List a user's runs, newest first, with the total count for pagination.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<RunListItem>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM runs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        "SELECT id, status, memo, created_at, smiles, sequence, ligand_name, gene_name, \
         indication_id, target_identifier, association_score, affinity_value, affinity_prob, \
         warnings, model_version \
         FROM runs \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id \
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let warnings: Option<serde_json::Value> = row.try_get("warnings")?;
        let warnings = warnings.and_then(|value| {
            value.as_array().map(|codes| {
                codes
                    .iter()
                    .filter_map(|code| code.as_str().map(str::to_string))
                    .collect()
            })
        });

        items.push(RunListItem {
            id: row.try_get("id")?,
            status: row.try_get("status")?,
            memo: row.try_get("memo")?,
            created_at: row.try_get("created_at")?,
            smiles: row.try_get("smiles")?,
            sequence: row.try_get("sequence")?,
            ligand_name: row.try_get("ligand_name")?,
            gene_name: row.try_get("gene_name")?,
            indication_id: row.try_get("indication_id")?,
            target_identifier: row.try_get("target_identifier")?,
            association_score: row.try_get("association_score")?,
            affinity_value: row.try_get("affinity_value")?,
            affinity_prob: row.try_get("affinity_prob")?,
            warnings,
            model_version: row.try_get("model_version")?,
        });
    }

    Ok((items, total))
}
