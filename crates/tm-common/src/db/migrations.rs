use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "shortlists + entries",
        sql: r#"
CREATE TABLE IF NOT EXISTS matching.shortlists (
    id BIGSERIAL PRIMARY KEY,
    patient_id TEXT NOT NULL,
    session_key TEXT,
    access_token TEXT NOT NULL UNIQUE,
    match_run_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- NULL session keys never collide, so sessionless calls always insert.
CREATE UNIQUE INDEX IF NOT EXISTS uq_shortlists_patient_session
    ON matching.shortlists(patient_id, session_key);

CREATE TABLE IF NOT EXISTS matching.shortlist_entries (
    id BIGSERIAL PRIMARY KEY,
    shortlist_id BIGINT NOT NULL REFERENCES matching.shortlists(id) ON DELETE CASCADE,
    patient_id TEXT NOT NULL,
    candidate_id TEXT NOT NULL,
    rank INTEGER NOT NULL CHECK (rank >= 1),
    access_token TEXT NOT NULL,
    match_score DOUBLE PRECISION NOT NULL,
    platform_score DOUBLE PRECISION NOT NULL,
    total_score DOUBLE PRECISION NOT NULL,
    UNIQUE (shortlist_id, rank)
);

CREATE INDEX IF NOT EXISTS idx_shortlist_entries_token
    ON matching.shortlist_entries(access_token);
"#,
    },
    Migration {
        id: 2,
        description: "non-negative score checks",
        sql: r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_shortlist_entry_scores'
    ) THEN
        ALTER TABLE matching.shortlist_entries
            ADD CONSTRAINT chk_shortlist_entry_scores
            CHECK (match_score >= 0.0 AND platform_score >= 0.0 AND total_score >= 0.0);
    END IF;
END $$;
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS matching;
             CREATE TABLE IF NOT EXISTS matching.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM matching.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO matching.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_strictly_increasing() {
        let ids: Vec<i32> = MIGRATIONS.iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn shortlist_uniqueness_lives_in_the_schema() {
        let sql = MIGRATIONS[0].sql;
        assert!(sql.contains("ON matching.shortlists(patient_id, session_key)"));
        assert!(sql.contains("UNIQUE (shortlist_id, rank)"));
    }
}
