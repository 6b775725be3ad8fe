use deadpool_postgres::Client;
use tokio_postgres::{Error as PgError, Row};
use tracing::{instrument, warn};

use crate::db::{PgPool, db_error, util::TimedClientExt};
use crate::shortlist::{Shortlist, ShortlistEntry, ShortlistStore};

db_error!(ShortlistStorageError {
    #[error("shortlist already exists for patient {patient_id} and session {session_key}")]
    Conflict {
        patient_id: String,
        session_key: String,
    },
    #[error("shortlist store unavailable: {0}")]
    Unavailable(String),
});

const INSERT_SHORTLIST: &str = "INSERT INTO matching.shortlists (
        patient_id,
        session_key,
        access_token,
        match_run_id
    ) VALUES ($1, $2, $3, $4)
    ON CONFLICT (patient_id, session_key) DO NOTHING
    RETURNING id";

const INSERT_ENTRY: &str = "INSERT INTO matching.shortlist_entries (
        shortlist_id,
        patient_id,
        candidate_id,
        rank,
        access_token,
        match_score,
        platform_score,
        total_score
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

const SELECT_ENTRIES: &str = "SELECT patient_id, candidate_id, rank, access_token,
        match_score, platform_score, total_score
    FROM matching.shortlist_entries
    WHERE shortlist_id = $1
    ORDER BY rank ASC";

/// Postgres-backed store. Deduplication relies on `uq_shortlists_patient_session`.
#[derive(Clone)]
pub struct PgShortlistStore {
    pool: PgPool,
}

impl PgShortlistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn row_to_entry(row: &Row) -> ShortlistEntry {
    let rank: i32 = row.get("rank");
    ShortlistEntry {
        patient_id: row.get("patient_id"),
        candidate_id: row.get("candidate_id"),
        rank: rank.max(1) as u32,
        access_token: row.get("access_token"),
        match_score: row.get("match_score"),
        platform_score: row.get("platform_score"),
        total_score: row.get("total_score"),
    }
}

async fn load_shortlist(
    client: &Client,
    header: Option<Row>,
) -> Result<Option<Shortlist>, PgError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let shortlist_id: i64 = header.get("id");
    let entries = client
        .timed_query(SELECT_ENTRIES, &[&shortlist_id], "select_shortlist_entries")
        .await?
        .iter()
        .map(row_to_entry)
        .collect();

    Ok(Some(Shortlist {
        patient_id: header.get("patient_id"),
        session_key: header.get("session_key"),
        access_token: header.get("access_token"),
        match_run_id: header.get("match_run_id"),
        entries,
    }))
}

impl ShortlistStore for PgShortlistStore {
    #[instrument(skip(self))]
    async fn find_by_session(
        &self,
        patient_id: &str,
        session_key: &str,
    ) -> Result<Option<Shortlist>, ShortlistStorageError> {
        let client = self.pool.get().await?;
        let header = client
            .timed_query_opt(
                "SELECT id, patient_id, session_key, access_token, match_run_id
                 FROM matching.shortlists
                 WHERE patient_id = $1 AND session_key = $2",
                &[&patient_id, &session_key],
                "select_shortlist_by_session",
            )
            .await?;

        Ok(load_shortlist(&client, header).await?)
    }

    #[instrument(skip(self, access_token))]
    async fn find_by_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Shortlist>, ShortlistStorageError> {
        let client = self.pool.get().await?;
        let header = client
            .timed_query_opt(
                "SELECT id, patient_id, session_key, access_token, match_run_id
                 FROM matching.shortlists
                 WHERE access_token = $1",
                &[&access_token],
                "select_shortlist_by_token",
            )
            .await?;

        Ok(load_shortlist(&client, header).await?)
    }

    /// Header and entries in one transaction. A duplicate `(patient_id, session_key)` rolls back
    /// and reports `Conflict`.
    #[instrument(skip(self, shortlist), fields(patient_id = %shortlist.patient_id, entries = shortlist.entries.len()))]
    async fn insert_shortlist(&self, shortlist: &Shortlist) -> Result<(), ShortlistStorageError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let inserted = tx
            .timed_query_opt(
                INSERT_SHORTLIST,
                &[
                    &shortlist.patient_id,
                    &shortlist.session_key,
                    &shortlist.access_token,
                    &shortlist.match_run_id,
                ],
                "insert_shortlist",
            )
            .await?;

        let Some(row) = inserted else {
            // Dropping the transaction rolls it back.
            warn!(patient_id = %shortlist.patient_id, "shortlist_session_taken");
            return Err(ShortlistStorageError::Conflict {
                patient_id: shortlist.patient_id.clone(),
                session_key: shortlist.session_key.clone().unwrap_or_default(),
            });
        };
        let shortlist_id: i64 = row.get("id");

        let stmt = tx.prepare(INSERT_ENTRY).await?;
        for entry in &shortlist.entries {
            let rank = entry.rank as i32;
            tx.timed_execute(
                &stmt,
                &[
                    &shortlist_id,
                    &entry.patient_id,
                    &entry.candidate_id,
                    &rank,
                    &entry.access_token,
                    &entry.match_score,
                    &entry.platform_score,
                    &entry.total_score,
                ],
                "insert_shortlist_entry",
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
