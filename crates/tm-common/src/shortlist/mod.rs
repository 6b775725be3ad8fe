#![allow(async_fn_in_trait)]

pub mod memory;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    db::ShortlistStorageError, matching::RankedCandidate, run_id, token::generate_access_token,
};

pub use memory::InMemoryShortlistStore;

pub const DEFAULT_MAX_SIZE: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistEntry {
    pub patient_id: String,
    pub candidate_id: String,
    /// 1-based
    pub rank: u32,
    pub access_token: String,
    pub match_score: f64,
    pub platform_score: f64,
    pub total_score: f64,
}

/// Persisted top-K for one patient submission. Every entry carries `access_token`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shortlist {
    pub patient_id: String,
    pub session_key: Option<String>,
    pub access_token: String,
    pub match_run_id: String,
    pub entries: Vec<ShortlistEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializedShortlist {
    pub shortlist: Shortlist,
    /// true when an earlier shortlist for the same patient+session was returned as-is
    pub reused: bool,
}

/// Storage for shortlists.
///
/// `insert_shortlist` must write the header and all entries atomically and must reject a second
/// shortlist for the same `(patient_id, session_key)` with `ShortlistStorageError::Conflict`.
/// The check has to be enforced by the store itself (unique index, lock), not by callers.
pub trait ShortlistStore {
    async fn find_by_session(
        &self,
        patient_id: &str,
        session_key: &str,
    ) -> Result<Option<Shortlist>, ShortlistStorageError>;

    async fn find_by_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Shortlist>, ShortlistStorageError>;

    async fn insert_shortlist(&self, shortlist: &Shortlist) -> Result<(), ShortlistStorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ShortlistError {
    #[error("no ranked candidates to shortlist")]
    NothingToPersist,
    #[error("failed to persist shortlist: {0}")]
    Storage(#[from] ShortlistStorageError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortlistConfig {
    pub max_size: usize,
    /// Shrink to a single entry when the top candidate is a perfect match.
    pub concierge: bool,
}

impl Default for ShortlistConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            concierge: false,
        }
    }
}

impl ShortlistConfig {
    /// Defaults, overridden by `TM_SHORTLIST_MAX_SIZE` and `TM_SHORTLIST_CONCIERGE`.
    pub fn from_env() -> Self {
        let max_size = std::env::var("TM_SHORTLIST_MAX_SIZE")
            .ok()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_MAX_SIZE);
        let concierge = std::env::var("TM_SHORTLIST_CONCIERGE")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            max_size,
            concierge,
        }
    }

    pub fn shortlist_size(&self, ranked: &[RankedCandidate]) -> usize {
        let top_is_perfect = ranked.first().is_some_and(RankedCandidate::is_perfect);
        if self.concierge && top_is_perfect {
            1
        } else {
            self.max_size
        }
    }
}

/// Persist the top `max_size` ranked candidates under one freshly minted access token.
///
/// With a `session_key`, an existing shortlist for the same patient+session is returned
/// unchanged (`reused = true`), including when a concurrent request wins the insert race.
/// Without one, every call creates a new shortlist.
#[instrument(skip(store, ranked), fields(ranked = ranked.len()))]
pub async fn materialize<S: ShortlistStore>(
    store: &S,
    patient_id: &str,
    session_key: Option<&str>,
    ranked: &[RankedCandidate],
    max_size: usize,
) -> Result<MaterializedShortlist, ShortlistError> {
    if let Some(session) = session_key {
        if let Some(existing) = store.find_by_session(patient_id, session).await? {
            info!(
                patient_id,
                session_key = session,
                entries = existing.entries.len(),
                "shortlist_reused"
            );
            return Ok(MaterializedShortlist {
                shortlist: existing,
                reused: true,
            });
        }
    }

    let size = max_size.min(ranked.len());
    if size == 0 {
        return Err(ShortlistError::NothingToPersist);
    }

    let access_token = generate_access_token();
    let entries = ranked
        .iter()
        .take(size)
        .enumerate()
        .map(|(idx, ranked)| ShortlistEntry {
            patient_id: patient_id.to_string(),
            candidate_id: ranked.candidate.id.clone(),
            rank: idx as u32 + 1,
            access_token: access_token.clone(),
            match_score: ranked.score.match_score,
            platform_score: ranked.score.platform_score,
            total_score: ranked.score.total_score,
        })
        .collect();

    let shortlist = Shortlist {
        patient_id: patient_id.to_string(),
        session_key: session_key.map(str::to_string),
        access_token,
        match_run_id: run_id::get().to_string(),
        entries,
    };

    match store.insert_shortlist(&shortlist).await {
        Ok(()) => {
            info!(patient_id, entries = size, "shortlist_created");
            Ok(MaterializedShortlist {
                shortlist,
                reused: false,
            })
        }
        Err(conflict @ ShortlistStorageError::Conflict { .. }) => {
            warn!(patient_id, error = %conflict, "shortlist_insert_conflict");
            let existing = match session_key {
                Some(session) => store.find_by_session(patient_id, session).await?,
                None => None,
            };
            match existing {
                Some(existing) => Ok(MaterializedShortlist {
                    shortlist: existing,
                    reused: true,
                }),
                None => Err(conflict.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeSet, HashMap},
        sync::atomic::{AtomicBool, Ordering},
    };

    use super::*;
    use crate::{
        CandidateProfile, Gender, PatientPreferences, SessionFormat, matching::MatchingEngine,
    };

    fn ranked(ids: &[&str]) -> Vec<RankedCandidate> {
        let pool: Vec<_> = ids
            .iter()
            .map(|id| CandidateProfile {
                id: id.to_string(),
                accepting_new: true,
                gender: Some(Gender::Female),
                session_preferences: BTreeSet::from([SessionFormat::Online]),
                modalities: vec!["narm".into()],
                ..CandidateProfile::default()
            })
            .collect();
        let patient = PatientPreferences {
            specializations: vec!["NARM".into()],
            ..PatientPreferences::default()
        };
        MatchingEngine::default().rank(&pool, &patient, &HashMap::new())
    }

    #[tokio::test]
    async fn truncates_and_shares_one_token() {
        let store = InMemoryShortlistStore::new();
        let result = materialize(&store, "p-1", Some("s-1"), &ranked(&["a", "b", "c"]), 2)
            .await
            .unwrap();

        assert!(!result.reused);
        let shortlist = result.shortlist;
        assert_eq!(shortlist.entries.len(), 2);
        assert_eq!(shortlist.entries[0].rank, 1);
        assert_eq!(shortlist.entries[1].candidate_id, "b");
        assert!(
            shortlist
                .entries
                .iter()
                .all(|e| e.access_token == shortlist.access_token)
        );
        assert_eq!(shortlist.match_run_id, run_id::get());
    }

    #[tokio::test]
    async fn same_session_returns_same_token_without_duplicates() {
        let store = InMemoryShortlistStore::new();
        let first = materialize(&store, "p-1", Some("s-1"), &ranked(&["a", "b"]), 2)
            .await
            .unwrap();
        let second = materialize(&store, "p-1", Some("s-1"), &ranked(&["c"]), 2)
            .await
            .unwrap();

        assert!(second.reused);
        assert_eq!(first.shortlist.access_token, second.shortlist.access_token);
        assert_eq!(second.shortlist.entries.len(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn new_session_or_no_session_mints_new_token() {
        let store = InMemoryShortlistStore::new();
        let a = materialize(&store, "p-1", Some("s-1"), &ranked(&["a"]), 2).await.unwrap();
        let b = materialize(&store, "p-1", Some("s-2"), &ranked(&["a"]), 2).await.unwrap();
        let c = materialize(&store, "p-1", None, &ranked(&["a"]), 2).await.unwrap();
        let d = materialize(&store, "p-1", None, &ranked(&["a"]), 2).await.unwrap();

        let tokens: BTreeSet<_> = [a, b, c, d]
            .into_iter()
            .map(|m| m.shortlist.access_token)
            .collect();
        assert_eq!(tokens.len(), 4);
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn empty_ranking_is_rejected_without_writing() {
        let store = InMemoryShortlistStore::new();
        let err = materialize(&store, "p-1", Some("s-1"), &[], 2).await.unwrap_err();
        assert!(matches!(err, ShortlistError::NothingToPersist));
        assert_eq!(store.len(), 0);
    }

    /// Hides existing rows from the first lookup, like a concurrent request that passed the
    /// existence check before the other one committed.
    struct RacingStore {
        inner: InMemoryShortlistStore,
        hide_next_lookup: AtomicBool,
    }

    impl ShortlistStore for RacingStore {
        async fn find_by_session(
            &self,
            patient_id: &str,
            session_key: &str,
        ) -> Result<Option<Shortlist>, ShortlistStorageError> {
            if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_session(patient_id, session_key).await
        }

        async fn find_by_token(
            &self,
            access_token: &str,
        ) -> Result<Option<Shortlist>, ShortlistStorageError> {
            self.inner.find_by_token(access_token).await
        }

        async fn insert_shortlist(
            &self,
            shortlist: &Shortlist,
        ) -> Result<(), ShortlistStorageError> {
            self.inner.insert_shortlist(shortlist).await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_returns_winner_shortlist() {
        let store = RacingStore {
            inner: InMemoryShortlistStore::new(),
            hide_next_lookup: AtomicBool::new(false),
        };
        let winner = materialize(&store, "p-1", Some("s-1"), &ranked(&["a"]), 2)
            .await
            .unwrap();

        store.hide_next_lookup.store(true, Ordering::SeqCst);
        let loser = materialize(&store, "p-1", Some("s-1"), &ranked(&["b"]), 2)
            .await
            .unwrap();

        assert!(loser.reused);
        assert_eq!(loser.shortlist.access_token, winner.shortlist.access_token);
        assert_eq!(loser.shortlist.entries[0].candidate_id, "a");
        assert_eq!(store.inner.len(), 1);
    }

    struct FailingStore;

    impl ShortlistStore for FailingStore {
        async fn find_by_session(
            &self,
            _patient_id: &str,
            _session_key: &str,
        ) -> Result<Option<Shortlist>, ShortlistStorageError> {
            Ok(None)
        }

        async fn find_by_token(
            &self,
            _access_token: &str,
        ) -> Result<Option<Shortlist>, ShortlistStorageError> {
            Ok(None)
        }

        async fn insert_shortlist(
            &self,
            _shortlist: &Shortlist,
        ) -> Result<(), ShortlistStorageError> {
            Err(ShortlistStorageError::Unavailable("disk full".into()))
        }
    }

    #[tokio::test]
    async fn storage_failures_surface_to_caller() {
        let err = materialize(&FailingStore, "p-1", Some("s-1"), &ranked(&["a"]), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShortlistError::Storage(ShortlistStorageError::Unavailable(_))
        ));
    }

    #[test]
    fn concierge_mode_shrinks_perfect_shortlists() {
        let perfect = ranked(&["a", "b"]);
        assert!(perfect[0].is_perfect());

        let concierge = ShortlistConfig {
            concierge: true,
            ..ShortlistConfig::default()
        };
        assert_eq!(concierge.shortlist_size(&perfect), 1);
        assert_eq!(ShortlistConfig::default().shortlist_size(&perfect), 2);
        assert_eq!(concierge.shortlist_size(&[]), 2);
    }
}
