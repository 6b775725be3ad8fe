use std::sync::{Mutex, MutexGuard};

use super::{Shortlist, ShortlistStore};
use crate::db::ShortlistStorageError;

/// Process-local store. The existence check and the insert run under one lock, which gives the
/// same guarantee as the unique index on the Postgres side.
#[derive(Debug, Default)]
pub struct InMemoryShortlistStore {
    shortlists: Mutex<Vec<Shortlist>>,
}

impl InMemoryShortlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Shortlist>>, ShortlistStorageError> {
        self.shortlists
            .lock()
            .map_err(|_| ShortlistStorageError::Unavailable("shortlist lock poisoned".into()))
    }

    pub fn len(&self) -> usize {
        self.guard().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ShortlistStore for InMemoryShortlistStore {
    async fn find_by_session(
        &self,
        patient_id: &str,
        session_key: &str,
    ) -> Result<Option<Shortlist>, ShortlistStorageError> {
        Ok(self
            .guard()?
            .iter()
            .find(|s| s.patient_id == patient_id && s.session_key.as_deref() == Some(session_key))
            .cloned())
    }

    async fn find_by_token(
        &self,
        access_token: &str,
    ) -> Result<Option<Shortlist>, ShortlistStorageError> {
        Ok(self
            .guard()?
            .iter()
            .find(|s| s.access_token == access_token)
            .cloned())
    }

    async fn insert_shortlist(&self, shortlist: &Shortlist) -> Result<(), ShortlistStorageError> {
        let mut shortlists = self.guard()?;

        if let Some(session_key) = shortlist.session_key.as_deref() {
            let taken = shortlists.iter().any(|s| {
                s.patient_id == shortlist.patient_id && s.session_key.as_deref() == Some(session_key)
            });
            if taken {
                return Err(ShortlistStorageError::Conflict {
                    patient_id: shortlist.patient_id.clone(),
                    session_key: session_key.to_string(),
                });
            }
        }

        shortlists.push(shortlist.clone());
        Ok(())
    }
}
