//! Writes each history snapshot the engine commits back to durable storage.

use std::future::Future;

use futures::StreamExt;

use crate::engine::{CommitReceiver, EngineHandle};
use crate::error::Result;
use crate::model::History;
use crate::storage::HistoryStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,
    /// Empty snapshots never overwrite what is stored.
    SkippedEmpty,
}

pub struct HistoryPersister<H> {
    store: H,
}

impl<H: HistoryStore> HistoryPersister<H> {
    pub fn new(store: H) -> Self {
        Self { store }
    }

    pub fn persist(&self, candidate: &History) -> Result<PersistOutcome> {
        if candidate.is_empty() {
            return Ok(PersistOutcome::SkippedEmpty);
        }
        self.store.save(candidate)?;
        Ok(PersistOutcome::Written)
    }

    /// Drains commits in arrival order until the engine side closes.
    /// Returns how many snapshots were written.
    pub async fn run(self, mut commits: CommitReceiver) -> usize {
        let mut written = 0;
        while let Some(candidate) = commits.next().await {
            match self.persist(&candidate) {
                Ok(PersistOutcome::Written) => {
                    written += 1;
                    tracing::debug!(games = candidate.len(), "stored finished game history");
                }
                Ok(PersistOutcome::SkippedEmpty) => {
                    tracing::debug!("skipped empty history snapshot");
                }
                Err(e) => tracing::warn!(error = %e, "failed to store finished game history"),
            }
        }
        written
    }

    /// `None` if the handle's commit stream was already taken.
    pub fn subscribe<E: EngineHandle>(
        self,
        handle: &mut E,
    ) -> Option<impl Future<Output = usize> + use<H, E>> {
        let commits = handle.take_commits()?;
        Some(self.run(commits))
    }
}
