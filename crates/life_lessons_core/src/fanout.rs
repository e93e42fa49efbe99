//! crates/life_lessons_core/src/fanout.rs
//!
//! A fan-out-and-join primitive for best-effort batch mutations.
//!
//! Every per-item mutation is dispatched at once and the batch completes when
//! all of them have settled. Nothing is rolled back: the caller receives one
//! outcome per item and decides what a partial failure means for it.

use futures::future::join_all;
use std::future::Future;

use crate::ports::{PortError, PortResult};

/// The settled result of one mutation within a batch.
#[derive(Debug)]
pub struct ItemOutcome<K> {
    pub key: K,
    pub result: PortResult<()>,
}

/// Per-item results of a batch, in the order the keys were supplied.
#[derive(Debug)]
pub struct BatchReport<K> {
    pub outcomes: Vec<ItemOutcome<K>>,
}

impl<K> BatchReport<K> {
    pub fn succeeded(&self) -> impl Iterator<Item = &K> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .map(|outcome| &outcome.key)
    }

    pub fn failed(&self) -> impl Iterator<Item = (&K, &PortError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|e| (&outcome.key, e)))
    }

    /// True when at least one dispatched mutation did not succeed.
    pub fn is_partial_failure(&self) -> bool {
        self.outcomes.iter().any(|outcome| outcome.result.is_err())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Runs `op` for every key concurrently and joins on all of them.
pub async fn fan_out<K, F, Fut>(keys: impl IntoIterator<Item = K>, op: F) -> BatchReport<K>
where
    K: Clone,
    F: Fn(K) -> Fut,
    Fut: Future<Output = PortResult<()>>,
{
    let pending = keys.into_iter().map(|key| {
        let mutation = op(key.clone());
        async move {
            ItemOutcome {
                key,
                result: mutation.await,
            }
        }
    });

    BatchReport {
        outcomes: join_all(pending).await,
    }
}
