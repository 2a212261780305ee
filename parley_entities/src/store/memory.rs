use std::{collections::BTreeMap, sync::RwLock};

use async_trait::async_trait;
use itertools::Itertools;
use sea_orm::prelude::Uuid;

use crate::{domain::result::NegotiationResult, ResultError};

use super::{ResultFilter, ResultStore};


/// Store kept entirely in memory. Rows are keyed by id only, so historical duplicates
/// for the same (event, round, team) can exist side by side.
#[derive(Default)]
pub struct MemoryResultStore {
    results: RwLock<BTreeMap<Uuid, NegotiationResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<NegotiationResult>) -> Self {
        MemoryResultStore {
            results: RwLock::new(results.into_iter().map(|r| (r.uuid, r)).collect())
        }
    }

    fn matching(&self, filter: &ResultFilter) -> Vec<NegotiationResult> {
        let results = self.results.read().unwrap_or_else(|e| e.into_inner());
        results.values()
            .filter(|r| filter.matches(r))
            .sorted_by_key(|r| (r.round, r.team_id, r.uuid))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn query(&self, filter: &ResultFilter) -> Result<Vec<NegotiationResult>, ResultError> {
        Ok(self.matching(filter))
    }

    async fn query_page(&self, filter: &ResultFilter, offset: u64, limit: u64) -> Result<Vec<NegotiationResult>, ResultError> {
        Ok(self.matching(filter).into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn upsert(&self, result: &NegotiationResult) -> Result<Uuid, ResultError> {
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        results.insert(result.uuid, result.clone());
        Ok(result.uuid)
    }

    async fn delete(&self, uuid: Uuid) -> Result<(), ResultError> {
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        results.remove(&uuid);
        Ok(())
    }
}
