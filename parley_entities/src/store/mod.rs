use async_trait::async_trait;
use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize};

use crate::{domain::result::NegotiationResult, ResultError};

mod sql;
mod memory;

pub use sql::SqlResultStore;
pub use memory::MemoryResultStore;


#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFilter {
    pub event_id: Option<Uuid>,
    pub round: Option<u32>,
    pub team_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    #[serde(default)]
    pub only_with_agreement: bool,
}

impl ResultFilter {
    pub fn for_event(event_id: Uuid) -> Self {
        ResultFilter { event_id: Some(event_id), ..Default::default() }
    }

    pub fn for_team(event_id: Uuid, round: u32, team_id: Uuid) -> Self {
        ResultFilter { event_id: Some(event_id), round: Some(round), team_id: Some(team_id), ..Default::default() }
    }

    pub fn with_round(self, round: Option<u32>) -> Self {
        ResultFilter { round, ..self }
    }

    pub fn matches(&self, result: &NegotiationResult) -> bool {
        self.event_id.map(|e| e == result.event_id).unwrap_or(true)
            && self.round.map(|r| r == result.round).unwrap_or(true)
            && self.team_id.map(|t| t == result.team_id).unwrap_or(true)
            && self.case_id.map(|c| c == result.case_id).unwrap_or(true)
            && (!self.only_with_agreement || !result.agreement.is_empty())
    }
}

/// Document collection of result records.
///
/// Implementations resolve concurrent writes to the same id as last-writer-wins;
/// results are returned ordered by round, team and id.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn query(&self, filter: &ResultFilter) -> Result<Vec<NegotiationResult>, ResultError>;

    async fn query_page(&self, filter: &ResultFilter, offset: u64, limit: u64) -> Result<Vec<NegotiationResult>, ResultError>;

    async fn upsert(&self, result: &NegotiationResult) -> Result<Uuid, ResultError>;

    async fn delete(&self, uuid: Uuid) -> Result<(), ResultError>;

    /// Reads every matching result, one page at a time.
    async fn query_all_paged(&self, filter: &ResultFilter, page_size: u64) -> Result<Vec<NegotiationResult>, ResultError> {
        let page_size = page_size.max(1);
        let mut out = vec![];
        let mut offset = 0;
        loop {
            let page = self.query_page(filter, offset, page_size).await?;
            let page_len = page.len() as u64;
            out.extend(page);
            if page_len < page_size {
                break;
            }
            offset += page_size;
        }
        Ok(out)
    }
}
