use async_trait::async_trait;
use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize};

use crate::domain::{case::{Case, ScoreFormula}, event::Event, result::Agreement};
use crate::ResultError;


#[async_trait]
pub trait EventProvider: Send + Sync {
    async fn get_event(&self, event_id: Uuid) -> Result<Event, ResultError>;
}

#[async_trait]
pub trait CaseProvider: Send + Sync {
    async fn get_case(&self, case_id: Uuid) -> Result<Case, ResultError>;
}

/// Maps an agreement onto the numeric score of one side's formula.
pub trait ScoreEvaluator: Send + Sync {
    fn evaluate(&self, formula: &ScoreFormula, agreement: &Agreement) -> f64;
}

/// Aggregates per-participant skill estimates over their final results.
#[async_trait]
pub trait ProficiencyService: Send + Sync {
    async fn recalculate(&self, participant_id: Uuid) -> Result<(), anyhow::Error>;
}

/// Events and cases held in memory, e.g. read from a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub cases: Vec<Case>,
}

impl StaticCatalog {
    pub fn new(events: Vec<Event>, cases: Vec<Case>) -> Self {
        StaticCatalog { events, cases }
    }
}

#[async_trait]
impl EventProvider for StaticCatalog {
    async fn get_event(&self, event_id: Uuid) -> Result<Event, ResultError> {
        self.events.iter().find(|e| e.uuid == event_id).cloned().ok_or(ResultError::EventNotFound(event_id))
    }
}

#[async_trait]
impl CaseProvider for StaticCatalog {
    async fn get_case(&self, case_id: Uuid) -> Result<Case, ResultError> {
        self.cases.iter().find(|c| c.uuid == case_id).cloned().ok_or(ResultError::CaseNotFound(case_id))
    }
}
