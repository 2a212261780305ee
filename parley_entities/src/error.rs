use sea_orm::{prelude::Uuid, DbErr};
use thiserror::Error;


#[derive(Debug, Error)]
pub enum ResultError {
    #[error("Event {0} not found")]
    EventNotFound(Uuid),
    #[error("Case {0} not found")]
    CaseNotFound(Uuid),
    #[error("Round {round} does not exist in event {event_id}")]
    RoundNotFound { event_id: Uuid, round: u32 },
    #[error("{0} is neither a team nor a participant of the event")]
    UnknownTeam(Uuid),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ResultError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResultError::EventNotFound(_) | ResultError::CaseNotFound(_) | ResultError::RoundNotFound { .. } | ResultError::UnknownTeam(_)
        )
    }
}
