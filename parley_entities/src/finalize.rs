use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize};

use crate::{conflict::{self, AgreementConflict}, domain::result::NegotiationResult};


/// Snapshots delivered by the live result and conflict streams, plus the outcome of
/// a previously issued finalize command.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizationEvent {
    AgreementsUpdated {
        own: Option<NegotiationResult>,
        opponent: Option<NegotiationResult>,
    },
    ConflictsUpdated(Vec<AgreementConflict>),
    FinalizeCompleted { success: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeCommand {
    pub event_id: Uuid,
    pub round: u32,
    pub team_id: Uuid,
    pub opponent_id: Uuid,
}

/// Decides when one team's agreement for a round can be declared final.
///
/// Events may arrive in any order and repeatedly. A command is emitted only when the
/// snapshot state becomes ready while no finalize call is running, and never again after
/// one has succeeded.
#[derive(Debug, Clone)]
pub struct FinalizationCoordinator {
    event_id: Uuid,
    round: u32,
    team_id: Uuid,
    opponent_id: Uuid,
    agreements_must_match: bool,
    own: Option<NegotiationResult>,
    opponent: Option<NegotiationResult>,
    conflicts: Vec<AgreementConflict>,
    in_flight: bool,
    finalized: bool,
}

impl FinalizationCoordinator {
    pub fn new(event_id: Uuid, round: u32, team_id: Uuid, opponent_id: Uuid, agreements_must_match: bool) -> Self {
        FinalizationCoordinator {
            event_id,
            round,
            team_id,
            opponent_id,
            agreements_must_match,
            own: None,
            opponent: None,
            conflicts: vec![],
            in_flight: false,
            finalized: false,
        }
    }

    pub fn handle(&mut self, event: FinalizationEvent) -> Option<FinalizeCommand> {
        match event {
            FinalizationEvent::AgreementsUpdated { own, opponent } => {
                self.own = own;
                self.opponent = opponent;
            },
            FinalizationEvent::ConflictsUpdated(conflicts) => {
                self.conflicts = conflicts.into_iter().filter(|c| c.round == self.round && (c.own_team == self.team_id || c.enemy_team == self.team_id)).collect();
            },
            FinalizationEvent::FinalizeCompleted { success } => {
                self.in_flight = false;
                if success {
                    self.finalized = true;
                }
                // A failed attempt is retried on the next snapshot, not right away.
                return None;
            }
        }

        if self.is_ready() {
            self.in_flight = true;
            Some(FinalizeCommand {
                event_id: self.event_id,
                round: self.round,
                team_id: self.team_id,
                opponent_id: self.opponent_id,
            })
        }
        else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        if self.finalized || self.in_flight || !self.conflicts.is_empty() {
            return false;
        }
        let (own, opponent) = match (&self.own, &self.opponent) {
            (Some(own), Some(opponent)) => (own, opponent),
            _ => return false,
        };

        !own.agreement.is_empty()
            && !opponent.agreement.is_empty()
            && !own.is_final()
            && !opponent.is_final()
            && own.made_deal() != Some(false)
            && conflict::detect(own, opponent, self.agreements_must_match).is_none()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
