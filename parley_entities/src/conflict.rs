use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize};

use crate::domain::{event::Round, result::{Agreement, AgreementValue, NegotiationResult}};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Both sides recorded the parameter with different values.
    ValueMismatch,
    /// One side recorded a parameter the other side did not.
    MissingParameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementConflict {
    pub event_id: Uuid,
    pub round: u32,
    pub own_result: Uuid,
    pub own_team: Uuid,
    pub enemy_result: Uuid,
    pub enemy_team: Uuid,
    pub conflict_type: ConflictType,
    pub mismatched_parameters: Vec<String>,
    pub last_modified: NaiveDateTime,
}

fn values_agree(a: &AgreementValue, b: &AgreementValue) -> bool {
    match (a.cleaned(), b.cleaned()) {
        (AgreementValue::Number(a), AgreementValue::Number(b)) => a == b,
        (AgreementValue::Text(a), AgreementValue::Text(b)) => a == b,
        _ => false,
    }
}

/// Parameters on which two agreements differ, sorted by name.
///
/// A parameter recorded by only one side counts as a mismatch, so the result does not
/// depend on argument order.
pub fn mismatched_parameters(own: &Agreement, enemy: &Agreement) -> (Vec<String>, bool) {
    let keys = own.keys().chain(enemy.keys()).collect::<BTreeSet<_>>();
    let mut any_missing = false;
    let mismatched: Vec<String> = keys.into_iter().filter(|key| {
        match (own.get(*key), enemy.get(*key)) {
            (Some(a), Some(b)) => !values_agree(a, b),
            _ => {
                any_missing = true;
                true
            }
        }
    }).cloned().collect();
    (mismatched, any_missing)
}

pub fn detect(own: &NegotiationResult, enemy: &NegotiationResult, requires_match: bool) -> Option<AgreementConflict> {
    if !requires_match || own.agreement.is_empty() || enemy.agreement.is_empty() {
        return None;
    }

    let (mismatched, any_missing) = mismatched_parameters(&own.agreement, &enemy.agreement);
    if mismatched.is_empty() {
        return None;
    }

    Some(AgreementConflict {
        event_id: own.event_id,
        round: own.round,
        own_result: own.uuid,
        own_team: own.team_id,
        enemy_result: enemy.uuid,
        enemy_team: enemy.team_id,
        conflict_type: if any_missing { ConflictType::MissingParameter } else { ConflictType::ValueMismatch },
        mismatched_parameters: mismatched,
        last_modified: own.last_modified.max(enemy.last_modified),
    })
}

/// Conflicts of every match in a round, reported once from each side's perspective.
pub fn detect_in_round(results: &[NegotiationResult], round: &Round, requires_match: bool) -> Vec<AgreementConflict> {
    let find = |team: Uuid| results.iter().find(|r| r.round == round.index && r.team_id == team);

    round.matches.iter().filter_map(|m| {
        let a = find(m.side_a.team()?)?;
        let b = find(m.side_b.team()?)?;
        Some([detect(a, b, requires_match), detect(b, a, requires_match)])
    }).flatten().flatten().collect()
}
