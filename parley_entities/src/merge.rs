use std::{cmp::{Ordering, Reverse}, collections::BTreeMap};

use chrono::NaiveDateTime;
use sea_orm::prelude::Uuid;

use crate::domain::result::{clean_values, Agreement, NegotiationResult, Patch, ResultKey, ResultState, Submission, Survey};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeContext {
    pub now: NaiveDateTime,
    pub round_ended: bool,
    /// Administrative corrections bypass the closed-round lock.
    pub overwrite: bool,
}

impl MergeContext {
    fn is_locked(&self) -> bool {
        self.round_ended && !self.overwrite
    }
}

/// Folds one submission into the stored record for the same (event, round, team).
///
/// Explicit nulls keep the stored agreement and survey unless the submission says
/// `made_deal = false`, which clears the agreement. Once the round has closed, a regular
/// submission can only touch the `final` flag, and a team without a stored record is
/// recorded as disqualified. Overwrites lift a disqualification.
pub fn merge_or_create(
    existing: Option<&NegotiationResult>,
    incoming: &Submission,
    key: ResultKey,
    case_id: Uuid,
    participant: Option<Uuid>,
    ctx: &MergeContext,
) -> NegotiationResult {
    let mut merged = match existing {
        Some(existing) => existing.clone(),
        None => {
            let mut created = NegotiationResult::new(key, case_id, ctx.now);
            // Nothing was recorded before the round closed, so the team stays a no-show.
            if ctx.is_locked() {
                created.state = ResultState::Disqualified;
            }
            created
        }
    };
    merged.uuid = key.result_id();
    merged.event_id = key.event_id;
    merged.round = key.round;
    merged.team_id = key.team_id;
    merged.last_modified = ctx.now;
    merged.pending = false;
    if let Some(participant) = participant {
        merged.participants.insert(participant);
    }

    if ctx.overwrite && merged.is_disqualified() {
        merged.state = ResultState::Open;
    }

    if !ctx.is_locked() {
        let declares_no_deal = incoming.made_deal == Patch::Value(false);

        merged.agreement = match (&incoming.agreement, declares_no_deal) {
            (_, true) => Agreement::new(),
            (Patch::Value(raw), false) => clean_values(raw),
            (_, false) => merged.agreement,
        };

        merged.survey = match (&incoming.survey, declares_no_deal) {
            (Patch::Value(raw), _) => Survey::from_raw(raw),
            (_, true) => Survey::default(),
            (_, false) => merged.survey,
        };

        if let Patch::Value(comment) = &incoming.comment {
            merged.comment = Some(comment.clone());
        }

        merged.state = merged.state.apply_made_deal(incoming.made_deal.copied());
    }

    merged.state = merged.state.apply_final(incoming.is_final.copied());

    merged
}

/// Orders rows so the most complete one compares greatest.
pub fn canonical_order(a: &NegotiationResult, b: &NegotiationResult) -> Ordering {
    completeness_key(a).cmp(&completeness_key(b))
}

fn completeness_key(result: &NegotiationResult) -> (bool, usize, bool, usize, NaiveDateTime, Reverse<Uuid>) {
    (
        result.is_final(),
        result.survey.answered(),
        result.made_deal() == Some(true),
        result.agreement.len(),
        result.last_modified,
        Reverse(result.uuid),
    )
}

/// Picks the row that survives de-duplication among rows sharing one (event, round, team).
pub fn pick_canonical(candidates: &[NegotiationResult]) -> Option<&NegotiationResult> {
    candidates.iter().max_by(|a, b| canonical_order(a, b))
}

/// Keeps only the canonical row for every (event, round, team), ordered by that key.
pub fn collapse_duplicates(results: Vec<NegotiationResult>) -> Vec<NegotiationResult> {
    let mut by_key: BTreeMap<ResultKey, Vec<NegotiationResult>> = BTreeMap::new();
    for result in results {
        by_key.entry(result.key()).or_default().push(result);
    }
    by_key.into_values().filter_map(|rows| {
        let canonical = pick_canonical(&rows)?.uuid;
        rows.into_iter().find(|r| r.uuid == canonical)
    }).collect()
}
