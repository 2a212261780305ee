use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::domain::{event::Event, result::{NegotiationResult, ResultKey, ResultState}};


/// Adds placeholder records for teams that were drawn into a round but never submitted.
///
/// Placeholders of closed rounds are disqualified. Before the round closes they are only
/// marked pending, and a pending record is re-checked against the end time on every call.
pub fn backfill(existing: Vec<NegotiationResult>, event: &Event, rounds: &[u32], now: NaiveDateTime) -> Vec<NegotiationResult> {
    let mut results = existing;

    for result in results.iter_mut().filter(|r| r.pending && r.event_id == event.uuid) {
        if let Some(round) = event.round(result.round) {
            if round.has_ended(now) {
                result.pending = false;
                result.state = result.state.disqualify();
            }
        }
    }

    let submitted = results.iter().map(|r| (r.round, r.team_id)).collect::<HashSet<_>>();

    let mut synthetic = vec![];
    for round_index in rounds {
        let round = match event.round(*round_index) {
            Some(round) => round,
            None => continue,
        };
        let ended = round.has_ended(now);

        for (team_id, _) in round.active_teams() {
            if submitted.contains(&(round.index, team_id)) {
                continue;
            }
            let mut placeholder = NegotiationResult::new(
                ResultKey::new(event.uuid, round.index, team_id),
                round.case_id,
                now,
            );
            if ended {
                placeholder.state = ResultState::Disqualified;
            }
            else {
                placeholder.state = ResultState::Final { made_deal: Some(false) };
                placeholder.pending = true;
            }
            synthetic.push(placeholder);
        }
    }

    results.extend(synthetic);
    results
}
