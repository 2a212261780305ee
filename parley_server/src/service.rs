use std::{collections::{HashMap, HashSet}, sync::Arc};

use itertools::Itertools;
use parley_entities::{
    backfill,
    conflict,
    finalize::FinalizeCommand,
    merge::{self, MergeContext},
    prelude::*,
    tab::{self, ParameterRange},
    ResultError,
    Uuid,
};
use serde::{Serialize, Deserialize};
use tokio::sync::{broadcast::error::RecvError, watch, Mutex};
use tracing::{debug, info, warn};

use crate::notify::{ResultNotificationManager, ResultSubscription, ResultUpdate};


/// Agreements recorded for a case, with the numeric range of each parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRange {
    pub agreements: Vec<Agreement>,
    pub parameters: std::collections::BTreeMap<String, ParameterRange>,
}

/// The exposed result operations, wired to their collaborators.
#[derive(Clone)]
pub struct ResultService {
    store: Arc<dyn ResultStore>,
    events: Arc<dyn EventProvider>,
    cases: Arc<dyn CaseProvider>,
    evaluator: Arc<dyn ScoreEvaluator>,
    proficiency: Arc<dyn ProficiencyService>,
    notifications: Arc<ResultNotificationManager>,
    write_lock: Arc<Mutex<()>>,
    page_size: u64,
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

impl ResultService {
    pub fn new(
        store: Arc<dyn ResultStore>,
        events: Arc<dyn EventProvider>,
        cases: Arc<dyn CaseProvider>,
        evaluator: Arc<dyn ScoreEvaluator>,
        proficiency: Arc<dyn ProficiencyService>,
        notifications: Arc<ResultNotificationManager>,
        page_size: u64,
    ) -> Self {
        ResultService {
            store,
            events,
            cases,
            evaluator,
            proficiency,
            notifications,
            write_lock: Arc::new(Mutex::new(())),
            page_size,
        }
    }

    /// Merges a (partial) submission into the team's record for the round and returns its id.
    ///
    /// `participant_or_team` may name a team, a team member or a participant playing alone.
    pub async fn save_result(&self, submission: Submission, event_id: Uuid, participant_or_team: Uuid, overwrite: bool) -> Result<Uuid, ResultError> {
        let event = self.events.get_event(event_id).await?;
        let team_id = event.resolve_team(participant_or_team).ok_or(ResultError::UnknownTeam(participant_or_team))?;
        let round = event.round(submission.round).ok_or(ResultError::RoundNotFound { event_id, round: submission.round })?;
        let participant = if event.teams.iter().any(|t| t.uuid == participant_or_team) { None } else { Some(participant_or_team) };

        let merged = {
            let _guard = self.write_lock.lock().await;
            self.merge_and_store(&submission, event_id, round, team_id, participant, overwrite).await?
        };

        self.announce(&merged).await;
        Ok(merged.uuid)
    }

    /// Callers must hold `write_lock`.
    async fn merge_and_store(&self, submission: &Submission, event_id: Uuid, round: &Round, team_id: Uuid, participant: Option<Uuid>, overwrite: bool) -> Result<NegotiationResult, ResultError> {
        let key = ResultKey::new(event_id, round.index, team_id);
        let now = now();
        let ctx = MergeContext { now, round_ended: round.has_ended(now), overwrite };

        let existing = self.store.query(&ResultFilter::for_team(event_id, round.index, team_id)).await?;
        let merged = merge::merge_or_create(merge::pick_canonical(&existing), submission, key, round.case_id, participant, &ctx);
        self.store.upsert(&merged).await?;

        let stale = existing.iter().map(|r| r.uuid).filter(|uuid| *uuid != merged.uuid).collect_vec();
        for uuid in stale {
            info!("Removing duplicate result {} for team {} in round {}", uuid, team_id, round.index);
            self.store.delete(uuid).await?;
        }

        info!("Saved result {} for team {} in round {} of event {}", merged.uuid, team_id, round.index, event_id);
        Ok(merged)
    }

    async fn announce(&self, result: &NegotiationResult) {
        self.notifications.publish(ResultUpdate {
            event_id: result.event_id,
            round: result.round,
            team_id: result.team_id,
            result_id: result.uuid,
        }).await;

        if result.is_final() {
            for participant_id in result.participants.iter().cloned() {
                let proficiency = self.proficiency.clone();
                tokio::spawn(async move {
                    if let Err(e) = proficiency.recalculate(participant_id).await {
                        warn!("Failed to recalculate proficiency for {}: {}", participant_id, e);
                    }
                });
            }
        }
    }

    /// Ranked results of an event, or of one round, with no-shows filled in.
    pub async fn get_enriched_results(&self, event_id: Uuid, round: Option<u32>) -> Result<Vec<EnrichedResult>, ResultError> {
        let event = self.events.get_event(event_id).await?;
        self.get_enriched_results_for_event(&event, round).await
    }

    pub async fn get_enriched_results_for_event(&self, event: &Event, round: Option<u32>) -> Result<Vec<EnrichedResult>, ResultError> {
        let rounds = match round {
            Some(round) => {
                event.round(round).ok_or(ResultError::RoundNotFound { event_id: event.uuid, round })?;
                vec![round]
            },
            None => event.round_indices(),
        };

        let filter = ResultFilter::for_event(event.uuid).with_round(round);
        let stored = self.store.query_all_paged(&filter, self.page_size).await?;
        let results = backfill::backfill(merge::collapse_duplicates(stored), event, &rounds, now());

        let case_ids = results.iter().map(|r| r.case_id).unique().collect_vec();
        let mut cases = HashMap::new();
        for case_id in case_ids {
            cases.insert(case_id, self.cases.get_case(case_id).await?);
        }

        tab::rank_results(results, event, &cases, self.evaluator.as_ref())
    }

    pub async fn get_result_min_max_range(&self, case_id: Uuid) -> Result<ResultRange, ResultError> {
        self.cases.get_case(case_id).await?;

        let filter = ResultFilter { case_id: Some(case_id), only_with_agreement: true, ..Default::default() };
        let agreements = self.store.query_all_paged(&filter, self.page_size).await?
            .into_iter()
            .filter(|r| !r.is_disqualified())
            .map(|r| r.agreement)
            .collect_vec();

        Ok(ResultRange {
            parameters: tab::stats::parameter_ranges(agreements.iter()),
            agreements,
        })
    }

    /// The conflict between a team's agreement and its opponent's, if any.
    pub async fn check_conflict(&self, event_id: Uuid, round: u32, team_id: Uuid) -> Result<Option<AgreementConflict>, ResultError> {
        let event = self.events.get_event(event_id).await?;
        let round = event.round(round).ok_or(ResultError::RoundNotFound { event_id, round })?;
        let position = round.position_of(team_id).ok_or(ResultError::UnknownTeam(team_id))?;
        let opponent_id = match position.opponent.team() {
            Some(opponent_id) => opponent_id,
            None => return Ok(None),
        };
        let case = self.cases.get_case(round.case_id).await?;

        let own = self.load_canonical(event_id, round.index, team_id).await?;
        let opponent = self.load_canonical(event_id, round.index, opponent_id).await?;

        Ok(match (own, opponent) {
            (Some(own), Some(opponent)) => conflict::detect(&own, &opponent, case.agree_match),
            _ => None,
        })
    }

    /// Marks the agreements of both teams named by the command as final.
    ///
    /// Every watcher of a match issues its own command, so records that are already final
    /// are left alone. Returns whether anything was written.
    pub async fn finalize(&self, command: &FinalizeCommand) -> Result<bool, ResultError> {
        let event = self.events.get_event(command.event_id).await?;
        let round = event.round(command.round).ok_or(ResultError::RoundNotFound { event_id: command.event_id, round: command.round })?;
        let submission = Submission {
            is_final: Patch::Value(true),
            ..Submission::for_round(round.index)
        };

        let written = {
            let _guard = self.write_lock.lock().await;
            let mut written = vec![];
            for team_id in [command.team_id, command.opponent_id] {
                let current = self.load_canonical(command.event_id, round.index, team_id).await?;
                if current.map(|r| r.is_final()).unwrap_or(false) {
                    continue;
                }
                written.push(self.merge_and_store(&submission, command.event_id, round, team_id, None, true).await?);
            }
            written
        };

        if written.is_empty() {
            debug!("Round {} of event {} was already final for teams {} and {}", command.round, command.event_id, command.team_id, command.opponent_id);
            return Ok(false);
        }
        for result in written.iter() {
            self.announce(result).await;
        }
        info!("Finalized round {} of event {} for teams {} and {}", command.round, command.event_id, command.team_id, command.opponent_id);
        Ok(true)
    }

    async fn load_canonical(&self, event_id: Uuid, round: u32, team_id: Uuid) -> Result<Option<NegotiationResult>, ResultError> {
        let rows = self.store.query(&ResultFilter::for_team(event_id, round, team_id)).await?;
        Ok(merge::pick_canonical(&rows).cloned())
    }

    async fn live_snapshot(&self, event_id: Uuid, round: u32, own_id: Uuid, opponent_ids: &[Uuid], agree_match: bool) -> Result<(Vec<NegotiationResult>, Vec<AgreementConflict>), ResultError> {
        let stored = self.store.query(&ResultFilter::for_event(event_id).with_round(Some(round))).await?;
        let agreements = merge::collapse_duplicates(stored)
            .into_iter()
            .filter(|r| r.team_id == own_id || opponent_ids.contains(&r.team_id))
            .collect_vec();

        let own = agreements.iter().find(|r| r.team_id == own_id);
        let conflicts = match own {
            Some(own) => agreements.iter()
                .filter(|r| r.team_id != own_id)
                .flat_map(|opponent| [conflict::detect(own, opponent, agree_match), conflict::detect(opponent, own, agree_match)])
                .flatten()
                .collect_vec(),
            None => vec![],
        };

        Ok((agreements, conflicts))
    }

    /// Keeps a live view of `own_id`'s and its opponents' results for a round.
    ///
    /// The first snapshot is loaded before this returns; later ones follow every write to the round.
    pub async fn subscribe(&self, own_id: Uuid, opponent_ids: Vec<Uuid>, event_id: Uuid, round: u32) -> Result<ResultSubscription, ResultError> {
        let event = self.events.get_event(event_id).await?;
        let round = event.round(round).ok_or(ResultError::RoundNotFound { event_id, round })?.clone();
        let case = self.cases.get_case(round.case_id).await?;

        let mut updates = self.notifications.subscribe_to_round(event_id, round.index).await;
        let (agreements, conflicts) = self.live_snapshot(event_id, round.index, own_id, &opponent_ids, case.agree_match).await?;
        let (agreements_tx, agreements_rx) = watch::channel(agreements);
        let (conflicts_tx, conflicts_rx) = watch::channel(conflicts);

        let watched = opponent_ids.iter().cloned().chain([own_id]).collect::<HashSet<_>>();
        let service = self.clone();
        let pump = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(update) if !watched.contains(&update.team_id) => continue,
                    Ok(_) => {},
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Live subscription for team {} skipped {} updates", own_id, skipped);
                    },
                    Err(RecvError::Closed) => break,
                }

                match service.live_snapshot(event_id, round.index, own_id, &opponent_ids, case.agree_match).await {
                    Ok((agreements, conflicts)) => {
                        conflicts_tx.send_if_modified(|current| replace_if_changed(current, conflicts));
                        agreements_tx.send_if_modified(|current| replace_if_changed(current, agreements));
                    },
                    Err(e) => {
                        warn!("Failed to refresh live results for team {}: {}", own_id, e);
                    }
                }
            }
        });

        Ok(ResultSubscription::new(agreements_rx, conflicts_rx, pump))
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, new: T) -> bool {
    if *current == new {
        false
    }
    else {
        *current = new;
        true
    }
}
