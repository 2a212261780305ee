use std::{str::FromStr, time::Duration};

use axum::{extract::{Query, Path, State}, response::{Sse, sse::{Event, KeepAlive}}, Router, routing::get};
use hyper::StatusCode;
use itertools::Itertools;
use parley_entities::{finalize::FinalizationCoordinator, prelude::*, ResultError, Uuid};
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::{notify::ResultSubscription, response::APIError, service::ResultService, state::AppState, watcher::FinalizationWatcher};


#[derive(Debug, Clone, Deserialize)]
pub struct LiveQuery {
    pub own: Uuid,
    pub round: u32,
    /// Comma separated team ids. Defaults to the opponent drawn against `own`.
    #[serde(default)]
    pub opponents: Option<String>,
}

fn parse_opponents(opponents: &str) -> Result<Vec<Uuid>, APIError> {
    opponents.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| Uuid::from_str(s).map_err(|_| APIError::new_with_status(StatusCode::BAD_REQUEST, format!("Invalid team id {}", s))))
        .collect()
}

/// Keeps the subscription and its watcher alive for as long as the client is connected.
struct LiveGuard {
    _subscription: ResultSubscription,
    _watcher: Option<FinalizationWatcher>,
}

pub async fn get_live_results(
    State(service): State<ResultService>,
    State(events): State<std::sync::Arc<dyn EventProvider>>,
    State(cases): State<std::sync::Arc<dyn CaseProvider>>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<LiveQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, serde_json::Error>>>, APIError> {
    let event = events.get_event(event_id).await?;
    let round = event.round(query.round).ok_or(ResultError::RoundNotFound { event_id, round: query.round })?;
    let position = round.position_of(query.own).ok_or(ResultError::UnknownTeam(query.own))?;
    let case = cases.get_case(round.case_id).await?;

    let opponents = match &query.opponents {
        Some(opponents) => parse_opponents(opponents)?,
        None => position.opponent.team().into_iter().collect_vec(),
    };

    let subscription = service.subscribe(query.own, opponents, event_id, round.index).await?;

    let watcher = position.opponent.team().map(|opponent_id| {
        let coordinator = FinalizationCoordinator::new(event_id, round.index, query.own, opponent_id, case.agree_match);
        FinalizationWatcher::spawn(service.clone(), &subscription, coordinator, query.own, opponent_id)
    });
    info!("Live subscription for team {} in round {} of event {}", query.own, round.index, event_id);

    let agreements = subscription.on_agreements().map(|a| Event::default().event("agreements").json_data(a));
    let conflicts = subscription.on_conflicts().map(|c| Event::default().event("conflicts").json_data(c));

    let guard = LiveGuard { _subscription: subscription, _watcher: watcher };
    let stream = agreements.merge(conflicts).map(move |e| {
        //The guard lives as long as the stream
        let _guard = &guard;
        e
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive-text"),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/:event_id/live", get(get_live_results))
}
