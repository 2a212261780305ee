use axum::{extract::{Path, Query, State}, Json, Router, routing::{get, post}};
use parley_entities::{prelude::*, Uuid};
use serde::{Serialize, Deserialize};

use crate::{response::APIError, service::{ResultRange, ResultService}, state::AppState};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResultRequest {
    /// A team, a team member or a participant playing alone
    pub participant_id: Uuid,
    #[serde(default)]
    pub overwrite: bool,
    pub result: Submission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResultResponse {
    pub result_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsQuery {
    pub round: Option<u32>,
}

pub async fn save_result_handler(
    State(service): State<ResultService>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<SaveResultRequest>,
) -> Result<Json<SaveResultResponse>, APIError> {
    let result_id = service.save_result(request.result, event_id, request.participant_id, request.overwrite).await?;
    Ok(Json(SaveResultResponse { result_id }))
}

pub async fn get_enriched_results_handler(
    State(service): State<ResultService>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<EnrichedResult>>, APIError> {
    Ok(Json(service.get_enriched_results(event_id, query.round).await?))
}

pub async fn get_result_range_handler(
    State(service): State<ResultService>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<ResultRange>, APIError> {
    Ok(Json(service.get_result_min_max_range(case_id).await?))
}

pub async fn check_conflict_handler(
    State(service): State<ResultService>,
    Path((event_id, round, team_id)): Path<(Uuid, u32, Uuid)>,
) -> Result<Json<Option<AgreementConflict>>, APIError> {
    Ok(Json(service.check_conflict(event_id, round, team_id).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/:event_id/results", post(save_result_handler).get(get_enriched_results_handler))
        .route("/events/:event_id/rounds/:round/teams/:team_id/conflict", get(check_conflict_handler))
        .route("/cases/:case_id/results/range", get(get_result_range_handler))
}
