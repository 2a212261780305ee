use std::net::SocketAddr;

use parley_entities::{prelude::*, Uuid};
use serde::Serialize;
use tracing::info;

use crate::{config::Config, state::AppState};


#[derive(clap::Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve,
    /// Write the ranked results of an event as CSV
    ExportResults {
        event_id: Uuid,
        path: String,
        #[arg(long)]
        round: Option<u32>,
    }
}

#[derive(Debug, Serialize)]
struct ResultRow {
    round: u32,
    team_id: Uuid,
    team: String,
    side: String,
    rank: Option<u32>,
    made_deal: Option<bool>,
    is_final: bool,
    disqualified: bool,
    pending: bool,
    agreement_score: Option<f64>,
    agreement_z_score: f64,
    process_and_relationship: Option<f64>,
    pr_z_score: f64,
    rel_score: Option<f64>,
    total_z_score: f64,
    no_enemy_svi: bool,
    agreement: String,
}

impl ResultRow {
    fn new(result: &EnrichedResult, event: &Event) -> Result<Self, anyhow::Error> {
        Ok(ResultRow {
            round: result.result.round,
            team_id: result.result.team_id,
            team: event.team_name(result.result.team_id).unwrap_or_default().to_string(),
            side: match result.side {
                Some(Side::A) => "a".into(),
                Some(Side::B) => "b".into(),
                None => "".into(),
            },
            rank: result.rank,
            made_deal: result.result.made_deal(),
            is_final: result.result.is_final(),
            disqualified: result.result.is_disqualified(),
            pending: result.result.pending,
            agreement_score: result.agreement_score,
            agreement_z_score: result.agreement_z_score,
            process_and_relationship: result.survey_scores.process_and_relationship,
            pr_z_score: result.pr_z_score,
            rel_score: result.rel_score,
            total_z_score: result.total_z_score,
            no_enemy_svi: result.no_enemy_svi,
            agreement: serde_json::to_string(&result.result.agreement)?,
        })
    }
}

impl Command {
    pub async fn run(&self, app_state: AppState, config: &Config) -> anyhow::Result<()> {
        match self {
            Command::Serve => {
                let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
                let app = crate::app_with_state(app_state).await;
                info!("Listening on {}", addr);
                axum::Server::bind(&addr)
                    .serve(app.into_make_service())
                    .await?;
            },
            Command::ExportResults { event_id, path, round } => {
                let event = app_state.events.get_event(*event_id).await?;
                let results = app_state.results.get_enriched_results_for_event(&event, *round).await?;

                let mut writer = csv::Writer::from_path(path)?;
                for result in results.iter() {
                    writer.serialize(ResultRow::new(result, &event)?)?;
                }
                writer.flush()?;
                info!("Exported {} results of event {} to {}", results.len(), event_id, path);
            }
        }
        Ok(())
    }
}
