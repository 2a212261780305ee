use std::{path::Path, sync::Arc};

use axum::extract::FromRef;
use parley_entities::{prelude::*, services::StaticCatalog, store::SqlResultStore};
use sea_orm::DatabaseConnection;

use crate::{
    catalog,
    config::Config,
    db::{self, DatabaseConfig},
    notify::ResultNotificationManager,
    proficiency::LoggingProficiencyService,
    scoring::LinearScoreEvaluator,
    service::ResultService,
};


#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub events: Arc<dyn EventProvider>,
    pub cases: Arc<dyn CaseProvider>,
    pub results: ResultService,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<AppState, anyhow::Error> {
        let db = db::set_up_db(DatabaseConfig::new(config.db_url.clone())).await?;
        let catalog = catalog::read_catalog_or_empty(Path::new(&config.catalog_path))?;
        Ok(Self::new_with_db(db, catalog, config))
    }

    pub fn new_with_db(db: DatabaseConnection, catalog: StaticCatalog, config: &Config) -> AppState {
        let catalog = Arc::new(catalog);
        let events: Arc<dyn EventProvider> = catalog.clone();
        let cases: Arc<dyn CaseProvider> = catalog;

        let results = ResultService::new(
            Arc::new(SqlResultStore::new(db.clone())),
            events.clone(),
            cases.clone(),
            Arc::new(LinearScoreEvaluator),
            Arc::new(LoggingProficiencyService),
            Arc::new(ResultNotificationManager::new(config.live_channel_capacity)),
            config.page_size,
        );

        AppState {
            db,
            events,
            cases,
            results,
        }
    }

    pub async fn new_test_app(catalog: StaticCatalog) -> AppState {
        let db = db::set_up_db(
            DatabaseConfig::new(
                "sqlite::memory:".into(),
            )
        ).await.expect("Failed to set up database");
        Self::new_with_db(db, catalog, &Config::default())
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(app_state: &AppState) -> DatabaseConnection {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for ResultService {
    fn from_ref(app_state: &AppState) -> ResultService {
        app_state.results.clone()
    }
}

impl FromRef<AppState> for Arc<dyn EventProvider> {
    fn from_ref(app_state: &AppState) -> Arc<dyn EventProvider> {
        app_state.events.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CaseProvider> {
    fn from_ref(app_state: &AppState) -> Arc<dyn CaseProvider> {
        app_state.cases.clone()
    }
}
