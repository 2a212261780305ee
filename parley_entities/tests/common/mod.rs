use migration::MigratorTrait;
use parley_entities::{mock, prelude::*, store::SqlResultStore};
use sea_orm::{prelude::*, Database, Statement};

pub async fn set_up_db(with_mock_env: bool) -> Result<DatabaseConnection, anyhow::Error> {
    let db = Database::connect("sqlite::memory:").await?;
    migration::Migrator::up(&db, None).await.unwrap();
    let _r = db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON;",
        vec![])
    ).await?;

    if with_mock_env {
        let mock = mock::make_mock_event_with_options(mock::MockOption { deterministic_uuids: true, ..Default::default() });
        let store = SqlResultStore::new(db.clone());
        for result in mock.results.iter() {
            store.upsert(result).await?;
        }
    }
    Ok(db)
}
