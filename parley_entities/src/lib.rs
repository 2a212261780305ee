pub mod schema;
pub mod domain;
pub mod prelude;
pub mod error;
pub mod store;
pub mod services;
pub mod merge;
pub mod conflict;
pub mod finalize;
pub mod backfill;
pub mod tab;
pub mod mock;

pub use error::ResultError;
pub use sea_orm::prelude::Uuid;
