//! egresso: registration and survey service for alumni.
//!
//! Students look up their record, log in or complete their registration, and
//! answer the alumni questionnaire. Everything is served as JSON by actix-web
//! and stored in SQLite.
extern crate self as egresso;

#[macro_use]
mod http_res;

pub mod auth;
pub mod catalog;
pub mod config;
pub mod date;
pub mod error;
pub mod ids;
pub mod manage;
mod model;
pub mod phone;
pub mod questionnaire;
pub mod routes;
pub mod schema;
pub mod search;
pub mod students;

use auth::SessionStore;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

/// Shared by all handlers through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: Arc<dyn SessionStore>,
    /// Seconds a session stays valid after its last use.
    pub session_ttl: i64,
}

/// Opens the database and brings its schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let db = SqlitePoolOptions::new().connect(database_url).await?;
    sqlx::migrate!().run(&db).await?;
    Ok(db)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// A fresh in memory database. One connection only, every connection
    /// would get its own empty database otherwise.
    pub(crate) async fn migrate_example_db() -> SqlitePool {
        let con = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&con).await.unwrap();
        con
    }

    pub(crate) fn seed_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seed")
    }

    pub(crate) async fn seeded_db() -> SqlitePool {
        let db = migrate_example_db().await;
        manage::load_seed(&seed_dir(), &db).await.unwrap();
        db
    }

    pub(crate) async fn seeded_state() -> AppState {
        AppState {
            db: seeded_db().await,
            sessions: Arc::new(auth::MemorySessionStore::new()),
            session_ttl: 36000,
        }
    }

    #[actix_rt::test]
    async fn test_db_migration() {
        let _ = migrate_example_db().await;
    }
}
