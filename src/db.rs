use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};

use crate::{config::Config, error::AppResult};

const SQLITE_PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA foreign_keys=ON"];

pub async fn connect_and_migrate(config: &Config) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(config.database_url.clone());
    opts.max_connections(max_connections(config)).sqlx_logging(config.sql_logging);

    let db = Database::connect(opts).await?;
    tracing::debug!(backend = ?db.get_database_backend(), "connected to database");

    migrate(&db).await?;
    Ok(db)
}

/// SQLite allows one writer at a time and refuses to upgrade a deferred
/// transaction's read lock while another connection writes, so its pool is
/// a single connection and transactions queue on it.
fn max_connections(config: &Config) -> u32 {
    if config.database_url.starts_with("sqlite:") { 1 } else { config.db_max_connections.max(1) }
}

pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    if db.get_database_backend() == DatabaseBackend::Sqlite {
        for pragma in SQLITE_PRAGMAS {
            db.execute(Statement::from_string(DatabaseBackend::Sqlite, pragma.to_string())).await?;
        }
    }

    Migrator::up(db, None).await?;
    Ok(())
}

#[cfg(test)]
pub async fn memory() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.expect("in-memory sqlite");
    migrate(&db).await.expect("migrations apply");
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: &str) -> Config {
        Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: database_url.to_string(),
            db_max_connections: 5,
            sql_logging: false,
        }
    }

    #[test]
    fn sqlite_pool_has_a_single_writer() {
        assert_eq!(max_connections(&config("sqlite://moviedb.db?mode=rwc")), 1);
        assert_eq!(max_connections(&config("postgres://localhost/moviedb")), 5);
    }
}
