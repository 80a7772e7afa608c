use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Handle to the booking database. Cheap to clone; every request opens its
/// own connection and drops it when the request is done.
#[derive(Clone, Debug)]
pub struct Database {
    url: String,
}

impl Database {
    pub fn new(url: impl Into<String>) -> Database {
        Database { url: url.into() }
    }

    pub fn connect(&self) -> Result<SqliteConnection> {
        let mut conn = SqliteConnection::establish(&self.url)?;
        conn.batch_execute("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    pub fn migrate(&self) -> Result<()> {
        let mut conn = self.connect()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| Error::Migration(err.to_string()))?;
        info!(database = %self.url, applied = applied.len(), "database schema is up to date");
        Ok(())
    }

    /// Runs read-only work on a fresh connection.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }

    /// Runs `f` inside a transaction: committed when `f` returns `Ok`, rolled
    /// back on any `Err`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.connect()?;
        let result = conn.transaction(f);
        if result.is_err() {
            debug!("transaction rolled back");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::models::venue::Venue;

    #[test]
    fn failed_transaction_rolls_back() {
        let (_dir, db) = fixtures::database();

        let result: Result<()> = db.transaction(|conn| {
            fixtures::venue_record("Rolled Back Room").insert(conn)?;
            Err(Error::Server("boom".to_owned()))
        });
        assert!(result.is_err());

        let recent = db.read(|conn| Venue::recent(conn, 10)).unwrap();
        assert!(recent.is_empty());
    }

    #[test]
    fn successful_transaction_commits() {
        let (_dir, db) = fixtures::database();

        let id = db
            .transaction(|conn| fixtures::venue_record("Kept Room").insert(conn))
            .unwrap();

        let venue = db.read(|conn| Venue::find(conn, id)).unwrap();
        assert_eq!(venue.name, "Kept Room");
    }

    #[test]
    fn migrations_are_idempotent() {
        let (_dir, db) = fixtures::database();
        db.migrate().unwrap();
    }
}
