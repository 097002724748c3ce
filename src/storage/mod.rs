//! `SQLite` storage: schema inspection, migration, backups and seeding.

pub mod backup;
pub mod migrate;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use migrate::{DropStrategy, MigrationPolicy, MigrationReport, migrate};
pub use schema::SchemaState;
pub use sqlite::IssueStore;
