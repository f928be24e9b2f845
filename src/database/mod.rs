pub mod connection;

pub use connection::DatabaseConnection;

/// Embedded migrations for the catalog schema
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
