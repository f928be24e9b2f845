use crate::error::{CatalogError, Result};

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub publish_poll_interval_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/catalog_development".to_string(),
            max_connections: 10,
            publish_poll_interval_secs: 60,
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(max_connections) = std::env::var("CATALOG_MAX_CONNECTIONS") {
            config.max_connections = max_connections.parse().map_err(|e| {
                CatalogError::ConfigurationError(format!("Invalid max_connections: {e}"))
            })?;
        }

        if let Ok(interval) = std::env::var("CATALOG_PUBLISH_POLL_INTERVAL_SECS") {
            config.publish_poll_interval_secs = interval.parse().map_err(|e| {
                CatalogError::ConfigurationError(format!("Invalid publish_poll_interval_secs: {e}"))
            })?;
        }

        Ok(config)
    }
}
