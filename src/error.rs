use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    DatabaseError(String),
    StateTransitionError(String),
    PublishingError(String),
    ValidationError(String),
    ConfigurationError(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            CatalogError::StateTransitionError(msg) => write!(f, "State transition error: {msg}"),
            CatalogError::PublishingError(msg) => write!(f, "Publishing error: {msg}"),
            CatalogError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            CatalogError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
