//! Error types for the dashboard service.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for dashboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Data source errors ===
    /// The database file could not be opened.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The database file does not exist.
    #[error("database file {path} does not exist")]
    DatabaseMissing { path: PathBuf },

    /// The configured table is not in the database.
    #[error("table '{table}' not found in {path}")]
    TableMissing { path: PathBuf, table: String },

    /// An essential column is missing from the table.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnMissing { table: String, column: String },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// A previous load failed and is still cached.
    #[error("dataset unavailable: {0}")]
    DataUnavailable(#[source] Arc<Error>),

    // === Configuration errors ===
    #[error("failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("invalid configuration: {message}")]
    ConfigValidation { message: String },

    // === Session errors ===
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("unknown filter dimension '{0}'")]
    UnknownDimension(String),

    // === Runtime errors ===
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A specialized Result type for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Whether the error means the data source could not be read.
    #[must_use]
    pub fn is_data_source_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseMissing { .. }
                | Self::TableMissing { .. }
                | Self::ColumnMissing { .. }
                | Self::DatabaseQuery(_)
                | Self::DataUnavailable(_)
        )
    }

    /// Short machine-readable name of the variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseOpen { .. } => "database_open",
            Self::DatabaseMissing { .. } => "database_missing",
            Self::TableMissing { .. } => "table_missing",
            Self::ColumnMissing { .. } => "column_missing",
            Self::DatabaseQuery(_) => "database_query",
            Self::DataUnavailable(_) => "data_unavailable",
            Self::ConfigLoad(_) => "config_load",
            Self::ConfigValidation { .. } => "config_validation",
            Self::SessionNotFound(_) => "session_not_found",
            Self::UnknownDimension(_) => "unknown_dimension",
            Self::Join(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_missing_display() {
        let err = Error::TableMissing {
            path: PathBuf::from("dados/teste.db"),
            table: "mortes".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("mortes"));
        assert!(msg.contains("dados/teste.db"));
    }

    #[test]
    fn test_data_unavailable_wraps_cause() {
        let cause = Arc::new(Error::DatabaseMissing {
            path: PathBuf::from("/nope.db"),
        });
        let err = Error::DataUnavailable(cause);
        assert!(err.to_string().contains("/nope.db"));
        assert!(err.is_data_source_error());
        assert_eq!(err.kind(), "data_unavailable");
    }

    #[test]
    fn test_session_errors_are_not_data_source_errors() {
        assert!(!Error::SessionNotFound("abc".to_string()).is_data_source_error());
        assert!(!Error::UnknownDimension("rank".to_string()).is_data_source_error());
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("top_n must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: top_n must be at least 1"
        );
    }
}
