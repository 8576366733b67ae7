//! Application error types.

use thiserror::Error;

/// Application-level errors for taxoclass.
#[derive(Error, Debug)]
pub enum AppError {
    // Graph client errors
    #[error("Knowledge graph request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Knowledge graph API error: HTTP {status} - {body}")]
    GraphApi { status: u16, body: String },

    #[error("Knowledge graph error: {0}")]
    Graph(String),

    // Store errors
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Failed to persist classification for {id}: {source}")]
    Persist {
        id: String,
        #[source]
        source: Box<AppError>,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid category configuration: {0}")]
    CategoryConfig(String),

    #[error("Invalid fixture: {0}")]
    Fixture(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps a store write failure raised while finalizing `id`.
    pub fn persist(id: &str, source: AppError) -> Self {
        AppError::Persist {
            id: id.to_string(),
            source: Box::new(source),
        }
    }

    /// True for finalize write failures, which are never skipped as a branch.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AppError::Persist { .. })
    }

    /// Stable code for logs and CLI reports.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Http(_) => "GRAPH_HTTP_ERROR",
            AppError::GraphApi { .. } => "GRAPH_API_ERROR",
            AppError::Graph(_) => "GRAPH_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Pool(_) => "POOL_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Persist { .. } => "PERSIST_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::CategoryConfig(_) => "CATEGORY_CONFIG_ERROR",
            AppError::Fixture(_) => "FIXTURE_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_wraps_source() {
        let err = AppError::persist("Q515", AppError::Store("disk full".to_string()));
        assert!(err.is_persistence());
        assert_eq!(err.code(), "PERSIST_ERROR");
        assert!(err.to_string().contains("Q515"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_read_failures_are_not_persistence() {
        assert!(!AppError::Store("timeout".to_string()).is_persistence());
        assert!(!AppError::Graph("unreachable".to_string()).is_persistence());
    }
}
