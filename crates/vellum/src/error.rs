//! CLI error types.

use vellum_config::ConfigError;
use vellum_display::DisplayError;
use vellum_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Render(#[from] DisplayError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
