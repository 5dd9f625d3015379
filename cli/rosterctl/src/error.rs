//! Error handling and display for the CLI.

use colored::Colorize;
use roster_grid::GridError;
use roster_reconcile::{ReconcileError, StoreError};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not authenticated. Run `roster auth login` to authenticate.")]
    NotAuthenticated,

    #[error("API error: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an API error from response details.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<CliError> for StoreError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::NotAuthenticated => StoreError::Rejected {
                status: 401,
                message: "not authenticated".to_string(),
            },
            CliError::Api {
                status, message, ..
            } => StoreError::Rejected { status, message },
            CliError::Network(e) if e.is_decode() => StoreError::Decode(e.to_string()),
            CliError::Network(e) => StoreError::Unavailable(e.to_string()),
            CliError::NotFound(message) => StoreError::Rejected {
                status: 404,
                message,
            },
            CliError::Other(e) => StoreError::Decode(e.to_string()),
        }
    }
}

/// The store failure underneath an engine error, if any.
fn store_error(err: &anyhow::Error) -> Option<&StoreError> {
    if let Some(store) = err.downcast_ref::<StoreError>() {
        return Some(store);
    }
    match err.downcast_ref::<ReconcileError>()? {
        ReconcileError::SyncFailed(source) | ReconcileError::Load { source, .. } => Some(source),
        _ => None,
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(CliError::NotAuthenticated) = err.downcast_ref::<CliError>() {
        eprintln!(
            "\n{}",
            "Hint: Run `roster auth login` to authenticate.".yellow()
        );
        return;
    }

    if let Some(grid) = err.downcast_ref::<GridError>() {
        if grid.is_locked() {
            eprintln!(
                "\n{}",
                "Hint: Slots that have already started are read-only.".yellow()
            );
        }
        return;
    }

    match store_error(err) {
        Some(StoreError::Rejected { status: 401, .. }) => {
            eprintln!(
                "\n{}",
                "Hint: Your token may have expired. Run `roster auth login`.".yellow()
            );
        }
        Some(StoreError::Rejected { status: 403, .. }) => {
            eprintln!(
                "\n{}",
                "Hint: You may not have permission to edit this roster.".yellow()
            );
        }
        Some(StoreError::Rejected { status: 409, .. }) => {
            eprintln!(
                "\n{}",
                "Hint: The roster changed elsewhere. Run `roster day show` and retry.".yellow()
            );
        }
        Some(StoreError::Unavailable(_)) => {
            eprintln!(
                "\n{}",
                "Hint: Check your network connection and API endpoint (`roster config show`)."
                    .yellow()
            );
        }
        _ => {}
    }
}
