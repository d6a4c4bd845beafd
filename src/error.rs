use thiserror::Error;

/// Errors raised while loading, validating, persisting or exporting dashboard data.
///
/// The milestone evaluator never produces one of these; every evaluator
/// function is total over its inputs.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error at line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "web")]
    #[error("XLSX export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
