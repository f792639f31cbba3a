use thiserror::Error;

use crate::types::ProductType;

pub type TegResult<T> = Result<T, TegError>;

#[derive(Error, Debug)]
pub enum TegError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The workbook could not be opened or one of its sheets could not be read.
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Nothing in the workbook could be extracted
    #[error("No valid data found in the workbook, nothing was stored")]
    EmptyImport,

    #[error("Persistence error for {product}: {message}")]
    Sink {
        product: ProductType,
        message: String,
    },
}
