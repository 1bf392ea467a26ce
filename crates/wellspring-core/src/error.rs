//! Error types for Wellspring

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Insufficient data: need at least {required} weeks, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
