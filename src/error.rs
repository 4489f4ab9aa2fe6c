//! Error types for transport allocation

use thiserror::Error;

use crate::board::PersonId;

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error parsing CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing the column: \"{0}\"")]
    MissingColumn(String),

    #[error("CSV contains no data rows")]
    NoRows,

    #[error("Excel export error: {0}")]
    Excel(String),

    #[error("There is no one to allocate.")]
    NothingToAllocate,

    #[error("Unknown person: {0}")]
    UnknownPerson(PersonId),

    #[error("No CSV has been uploaded yet")]
    NoBoard,
}

impl From<rust_xlsxwriter::XlsxError> for AllocationError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AllocationError::Excel(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;
