use std::path::PathBuf;

use thiserror::Error;

/// Reasons a dataset load is rejected. Any of these aborts the whole load;
/// no partial dataset is ever returned.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse last_survey_date {value:?}")]
    InvalidDate { row: usize, value: String },
}
