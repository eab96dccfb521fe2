use std::io;

use thiserror::Error;

/// Errors surfaced by the recommender. Unknown identifiers and shape mismatches indicate that
/// the caller queried a model with data it was not built from.
#[derive(Error, Debug)]
pub enum RecoError {
    #[error("item {0} is not part of the rating matrix")]
    UnknownItem(i64),

    #[error("item index {0} is out of range for the similarity index")]
    UnknownItemIndex(usize),

    #[error("user {0} is not part of the rating matrix")]
    UnknownUser(i64),

    #[error("query vector has {actual} dimensions, the index expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("no recommendations were produced for user {0}, its worker failed")]
    WorkerFailed(i64),

    #[error("model snapshot is inconsistent: {0}")]
    CorruptSnapshot(String),

    #[error("unknown distance metric '{0}', expected cosine, euclidean or manhattan")]
    UnknownMetric(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecoError>;
