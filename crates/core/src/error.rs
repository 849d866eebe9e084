use thiserror::Error;

#[derive(Error, Debug)]
pub enum StylographError {
    #[error("insufficient input: {0}")]
    InsufficientInput(&'static str),

    #[error("invalid probability {probability} from model '{model_id}' (expected 0.0..=1.0)")]
    InvalidScore { model_id: String, probability: f64 },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("insufficient samples: have {have}, need {need}")]
    InsufficientSamples { have: u64, need: u64 },

    #[error("invalid weight: {0}")]
    InvalidWeight(String),
}

pub type Result<T> = std::result::Result<T, StylographError>;
