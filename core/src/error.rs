use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DspError {
    #[error("sequence length {0} is not a positive power of two")]
    BadSize(usize),

    #[error("index {index} exceeds buffer capacity {capacity}")]
    OutOfRange { index: usize, capacity: usize },

    #[error("cyclic prefix of {cp} samples exceeds the {len}-point symbol")]
    CyclicPrefixTooLong { cp: usize, len: usize },

    #[error("received block of {got} samples is shorter than the {needed}-sample cyclic prefix")]
    InsufficientData { needed: usize, got: usize },

    #[error("no nearest constellation point for ({re}, {im})")]
    NearestNotFound { re: f64, im: f64 },
}

pub type Result<T> = std::result::Result<T, DspError>;
