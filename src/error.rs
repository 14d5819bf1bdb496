//! Error types shared by the distance functions and the classifier.

use thiserror::Error;

/// Errors raised by the distance functions and the k-NN classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid metric, weighting, Minkowski order or `k`.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Two feature vectors of different length were compared.
    #[error("Dimension mismatch: expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// `k` is larger than the number of stored training points.
    #[error("Insufficient data: k = {k} but only {available} training points are stored")]
    InsufficientData { k: usize, available: usize },

    /// `predict` was called before `fit`, or after fitting an empty training set.
    #[error("Model has not been fitted with training data")]
    UnfittedModel,

    /// `fit` received feature and label sequences of different length.
    #[error("Label count mismatch: {features} feature vectors but {labels} labels")]
    LabelCountMismatch { features: usize, labels: usize },
}

/// Result type for distance and classifier operations
pub type Result<T> = std::result::Result<T, Error>;
