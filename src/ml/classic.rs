pub mod k_nearest;

// Re-export public types and functions
pub use k_nearest::{KNNClassifier, KNNConfig, Neighbor, Weighting, DISTANCE_EPSILON};
