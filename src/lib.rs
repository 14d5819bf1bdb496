pub mod error;
pub mod math;
pub mod ml;

pub use error::{Error, Result};
pub use math::distance::{euclidean, manhattan, minkowski, Metric};
pub use ml::classic::{KNNClassifier, KNNConfig, Neighbor, Weighting, DISTANCE_EPSILON};
