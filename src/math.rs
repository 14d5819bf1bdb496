pub mod distance;

pub use distance::{euclidean, manhattan, minkowski, Metric};
