//! Distance functions for equal-length feature vectors.
//!
//! Every function checks that both vectors have the same length and returns
//! [`Error::DimensionMismatch`] otherwise. The absolute value is taken before
//! any exponentiation, so a fractional root is always taken of a
//! non-negative number.

use std::fmt;

use num_traits::Float;

use crate::error::{Error, Result};

/// A distance metric for comparing two feature vectors.
///
/// The Minkowski order travels with its tag, so a `Metric` value is all the
/// classifier needs to dispatch a distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// L1 distance: `Σ|a_i - b_i|`
    Manhattan,
    /// L2 distance: `sqrt(Σ(a_i - b_i)^2)`
    Euclidean,
    /// Lp distance of the given order: `(Σ|a_i - b_i|^p)^(1/p)`
    Minkowski(u32),
}

impl Metric {
    /// Builds a metric from its name and an optional Minkowski order.
    ///
    /// Accepted names (case insensitive) are `manhattan`/`l1`,
    /// `euclidean`/`l2` and `minkowski`/`lp`. The order must be given for
    /// Minkowski and only for Minkowski.
    ///
    /// # Example
    ///
    /// ```
    /// use knn::Metric;
    ///
    /// assert_eq!(Metric::from_name("l2", None).unwrap(), Metric::Euclidean);
    /// assert_eq!(Metric::from_name("lp", Some(3)).unwrap(), Metric::Minkowski(3));
    /// assert!(Metric::from_name("lp", None).is_err());
    /// assert!(Metric::from_name("bogus", None).is_err());
    /// ```
    pub fn from_name(name: &str, order: Option<u32>) -> Result<Self> {
        let metric = match (name.trim().to_ascii_lowercase().as_str(), order) {
            ("manhattan" | "l1", None) => Metric::Manhattan,
            ("euclidean" | "l2", None) => Metric::Euclidean,
            ("minkowski" | "lp", Some(p)) => Metric::Minkowski(p),
            ("minkowski" | "lp", None) => {
                return Err(Error::Configuration(
                    "Minkowski distance requires an integer order p".to_string(),
                ))
            }
            ("manhattan" | "l1" | "euclidean" | "l2", Some(p)) => {
                return Err(Error::Configuration(format!(
                    "order p = {} is only meaningful for Minkowski distance, not '{}'",
                    p, name
                )))
            }
            _ => {
                return Err(Error::Configuration(format!(
                    "unknown distance metric '{}'",
                    name
                )))
            }
        };
        metric.validate()?;
        Ok(metric)
    }

    /// Checks that a Minkowski order is at least 1.
    pub fn validate(&self) -> Result<()> {
        match self {
            Metric::Minkowski(0) => Err(Error::Configuration(
                "Minkowski order p must be a positive integer, got 0".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Computes the distance between `a` and `b` under this metric.
    pub fn distance<T: Float>(&self, a: &[T], b: &[T]) -> Result<T> {
        match *self {
            Metric::Manhattan => manhattan(a, b),
            Metric::Euclidean => euclidean(a, b),
            Metric::Minkowski(p) => minkowski(a, b, p),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Manhattan => write!(f, "manhattan"),
            Metric::Euclidean => write!(f, "euclidean"),
            Metric::Minkowski(p) => write!(f, "minkowski(p={})", p),
        }
    }
}

fn check_dimensions<T>(a: &[T], b: &[T]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(())
}

/// Manhattan (L1) distance: the sum of absolute elementwise differences.
pub fn manhattan<T: Float>(a: &[T], b: &[T]) -> Result<T> {
    check_dimensions(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).abs()))
}

/// Euclidean (L2) distance: the square root of the sum of squared differences.
pub fn euclidean<T: Float>(a: &[T], b: &[T]) -> Result<T> {
    check_dimensions(a, b)?;
    let sum_sq = a.iter().zip(b.iter()).fold(T::zero(), |acc, (&x, &y)| {
        let diff = x - y;
        acc + diff * diff
    });
    Ok(sum_sq.sqrt())
}

/// Minkowski (Lp) distance of integer order `p >= 1`.
///
/// `p = 1` gives the Manhattan distance and `p = 2` the Euclidean distance.
///
/// # Errors
/// - [`Error::DimensionMismatch`] if the vectors differ in length.
/// - [`Error::Configuration`] if `p == 0`.
pub fn minkowski<T: Float>(a: &[T], b: &[T], p: u32) -> Result<T> {
    check_dimensions(a, b)?;
    if p == 0 {
        return Err(Error::Configuration(
            "Minkowski order p must be a positive integer, got 0".to_string(),
        ));
    }
    let order = T::from(p).ok_or_else(|| {
        Error::Configuration(format!("Minkowski order p = {} is not representable", p))
    })?;

    let sum = match i32::try_from(p) {
        Ok(exp) => a
            .iter()
            .zip(b.iter())
            .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).abs().powi(exp)),
        Err(_) => a
            .iter()
            .zip(b.iter())
            .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).abs().powf(order)),
    };
    Ok(sum.powf(order.recip()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_pairs() -> Vec<(Vec<f64>, Vec<f64>)> {
        vec![
            (vec![0.0, 0.0], vec![3.0, 4.0]),
            (vec![1.5, -2.0, 7.25], vec![-0.5, 4.0, 1.0]),
            (vec![-1.0], vec![10.0]),
            (vec![0.1, 0.2, 0.3, 0.4], vec![0.4, 0.3, 0.2, 0.1]),
        ]
    }

    #[test]
    fn test_manhattan() {
        assert_relative_eq!(manhattan(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 7.0);
        assert_relative_eq!(
            manhattan(&[1.0, -1.0, 2.0], &[-1.0, 1.0, 2.0]).unwrap(),
            4.0
        );
    }

    #[test]
    fn test_euclidean() {
        assert_relative_eq!(euclidean(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 5.0);
        assert_relative_eq!(
            euclidean(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0]).unwrap(),
            3.0f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_minkowski_order_three() {
        // (1^3 + 2^3)^(1/3) = 9^(1/3)
        let d = minkowski(&[0.0, 0.0], &[1.0, -2.0], 3).unwrap();
        assert_relative_eq!(d, 9.0f64.powf(1.0 / 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_minkowski_matches_manhattan_and_euclidean() {
        for (a, b) in sample_pairs() {
            assert_relative_eq!(
                minkowski(&a, &b, 1).unwrap(),
                manhattan(&a, &b).unwrap(),
                epsilon = 1e-10
            );
            assert_relative_eq!(
                minkowski(&a, &b, 2).unwrap(),
                euclidean(&a, &b).unwrap(),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_symmetry_identity_and_non_negativity() {
        let metrics = [
            Metric::Manhattan,
            Metric::Euclidean,
            Metric::Minkowski(1),
            Metric::Minkowski(3),
            Metric::Minkowski(7),
        ];
        for metric in metrics {
            for (a, b) in sample_pairs() {
                let ab = metric.distance(&a, &b).unwrap();
                let ba = metric.distance(&b, &a).unwrap();
                assert_relative_eq!(ab, ba, epsilon = 1e-12);
                assert!(ab >= 0.0, "{} produced negative distance {}", metric, ab);
                assert_eq!(metric.distance(&a, &a).unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0, 3.0];
        let expected = Err(Error::DimensionMismatch {
            expected: 2,
            found: 3,
        });
        assert_eq!(manhattan(&a, &b), expected);
        assert_eq!(euclidean(&a, &b), expected);
        assert_eq!(minkowski(&a, &b, 3), expected);
    }

    #[test]
    fn test_minkowski_zero_order() {
        assert!(matches!(
            minkowski(&[1.0], &[2.0], 0),
            Err(Error::Configuration(_))
        ));
        assert!(Metric::Minkowski(0).validate().is_err());
        assert!(Metric::Minkowski(1).validate().is_ok());
    }

    #[test]
    fn test_single_precision() {
        let a: [f32; 2] = [0.0, 0.0];
        let b: [f32; 2] = [3.0, 4.0];
        assert_relative_eq!(Metric::Euclidean.distance(&a, &b).unwrap(), 5.0f32);
        assert_relative_eq!(Metric::Manhattan.distance(&a, &b).unwrap(), 7.0f32);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Metric::from_name("l1", None), Ok(Metric::Manhattan));
        assert_eq!(Metric::from_name("Manhattan", None), Ok(Metric::Manhattan));
        assert_eq!(Metric::from_name("euclidean", None), Ok(Metric::Euclidean));
        assert_eq!(Metric::from_name("minkowski", Some(4)), Ok(Metric::Minkowski(4)));

        assert!(matches!(
            Metric::from_name("lp", None),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Metric::from_name("lp", Some(0)),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Metric::from_name("bogus", None),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            Metric::from_name("l2", Some(2)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Metric::Manhattan.to_string(), "manhattan");
        assert_eq!(Metric::Minkowski(3).to_string(), "minkowski(p=3)");
    }
}
