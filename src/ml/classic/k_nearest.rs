use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use log::{debug, trace};
use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::math::distance::Metric;

/// Added to every neighbor distance before inversion, so an exact match
/// (distance 0) gets a very large but finite weight.
pub const DISTANCE_EPSILON: f64 = 1e-10;

/// How the k nearest neighbors vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Weighting {
    /// One vote per neighbor.
    #[default]
    Uniform,
    /// Each neighbor votes with weight `1 / (distance + DISTANCE_EPSILON)`.
    Distance,
}

impl FromStr for Weighting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Weighting::Uniform),
            "distance" => Ok(Weighting::Distance),
            _ => Err(Error::Configuration(format!(
                "unknown weighting scheme '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Uniform => write!(f, "uniform"),
            Weighting::Distance => write!(f, "distance"),
        }
    }
}

/// Configuration options for a k-NN classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct KNNConfig {
    /// Number of neighbors consulted per prediction.
    pub k: usize,
    /// Distance metric used to rank training points.
    pub metric: Metric,
    /// Voting scheme applied to the k nearest neighbors.
    pub weighting: Weighting,
}

impl KNNConfig {
    /// Create a new config with Euclidean distance and uniform weighting.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            metric: Metric::Euclidean,
            weighting: Weighting::Uniform,
        }
    }

    /// Customize the distance metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Customize the weighting scheme.
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Checks that `k` is positive and that the metric is well formed.
    ///
    /// `k` is not compared with the training-set size here; that happens at
    /// predict time.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::Configuration("k must be > 0".to_string()));
        }
        self.metric.validate()
    }
}

/// One of the k nearest training points of a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the training set passed to `fit`.
    pub index: usize,
    /// Distance from the query under the configured metric.
    pub distance: f64,
}

/// A brute-force k-NN classifier.
///
/// `fit` only borrows the training data; the classifier cannot outlive it.
/// Every query is compared with every training point.
///
/// Ties are broken deterministically:
/// - Equal distances keep training-set order (stable sort), so earlier
///   training points win when they straddle the k-th position.
/// - Labels with equal vote totals are resolved in favor of the label that
///   appears first among the k nearest neighbors. This applies to both
///   uniform and distance-weighted voting.
///
/// # Type Parameters
/// - `L`: The label type. Must be `Eq + Hash + Clone` so votes can be tallied.
///
/// # Example
///
/// ```
/// use knn::{KNNClassifier, KNNConfig, Metric, Weighting};
///
/// let features = vec![
///     vec![0.0, 0.0],
///     vec![1.0, 1.0],
///     vec![5.0, 5.0],
///     vec![6.0, 6.0],
/// ];
/// let labels = vec!["A", "A", "B", "B"];
///
/// let config = KNNConfig::new(3)
///     .with_metric(Metric::Euclidean)
///     .with_weighting(Weighting::Uniform);
/// let mut knn = KNNClassifier::new(config).unwrap();
/// knn.fit(&features, &labels).unwrap();
///
/// let predicted = knn.predict(&[vec![0.1, 0.1], vec![5.9, 5.9]]).unwrap();
/// assert_eq!(predicted, vec!["A", "B"]);
/// ```
#[derive(Debug, Clone)]
pub struct KNNClassifier<'a, L> {
    config: KNNConfig,
    features: &'a [Vec<f64>],
    labels: &'a [L],
}

impl<'a, L: Eq + Hash + Clone> KNNClassifier<'a, L> {
    /// Constructs an unfitted classifier.
    ///
    /// # Errors
    /// - [`Error::Configuration`] if `k == 0` or the Minkowski order is 0.
    pub fn new(config: KNNConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            features: &[],
            labels: &[],
        })
    }

    /// Constructs an unfitted classifier from metric and weighting names.
    ///
    /// See [`Metric::from_name`] for the accepted metric names; `weighting`
    /// is `"uniform"` or `"distance"`. `order` is required for Minkowski
    /// distance and rejected otherwise.
    ///
    /// ```
    /// use knn::{Error, KNNClassifier};
    ///
    /// let knn = KNNClassifier::<u8>::from_names(3, "lp", "distance", Some(3));
    /// assert!(knn.is_ok());
    ///
    /// let knn = KNNClassifier::<u8>::from_names(3, "lp", "uniform", None);
    /// assert!(matches!(knn, Err(Error::Configuration(_))));
    /// ```
    pub fn from_names(
        k: usize,
        metric: &str,
        weighting: &str,
        order: Option<u32>,
    ) -> Result<Self> {
        let metric = Metric::from_name(metric, order)?;
        let weighting = weighting.parse::<Weighting>()?;
        Self::new(KNNConfig {
            k,
            metric,
            weighting,
        })
    }

    /// Stores references to the training data, replacing any earlier data.
    ///
    /// Feature dimensionality is not checked here; mismatched vectors are
    /// reported by the distance functions at predict time.
    ///
    /// # Errors
    /// - [`Error::LabelCountMismatch`] if `features.len() != labels.len()`.
    pub fn fit(&mut self, features: &'a [Vec<f64>], labels: &'a [L]) -> Result<()> {
        if features.len() != labels.len() {
            return Err(Error::LabelCountMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        debug!(
            "fitted k-NN classifier on {} training points",
            features.len()
        );
        self.features = features;
        self.labels = labels;
        Ok(())
    }

    /// Predicts one label per query, in query order.
    ///
    /// # Errors
    /// - [`Error::UnfittedModel`] if no training data is stored.
    /// - [`Error::InsufficientData`] if `k` exceeds the training-set size.
    /// - [`Error::DimensionMismatch`] if a query and a training vector differ in length.
    pub fn predict<Q: AsRef<[f64]>>(&self, queries: &[Q]) -> Result<Vec<L>> {
        self.ensure_ready()?;
        debug!(
            "predicting {} queries with k = {}, metric = {}, weighting = {}",
            queries.len(),
            self.config.k,
            self.config.metric,
            self.config.weighting
        );
        queries.iter().map(|q| self.classify(q.as_ref())).collect()
    }

    /// Predicts the label of a single query.
    pub fn predict_one(&self, query: &[f64]) -> Result<L> {
        self.ensure_ready()?;
        self.classify(query)
    }

    /// Same as [`predict`](Self::predict), with queries evaluated in parallel.
    ///
    /// Output order matches query order. If several queries fail, which of
    /// their errors is returned is unspecified.
    pub fn predict_par<Q>(&self, queries: &[Q]) -> Result<Vec<L>>
    where
        Q: AsRef<[f64]> + Sync,
        L: Send + Sync,
    {
        self.ensure_ready()?;
        debug!(
            "predicting {} queries in parallel with k = {}",
            queries.len(),
            self.config.k
        );
        queries
            .par_iter()
            .map(|q| self.classify(q.as_ref()))
            .collect()
    }

    /// Predicts one label per row of `queries`.
    pub fn predict_array(&self, queries: ArrayView2<f64>) -> Result<Vec<L>> {
        self.ensure_ready()?;
        debug!("predicting {} array rows", queries.nrows());
        queries
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.classify(slice),
                None => self.classify(&row.to_vec()),
            })
            .collect()
    }

    /// Returns the k nearest training points of `query`, closest first.
    pub fn kneighbors(&self, query: &[f64]) -> Result<Vec<Neighbor>> {
        self.ensure_ready()?;
        Ok(self
            .find_k_nearest(query)?
            .into_iter()
            .map(|(distance, index)| Neighbor { index, distance })
            .collect())
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn weighting(&self) -> Weighting {
        self.config.weighting
    }

    pub fn config(&self) -> &KNNConfig {
        &self.config
    }

    /// True once `fit` has stored a non-empty training set.
    pub fn is_fitted(&self) -> bool {
        !self.features.is_empty()
    }

    /// Number of stored training points.
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.is_fitted() {
            return Err(Error::UnfittedModel);
        }
        if self.config.k > self.features.len() {
            return Err(Error::InsufficientData {
                k: self.config.k,
                available: self.features.len(),
            });
        }
        Ok(())
    }

    fn classify(&self, query: &[f64]) -> Result<L> {
        let nearest = self.find_k_nearest(query)?;
        let label = self.vote(&nearest)?;
        trace!(
            "query {:?} voted over {} neighbors, closest at {:?}",
            query,
            nearest.len(),
            nearest.first().map(|&(d, _)| d)
        );
        Ok(label)
    }

    /// (distance, training index) of the k nearest points, ascending by
    /// distance. NaN distances sort last.
    fn find_k_nearest(&self, query: &[f64]) -> Result<Vec<(f64, usize)>> {
        let mut dists = self
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| {
                self.config
                    .metric
                    .distance(f.as_slice(), query)
                    .map(|d| (d, i))
            })
            .collect::<Result<Vec<(f64, usize)>>>()?;

        // sort_by is stable: equal distances keep training order.
        dists.sort_by(|(d1, _), (d2, _)| d1.total_cmp(d2));
        dists.truncate(self.config.k);
        Ok(dists)
    }

    /// Tallies votes per label in first-occurrence order, then picks the first
    /// label holding the maximum total.
    fn vote(&self, nearest: &[(f64, usize)]) -> Result<L> {
        let mut tallies: Vec<(&L, f64)> = Vec::with_capacity(nearest.len());
        let mut slots: HashMap<&L, usize> = HashMap::with_capacity(nearest.len());

        for &(distance, idx) in nearest {
            let label = &self.labels[idx];
            let weight = match self.config.weighting {
                Weighting::Uniform => 1.0,
                Weighting::Distance => 1.0 / (distance + DISTANCE_EPSILON),
            };
            let slot = *slots.entry(label).or_insert_with(|| {
                tallies.push((label, 0.0));
                tallies.len() - 1
            });
            tallies[slot].1 += weight;
        }

        // Only a strictly greater total takes over; a NaN total never does.
        let mut rest = tallies.iter().copied();
        let best = rest.next().map(|first| {
            rest.fold(first, |(best_label, best_total), (label, total)| {
                if total > best_total || (best_total.is_nan() && !total.is_nan()) {
                    (label, total)
                } else {
                    (best_label, best_total)
                }
            })
        });

        best.map(|(label, _)| label.clone())
            .ok_or_else(|| Error::InsufficientData {
                k: self.config.k,
                available: self.features.len(),
            })
    }
}
