mod gmm;

pub use gmm::GaussianMixture;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CLUSTER_COUNT, DEFAULT_CONVERGENCE_TOL, DEFAULT_COVARIANCE_REG,
    DEFAULT_MAX_ITERATIONS, DEFAULT_SEED,
};
use crate::error::Result;
use crate::features::FeatureMatrix;

/// Covariance structure fitted per mixture component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceKind {
    /// One full covariance matrix per component.
    #[default]
    Full,
    /// Per-frame variances only. Cheaper for long stacks.
    Diagonal,
}

/// Configuration for pixel-trace clustering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GmmConfig {
    /// Number of mixture components.
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,
    /// Covariance structure.
    #[serde(default)]
    pub covariance: CovarianceKind,
    /// EM iteration budget. Exceeding it is an error, not a warning.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence tolerance on the change in mean log-likelihood.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Ridge added to covariance diagonals.
    #[serde(default = "default_reg_covar")]
    pub reg_covar: f64,
    /// Seed for the initialization RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_clusters() -> usize {
    DEFAULT_CLUSTER_COUNT
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_tolerance() -> f64 {
    DEFAULT_CONVERGENCE_TOL
}
fn default_reg_covar() -> f64 {
    DEFAULT_COVARIANCE_REG
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for GmmConfig {
    fn default() -> Self {
        Self {
            n_clusters: DEFAULT_CLUSTER_COUNT,
            covariance: CovarianceKind::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_CONVERGENCE_TOL,
            reg_covar: DEFAULT_COVARIANCE_REG,
            seed: DEFAULT_SEED,
        }
    }
}

/// Cluster labels for every pixel of a frame, in pixel-index order.
#[derive(Clone, Debug)]
pub struct ClusterAssignment {
    labels: Vec<u32>,
    n_clusters: usize,
}

impl ClusterAssignment {
    pub fn new(labels: Vec<u32>, n_clusters: usize) -> Self {
        debug_assert!(labels.iter().all(|&l| (l as usize) < n_clusters));
        ClusterAssignment { labels, n_clusters }
    }

    /// One label per pixel, ordered by pixel index.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Fit a Gaussian mixture to the pixel traces and hard-assign every pixel to
/// its most likely component.
pub fn cluster_pixels(features: &FeatureMatrix, config: &GmmConfig) -> Result<ClusterAssignment> {
    let model = GaussianMixture::fit(features.data(), config)?;
    let labels = model.predict(features.data());
    Ok(ClusterAssignment::new(labels, config.n_clusters))
}
