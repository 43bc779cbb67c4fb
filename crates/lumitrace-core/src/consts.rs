/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Default number of leading reference frames folded into the dark-image median.
pub const DEFAULT_DARK_FRAME_COUNT: usize = 100;

/// Default number of Gaussian mixture components used to cluster pixel traces.
pub const DEFAULT_CLUSTER_COUNT: usize = 5;

/// Default EM iteration budget for the mixture fit.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default convergence tolerance on the change in mean log-likelihood between
/// EM iterations.
pub const DEFAULT_CONVERGENCE_TOL: f64 = 1e-3;

/// Default ridge added to covariance diagonals so they stay positive definite
/// even for clusters with near-constant traces.
pub const DEFAULT_COVARIANCE_REG: f64 = 1e-6;

/// Default seed for the mixture initialization RNG.
pub const DEFAULT_SEED: u64 = 0;

/// Lloyd refinement iterations applied after k-means++ seeding.
pub const KMEANS_REFINE_ITERATIONS: usize = 10;

/// Default minimum blob area (in pixels) for an ROI candidate.
pub const DEFAULT_MIN_BLOB_AREA: f64 = 50.0;
