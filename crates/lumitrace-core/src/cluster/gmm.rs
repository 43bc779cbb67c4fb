use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{KMEANS_REFINE_ITERATIONS, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{LumitraceError, Result};

use super::{CovarianceKind, GmmConfig};

/// ln(2*pi), for the Gaussian normalization term.
const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// Per-component scale terms derived from the fitted covariances.
#[derive(Clone, Debug)]
enum Scale {
    /// Lower Cholesky factor and log-determinant per component.
    Full {
        chol: Vec<Array2<f64>>,
        log_det: Vec<f64>,
    },
    /// Per-feature variances (k x d) and log-determinant per component.
    Diagonal {
        var: Array2<f64>,
        log_det: Vec<f64>,
    },
}

/// A Gaussian mixture fitted to sample rows with expectation-maximization.
#[derive(Clone, Debug)]
pub struct GaussianMixture {
    weights: Vec<f64>,
    means: Array2<f64>,
    scale: Scale,
    iterations: usize,
    log_likelihood: f64,
}

impl GaussianMixture {
    /// Fit `config.n_clusters` components to the rows of `x`.
    ///
    /// Initialization is k-means++ seeding plus a few Lloyd iterations, all
    /// driven by an RNG seeded from `config.seed`, so a given seed always
    /// produces the same model. Fails with `Convergence` when the mean
    /// log-likelihood has not stabilized within `config.max_iterations`.
    pub fn fit(x: &Array2<f64>, config: &GmmConfig) -> Result<Self> {
        let n = x.nrows();
        let d = x.ncols();
        let k = config.n_clusters;
        if k == 0 {
            return Err(LumitraceError::Config(
                "n_clusters must be at least 1".into(),
            ));
        }
        if n < k {
            return Err(LumitraceError::Config(format!(
                "{k} mixture components but only {n} samples"
            )));
        }
        if d == 0 {
            return Err(LumitraceError::Config("samples have no features".into()));
        }
        if config.max_iterations == 0 {
            return Err(LumitraceError::Config(
                "max_iterations must be at least 1".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let labels = kmeans_labels(x, k, &mut rng);

        let mut resp = Array2::<f64>::zeros((n, k));
        for (i, &label) in labels.iter().enumerate() {
            resp[[i, label]] = 1.0;
        }

        let mut model = GaussianMixture {
            weights: vec![0.0; k],
            means: Array2::zeros((k, d)),
            scale: Scale::Full {
                chol: Vec::new(),
                log_det: Vec::new(),
            },
            iterations: 0,
            log_likelihood: f64::NEG_INFINITY,
        };
        model.m_step(x, &resp, config)?;

        let mut log_norms = vec![0.0f64; n];
        let mut previous = f64::NEG_INFINITY;
        for iteration in 1..=config.max_iterations {
            model.e_step(x, &mut resp, &mut log_norms);
            // Summed sequentially so the bound does not depend on how Rayon
            // split the rows.
            let lower_bound = log_norms.iter().sum::<f64>() / n as f64;
            model.m_step(x, &resp, config)?;
            model.iterations = iteration;
            model.log_likelihood = lower_bound;

            if (lower_bound - previous).abs() < config.tolerance {
                debug!(iteration, lower_bound, "mixture fit converged");
                return Ok(model);
            }
            previous = lower_bound;
        }

        Err(LumitraceError::Convergence {
            iterations: config.max_iterations,
        })
    }

    /// Hard-assign each row of `x` to its most likely component. Ties go to
    /// the lowest component index.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<u32> {
        let n = x.nrows();
        let k = self.weights.len();
        let ln_weights: Vec<f64> = self.weights.iter().map(|w| w.ln()).collect();

        let assign = |row: ArrayView1<f64>| -> u32 {
            let mut best = 0u32;
            let mut best_lp = f64::NEG_INFINITY;
            for c in 0..k {
                let lp = ln_weights[c] + self.log_gaussian(c, row);
                if lp > best_lp {
                    best_lp = lp;
                    best = c as u32;
                }
            }
            best
        };

        if n >= PARALLEL_PIXEL_THRESHOLD {
            (0..n).into_par_iter().map(|i| assign(x.row(i))).collect()
        } else {
            (0..n).map(|i| assign(x.row(i))).collect()
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Component means, one row per component.
    pub fn means(&self) -> &Array2<f64> {
        &self.means
    }

    /// EM iterations actually run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Mean log-likelihood at the last iteration.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    fn e_step(&self, x: &Array2<f64>, resp: &mut Array2<f64>, log_norms: &mut [f64]) {
        let n = x.nrows();
        let k = self.weights.len();
        let ln_weights: Vec<f64> = self.weights.iter().map(|w| w.ln()).collect();

        let compute_row = |row: ArrayView1<f64>| -> (Vec<f64>, f64) {
            let mut lp = vec![0.0f64; k];
            for c in 0..k {
                lp[c] = ln_weights[c] + self.log_gaussian(c, row);
            }
            let max = lp.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut sum = 0.0;
            for v in &lp {
                sum += (v - max).exp();
            }
            let log_norm = max + sum.ln();
            for v in &mut lp {
                *v = (*v - log_norm).exp();
            }
            (lp, log_norm)
        };

        let rows: Vec<(Vec<f64>, f64)> = if n >= PARALLEL_PIXEL_THRESHOLD {
            (0..n)
                .into_par_iter()
                .map(|i| compute_row(x.row(i)))
                .collect()
        } else {
            (0..n).map(|i| compute_row(x.row(i))).collect()
        };

        for (i, (row, log_norm)) in rows.into_iter().enumerate() {
            for (c, v) in row.into_iter().enumerate() {
                resp[[i, c]] = v;
            }
            log_norms[i] = log_norm;
        }
    }

    fn m_step(&mut self, x: &Array2<f64>, resp: &Array2<f64>, config: &GmmConfig) -> Result<()> {
        let n = x.nrows();
        let d = x.ncols();
        let k = resp.ncols();

        let mut nk = vec![0.0f64; k];
        for i in 0..n {
            for c in 0..k {
                nk[c] += resp[[i, c]];
            }
        }
        // Keeps divisions finite for components that lost all support.
        for v in &mut nk {
            *v += 10.0 * f64::EPSILON;
        }

        let mut means = Array2::<f64>::zeros((k, d));
        for i in 0..n {
            for c in 0..k {
                let r = resp[[i, c]];
                if r == 0.0 {
                    continue;
                }
                for j in 0..d {
                    means[[c, j]] += r * x[[i, j]];
                }
            }
        }
        for c in 0..k {
            for j in 0..d {
                means[[c, j]] /= nk[c];
            }
        }
        self.means = means;
        self.weights = nk.iter().map(|v| v / n as f64).collect();

        self.scale = match config.covariance {
            CovarianceKind::Full => {
                let mut chol = Vec::with_capacity(k);
                let mut log_det = Vec::with_capacity(k);
                let mut diff = vec![0.0f64; d];
                for c in 0..k {
                    let mut cov = Array2::<f64>::zeros((d, d));
                    for i in 0..n {
                        let r = resp[[i, c]];
                        if r == 0.0 {
                            continue;
                        }
                        for (j, v) in diff.iter_mut().enumerate() {
                            *v = x[[i, j]] - self.means[[c, j]];
                        }
                        for a in 0..d {
                            let ra = r * diff[a];
                            for b in 0..=a {
                                cov[[a, b]] += ra * diff[b];
                            }
                        }
                    }
                    for a in 0..d {
                        for b in 0..=a {
                            cov[[a, b]] /= nk[c];
                        }
                        cov[[a, a]] += config.reg_covar;
                    }
                    for a in 0..d {
                        for b in (a + 1)..d {
                            cov[[a, b]] = cov[[b, a]];
                        }
                    }

                    let l = cholesky_lower(&cov).ok_or(LumitraceError::Convergence {
                        iterations: self.iterations,
                    })?;
                    log_det.push(2.0 * (0..d).map(|i| l[[i, i]].ln()).sum::<f64>());
                    chol.push(l);
                }
                Scale::Full { chol, log_det }
            }
            CovarianceKind::Diagonal => {
                let mut var = Array2::<f64>::zeros((k, d));
                for i in 0..n {
                    for c in 0..k {
                        let r = resp[[i, c]];
                        if r == 0.0 {
                            continue;
                        }
                        for j in 0..d {
                            let diff = x[[i, j]] - self.means[[c, j]];
                            var[[c, j]] += r * diff * diff;
                        }
                    }
                }
                let mut log_det = Vec::with_capacity(k);
                for c in 0..k {
                    let mut ld = 0.0;
                    for j in 0..d {
                        var[[c, j]] = var[[c, j]] / nk[c] + config.reg_covar;
                        ld += var[[c, j]].ln();
                    }
                    log_det.push(ld);
                }
                Scale::Diagonal { var, log_det }
            }
        };

        Ok(())
    }

    /// Log density of component `c` at `row`, without the mixture weight.
    fn log_gaussian(&self, c: usize, row: ArrayView1<f64>) -> f64 {
        let mean = self.means.row(c);
        let d = mean.len();
        match &self.scale {
            Scale::Full { chol, log_det } => {
                let l = &chol[c];
                // Solve L z = (row - mean) by forward substitution; the
                // quadratic form is then |z|^2.
                let mut z = vec![0.0f64; d];
                for i in 0..d {
                    let mut v = row[i] - mean[i];
                    for j in 0..i {
                        v -= l[[i, j]] * z[j];
                    }
                    z[i] = v / l[[i, i]];
                }
                let quad: f64 = z.iter().map(|v| v * v).sum();
                -0.5 * (d as f64 * LN_2PI + log_det[c] + quad)
            }
            Scale::Diagonal { var, log_det } => {
                let mut quad = 0.0;
                for j in 0..d {
                    let diff = row[j] - mean[j];
                    quad += diff * diff / var[[c, j]];
                }
                -0.5 * (d as f64 * LN_2PI + log_det[c] + quad)
            }
        }
    }
}

/// k-means++ seeding followed by a few Lloyd iterations. Returns the final
/// hard labels, which seed the first M-step.
fn kmeans_labels(x: &Array2<f64>, k: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = x.nrows();
    let d = x.ncols();

    let mut centers = Array2::<f64>::zeros((k, d));
    centers.row_mut(0).assign(&x.row(rng.gen_range(0..n)));

    // Squared distance to the nearest chosen center so far.
    let mut dist2 = vec![0.0f64; n];
    for (i, v) in dist2.iter_mut().enumerate() {
        *v = squared_distance(x.row(i), centers.row(0));
    }

    for c in 1..k {
        let total: f64 = dist2.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &w) in dist2.iter().enumerate() {
                target -= w;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point already coincides with a center.
            rng.gen_range(0..n)
        };
        centers.row_mut(c).assign(&x.row(pick));
        for (i, v) in dist2.iter_mut().enumerate() {
            let dd = squared_distance(x.row(i), centers.row(c));
            if dd < *v {
                *v = dd;
            }
        }
    }

    let mut labels = vec![0usize; n];
    assign_labels(x, &centers, &mut labels);
    for _ in 0..KMEANS_REFINE_ITERATIONS {
        update_centers(x, &labels, &mut centers);
        assign_labels(x, &centers, &mut labels);
    }
    labels
}

fn assign_labels(x: &Array2<f64>, centers: &Array2<f64>, labels: &mut [usize]) {
    let k = centers.nrows();
    for (i, label) in labels.iter_mut().enumerate() {
        let mut best = 0usize;
        let mut best_d = f64::INFINITY;
        for c in 0..k {
            let dd = squared_distance(x.row(i), centers.row(c));
            if dd < best_d {
                best_d = dd;
                best = c;
            }
        }
        *label = best;
    }
}

/// Recompute centers from labels. Clusters that lost every point keep their
/// previous center.
fn update_centers(x: &Array2<f64>, labels: &[usize], centers: &mut Array2<f64>) {
    let (k, d) = centers.dim();
    let mut counts = vec![0usize; k];
    let mut sums = Array2::<f64>::zeros((k, d));
    for (i, &label) in labels.iter().enumerate() {
        counts[label] += 1;
        for j in 0..d {
            sums[[label, j]] += x[[i, j]];
        }
    }
    for c in 0..k {
        if counts[c] > 0 {
            for j in 0..d {
                centers[[c, j]] = sums[[c, j]] / counts[c] as f64;
            }
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

/// Lower-triangular Cholesky factor of a symmetric matrix. Returns `None`
/// when the matrix is not positive definite.
fn cholesky_lower(a: &Array2<f64>) -> Option<Array2<f64>> {
    let d = a.nrows();
    let mut l = Array2::<f64>::zeros((d, d));
    for i in 0..d {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for p in 0..j {
                sum -= l[[i, p]] * l[[j, p]];
            }
            if i == j {
                if sum <= 0.0 || sum.is_nan() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}
