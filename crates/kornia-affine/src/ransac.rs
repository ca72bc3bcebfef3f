//! RANSAC over the minimal three-point affine solver.
//!
//! Every trial draws three distinct correspondences, fits an exact affine transform to them,
//! grows a consensus set from the remaining correspondences and keeps the model whose largest
//! residual over its consensus set is the smallest seen so far.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::prelude::*;
use rayon::prelude::*;

use crate::affine::{affine_from_points, AffineMatrix};
use crate::correspondence::Correspondence;
use crate::error::AffineError;
use crate::residual::reprojection_error;

/// Number of correspondences in a minimal sample.
const SAMPLE_SIZE: usize = 3;

/// Parameters for RANSAC affine estimation.
#[derive(Clone, Debug)]
pub struct RansacParams {
    /// Number of RANSAC trials.
    pub iterations: usize,
    /// Residual (pixels) below which a correspondence joins the consensus set.
    pub error_threshold: f64,
    /// Minimum consensus set size, minimal sample included, for a model to be considered.
    pub min_consensus: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
    /// Optional wall-clock budget, checked between trials.
    pub max_duration: Option<Duration>,
    /// Re-estimate the winning model from its whole consensus set.
    pub refit_consensus: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            error_threshold: 10.0,
            min_consensus: 5,
            random_seed: None,
            max_duration: None,
            refit_consensus: false,
        }
    }
}

impl RansacParams {
    /// The sampler RNG: seeded from `random_seed` when set, otherwise from the thread RNG.
    pub fn rng(&self) -> StdRng {
        match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => {
                let mut tr = rand::rng();
                StdRng::from_rng(&mut tr)
            }
        }
    }

    /// Check that the parameters are in range.
    pub fn validate(&self) -> Result<(), AffineError> {
        if self.iterations == 0 {
            return Err(AffineError::InvalidParams(
                "iterations must be positive".to_string(),
            ));
        }
        if !self.error_threshold.is_finite() || self.error_threshold <= 0.0 {
            return Err(AffineError::InvalidParams(format!(
                "error_threshold must be positive and finite, got {}",
                self.error_threshold
            )));
        }
        if self.min_consensus < SAMPLE_SIZE {
            return Err(AffineError::InvalidParams(format!(
                "min_consensus must be at least {SAMPLE_SIZE}, got {}",
                self.min_consensus
            )));
        }
        Ok(())
    }
}

/// Result of a RANSAC affine fit.
#[derive(Clone, Debug)]
pub struct RansacResult {
    /// Estimated model.
    pub model: AffineMatrix,
    /// Largest residual of the model over its consensus set.
    pub max_error: f64,
    /// Indices of the consensus set in ascending order.
    pub consensus: Vec<usize>,
    /// Trial that produced the model, counting from zero.
    pub iteration: usize,
    /// Number of trials actually run.
    pub iterations_run: usize,
}

// Model fitted to one minimal sample together with its consensus set.
#[derive(Debug)]
struct Hypothesis {
    model: AffineMatrix,
    max_error: f64,
    consensus: Vec<usize>,
}

// Running best model. Its error only ever decreases.
#[derive(Debug)]
struct BestModel {
    hypothesis: Option<Hypothesis>,
    iteration: usize,
}

impl BestModel {
    fn new() -> Self {
        Self {
            hypothesis: None,
            iteration: 0,
        }
    }

    fn error(&self) -> f64 {
        self.hypothesis
            .as_ref()
            .map_or(f64::INFINITY, |h| h.max_error)
    }

    // Ties keep the earlier model.
    fn offer(&mut self, candidate: Hypothesis, iteration: usize, threshold: f64) -> bool {
        if candidate.max_error < threshold && candidate.max_error < self.error() {
            self.hypothesis = Some(candidate);
            self.iteration = iteration;
            return true;
        }
        false
    }
}

/// Estimate an affine transform with RANSAC, seeding the RNG from the parameters.
///
/// * `correspondences` - The putative correspondences, at least three.
/// * `params` - The RANSAC parameters.
///
/// # Returns
///
/// `Ok(None)` when no trial produced a model whose consensus set is large enough and whose
/// residuals all stay below the threshold.
///
/// # Errors
///
/// - [`AffineError::InvalidParams`] if `params` is out of range.
/// - [`AffineError::InsufficientData`] if fewer than three correspondences are given.
/// - [`AffineError::NonFiniteInput`] if a correspondence holds NaN or infinity.
pub fn ransac_affine(
    correspondences: &[Correspondence],
    params: &RansacParams,
) -> Result<Option<RansacResult>, AffineError> {
    let mut rng = params.rng();
    ransac_affine_with_rng(correspondences, params, &mut rng, None)
}

/// Estimate an affine transform with RANSAC using the given random source.
///
/// The `cancel` flag and [`RansacParams::max_duration`] are checked between trials. When
/// either stops the loop, the best model found so far is returned.
///
/// # Errors
///
/// Same as [`ransac_affine`].
pub fn ransac_affine_with_rng<R: Rng + ?Sized>(
    correspondences: &[Correspondence],
    params: &RansacParams,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Result<Option<RansacResult>, AffineError> {
    check_input(correspondences, params)?;

    let n = correspondences.len();
    let start = Instant::now();
    let mut best = BestModel::new();
    let mut iterations_run = 0;

    for iteration in 0..params.iterations {
        if should_stop(cancel, start, params.max_duration) {
            log::debug!("RANSAC interrupted before iteration {iteration}");
            break;
        }

        let sample = draw_sample(rng, n);
        iterations_run += 1;

        if let Some(candidate) = evaluate_sample(correspondences, sample, params) {
            let (inliers, error) = (candidate.consensus.len(), candidate.max_error);
            if best.offer(candidate, iteration, params.error_threshold) {
                log::debug!(
                    "Iteration {iteration}: new best model with {inliers} inliers, max error {error:.6}"
                );
            }
        }
    }

    Ok(finalize(correspondences, params, best, iterations_run))
}

/// Estimate an affine transform with RANSAC, evaluating trials on the rayon thread pool.
///
/// All minimal samples are drawn up front, in trial order, from [`RansacParams::rng`].
/// Candidates are then reduced in trial order, so for a fixed seed the result equals the one
/// of [`ransac_affine`].
///
/// The `cancel` flag and [`RansacParams::max_duration`] are checked before each trial. Trials
/// run out of order on the pool, so when either interrupts the run the skipped trials depend
/// on scheduling and the result is no longer reproducible.
///
/// # Errors
///
/// Same as [`ransac_affine`].
pub fn ransac_affine_par(
    correspondences: &[Correspondence],
    params: &RansacParams,
    cancel: Option<&AtomicBool>,
) -> Result<Option<RansacResult>, AffineError> {
    check_input(correspondences, params)?;

    let n = correspondences.len();
    let mut rng = params.rng();
    let samples = (0..params.iterations)
        .map(|_| draw_sample(&mut rng, n))
        .collect::<Vec<_>>();

    let start = Instant::now();
    let evaluated = AtomicUsize::new(0);

    let candidates = samples
        .par_iter()
        .map(|&sample| {
            if should_stop(cancel, start, params.max_duration) {
                return None;
            }
            evaluated.fetch_add(1, Ordering::Relaxed);
            evaluate_sample(correspondences, sample, params)
        })
        .collect::<Vec<_>>();

    let mut best = BestModel::new();
    for (iteration, candidate) in candidates.into_iter().enumerate() {
        if let Some(candidate) = candidate {
            best.offer(candidate, iteration, params.error_threshold);
        }
    }

    Ok(finalize(correspondences, params, best, evaluated.into_inner()))
}

fn check_input(
    correspondences: &[Correspondence],
    params: &RansacParams,
) -> Result<(), AffineError> {
    params.validate()?;

    if correspondences.len() < SAMPLE_SIZE {
        return Err(AffineError::InsufficientData {
            required: SAMPLE_SIZE,
            actual: correspondences.len(),
        });
    }

    if let Some(index) = correspondences.iter().position(|c| !c.is_finite()) {
        return Err(AffineError::NonFiniteInput { index });
    }

    Ok(())
}

fn should_stop(
    cancel: Option<&AtomicBool>,
    start: Instant,
    max_duration: Option<Duration>,
) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::Relaxed))
        || max_duration.is_some_and(|d| start.elapsed() >= d)
}

// Draw three distinct indices uniformly at random.
fn draw_sample<R: Rng + ?Sized>(rng: &mut R, n: usize) -> [usize; SAMPLE_SIZE] {
    let indices = rand::seq::index::sample(rng, n, SAMPLE_SIZE);
    [indices.index(0), indices.index(1), indices.index(2)]
}

fn evaluate_sample(
    correspondences: &[Correspondence],
    sample: [usize; SAMPLE_SIZE],
    params: &RansacParams,
) -> Option<Hypothesis> {
    let src = sample.map(|i| correspondences[i].src);
    let dst = sample.map(|i| correspondences[i].dst);

    let model = match affine_from_points(&src, &dst) {
        Ok(model) => model,
        Err(e) => {
            log::trace!("Skipping sample {sample:?}: {e}");
            return None;
        }
    };

    // the minimal sample seeds the consensus set
    let mut consensus = sample.to_vec();
    for (i, c) in correspondences.iter().enumerate() {
        if !sample.contains(&i) && reprojection_error(&model, c) < params.error_threshold {
            consensus.push(i);
        }
    }

    if consensus.len() < params.min_consensus {
        return None;
    }

    let max_error = max_reprojection_error(&model, correspondences, &consensus);

    Some(Hypothesis {
        model,
        max_error,
        consensus,
    })
}

fn max_reprojection_error(
    model: &AffineMatrix,
    correspondences: &[Correspondence],
    indices: &[usize],
) -> f64 {
    indices
        .iter()
        .map(|&i| reprojection_error(model, &correspondences[i]))
        .fold(0.0, f64::max)
}

fn finalize(
    correspondences: &[Correspondence],
    params: &RansacParams,
    best: BestModel,
    iterations_run: usize,
) -> Option<RansacResult> {
    let iteration = best.iteration;
    let Some(mut hypothesis) = best.hypothesis else {
        log::debug!("RANSAC found no model after {iterations_run} iterations");
        return None;
    };

    if params.refit_consensus {
        refit(correspondences, &mut hypothesis);
    }

    hypothesis.consensus.sort_unstable();

    log::debug!(
        "RANSAC selected the model of iteration {iteration} after {iterations_run} iterations: {} inliers, max error {:.6}",
        hypothesis.consensus.len(),
        hypothesis.max_error
    );

    Some(RansacResult {
        model: hypothesis.model,
        max_error: hypothesis.max_error,
        consensus: hypothesis.consensus,
        iteration,
        iterations_run,
    })
}

// Least-squares re-estimate over the consensus set, kept only if it is no worse.
fn refit(correspondences: &[Correspondence], hypothesis: &mut Hypothesis) {
    let (src, dst): (Vec<_>, Vec<_>) = hypothesis
        .consensus
        .iter()
        .map(|&i| (correspondences[i].src, correspondences[i].dst))
        .unzip();

    match affine_from_points(&src, &dst) {
        Ok(model) => {
            let max_error = max_reprojection_error(&model, correspondences, &hypothesis.consensus);
            if max_error <= hypothesis.max_error {
                hypothesis.model = model;
                hypothesis.max_error = max_error;
            } else {
                log::debug!(
                    "Discarding consensus refit: max error {max_error:.6} > {:.6}",
                    hypothesis.max_error
                );
            }
        }
        Err(e) => log::debug!("Consensus refit failed: {e}"),
    }
}
