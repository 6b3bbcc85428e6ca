//! Repeated CUR trials on a single matrix.
//!
//! Every trial samples columns and rows, reconstructs the matrix from them
//! and evaluates the enabled metrics. The trials are independent. Trial `i`
//! draws its random numbers from stream `i` of a ChaCha8 generator seeded
//! with the experiment seed, so sequential and parallel runs with the same
//! seed produce identical results.

use crate::adaptive::ResidualRowSelector;
use crate::config::CurConfig;
use crate::metrics::{evaluate, MetricFlags, TrialMetrics};
use crate::pivoted_qr::PivotedQR;
use crate::reconstruction::CurApproximation;
use crate::sampling::{draw_sample, AdaptiveRowSelector};
use crate::svd::{LapackSvd, SvdBackend};
use crate::types::{Result, RustyCurError};
use log::{debug, info};
use ndarray::ArrayView2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Result of a single trial.
#[derive(Clone, Debug)]
pub struct TrialResult<R> {
    pub col_ind: Vec<usize>,
    pub row_ind: Vec<usize>,
    pub metrics: TrialMetrics<R>,
    /// Time for sampling the indices and extracting C and R.
    pub construct_time: Duration,
    /// Time for the factorizations, the core SVD and the metrics.
    pub metric_computing_time: Duration,
}

/// Results of all trials of an experiment, stored by quantity.
///
/// Entry `i` of every sequence belongs to trial `i`. The sequence of a
/// metric exists only if the metric was enabled.
#[derive(Clone, Debug, Serialize)]
pub struct CurTrials<R> {
    /// Base seed of the per-trial random streams, if the run was seeded.
    pub seed: Option<u64>,
    pub col_indices: Vec<Vec<usize>>,
    pub row_indices: Vec<Vec<usize>>,
    pub sigma_k: Option<Vec<R>>,
    pub froerr: Option<Vec<R>>,
    pub froerr_k: Option<Vec<R>>,
    pub specerr: Option<Vec<R>>,
    pub specerr_k: Option<Vec<R>>,
    pub construct_time: Vec<Duration>,
    pub metric_computing_time: Vec<Duration>,
}

impl<R> CurTrials<R> {
    pub fn new(flags: &MetricFlags, seed: Option<u64>) -> Self {
        let sequence = |enabled: bool| if enabled { Some(Vec::new()) } else { None };

        Self {
            seed,
            col_indices: Vec::new(),
            row_indices: Vec::new(),
            sigma_k: sequence(flags.sigma_k),
            froerr: sequence(flags.froerr),
            froerr_k: sequence(flags.froerr_k),
            specerr: sequence(flags.specerr),
            specerr_k: sequence(flags.specerr_k),
            construct_time: Vec::new(),
            metric_computing_time: Vec::new(),
        }
    }

    /// Append the result of the next trial.
    ///
    /// Every enabled metric must carry a value. Otherwise nothing is
    /// appended, so all sequences keep the same length.
    pub fn push(&mut self, trial: TrialResult<R>) -> Result<()> {
        let metrics = trial.metrics;

        let slots = [
            ("sigma_k", self.sigma_k.is_some(), metrics.sigma_k.is_some()),
            ("froerr", self.froerr.is_some(), metrics.froerr.is_some()),
            ("froerr_k", self.froerr_k.is_some(), metrics.froerr_k.is_some()),
            ("specerr", self.specerr.is_some(), metrics.specerr.is_some()),
            ("specerr_k", self.specerr_k.is_some(), metrics.specerr_k.is_some()),
        ];
        if let Some(&(metric, _, _)) = slots
            .iter()
            .find(|&&(_, enabled, present)| enabled && !present)
        {
            return Err(RustyCurError::MissingMetric { metric });
        }

        fn append<R>(sequence: &mut Option<Vec<R>>, value: Option<R>) {
            if let (Some(sequence), Some(value)) = (sequence.as_mut(), value) {
                sequence.push(value);
            }
        }

        append(&mut self.sigma_k, metrics.sigma_k);
        append(&mut self.froerr, metrics.froerr);
        append(&mut self.froerr_k, metrics.froerr_k);
        append(&mut self.specerr, metrics.specerr);
        append(&mut self.specerr_k, metrics.specerr_k);

        self.col_indices.push(trial.col_ind);
        self.row_indices.push(trial.row_ind);
        self.construct_time.push(trial.construct_time);
        self.metric_computing_time.push(trial.metric_computing_time);

        Ok(())
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.col_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.col_indices.is_empty()
    }
}

/// Driver for repeated CUR trials.
///
/// The row selector is only used if the configuration enables adaptive
/// sampling. All SVDs of the reconstruction and the metrics go through the
/// backend.
pub struct CurExperiment<S = ResidualRowSelector, B = LapackSvd> {
    config: CurConfig,
    selector: S,
    backend: B,
}

impl CurExperiment {
    pub fn new(config: CurConfig) -> Self {
        Self {
            config,
            selector: ResidualRowSelector::default(),
            backend: LapackSvd,
        }
    }
}

impl<S, B> CurExperiment<S, B> {
    pub fn with_selector<T>(self, selector: T) -> CurExperiment<T, B> {
        CurExperiment {
            config: self.config,
            selector,
            backend: self.backend,
        }
    }

    pub fn with_backend<T>(self, backend: T) -> CurExperiment<S, T> {
        CurExperiment {
            config: self.config,
            selector: self.selector,
            backend,
        }
    }

    pub fn config(&self) -> &CurConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run all trials one after another.
    pub fn run<A>(&self, mat: ArrayView2<A>) -> Result<CurTrials<A::Real>>
    where
        A: PivotedQR,
        S: AdaptiveRowSelector<A>,
        B: SvdBackend<A>,
    {
        self.config.validate(mat.dim())?;
        let seed = self.base_seed();
        self.log_start(mat.dim(), Some(seed));

        let start = Instant::now();
        let mut trials = CurTrials::new(&self.config.metrics, Some(seed));

        for index in 0..self.config.num_trials {
            let trial = self.run_trial(mat, &mut trial_rng(seed, index))?;
            log_trial(index, &trial);
            trials.push(trial)?;
        }

        info!("Finished {} trials in {:?}", trials.len(), start.elapsed());
        Ok(trials)
    }

    /// Run all trials on the rayon thread pool.
    ///
    /// Each trial uses the same random stream as in [`CurExperiment::run`],
    /// and the results are stored in trial order.
    pub fn run_parallel<A>(&self, mat: ArrayView2<A>) -> Result<CurTrials<A::Real>>
    where
        A: PivotedQR + Send + Sync,
        A::Real: Send,
        S: AdaptiveRowSelector<A> + Sync,
        B: SvdBackend<A> + Sync,
    {
        self.config.validate(mat.dim())?;
        let seed = self.base_seed();
        self.log_start(mat.dim(), Some(seed));

        let start = Instant::now();
        let results = (0..self.config.num_trials)
            .into_par_iter()
            .map(|index| self.run_trial(mat, &mut trial_rng(seed, index)))
            .collect::<Result<Vec<_>>>()?;

        let mut trials = CurTrials::new(&self.config.metrics, Some(seed));
        for (index, trial) in results.into_iter().enumerate() {
            log_trial(index, &trial);
            trials.push(trial)?;
        }

        info!(
            "Finished {} parallel trials in {:?}",
            trials.len(),
            start.elapsed()
        );
        Ok(trials)
    }

    /// Run all trials one after another, drawing every random number from `rng`.
    ///
    /// The configured seed is ignored.
    pub fn run_with_rng<A, R>(&self, mat: ArrayView2<A>, rng: &mut R) -> Result<CurTrials<A::Real>>
    where
        A: PivotedQR,
        S: AdaptiveRowSelector<A>,
        B: SvdBackend<A>,
        R: Rng + ?Sized,
    {
        self.config.validate(mat.dim())?;
        self.log_start(mat.dim(), None);

        let start = Instant::now();
        let mut trials = CurTrials::new(&self.config.metrics, None);

        for index in 0..self.config.num_trials {
            let trial = self.run_trial(mat, rng)?;
            log_trial(index, &trial);
            trials.push(trial)?;
        }

        info!("Finished {} trials in {:?}", trials.len(), start.elapsed());
        Ok(trials)
    }

    /// Run a single trial. The configuration must have been validated for `mat`.
    pub fn run_trial<A, R>(&self, mat: ArrayView2<A>, rng: &mut R) -> Result<TrialResult<A::Real>>
    where
        A: PivotedQR,
        S: AdaptiveRowSelector<A>,
        B: SvdBackend<A>,
        R: Rng + ?Sized,
    {
        let flags = &self.config.metrics;

        let start = Instant::now();
        let sample = draw_sample(mat, &self.config, &self.selector, rng)?;
        let construct_time = start.elapsed();

        let start = Instant::now();
        let approx = CurApproximation::compute(
            mat,
            sample.c.view(),
            sample.r.view(),
            self.config.rank,
            flags.needs_core_svd(),
            &self.backend,
        )?;
        let metrics = evaluate(mat, &approx, flags, &self.backend)?;
        let metric_computing_time = start.elapsed();

        Ok(TrialResult {
            col_ind: sample.col_ind,
            row_ind: sample.row_ind,
            metrics,
            construct_time,
            metric_computing_time,
        })
    }

    fn base_seed(&self) -> u64 {
        self.config
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen())
    }

    fn log_start(&self, shape: (usize, usize), seed: Option<u64>) {
        let config = &self.config;
        info!(
            "Running {} CUR trials on a {}x{} matrix: k = {}, c = {}, r = {}, adaptive = {}, seed = {:?}",
            config.num_trials, shape.0, shape.1, config.rank, config.num_cols, config.num_rows, config.adaptive, seed
        );
    }
}

/// Random source of trial `index` for the base `seed`.
pub fn trial_rng(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

fn log_trial<R: std::fmt::Debug>(index: usize, trial: &TrialResult<R>) {
    debug!(
        "Trial {}: construct {:?}, metrics {:?}, {:?}",
        index, trial.construct_time, trial.metric_computing_time, trial.metrics
    );
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::random_matrix::RandomMatrix;
    use rand::RngCore;

    fn trial_with(metrics: TrialMetrics<f64>) -> TrialResult<f64> {
        TrialResult {
            col_ind: vec![0, 1],
            row_ind: vec![2, 3],
            metrics,
            construct_time: Duration::from_millis(1),
            metric_computing_time: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_trial_missing_an_enabled_metric_is_rejected() {
        let flags = MetricFlags {
            froerr: true,
            specerr_k: true,
            ..MetricFlags::none()
        };
        let mut trials = CurTrials::new(&flags, None);

        let complete = TrialMetrics {
            froerr: Some(0.5),
            specerr_k: Some(0.25),
            ..TrialMetrics::default()
        };
        trials.push(trial_with(complete)).unwrap();

        let incomplete = TrialMetrics {
            froerr: Some(0.5),
            ..TrialMetrics::default()
        };
        let result = trials.push(trial_with(incomplete));

        assert!(matches!(
            result,
            Err(RustyCurError::MissingMetric { metric: "specerr_k" })
        ));
        assert_eq!(trials.len(), 1);
        assert_eq!(trials.froerr.as_ref().map(Vec::len), Some(1));
        assert_eq!(trials.construct_time.len(), 1);
    }

    #[test]
    fn test_trials_serialize_enabled_metrics_only() {
        let flags = MetricFlags {
            sigma_k: true,
            ..MetricFlags::none()
        };
        let mut trials = CurTrials::new(&flags, Some(3));
        let metrics = TrialMetrics {
            sigma_k: Some(0.125),
            ..TrialMetrics::default()
        };
        trials.push(trial_with(metrics)).unwrap();

        let value = serde_json::to_value(&trials).unwrap();

        assert_eq!(value["seed"], 3);
        assert_eq!(value["col_indices"], serde_json::json!([[0, 1]]));
        assert_eq!(value["row_indices"], serde_json::json!([[2, 3]]));
        assert_eq!(value["sigma_k"], serde_json::json!([0.125]));
        assert!(value["froerr"].is_null());
        assert!(value["specerr_k"].is_null());
        assert_eq!(value["construct_time"][0]["nanos"], 1_000_000);
        assert_eq!(value["metric_computing_time"][0]["nanos"], 2_000_000);
    }

    #[test]
    fn test_trial_rngs_are_independent_streams() {
        let first = trial_rng(5, 0).next_u64();
        let second = trial_rng(5, 1).next_u64();

        assert_ne!(first, second);
        assert_eq!(first, trial_rng(5, 0).next_u64());
    }

    #[test]
    fn test_trials_collect_enabled_metrics_only() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((15, 12), &mut rng);

        let flags = MetricFlags {
            sigma_k: true,
            froerr_k: true,
            ..MetricFlags::none()
        };
        let config = CurConfig::new(2, 5, 5, 4).with_metrics(flags).with_seed(1);
        let trials = CurExperiment::new(config).run(mat.view()).unwrap();

        assert_eq!(trials.len(), 4);
        assert_eq!(trials.seed, Some(1));
        assert_eq!(trials.sigma_k.as_ref().map(Vec::len), Some(4));
        assert_eq!(trials.froerr_k.as_ref().map(Vec::len), Some(4));
        assert!(trials.froerr.is_none() && trials.specerr.is_none() && trials.specerr_k.is_none());
        assert_eq!(trials.construct_time.len(), 4);
        assert_eq!(trials.metric_computing_time.len(), 4);
        assert!(trials.row_indices.iter().all(|rows| rows.len() == 5));
    }

    #[test]
    fn test_invalid_configuration_runs_no_trial() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 5), &mut rng);

        let config = CurConfig::new(2, 5, 3, 3).with_metrics(MetricFlags::all());
        let result = CurExperiment::new(config).run(mat.view());

        assert!(matches!(result, Err(RustyCurError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_unseeded_run_records_its_seed() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((10, 10), &mut rng);

        let config = CurConfig::new(2, 3, 3, 2).with_metrics(MetricFlags::all());
        let experiment = CurExperiment::new(config.clone());
        let trials = experiment.run(mat.view()).unwrap();
        let seed = trials.seed.unwrap();

        let rerun = CurExperiment::new(config.with_seed(seed)).run(mat.view()).unwrap();
        assert_eq!(trials.col_indices, rerun.col_indices);
        assert_eq!(trials.row_indices, rerun.row_indices);
        assert_eq!(trials.froerr, rerun.froerr);
    }
}
