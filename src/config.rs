//! Configuration of a CUR sampling experiment.

use crate::metrics::MetricFlags;
use crate::types::{Result, RustyCurError};
use serde::{Deserialize, Serialize};

/// Parameters of a CUR experiment.
///
/// The matrix itself is supplied separately to
/// [`CurExperiment::run`](crate::experiment::CurExperiment::run) so that one
/// configuration can be reused for several inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurConfig {
    /// Target rank k of the truncated reconstruction.
    #[serde(alias = "k")]
    pub rank: usize,
    /// Number c of sampled columns.
    #[serde(alias = "c")]
    pub num_cols: usize,
    /// Number r of sampled rows. Equals `num_cols` unless `adaptive` is set.
    #[serde(alias = "r")]
    pub num_rows: usize,
    /// Number q of independent trials.
    #[serde(alias = "q")]
    pub num_trials: usize,
    /// Enlarge the uniformly sampled rows with the adaptive row selector.
    #[serde(default)]
    pub adaptive: bool,
    /// Metrics evaluated in every trial. None are enabled by default.
    #[serde(default)]
    pub metrics: MetricFlags,
    /// Base seed of the per-trial random streams. A fresh seed is drawn if absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl CurConfig {
    pub fn new(rank: usize, num_cols: usize, num_rows: usize, num_trials: usize) -> Self {
        Self {
            rank,
            num_cols,
            num_rows,
            num_trials,
            adaptive: false,
            metrics: MetricFlags::default(),
            seed: None,
        }
    }

    pub fn with_adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricFlags) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of rows the adaptive selector has to add to the initial sample.
    pub fn extra_rows(&self) -> usize {
        if self.adaptive {
            self.num_rows.saturating_sub(self.num_cols)
        } else {
            0
        }
    }

    /// Check the configuration against the shape `(m, n)` of the input matrix.
    ///
    /// A target rank above `min(c, r)` is accepted here; it is reported as a
    /// [`RustyCurError::RankError`] by the reconstruction.
    pub fn validate(&self, shape: (usize, usize)) -> Result<()> {
        let (m, n) = shape;

        let invalid = |msg: String| Err(RustyCurError::InvalidConfiguration(msg));

        if m == 0 || n == 0 {
            return invalid(format!("Matrix of shape {}x{} is empty", m, n));
        }
        if self.num_trials == 0 {
            return invalid("At least one trial is required".to_string());
        }
        if self.rank == 0 || self.rank > m.min(n) {
            return invalid(format!(
                "Target rank {} must lie in [1, {}]",
                self.rank,
                m.min(n)
            ));
        }
        if self.num_cols == 0 || self.num_cols > n {
            return invalid(format!(
                "Number of sampled columns {} must lie in [1, {}]",
                self.num_cols, n
            ));
        }
        if self.num_cols > m {
            return invalid(format!(
                "Number of sampled columns {} exceeds the {} rows available for the initial row sample",
                self.num_cols, m
            ));
        }

        if self.adaptive {
            if self.num_rows < self.num_cols || self.num_rows > m {
                return invalid(format!(
                    "Adaptive sampling needs {} <= r <= {}, got r = {}",
                    self.num_cols, m, self.num_rows
                ));
            }
        } else if self.num_rows != self.num_cols {
            return invalid(format!(
                "Uniform sampling needs r = c, got r = {} and c = {}",
                self.num_rows, self.num_cols
            ));
        }

        Ok(())
    }
}
