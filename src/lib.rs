//! Randomized CUR approximations of dense matrices.
//!
//! A CUR approximation samples `c` columns and `r` rows of a matrix $A$ and
//! reconstructs $A$ from orthonormal bases of the sampled columns and rows.
//! [`CurExperiment`] repeats this for a number of independent trials and
//! collects index sets, error metrics and timings of every trial.

pub mod adaptive;
pub mod config;
pub mod experiment;
pub mod metrics;
pub mod prelude;
pub mod qr;
pub mod random_matrix;
pub mod reconstruction;
pub mod sampling;
pub mod svd;
pub mod types;

pub(crate) mod pivoted_qr;

pub use adaptive::ResidualRowSelector;
pub use config::CurConfig;
pub use experiment::{CurExperiment, CurTrials, TrialResult};
pub use metrics::{MetricFlags, TrialMetrics};
pub use pivoted_qr::PivotedQR;
pub use qr::{LQTraits, QRTraits, LQ, QR};
pub use random_matrix::RandomMatrix;
pub use reconstruction::CurApproximation;
pub use sampling::{AdaptiveRowSelector, CurSample};
pub use svd::{power_iteration_norm, LapackSvd, SvdBackend, SVD};
pub use types::{Result, RustyCurError};
