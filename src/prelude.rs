//! Collect all traits and other exports here.

pub use crate::adaptive::ResidualRowSelector;
pub use crate::config::CurConfig;
pub use crate::experiment::{trial_rng, CurExperiment, CurTrials, TrialResult};
pub use crate::metrics::{evaluate, MetricFlags, TrialMetrics};
pub use crate::pivoted_qr::PivotedQR;
pub use crate::qr::{LQTraits, QRTraits, LQ, QR};
pub use crate::random_matrix::RandomMatrix;
pub use crate::reconstruction::CurApproximation;
pub use crate::sampling::{draw_sample, sample_indices, AdaptiveRowSelector, CurSample};
pub use crate::svd::{power_iteration_norm, LapackSvd, SvdBackend, SVD};
pub use crate::types::{c32, c64, Lapack, RelDiff, Result, RustyCurError, Scalar};
