//! Accuracy metrics of a CUR approximation.
//!
//! Each metric is behind its own flag. A disabled metric is not computed at
//! all, and the reconstructions $CUR$ and $CUR_k$ are only formed when an
//! enabled metric needs them.

use crate::pivoted_qr::PivotedQR;
use crate::reconstruction::CurApproximation;
use crate::svd::SvdBackend;
use crate::types::{Result, RustyCurError};
use ndarray::ArrayView2;
use ndarray_linalg::OperationNorm;
use serde::{Deserialize, Serialize};

/// Selection of the metrics computed in every trial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricFlags {
    /// Smallest retained singular value of the core matrix.
    pub sigma_k: bool,
    /// Frobenius norm of $A - CUR$.
    pub froerr: bool,
    /// Frobenius norm of $A - CUR_k$.
    pub froerr_k: bool,
    /// Spectral norm of $A - CUR$.
    pub specerr: bool,
    /// Spectral norm of $A - CUR_k$.
    pub specerr_k: bool,
}

impl MetricFlags {
    pub fn all() -> Self {
        Self {
            sigma_k: true,
            froerr: true,
            froerr_k: true,
            specerr: true,
            specerr_k: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// True if the full reconstruction $CUR$ is needed.
    pub fn needs_full(&self) -> bool {
        self.froerr || self.specerr
    }

    /// True if the rank k reconstruction $CUR_k$ is needed.
    pub fn needs_truncated(&self) -> bool {
        self.froerr_k || self.specerr_k
    }

    /// True if the SVD of the core matrix is needed.
    pub fn needs_core_svd(&self) -> bool {
        self.sigma_k || self.needs_truncated()
    }
}

/// Metric values of one trial. Disabled metrics are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TrialMetrics<R> {
    pub sigma_k: Option<R>,
    pub froerr: Option<R>,
    pub froerr_k: Option<R>,
    pub specerr: Option<R>,
    pub specerr_k: Option<R>,
}

/// Evaluate the metrics selected by `flags` for the approximation `approx` of `mat`.
///
/// The core SVD of `approx` must have been computed if `flags` needs it,
/// otherwise [`RustyCurError::MissingMetric`] names the first metric that
/// cannot be evaluated.
pub fn evaluate<A, B>(
    mat: ArrayView2<A>,
    approx: &CurApproximation<A>,
    flags: &MetricFlags,
    backend: &B,
) -> Result<TrialMetrics<A::Real>>
where
    A: PivotedQR,
    B: SvdBackend<A>,
{
    let mut metrics = TrialMetrics {
        sigma_k: None,
        froerr: None,
        froerr_k: None,
        specerr: None,
        specerr_k: None,
    };

    if flags.needs_core_svd() && approx.core_svd.is_none() {
        let metric = if flags.sigma_k {
            "sigma_k"
        } else if flags.froerr_k {
            "froerr_k"
        } else {
            "specerr_k"
        };
        return Err(RustyCurError::MissingMetric { metric });
    }

    if flags.sigma_k {
        metrics.sigma_k = approx.sigma_k();
    }

    if flags.needs_full() {
        let residual = &mat - &approx.to_mat();

        if flags.froerr {
            metrics.froerr = Some(residual.opnorm_fro()?);
        }
        if flags.specerr {
            metrics.specerr = Some(backend.spectral_norm(residual.view())?);
        }
    }

    if flags.needs_truncated() {
        if let Some(truncated) = approx.to_mat_truncated() {
            let residual = &mat - &truncated;

            if flags.froerr_k {
                metrics.froerr_k = Some(residual.opnorm_fro()?);
            }
            if flags.specerr_k {
                metrics.specerr_k = Some(backend.spectral_norm(residual.view())?);
            }
        }
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::random_matrix::RandomMatrix;
    use crate::sampling::sample_indices;
    use crate::svd::{LapackSvd, SVD};
    use ndarray::{Array1, Axis};
    use std::cell::Cell;

    /// Counts the decompositions and spectral norms forwarded to Lapack.
    #[derive(Default)]
    struct CountingSvd {
        decompositions: Cell<usize>,
        norms: Cell<usize>,
    }

    impl SvdBackend<f64> for CountingSvd {
        fn thin_svd(&self, mat: ArrayView2<f64>) -> Result<SVD<f64>> {
            self.decompositions.set(self.decompositions.get() + 1);
            LapackSvd.thin_svd(mat)
        }

        fn singular_values(&self, mat: ArrayView2<f64>) -> Result<Array1<f64>> {
            self.decompositions.set(self.decompositions.get() + 1);
            LapackSvd.singular_values(mat)
        }

        fn spectral_norm(&self, mat: ArrayView2<f64>) -> Result<f64> {
            self.norms.set(self.norms.get() + 1);
            LapackSvd.spectral_norm(mat)
        }
    }

    fn approximation(
        mat: ArrayView2<f64>,
        ncols: usize,
        nrows: usize,
        rank: usize,
    ) -> CurApproximation<f64> {
        let mut rng = rand::thread_rng();
        let c = mat.select(Axis(1), &sample_indices(mat.ncols(), ncols, &mut rng).unwrap());
        let r = mat.select(Axis(0), &sample_indices(mat.nrows(), nrows, &mut rng).unwrap());

        CurApproximation::compute(mat, c.view(), r.view(), rank, true, &LapackSvd).unwrap()
    }

    #[test]
    fn test_flag_requirements() {
        let flags = MetricFlags::none();
        assert!(!flags.needs_full() && !flags.needs_truncated() && !flags.needs_core_svd());

        let flags = MetricFlags {
            sigma_k: true,
            ..MetricFlags::none()
        };
        assert!(flags.needs_core_svd() && !flags.needs_truncated());

        let flags = MetricFlags {
            specerr_k: true,
            ..MetricFlags::none()
        };
        assert!(flags.needs_core_svd() && flags.needs_truncated() && !flags.needs_full());
    }

    #[test]
    fn test_disabled_metrics_are_absent_and_not_computed() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((20, 15), &mut rng);
        let approx = approximation(mat.view(), 6, 6, 3);

        let backend = CountingSvd::default();
        let metrics = evaluate(mat.view(), &approx, &MetricFlags::none(), &backend).unwrap();

        assert_eq!(metrics, TrialMetrics::default());
        assert_eq!(backend.decompositions.get(), 0);
        assert_eq!(backend.norms.get(), 0);

        let flags = MetricFlags {
            froerr: true,
            specerr_k: true,
            ..MetricFlags::none()
        };
        let metrics = evaluate(mat.view(), &approx, &flags, &backend).unwrap();

        assert!(metrics.froerr.is_some() && metrics.specerr_k.is_some());
        assert!(metrics.sigma_k.is_none() && metrics.froerr_k.is_none() && metrics.specerr.is_none());
        assert_eq!(backend.decompositions.get(), 0);
        assert_eq!(backend.norms.get(), 1);
    }

    #[test]
    fn test_metrics_without_core_svd_are_rejected() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((12, 10), &mut rng);
        let c = mat.select(Axis(1), &[0, 3, 5, 7]);
        let r = mat.select(Axis(0), &[1, 2, 8, 11]);
        let approx = CurApproximation::compute(mat.view(), c.view(), r.view(), 2, false, &LapackSvd).unwrap();

        let result = evaluate(mat.view(), &approx, &MetricFlags::all(), &LapackSvd);
        assert!(matches!(
            result,
            Err(RustyCurError::MissingMetric { metric: "sigma_k" })
        ));

        let flags = MetricFlags {
            specerr_k: true,
            ..MetricFlags::none()
        };
        let result = evaluate(mat.view(), &approx, &flags, &LapackSvd);
        assert!(matches!(
            result,
            Err(RustyCurError::MissingMetric { metric: "specerr_k" })
        ));

        // Metrics of the full reconstruction need no core SVD.
        let flags = MetricFlags {
            froerr: true,
            specerr: true,
            ..MetricFlags::none()
        };
        let metrics = evaluate(mat.view(), &approx, &flags, &LapackSvd).unwrap();
        assert!(metrics.froerr.is_some() && metrics.specerr.is_some());
    }

    #[test]
    fn test_truncation_does_not_decrease_frobenius_error() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_approximate_low_rank_matrix((40, 30), 1.0, 1E-6, &mut rng).unwrap();

        for &rank in &[1, 4, 8, 12] {
            let approx = approximation(mat.view(), 12, 12, rank);
            let metrics = evaluate(mat.view(), &approx, &MetricFlags::all(), &LapackSvd).unwrap();

            let froerr = metrics.froerr.unwrap();
            let froerr_k = metrics.froerr_k.unwrap();
            assert!(froerr_k >= froerr - 1E-12);
        }
    }

    #[test]
    fn test_rank_k_spectral_error_respects_best_approximation_bound() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_approximate_low_rank_matrix((40, 30), 1.0, 1E-6, &mut rng).unwrap();
        let sigma = LapackSvd.singular_values(mat.view()).unwrap();

        let rank = 5;
        let approx = approximation(mat.view(), 10, 10, rank);
        let metrics = evaluate(mat.view(), &approx, &MetricFlags::all(), &LapackSvd).unwrap();

        // No rank k matrix is closer to A than the truncated SVD.
        assert!(metrics.specerr_k.unwrap() >= sigma[rank] * (1.0 - 1E-8));
        assert!(metrics.froerr_k.unwrap() >= metrics.specerr_k.unwrap() * (1.0 - 1E-8));
        assert_eq!(metrics.sigma_k, approx.sigma_k());
    }

    #[test]
    fn test_full_sample_has_zero_error() {
        let mut rng = rand::thread_rng();
        let mat = f64::random_gaussian((12, 10), &mut rng);
        let approx = approximation(mat.view(), 10, 12, 10);

        let metrics = evaluate(mat.view(), &approx, &MetricFlags::all(), &LapackSvd).unwrap();

        assert!(metrics.froerr.unwrap() < 1E-12);
        assert!(metrics.specerr.unwrap() < 1E-12);
        assert!(metrics.froerr_k.unwrap() < 1E-12);
    }
}
