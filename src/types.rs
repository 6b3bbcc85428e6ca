//! Error type, result alias and small numeric helpers shared by all modules.

use ndarray::{ArrayView1, ArrayView2};
use ndarray_linalg::error::LinalgError;
use ndarray_linalg::Norm;
use ndarray_linalg::OperationNorm;
use thiserror::Error;

pub use ndarray_linalg::{c32, c64, Lapack, Scalar};

#[derive(Error, Debug)]
pub enum RustyCurError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Target rank {rank} exceeds the rank {available} available from the sampled core matrix")]
    RankError { rank: usize, available: usize },
    #[error("Lapack Error: {0}")]
    NumericalFailure(#[from] LinalgError),
    #[error("Lapack routine {routine} failed with info = {info}")]
    LapackFailure { routine: &'static str, info: i32 },
    #[error("Incompatible memory layout")]
    LayoutError,
    #[error("Adaptive row selection returned an invalid row set: {0}")]
    InvalidSelection(String),
    #[error("{routine} did not converge within {iterations} iterations")]
    NotConverged {
        routine: &'static str,
        iterations: usize,
    },
    #[error("Metric `{metric}` was requested but not computed")]
    MissingMetric { metric: &'static str },
}

impl RustyCurError {
    /// True for the errors raised by a failing factorization or SVD.
    pub fn is_numerical_failure(&self) -> bool {
        matches!(
            self,
            RustyCurError::NumericalFailure(_)
                | RustyCurError::LapackFailure { .. }
                | RustyCurError::NotConverged { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RustyCurError>;

pub trait RelDiff {
    type A: Scalar;

    /// Return the relative Frobenius norm difference of `first` and `second`.
    fn rel_diff_fro(
        first: ArrayView2<Self::A>,
        second: ArrayView2<Self::A>,
    ) -> Result<<<Self as RelDiff>::A as Scalar>::Real>;

    /// Return the relative l2 vector norm difference of `first` and `second`.
    fn rel_diff_l2(
        first: ArrayView1<Self::A>,
        second: ArrayView1<Self::A>,
    ) -> <<Self as RelDiff>::A as Scalar>::Real;
}

macro_rules! rel_diff_impl {
    ($scalar:ty) => {
        impl RelDiff for $scalar {
            type A = $scalar;
            fn rel_diff_fro(
                first: ArrayView2<Self::A>,
                second: ArrayView2<Self::A>,
            ) -> Result<<<Self as RelDiff>::A as Scalar>::Real> {
                let diff = first.to_owned() - &second;
                Ok(diff.opnorm_fro()? / second.opnorm_fro()?)
            }

            fn rel_diff_l2(
                first: ArrayView1<Self::A>,
                second: ArrayView1<Self::A>,
            ) -> <<Self as RelDiff>::A as Scalar>::Real {
                let diff = first.to_owned() - &second;
                diff.norm_l2() / second.norm_l2()
            }
        }
    };
}

rel_diff_impl!(f32);
rel_diff_impl!(f64);
rel_diff_impl!(c32);
rel_diff_impl!(c64);
