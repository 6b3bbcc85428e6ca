//! Define an SVD container and the backend used for all SVD work.
//!
//! Every singular value computation in the reconstruction and metrics
//! stages goes through [`SvdBackend`]. The default [`LapackSvd`] uses the
//! divide and conquer Lapack driver, with the singular vectors skipped when
//! only singular values are needed. Spectral norms only need the largest
//! singular value and are computed by a power iteration on $A^HA$.

use crate::types::{Lapack, Result, RustyCurError, Scalar};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use ndarray_linalg::{JobSvd, Norm, SVDDCInto};
use num::{Float, ToPrimitive, Zero};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Iteration limit of [`power_iteration_norm`].
pub const POWER_ITERATION_MAX_ITER: usize = 10_000;

/// Fixed seed of the start vector, so that norms are reproducible.
const POWER_ITERATION_SEED: u64 = 0x5eed;

pub struct SVD<A: Scalar> {
    /// The U matrix
    pub u: Array2<A>,
    /// The array of singular values
    pub s: Array1<A::Real>,
    /// The vt matrix
    pub vt: Array2<A>,
}

impl<A: Scalar> SVD<A> {
    /// Number of singular triplets.
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Multiply out U * diag(s) * V^H.
    pub fn to_mat(&self) -> Array2<A> {
        let mut scaled_u = self.u.clone();

        for (mut col, &sigma) in scaled_u.axis_iter_mut(Axis(1)).zip(self.s.iter()) {
            col.mapv_inplace(|item| item * A::from_real(sigma));
        }

        scaled_u.dot(&self.vt)
    }

    /// Keep the `rank` dominant singular triplets.
    ///
    /// Unlike a tolerance based compression this never silently truncates
    /// the target: asking for more triplets than are available is a
    /// [`RustyCurError::RankError`].
    pub fn compress_rank(self, rank: usize) -> Result<SVD<A>> {
        if rank > self.s.len() {
            return Err(RustyCurError::RankError {
                rank,
                available: self.s.len(),
            });
        }

        Ok(SVD {
            u: self.u.slice_move(s![.., 0..rank]),
            s: self.s.slice_move(s![0..rank]),
            vt: self.vt.slice_move(s![0..rank, ..]),
        })
    }
}

pub trait SvdBackend<A: Scalar + Lapack> {
    /// Thin SVD with singular values in descending order.
    fn thin_svd(&self, mat: ArrayView2<A>) -> Result<SVD<A>>;

    /// Singular values only, in descending order.
    fn singular_values(&self, mat: ArrayView2<A>) -> Result<Array1<A::Real>>;

    /// Largest singular value, zero for an empty matrix.
    ///
    /// Only the dominant singular value is extracted; no decomposition of
    /// `mat` is formed.
    fn spectral_norm(&self, mat: ArrayView2<A>) -> Result<A::Real> {
        power_iteration_norm(mat, POWER_ITERATION_MAX_ITER)
    }
}

/// Largest singular value of `mat` by a power iteration on $A^HA$.
///
/// The estimate $\|Ax\|$ for the normalized iterate $x$ increases
/// monotonically. The iteration stops once two consecutive estimates agree
/// to a few units of rounding, and fails with
/// [`RustyCurError::NotConverged`] after `max_iter` steps.
pub fn power_iteration_norm<A: Scalar + Lapack>(
    mat: ArrayView2<A>,
    max_iter: usize,
) -> Result<A::Real> {
    if mat.is_empty() {
        return Ok(<A::Real as Zero>::zero());
    }

    let eps = <A::Real as Float>::epsilon().to_f64().unwrap_or(f64::EPSILON);
    let tol = 32.0 * eps;

    let mut rng = ChaCha8Rng::seed_from_u64(POWER_ITERATION_SEED);
    let mut x: Array1<A> = (0..mat.ncols())
        .map(|_| {
            let value: f64 = StandardNormal.sample(&mut rng);
            A::from_real(A::real(value))
        })
        .collect();

    let adjoint = mat.t().map(|item| item.conj());
    let mut sigma = <A::Real as Zero>::zero();

    for _ in 0..max_iter {
        let norm = x.norm_l2();
        if norm.is_zero() {
            return Ok(sigma);
        }
        x.mapv_inplace(|item| item / A::from_real(norm));

        let y = mat.dot(&x);
        let next = y.norm_l2();

        let change = (next - sigma).to_f64().unwrap_or(0.0).abs();
        if change <= tol * next.to_f64().unwrap_or(0.0) {
            return Ok(next);
        }

        sigma = next;
        x = adjoint.dot(&y);
    }

    Err(RustyCurError::NotConverged {
        routine: "power iteration",
        iterations: max_iter,
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LapackSvd;

impl<A: Scalar + Lapack> SvdBackend<A> for LapackSvd {
    fn thin_svd(&self, mat: ArrayView2<A>) -> Result<SVD<A>> {
        let (u, s, vt) = mat.to_owned().svddc_into(JobSvd::Some)?;

        match (u, vt) {
            (Some(u), Some(vt)) => Ok(SVD { u, s, vt }),
            _ => Err(RustyCurError::LapackFailure {
                routine: "gesdd",
                info: -1,
            }),
        }
    }

    fn singular_values(&self, mat: ArrayView2<A>) -> Result<Array1<A::Real>> {
        if mat.is_empty() {
            return Ok(Array1::zeros(0));
        }

        let (_, s, _) = mat.to_owned().svddc_into(JobSvd::None)?;
        Ok(s)
    }
}
