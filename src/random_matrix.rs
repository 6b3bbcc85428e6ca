//! Generation of random matrices for various types

use crate::pivoted_qr::PivotedQR;
use crate::qr::{QRTraits, QR};
use crate::types::Result;
use ndarray::{Array, Array2, Axis};
use num::complex::Complex;
use num::Float;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

pub trait RandomMatrix
where
    Self: PivotedQR,
{
    /// Generate a random Gaussian matrix.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `rng`: The random number generator to use.
    fn random_gaussian<R: Rng + ?Sized>(dimension: (usize, usize), rng: &mut R) -> Array2<Self>;

    /// Generate a random matrix with orthonormal rows or columns.
    ///
    /// If m >= n the returned matrix has orthonormal columns, otherwise
    /// it has orthonormal rows.
    fn random_orthogonal_matrix<R: Rng + ?Sized>(
        dimension: (usize, usize),
        rng: &mut R,
    ) -> Result<Array2<Self>> {
        let (m, n) = dimension;

        // Always factorize a long and skinny matrix.
        let tall = Self::random_gaussian((m.max(n), m.min(n)), rng);
        let q = QR::<Self>::compute_from(tall.view())?.q;

        if n > m {
            Ok(q.t().map(|item| item.conj()))
        } else {
            Ok(q)
        }
    }

    /// Generate a random approximate low-rank matrix.
    ///
    /// The singular values are logarithmically distributed between
    /// `sigma_max` and `sigma_min`.
    ///
    /// # Arguments
    ///
    /// * `dimension`: Tuple (rows, cols) specifying the number of rows and columns.
    /// * `sigma_max`: Maximum singular value.
    /// * `sigma_min`: Minimum singular value.
    /// * `rng`: The random number generator to use.
    fn random_approximate_low_rank_matrix<R: Rng + ?Sized>(
        dimension: (usize, usize),
        sigma_max: f64,
        sigma_min: f64,
        rng: &mut R,
    ) -> Result<Array2<Self>> {
        assert!(
            sigma_min < sigma_max,
            "`sigma_min` must be smaller than `sigma_max`"
        );
        assert!(sigma_min > 0.0, "`sigma_min` must be positive.");

        let min_dim = std::cmp::min(dimension.0, dimension.1);

        let mut u = Self::random_orthogonal_matrix((dimension.0, min_dim), rng)?;
        let vt = Self::random_orthogonal_matrix((min_dim, dimension.1), rng)?;

        let singvals = Array::geomspace(sigma_max, sigma_min, min_dim)
            .map(|arr| arr.to_vec())
            .unwrap_or_default();

        for (mut col, &sigma) in u.axis_iter_mut(Axis(1)).zip(singvals.iter()) {
            col.mapv_inplace(|item| item * Self::from_real(Self::real(sigma)));
        }

        Ok(u.dot(&vt))
    }

    /// Generate a matrix of exact rank `rank` as the product of two Gaussian factors.
    fn random_low_rank_matrix<R: Rng + ?Sized>(
        dimension: (usize, usize),
        rank: usize,
        rng: &mut R,
    ) -> Array2<Self> {
        let left = Self::random_gaussian((dimension.0, rank), rng);
        let right = Self::random_gaussian((rank, dimension.1), rng);

        left.dot(&right)
    }
}

impl RandomMatrix for f64 {
    fn random_gaussian<R: Rng + ?Sized>(dimension: (usize, usize), rng: &mut R) -> Array2<f64> {
        random_gaussian_real::<f64, R>(dimension, rng)
    }
}

impl RandomMatrix for f32 {
    fn random_gaussian<R: Rng + ?Sized>(dimension: (usize, usize), rng: &mut R) -> Array2<f32> {
        random_gaussian_real::<f32, R>(dimension, rng)
    }
}

impl RandomMatrix for Complex<f64> {
    fn random_gaussian<R: Rng + ?Sized>(
        dimension: (usize, usize),
        rng: &mut R,
    ) -> Array2<Complex<f64>> {
        random_gaussian_complex::<f64, R>(dimension, rng)
    }
}

impl RandomMatrix for Complex<f32> {
    fn random_gaussian<R: Rng + ?Sized>(
        dimension: (usize, usize),
        rng: &mut R,
    ) -> Array2<Complex<f32>> {
        random_gaussian_complex::<f32, R>(dimension, rng)
    }
}

fn random_gaussian_real<T: Float, R: Rng + ?Sized>(
    dimension: (usize, usize),
    rng: &mut R,
) -> Array2<T>
where
    StandardNormal: Distribution<T>,
{
    Array2::from_shape_simple_fn(dimension, || StandardNormal.sample(rng))
}

fn random_gaussian_complex<T: Float, R: Rng + ?Sized>(
    dimension: (usize, usize),
    rng: &mut R,
) -> Array2<Complex<T>>
where
    StandardNormal: Distribution<T>,
{
    Array2::from_shape_simple_fn(dimension, || {
        let re = StandardNormal.sample(rng);
        let im = StandardNormal.sample(rng);
        Complex::new(re, im)
    })
}
