//! This module implements QR with pivoting by calling into the
//! corresponding Lapack routines. Pivoted QR is currently not
//! implemented in ndarray-linalg, making this module necessary.

use crate::qr::QR;
use crate::types::{Lapack, Result, RustyCurError, Scalar};
use ndarray::{s, Array1, Array2, ArrayView2, ShapeBuilder};
use num::traits::{ToPrimitive, Zero};

pub trait PivotedQR
where
    Self: Scalar + Lapack,
{
    /// Compute the column pivoted QR decomposition of `arr`.
    fn pivoted_qr(arr: ArrayView2<Self>) -> Result<QR<Self>> {
        let m = arr.nrows();
        let n = arr.ncols();
        let k = m.min(n);

        if k == 0 {
            return Ok(QR {
                q: Array2::<Self>::zeros((m, 0)),
                r: Array2::<Self>::zeros((0, n)),
                ind: (0..n).collect(),
            });
        }

        let mut mat = Array2::<Self>::zeros((m, n).f());
        mat.assign(&arr);

        let mut jpvt = vec![0_i32; n];
        let mut tau = vec![Self::zero(); k];

        {
            let data = mat
                .as_slice_memory_order_mut()
                .ok_or(RustyCurError::LayoutError)?;
            Self::geqp3(m as i32, n as i32, data, &mut jpvt, &mut tau).map_err(|info| {
                RustyCurError::LapackFailure {
                    routine: "geqp3",
                    info,
                }
            })?;
        }

        let mut r = Array2::<Self>::zeros((k, n));
        for ((row, col), item) in r.indexed_iter_mut() {
            if col >= row {
                *item = mat[[row, col]];
            }
        }

        // The Householder reflectors sit below the diagonal of the first k columns.
        let mut q = Array2::<Self>::zeros((m, k).f());
        q.assign(&mat.slice(s![.., 0..k]));
        {
            let data = q
                .as_slice_memory_order_mut()
                .ok_or(RustyCurError::LayoutError)?;
            Self::orgqr(m as i32, k as i32, data, &tau).map_err(|info| {
                RustyCurError::LapackFailure {
                    routine: "orgqr",
                    info,
                }
            })?;
        }

        // Lapack counts pivots from one.
        let ind: Array1<usize> = jpvt.iter().map(|&item| (item - 1) as usize).collect();

        Ok(QR { q, r, ind })
    }

    /// Raw call into `?geqp3` on a column-major `m x n` buffer.
    fn geqp3(
        m: i32,
        n: i32,
        mat: &mut [Self],
        jpvt: &mut [i32],
        tau: &mut [Self],
    ) -> std::result::Result<(), i32>;

    /// Raw call into `?orgqr`/`?ungqr` forming the first `k` columns of Q.
    fn orgqr(m: i32, k: i32, mat: &mut [Self], tau: &[Self]) -> std::result::Result<(), i32>;
}

fn workspace_size<T: Scalar>(query: T) -> usize {
    query.re().to_usize().unwrap_or(1).max(1)
}

macro_rules! impl_qr_pivot {
    (@real, $scalar:ty, $qrf:path, $orgqr:path) => {
        impl_qr_pivot!(@body, $scalar, $qrf, $orgqr, );
    };
    (@complex, $scalar:ty, $qrf:path, $orgqr:path) => {
        impl_qr_pivot!(@body, $scalar, $qrf, $orgqr, rwork);
    };
    (@body, $scalar:ty, $qrf:path, $orgqr:path, $($rwork_ident:ident),*) => {
        impl PivotedQR for $scalar {
            fn geqp3(
                m: i32,
                n: i32,
                mat: &mut [Self],
                jpvt: &mut [i32],
                tau: &mut [Self],
            ) -> std::result::Result<(), i32> {
                let mut info = 0;
                let mut work_size = [<$scalar>::zero()];

                $(
                let mut $rwork_ident = vec![<<$scalar as Scalar>::Real>::zero(); 2 * (n as usize)];
                )*

                unsafe {
                    $qrf(
                        m,
                        n,
                        mat,
                        m,
                        jpvt,
                        tau,
                        &mut work_size,
                        -1,
                        $(&mut $rwork_ident,)*
                        &mut info,
                    );
                }

                if info != 0 {
                    return Err(info);
                }

                let lwork = workspace_size(work_size[0]);
                let mut work = vec![<$scalar>::zero(); lwork];

                unsafe {
                    $qrf(
                        m,
                        n,
                        mat,
                        m,
                        jpvt,
                        tau,
                        &mut work,
                        lwork as i32,
                        $(&mut $rwork_ident,)*
                        &mut info,
                    );
                }

                match info {
                    0 => Ok(()),
                    _ => Err(info),
                }
            }

            fn orgqr(
                m: i32,
                k: i32,
                mat: &mut [Self],
                tau: &[Self],
            ) -> std::result::Result<(), i32> {
                let mut info = 0;
                let mut work_size = [<$scalar>::zero()];

                unsafe {
                    $orgqr(m, k, k, mat, m, tau, &mut work_size, -1, &mut info);
                }

                if info != 0 {
                    return Err(info);
                }

                let lwork = workspace_size(work_size[0]);
                let mut work = vec![<$scalar>::zero(); lwork];

                unsafe {
                    $orgqr(m, k, k, mat, m, tau, &mut work, lwork as i32, &mut info);
                }

                match info {
                    0 => Ok(()),
                    _ => Err(info),
                }
            }
        }
    };
}

impl_qr_pivot!(@real, f64, lapack::dgeqp3, lapack::dorgqr);
impl_qr_pivot!(@real, f32, lapack::sgeqp3, lapack::sorgqr);
impl_qr_pivot!(@complex, num::complex::Complex<f64>, lapack::zgeqp3, lapack::zungqr);
impl_qr_pivot!(@complex, num::complex::Complex<f32>, lapack::cgeqp3, lapack::cungqr);
