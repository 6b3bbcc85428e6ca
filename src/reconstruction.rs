//! Reconstruction of a matrix from sampled columns and rows.
//!
//! Let $C$ be the sampled columns and $R$ the sampled rows of $A$. With
//! $Q_c$ an orthonormal basis of the range of $C$ and $Q_r$ an orthonormal
//! basis of the range of $R^H$, the approximation is
//! $$
//! A \approx Q_c B Q_r^H,\quad B = Q_c^H A Q_r.
//! $$
//! The pseudo-inverses of $C$ and $R$ are never formed. The rank $k$
//! approximation replaces $B$ by its best rank $k$ approximation $B_k$,
//! computed from an SVD of the small core matrix $B$ only.

use crate::pivoted_qr::PivotedQR;
use crate::qr::{LQTraits, QRTraits, LQ, QR};
use crate::svd::{SvdBackend, SVD};
use crate::types::{Result, RustyCurError, Scalar};
use log::warn;
use ndarray::{Array1, Array2, ArrayView2};

/// Numerical rank threshold for the rank diagnostics of the sampled columns.
const RANK_DIAGNOSTIC_TOL: f64 = 1E-10;

pub struct CurApproximation<A: Scalar> {
    /// Orthonormal basis $Q_c$ of the sampled columns (m x c).
    pub qc: Array2<A>,
    /// Core matrix $B = Q_c^H A Q_r$ (c x r).
    pub core: Array2<A>,
    /// Orthonormal rows $Q_r^H$ spanning the sampled rows (r x n).
    pub qr_adjoint: Array2<A>,
    /// Rank k SVD of the core matrix, if requested.
    pub core_svd: Option<SVD<A>>,
}

impl<A: PivotedQR> CurApproximation<A> {
    /// Compute the approximation of `mat` from its sampled columns `c` and rows `r`.
    ///
    /// The rank k SVD of the core is only computed when `with_core_svd` is set.
    /// A target rank larger than the core dimensions is always an error.
    pub fn compute<B: SvdBackend<A>>(
        mat: ArrayView2<A>,
        c: ArrayView2<A>,
        r: ArrayView2<A>,
        rank: usize,
        with_core_svd: bool,
        backend: &B,
    ) -> Result<Self> {
        let available = c.ncols().min(mat.nrows()).min(r.nrows().min(mat.ncols()));
        if rank > available {
            return Err(RustyCurError::RankError { rank, available });
        }

        let col_qr = QR::<A>::compute_from(c)?;
        let numerical_rank = col_qr.numerical_rank(RANK_DIAGNOSTIC_TOL);
        if numerical_rank < rank {
            warn!(
                "Sampled columns have numerical rank {} below the target rank {}",
                numerical_rank, rank
            );
        }

        let qc = col_qr.q;
        let qr_adjoint = LQ::<A>::compute_from(r)?.q;

        let qc_adjoint = qc.t().map(|item| item.conj());
        let qr = qr_adjoint.t().map(|item| item.conj());
        let core = qc_adjoint.dot(&mat).dot(&qr);

        let core_svd = if with_core_svd {
            Some(backend.thin_svd(core.view())?.compress_rank(rank)?)
        } else {
            None
        };

        Ok(CurApproximation {
            qc,
            core,
            qr_adjoint,
            core_svd,
        })
    }

    /// The approximation $Q_c B Q_r^H$.
    pub fn to_mat(&self) -> Array2<A> {
        self.qc.dot(&self.core).dot(&self.qr_adjoint)
    }

    /// The rank k approximation $Q_c B_k Q_r^H$, if the core SVD was computed.
    pub fn to_mat_truncated(&self) -> Option<Array2<A>> {
        self.core_svd
            .as_ref()
            .map(|svd| self.qc.dot(&svd.to_mat()).dot(&self.qr_adjoint))
    }

    /// The k retained singular values of the core matrix in descending order.
    pub fn core_singular_values(&self) -> Option<&Array1<A::Real>> {
        self.core_svd.as_ref().map(|svd| &svd.s)
    }

    /// The smallest retained singular value $\sigma_k(B)$.
    pub fn sigma_k(&self) -> Option<A::Real> {
        self.core_singular_values()
            .and_then(|sigma| sigma.iter().last().copied())
    }
}
