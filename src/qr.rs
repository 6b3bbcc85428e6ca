//! Data Structures and traits for QR Decompositions
//!
//! The pivoted QR Decomposition of a matrix $A\in\mathbb{C}^{m\times n}$ is
//! defined as $AP = QR$, where $P$ is a permutation matrix, $Q\in\mathbb{C}^{m\times k}$
//! is a matrix with orthogonal columns, satisfying $Q^HQ = I$, and $R\in\mathbb{C}^{k\times n}$
//! is an upper triangular matrix with diagonal elements $r_{ii}$ satisfying $|r_{11}|\geq |r_{22}|\geq \dots$.
//! Here $k=\min{m, n}$. The matrix $P$ is defined by an index vector `ind` in such a way that if ind\[j\] = k then
//! the jth column of $AP$ is the $k$th column of $A$.
//!
//! The LQ Decomposition is defined as $PA = LQ$ with $L$ a lower triangular matrix. If
//! $A^H\tilde{P}=\tilde{Q}R$ is the QR decomposition as defined above, then $P = \tilde{P}^T$, $L=R^H$, $Q=\tilde{Q}^H$.
//!
//! In a CUR approximation the $Q$ factor of the sampled columns $C$ is the orthonormal basis $Q_c$ of the
//! column space, and the $Q$ factor of the LQ decomposition of the sampled rows $R$ is $Q_r^H$, an
//! orthonormal basis of the row space.

use crate::pivoted_qr::PivotedQR;
use crate::types::{Result, Scalar};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num::ToPrimitive;

pub struct QR<A: Scalar> {
    /// The Q matrix from the QR Decomposition
    pub q: Array2<A>,
    /// The R matrix from the QR Decomposition
    pub r: Array2<A>,
    /// An index array. If ind\[j\] = k then the
    /// jth column of Q * R is identical to the
    /// kth column of the original matrix A.
    pub ind: Array1<usize>,
}

pub struct LQ<A: Scalar> {
    /// The L matrix from the LQ Decomposition
    pub l: Array2<A>,
    /// The Q matrix from the LQ Decomposition
    pub q: Array2<A>,
    /// An index array. If ind\[j\] = k then the
    /// jth row of L * Q is identical to the
    /// kth row of the original matrix A.
    pub ind: Array1<usize>,
}

/// Number of leading diagonal entries with $|d_i| > tol\cdot |d_0|$.
fn numerical_rank_of_diag<A: Scalar>(diag: ArrayView1<A>, tol: f64) -> usize {
    let first = match diag.first() {
        Some(&first) => first.abs().to_f64().unwrap_or(0.0),
        None => return 0,
    };

    if first == 0.0 {
        return 0;
    }

    diag.iter()
        .take_while(|item| item.abs().to_f64().unwrap_or(0.0) > tol * first)
        .count()
}

pub trait QRTraits {
    type A: Scalar;

    /// Number of rows
    fn nrows(&self) -> usize {
        self.get_q().nrows()
    }

    /// Number of columns
    fn ncols(&self) -> usize {
        self.get_r().ncols()
    }

    /// Rank of the QR Decomposition
    fn rank(&self) -> usize {
        self.get_q().ncols()
    }

    /// Number of diagonal entries of R above `tol` relative to the first one.
    fn numerical_rank(&self, tol: f64) -> usize {
        numerical_rank_of_diag(self.get_r().diag(), tol)
    }

    /// Convert the QR decomposition to a matrix
    fn to_mat(&self) -> Array2<Self::A> {
        let prod = self.get_q().dot(&self.get_r());
        let mut mat = Array2::<Self::A>::zeros(prod.dim());

        for (col, &target) in prod.axis_iter(Axis(1)).zip(self.get_ind().iter()) {
            mat.index_axis_mut(Axis(1), target).assign(&col);
        }

        mat
    }

    /// Compute the QR decomposition from a given array
    fn compute_from(arr: ArrayView2<Self::A>) -> Result<QR<Self::A>>;

    /// Return the Q matrix
    fn get_q(&self) -> ArrayView2<Self::A>;

    /// Return the R matrix
    fn get_r(&self) -> ArrayView2<Self::A>;

    /// Return the index vector
    fn get_ind(&self) -> ArrayView1<usize>;
}

/// Traits for the LQ Decomposition
pub trait LQTraits {
    type A: Scalar;

    /// Number of rows
    fn nrows(&self) -> usize {
        self.get_l().nrows()
    }

    /// Number of columns
    fn ncols(&self) -> usize {
        self.get_q().ncols()
    }

    /// Rank of the LQ decomposition
    fn rank(&self) -> usize {
        self.get_q().nrows()
    }

    /// Number of diagonal entries of L above `tol` relative to the first one.
    fn numerical_rank(&self, tol: f64) -> usize {
        numerical_rank_of_diag(self.get_l().diag(), tol)
    }

    /// Convert the LQ decomposition to a matrix
    fn to_mat(&self) -> Array2<Self::A> {
        let prod = self.get_l().dot(&self.get_q());
        let mut mat = Array2::<Self::A>::zeros(prod.dim());

        for (row, &target) in prod.axis_iter(Axis(0)).zip(self.get_ind().iter()) {
            mat.index_axis_mut(Axis(0), target).assign(&row);
        }

        mat
    }

    /// Compress by giving a target rank
    fn compress_lq_rank(&self, mut max_rank: usize) -> LQ<Self::A> {
        let (l, q, ind) = (self.get_l(), self.get_q(), self.get_ind());

        if max_rank > q.nrows() {
            max_rank = q.nrows()
        }

        LQ {
            l: l.slice(s![.., 0..max_rank]).into_owned(),
            q: q.slice(s![0..max_rank, ..]).into_owned(),
            ind: ind.into_owned(),
        }
    }

    /// Compute the LQ decomposition from a given array
    fn compute_from(arr: ArrayView2<Self::A>) -> Result<LQ<Self::A>>;

    /// Return the Q matrix
    fn get_q(&self) -> ArrayView2<Self::A>;

    /// Return the L matrix
    fn get_l(&self) -> ArrayView2<Self::A>;

    /// Return the index vector
    fn get_ind(&self) -> ArrayView1<usize>;
}

impl<A: PivotedQR> QRTraits for QR<A> {
    type A = A;

    fn compute_from(arr: ArrayView2<A>) -> Result<QR<A>> {
        A::pivoted_qr(arr)
    }

    fn get_q(&self) -> ArrayView2<A> {
        self.q.view()
    }

    fn get_r(&self) -> ArrayView2<A> {
        self.r.view()
    }

    fn get_ind(&self) -> ArrayView1<usize> {
        self.ind.view()
    }
}

impl<A: PivotedQR> LQTraits for LQ<A> {
    type A = A;

    fn compute_from(arr: ArrayView2<A>) -> Result<LQ<A>> {
        let arr_trans = arr.t().map(|val| val.conj());
        let qr = QR::<A>::compute_from(arr_trans.view())?;

        Ok(LQ {
            l: qr.r.t().map(|item| item.conj()),
            q: qr.q.t().map(|item| item.conj()),
            ind: qr.ind,
        })
    }

    fn get_q(&self) -> ArrayView2<A> {
        self.q.view()
    }

    fn get_l(&self) -> ArrayView2<A> {
        self.l.view()
    }

    fn get_ind(&self) -> ArrayView1<usize> {
        self.ind.view()
    }
}
