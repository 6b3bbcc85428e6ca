//! Adaptive row sampling driven by residual row norms.
//!
//! Given seed rows $R_0$ of $A$ the residual $E = A - A Q^H Q$ is formed,
//! where the rows of $Q$ are an orthonormal basis of the row space of $R_0$.
//! Additional rows are drawn without replacement with probability
//! proportional to $\|e_i\|^2$, so rows that are badly represented by the
//! seed rows are preferred.

use crate::pivoted_qr::PivotedQR;
use crate::qr::{LQTraits, LQ};
use crate::sampling::AdaptiveRowSelector;
use crate::types::{Result, RustyCurError};
use log::{debug, warn};
use ndarray::{ArrayView2, Axis};
use ndarray_linalg::Norm;
use num::{Float, ToPrimitive};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct ResidualRowSelector {
    /// Relative threshold on the diagonal of the LQ factorization of the
    /// seed rows below which basis directions are dropped.
    pub rank_tol: f64,
}

impl Default for ResidualRowSelector {
    fn default() -> Self {
        Self { rank_tol: 1E-12 }
    }
}

impl ResidualRowSelector {
    pub fn new(rank_tol: f64) -> Self {
        Self { rank_tol }
    }

    /// Squared residual norms of the rows of `mat` after projection onto
    /// the row space of the `seed_rows`.
    pub fn residual_weights<A: PivotedQR>(
        &self,
        mat: ArrayView2<A>,
        seed_rows: &[usize],
    ) -> Result<Vec<f64>> {
        let seed = mat.select(Axis(0), seed_rows);
        let lq = LQ::<A>::compute_from(seed.view())?;
        let basis_rank = lq.numerical_rank(self.rank_tol);

        if basis_rank < seed_rows.len() {
            warn!(
                "Seed rows have numerical rank {} out of {}",
                basis_rank,
                seed_rows.len()
            );
        }

        let basis = lq.compress_lq_rank(basis_rank).q;
        let basis_adjoint = basis.t().map(|item| item.conj());
        let residual = &mat - &mat.dot(&basis_adjoint).dot(&basis);

        let squared_row_norms = |arr: ArrayView2<A>| -> Vec<f64> {
            arr.axis_iter(Axis(0))
                .map(|row| {
                    let norm = row.norm_l2().to_f64().unwrap_or(0.0);
                    norm * norm
                })
                .collect()
        };

        // Residuals at the level of rounding errors carry no information.
        let eps = <A::Real as Float>::epsilon().to_f64().unwrap_or(f64::EPSILON);
        let floor = eps * squared_row_norms(mat).iter().sum::<f64>();

        let mut weights = squared_row_norms(residual.view());
        weights
            .iter_mut()
            .filter(|item| **item <= floor)
            .for_each(|item| *item = 0.0);

        for &row in seed_rows {
            weights[row] = 0.0;
        }

        Ok(weights)
    }
}

impl<A: PivotedQR> AdaptiveRowSelector<A> for ResidualRowSelector {
    fn select_rows<R: Rng + ?Sized>(
        &self,
        mat: ArrayView2<A>,
        seed_rows: &[usize],
        extra: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        let nrows = mat.nrows();

        if extra > nrows.saturating_sub(seed_rows.len()) {
            return Err(RustyCurError::InvalidConfiguration(format!(
                "Cannot add {} rows to {} seed rows of a matrix with {} rows",
                extra,
                seed_rows.len(),
                nrows
            )));
        }

        let mut rows = seed_rows.to_vec();
        if extra == 0 {
            return Ok(rows);
        }

        let mut weights = self.residual_weights(mat, seed_rows)?;

        for _ in 0..extra {
            let row = match WeightedIndex::new(&weights) {
                Ok(dist) => dist.sample(rng),
                Err(_) => {
                    warn!("Residual is numerically zero, falling back to uniform row sampling");
                    let free: Vec<usize> = (0..nrows).filter(|row| !rows.contains(row)).collect();
                    // `extra` was checked against the number of free rows above.
                    match free.choose(rng) {
                        Some(&row) => row,
                        None => break,
                    }
                }
            };
            weights[row] = 0.0;
            rows.push(row);
        }

        debug!(
            "Adaptive selection added rows {:?} to {} seed rows",
            &rows[seed_rows.len()..],
            seed_rows.len()
        );

        Ok(rows)
    }
}
