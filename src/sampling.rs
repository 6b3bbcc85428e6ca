//! Uniform sampling of column and row index sets.
//!
//! A sample draws `c` columns and `c` rows uniformly without replacement.
//! In adaptive mode the row set is afterwards enlarged to `r` rows by an
//! [`AdaptiveRowSelector`].

use crate::config::CurConfig;
use crate::types::{Result, RustyCurError, Scalar};
use itertools::Itertools;
use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

/// Policy that grows an initial row sample.
pub trait AdaptiveRowSelector<A: Scalar> {
    /// Return the rows of `mat` to use: `seed_rows.len() + extra` distinct
    /// indices in `0..mat.nrows()`.
    fn select_rows<R: Rng + ?Sized>(
        &self,
        mat: ArrayView2<A>,
        seed_rows: &[usize],
        extra: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>>;
}

/// The sampled index sets of one trial together with the sampled submatrices.
pub struct CurSample<A: Scalar> {
    /// Sampled column indices.
    pub col_ind: Vec<usize>,
    /// Sampled row indices.
    pub row_ind: Vec<usize>,
    /// The m x c matrix of sampled columns.
    pub c: Array2<A>,
    /// The r x n matrix of sampled rows.
    pub r: Array2<A>,
}

/// Draw `count` distinct indices from `0..len`.
///
/// The indices are the leading `count` entries of a uniformly random
/// permutation of `0..len`.
pub fn sample_indices<R: Rng + ?Sized>(len: usize, count: usize, rng: &mut R) -> Result<Vec<usize>> {
    if count > len {
        return Err(RustyCurError::InvalidConfiguration(format!(
            "Cannot sample {} distinct indices out of {}",
            count, len
        )));
    }

    let mut perm: Vec<usize> = (0..len).collect();
    perm.shuffle(rng);
    perm.truncate(count);

    Ok(perm)
}

/// Draw the column and row sample of a single trial.
pub fn draw_sample<A, S, R>(
    mat: ArrayView2<A>,
    config: &CurConfig,
    selector: &S,
    rng: &mut R,
) -> Result<CurSample<A>>
where
    A: Scalar,
    S: AdaptiveRowSelector<A>,
    R: Rng + ?Sized,
{
    let (m, n) = mat.dim();

    let col_ind = sample_indices(n, config.num_cols, rng)?;
    let seed_rows = sample_indices(m, config.num_cols, rng)?;

    let row_ind = if config.adaptive {
        let rows = selector.select_rows(mat, &seed_rows, config.extra_rows(), rng)?;
        check_selection(&rows, config.num_rows, m)?;
        rows
    } else {
        seed_rows
    };

    Ok(CurSample {
        c: mat.select(Axis(1), &col_ind),
        r: mat.select(Axis(0), &row_ind),
        col_ind,
        row_ind,
    })
}

fn check_selection(rows: &[usize], expected: usize, nrows: usize) -> Result<()> {
    if rows.len() != expected {
        return Err(RustyCurError::InvalidSelection(format!(
            "expected {} rows, got {}",
            expected,
            rows.len()
        )));
    }
    if let Some(&row) = rows.iter().find(|&&row| row >= nrows) {
        return Err(RustyCurError::InvalidSelection(format!(
            "row index {} out of range for a matrix with {} rows",
            row, nrows
        )));
    }
    if !rows.iter().all_unique() {
        return Err(RustyCurError::InvalidSelection(
            "row indices are not distinct".to_string(),
        ));
    }

    Ok(())
}
