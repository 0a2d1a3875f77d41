//! Local half of the convergence test.
//!
//! The error statistic is `max(sqrt(|old - new|))` over the cells a rank
//! updated. Note the square root: this is not the usual max-norm of the
//! update. Because `sqrt` is monotonic the statistic orders updates the
//! same way the max-norm does; only the scale differs, so a tolerance
//! `t` bounds the largest cell change by `t * t`.

use std::ops::Range;

use crate::error::GridError;
use crate::grid::Grid;
use crate::stencil::interior_rows;

/// Error statistic for the interior cells of `rows`.
///
/// Returns `0.0` when no cell qualifies. NaN differences are ignored, as
/// `f32::max` ignores NaN operands.
pub fn local_error(old: &Grid, new: &Grid, rows: Range<usize>) -> Result<f32, GridError> {
    old.check_same_shape(new)?;
    old.check_rows(&rows)?;
    let (n, cols) = old.shape();
    let rows = interior_rows(rows, n);
    if rows.is_empty() || cols < 3 {
        return Ok(0.0);
    }
    let before = old.rows_slice(rows.clone())?;
    let after = new.rows_slice(rows)?;
    let error = before
        .chunks(cols)
        .zip(after.chunks(cols))
        .flat_map(|(a, b)| a[1..cols - 1].iter().zip(&b[1..cols - 1]))
        .fold(0.0f32, |acc, (&a, &b)| acc.max((a - b).abs().sqrt()));
    Ok(error)
}
