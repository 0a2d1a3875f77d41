//! Four-point Jacobi stencil.
//!
//! Each updated cell becomes the mean of its four axis neighbours in the
//! input buffer:
//!
//! ```text
//! out[r][c] = (in[r][c+1] + in[r][c-1] + in[r-1][c] + in[r+1][c]) / 4
//! ```
//!
//! Reads come exclusively from `input` and writes go exclusively to
//! `output`, so rows are independent and may be processed in any order
//! (or in parallel) with bit-identical results.

use std::ops::Range;

use rayon::prelude::*;

use crate::error::GridError;
use crate::grid::Grid;

/// Clip `rows` to the interior `[1, n - 1)`, dropping the global
/// boundary rows.
pub fn interior_rows(rows: Range<usize>, n: usize) -> Range<usize> {
    let start = rows.start.max(1);
    let end = rows.end.min(n.saturating_sub(1));
    start..end.max(start)
}

/// How a sweep distributes rows over threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stencil {
    /// One thread, rows in ascending order.
    #[default]
    Serial,
    /// Rows spread over the global rayon pool.
    Parallel,
}

impl Stencil {
    /// Run one sweep over `rows` (clipped to the interior).
    pub fn apply(self, input: &Grid, output: &mut Grid, rows: Range<usize>) -> Result<(), GridError> {
        match self {
            Self::Serial => compute(input, output, rows),
            Self::Parallel => compute_parallel(input, output, rows),
        }
    }
}

/// Single-threaded sweep writing `output` for every interior cell in
/// `rows`.
///
/// Reads rows `rows.start - 1 ..= rows.end` of `input`; the caller is
/// responsible for those ghost rows being current.
pub fn compute(input: &Grid, output: &mut Grid, rows: Range<usize>) -> Result<(), GridError> {
    let Some((rows, cols)) = prepare(input, output, rows)? else {
        return Ok(());
    };
    let src = input.as_slice();
    let block = output.rows_slice_mut(rows.clone())?;
    for (offset, out_row) in block.chunks_mut(cols).enumerate() {
        update_row(src, out_row, rows.start + offset, cols);
    }
    Ok(())
}

/// Same as [`compute`], with rows processed on the rayon pool.
pub fn compute_parallel(
    input: &Grid,
    output: &mut Grid,
    rows: Range<usize>,
) -> Result<(), GridError> {
    let Some((rows, cols)) = prepare(input, output, rows)? else {
        return Ok(());
    };
    let src = input.as_slice();
    let block = output.rows_slice_mut(rows.clone())?;
    block
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(offset, out_row)| update_row(src, out_row, rows.start + offset, cols));
    Ok(())
}

/// Validate shapes and clip `rows`. `None` means there is nothing to do.
fn prepare(
    input: &Grid,
    output: &Grid,
    rows: Range<usize>,
) -> Result<Option<(Range<usize>, usize)>, GridError> {
    input.check_same_shape(output)?;
    input.check_rows(&rows)?;
    let (n, cols) = input.shape();
    let rows = interior_rows(rows, n);
    if rows.is_empty() || cols < 3 {
        return Ok(None);
    }
    Ok(Some((rows, cols)))
}

#[inline]
fn update_row(src: &[f32], out_row: &mut [f32], row: usize, cols: usize) {
    let base = row * cols;
    for c in 1..cols - 1 {
        let i = base + c;
        out_row[c] = (src[i + 1] + src[i - 1] + src[i - cols] + src[i + cols]) / 4.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::apply_boundary;
    use proptest::prelude::*;

    fn seeded(rows: usize, cols: usize) -> Grid {
        let data = (0..rows * cols).map(|i| (i % 7) as f32 * 0.5).collect();
        Grid::from_vec(rows, cols, data).unwrap()
    }

    #[test]
    fn interior_rows_clips_boundaries() {
        assert_eq!(interior_rows(0..10, 10), 1..9);
        assert_eq!(interior_rows(3..6, 10), 3..6);
        assert_eq!(interior_rows(8..10, 10), 8..9);
        assert!(interior_rows(0..1, 10).is_empty());
        assert!(interior_rows(0..2, 2).is_empty());
    }

    #[test]
    fn single_cell_is_mean_of_neighbours() {
        let mut input = Grid::zeroed(3, 3).unwrap();
        input.set(1, 2, 4.0); // east
        input.set(1, 0, 8.0); // west
        input.set(0, 1, 12.0); // north
        input.set(2, 1, 16.0); // south
        let mut output = Grid::zeroed(3, 3).unwrap();
        compute(&input, &mut output, 0..3).unwrap();
        assert_eq!(output.get(1, 1), 10.0);
    }

    #[test]
    fn boundary_cells_are_never_written() {
        let mut input = Grid::zeroed(6, 5).unwrap();
        apply_boundary(&mut input);
        let mut output = Grid::zeroed(6, 5).unwrap();
        output.as_mut_slice().fill(-1.0);
        compute(&input, &mut output, 0..6).unwrap();
        for c in 0..5 {
            assert_eq!(output.get(0, c), -1.0);
            assert_eq!(output.get(5, c), -1.0);
        }
        for r in 0..6 {
            assert_eq!(output.get(r, 0), -1.0);
            assert_eq!(output.get(r, 4), -1.0);
        }
        assert_ne!(output.get(1, 1), -1.0);
    }

    #[test]
    fn rows_outside_the_range_are_untouched() {
        let input = seeded(8, 6);
        let mut output = Grid::zeroed(8, 6).unwrap();
        compute(&input, &mut output, 3..5).unwrap();
        for r in [1, 2, 5, 6] {
            assert!(output.row(r).iter().all(|&v| v == 0.0));
        }
        assert!(output.row(3)[1..5].iter().any(|&v| v != 0.0));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let input = Grid::zeroed(4, 4).unwrap();
        let mut output = Grid::zeroed(4, 5).unwrap();
        assert!(matches!(
            compute(&input, &mut output, 0..4),
            Err(GridError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn narrow_grid_is_a_no_op() {
        let input = seeded(5, 2);
        let mut output = Grid::zeroed(5, 2).unwrap();
        compute(&input, &mut output, 0..5).unwrap();
        assert!(output.as_slice().iter().all(|&v| v == 0.0));
    }

    proptest! {
        #[test]
        fn parallel_matches_serial(rows in 3usize..40, cols in 3usize..40, seed in 0u32..1000) {
            let data = (0..rows * cols)
                .map(|i| ((i as u32).wrapping_mul(2654435761).wrapping_add(seed) % 1000) as f32 / 999.0)
                .collect();
            let input = Grid::from_vec(rows, cols, data).unwrap();
            let mut serial = Grid::zeroed(rows, cols).unwrap();
            let mut parallel = Grid::zeroed(rows, cols).unwrap();
            Stencil::Serial.apply(&input, &mut serial, 0..rows).unwrap();
            Stencil::Parallel.apply(&input, &mut parallel, 0..rows).unwrap();
            prop_assert_eq!(serial, parallel);
        }
    }
}
