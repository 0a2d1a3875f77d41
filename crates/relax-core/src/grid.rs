//! Dense row-major grid buffers and the double-buffered solver state.
//!
//! [`GridState`] owns the two buffers a Jacobi sweep needs: `current`
//! (read during a sweep) and `next` (written during a sweep). After the
//! sweep the buffers trade places with [`GridState::swap`], so no cell is
//! ever read and written in the same pass.
//!
//! Both buffers receive the boundary condition at construction. The
//! stencil never writes boundary cells, so after any number of swaps both
//! buffers still agree on the boundary.

use std::ops::Range;

use crate::error::GridError;

/// A dense `rows x cols` grid of `f32` stored row-major in one allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Grid {
    /// Allocate a zero-filled grid.
    ///
    /// Allocation goes through `try_reserve_exact`, so running out of
    /// memory surfaces as [`GridError::AllocationFailed`] instead of an
    /// abort inside the allocator.
    pub fn zeroed(rows: usize, cols: usize) -> Result<Self, GridError> {
        let len = rows
            .checked_mul(cols)
            .ok_or(GridError::SizeOverflow { rows, cols })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| GridError::AllocationFailed {
                bytes: len.saturating_mul(std::mem::size_of::<f32>()),
            })?;
        data.resize(len, 0.0);
        Ok(Self { rows, cols, data })
    }

    /// Build a grid from an existing row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, GridError> {
        let len = rows
            .checked_mul(cols)
            .ok_or(GridError::SizeOverflow { rows, cols })?;
        if data.len() != len {
            return Err(GridError::ShapeMismatch {
                expected: (rows, cols),
                actual: (data.len() / cols.max(1), cols),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The whole buffer, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The whole buffer, row-major, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Value at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(col < self.cols, "column {col} out of range");
        self.data[row * self.cols + col]
    }

    /// Overwrite the value at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(col < self.cols, "column {col} out of range");
        self.data[row * self.cols + col] = value;
    }

    /// One row as a slice of `cols` values.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows`.
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// One row as a mutable slice of `cols` values.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows`.
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }

    /// A contiguous block of whole rows.
    pub fn rows_slice(&self, rows: Range<usize>) -> Result<&[f32], GridError> {
        self.check_rows(&rows)?;
        Ok(&self.data[rows.start * self.cols..rows.end * self.cols])
    }

    /// A contiguous block of whole rows, mutably.
    pub fn rows_slice_mut(&mut self, rows: Range<usize>) -> Result<&mut [f32], GridError> {
        self.check_rows(&rows)?;
        Ok(&mut self.data[rows.start * self.cols..rows.end * self.cols])
    }

    pub(crate) fn check_rows(&self, rows: &Range<usize>) -> Result<(), GridError> {
        if rows.end > self.rows {
            return Err(GridError::RowsOutOfRange {
                end: rows.end,
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub(crate) fn check_same_shape(&self, other: &Grid) -> Result<(), GridError> {
        if self.shape() != other.shape() {
            return Err(GridError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(())
    }
}

/// Apply the fixed Dirichlet boundary condition to `grid`.
///
/// Every cell is zeroed, then the west column is set to
/// `sin(pi * i / (n - 1))` and the east column to the same profile
/// damped by `exp(-pi)`. The north and south rows stay (close to) zero.
/// Arithmetic is carried out in `f32`.
pub fn apply_boundary(grid: &mut Grid) {
    let (rows, cols) = grid.shape();
    grid.as_mut_slice().fill(0.0);
    if cols == 0 {
        return;
    }
    let pi = std::f32::consts::PI;
    let denom = rows.saturating_sub(1).max(1) as f32;
    let damping = (-pi).exp();
    for i in 0..rows {
        let profile = (pi * i as f32 / denom).sin();
        let row = grid.row_mut(i);
        row[0] = profile;
        row[cols - 1] = profile * damping;
    }
}

/// The pair of buffers a rank iterates over.
#[derive(Clone, Debug)]
pub struct GridState {
    current: Grid,
    next: Grid,
}

impl GridState {
    /// Allocate both buffers zero-filled.
    pub fn zeroed(rows: usize, cols: usize) -> Result<Self, GridError> {
        Ok(Self {
            current: Grid::zeroed(rows, cols)?,
            next: Grid::zeroed(rows, cols)?,
        })
    }

    /// Allocate both buffers and apply [`apply_boundary`] to each.
    pub fn with_boundary(rows: usize, cols: usize) -> Result<Self, GridError> {
        let mut state = Self::zeroed(rows, cols)?;
        apply_boundary(&mut state.current);
        apply_boundary(&mut state.next);
        Ok(state)
    }

    /// Start from an arbitrary initial grid. `next` starts as a copy.
    pub fn from_grid(initial: Grid) -> Self {
        Self {
            next: initial.clone(),
            current: initial,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.current.rows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.current.cols()
    }

    /// The buffer holding the latest completed iteration.
    pub fn current(&self) -> &Grid {
        &self.current
    }

    /// Mutable access to the current buffer (ghost rows, test seeding).
    pub fn current_mut(&mut self) -> &mut Grid {
        &mut self.current
    }

    /// The buffer the next sweep writes into.
    pub fn next(&self) -> &Grid {
        &self.next
    }

    /// Split borrow: read `current`, write `next`.
    pub fn split(&mut self) -> (&Grid, &mut Grid) {
        (&self.current, &mut self.next)
    }

    /// Exchange the roles of the two buffers.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Consume the state, keeping the current buffer.
    pub fn into_current(self) -> Grid {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_grid_has_requested_shape() {
        let g = Grid::zeroed(3, 5).unwrap();
        assert_eq!(g.shape(), (3, 5));
        assert_eq!(g.as_slice().len(), 15);
        assert!(g.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zeroed_overflow_is_reported() {
        let err = Grid::zeroed(usize::MAX, 2).unwrap_err();
        assert_eq!(
            err,
            GridError::SizeOverflow {
                rows: usize::MAX,
                cols: 2
            }
        );
    }

    #[test]
    fn huge_allocation_fails_gracefully() {
        let err = Grid::zeroed(1 << 31, 1 << 31).unwrap_err();
        assert!(matches!(err, GridError::AllocationFailed { .. }));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, vec![0.0; 4]).is_ok());
        assert!(matches!(
            Grid::from_vec(2, 2, vec![0.0; 5]),
            Err(GridError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn row_access_is_row_major() {
        let mut g = Grid::zeroed(3, 4).unwrap();
        g.set(1, 2, 7.0);
        assert_eq!(g.as_slice()[6], 7.0);
        assert_eq!(g.row(1), &[0.0, 0.0, 7.0, 0.0]);
        g.row_mut(2).fill(1.0);
        assert_eq!(g.get(2, 3), 1.0);
    }

    #[test]
    fn rows_slice_rejects_out_of_range() {
        let g = Grid::zeroed(3, 4).unwrap();
        assert_eq!(g.rows_slice(1..3).unwrap().len(), 8);
        assert_eq!(
            g.rows_slice(2..4).unwrap_err(),
            GridError::RowsOutOfRange { end: 4, rows: 3 }
        );
    }

    #[test]
    fn boundary_profile_matches_sine() {
        let mut g = Grid::zeroed(5, 4).unwrap();
        apply_boundary(&mut g);
        let pi = std::f32::consts::PI;
        for i in 0..5 {
            let expected = (pi * i as f32 / 4.0).sin();
            assert_eq!(g.get(i, 0), expected);
            assert_eq!(g.get(i, 3), expected * (-pi).exp());
        }
        // Interior and the north row are zero.
        assert_eq!(g.get(0, 1), 0.0);
        assert_eq!(g.get(2, 1), 0.0);
        assert_eq!(g.get(2, 2), 0.0);
        // Peak of the west profile sits in the middle row.
        assert!((g.get(2, 0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn with_boundary_initialises_both_buffers() {
        let state = GridState::with_boundary(6, 6).unwrap();
        assert_eq!(state.current(), state.next());
    }

    #[test]
    fn swap_exchanges_buffers() {
        let mut state = GridState::zeroed(2, 2).unwrap();
        {
            let (_, next) = state.split();
            next.set(0, 0, 3.0);
        }
        state.swap();
        assert_eq!(state.current().get(0, 0), 3.0);
        assert_eq!(state.next().get(0, 0), 0.0);
    }
}
