#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Rows pre-allocated per growth step.
pub const BLOCK_ROWS: usize = 100;

/// Append-only table of fixed-width rows with block-wise growth.
///
/// Cells are stored flat, row-major. Capacity is reserved one block of rows at
/// a time, so appending costs amortized O(width) without per-row
/// reallocation. Unwritten capacity is dropped by [`RowBuffer::truncate`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowBuffer<T> {
    width: usize,
    block_rows: usize,
    capacity_rows: usize,
    /// Number of rows written; everything past it is unused capacity.
    rows: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> RowBuffer<T> {
    /// Buffer of `width` columns with one block of [`BLOCK_ROWS`] reserved.
    pub fn new(width: usize) -> Self {
        Self::with_block_rows(width, BLOCK_ROWS)
    }

    pub fn with_block_rows(width: usize, block_rows: usize) -> Self {
        let block_rows = block_rows.max(1);
        Self {
            width,
            block_rows,
            capacity_rows: block_rows,
            rows: 0,
            cells: vec![T::default(); width * block_rows],
        }
    }

    /// True when the next row would not fit in the reserved capacity.
    #[inline]
    pub fn needs_growth(&self) -> bool {
        self.rows >= self.capacity_rows
    }

    /// Reserve one more block of rows.
    pub fn grow(&mut self) {
        self.capacity_rows += self.block_rows;
        self.cells
            .resize(self.capacity_rows * self.width, T::default());
    }

    /// Append a row, growing first if needed. Returns the row index.
    ///
    /// # Panics
    /// Panics if `row.len()` differs from the buffer width.
    pub fn push_row(&mut self, row: &[T]) -> usize {
        assert_eq!(row.len(), self.width, "row width mismatch");
        if self.needs_growth() {
            self.grow();
        }
        let idx = self.rows;
        let start = idx * self.width;
        self.cells[start..start + self.width].copy_from_slice(row);
        self.rows += 1;
        idx
    }

    /// Drop unused capacity so that exactly the written rows remain.
    ///
    /// Truncating an already-truncated buffer is a no-op.
    pub fn truncate(&mut self) {
        self.cells.truncate(self.rows * self.width);
        self.cells.shrink_to_fit();
        self.capacity_rows = self.rows;
    }
}

impl<T> RowBuffer<T> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of written rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    pub fn capacity_rows(&self) -> usize {
        self.capacity_rows
    }

    pub fn row(&self, i: usize) -> Option<&[T]> {
        if i >= self.rows {
            return None;
        }
        let start = i * self.width;
        Some(&self.cells[start..start + self.width])
    }

    pub fn last_row(&self) -> Option<&[T]> {
        self.rows.checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |i| {
            let start = i * self.width;
            &self.cells[start..start + self.width]
        })
    }

    /// Values of column `j` over the written rows.
    pub fn column(&self, j: usize) -> impl Iterator<Item = &T> + '_ {
        self.rows().filter_map(move |r| r.get(j))
    }

    /// Written cells only, row-major.
    pub fn as_flat(&self) -> &[T] {
        &self.cells[..self.rows * self.width]
    }
}
