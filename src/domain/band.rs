use super::*;
use crate::error::*;
use crate::partition::*;
use crate::util::*;
use std::ops::Range;

/// Which neighbour a ghost row or boundary row faces.
/// `Up` is toward row 0 and worker `id - 1`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// One worker's rows of the grid plus a ghost row for each neighbour.
///
/// Stored rows are addressed locally, `0..stored_rows()`.
/// With a top ghost, local row 0 is that ghost and owned rows start at 1.
/// The same rows are also addressable by world coordinate through
/// [`DomainView`], where the ghost rows sit just outside the owned box.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    owned: AABB<2>,
    aabb: AABB<2>,
    ghost_up: bool,
    ghost_down: bool,
    buffer: Vec<f64>,
}

impl Band {
    /// Allocate the zeroed band `worker` owns under `table`, for a grid `columns` wide.
    pub fn new(
        table: &PartitionTable,
        worker: usize,
        columns: usize,
    ) -> HeatResult<Self> {
        if worker >= table.workers() {
            return Err(HeatError::invalid(format!(
                "worker {} is outside a table of {} workers",
                worker,
                table.workers()
            )));
        }
        let ghost_up = worker > 0;
        let ghost_down = worker + 1 < table.workers();
        let owned = table.owned_aabb(worker, columns);

        let first = owned.bounds[(0, 0)] - ghost_up as i32;
        let last = owned.bounds[(0, 1)] + ghost_down as i32;
        let aabb = AABB::row_band(first, last, columns);
        let buffer = try_alloc_zeroed(aabb.row_count(), columns)?;

        Ok(Band {
            owned,
            aabb,
            ghost_up,
            ghost_down,
            buffer,
        })
    }

    pub fn columns(&self) -> usize {
        self.aabb.column_count()
    }

    pub fn stored_rows(&self) -> usize {
        self.aabb.row_count()
    }

    pub fn owned_rows(&self) -> usize {
        self.owned.row_count()
    }

    /// World box of the rows this worker owns, ghosts excluded.
    pub fn owned_aabb(&self) -> &AABB<2> {
        &self.owned
    }

    /// World row index of the first owned row.
    pub fn row_offset(&self) -> usize {
        self.owned.bounds[(0, 0)] as usize
    }

    pub fn ghost_count(&self) -> usize {
        self.ghost_up as usize + self.ghost_down as usize
    }

    /// Local indices of the owned rows.
    pub fn owned_range(&self) -> Range<usize> {
        let start = self.ghost_up as usize;
        start..start + self.owned_rows()
    }

    /// Local index of the ghost row facing `direction`, if there is a neighbour there.
    pub fn ghost_row_index(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Up if self.ghost_up => Some(0),
            Direction::Down if self.ghost_down => Some(self.stored_rows() - 1),
            _ => None,
        }
    }

    /// Local index of the owned row nearest `direction`.
    pub fn boundary_row_index(&self, direction: Direction) -> usize {
        let owned = self.owned_range();
        match direction {
            Direction::Up => owned.start,
            Direction::Down => owned.end - 1,
        }
    }

    #[track_caller]
    pub fn row(&self, local_row: usize) -> &[f64] {
        let n = self.columns();
        &self.buffer[local_row * n..(local_row + 1) * n]
    }

    #[track_caller]
    pub fn row_mut(&mut self, local_row: usize) -> &mut [f64] {
        let n = self.columns();
        &mut self.buffer[local_row * n..(local_row + 1) * n]
    }

    /// Owned row nearest `direction`, the one a neighbour there needs as its ghost.
    pub fn boundary_row(&self, direction: Direction) -> &[f64] {
        self.row(self.boundary_row_index(direction))
    }

    pub fn ghost_row(&self, direction: Direction) -> Option<&[f64]> {
        self.ghost_row_index(direction).map(|r| self.row(r))
    }

    pub fn ghost_row_mut(&mut self, direction: Direction) -> Option<&mut [f64]> {
        self.ghost_row_index(direction).map(move |r| self.row_mut(r))
    }

    /// The owned rows only, contiguous and row-major.
    pub fn owned_buffer(&self) -> &[f64] {
        let n = self.columns();
        let range = self.owned_range();
        &self.buffer[range.start * n..range.end * n]
    }

    pub fn owned_buffer_mut(&mut self) -> &mut [f64] {
        let n = self.columns();
        let range = self.owned_range();
        &mut self.buffer[range.start * n..range.end * n]
    }

    pub fn same_shape(&self, other: &Band) -> bool {
        self.aabb == other.aabb && self.owned == other.owned
    }

    /// Copy the cells the stencil never writes: the first and last column
    /// of every stored row, and the first and last stored rows in full.
    pub fn copy_edges_from(&mut self, other: &Band) -> HeatResult<()> {
        if !self.same_shape(other) {
            return Err(HeatError::invalid(format!(
                "cannot copy edges between bands {} and {}",
                other.aabb, self.aabb
            )));
        }
        let n = self.columns();
        let rows = self.stored_rows();
        for r in 0..rows {
            let src = other.row(r);
            let dst = self.row_mut(r);
            dst[0] = src[0];
            dst[n - 1] = src[n - 1];
        }
        self.row_mut(0).copy_from_slice(other.row(0));
        self.row_mut(rows - 1).copy_from_slice(other.row(rows - 1));
        Ok(())
    }
}

impl DomainView<2> for Band {
    fn aabb(&self) -> &AABB<2> {
        &self.aabb
    }

    fn buffer(&self) -> &[f64] {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut [f64] {
        &mut self.buffer
    }

    fn aabb_buffer_mut(&mut self) -> (&AABB<2>, &mut [f64]) {
        (&self.aabb, &mut self.buffer)
    }
}
