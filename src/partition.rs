//! Row-band partitioning of an `N` row grid across `W` workers.
//!
//! The first `W - N % W` workers get `N / W` rows, the rest get one more.
//! Short bands always come first so ownership is reproducible.

use crate::error::*;
use crate::util::*;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RowPartition {
    pub row_count: usize,
    pub row_offset: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PartitionTable {
    rows: usize,
    parts: Vec<RowPartition>,
}

pub fn partition(rows: usize, workers: usize) -> HeatResult<PartitionTable> {
    if rows == 0 {
        return Err(HeatError::invalid("grid must have at least one row"));
    }
    if workers == 0 {
        return Err(HeatError::invalid("at least one worker is required"));
    }
    if workers > rows {
        return Err(HeatError::invalid(format!(
            "more workers ({}) than grid rows ({})",
            workers, rows
        )));
    }

    let base = rows / workers;
    let short_workers = workers - rows % workers;
    let mut parts = Vec::with_capacity(workers);
    let mut row_offset = 0;
    for w in 0..workers {
        let row_count = if w < short_workers { base } else { base + 1 };
        parts.push(RowPartition {
            row_count,
            row_offset,
        });
        row_offset += row_count;
    }
    debug_assert_eq!(row_offset, rows);

    Ok(PartitionTable { rows, parts })
}

impl PartitionTable {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn workers(&self) -> usize {
        self.parts.len()
    }

    pub fn get(&self, worker: usize) -> RowPartition {
        self.parts[worker]
    }

    pub fn row_counts(&self) -> Vec<usize> {
        self.parts.iter().map(|p| p.row_count).collect()
    }

    pub fn row_offsets(&self) -> Vec<usize> {
        self.parts.iter().map(|p| p.row_offset).collect()
    }

    /// Per-worker element counts for a grid `columns` wide.
    pub fn cell_counts(&self, columns: usize) -> Vec<usize> {
        self.parts.iter().map(|p| p.row_count * columns).collect()
    }

    /// Per-worker element offsets for a grid `columns` wide.
    pub fn cell_offsets(&self, columns: usize) -> Vec<usize> {
        self.parts.iter().map(|p| p.row_offset * columns).collect()
    }

    /// World-space box covering the rows `worker` owns.
    pub fn owned_aabb(&self, worker: usize, columns: usize) -> AABB<2> {
        let p = self.get(worker);
        let first = p.row_offset as i32;
        AABB::row_band(first, first + p.row_count as i32 - 1, columns)
    }
}
