use super::*;
use crate::error::*;
use crate::util::*;

/// The full `N` by `N` field. Only the coordinator ever builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    aabb: AABB<2>,
    buffer: Vec<f64>,
}

impl Grid {
    pub fn new(size: usize) -> HeatResult<Self> {
        if size == 0 {
            return Err(HeatError::invalid("grid size must be positive"));
        }
        let buffer = try_alloc_zeroed(size, size)?;
        Ok(Grid {
            aabb: AABB::square(size),
            buffer,
        })
    }

    /// Wrap a row-major buffer of exactly `size * size` values.
    pub fn from_buffer(size: usize, buffer: Vec<f64>) -> HeatResult<Self> {
        if size == 0 || buffer.len() != size * size {
            return Err(HeatError::invalid(format!(
                "buffer of {} values cannot hold a {}x{} grid",
                buffer.len(),
                size,
                size
            )));
        }
        Ok(Grid {
            aabb: AABB::square(size),
            buffer,
        })
    }

    pub fn size(&self) -> usize {
        self.aabb.row_count()
    }

    #[track_caller]
    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.size();
        &self.buffer[row * n..(row + 1) * n]
    }

    /// `count` consecutive rows starting at `first`, as one slice.
    #[track_caller]
    pub fn rows(&self, first: usize, count: usize) -> &[f64] {
        let n = self.size();
        &self.buffer[first * n..(first + count) * n]
    }

    #[track_caller]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.view(&vector![row as i32, column as i32])
    }
}

impl DomainView<2> for Grid {
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
