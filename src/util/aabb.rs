use crate::util::indexing::*;
use crate::util::*;

/// Axis Aligned Bounding Box (AABB) for coordinate types.
/// Each instance is inclusive of both corners.
/// This class is responsible for alot of indexing operations,
/// where we map between a linear buffer and coordinates.
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub struct AABB<const DIMENSION: usize> {
    pub bounds: Bounds<DIMENSION>,
}

impl<const GRID_DIMENSION: usize> std::fmt::Display for AABB<GRID_DIMENSION> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> Result<(), std::fmt::Error> {
        write!(f, "{:?}", self.bounds)
    }
}

impl<const DIMENSION: usize> AABB<DIMENSION> {
    /// Create AABB from raw bounds.
    #[inline]
    pub fn new(bounds: Bounds<DIMENSION>) -> Self {
        AABB { bounds }
    }

    /// Create AABB from corners.
    pub fn from_mm(min: Coord<DIMENSION>, max: Coord<DIMENSION>) -> Self {
        let result = AABB {
            bounds: Bounds::from_columns(&[min, max]),
        };
        debug_assert!(result.check_validity());
        result
    }

    /// Moving min to the origin, returns the exclusie size in each direction
    /// i.e. [0, 9]  would have exclusive size of 10.
    pub fn exclusive_bounds(&self) -> Coord<DIMENSION> {
        (self.bounds.column(1) - self.bounds.column(0)).add_scalar(1)
    }

    /// Return the number of coordinates contained in the instance.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        real_buffer_size(&self.exclusive_bounds())
    }

    /// Return the linear index for a coord in the instance
    pub fn coord_to_linear(&self, coord: &Coord<DIMENSION>) -> usize {
        coord_to_linear(&(coord - self.min()), &self.exclusive_bounds())
    }

    /// Return the coordinate in the instance for a given linear index.
    pub fn linear_to_coord(&self, index: usize) -> Coord<DIMENSION> {
        linear_to_coord(index, &self.exclusive_bounds()) + self.min()
    }

    /// Check whether the instance contains a coordinate.
    pub fn contains(&self, coord: &Coord<DIMENSION>) -> bool {
        for d in 0..DIMENSION {
            if coord[d] < self.bounds[(d, 0)] || coord[d] > self.bounds[(d, 1)]
            {
                return false;
            }
        }
        true
    }

    /// Check whether another AABB is contained in the instance.
    pub fn contains_aabb(&self, other: &Self) -> bool {
        for d in 0..DIMENSION {
            if other.bounds[(d, 0)] < self.bounds[(d, 0)]
                || other.bounds[(d, 1)] > self.bounds[(d, 1)]
            {
                return false;
            }
        }
        true
    }

    /// Return min corner.
    pub fn min(&self) -> Coord<DIMENSION> {
        self.bounds.column(0).into()
    }

    /// Return max corner
    pub fn max(&self) -> Coord<DIMENSION> {
        self.bounds.column(1).into()
    }

    /// Check that max >= min
    pub fn check_validity(&self) -> bool {
        for d in 0..DIMENSION {
            if self.bounds[(d, 0)] > self.bounds[(d, 1)] {
                return false;
            }
        }
        true
    }

    /// Return iterator over contained coords
    /// in linear ordering.
    pub fn coord_iter(&self) -> impl Iterator<Item = Coord<DIMENSION>> + '_ {
        (0..self.buffer_size()).map(|i| self.linear_to_coord(i))
    }
}

impl AABB<2> {
    /// Rows `[first_row, last_row]` spanning `columns` full columns.
    pub fn row_band(first_row: i32, last_row: i32, columns: usize) -> Self {
        AABB::from_mm(vector![first_row, 0], vector![last_row, columns as i32 - 1])
    }

    /// Square `n` by `n` box with its min corner at the origin.
    pub fn square(n: usize) -> Self {
        Self::row_band(0, n as i32 - 1, n)
    }

    pub fn rows(&self) -> std::ops::RangeInclusive<i32> {
        self.bounds[(0, 0)]..=self.bounds[(0, 1)]
    }

    pub fn row_count(&self) -> usize {
        self.exclusive_bounds()[0] as usize
    }

    pub fn column_count(&self) -> usize {
        self.exclusive_bounds()[1] as usize
    }
}
