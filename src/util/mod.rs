mod aabb;
pub mod indexing;
pub use aabb::*;

pub use nalgebra::{matrix, vector};

/// World coordinate, slowest dimension first.
/// For the heat grid that is `[row, column]`.
pub type Coord<const GRID_DIMENSION: usize> =
    nalgebra::SVector<i32, { GRID_DIMENSION }>;

/// Inclusive `[min, max]` per dimension, one row per dimension.
pub type Bounds<const GRID_DIMENSION: usize> =
    nalgebra::SMatrix<i32, { GRID_DIMENSION }, 2>;
