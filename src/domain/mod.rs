//! This module has things for managing the domain,
//! which really means retrieving values based on world coordinates.
//! The coordinator holds the whole grid, every worker holds a band of it.
//! Views translate from world coordinates into buffer coordinates.

mod band;
mod domain_view;
mod grid;

pub use band::*;
pub use domain_view::*;
pub use grid::*;
