pub mod build_info;
pub mod cli;
pub mod collector;
pub mod comm;
pub mod domain;
pub mod error;
pub mod halo;
pub mod initial_conditions;
pub mod output;
pub mod partition;
pub mod solver;
pub mod stencil;
pub mod util;
