//! Implements the background grid, the particles and the material point mesh

mod grid;
mod mpm_mesh;
mod particles;
mod samples;
pub use crate::mpm::grid::*;
pub use crate::mpm::mpm_mesh::*;
pub use crate::mpm::particles::*;
pub use crate::mpm::samples::*;
