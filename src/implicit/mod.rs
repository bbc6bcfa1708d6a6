//! Implements the implicit solver: global assembly, constraints, convergence control and
//! Newton-Raphson iterations

mod assembler_implicit;
mod checkpoint;
mod control_convergence;
mod implicit_mesh;
mod linear_solver;
mod newton_raphson;
mod solver_implicit;
#[cfg(test)]
mod testing;
pub use crate::implicit::assembler_implicit::*;
pub use crate::implicit::checkpoint::*;
pub use crate::implicit::control_convergence::*;
pub use crate::implicit::implicit_mesh::*;
pub use crate::implicit::linear_solver::*;
pub use crate::implicit::newton_raphson::*;
pub use crate::implicit::solver_implicit::*;
#[cfg(test)]
pub(crate) use crate::implicit::testing::*;
