//! Makes available common structures needed to run a simulation
//!
//! You may write `use mpmsim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Config, ConvergenceGate, Dof, Ebc, Essential, LinSolKind, Natural, Pbc, DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::base::{ImplicitError, ParamSolid, ParamStressStrain};
pub use crate::implicit::{AssemblerImplicit, Checkpoint, ImplicitMesh, NewtonRaphson, NewtonState, RunSummary};
pub use crate::implicit::{BiCgStabSolver, DirectSolver, LinearSolver, SolverImplicit};
pub use crate::mpm::{Grid, MpmMesh, Particles, Samples};
