use crate::StrError;
use thiserror::Error;

/// Defines the errors that abort an implicit time step
///
/// Non-convergence within the maximum number of iterations is not an error;
/// it is reported as [crate::implicit::NewtonState::MaxIterReached].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ImplicitError {
    /// The global system could not be assembled (e.g., zero active DOFs)
    #[error("assembly failed: {0}")]
    Assembly(StrError),

    /// A constrained DOF index does not exist in the current system
    #[error("constrained DOF index {index} is out of range (n_dof = {n_dof})")]
    ConstraintIndexOutOfRange { index: usize, n_dof: usize },

    /// The linear solver failed (singular system or non-convergence)
    #[error("linear solver failed: {0}")]
    Solver(StrError),

    /// The configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A checkpoint or result file could not be read or written
    #[error("file input/output failed: {0}")]
    Io(StrError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
