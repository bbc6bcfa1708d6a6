//! Implicit Material Point Method (MPM) simulator
//!
//! The core of this crate is the [implicit] module: it assembles the global tangent stiffness
//! matrix and residual vector from per-particle and per-node contributions, enforces prescribed
//! displacements, and drives the Newton-Raphson iterations of each time step.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

/// Defines a function of time
pub type FnTime = fn(f64) -> f64;

pub mod base;
pub mod implicit;
pub mod material;
pub mod mpm;
pub mod prelude;
