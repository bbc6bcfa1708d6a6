use crate::FnTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines degrees-of-freedom (DOF) types
///
/// Note: The fixed numbering scheme is also the component index within a node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Dof {
    /// Displacement along the first dimension
    Ux = 0,

    /// Displacement along the second dimension
    Uy = 1,

    /// Displacement along the third dimension
    Uz = 2,
}

impl Dof {
    /// Returns the component index of this DOF within a node
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Returns the displacement DOF corresponding to a component index
    pub fn from_index(component: usize) -> Option<Self> {
        match component {
            0 => Some(Dof::Ux),
            1 => Some(Dof::Uy),
            2 => Some(Dof::Uz),
            _ => None,
        }
    }
}

/// Defines essential boundary conditions (EBC) on grid nodes
///
/// The function gives the prescribed (total) displacement as a function of time.
#[derive(Clone, Copy, Debug)]
pub enum Ebc {
    Ux(FnTime),
    Uy(FnTime),
    Uz(FnTime),
}

impl Ebc {
    /// Returns the DOF corresponding to this EBC
    pub fn dof(&self) -> Dof {
        match self {
            Ebc::Ux(..) => Dof::Ux,
            Ebc::Uy(..) => Dof::Uy,
            Ebc::Uz(..) => Dof::Uz,
        }
    }

    /// Evaluates the prescribed displacement at time t
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Ebc::Ux(f) => f(t),
            Ebc::Uy(f) => f(t),
            Ebc::Uz(f) => f(t),
        }
    }
}

impl fmt::Display for Ebc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ebc::Ux(..) => "Ux",
            Ebc::Uy(..) => "Uy",
            Ebc::Uz(..) => "Uz",
        };
        write!(f, "{}(0) = {:?}, {}(1) = {:?}", name, self.value(0.0), name, self.value(1.0))
    }
}

/// Defines point boundary conditions (e.g., concentrated forces) acting on particles
#[derive(Clone, Copy, Debug)]
pub enum Pbc {
    Fx(FnTime),
    Fy(FnTime),
    Fz(FnTime),
}

impl Pbc {
    /// Returns the DOF corresponding to this PBC
    pub fn dof(&self) -> Dof {
        match self {
            Pbc::Fx(..) => Dof::Ux,
            Pbc::Fy(..) => Dof::Uy,
            Pbc::Fz(..) => Dof::Uz,
        }
    }

    /// Evaluates the force at time t
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Pbc::Fx(f) => f(t),
            Pbc::Fy(f) => f(t),
            Pbc::Fz(f) => f(t),
        }
    }
}

impl fmt::Display for Pbc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pbc::Fx(..) => "Fx",
            Pbc::Fy(..) => "Fy",
            Pbc::Fz(..) => "Fz",
        };
        write!(f, "{}(0) = {:?}, {}(1) = {:?}", name, self.value(0.0), name, self.value(1.0))
    }
}

/// Selects the linear solver used by the Newton-Raphson iterations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum LinSolKind {
    /// Dense LU factorization (small systems and debugging)
    Direct,

    /// Jacobi-preconditioned BiCGSTAB
    BiCgStab,
}

/// Selects which convergence criterion ends the Newton-Raphson iterations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum ConvergenceGate {
    /// Converged when the residual criterion is satisfied
    Residual,

    /// Converged when the solution (displacement increment) criterion is satisfied
    Solution,

    /// Converged when any criterion is satisfied
    Either,

    /// Converged when both criteria are satisfied
    Both,
}

impl ConvergenceGate {
    /// Combines the residual and solution verdicts
    pub fn converged(&self, on_residual: bool, on_solution: bool) -> bool {
        match self {
            ConvergenceGate::Residual => on_residual,
            ConvergenceGate::Solution => on_solution,
            ConvergenceGate::Either => on_residual || on_solution,
            ConvergenceGate::Both => on_residual && on_solution,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
