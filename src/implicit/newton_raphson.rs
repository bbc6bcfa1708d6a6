use super::{AssemblerImplicit, ImplicitMesh, LinearSolver};
use crate::base::{Config, ImplicitError};

/// Defines the states of the Newton-Raphson iterations of one time step
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewtonState {
    /// The time step has not started yet
    Start,

    /// K and R are being assembled
    Assembling,

    /// The displacement constraints are being assigned or applied
    Constraining,

    /// The linear system is being solved and the mesh updated
    Solving,

    /// The gating criterion is satisfied
    Converged,

    /// The maximum number of iterations was reached (the step result is usable but flagged)
    MaxIterReached,

    /// Assembly, constraints or the linear solver failed
    Failed,
}

/// Holds the outcome of one time step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Final state (Converged or MaxIterReached)
    pub state: NewtonState,

    /// Number of Newton iterations (linear solves)
    pub n_iterations: usize,

    /// Final residual norm
    pub residual_norm: f64,

    /// Final relative residual norm
    pub relative_residual_norm: f64,

    /// Norm of the last displacement increment
    pub solution_norm: f64,
}

/// Drives the Newton-Raphson iterations of one time step
///
/// Each iteration performs:
///
/// ```text
/// assemble K, R → (first iteration) assign constraints → apply constraints
///   → (first iteration) record ‖R₀‖ → solve K Δu = R → accumulate Δu → update the mesh
///   → assemble R → check convergence
/// ```
///
/// The reference norm ‖R₀‖ is the imbalance of the free equations before the first solve. The
/// residual check of the first iteration is the `initial` one (absolute tolerance only). Failures are not retried; they propagate to the
/// caller with the state set to [NewtonState::Failed].
pub struct NewtonRaphson<'a> {
    config: &'a Config,
    state: NewtonState,
}

impl<'a> NewtonRaphson<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config) -> Self {
        NewtonRaphson {
            config,
            state: NewtonState::Start,
        }
    }

    /// Returns the current state
    pub fn state(&self) -> NewtonState {
        self.state
    }

    /// Solves the nonlinear equilibrium of one time step
    ///
    /// # Input
    ///
    /// * `assembler` -- owns K, R, the constraints and Δu; it is reset here
    /// * `solver` -- linear solver for K Δu = R
    /// * `mesh` -- provides the contributions and receives the displacement increments
    /// * `time` -- time at the end of the step (for the prescribed displacements)
    pub fn step<M>(
        &mut self,
        assembler: &mut AssemblerImplicit,
        solver: &mut dyn LinearSolver,
        mesh: &mut M,
        time: f64,
    ) -> Result<StepReport, ImplicitError>
    where
        M: ImplicitMesh + ?Sized,
    {
        self.state = NewtonState::Start;
        let result = self.iterate(assembler, solver, mesh, time);
        if result.is_err() {
            self.state = NewtonState::Failed;
        }
        result
    }

    fn iterate<M>(
        &mut self,
        assembler: &mut AssemblerImplicit,
        solver: &mut dyn LinearSolver,
        mesh: &mut M,
        time: f64,
    ) -> Result<StepReport, ImplicitError>
    where
        M: ImplicitMesh + ?Sized,
    {
        let cfg = self.config;
        assembler.reset(mesh.active_dof_count());
        let mut iteration = 0;
        loop {
            self.state = NewtonState::Assembling;
            assembler.assemble_stiffness_matrix(&*mesh)?;
            assembler.assemble_residual_force_right(&*mesh)?;

            self.state = NewtonState::Constraining;
            if iteration == 0 {
                assembler.assign_displacement_constraints(&*mesh, time)?;
                assembler.apply_displacement_constraints()?;
                assembler.record_reference_residual();
            } else {
                assembler.apply_displacement_constraints()?;
            }

            self.state = NewtonState::Solving;
            let du = solver
                .solve(assembler.kk(), assembler.rr())
                .map_err(ImplicitError::Solver)?;
            assembler.update_displacement_increment(du)?;
            mesh.apply_displacement_increment(assembler.du())
                .map_err(ImplicitError::Assembly)?;
            iteration += 1;

            self.state = NewtonState::Assembling;
            assembler.assemble_residual_force_right(&*mesh)?;
            let on_residual = assembler.check_residual_convergence(
                iteration == 1,
                cfg.verbosity,
                cfg.tol_residual_abs,
                cfg.tol_residual_rel,
            );
            let on_solution = assembler.check_solution_convergence(cfg.verbosity, cfg.tol_solution);

            if cfg.convergence_gate.converged(on_residual, on_solution) {
                self.state = NewtonState::Converged;
            } else if iteration >= cfg.n_max_iterations {
                self.state = NewtonState::MaxIterReached;
            } else {
                continue;
            }
            let convergence = assembler.convergence();
            return Ok(StepReport {
                state: self.state,
                n_iterations: iteration,
                residual_norm: convergence.residual_norm(),
                relative_residual_norm: convergence.relative_residual_norm(),
                solution_norm: convergence.solution_norm(),
            });
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
