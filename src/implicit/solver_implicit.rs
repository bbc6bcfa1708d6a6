use super::{new_linear_solver, AssemblerImplicit, Checkpoint, LinearSolver, NewtonRaphson, NewtonState};
use crate::base::{Config, ImplicitError};
use crate::mpm::MpmMesh;
use serde::{Deserialize, Serialize};

/// Holds the statistics of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Index of the first time step of the run (non-zero when resuming)
    pub first_step: usize,

    /// Number of completed time steps (including steps completed before resuming)
    pub n_steps: usize,

    /// Number of Newton-Raphson iterations of each time step of this run
    pub n_iterations: Vec<usize>,

    /// Number of time steps that reached the maximum number of iterations
    pub n_non_converged: usize,
}

/// Implements the implicit time-step driver of the material point method
///
/// Each time step `n` (zero-based) advances the time to `t_ini + (n + 1) Δt` and runs:
///
/// ```text
/// particles → grid (P2G) → Newton-Raphson → grid → particles (G2P)
/// ```
///
/// A step that reaches the maximum number of iterations is accepted with a warning. Assembly and
/// solver failures abort the run; if an output directory is given, a checkpoint of the last
/// converged state is written before returning the error.
pub struct SolverImplicit {
    /// Holds the configuration
    config: Config,

    /// Holds the global system and the convergence scalars
    assembler: AssemblerImplicit,

    /// Holds the linear solver
    solver: Box<dyn LinearSolver>,
}

impl SolverImplicit {
    /// Allocates a new instance
    pub fn new(config: &Config) -> Result<Self, ImplicitError> {
        if let Some(msg) = config.validate() {
            return Err(ImplicitError::Config(msg));
        }
        Ok(SolverImplicit {
            config: config.clone(),
            assembler: AssemblerImplicit::new(config),
            solver: new_linear_solver(config),
        })
    }

    /// Returns the assembler (global system of the last iteration)
    pub fn assembler(&self) -> &AssemblerImplicit {
        &self.assembler
    }

    /// Runs the time steps `start_step..n_max_time_steps`
    ///
    /// # Input
    ///
    /// * `mesh` -- the material point mesh (particles at the end of step `start_step`)
    /// * `start_step` -- number of time steps already completed
    /// * `out_dir` -- directory for the checkpoint files; None disables checkpoints
    pub fn run(
        &mut self,
        mesh: &mut MpmMesh,
        start_step: usize,
        out_dir: Option<&str>,
    ) -> Result<RunSummary, ImplicitError> {
        let config = &self.config;
        if config.ndim != mesh.config.ndim {
            return Err(ImplicitError::Config(format!(
                "ndim = {} of the solver differs from ndim = {} of the mesh",
                config.ndim, mesh.config.ndim
            )));
        }

        // saves the last converged state before returning an error
        macro_rules! run {
            ($step:expr, $e:expr) => {
                match $e {
                    Ok(val) => val,
                    Err(err) => {
                        if let Some(dir) = out_dir {
                            let path = Checkpoint::path(dir, $step);
                            if let Err(e) = Checkpoint::new(mesh, $step).write_json(&path) {
                                println!("ERROR-ON-ERROR: cannot write checkpoint due to: {}", e);
                            }
                        }
                        return Err(err);
                    }
                }
            };
        }

        let mut summary = RunSummary {
            first_step: start_step,
            n_steps: start_step,
            n_iterations: Vec::new(),
            n_non_converged: 0,
        };
        let convergence = self.assembler.convergence().clone();
        convergence.print_header(config.verbosity);

        for step in start_step..config.n_max_time_steps {
            let time = config.t_ini + ((step + 1) as f64) * config.dt;
            convergence.print_timestep(config.verbosity, step, time, config.dt);

            run!(step, mesh.initialize_step(time).map_err(ImplicitError::Assembly));
            let mut newton = NewtonRaphson::new(config);
            let report = run!(
                step,
                newton.step(&mut self.assembler, self.solver.as_mut(), mesh, time)
            );
            if report.state == NewtonState::MaxIterReached {
                summary.n_non_converged += 1;
                if config.verbosity >= 1 {
                    println!(
                        "WARNING: time step {} did not converge in {} iterations (‖R‖ = {:.2e})",
                        step + 1,
                        report.n_iterations,
                        report.residual_norm
                    );
                }
            }
            run!(step, mesh.finalize_step().map_err(ImplicitError::Assembly));

            summary.n_steps = step + 1;
            summary.n_iterations.push(report.n_iterations);
            if let Some(dir) = out_dir {
                let every = config.checkpoint_every;
                if every > 0 && (step + 1) % every == 0 {
                    Checkpoint::new(mesh, step + 1).write_json(&Checkpoint::path(dir, step + 1))?;
                }
            }
        }
        convergence.print_footer(config.verbosity);
        Ok(summary)
    }

    /// Restores the particles from a checkpoint file and runs the remaining time steps
    pub fn resume<P>(
        &mut self,
        mesh: &mut MpmMesh,
        checkpoint_path: &P,
        out_dir: Option<&str>,
    ) -> Result<RunSummary, ImplicitError>
    where
        P: AsRef<std::ffi::OsStr> + ?Sized,
    {
        let checkpoint = Checkpoint::read_json(checkpoint_path)?;
        checkpoint.restore(mesh)?;
        self.run(mesh, checkpoint.step, out_dir)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
