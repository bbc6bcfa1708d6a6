use crate::base::NORM_ZERO;

/// Returns the Euclidean norm of a vector
#[inline]
fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Controls the convergence of the Newton-Raphson iterations of a time step
///
/// Two independent criteria are tracked:
///
/// 1. The residual criterion uses `‖R‖`. The reference `‖R₀‖` is the imbalance of the step before
///    the first solve (see [ControlConvergence::record_reference]); if no reference was recorded,
///    the first check (`initial = true`) captures it. The first check uses `‖R‖ < tol_abs` only.
///    At subsequent iterations, the verdict is `‖R‖ < tol_abs` OR `‖R‖ / ‖R₀‖ < tol_rel`.
/// 2. The solution criterion uses `‖Δu‖ / ‖u_total‖` (or `‖Δu‖` if `‖u_total‖` is near zero).
///
/// The norms are reset at the beginning of each time step and printed according to the
/// verbosity level; printing never affects the verdicts.
#[derive(Clone, Debug)]
pub struct ControlConvergence {
    /// Iteration counter (0 at the first check of a step)
    iteration: usize,

    /// Reference residual norm of the time step
    initial_residual_norm: f64,

    /// Indicates that the reference norm was recorded before the first check
    reference_recorded: bool,

    /// Current residual norm
    residual_norm: f64,

    /// Current relative residual norm
    relative_residual_norm: f64,

    /// Norm of the current displacement increment
    solution_norm: f64,

    /// Relative norm of the current displacement increment
    relative_solution_norm: f64,

    /// Residual verdict
    converged_on_residual: bool,

    /// Indicates that the residual norm increased w.r.t. the previous iteration
    diverging_on_residual: bool,

    /// Solution verdict
    converged_on_solution: bool,
}

impl ControlConvergence {
    /// Allocates a new instance
    pub fn new() -> Self {
        ControlConvergence {
            iteration: 0,
            initial_residual_norm: 0.0,
            reference_recorded: false,
            residual_norm: 0.0,
            relative_residual_norm: 0.0,
            solution_norm: 0.0,
            relative_solution_norm: 0.0,
            converged_on_residual: false,
            diverging_on_residual: false,
            converged_on_solution: false,
        }
    }

    /// Resets all scalars for a new time step
    pub fn reset(&mut self) {
        *self = ControlConvergence::new();
    }

    /// Records the reference norm `‖R₀‖` from the residual of the free equations before the first solve
    pub fn record_reference(&mut self, rr_free: &[f64]) {
        self.initial_residual_norm = norm2(rr_free);
        self.reference_recorded = true;
    }

    /// Evaluates the residual criterion
    ///
    /// # Input
    ///
    /// * `initial` -- first check of the time step (captures the reference norm if none was recorded)
    /// * `rr` -- residual vector
    /// * `tol_abs` -- absolute tolerance for `‖R‖`
    /// * `tol_rel` -- relative tolerance for `‖R‖ / ‖R₀‖` (not used if `initial`)
    pub fn check_residual(&mut self, initial: bool, rr: &[f64], tol_abs: f64, tol_rel: f64) -> bool {
        let norm = norm2(rr);
        if initial {
            if !self.reference_recorded {
                self.initial_residual_norm = norm;
            }
            self.iteration = 0;
            self.residual_norm = norm;
            self.relative_residual_norm = self.relative(norm);
            self.diverging_on_residual = false;
            self.converged_on_residual = norm < tol_abs;
            return self.converged_on_residual;
        }
        self.iteration += 1;
        self.diverging_on_residual = norm > self.residual_norm;
        self.residual_norm = norm;
        self.relative_residual_norm = self.relative(norm);
        self.converged_on_residual = norm < tol_abs || self.relative_residual_norm < tol_rel;
        self.converged_on_residual
    }

    /// Returns `‖R‖ / ‖R₀‖` with a guard for a near-zero reference
    fn relative(&self, norm: f64) -> f64 {
        if self.initial_residual_norm > NORM_ZERO {
            norm / self.initial_residual_norm
        } else if norm <= NORM_ZERO {
            0.0
        } else {
            f64::INFINITY
        }
    }

    /// Evaluates the solution criterion
    ///
    /// # Input
    ///
    /// * `du` -- displacement increment of the current iteration
    /// * `du_total` -- displacement increment accumulated in the time step
    /// * `tol` -- tolerance for the (relative) norm of `du`
    pub fn check_solution(&mut self, du: &[f64], du_total: &[f64], tol: f64) -> bool {
        self.solution_norm = norm2(du);
        let total = norm2(du_total);
        self.relative_solution_norm = if total > NORM_ZERO {
            self.solution_norm / total
        } else {
            self.solution_norm
        };
        self.converged_on_solution = self.relative_solution_norm < tol;
        self.converged_on_solution
    }

    /// Returns the iteration counter of the residual checks
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Returns the reference residual norm of the time step
    pub fn initial_residual_norm(&self) -> f64 {
        self.initial_residual_norm
    }

    /// Returns the current residual norm
    pub fn residual_norm(&self) -> f64 {
        self.residual_norm
    }

    /// Returns the current relative residual norm
    pub fn relative_residual_norm(&self) -> f64 {
        self.relative_residual_norm
    }

    /// Returns the norm of the last displacement increment
    pub fn solution_norm(&self) -> f64 {
        self.solution_norm
    }

    /// Returns the relative norm of the last displacement increment
    pub fn relative_solution_norm(&self) -> f64 {
        self.relative_solution_norm
    }

    /// Prints the header of the convergence table
    pub fn print_header(&self, verbosity: u32) {
        if verbosity >= 1 {
            println!("\nMPMSIM === TIME STEPPING AND CONVERGENCE STATISTICS ===========================");
            println!("\nLegend:");
            println!("✅ ─ converged");
            println!("🔹 ─ converging");
            println!("🎈 ─ diverging\n");
            println!("{}", "─".repeat(79));
            println!(
                "{:8} {:>11} {:>11} {:>5} {:>9} {:>9}    {:>9} {:>9}",
                "timestep", "t", "Δt", "iter", "‖R‖", "rel(R)", "‖Δu‖", "rel(Δu)"
            );
            println!("{}", "─".repeat(79));
        }
    }

    /// Prints the time step line
    pub fn print_timestep(&self, verbosity: u32, timestep: usize, t: f64, dt: f64) {
        if verbosity >= 1 {
            println!("{:>8} {:>11.6e} {:>11.6e}", timestep + 1, t, dt);
        }
    }

    /// Prints the residual line of the current iteration
    pub fn print_residual(&self, verbosity: u32) {
        if verbosity >= 2 {
            let icon = self.icon_residual();
            if self.iteration == 0 {
                println!(
                    "{:>8} {:>11} {:>11} {:>5} {:>9.2e} {:>9} {}",
                    "·", "·", "·", self.iteration, self.residual_norm, "·", icon
                );
            } else {
                println!(
                    "{:>8} {:>11} {:>11} {:>5} {:>9.2e} {:>9.2e} {}",
                    "·", "·", "·", self.iteration, self.residual_norm, self.relative_residual_norm, icon
                );
            }
        }
    }

    /// Prints the solution line of the current iteration
    pub fn print_solution(&self, verbosity: u32) {
        if verbosity >= 2 {
            let icon = if self.converged_on_solution { "✅" } else { "🔹" };
            println!(
                "{:>8} {:>11} {:>11} {:>5} {:>9} {:>9}    {:>9.2e} {:>9.2e} {}",
                "·", "·", "·", "", "", "", self.solution_norm, self.relative_solution_norm, icon
            );
        }
    }

    /// Prints the horizontal line at the end of the analysis
    pub fn print_footer(&self, verbosity: u32) {
        if verbosity >= 1 {
            println!("{}", "─".repeat(79));
        }
    }

    /// Returns the icon of the residual verdict
    fn icon_residual(&self) -> &'static str {
        if self.converged_on_residual {
            "✅"
        } else if self.diverging_on_residual {
            "🎈"
        } else {
            "🔹"
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
