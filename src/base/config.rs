use super::{ConvergenceGate, LinSolKind, CONFIG_MIN_DT, CONFIG_MIN_TOL};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds configuration parameters for the implicit MPM time stepping
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Space dimension (2 means plane-strain)
    pub ndim: usize,

    /// Initial time
    pub t_ini: f64,

    /// Time increment Δt
    pub dt: f64,

    /// Maximum number of time steps
    pub n_max_time_steps: usize,

    /// Maximum number of Newton-Raphson iterations per time step
    pub n_max_iterations: usize,

    /// Absolute tolerance for the norm of the residual vector
    pub tol_residual_abs: f64,

    /// Relative tolerance for the norm of the residual vector (w.r.t. the first iteration)
    pub tol_residual_rel: f64,

    /// Tolerance for the relative norm of the displacement increment
    pub tol_solution: f64,

    /// Selects which criterion ends the Newton-Raphson iterations
    pub convergence_gate: ConvergenceGate,

    /// Selects the linear solver
    pub linear_solver: LinSolKind,

    /// Tolerance for iterative linear solvers
    pub lin_sol_tol: f64,

    /// Maximum number of iterations for iterative linear solvers
    pub lin_sol_max_iterations: usize,

    /// Number of nodes coupled to a node (None means 3ᵈ for linear shape functions)
    ///
    /// This value is used to reserve memory for the sparse stiffness matrix.
    pub node_neighbourhood: Option<usize>,

    /// Assembles the local contributions in parallel
    pub parallel_assembly: bool,

    /// Ignores inertia (and damping) terms
    pub quasi_static: bool,

    /// Newmark β coefficient; 0 < β ≤ 0.5
    pub newmark_beta: f64,

    /// Newmark γ coefficient; 0 < γ ≤ 1
    pub newmark_gamma: f64,

    /// Mass-proportional (Rayleigh) damping coefficient
    pub damping_alpha: f64,

    /// Gravity acceleration (acting along the negative direction of the last axis)
    pub gravity: f64,

    /// Verbosity level: 0 is silent, 1 prints timesteps, 2 also prints iterations
    pub verbosity: u32,

    /// Writes a checkpoint file every this number of time steps (0 means never)
    pub checkpoint_every: usize,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new(ndim: usize) -> Self {
        Config {
            ndim,
            t_ini: 0.0,
            dt: 0.01,
            n_max_time_steps: 10,
            n_max_iterations: 20,
            tol_residual_abs: 1e-8,
            tol_residual_rel: 1e-6,
            tol_solution: 1e-8,
            convergence_gate: ConvergenceGate::Residual,
            linear_solver: LinSolKind::Direct,
            lin_sol_tol: 1e-12,
            lin_sol_max_iterations: 1_000,
            node_neighbourhood: None,
            parallel_assembly: false,
            quasi_static: false,
            newmark_beta: 0.25,
            newmark_gamma: 0.5,
            damping_alpha: 0.0,
            gravity: 0.0,
            verbosity: 0,
            checkpoint_every: 0,
        }
    }

    /// Sets the initial time
    pub fn set_t_ini(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("t_ini must be ≥ 0.0");
        }
        self.t_ini = value;
        Ok(self)
    }

    /// Sets the time increment
    pub fn set_dt(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONFIG_MIN_DT {
            return Err("dt must be ≥ 1e-10");
        }
        self.dt = value;
        Ok(self)
    }

    /// Sets the maximum number of time steps
    pub fn set_n_max_time_steps(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_time_steps must be ≥ 1");
        }
        self.n_max_time_steps = value;
        Ok(self)
    }

    /// Sets the maximum number of Newton-Raphson iterations
    pub fn set_n_max_iterations(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("n_max_iterations must be ≥ 1");
        }
        self.n_max_iterations = value;
        Ok(self)
    }

    /// Sets the absolute and relative tolerances for the residual vector
    pub fn set_tol_residual(&mut self, abs: f64, rel: f64) -> Result<&mut Self, StrError> {
        if abs < CONFIG_MIN_TOL || rel < CONFIG_MIN_TOL {
            return Err("residual tolerances must be ≥ 1e-15");
        }
        self.tol_residual_abs = abs;
        self.tol_residual_rel = rel;
        Ok(self)
    }

    /// Sets the tolerance for the displacement increment
    pub fn set_tol_solution(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < CONFIG_MIN_TOL {
            return Err("tol_solution must be ≥ 1e-15");
        }
        self.tol_solution = value;
        Ok(self)
    }

    /// Sets the convergence gate
    pub fn set_convergence_gate(&mut self, gate: ConvergenceGate) -> Result<&mut Self, StrError> {
        self.convergence_gate = gate;
        Ok(self)
    }

    /// Sets the linear solver
    pub fn set_linear_solver(&mut self, kind: LinSolKind) -> Result<&mut Self, StrError> {
        self.linear_solver = kind;
        Ok(self)
    }

    /// Sets the parameters of iterative linear solvers
    pub fn set_lin_sol_params(&mut self, tol: f64, max_iterations: usize) -> Result<&mut Self, StrError> {
        if tol < CONFIG_MIN_TOL {
            return Err("lin_sol_tol must be ≥ 1e-15");
        }
        if max_iterations < 1 {
            return Err("lin_sol_max_iterations must be ≥ 1");
        }
        self.lin_sol_tol = tol;
        self.lin_sol_max_iterations = max_iterations;
        Ok(self)
    }

    /// Sets the number of nodes coupled to a node
    pub fn set_node_neighbourhood(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("node_neighbourhood must be ≥ 1");
        }
        self.node_neighbourhood = Some(value);
        Ok(self)
    }

    /// Enables or disables the parallel assembly
    pub fn set_parallel_assembly(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.parallel_assembly = flag;
        Ok(self)
    }

    /// Sets a quasi-static analysis (no inertia)
    pub fn set_quasi_static(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.quasi_static = flag;
        Ok(self)
    }

    /// Sets the Newmark coefficients
    pub fn set_newmark(&mut self, beta: f64, gamma: f64) -> Result<&mut Self, StrError> {
        if beta <= 0.0 || beta > 0.5 {
            return Err("Newmark β must satisfy 0 < β ≤ 0.5");
        }
        if gamma <= 0.0 || gamma > 1.0 {
            return Err("Newmark γ must satisfy 0 < γ ≤ 1");
        }
        self.newmark_beta = beta;
        self.newmark_gamma = gamma;
        Ok(self)
    }

    /// Sets the mass-proportional damping coefficient
    pub fn set_damping_alpha(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("damping_alpha must be ≥ 0.0");
        }
        self.damping_alpha = value;
        Ok(self)
    }

    /// Sets the gravity acceleration
    pub fn set_gravity(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("gravity must be ≥ 0.0");
        }
        self.gravity = value;
        Ok(self)
    }

    /// Sets the verbosity level
    pub fn set_verbosity(&mut self, level: u32) -> Result<&mut Self, StrError> {
        self.verbosity = level;
        Ok(self)
    }

    /// Sets the number of time steps between checkpoints (0 means never)
    pub fn set_checkpoint_every(&mut self, value: usize) -> Result<&mut Self, StrError> {
        self.checkpoint_every = value;
        Ok(self)
    }

    /// Returns the number of nodes coupled to a node
    pub fn neighbourhood(&self) -> usize {
        match self.node_neighbourhood {
            Some(n) => n,
            None => usize::pow(3, self.ndim as u32),
        }
    }

    /// Returns the Newmark coefficients multiplying the nodal mass and damping in the tangent
    ///
    /// Returns `(c_mass, c_damping)` such that `∂a/∂u = c_mass` and `∂v/∂u = c_damping`.
    pub fn newmark_tangent_coefficients(&self) -> (f64, f64) {
        if self.quasi_static {
            return (0.0, 0.0);
        }
        let dt = self.dt;
        let c_mass = 1.0 / (self.newmark_beta * dt * dt);
        let c_damping = self.newmark_gamma / (self.newmark_beta * dt);
        (c_mass, c_damping)
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.ndim < 2 || self.ndim > 3 {
            return Some(format!("ndim = {:?} is incorrect; it must be 2 or 3", self.ndim));
        }
        if self.t_ini < 0.0 {
            return Some(format!("t_ini = {:?} is incorrect; it must be ≥ 0.0", self.t_ini));
        }
        if self.dt < CONFIG_MIN_DT {
            return Some(format!("dt = {:?} is incorrect; it must be ≥ {:e}", self.dt, CONFIG_MIN_DT));
        }
        if self.n_max_iterations < 1 {
            return Some(format!(
                "n_max_iterations = {:?} is incorrect; it must be ≥ 1",
                self.n_max_iterations
            ));
        }
        if self.tol_residual_abs < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_residual_abs = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_residual_abs, CONFIG_MIN_TOL
            ));
        }
        if self.tol_residual_rel < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_residual_rel = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_residual_rel, CONFIG_MIN_TOL
            ));
        }
        if self.tol_solution < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_solution = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_solution, CONFIG_MIN_TOL
            ));
        }
        if self.newmark_beta <= 0.0 || self.newmark_beta > 0.5 {
            return Some(format!(
                "newmark_beta = {:?} is incorrect; it must be 0 < β ≤ 0.5",
                self.newmark_beta
            ));
        }
        if self.newmark_gamma <= 0.0 || self.newmark_gamma > 1.0 {
            return Some(format!(
                "newmark_gamma = {:?} is incorrect; it must be 0 < γ ≤ 1",
                self.newmark_gamma
            ));
        }
        if self.damping_alpha < 0.0 {
            return Some(format!(
                "damping_alpha = {:?} is incorrect; it must be ≥ 0.0",
                self.damping_alpha
            ));
        }
        if self.gravity < 0.0 {
            return Some(format!("gravity = {:?} is incorrect; it must be ≥ 0.0", self.gravity));
        }
        None // all good
    }

    /// Reads a JSON file containing the configuration
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let config = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(config)
    }

    /// Writes a JSON file with the configuration
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration data\n")?;
        write!(f, "==================\n")?;
        write!(f, "ndim = {:?}\n", self.ndim)?;
        write!(f, "t_ini = {:?}\n", self.t_ini)?;
        write!(f, "dt = {:?}\n", self.dt)?;
        write!(f, "n_max_time_steps = {:?}\n", self.n_max_time_steps)?;
        write!(f, "quasi_static = {:?}\n", self.quasi_static)?;
        write!(f, "newmark (β, γ) = ({:?}, {:?})\n", self.newmark_beta, self.newmark_gamma)?;
        write!(f, "damping_alpha = {:?}\n", self.damping_alpha)?;
        write!(f, "gravity = {:?}\n", self.gravity)?;
        write!(f, "\nNewton-Raphson\n")?;
        write!(f, "==============\n")?;
        write!(f, "n_max_iterations = {:?}\n", self.n_max_iterations)?;
        write!(f, "tol_residual_abs = {:?}\n", self.tol_residual_abs)?;
        write!(f, "tol_residual_rel = {:?}\n", self.tol_residual_rel)?;
        write!(f, "tol_solution = {:?}\n", self.tol_solution)?;
        write!(f, "convergence_gate = {:?}\n", self.convergence_gate)?;
        write!(f, "\nLinear system\n")?;
        write!(f, "=============\n")?;
        write!(f, "linear_solver = {:?}\n", self.linear_solver)?;
        write!(f, "node_neighbourhood = {:?}\n", self.neighbourhood())?;
        write!(f, "parallel_assembly = {:?}\n", self.parallel_assembly)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
