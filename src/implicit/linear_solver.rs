use crate::base::{Config, LinSolKind};
use crate::StrError;
use nalgebra::{DMatrix, DVector};
use sprs::CsMat;

/// Defines the capability of solving the linearized system K Δu = R
pub trait LinearSolver: Send {
    /// Solves the linear system and returns Δu
    fn solve(&mut self, kk: &CsMat<f64>, rr: &[f64]) -> Result<Vec<f64>, StrError>;

    /// Returns the name of the solver
    fn name(&self) -> &str;
}

/// Allocates the linear solver selected in the configuration
pub fn new_linear_solver(config: &Config) -> Box<dyn LinearSolver> {
    match config.linear_solver {
        LinSolKind::Direct => Box::new(DirectSolver::new()),
        LinSolKind::BiCgStab => Box::new(
            BiCgStabSolver::new()
                .with_tolerance(config.lin_sol_tol)
                .with_max_iterations(config.lin_sol_max_iterations),
        ),
    }
}

/// Checks the dimensions of the linear system
fn check_dims(kk: &CsMat<f64>, rr: &[f64]) -> Result<(), StrError> {
    if kk.rows() != kk.cols() {
        return Err("the matrix must be square");
    }
    if kk.rows() != rr.len() {
        return Err("the matrix and the right-hand side have incompatible dimensions");
    }
    Ok(())
}

/// Implements a direct solver using the dense LU decomposition
///
/// Good for small systems and debugging.
pub struct DirectSolver {}

impl DirectSolver {
    pub fn new() -> Self {
        DirectSolver {}
    }
}

impl LinearSolver for DirectSolver {
    fn solve(&mut self, kk: &CsMat<f64>, rr: &[f64]) -> Result<Vec<f64>, StrError> {
        check_dims(kk, rr)?;
        let n = rr.len();
        let mut dense = DMatrix::<f64>::zeros(n, n);
        for (value, (i, j)) in kk.iter() {
            dense[(i, j)] += *value;
        }
        let lu = dense.lu();
        let x = lu
            .solve(&DVector::from_column_slice(rr))
            .ok_or("cannot solve the linear system because the matrix is singular")?;
        if x.iter().any(|v| !v.is_finite()) {
            return Err("cannot solve the linear system because the matrix is singular");
        }
        Ok(x.as_slice().to_vec())
    }

    fn name(&self) -> &str {
        "Direct (dense LU)"
    }
}

/// Implements the Jacobi-preconditioned BiCGSTAB solver for non-symmetric systems
pub struct BiCgStabSolver {
    max_iterations: usize,
    tolerance: f64,
    abs_tolerance: f64,

    /// Number of iterations of the last solve
    iterations: usize,
}

impl BiCgStabSolver {
    pub fn new() -> Self {
        BiCgStabSolver {
            max_iterations: 1000,
            tolerance: 1e-12,
            abs_tolerance: 1e-30,
            iterations: 0,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Returns the number of iterations of the last solve
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Computes y = A x
fn mat_vec(a: &CsMat<f64>, x: &[f64]) -> Vec<f64> {
    a.outer_iterator()
        .map(|row| row.iter().map(|(j, v)| v * x[j]).sum())
        .collect()
}

/// Computes the dot product
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl LinearSolver for BiCgStabSolver {
    fn solve(&mut self, kk: &CsMat<f64>, rr: &[f64]) -> Result<Vec<f64>, StrError> {
        check_dims(kk, rr)?;
        if !kk.is_csr() {
            return Err("BiCGSTAB requires a matrix in CSR format");
        }
        let n = rr.len();
        self.iterations = 0;
        let b_norm = dot(rr, rr).sqrt();
        if b_norm < 1e-25 {
            return Ok(vec![0.0; n]);
        }

        // Jacobi preconditioner
        let mut inv_diag = vec![1.0; n];
        for i in 0..n {
            if let Some(d) = kk.get(i, i) {
                if d.abs() > f64::EPSILON {
                    inv_diag[i] = 1.0 / d;
                }
            }
        }
        let precond = |v: &[f64]| -> Vec<f64> { v.iter().zip(&inv_diag).map(|(x, d)| x * d).collect() };

        let mut x = vec![0.0; n];
        let mut r = rr.to_vec();
        let r_hat = r.clone();
        let mut rho = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        let mut v = vec![0.0; n];
        let mut p = vec![0.0; n];

        while self.iterations < self.max_iterations {
            let rho_prev = rho;
            rho = dot(&r_hat, &r);
            if rho.abs() < 1e-300 {
                return Err("BiCGSTAB failed due to breakdown (ρ = 0)");
            }
            if self.iterations == 0 {
                p.copy_from_slice(&r);
            } else {
                let beta = (rho / rho_prev) * (alpha / omega);
                for i in 0..n {
                    p[i] = r[i] + beta * (p[i] - omega * v[i]);
                }
            }
            let p_hat = precond(&p);
            v = mat_vec(kk, &p_hat);
            let rhat_v = dot(&r_hat, &v);
            if rhat_v.abs() < 1e-300 {
                return Err("BiCGSTAB failed due to breakdown (r̂·v = 0)");
            }
            alpha = rho / rhat_v;
            let s: Vec<f64> = r.iter().zip(&v).map(|(ri, vi)| ri - alpha * vi).collect();
            let s_norm = dot(&s, &s).sqrt();
            if s_norm < self.tolerance * b_norm || s_norm < self.abs_tolerance {
                for i in 0..n {
                    x[i] += alpha * p_hat[i];
                }
                self.iterations += 1;
                return Ok(x);
            }
            let s_hat = precond(&s);
            let t = mat_vec(kk, &s_hat);
            let t_t = dot(&t, &t);
            if t_t.abs() < 1e-300 {
                return Err("BiCGSTAB failed due to breakdown (t·t = 0)");
            }
            omega = dot(&t, &s) / t_t;
            for i in 0..n {
                x[i] += alpha * p_hat[i] + omega * s_hat[i];
                r[i] = s[i] - omega * t[i];
            }
            self.iterations += 1;
            let r_norm = dot(&r, &r).sqrt();
            if r_norm < self.tolerance * b_norm || r_norm < self.abs_tolerance {
                return Ok(x);
            }
            if omega.abs() < 1e-300 {
                return Err("BiCGSTAB failed due to breakdown (ω = 0)");
            }
        }
        Err("BiCGSTAB did not converge within the maximum number of iterations")
    }

    fn name(&self) -> &str {
        "BiCGSTAB (Jacobi)"
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{new_linear_solver, BiCgStabSolver, DirectSolver, LinearSolver};
    use crate::base::{Config, LinSolKind};
    use approx::assert_relative_eq;
    use sprs::{CsMat, TriMat};

    fn tridiagonal(n: usize) -> CsMat<f64> {
        let mut triplets = TriMat::new((n, n));
        for i in 0..n {
            triplets.add_triplet(i, i, 4.0);
            if i > 0 {
                triplets.add_triplet(i, i - 1, -1.0);
            }
            if i + 1 < n {
                triplets.add_triplet(i, i + 1, -2.0); // non-symmetric
            }
        }
        triplets.to_csr()
    }

    #[test]
    fn factory_works() {
        let mut config = Config::new(2);
        assert_eq!(new_linear_solver(&config).name(), "Direct (dense LU)");
        config.set_linear_solver(LinSolKind::BiCgStab).unwrap();
        assert_eq!(new_linear_solver(&config).name(), "BiCGSTAB (Jacobi)");
    }

    #[test]
    fn solvers_agree() {
        let n = 20;
        let kk = tridiagonal(n);
        let x_correct: Vec<f64> = (0..n).map(|i| 1.0 + i as f64 / 10.0).collect();
        let rr: Vec<f64> = kk
            .outer_iterator()
            .map(|row| row.iter().map(|(j, v)| v * x_correct[j]).sum())
            .collect();
        let mut direct = DirectSolver::new();
        let mut bicgstab = BiCgStabSolver::new().with_tolerance(1e-14);
        let x1 = direct.solve(&kk, &rr).unwrap();
        let x2 = bicgstab.solve(&kk, &rr).unwrap();
        assert!(bicgstab.iterations() > 0);
        for i in 0..n {
            assert_relative_eq!(x1[i], x_correct[i], epsilon = 1e-12);
            assert_relative_eq!(x2[i], x_correct[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn zero_rhs_gives_zero_solution() {
        let kk = tridiagonal(5);
        let mut bicgstab = BiCgStabSolver::new();
        assert_eq!(bicgstab.solve(&kk, &[0.0; 5]).unwrap(), &[0.0; 5]);
        assert_eq!(bicgstab.iterations(), 0);
        let mut direct = DirectSolver::new();
        assert!(direct.solve(&kk, &[0.0; 5]).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn solvers_capture_errors() {
        let kk = tridiagonal(3);
        let mut direct = DirectSolver::new();
        assert_eq!(
            direct.solve(&kk, &[1.0, 2.0]).err(),
            Some("the matrix and the right-hand side have incompatible dimensions")
        );
        let mut triplets = TriMat::new((2, 2));
        triplets.add_triplet(0, 0, 1.0);
        triplets.add_triplet(0, 1, 1.0);
        triplets.add_triplet(1, 0, 1.0);
        triplets.add_triplet(1, 1, 1.0);
        let singular: CsMat<f64> = triplets.to_csr();
        assert_eq!(
            direct.solve(&singular, &[1.0, 2.0]).err(),
            Some("cannot solve the linear system because the matrix is singular")
        );
        let mut bicgstab = BiCgStabSolver::new().with_max_iterations(1).with_tolerance(1e-15);
        assert_eq!(
            bicgstab.solve(&tridiagonal(30), &[1.0; 30]).err(),
            Some("BiCGSTAB did not converge within the maximum number of iterations")
        );
    }
}
