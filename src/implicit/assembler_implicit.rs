use super::{ControlConvergence, ImplicitMesh};
use crate::base::{Config, ImplicitError};
use crate::StrError;
use rayon::prelude::*;
use sprs::{CsMat, CsVec, TriMat};
use std::collections::BTreeMap;

/// Assembles and holds the global linear system of the Newton-Raphson iterations
///
/// The assembler exclusively owns, for the duration of a time step:
///
/// * `K` -- the global tangent stiffness matrix (CSR, n_dof × n_dof)
/// * `R` -- the global residual force vector (external − internal − inertial)
/// * the sparse vector of prescribed displacement increments (constraints)
/// * `Δu` -- the displacement increment of the last iteration
/// * `Δu_total` -- the displacement increment accumulated in the time step
///
/// Every assembly builds the system from scratch in temporaries and replaces the stored
/// K (or R) only on success; thus, a failed assembly leaves the previous system untouched and
/// repeated assemblies never double-accumulate.
pub struct AssemblerImplicit {
    /// Assembles the local contributions in parallel
    parallel: bool,

    /// Global tangent stiffness matrix K
    kk: CsMat<f64>,

    /// Global residual vector R
    rr: Vec<f64>,

    /// Prescribed displacement increments of the step
    constraints: CsVec<f64>,

    /// Displacement increment of the last iteration
    du: Vec<f64>,

    /// Displacement increment accumulated in the time step
    du_total: Vec<f64>,

    /// Convergence scalars of the time step
    convergence: ControlConvergence,
}

impl AssemblerImplicit {
    /// Allocates a new (empty) instance
    pub fn new(config: &Config) -> Self {
        AssemblerImplicit {
            parallel: config.parallel_assembly,
            kk: CsMat::zero((0, 0)),
            rr: Vec::new(),
            constraints: CsVec::empty(0),
            du: Vec::new(),
            du_total: Vec::new(),
            convergence: ControlConvergence::new(),
        }
    }

    /// Resets the accumulators for a new time step with `n_dof` equations
    pub fn reset(&mut self, n_dof: usize) {
        self.kk = CsMat::zero((n_dof, n_dof));
        self.rr = vec![0.0; n_dof];
        self.constraints = CsVec::empty(n_dof);
        self.du = vec![0.0; n_dof];
        self.du_total = vec![0.0; n_dof];
        self.convergence.reset();
    }

    /// Returns the global stiffness matrix
    pub fn kk(&self) -> &CsMat<f64> {
        &self.kk
    }

    /// Returns the global residual vector
    pub fn rr(&self) -> &[f64] {
        &self.rr
    }

    /// Returns the prescribed displacement increments
    pub fn constraints(&self) -> &CsVec<f64> {
        &self.constraints
    }

    /// Returns the displacement increment of the last iteration
    pub fn du(&self) -> &[f64] {
        &self.du
    }

    /// Returns the displacement increment accumulated in the time step
    pub fn du_total(&self) -> &[f64] {
        &self.du_total
    }

    /// Returns the convergence scalars
    pub fn convergence(&self) -> &ControlConvergence {
        &self.convergence
    }

    /// Computes all local contributions, in parallel if requested
    ///
    /// The results keep the order of the contributions.
    fn compute_locals<T, F>(&self, n: usize, f: F) -> Result<Vec<T>, StrError>
    where
        T: Send,
        F: Fn(usize) -> Result<T, StrError> + Sync + Send,
    {
        if self.parallel {
            (0..n).into_par_iter().map(f).collect()
        } else {
            (0..n).map(f).collect()
        }
    }

    /// Assembles the global tangent stiffness matrix K
    ///
    /// Local blocks are accumulated additively as (row, col, value) triplets and compressed to
    /// CSR. The diagonal is always part of the sparsity pattern.
    pub fn assemble_stiffness_matrix<M>(&mut self, mesh: &M) -> Result<(), ImplicitError>
    where
        M: ImplicitMesh + ?Sized,
    {
        let n_dof = mesh.active_dof_count();
        if n_dof == 0 {
            return Err(ImplicitError::Assembly("the number of active DOFs is zero"));
        }
        let dof_map = mesh.dof_map();
        let locals = self
            .compute_locals(mesh.n_contributions(), |index| {
                let local = mesh.stiffness_contribution(index)?;
                let l2g = dof_map.local_to_global(&local.nodes)?;
                if local.kk.nrows() != l2g.len() || local.kk.ncols() != l2g.len() {
                    return Err("local stiffness matrix has incompatible dimensions");
                }
                Ok((l2g, local.kk))
            })
            .map_err(ImplicitError::Assembly)?;
        let capacity = n_dof * (mesh.node_neighbourhood_size() * dof_map.ndim() + 1);
        let mut triplets = TriMat::with_capacity((n_dof, n_dof), capacity);
        for i in 0..n_dof {
            triplets.add_triplet(i, i, 0.0);
        }
        for (l2g, kk) in &locals {
            for (i, row) in l2g.iter().enumerate() {
                for (j, col) in l2g.iter().enumerate() {
                    let value = kk[(i, j)];
                    if value != 0.0 {
                        triplets.add_triplet(*row, *col, value);
                    }
                }
            }
        }
        self.kk = triplets.to_csr();
        Ok(())
    }

    /// Assembles the global residual vector R
    ///
    /// The entries of constrained DOFs (reactions) are set to zero.
    pub fn assemble_residual_force_right<M>(&mut self, mesh: &M) -> Result<(), ImplicitError>
    where
        M: ImplicitMesh + ?Sized,
    {
        let n_dof = mesh.active_dof_count();
        if n_dof == 0 {
            return Err(ImplicitError::Assembly("the number of active DOFs is zero"));
        }
        let dof_map = mesh.dof_map();
        let locals = self
            .compute_locals(mesh.n_contributions(), |index| {
                let local = mesh.force_contribution(index)?;
                let l2g = dof_map.local_to_global(&local.nodes)?;
                if local.ff.len() != l2g.len() {
                    return Err("local force vector has incompatible dimension");
                }
                Ok((l2g, local.ff))
            })
            .map_err(ImplicitError::Assembly)?;
        let mut rr = vec![0.0; n_dof];
        for (l2g, ff) in &locals {
            for (i, row) in l2g.iter().enumerate() {
                rr[*row] += ff[i];
            }
        }
        if self.constraints.dim() == n_dof {
            for (i, _) in self.constraints.iter() {
                rr[i] = 0.0;
            }
        }
        self.rr = rr;
        Ok(())
    }

    /// Assembles the vector of prescribed displacement increments at the given time
    ///
    /// Repeated DOFs keep the last value given by the mesh.
    pub fn assign_displacement_constraints<M>(&mut self, mesh: &M, time: f64) -> Result<(), ImplicitError>
    where
        M: ImplicitMesh + ?Sized,
    {
        let n_dof = mesh.active_dof_count();
        let mut sorted = BTreeMap::new();
        for (index, value) in mesh.constrained_nodes(time) {
            if index >= n_dof {
                return Err(ImplicitError::ConstraintIndexOutOfRange { index, n_dof });
            }
            sorted.insert(index, value);
        }
        let (indices, data): (Vec<usize>, Vec<f64>) = sorted.into_iter().unzip();
        self.constraints = CsVec::try_new(n_dof, indices, data)
            .map_err(|_| ImplicitError::Assembly("cannot build the vector of constraints"))?;
        Ok(())
    }

    /// Enforces the prescribed displacements on the assembled system
    ///
    /// For each constrained DOF i with remaining increment v (the prescribed increment minus the
    /// increment already accumulated in the step, thus v at the first iteration):
    ///
    /// ```text
    /// R[r] -= K[r][i] v   (unconstrained rows r)
    /// K[i][:] = K[:][i] = 0
    /// K[i][i] = 1
    /// R[i] = v
    /// ```
    ///
    /// The unconstrained equations keep the coupling to the prescribed values and the system
    /// stays symmetric (if K is).
    pub fn apply_displacement_constraints(&mut self) -> Result<(), ImplicitError> {
        let n_dof = self.rr.len();
        if self.kk.rows() != n_dof || self.kk.cols() != n_dof || self.constraints.dim() != n_dof {
            return Err(ImplicitError::Assembly(
                "cannot apply constraints because the system and the constraints have different dimensions",
            ));
        }
        let mut prescribed: Vec<Option<f64>> = vec![None; n_dof];
        for (i, value) in self.constraints.iter() {
            let done = self.du_total.get(i).copied().unwrap_or(0.0);
            prescribed[i] = Some(*value - done);
        }
        let rr = &mut self.rr;
        for (r, mut row) in self.kk.outer_iterator_mut().enumerate() {
            for (c, value) in row.iter_mut() {
                match (prescribed[r], prescribed[c]) {
                    (None, None) => (),
                    (None, Some(vc)) => {
                        rr[r] -= *value * vc;
                        *value = 0.0;
                    }
                    (Some(_), _) => *value = if r == c { 1.0 } else { 0.0 },
                }
            }
        }
        for (i, v) in prescribed.iter().enumerate() {
            if let Some(v) = v {
                rr[i] = *v;
            }
        }
        Ok(())
    }

    /// Stores the solution of the linear system and accumulates it into the step increment
    pub fn update_displacement_increment(&mut self, du: Vec<f64>) -> Result<(), ImplicitError> {
        if du.len() != self.du_total.len() {
            return Err(ImplicitError::Solver("solution vector has incompatible dimension"));
        }
        if du.iter().any(|v| !v.is_finite()) {
            return Err(ImplicitError::Solver("solution vector contains NaN or Inf"));
        }
        for (total, delta) in self.du_total.iter_mut().zip(&du) {
            *total += delta;
        }
        self.du = du;
        Ok(())
    }

    /// Records `‖R₀‖` of the time step from the entries of R at the unconstrained DOFs
    ///
    /// Call after [AssemblerImplicit::apply_displacement_constraints] and before the first solve,
    /// so that R holds the external loads and the coupling to the prescribed displacements.
    pub fn record_reference_residual(&mut self) {
        let mut rr_free = self.rr.clone();
        for (i, _) in self.constraints.iter() {
            if let Some(r) = rr_free.get_mut(i) {
                *r = 0.0;
            }
        }
        self.convergence.record_reference(&rr_free);
    }

    /// Checks the convergence on the residual vector
    ///
    /// At the first check (`initial = true`), the verdict uses the absolute tolerance only (and
    /// `‖R‖` becomes the reference if none was recorded). Afterwards, either tolerance is sufficient.
    pub fn check_residual_convergence(&mut self, initial: bool, verbosity: u32, tol_abs: f64, tol_rel: f64) -> bool {
        let converged = self.convergence.check_residual(initial, &self.rr, tol_abs, tol_rel);
        self.convergence.print_residual(verbosity);
        converged
    }

    /// Checks the convergence on the displacement increment
    pub fn check_solution_convergence(&mut self, verbosity: u32, tol: f64) -> bool {
        let converged = self.convergence.check_solution(&self.du, &self.du_total, tol);
        self.convergence.print_solution(verbosity);
        converged
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::AssemblerImplicit;
    use crate::base::{Config, ImplicitError};
    use crate::implicit::SpringChain;
    use sprs::CsMat;

    fn entry(kk: &CsMat<f64>, i: usize, j: usize) -> f64 {
        kk.get(i, j).copied().unwrap_or(0.0)
    }

    #[test]
    fn assemble_stiffness_matrix_works() {
        let config = Config::new(2);
        let mesh = SpringChain::new(3, 10.0, 0.0);
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(mesh.dof_map.n_dof());
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        let kk = assembler.kk();
        assert_eq!(kk.rows(), 6);
        #[rustfmt::skip]
        let correct = [
            [ 10.0,   0.0, -10.0,   0.0,   0.0,   0.0],
            [  0.0,  10.0,   0.0, -10.0,   0.0,   0.0],
            [-10.0,   0.0,  20.0,   0.0, -10.0,   0.0],
            [  0.0, -10.0,   0.0,  20.0,   0.0, -10.0],
            [  0.0,   0.0, -10.0,   0.0,  10.0,   0.0],
            [  0.0,   0.0,   0.0, -10.0,   0.0,  10.0],
        ];
        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(entry(kk, i, j), correct[i][j]);
            }
            assert!(kk.get(i, i).is_some());
        }
    }

    #[test]
    fn assemble_stiffness_matrix_is_idempotent() {
        let mut mesh = SpringChain::new(5, 3.0, 7.0);
        mesh.u = (0..10).map(|i| 0.01 * (i as f64)).collect();
        for parallel in [false, true] {
            let mut config = Config::new(2);
            config.set_parallel_assembly(parallel).unwrap();
            let mut assembler = AssemblerImplicit::new(&config);
            assembler.reset(10);
            assembler.assemble_stiffness_matrix(&mesh).unwrap();
            let first = assembler.kk().clone();
            assembler.assemble_stiffness_matrix(&mesh).unwrap();
            assert_eq!(assembler.kk(), &first);
            let bits = |kk: &CsMat<f64>| kk.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(assembler.kk()), bits(&first));
            assembler.assemble_residual_force_right(&mesh).unwrap();
            let rr = assembler.rr().to_vec();
            assembler.assemble_residual_force_right(&mesh).unwrap();
            assert_eq!(assembler.rr(), &rr);
        }
    }

    #[test]
    fn parallel_and_serial_assemblies_agree() {
        let mut mesh = SpringChain::new(6, 1.0, 2.0);
        mesh.u = (0..12).map(|i| f64::sin(i as f64)).collect();
        let serial = Config::new(2);
        let mut parallel = Config::new(2);
        parallel.set_parallel_assembly(true).unwrap();
        let mut a = AssemblerImplicit::new(&serial);
        let mut b = AssemblerImplicit::new(&parallel);
        for assembler in [&mut a, &mut b] {
            assembler.reset(12);
            assembler.assemble_stiffness_matrix(&mesh).unwrap();
            assembler.assemble_residual_force_right(&mesh).unwrap();
        }
        assert_eq!(a.kk(), b.kk());
        assert_eq!(a.rr(), b.rr());
    }

    #[test]
    fn assembly_without_dofs_leaves_the_system_untouched() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(3, 10.0, 0.0);
        mesh.f_ext[3] = 5.0;
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(6);
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        assembler.assemble_residual_force_right(&mesh).unwrap();
        let kk = assembler.kk().clone();
        let rr = assembler.rr().to_vec();
        let empty = SpringChain::new(0, 10.0, 0.0);
        assert_eq!(
            assembler.assemble_stiffness_matrix(&empty).err(),
            Some(ImplicitError::Assembly("the number of active DOFs is zero"))
        );
        assert_eq!(
            assembler.assemble_residual_force_right(&empty).err(),
            Some(ImplicitError::Assembly("the number of active DOFs is zero"))
        );
        assert_eq!(assembler.kk(), &kk);
        assert_eq!(assembler.rr(), &rr);
    }

    #[test]
    fn failing_contributions_leave_the_system_untouched() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(3, 10.0, 0.0);
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(6);
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        let kk = assembler.kk().clone();
        mesh.failing_contribution = Some(1);
        mesh.k = 99.0;
        assert_eq!(
            assembler.assemble_stiffness_matrix(&mesh).err(),
            Some(ImplicitError::Assembly("stiffness contribution failed"))
        );
        assert_eq!(
            assembler.assemble_residual_force_right(&mesh).err(),
            Some(ImplicitError::Assembly("force contribution failed"))
        );
        assert_eq!(assembler.kk(), &kk);
    }

    #[test]
    fn assign_displacement_constraints_captures_errors() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(2, 1.0, 0.0);
        mesh.constrained = vec![(0, 0.0), (4, 0.1)];
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(4);
        assert_eq!(
            assembler.assign_displacement_constraints(&mesh, 1.0).err(),
            Some(ImplicitError::ConstraintIndexOutOfRange { index: 4, n_dof: 4 })
        );
        assert_eq!(assembler.constraints().nnz(), 0);
        mesh.constrained = vec![(3, 0.1), (0, 0.0), (3, 0.2)];
        assembler.assign_displacement_constraints(&mesh, 1.0).unwrap();
        assert_eq!(assembler.constraints().indices(), &[0, 3]);
        assert_eq!(assembler.constraints().data(), &[0.0, 0.2]);
    }

    #[test]
    fn apply_displacement_constraints_works() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(3, 10.0, 0.0);
        mesh.f_ext = vec![0.0, 0.0, 0.5, -0.5, 0.0, 0.0];
        mesh.constrained = vec![(0, 0.0), (1, 0.0), (4, 0.1)];
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(6);
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        assembler.assemble_residual_force_right(&mesh).unwrap();
        assembler.assign_displacement_constraints(&mesh, 0.0).unwrap();
        let kk_orig = assembler.kk().clone();
        let rr_orig = assembler.rr().to_vec();
        assembler.apply_displacement_constraints().unwrap();
        let kk = assembler.kk();
        let rr = assembler.rr();
        for (i, v) in mesh.constrained.iter() {
            assert_eq!(entry(kk, *i, *i), 1.0);
            for j in 0..6 {
                if j != *i {
                    assert_eq!(entry(kk, *i, j), 0.0);
                    assert_eq!(entry(kk, j, *i), 0.0);
                }
            }
            assert_eq!(rr[*i], *v);
        }
        // unconstrained rows keep the coupling: R[r] -= K[r][i] v
        for r in [2, 3, 5] {
            let mut expected = rr_orig[r];
            for (i, v) in mesh.constrained.iter() {
                expected -= entry(&kk_orig, r, *i) * v;
            }
            assert_eq!(rr[r], expected);
        }
        assert_eq!(rr[2], 0.5 + 1.0);
        assert_eq!(entry(kk, 2, 2), 20.0);
    }

    #[test]
    fn apply_displacement_constraints_uses_the_remaining_increment() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(2, 1.0, 0.0);
        mesh.constrained = vec![(2, 0.1)];
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(4);
        assembler.assign_displacement_constraints(&mesh, 0.0).unwrap();
        assembler.update_displacement_increment(vec![0.0, 0.0, 0.1, 0.0]).unwrap();
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        assembler.assemble_residual_force_right(&mesh).unwrap();
        assembler.apply_displacement_constraints().unwrap();
        assert_eq!(assembler.rr()[2], 0.0);
        assert_eq!(assembler.du_total(), &[0.0, 0.0, 0.1, 0.0]);
        assert_eq!(assembler.du(), &[0.0, 0.0, 0.1, 0.0]);
    }

    #[test]
    fn apply_and_update_capture_errors() {
        let config = Config::new(2);
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(4);
        let mesh = SpringChain::new(3, 1.0, 0.0);
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        assert_eq!(
            assembler.apply_displacement_constraints().err(),
            Some(ImplicitError::Assembly(
                "cannot apply constraints because the system and the constraints have different dimensions"
            ))
        );
        assert_eq!(
            assembler.update_displacement_increment(vec![0.0; 3]).err(),
            Some(ImplicitError::Solver("solution vector has incompatible dimension"))
        );
        assert_eq!(
            assembler.update_displacement_increment(vec![0.0, f64::NAN, 0.0, 0.0]).err(),
            Some(ImplicitError::Solver("solution vector contains NaN or Inf"))
        );
    }

    #[test]
    fn record_reference_residual_skips_constrained_dofs() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(2, 1.0, 0.0);
        mesh.constrained = vec![(0, 0.0), (1, 0.0), (2, 12.0)];
        mesh.f_ext = vec![0.0, 0.0, 0.0, 4.0];
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(4);
        assembler.assemble_stiffness_matrix(&mesh).unwrap();
        assembler.assemble_residual_force_right(&mesh).unwrap();
        assembler.assign_displacement_constraints(&mesh, 1.0).unwrap();
        assembler.apply_displacement_constraints().unwrap();
        // R = [0, 0, 12, 4] with the prescribed value at DOF 2
        assert_eq!(assembler.rr(), &[0.0, 0.0, 12.0, 4.0]);
        assembler.record_reference_residual();
        assert_eq!(assembler.convergence().initial_residual_norm(), 4.0);
        assert_eq!(assembler.rr(), &[0.0, 0.0, 12.0, 4.0]);
    }

    #[test]
    fn check_convergence_works() {
        let config = Config::new(2);
        let mut mesh = SpringChain::new(2, 1.0, 0.0);
        mesh.f_ext = vec![0.0, 0.0, 3.0, 4.0];
        let mut assembler = AssemblerImplicit::new(&config);
        assembler.reset(4);
        assembler.assemble_residual_force_right(&mesh).unwrap();
        assert_eq!(assembler.check_residual_convergence(true, 0, 5.1, 1e-20), true);
        assert_eq!(assembler.check_residual_convergence(true, 0, 5.0, 1e20), false);
        mesh.f_ext = vec![0.0, 0.0, 0.3, 0.4];
        assembler.assemble_residual_force_right(&mesh).unwrap();
        assert_eq!(assembler.check_residual_convergence(false, 0, 1e-20, 0.11), true);
        assert_eq!(assembler.convergence().initial_residual_norm(), 5.0);
        assembler.update_displacement_increment(vec![0.0, 0.0, 1.0, 0.0]).unwrap();
        assert_eq!(assembler.check_solution_convergence(0, 1e-3), false);
        assembler.update_displacement_increment(vec![0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(assembler.check_solution_convergence(0, 1e-3), true);
    }
}
