use super::{ImplicitMesh, LocalMatrix, LocalVector};
use crate::base::DofIndexMap;
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Implements a 2D chain of nodes connected by (possibly nonlinear) isotropic springs
///
/// The tension of the spring between nodes a and b along each axis is
///
/// ```text
/// T = k d + c d³   with   d = u_b - u_a
/// ```
pub(crate) struct SpringChain {
    pub dof_map: DofIndexMap,
    pub k: f64,
    pub c: f64,
    pub u: Vec<f64>,
    pub f_ext: Vec<f64>,
    pub constrained: Vec<(usize, f64)>,
    pub failing_contribution: Option<usize>,
}

impl SpringChain {
    pub(crate) fn new(nnode: usize, k: f64, c: f64) -> Self {
        let active: Vec<_> = (0..nnode).collect();
        let dof_map = DofIndexMap::new(2, nnode, &active).unwrap();
        let n_dof = dof_map.n_dof();
        SpringChain {
            dof_map,
            k,
            c,
            u: vec![0.0; n_dof],
            f_ext: vec![0.0; n_dof],
            constrained: Vec::new(),
            failing_contribution: None,
        }
    }

    fn n_spring(&self) -> usize {
        self.dof_map.n_active_node().saturating_sub(1)
    }
}

impl ImplicitMesh for SpringChain {
    fn dof_map(&self) -> &DofIndexMap {
        &self.dof_map
    }

    fn node_neighbourhood_size(&self) -> usize {
        3
    }

    fn n_contributions(&self) -> usize {
        self.n_spring() + self.dof_map.n_active_node()
    }

    fn stiffness_contribution(&self, index: usize) -> Result<LocalMatrix, StrError> {
        if self.failing_contribution == Some(index) {
            return Err("stiffness contribution failed");
        }
        if index >= self.n_spring() {
            let node = index - self.n_spring();
            return Ok(LocalMatrix {
                nodes: vec![node],
                kk: DMatrix::zeros(2, 2),
            });
        }
        let (a, b) = (index, index + 1);
        let mut kk = DMatrix::zeros(4, 4);
        for d in 0..2 {
            let delta = self.u[b * 2 + d] - self.u[a * 2 + d];
            let kt = self.k + 3.0 * self.c * delta * delta;
            kk[(d, d)] = kt;
            kk[(2 + d, 2 + d)] = kt;
            kk[(d, 2 + d)] = -kt;
            kk[(2 + d, d)] = -kt;
        }
        Ok(LocalMatrix { nodes: vec![a, b], kk })
    }

    fn force_contribution(&self, index: usize) -> Result<LocalVector, StrError> {
        if self.failing_contribution == Some(index) {
            return Err("force contribution failed");
        }
        if index >= self.n_spring() {
            let node = index - self.n_spring();
            return Ok(LocalVector {
                nodes: vec![node],
                ff: DVector::from_column_slice(&self.f_ext[node * 2..node * 2 + 2]),
            });
        }
        let (a, b) = (index, index + 1);
        let mut ff = DVector::zeros(4);
        for d in 0..2 {
            let delta = self.u[b * 2 + d] - self.u[a * 2 + d];
            let tension = self.k * delta + self.c * delta * delta * delta;
            ff[d] = tension;
            ff[2 + d] = -tension;
        }
        Ok(LocalVector { nodes: vec![a, b], ff })
    }

    fn constrained_nodes(&self, _time: f64) -> Vec<(usize, f64)> {
        self.constrained.clone()
    }

    fn apply_displacement_increment(&mut self, du: &[f64]) -> Result<(), StrError> {
        if du.len() != self.u.len() {
            return Err("displacement increment has incompatible dimension");
        }
        for (u, delta) in self.u.iter_mut().zip(du) {
            *u += delta;
        }
        Ok(())
    }
}
