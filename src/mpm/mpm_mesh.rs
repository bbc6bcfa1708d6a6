use super::{Grid, Particles, PointShape};
use crate::base::{Config, DofIndexMap, Essential, Natural, NodeId, ParamSolid, NODAL_MASS_MIN};
use crate::implicit::{ImplicitMesh, LocalMatrix, LocalVector};
use crate::material::{mandel_dim, trace, LocalState, StressStrain, SQRT_2};
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Implements the material point mesh (background grid and particles) for implicit analyses
///
/// Each time step follows an updated-Lagrangian scheme on a background grid that is reset at the
/// beginning of the step:
///
/// 1. [MpmMesh::initialize_step] maps mass, momentum and acceleration from particles to nodes
///    (P2G) and numbers the DOFs of the active nodes (nodes with mass)
/// 2. the Newton-Raphson iterations call [ImplicitMesh::apply_displacement_increment], which
///    accumulates the nodal displacements of the step and updates the trial particle stresses
///    from the committed state
/// 3. [MpmMesh::finalize_step] maps the nodal solution back to the particles (G2P) and commits
///    the stresses
///
/// Time integration uses the Newmark method:
///
/// ```text
/// a = (u - Δt vₙ) / (β Δt²) - (1/(2β) - 1) aₙ
/// v = vₙ + Δt ((1-γ) aₙ + γ a)
/// ```
///
/// where u is the nodal displacement of the step.
pub struct MpmMesh {
    /// Holds the configuration
    pub config: Config,

    /// Holds the background grid
    pub grid: Grid,

    /// Holds the particles
    pub particles: Particles,

    /// Holds the prescribed displacements at grid nodes
    pub essential: Essential,

    /// Holds the concentrated forces at particles
    pub natural: Natural,

    /// Holds the stress-strain models (one per material)
    models: Vec<StressStrain>,

    /// Holds the time at the end of the current step
    time: f64,

    /// Holds the map of active nodes to equation numbers
    dof_map: DofIndexMap,

    /// Holds the shape functions of each particle at the beginning of the step
    shapes: Vec<PointShape>,

    /// Holds the lumped nodal masses (npoint)
    nodal_mass: Vec<f64>,

    /// Holds the nodal velocities at the beginning of the step (npoint × ndim)
    nodal_velocity: Vec<f64>,

    /// Holds the nodal accelerations at the beginning of the step (npoint × ndim)
    nodal_acceleration: Vec<f64>,

    /// Holds the nodal displacements accumulated during the step (npoint × ndim)
    nodal_displacement: Vec<f64>,

    /// Holds the trial (not yet committed) particle states
    trial: Vec<LocalState>,

    /// Holds the strain increments of the step (Mandel)
    delta_strain: Vec<Vec<f64>>,
}

impl MpmMesh {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `config` -- the configuration
    /// * `grid` -- the background grid
    /// * `particles` -- the particles; `particle.material` indexes `materials`
    /// * `materials` -- the material parameters
    /// * `essential` -- the prescribed displacements at grid nodes
    /// * `natural` -- the concentrated forces at particles
    pub fn new(
        config: &Config,
        grid: Grid,
        particles: Particles,
        materials: &[ParamSolid],
        essential: Essential,
        natural: Natural,
    ) -> Result<Self, StrError> {
        if config.validate().is_some() {
            return Err("cannot allocate mesh because the configuration is invalid");
        }
        if grid.ndim() != config.ndim || particles.ndim != config.ndim {
            return Err("grid, particles and configuration must have the same ndim");
        }
        if particles.all.iter().any(|p| p.material >= materials.len()) {
            return Err("particle material index is out-of-bounds");
        }
        let models = materials
            .iter()
            .map(|param| StressStrain::new(config.ndim, param))
            .collect::<Result<Vec<_>, _>>()?;
        let npoint = grid.npoint();
        let ndim = config.ndim;
        Ok(MpmMesh {
            config: config.clone(),
            grid,
            particles,
            essential,
            natural,
            models,
            time: config.t_ini,
            dof_map: DofIndexMap::new_empty(ndim),
            shapes: Vec::new(),
            nodal_mass: vec![0.0; npoint],
            nodal_velocity: vec![0.0; npoint * ndim],
            nodal_acceleration: vec![0.0; npoint * ndim],
            nodal_displacement: vec![0.0; npoint * ndim],
            trial: Vec::new(),
            delta_strain: Vec::new(),
        })
    }

    /// Returns the lumped mass of a node
    pub fn nodal_mass(&self, node_id: NodeId) -> f64 {
        self.nodal_mass[node_id]
    }

    /// Returns the displacement of a node accumulated during the current step
    pub fn nodal_displacement(&self, node_id: NodeId) -> &[f64] {
        let ndim = self.config.ndim;
        &self.nodal_displacement[node_id * ndim..(node_id + 1) * ndim]
    }

    /// Returns the trial (not yet committed) state of a particle
    pub fn trial_state(&self, particle_id: usize) -> &LocalState {
        &self.trial[particle_id]
    }

    /// Returns the time at the end of the current step
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Starts a new time step: particle-to-grid mapping and DOF numbering
    ///
    /// `time` is the time at the end of the step.
    pub fn initialize_step(&mut self, time: f64) -> Result<(), StrError> {
        let ndim = self.config.ndim;
        self.time = time;

        // shape functions at the beginning of the step
        self.shapes = self
            .particles
            .all
            .iter()
            .map(|p| self.grid.shape(&p.position))
            .collect::<Result<Vec<_>, _>>()?;

        // P2G: mass, momentum and mass × acceleration
        self.nodal_mass.iter_mut().for_each(|v| *v = 0.0);
        self.nodal_velocity.iter_mut().for_each(|v| *v = 0.0);
        self.nodal_acceleration.iter_mut().for_each(|v| *v = 0.0);
        self.nodal_displacement.iter_mut().for_each(|v| *v = 0.0);
        for (p, shape) in self.particles.all.iter().zip(&self.shapes) {
            for (m, node) in shape.nodes.iter().enumerate() {
                let nm = shape.nn[m] * p.mass;
                self.nodal_mass[*node] += nm;
                for d in 0..ndim {
                    self.nodal_velocity[node * ndim + d] += nm * p.velocity[d];
                    self.nodal_acceleration[node * ndim + d] += nm * p.acceleration[d];
                }
            }
        }

        // active nodes
        let active: Vec<NodeId> = (0..self.grid.npoint())
            .filter(|node| self.nodal_mass[*node] > NODAL_MASS_MIN)
            .collect();
        for node in &active {
            let mass = self.nodal_mass[*node];
            for d in 0..ndim {
                self.nodal_velocity[node * ndim + d] /= mass;
                self.nodal_acceleration[node * ndim + d] /= mass;
            }
        }
        self.dof_map = DofIndexMap::new(ndim, self.grid.npoint(), &active)?;

        // trial states start from the committed states
        self.trial = self
            .particles
            .all
            .iter()
            .map(|p| {
                let mut state = p.state.clone();
                state.reset_algorithmic_variables();
                state
            })
            .collect();
        self.delta_strain = vec![vec![0.0; mandel_dim(ndim)]; self.particles.len()];
        Ok(())
    }

    /// Ends the time step: grid-to-particle mapping and commit of the particle states
    pub fn finalize_step(&mut self) -> Result<(), StrError> {
        if self.trial.len() != self.particles.len() {
            return Err("finalize_step requires a previous call to initialize_step");
        }
        let ndim = self.config.ndim;
        let dt = self.config.dt;
        let gamma = self.config.newmark_gamma;
        let quasi_static = self.config.quasi_static;
        for (p_id, particle) in self.particles.all.iter_mut().enumerate() {
            let shape = &self.shapes[p_id];
            let mut dx = vec![0.0; ndim];
            let mut a_new = vec![0.0; ndim];
            for (m, node) in shape.nodes.iter().enumerate() {
                if self.dof_map.node_index(*node).is_none() {
                    continue;
                }
                for d in 0..ndim {
                    dx[d] += shape.nn[m] * self.nodal_displacement[node * ndim + d];
                    if !quasi_static {
                        let (a, _) = newmark_nodal(
                            &self.config,
                            &self.nodal_displacement,
                            &self.nodal_velocity,
                            &self.nodal_acceleration,
                            node * ndim + d,
                        );
                        a_new[d] += shape.nn[m] * a;
                    }
                }
            }
            for d in 0..ndim {
                particle.position[d] += dx[d];
                if quasi_static {
                    particle.velocity[d] = 0.0;
                    particle.acceleration[d] = 0.0;
                } else {
                    particle.velocity[d] += dt * ((1.0 - gamma) * particle.acceleration[d] + gamma * a_new[d]);
                    particle.acceleration[d] = a_new[d];
                }
            }
            let de = &self.delta_strain[p_id];
            particle.volume *= 1.0 + trace(de);
            for i in 0..de.len() {
                particle.strain[i] += de[i];
            }
            particle.state = self.trial[p_id].clone();
        }
        Ok(())
    }

    /// Returns the positions (within the particle's shape) of the active nodes
    fn active_positions(&self, shape: &PointShape) -> Vec<usize> {
        (0..shape.nodes.len())
            .filter(|m| self.dof_map.node_index(shape.nodes[*m]).is_some())
            .collect()
    }

    /// Computes the strain-displacement matrix B (Mandel) for the selected nodes of a shape
    fn bb_matrix(&self, shape: &PointShape, positions: &[usize]) -> DMatrix<f64> {
        let ndim = self.config.ndim;
        let mut bb = DMatrix::<f64>::zeros(mandel_dim(ndim), positions.len() * ndim);
        for (k, m) in positions.iter().enumerate() {
            let g = &shape.gg[*m];
            let c = k * ndim;
            bb[(0, c)] = g[0];
            bb[(1, c + 1)] = g[1];
            bb[(3, c)] = g[1] / SQRT_2;
            bb[(3, c + 1)] = g[0] / SQRT_2;
            if ndim == 3 {
                bb[(2, c + 2)] = g[2];
                bb[(4, c + 1)] = g[2] / SQRT_2;
                bb[(4, c + 2)] = g[1] / SQRT_2;
                bb[(5, c)] = g[2] / SQRT_2;
                bb[(5, c + 2)] = g[0] / SQRT_2;
            }
        }
        bb
    }

    /// Returns the gravity force per unit mass
    fn gravity_vector(&self) -> Vec<f64> {
        let mut g = vec![0.0; self.config.ndim];
        g[self.config.ndim - 1] = -self.config.gravity;
        g
    }
}

/// Computes the Newmark acceleration and velocity of a nodal DOF
///
/// The DOF is given by its position `i = node * ndim + component` in the nodal arrays.
fn newmark_nodal(config: &Config, displacement: &[f64], velocity: &[f64], acceleration: &[f64], i: usize) -> (f64, f64) {
    let (dt, beta, gamma) = (config.dt, config.newmark_beta, config.newmark_gamma);
    let (u, vn, an) = (displacement[i], velocity[i], acceleration[i]);
    let a = (u - dt * vn) / (beta * dt * dt) - (1.0 / (2.0 * beta) - 1.0) * an;
    let v = vn + dt * ((1.0 - gamma) * an + gamma * a);
    (a, v)
}

impl ImplicitMesh for MpmMesh {
    fn dof_map(&self) -> &DofIndexMap {
        &self.dof_map
    }

    fn node_neighbourhood_size(&self) -> usize {
        self.config.neighbourhood()
    }

    /// Returns the number of particles plus the number of active nodes
    fn n_contributions(&self) -> usize {
        self.shapes.len() + self.dof_map.n_active_node()
    }

    fn stiffness_contribution(&self, index: usize) -> Result<LocalMatrix, StrError> {
        let ndim = self.config.ndim;
        let np = self.shapes.len();

        // particle: K = V Bᵀ D B
        if index < np {
            let particle = &self.particles.all[index];
            let shape = &self.shapes[index];
            let positions = self.active_positions(shape);
            let bb = self.bb_matrix(shape, &positions);
            let nd = mandel_dim(ndim);
            let mut dd = DMatrix::<f64>::zeros(nd, nd);
            self.models[particle.material]
                .actual
                .stiffness(&mut dd, &self.trial[index])?;
            let kk = bb.transpose() * dd * &bb * particle.volume;
            let nodes = positions.iter().map(|m| shape.nodes[*m]).collect();
            return Ok(LocalMatrix { nodes, kk });
        }

        // active node: lumped inertia and damping
        let k = index - np;
        let node = *self
            .dof_map
            .active_nodes()
            .get(k)
            .ok_or("contribution index is out-of-bounds")?;
        let (c_mass, c_damping) = self.config.newmark_tangent_coefficients();
        let value = self.nodal_mass[node] * (c_mass + self.config.damping_alpha * c_damping);
        Ok(LocalMatrix {
            nodes: vec![node],
            kk: DMatrix::from_diagonal_element(ndim, ndim, value),
        })
    }

    fn force_contribution(&self, index: usize) -> Result<LocalVector, StrError> {
        let ndim = self.config.ndim;
        let np = self.shapes.len();

        // particle: f = N (m g + f_point) - V Bᵀ σ
        if index < np {
            let particle = &self.particles.all[index];
            let shape = &self.shapes[index];
            let positions = self.active_positions(shape);
            let bb = self.bb_matrix(shape, &positions);
            let sigma = DVector::from_column_slice(&self.trial[index].stress);
            let mut ff = -(bb.transpose() * sigma) * particle.volume;
            let gravity = self.gravity_vector();
            let point = self.natural.forces(index, ndim, self.time);
            for (k, m) in positions.iter().enumerate() {
                for d in 0..ndim {
                    ff[k * ndim + d] += shape.nn[*m] * (particle.mass * gravity[d] + point[d]);
                }
            }
            let nodes = positions.iter().map(|m| shape.nodes[*m]).collect();
            return Ok(LocalVector { nodes, ff });
        }

        // active node: -m (a + α v)
        let k = index - np;
        let node = *self
            .dof_map
            .active_nodes()
            .get(k)
            .ok_or("contribution index is out-of-bounds")?;
        let mut ff = DVector::<f64>::zeros(ndim);
        if !self.config.quasi_static {
            let mass = self.nodal_mass[node];
            for d in 0..ndim {
                let (a, v) = newmark_nodal(
                    &self.config,
                    &self.nodal_displacement,
                    &self.nodal_velocity,
                    &self.nodal_acceleration,
                    node * ndim + d,
                );
                ff[d] = -mass * (a + self.config.damping_alpha * v);
            }
        }
        Ok(LocalVector { nodes: vec![node], ff })
    }

    fn constrained_nodes(&self, time: f64) -> Vec<(usize, f64)> {
        let ndim = self.config.ndim;
        let dt = self.config.dt;
        self.essential
            .sorted_keys()
            .into_iter()
            .filter(|(node, dof)| dof.index() < ndim && self.dof_map.node_index(*node).is_some())
            .filter_map(|(node, dof)| {
                let eq = self.dof_map.eq(node, dof).ok()?;
                let value = self.essential.increment(node, dof, time, dt)?;
                Some((eq, value))
            })
            .collect()
    }

    fn apply_displacement_increment(&mut self, du: &[f64]) -> Result<(), StrError> {
        let ndim = self.config.ndim;
        if du.len() != self.dof_map.n_dof() {
            return Err("displacement increment has incompatible dimension");
        }
        for (k, node) in self.dof_map.active_nodes().iter().enumerate() {
            for d in 0..ndim {
                self.nodal_displacement[node * ndim + d] += du[k * ndim + d];
            }
        }
        for p_id in 0..self.shapes.len() {
            let shape = &self.shapes[p_id];
            let positions = self.active_positions(shape);
            let bb = self.bb_matrix(shape, &positions);
            let mut uu = DVector::<f64>::zeros(positions.len() * ndim);
            for (k, m) in positions.iter().enumerate() {
                let node = shape.nodes[*m];
                for d in 0..ndim {
                    uu[k * ndim + d] = self.nodal_displacement[node * ndim + d];
                }
            }
            let de = bb * uu;
            let particle = &self.particles.all[p_id];
            let mut state = particle.state.clone();
            self.models[particle.material]
                .actual
                .update_stress(&mut state, de.as_slice())?;
            self.trial[p_id] = state;
            self.delta_strain[p_id].copy_from_slice(de.as_slice());
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
