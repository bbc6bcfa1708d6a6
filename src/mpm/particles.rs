use super::Grid;
use crate::base::{ParamSolid, ParticleId};
use crate::material::{mandel_dim, LocalState, StressStrain};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Holds the data of a material point (particle)
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Particle {
    /// Holds the position x (ndim)
    pub position: Vec<f64>,

    /// Holds the current volume V
    pub volume: f64,

    /// Holds the (constant) mass m
    pub mass: f64,

    /// Holds the velocity v (ndim)
    pub velocity: Vec<f64>,

    /// Holds the acceleration a (ndim)
    pub acceleration: Vec<f64>,

    /// Holds the committed stress state (stress and internal values)
    pub state: LocalState,

    /// Holds the accumulated (small) strain ε (Mandel)
    pub strain: Vec<f64>,

    /// Holds the index of the material in the list of materials
    pub material: usize,
}

/// Holds all particles
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Particles {
    /// Space dimension
    pub ndim: usize,

    /// Holds all particles; the position in this array is the ParticleId
    pub all: Vec<Particle>,
}

impl Particles {
    /// Allocates an empty set of particles
    pub fn new(ndim: usize) -> Self {
        Particles { ndim, all: Vec::new() }
    }

    /// Returns the number of particles
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Returns true if there are no particles
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Adds one particle with zero velocity and zero stress
    ///
    /// Returns the id of the new particle.
    pub fn add(
        &mut self,
        position: &[f64],
        volume: f64,
        material: usize,
        param: &ParamSolid,
    ) -> Result<ParticleId, StrError> {
        if position.len() != self.ndim {
            return Err("particle position must have ndim components");
        }
        if volume <= 0.0 {
            return Err("particle volume must be positive");
        }
        if param.density <= 0.0 {
            return Err("density must be positive");
        }
        let model = StressStrain::new(self.ndim, param)?;
        let mut state = LocalState::new(self.ndim, model.actual.n_internal_values());
        model.actual.initialize_internal_values(&mut state)?;
        self.all.push(Particle {
            position: position.to_vec(),
            volume,
            mass: param.density * volume,
            velocity: vec![0.0; self.ndim],
            acceleration: vec![0.0; self.ndim],
            state,
            strain: vec![0.0; mandel_dim(self.ndim)],
            material,
        });
        Ok(self.all.len() - 1)
    }

    /// Generates regularly spaced particles inside the given cells of a grid
    ///
    /// Each cell receives `n_per_axis` particles along each axis, located at the centers of a
    /// regular subdivision of the cell. Returns the ids of the new particles.
    pub fn generate_in_cells(
        &mut self,
        grid: &Grid,
        cells: &[usize],
        n_per_axis: usize,
        material: usize,
        param: &ParamSolid,
    ) -> Result<Vec<ParticleId>, StrError> {
        if grid.ndim() != self.ndim {
            return Err("grid and particles must have the same ndim");
        }
        if n_per_axis < 1 {
            return Err("the number of particles per axis must be ≥ 1");
        }
        if cells.iter().any(|c| *c >= grid.ncell()) {
            return Err("cell id is out-of-bounds");
        }
        let n_per_cell = usize::pow(n_per_axis, self.ndim as u32);
        let volume = grid.cell_volume() / (n_per_cell as f64);
        let h = grid.spacing();
        let mut ids = Vec::with_capacity(cells.len() * n_per_cell);
        let mut x = vec![0.0; self.ndim];
        for cell_id in cells {
            let xmin = grid.cell_min_coords(*cell_id);
            for k in 0..n_per_cell {
                let mut rest = k;
                for a in 0..self.ndim {
                    let i = rest % n_per_axis;
                    rest /= n_per_axis;
                    x[a] = xmin[a] + (i as f64 + 0.5) * h[a] / (n_per_axis as f64);
                }
                ids.push(self.add(&x, volume, material, param)?);
            }
        }
        Ok(ids)
    }

    /// Returns the particles whose position satisfies a condition
    pub fn find<F>(&self, filter: F) -> Vec<ParticleId>
    where
        F: Fn(&[f64]) -> bool,
    {
        self.all
            .iter()
            .enumerate()
            .filter(|(_, p)| filter(&p.position))
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns the total mass
    pub fn total_mass(&self) -> f64 {
        self.all.iter().map(|p| p.mass).sum()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
