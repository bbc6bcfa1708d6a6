use super::{Dof, Pbc};
use std::collections::HashMap;
use std::fmt;

/// Defines an alias for the particle identification number
pub type ParticleId = usize;

/// Holds natural boundary conditions (concentrated forces acting on particles)
pub struct Natural {
    pub all: HashMap<(ParticleId, Dof), Pbc>,
}

impl Natural {
    /// Allocates a new instance
    pub fn new() -> Self {
        Natural { all: HashMap::new() }
    }

    /// Sets a concentrated force at particles
    pub fn at(&mut self, particles: &[ParticleId], pbc: Pbc) -> &mut Self {
        for particle_id in particles {
            self.all.insert((*particle_id, pbc.dof()), pbc);
        }
        self
    }

    /// Returns the force components acting on a particle at time t
    ///
    /// The returned vector has length equal to `ndim`.
    pub fn forces(&self, particle_id: ParticleId, ndim: usize, t: f64) -> Vec<f64> {
        let mut ff = vec![0.0; ndim];
        for (i, f) in ff.iter_mut().enumerate() {
            if let Some(dof) = Dof::from_index(i) {
                if let Some(pbc) = self.all.get(&(particle_id, dof)) {
                    *f = pbc.value(t);
                }
            }
        }
        ff
    }
}

impl fmt::Display for Natural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concentrated forces at particles\n")?;
        write!(f, "================================\n")?;
        let mut keys: Vec<_> = self.all.keys().copied().collect();
        keys.sort();
        for key in keys {
            if let Some(pbc) = self.all.get(&key) {
                write!(f, "{:?} : {}\n", key.0, pbc)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
