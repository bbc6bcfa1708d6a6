use crate::base::ImplicitError;
use crate::mpm::{MpmMesh, Particles};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the converged state of a simulation after a time step
///
/// The background grid, boundary conditions and material models are rebuilt by the caller; the
/// particles carry everything else (positions, velocities, accelerations, volumes, strains and
/// committed stress states).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Time at the end of the last completed step
    pub time: f64,

    /// Number of completed time steps
    pub step: usize,

    /// Converged particles
    pub particles: Particles,
}

impl Checkpoint {
    /// Captures the particles of a mesh after `step` completed time steps
    pub fn new(mesh: &MpmMesh, step: usize) -> Self {
        Checkpoint {
            time: mesh.config.t_ini + (step as f64) * mesh.config.dt,
            step,
            particles: mesh.particles.clone(),
        }
    }

    /// Replaces the particles of a mesh by the checkpointed ones
    pub fn restore(&self, mesh: &mut MpmMesh) -> Result<(), ImplicitError> {
        if self.particles.ndim != mesh.particles.ndim {
            return Err(ImplicitError::Io("checkpoint and mesh have different ndim"));
        }
        mesh.particles = self.particles.clone();
        Ok(())
    }

    /// Returns the path of the checkpoint file of a time step
    pub fn path(out_dir: &str, step: usize) -> String {
        format!("{}/checkpoint-{:0>20}.json", out_dir, step)
    }

    /// Reads a JSON file containing a checkpoint
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, ImplicitError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let read = || -> Result<Self, StrError> {
            let path = Path::new(full_path).to_path_buf();
            let input = File::open(path).map_err(|_| "cannot open file")?;
            let buffered = BufReader::new(input);
            let checkpoint = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
            Ok(checkpoint)
        };
        read().map_err(ImplicitError::Io)
    }

    /// Writes a JSON file with the checkpoint
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), ImplicitError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let write = || -> Result<(), StrError> {
            let path = Path::new(full_path).to_path_buf();
            if let Some(p) = path.parent() {
                fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
            }
            let mut file = File::create(&path).map_err(|_| "cannot create file")?;
            serde_json::to_writer(&mut file, &self).map_err(|_| "cannot write file")?;
            Ok(())
        };
        write().map_err(ImplicitError::Io)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
