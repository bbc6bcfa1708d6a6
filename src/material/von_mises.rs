use super::{bulk_shear, deviator, elastic_modulus, identity, invariant_sigma_d, norm, p_symdev, trace};
use super::{LocalState, StressStrainTrait};
use crate::StrError;
use nalgebra::DMatrix;

/// Holds the index of z internal variable (size of yield surface)
const Z0: usize = 0;

/// Holds the index of the accumulated (equivalent) plastic strain
const EP: usize = 1;

/// Implements the von Mises plasticity model with linear isotropic hardening
///
/// The yield function is
///
/// ```text
/// f = σd - z
/// ```
///
/// and the stress update follows the radial return method with the consistent tangent modulus.
///
/// **Note:** This model works in 2D (plane-strain only) or 3D.
pub struct VonMises {
    /// Elastic modulus Dₑ
    dd_elastic: DMatrix<f64>,

    /// Bulk modulus K
    kk: f64,

    /// Shear modulus G
    gg: f64,

    /// Hardening coefficient
    hh: f64,

    /// Initial size of the yield surface
    z_ini: f64,
}

impl VonMises {
    /// Allocates a new instance
    pub fn new(ndim: usize, young: f64, poisson: f64, z_ini: f64, hh: f64) -> Self {
        let (kk, gg) = bulk_shear(young, poisson);
        VonMises {
            dd_elastic: elastic_modulus(ndim, young, poisson),
            kk,
            gg,
            hh,
            z_ini,
        }
    }

    /// Calculates the yield function f
    pub fn yield_function(&self, state: &LocalState) -> f64 {
        invariant_sigma_d(&state.stress) - state.internal_values[Z0]
    }
}

impl StressStrainTrait for VonMises {
    fn n_internal_values(&self) -> usize {
        2 // [z, εp]
    }

    fn initialize_internal_values(&self, state: &mut LocalState) -> Result<(), StrError> {
        if state.internal_values.len() != 2 {
            return Err("von Mises model requires two internal values");
        }
        state.internal_values[Z0] = self.z_ini;
        state.internal_values[EP] = 0.0;
        if self.yield_function(state) > 0.0 {
            return Err("stress is outside the yield surface");
        }
        Ok(())
    }

    /// Computes the consistent tangent stiffness
    fn stiffness(&self, dd: &mut DMatrix<f64>, state: &LocalState) -> Result<(), StrError> {
        // handle elastic case
        if state.elastic {
            dd.copy_from(&self.dd_elastic); // D ← Dₑ
            return Ok(());
        }

        // s = dev(σ)
        let nd = state.stress.len();
        let mut s = vec![0.0; nd];
        deviator(&mut s, &state.stress);
        let norm_s = norm(&s);
        if norm_s <= 0.0 {
            return Err("cannot compute the elastoplastic modulus because the deviatoric stress is zero");
        }

        // coefficients
        let (kk, gg, hh) = (self.kk, self.gg, self.hh);
        let lambda = state.algo_lambda;
        let sigma_d = invariant_sigma_d(&state.stress);
        let sigma_d_trial = sigma_d + lambda * 3.0 * gg;
        let a = 2.0 * gg * (1.0 - lambda * 3.0 * gg / sigma_d_trial);
        let b = 6.0 * gg * gg * (lambda / sigma_d_trial - 1.0 / (3.0 * gg + hh)) / (norm_s * norm_s);

        // consistent tangent modulus
        for i in 0..nd {
            for j in 0..nd {
                dd[(i, j)] = a * p_symdev(i, j) + b * s[i] * s[j] + kk * identity(i) * identity(j);
            }
        }
        Ok(())
    }

    /// Updates the stress tensor given the strain increment tensor
    fn update_stress(&self, state: &mut LocalState, delta_strain: &[f64]) -> Result<(), StrError> {
        let nd = state.stress.len();
        if delta_strain.len() != nd {
            return Err("strain increment has incompatible dimension");
        }
        state.reset_algorithmic_variables();

        // trial stress: σ ← σ + Dₑ : Δε
        for i in 0..nd {
            for j in 0..nd {
                state.stress[i] += self.dd_elastic[(i, j)] * delta_strain[j];
            }
        }

        // elastic update
        let f_trial = self.yield_function(state);
        if f_trial <= 0.0 {
            return Ok(());
        }

        // return mapping
        let (gg, hh) = (self.gg, self.hh);
        let sigma_m_trial = trace(&state.stress) / 3.0;
        let sigma_d_trial = invariant_sigma_d(&state.stress);
        let lambda = f_trial / (3.0 * gg + hh);
        let m = 1.0 - lambda * 3.0 * gg / sigma_d_trial;

        // σ_new = m s_trial + σm_trial I
        let mut s_trial = vec![0.0; nd];
        deviator(&mut s_trial, &state.stress);
        for i in 0..nd {
            state.stress[i] = m * s_trial[i] + sigma_m_trial * identity(i);
        }

        // elastoplastic update
        state.elastic = false;
        state.algo_lambda = lambda;
        state.internal_values[Z0] += hh * lambda;
        state.internal_values[EP] += lambda;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
