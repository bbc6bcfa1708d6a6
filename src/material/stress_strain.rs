use super::{LinearElastic, LocalState, VonMises};
use crate::base::{ParamSolid, ParamStressStrain};
use crate::StrError;
use nalgebra::DMatrix;

/// Specifies the essential functions for stress-strain models
pub trait StressStrainTrait: Send + Sync {
    /// Returns the number of internal values
    fn n_internal_values(&self) -> usize;

    /// Initializes the internal values for the initial stress state
    fn initialize_internal_values(&self, state: &mut LocalState) -> Result<(), StrError>;

    /// Computes the consistent tangent stiffness
    fn stiffness(&self, dd: &mut DMatrix<f64>, state: &LocalState) -> Result<(), StrError>;

    /// Updates the stress tensor given the strain increment tensor
    fn update_stress(&self, state: &mut LocalState, delta_strain: &[f64]) -> Result<(), StrError>;
}

/// Holds the actual stress-strain model implementation
pub struct StressStrain {
    /// Holds the actual model implementation
    pub actual: Box<dyn StressStrainTrait>,
}

impl StressStrain {
    /// Allocates a new instance
    pub fn new(ndim: usize, param: &ParamSolid) -> Result<Self, StrError> {
        if ndim < 2 || ndim > 3 {
            return Err("stress-strain models require ndim = 2 (plane-strain) or 3");
        }
        let actual: Box<dyn StressStrainTrait> = match param.stress_strain {
            // Linear elastic model
            ParamStressStrain::LinearElastic { young, poisson } => Box::new(LinearElastic::new(ndim, young, poisson)),

            // von Mises plasticity model
            ParamStressStrain::VonMises {
                young,
                poisson,
                z_ini,
                hh,
            } => {
                if z_ini <= 0.0 {
                    return Err("von Mises model requires z_ini > 0");
                }
                Box::new(VonMises::new(ndim, young, poisson, z_ini, hh))
            }
        };
        Ok(StressStrain { actual })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::StressStrain;
    use crate::base::{ParamSolid, ParamStressStrain};

    #[test]
    fn allocate_stress_strain_model_works() {
        let param = ParamSolid::sample_linear_elastic();
        let model = StressStrain::new(2, &param).unwrap();
        assert_eq!(model.actual.n_internal_values(), 0);

        let param = ParamSolid::sample_von_mises();
        let model = StressStrain::new(3, &param).unwrap();
        assert_eq!(model.actual.n_internal_values(), 2);
    }

    #[test]
    fn allocate_captures_errors() {
        let param = ParamSolid::sample_linear_elastic();
        assert_eq!(
            StressStrain::new(1, &param).err(),
            Some("stress-strain models require ndim = 2 (plane-strain) or 3")
        );
        let param = ParamSolid {
            density: 1.0,
            stress_strain: ParamStressStrain::VonMises {
                young: 1000.0,
                poisson: 0.3,
                z_ini: 0.0,
                hh: 0.0,
            },
        };
        assert_eq!(StressStrain::new(2, &param).err(), Some("von Mises model requires z_ini > 0"));
    }
}
