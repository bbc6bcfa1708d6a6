use super::{elastic_modulus, LocalState, StressStrainTrait};
use crate::StrError;
use nalgebra::DMatrix;

/// Implements a linear elastic model
pub struct LinearElastic {
    /// Holds the elastic modulus Dₑ (Mandel)
    dd: DMatrix<f64>,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new(ndim: usize, young: f64, poisson: f64) -> Self {
        LinearElastic {
            dd: elastic_modulus(ndim, young, poisson),
        }
    }
}

impl StressStrainTrait for LinearElastic {
    fn n_internal_values(&self) -> usize {
        0
    }

    fn initialize_internal_values(&self, _state: &mut LocalState) -> Result<(), StrError> {
        Ok(())
    }

    fn stiffness(&self, dd: &mut DMatrix<f64>, _state: &LocalState) -> Result<(), StrError> {
        dd.copy_from(&self.dd);
        Ok(())
    }

    fn update_stress(&self, state: &mut LocalState, delta_strain: &[f64]) -> Result<(), StrError> {
        let nd = state.stress.len();
        if delta_strain.len() != nd {
            return Err("strain increment has incompatible dimension");
        }
        // σ += D : Δε
        for i in 0..nd {
            for j in 0..nd {
                state.stress[i] += self.dd[(i, j)] * delta_strain[j];
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::LinearElastic;
    use crate::material::{LocalState, StressStrainTrait};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn update_stress_works() {
        let (young, poisson) = (1000.0, 0.25);
        let model = LinearElastic::new(2, young, poisson);
        let mut state = LocalState::new(2, 0);
        model.update_stress(&mut state, &[0.001, 0.0, 0.0, 0.0]).unwrap();
        let c = young / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        assert_relative_eq!(state.stress[0], c * (1.0 - poisson) * 0.001, epsilon = 1e-12);
        assert_relative_eq!(state.stress[1], c * poisson * 0.001, epsilon = 1e-12);
        assert_relative_eq!(state.stress[2], c * poisson * 0.001, epsilon = 1e-12);
        assert_eq!(state.stress[3], 0.0);
        assert_eq!(
            model.update_stress(&mut state, &[0.0; 6]).err(),
            Some("strain increment has incompatible dimension")
        );
    }

    #[test]
    fn stiffness_works() {
        let model = LinearElastic::new(3, 600.0, 0.2);
        let state = LocalState::new(3, 0);
        let mut dd = DMatrix::<f64>::zeros(6, 6);
        model.stiffness(&mut dd, &state).unwrap();
        assert_relative_eq!(dd[(3, 3)], 600.0 / 1.2, epsilon = 1e-12);
        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(dd[(i, j)], dd[(j, i)]);
            }
        }
    }
}
