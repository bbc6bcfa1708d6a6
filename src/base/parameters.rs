use serde::{Deserialize, Serialize};

/// Holds parameters for stress-strain relations (total or effective stress)
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum ParamStressStrain {
    /// Linear elastic model
    LinearElastic {
        /// Young's modulus
        young: f64,

        /// Poisson's coefficient
        poisson: f64,
    },

    /// von Mises plasticity model with linear isotropic hardening
    VonMises {
        /// Young's modulus
        young: f64,

        /// Poisson's coefficient
        poisson: f64,

        /// Initial size of the yield surface (equivalent stress)
        z_ini: f64,

        /// Hardening coefficient
        hh: f64,
    },
}

/// Holds parameters for solid media mechanics simulations
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct ParamSolid {
    /// Intrinsic (real) density
    pub density: f64,

    /// Parameters for the stress-strain model
    pub stress_strain: ParamStressStrain,
}

impl ParamStressStrain {
    /// Returns the number of internal values
    pub fn n_int_val(&self) -> usize {
        match self {
            ParamStressStrain::LinearElastic { .. } => 0,
            ParamStressStrain::VonMises { .. } => 2, // z and εp
        }
    }
}

impl ParamSolid {
    /// Returns a sample of parameters for a linear elastic solid
    pub fn sample_linear_elastic() -> Self {
        ParamSolid {
            density: 2.0, // Mg/m³
            stress_strain: ParamStressStrain::LinearElastic {
                young: 10_000.0, // kPa
                poisson: 0.2,    // [-]
            },
        }
    }

    /// Returns a sample of parameters for a von Mises elastoplastic solid
    pub fn sample_von_mises() -> Self {
        ParamSolid {
            density: 2.0, // Mg/m³
            stress_strain: ParamStressStrain::VonMises {
                young: 10_000.0, // kPa
                poisson: 0.2,    // [-]
                z_ini: 9.0,      // kPa
                hh: 800.0,       // kPa
            },
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ParamSolid, ParamStressStrain};

    #[test]
    fn samples_work() {
        let p = ParamSolid::sample_linear_elastic();
        assert_eq!(p.density, 2.0);
        assert_eq!(p.stress_strain.n_int_val(), 0);
        let p = ParamSolid::sample_von_mises();
        assert_eq!(p.stress_strain.n_int_val(), 2);
        match p.stress_strain {
            ParamStressStrain::VonMises { z_ini, .. } => assert_eq!(z_ini, 9.0),
            _ => panic!("wrong model"),
        }
    }

    #[test]
    fn serialization_works() {
        let p = ParamSolid::sample_von_mises();
        let json = serde_json::to_string(&p).unwrap();
        let q: ParamSolid = serde_json::from_str(&json).unwrap();
        assert_eq!(p, q);
    }
}
