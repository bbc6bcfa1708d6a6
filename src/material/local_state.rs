use super::mandel_dim;
use serde::{Deserialize, Serialize};

/// Holds the stress state of a material point
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LocalState {
    /// Holds the internal values Z
    pub internal_values: Vec<f64>,

    /// Holds the stress tensor σ (Mandel)
    pub stress: Vec<f64>,

    /// Holds the elastic (vs elastoplastic) flag of the last update
    pub elastic: bool,

    /// Holds the algorithmic plastic multiplier (Δγ) of the last update
    pub algo_lambda: f64,
}

impl LocalState {
    /// Allocates a new instance with zero stress
    pub fn new(ndim: usize, n_internal_values: usize) -> Self {
        LocalState {
            internal_values: vec![0.0; n_internal_values],
            stress: vec![0.0; mandel_dim(ndim)],
            elastic: true,
            algo_lambda: 0.0,
        }
    }

    /// Resets the flags of the last update
    pub fn reset_algorithmic_variables(&mut self) {
        self.elastic = true;
        self.algo_lambda = 0.0;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
