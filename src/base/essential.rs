use super::{Dof, Ebc, NodeId};
use std::collections::HashMap;
use std::fmt;

/// Holds essential boundary conditions (prescribed displacements at grid nodes)
pub struct Essential {
    pub all: HashMap<(NodeId, Dof), Ebc>,
}

impl Essential {
    /// Allocates a new instance
    pub fn new() -> Self {
        Essential { all: HashMap::new() }
    }

    /// Sets essential boundary condition at nodes
    pub fn at(&mut self, nodes: &[NodeId], ebc: Ebc) -> &mut Self {
        for node_id in nodes {
            self.all.insert((*node_id, ebc.dof()), ebc);
        }
        self
    }

    /// Returns the prescribed displacement increment over the time interval (t − Δt, t]
    ///
    /// Returns None if there is no condition for the (node, dof) pair.
    pub fn increment(&self, node_id: NodeId, dof: Dof, t: f64, dt: f64) -> Option<f64> {
        self.all
            .get(&(node_id, dof))
            .map(|ebc| ebc.value(t) - ebc.value(t - dt))
    }

    /// Returns the (node, dof) keys sorted
    pub fn sorted_keys(&self) -> Vec<(NodeId, Dof)> {
        let mut keys: Vec<_> = self.all.keys().copied().collect();
        keys.sort();
        keys
    }
}

impl fmt::Display for Essential {
    /// Prints a formatted summary of Boundary Conditions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Essential boundary conditions\n")?;
        write!(f, "=============================\n")?;
        for key in self.sorted_keys() {
            if let Some(ebc) = self.all.get(&key) {
                write!(f, "{:?} : {}\n", key.0, ebc)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Essential;
    use crate::base::{Dof, Ebc};

    #[test]
    fn essential_works() {
        let mut essential = Essential::new();
        essential
            .at(&[0], Ebc::Ux(|_| 0.0))
            .at(&[0], Ebc::Uy(|_| 0.0))
            .at(&[3, 4], Ebc::Uy(|t| -t / 2.0));
        assert_eq!(
            format!("{}", essential),
            "Essential boundary conditions\n\
             =============================\n\
             0 : Ux(0) = 0.0, Ux(1) = 0.0\n\
             0 : Uy(0) = 0.0, Uy(1) = 0.0\n\
             3 : Uy(0) = -0.0, Uy(1) = -0.5\n\
             4 : Uy(0) = -0.0, Uy(1) = -0.5\n"
        );
    }

    #[test]
    fn increment_works() {
        let mut essential = Essential::new();
        essential.at(&[1], Ebc::Ux(|t| 3.0 * t)).at(&[2], Ebc::Uy(|_| 0.0));
        assert_eq!(essential.increment(1, Dof::Ux, 0.4, 0.1), Some(3.0 * 0.4 - 3.0 * (0.4 - 0.1)));
        assert_eq!(essential.increment(2, Dof::Uy, 10.0, 1.0), Some(0.0));
        assert_eq!(essential.increment(1, Dof::Uy, 0.4, 0.1), None);
        assert_eq!(essential.sorted_keys(), &[(1, Dof::Ux), (2, Dof::Uy)]);
    }
}
