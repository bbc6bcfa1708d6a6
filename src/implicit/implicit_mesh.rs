use crate::base::{DofIndexMap, NodeId};
use crate::StrError;
use nalgebra::{DMatrix, DVector};

/// Holds a local stiffness block contributed by a particle or a node
///
/// The local numbering is `m * ndim + component` with `m` the position of the node in `nodes`.
#[derive(Clone, Debug)]
pub struct LocalMatrix {
    /// Holds the nodes touched by this contribution
    pub nodes: Vec<NodeId>,

    /// Holds the local tangent stiffness (nnode·ndim × nnode·ndim)
    pub kk: DMatrix<f64>,
}

/// Holds a local force vector contributed by a particle or a node
#[derive(Clone, Debug)]
pub struct LocalVector {
    /// Holds the nodes touched by this contribution
    pub nodes: Vec<NodeId>,

    /// Holds the local residual force (external − internal − inertial) (nnode·ndim)
    pub ff: DVector<f64>,
}

/// Defines the contract between the mesh (grid and particles) and the implicit solver
///
/// Contributions are indexed in `[0, n_contributions())`; each one maps to the global system
/// through the DOF index map. The assembly may call the contribution accessors concurrently;
/// thus, implementations must not rely on interior mutability.
pub trait ImplicitMesh: Sync {
    /// Returns the map of active nodes to global equation numbers
    fn dof_map(&self) -> &DofIndexMap;

    /// Returns the number of active DOFs (size of the global system)
    fn active_dof_count(&self) -> usize {
        self.dof_map().n_dof()
    }

    /// Returns the index of a node among the active nodes
    fn global_node_index(&self, node_id: NodeId) -> Option<usize> {
        self.dof_map().node_index(node_id)
    }

    /// Returns the maximum number of nodes coupled to a node (sparse pattern reservation)
    fn node_neighbourhood_size(&self) -> usize;

    /// Returns the number of local contributions (e.g., particles plus active nodes)
    fn n_contributions(&self) -> usize;

    /// Computes the tangent stiffness of a contribution
    fn stiffness_contribution(&self, index: usize) -> Result<LocalMatrix, StrError>;

    /// Computes the residual force of a contribution
    fn force_contribution(&self, index: usize) -> Result<LocalVector, StrError>;

    /// Returns the constrained DOFs (global equation number) and their prescribed increments
    fn constrained_nodes(&self, time: f64) -> Vec<(usize, f64)>;

    /// Updates the state (nodal displacements, particle stresses) given the global Δu
    fn apply_displacement_increment(&mut self, du: &[f64]) -> Result<(), StrError>;
}
