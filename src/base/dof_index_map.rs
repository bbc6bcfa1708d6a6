use super::Dof;
use crate::StrError;
use std::fmt;

/// Defines an alias for the grid node identification number
pub type NodeId = usize;

/// Maps active grid nodes to contiguous global equation numbers (DOF numbers)
///
/// Only nodes that carry mass in the current time step are active. Each active node holds
/// `ndim` displacement DOFs numbered consecutively in the order the active nodes are given:
///
/// ```text
/// active nodes: [2, 5, 6]       (ndim = 2)
///
///   node   index   Ux   Uy
///     2  →   0  →   0    1
///     5  →   1  →   2    3
///     6  →   2  →   4    5
/// ```
///
/// The map is bijective onto `[0, n_dof)` and must be rebuilt whenever the set of active
/// nodes changes (e.g., between time steps).
#[derive(Clone, Debug)]
pub struct DofIndexMap {
    /// Space dimension (number of DOFs per node)
    ndim: usize,

    /// Holds the index of each grid node among the active nodes (None if inactive)
    ///
    /// (npoint)
    node_to_index: Vec<Option<usize>>,

    /// Holds the active nodes in the order of their indices
    ///
    /// (n_active_node)
    active_nodes: Vec<NodeId>,
}

impl DofIndexMap {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `ndim` -- space dimension (2 or 3)
    /// * `npoint` -- total number of grid nodes (active or not)
    /// * `active_nodes` -- the active nodes; the order defines the equation numbers
    pub fn new(ndim: usize, npoint: usize, active_nodes: &[NodeId]) -> Result<Self, StrError> {
        if ndim < 2 || ndim > 3 {
            return Err("ndim must be 2 or 3");
        }
        let mut node_to_index = vec![None; npoint];
        for (index, node_id) in active_nodes.iter().enumerate() {
            if *node_id >= npoint {
                return Err("cannot map active node because NodeId is out-of-bounds");
            }
            if node_to_index[*node_id].is_some() {
                return Err("cannot map active node because NodeId is repeated");
            }
            node_to_index[*node_id] = Some(index);
        }
        Ok(DofIndexMap {
            ndim,
            node_to_index,
            active_nodes: active_nodes.to_vec(),
        })
    }

    /// Allocates an empty map (no active nodes)
    pub fn new_empty(ndim: usize) -> Self {
        DofIndexMap {
            ndim,
            node_to_index: Vec::new(),
            active_nodes: Vec::new(),
        }
    }

    /// Returns the space dimension (number of DOFs per node)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Returns the total number of DOFs (equations)
    #[inline]
    pub fn n_dof(&self) -> usize {
        self.active_nodes.len() * self.ndim
    }

    /// Returns the number of active nodes
    #[inline]
    pub fn n_active_node(&self) -> usize {
        self.active_nodes.len()
    }

    /// Returns the active nodes in the order of their indices
    #[inline]
    pub fn active_nodes(&self) -> &[NodeId] {
        &self.active_nodes
    }

    /// Returns the index of a node among the active nodes
    ///
    /// Returns None if the node is inactive or out-of-bounds.
    #[inline]
    pub fn node_index(&self, node_id: NodeId) -> Option<usize> {
        match self.node_to_index.get(node_id) {
            Some(index) => *index,
            None => None,
        }
    }

    /// Returns the global equation number of a (node, dof) pair
    pub fn eq(&self, node_id: NodeId, dof: Dof) -> Result<usize, StrError> {
        if node_id >= self.node_to_index.len() {
            return Err("cannot find equation number because NodeId is out-of-bounds");
        }
        if dof.index() >= self.ndim {
            return Err("cannot find equation number because DOF is not available in this space dimension");
        }
        match self.node_to_index[node_id] {
            Some(index) => Ok(index * self.ndim + dof.index()),
            None => Err("cannot find equation number because the node is inactive"),
        }
    }

    /// Computes the local-to-global map of a set of nodes
    ///
    /// The local numbering is `m * ndim + component` with `m` the position of the node in `nodes`.
    pub fn local_to_global(&self, nodes: &[NodeId]) -> Result<Vec<usize>, StrError> {
        let mut l2g = vec![0; nodes.len() * self.ndim];
        for (m, node_id) in nodes.iter().enumerate() {
            let index = self
                .node_index(*node_id)
                .ok_or("cannot compute local-to-global map because a node is inactive")?;
            for d in 0..self.ndim {
                l2g[m * self.ndim + d] = index * self.ndim + d;
            }
        }
        Ok(l2g)
    }
}

impl fmt::Display for DofIndexMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Active nodes: DOFs and global equation numbers\n")?;
        write!(f, "==============================================\n")?;
        for (index, node_id) in self.active_nodes.iter().enumerate() {
            let pairs: Vec<_> = (0..self.ndim)
                .map(|d| (Dof::from_index(d).unwrap_or(Dof::Ux), index * self.ndim + d))
                .collect();
            write!(f, "{}: {:?}\n", node_id, pairs)?;
        }
        write!(f, "\nInformation\n")?;
        write!(f, "===========\n")?;
        write!(f, "number of active nodes = {}\n", self.n_active_node())?;
        write!(f, "number of equations = {}\n", self.n_dof())?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
