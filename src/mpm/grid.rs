use crate::base::NodeId;
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Identifies the sides of the background grid
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Side {
    Xmin,
    Xmax,
    Ymin,
    Ymax,
    Zmin,
    Zmax,
}

/// Holds the shape functions of a point with respect to the nodes of its cell
#[derive(Clone, Debug)]
pub struct PointShape {
    /// Holds the nodes of the cell containing the point
    pub nodes: Vec<NodeId>,

    /// Holds the shape function values N_m(x)
    pub nn: Vec<f64>,

    /// Holds the shape function gradients ∂N_m/∂x_a (nnode × ndim)
    pub gg: Vec<Vec<f64>>,
}

/// Implements a regular axis-aligned background grid
///
/// The cells are bilinear quadrilaterals (Qua4) in 2D or trilinear hexahedra (Hex8) in 3D.
/// Nodes are numbered with the x index running fastest:
///
/// ```text
///  6-----7-----8
///  |     |     |
///  |  2  |  3  |
///  3-----4-----5
///  |     |     |
///  |  0  |  1  |
///  0-----1-----2
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Grid {
    /// Space dimension
    ndim: usize,

    /// Holds the coordinates of the first node (ndim)
    origin: Vec<f64>,

    /// Holds the cell size along each axis (ndim)
    spacing: Vec<f64>,

    /// Holds the number of cells along each axis (ndim)
    ncell_axis: Vec<usize>,
}

impl Grid {
    /// Allocates a new instance
    pub fn new(origin: &[f64], spacing: &[f64], ncell_axis: &[usize]) -> Result<Self, StrError> {
        let ndim = origin.len();
        if ndim < 2 || ndim > 3 {
            return Err("grid requires ndim = 2 or 3");
        }
        if spacing.len() != ndim || ncell_axis.len() != ndim {
            return Err("grid spacing and number of cells must have ndim components");
        }
        if spacing.iter().any(|h| *h <= 0.0) {
            return Err("grid spacing must be positive");
        }
        if ncell_axis.iter().any(|n| *n < 1) {
            return Err("grid must have at least one cell along each axis");
        }
        Ok(Grid {
            ndim,
            origin: origin.to_vec(),
            spacing: spacing.to_vec(),
            ncell_axis: ncell_axis.to_vec(),
        })
    }

    /// Returns the space dimension
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Returns the cell size along each axis
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Returns the volume (area in 2D) of one cell
    pub fn cell_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// Returns the number of nodes along an axis
    fn nnode_axis(&self, a: usize) -> usize {
        self.ncell_axis[a] + 1
    }

    /// Returns the total number of nodes (points)
    pub fn npoint(&self) -> usize {
        (0..self.ndim).map(|a| self.nnode_axis(a)).product()
    }

    /// Returns the total number of cells
    pub fn ncell(&self) -> usize {
        self.ncell_axis.iter().product()
    }

    /// Returns the id of the node with integer coordinates ijk
    pub fn node_id(&self, ijk: &[usize]) -> NodeId {
        let mut id = 0;
        let mut stride = 1;
        for a in 0..self.ndim {
            id += ijk[a] * stride;
            stride *= self.nnode_axis(a);
        }
        id
    }

    /// Returns the integer coordinates of a node
    fn node_ijk(&self, node_id: NodeId) -> Vec<usize> {
        let mut ijk = vec![0; self.ndim];
        let mut rest = node_id;
        for a in 0..self.ndim {
            ijk[a] = rest % self.nnode_axis(a);
            rest /= self.nnode_axis(a);
        }
        ijk
    }

    /// Returns the coordinates of a node
    pub fn node_coords(&self, node_id: NodeId) -> Vec<f64> {
        self.node_ijk(node_id)
            .iter()
            .enumerate()
            .map(|(a, i)| self.origin[a] + (*i as f64) * self.spacing[a])
            .collect()
    }

    /// Returns the integer coordinates of a cell
    fn cell_ijk(&self, cell_id: usize) -> Vec<usize> {
        let mut ijk = vec![0; self.ndim];
        let mut rest = cell_id;
        for a in 0..self.ndim {
            ijk[a] = rest % self.ncell_axis[a];
            rest /= self.ncell_axis[a];
        }
        ijk
    }

    /// Returns the coordinates of the lower corner of a cell
    pub fn cell_min_coords(&self, cell_id: usize) -> Vec<f64> {
        self.cell_ijk(cell_id)
            .iter()
            .enumerate()
            .map(|(a, i)| self.origin[a] + (*i as f64) * self.spacing[a])
            .collect()
    }

    /// Returns the nodes of a cell
    ///
    /// The m-th node sits at the corner with offsets given by the bits of m (x first).
    pub fn cell_nodes(&self, cell_id: usize) -> Vec<NodeId> {
        let base = self.cell_ijk(cell_id);
        let nnode = 1 << self.ndim;
        let mut ijk = vec![0; self.ndim];
        (0..nnode)
            .map(|m| {
                for a in 0..self.ndim {
                    ijk[a] = base[a] + ((m >> a) & 1);
                }
                self.node_id(&ijk)
            })
            .collect()
    }

    /// Finds the cell containing a point
    ///
    /// Returns the cell id and the reference coordinates ξ ∈ [0, 1]ⁿᵈⁱᵐ of the point in the cell.
    /// Points on the upper boundary belong to the last cell.
    pub fn find_cell(&self, x: &[f64]) -> Result<(usize, Vec<f64>), StrError> {
        if x.len() != self.ndim {
            return Err("point coordinates must have ndim components");
        }
        let mut cell_id = 0;
        let mut stride = 1;
        let mut xi = vec![0.0; self.ndim];
        for a in 0..self.ndim {
            let s = (x[a] - self.origin[a]) / self.spacing[a];
            let n = self.ncell_axis[a];
            if !s.is_finite() || s < 0.0 || s > n as f64 {
                return Err("point is outside the grid");
            }
            let i = usize::min(s.floor() as usize, n - 1);
            xi[a] = s - i as f64;
            cell_id += i * stride;
            stride *= n;
        }
        Ok((cell_id, xi))
    }

    /// Computes the shape functions and their gradients at a point
    pub fn shape(&self, x: &[f64]) -> Result<PointShape, StrError> {
        let (cell_id, xi) = self.find_cell(x)?;
        let nodes = self.cell_nodes(cell_id);
        let nnode = nodes.len();
        let mut nn = vec![0.0; nnode];
        let mut gg = vec![vec![0.0; self.ndim]; nnode];
        for m in 0..nnode {
            // 1D factors along each axis: ξ (upper node) or 1 - ξ (lower node)
            let upper: Vec<bool> = (0..self.ndim).map(|a| (m >> a) & 1 == 1).collect();
            let factor: Vec<f64> = (0..self.ndim)
                .map(|a| if upper[a] { xi[a] } else { 1.0 - xi[a] })
                .collect();
            nn[m] = factor.iter().product();
            for a in 0..self.ndim {
                let sign = if upper[a] { 1.0 } else { -1.0 };
                let mut g = sign / self.spacing[a];
                for b in 0..self.ndim {
                    if b != a {
                        g *= factor[b];
                    }
                }
                gg[m][a] = g;
            }
        }
        Ok(PointShape { nodes, nn, gg })
    }

    /// Returns the nodes on a side of the grid
    pub fn nodes_on_side(&self, side: Side) -> Result<Vec<NodeId>, StrError> {
        let (axis, at_max) = match side {
            Side::Xmin => (0, false),
            Side::Xmax => (0, true),
            Side::Ymin => (1, false),
            Side::Ymax => (1, true),
            Side::Zmin => (2, false),
            Side::Zmax => (2, true),
        };
        if axis >= self.ndim {
            return Err("side is not available in this space dimension");
        }
        let target = if at_max { self.ncell_axis[axis] } else { 0 };
        Ok((0..self.npoint())
            .filter(|id| self.node_ijk(*id)[axis] == target)
            .collect())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Grid, Side};
    use approx::assert_relative_eq;

    #[test]
    fn new_captures_errors() {
        assert_eq!(Grid::new(&[0.0], &[1.0], &[1]).err(), Some("grid requires ndim = 2 or 3"));
        assert_eq!(
            Grid::new(&[0.0, 0.0], &[1.0], &[1, 1]).err(),
            Some("grid spacing and number of cells must have ndim components")
        );
        assert_eq!(
            Grid::new(&[0.0, 0.0], &[1.0, 0.0], &[1, 1]).err(),
            Some("grid spacing must be positive")
        );
        assert_eq!(
            Grid::new(&[0.0, 0.0], &[1.0, 1.0], &[1, 0]).err(),
            Some("grid must have at least one cell along each axis")
        );
    }

    #[test]
    fn numbering_works_2d() {
        let grid = Grid::new(&[0.0, 0.0], &[1.0, 0.5], &[2, 2]).unwrap();
        assert_eq!(grid.npoint(), 9);
        assert_eq!(grid.ncell(), 4);
        assert_eq!(grid.cell_volume(), 0.5);
        assert_eq!(grid.node_id(&[1, 2]), 7);
        assert_eq!(grid.node_coords(5), &[2.0, 0.5]);
        assert_eq!(grid.cell_nodes(0), &[0, 1, 3, 4]);
        assert_eq!(grid.cell_nodes(3), &[4, 5, 7, 8]);
        assert_eq!(grid.cell_min_coords(3), &[1.0, 0.5]);
        assert_eq!(grid.nodes_on_side(Side::Xmin).unwrap(), &[0, 3, 6]);
        assert_eq!(grid.nodes_on_side(Side::Ymax).unwrap(), &[6, 7, 8]);
        assert_eq!(
            grid.nodes_on_side(Side::Zmin).err(),
            Some("side is not available in this space dimension")
        );
    }

    #[test]
    fn find_cell_works() {
        let grid = Grid::new(&[0.0, 0.0], &[1.0, 1.0], &[2, 2]).unwrap();
        let (cell, xi) = grid.find_cell(&[1.25, 0.5]).unwrap();
        assert_eq!(cell, 1);
        assert_relative_eq!(xi[0], 0.25);
        assert_relative_eq!(xi[1], 0.5);
        let (cell, xi) = grid.find_cell(&[2.0, 2.0]).unwrap();
        assert_eq!(cell, 3);
        assert_eq!(xi, &[1.0, 1.0]);
        assert_eq!(grid.find_cell(&[2.1, 0.0]).err(), Some("point is outside the grid"));
        assert_eq!(grid.find_cell(&[-0.1, 0.0]).err(), Some("point is outside the grid"));
    }

    #[test]
    fn shape_functions_work_3d() {
        let grid = Grid::new(&[0.0, 0.0, 0.0], &[2.0, 1.0, 1.0], &[1, 1, 1]).unwrap();
        let shape = grid.shape(&[0.5, 0.25, 0.75]).unwrap();
        assert_eq!(shape.nodes, &[0, 1, 2, 3, 4, 5, 6, 7]);
        // partition of unity and zero-sum gradients
        let sum: f64 = shape.nn.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-15);
        for a in 0..3 {
            let sum_g: f64 = shape.gg.iter().map(|g| g[a]).sum();
            assert_relative_eq!(sum_g, 0.0, epsilon = 1e-15);
        }
        // linear completeness: Σ N_m x_m = x and Σ G_m ⊗ x_m = I
        let x = [0.5, 0.25, 0.75];
        for a in 0..3 {
            let xa: f64 = (0..8).map(|m| shape.nn[m] * grid.node_coords(shape.nodes[m])[a]).sum();
            assert_relative_eq!(xa, x[a], epsilon = 1e-15);
            for b in 0..3 {
                let dxa_dxb: f64 = (0..8).map(|m| shape.gg[m][b] * grid.node_coords(shape.nodes[m])[a]).sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert_relative_eq!(dxa_dxb, expected, epsilon = 1e-14);
            }
        }
    }
}
