use super::{Grid, MpmMesh, Particles, Side};
use crate::base::{Config, Ebc, Essential, Natural, ParamSolid};
use crate::StrError;

/// Holds samples of material point meshes
pub struct Samples {}

impl Samples {
    /// Returns a block of particles filling the whole grid with roller boundaries
    ///
    /// The block spans `[0, ncell_axis[a] × h]` along each axis with cells of size `h`.
    /// The bottom (Ymin) nodes have Uy = 0; the nodes on the other lateral sides (Xmin, Xmax and,
    /// in 3D, Zmin, Zmax) have the normal displacement fixed. The top (Ymax) is free.
    ///
    /// ```text
    ///     free
    ///  o-------o
    ///  |·· ·· ·|
    /// >|·· ·· ·|<
    ///  |·· ·· ·|
    ///  o-------o
    ///     ^^^
    /// ```
    pub fn confined_block(
        config: &Config,
        param: &ParamSolid,
        h: f64,
        ncell_axis: &[usize],
        n_per_axis: usize,
    ) -> Result<MpmMesh, StrError> {
        let ndim = config.ndim;
        if ncell_axis.len() != ndim {
            return Err("ncell_axis must have ndim components");
        }
        let grid = Grid::new(&vec![0.0; ndim], &vec![h; ndim], ncell_axis)?;
        let mut particles = Particles::new(ndim);
        let cells: Vec<_> = (0..grid.ncell()).collect();
        particles.generate_in_cells(&grid, &cells, n_per_axis, 0, param)?;
        let mut essential = Essential::new();
        essential
            .at(&grid.nodes_on_side(Side::Ymin)?, Ebc::Uy(|_| 0.0))
            .at(&grid.nodes_on_side(Side::Xmin)?, Ebc::Ux(|_| 0.0))
            .at(&grid.nodes_on_side(Side::Xmax)?, Ebc::Ux(|_| 0.0));
        if ndim == 3 {
            essential
                .at(&grid.nodes_on_side(Side::Zmin)?, Ebc::Uz(|_| 0.0))
                .at(&grid.nodes_on_side(Side::Zmax)?, Ebc::Uz(|_| 0.0));
        }
        MpmMesh::new(config, grid, particles, &[*param], essential, Natural::new())
    }

    /// Returns a 2D soil column (1 m wide, 4 m tall) with a fixed base and roller sides
    ///
    /// The background grid has one extra row of empty cells above the column to allow the
    /// particles to move upwards. The column deforms under the gravity given in `config`.
    pub fn column_2d(config: &Config, param: &ParamSolid) -> Result<MpmMesh, StrError> {
        if config.ndim != 2 {
            return Err("column_2d requires ndim = 2");
        }
        let (h, nx, ny) = (0.5, 2, 10);
        let grid = Grid::new(&[0.0, 0.0], &[h, h], &[nx, ny])?;
        let mut particles = Particles::new(2);
        let cells: Vec<_> = (0..nx * (ny - 2)).collect();
        particles.generate_in_cells(&grid, &cells, 2, 0, param)?;
        let bottom = grid.nodes_on_side(Side::Ymin)?;
        let mut essential = Essential::new();
        essential
            .at(&bottom, Ebc::Ux(|_| 0.0))
            .at(&bottom, Ebc::Uy(|_| 0.0))
            .at(&grid.nodes_on_side(Side::Xmin)?, Ebc::Ux(|_| 0.0))
            .at(&grid.nodes_on_side(Side::Xmax)?, Ebc::Ux(|_| 0.0));
        MpmMesh::new(config, grid, particles, &[*param], essential, Natural::new())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
