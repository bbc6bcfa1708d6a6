use approx::assert_relative_eq;
use mpmsim::mpm::Side;
use mpmsim::prelude::*;

const DELTA: f64 = 0.001; // displacement rate of the top

fn run_compression(ndim: usize, param: &ParamSolid, n_steps: usize) -> Result<(MpmMesh, RunSummary), ImplicitError> {
    let mut config = Config::new(ndim);
    config
        .set_quasi_static(true)
        .and_then(|c| c.set_dt(1.0))
        .and_then(|c| c.set_n_max_time_steps(n_steps))
        .map_err(|e| ImplicitError::Config(e.to_string()))?;
    let ncell_axis = vec![2; ndim];
    let mut mesh = Samples::confined_block(&config, param, 1.0, &ncell_axis, 2)
        .map_err(|e| ImplicitError::Config(e.to_string()))?;
    let top = mesh.grid.nodes_on_side(Side::Ymax).map_err(ImplicitError::Assembly)?;
    mesh.essential.at(&top, Ebc::Uy(|t| -DELTA * t));
    let mut solver = SolverImplicit::new(&config)?;
    let summary = solver.run(&mut mesh, 0, None)?;
    Ok((mesh, summary))
}

#[test]
fn test_confined_compression_2d() -> Result<(), ImplicitError> {
    // linear elastic oedometric compression (plane strain)
    let param = ParamSolid::sample_linear_elastic();
    let (mesh, summary) = run_compression(2, &param, 2)?;
    assert_eq!(summary.n_iterations, &[1, 1]);

    // uniform strain εyy = -2 Δ / H with H = 2
    let (young, poisson) = (10_000.0, 0.2);
    let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
    let mu = young / (2.0 * (1.0 + poisson));
    let eps_yy = -2.0 * DELTA / 2.0;
    for particle in &mesh.particles.all {
        assert_relative_eq!(particle.strain[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(particle.strain[1], eps_yy, epsilon = 1e-12);
        let sigma = &particle.state.stress;
        assert_relative_eq!(sigma[0], lambda * eps_yy, epsilon = 1e-8);
        assert_relative_eq!(sigma[1], (lambda + 2.0 * mu) * eps_yy, epsilon = 1e-8);
        assert_relative_eq!(sigma[2], lambda * eps_yy, epsilon = 1e-8);
        assert_relative_eq!(sigma[3], 0.0, epsilon = 1e-8);
    }
    Ok(())
}

#[test]
fn test_confined_compression_3d() -> Result<(), ImplicitError> {
    let param = ParamSolid::sample_linear_elastic();
    let (mesh, summary) = run_compression(3, &param, 1)?;
    assert_eq!(summary.n_iterations, &[1]);
    let (young, poisson) = (10_000.0, 0.2);
    let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
    let mu = young / (2.0 * (1.0 + poisson));
    let eps_yy = -DELTA / 2.0;
    for particle in &mesh.particles.all {
        let sigma = &particle.state.stress;
        assert_relative_eq!(sigma[0], lambda * eps_yy, epsilon = 1e-8);
        assert_relative_eq!(sigma[1], (lambda + 2.0 * mu) * eps_yy, epsilon = 1e-8);
        assert_relative_eq!(sigma[2], lambda * eps_yy, epsilon = 1e-8);
        for i in 3..6 {
            assert_relative_eq!(sigma[i], 0.0, epsilon = 1e-8);
        }
        assert_relative_eq!(particle.volume, 0.125 * (1.0 + eps_yy), epsilon = 1e-14);
    }
    Ok(())
}
