use approx::assert_relative_eq;
use mpmsim::prelude::*;

const OUT_DIR: &str = "/tmp/mpmsim/test/checkpoint_resume_2d";

fn new_mesh(config: &Config) -> Result<MpmMesh, ImplicitError> {
    let param = ParamSolid::sample_linear_elastic();
    Samples::column_2d(config, &param).map_err(|e| ImplicitError::Config(e.to_string()))
}

#[test]
fn test_checkpoint_resume_2d() -> Result<(), ImplicitError> {
    // soil column falling under self-weight
    let mut config = Config::new(2);
    config
        .set_gravity(10.0)
        .and_then(|c| c.set_dt(0.005))
        .and_then(|c| c.set_n_max_time_steps(4))
        .and_then(|c| c.set_checkpoint_every(2))
        .map_err(|e| ImplicitError::Config(e.to_string()))?;

    // uninterrupted run writing checkpoints at steps 2 and 4
    let mut mesh_a = new_mesh(&config)?;
    let mut solver = SolverImplicit::new(&config)?;
    let summary_a = solver.run(&mut mesh_a, 0, Some(OUT_DIR))?;
    assert_eq!(summary_a.n_steps, 4);

    // resume from step 2 with a fresh mesh and solver
    let mut mesh_b = new_mesh(&config)?;
    let mut solver = SolverImplicit::new(&config)?;
    let summary_b = solver.resume(&mut mesh_b, &Checkpoint::path(OUT_DIR, 2), None)?;
    assert_eq!(summary_b.first_step, 2);
    assert_eq!(summary_b.n_steps, 4);
    assert_eq!(summary_b.n_iterations, &summary_a.n_iterations[2..]);

    // same converged state
    let last = Checkpoint::read_json(&Checkpoint::path(OUT_DIR, 4))?;
    assert_relative_eq!(last.time, 4.0 * 0.005, epsilon = 1e-15);
    for (a, b) in mesh_a.particles.all.iter().zip(&mesh_b.particles.all) {
        for d in 0..2 {
            assert_relative_eq!(a.position[d], b.position[d], epsilon = 1e-12);
            assert_relative_eq!(a.velocity[d], b.velocity[d], epsilon = 1e-10);
        }
        for i in 0..4 {
            assert_relative_eq!(a.state.stress[i], b.state.stress[i], epsilon = 1e-8);
        }
    }

    // the column moved down
    let initial = new_mesh(&config)?;
    let mut moved = mesh_a.particles.all.iter().zip(&initial.particles.all);
    assert!(moved.any(|(a, p)| a.position[1] < p.position[1]));
    Ok(())
}
