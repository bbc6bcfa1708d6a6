use mpmsim::prelude::*;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "mpmsim_column",
    about = "Simulates a 2D soil column under self-weight with the implicit MPM"
)]
struct Options {
    /// JSON file with the configuration (the default configuration is used if omitted)
    #[structopt(short, long)]
    config: Option<String>,

    /// Uses the von Mises model instead of the linear elastic one
    #[structopt(long)]
    von_mises: bool,

    /// Output directory for the checkpoint files (DEFAULT_OUT_DIR if omitted)
    #[structopt(short, long)]
    out_dir: Option<String>,

    /// Checkpoint file to resume from
    #[structopt(short, long)]
    resume: Option<String>,
}

impl Options {
    /// Returns the output directory
    fn out_dir(&self) -> &str {
        self.out_dir.as_deref().unwrap_or(DEFAULT_OUT_DIR)
    }
}

fn main() -> Result<(), ImplicitError> {
    // parse options
    let options = Options::from_args();

    // configuration
    let config = match &options.config {
        Some(path) => Config::read_json(path).map_err(ImplicitError::Io)?,
        None => {
            let mut config = Config::new(2);
            config
                .set_gravity(10.0)
                .and_then(|c| c.set_verbosity(1))
                .and_then(|c| c.set_checkpoint_every(5))
                .map_err(|e| ImplicitError::Config(e.to_string()))?;
            config
        }
    };
    if config.verbosity >= 1 {
        println!("{}", config);
    }

    // mesh
    let param = if options.von_mises {
        ParamSolid::sample_von_mises()
    } else {
        ParamSolid::sample_linear_elastic()
    };
    let mut mesh = Samples::column_2d(&config, &param).map_err(|e| ImplicitError::Config(e.to_string()))?;

    // run
    let mut solver = SolverImplicit::new(&config)?;
    let out_dir = options.out_dir();
    let summary = match &options.resume {
        Some(path) => solver.resume(&mut mesh, path, Some(out_dir))?,
        None => solver.run(&mut mesh, 0, Some(out_dir))?,
    };

    // message
    let total: usize = summary.n_iterations.iter().sum();
    let message = format!(
        "{} time steps ({} from step {}); {} Newton iterations; {} non-converged steps",
        summary.n_steps,
        summary.n_iterations.len(),
        summary.first_step,
        total,
        summary.n_non_converged
    );
    let thin_line = format!("{:─^1$}", "", message.len());
    println!("\n\n{}", thin_line);
    println!("{}", message);
    println!("checkpoints directory: {}", out_dir);
    println!("{}\n\n", thin_line);
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
