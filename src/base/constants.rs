/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/mpmsim/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/mpmsim/test";

/// Defines the smallest allowed tolerance (Config)
pub const CONFIG_MIN_TOL: f64 = 1e-15;

/// Defines the smallest allowed time increment (Config)
pub const CONFIG_MIN_DT: f64 = 1e-10;

/// Defines the smallest norm that is still considered non-zero by the convergence checks
pub const NORM_ZERO: f64 = 1e-15;

/// Defines the smallest nodal mass of an active node
pub const NODAL_MASS_MIN: f64 = 1e-12;
