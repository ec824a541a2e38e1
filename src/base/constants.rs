/// Defines the maximum number of consecutive failed increment attempts
///
/// After this many consecutive divergences of the same increment, the run
/// is aborted as fatal ("too many attempts to get converged").
pub const N_MAX_STEP_FAILURES: usize = 10;

/// Defines the divisor yielding the minimum arc-length radius (Δs_ini / 1024)
pub const ARC_LEN_MIN_DIVISOR: f64 = 1024.0;

/// Defines the smallest allowed dt_min (Config)
pub const CONTROL_MIN_DT_MIN: f64 = 1e-10;

/// Defines the smallest allowed tolerance (Config)
pub const CONTROL_MIN_TOL: f64 = 1e-15;

/// Defines the directory where the simulation result files are saved
pub const DEFAULT_OUT_DIR: &str = "/tmp/loadstep/results";

/// Defines an auxiliary directory where the test result files are saved
pub const DEFAULT_TEST_DIR: &str = "/tmp/loadstep/test";
