use super::{Method, CONTROL_MIN_DT_MIN, CONTROL_MIN_TOL};
use crate::StrError;
use russell_sparse::{Genie, LinSolParams};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Holds the parameters controlling the incremental-loading analysis
///
/// The structure is immutable once handed to a solver; degenerate
/// combinations are rejected by [Config::validate] at solver construction.
///
/// The serde field names match the externally recognized option keys, so a
/// configuration may be read from a JSON file with [Config::read_json]:
///
/// ```json
/// {
///   "method": "arclength_cylinder",
///   "t-final": 1.0,
///   "dt0": 0.1,
///   "dtmin": 0.001,
///   "dtmax": 0.2,
///   "growth-factor": 1.5,
///   "cutback-factor": 0.5,
///   "abs-tolerance": 1e-9,
///   "rel-tolerance": 1e-7,
///   "du-tolerance": 1e-7,
///   "maxiters": 10,
///   "destinate-iters": 5,
///   "max-arc-len-param": 8.0
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Increment-driving method
    #[serde(rename = "method")]
    pub method: Method,

    /// Target total load factor
    #[serde(rename = "t-final")]
    pub t_fin: f64,

    /// Initial load-factor increment
    ///
    /// In arc-length mode, this value also drives the very first increment
    /// (trial loading factor) and thus seeds the initial arc-length radius.
    #[serde(rename = "dt0")]
    pub dt_ini: f64,

    /// Minimum allowed load-factor increment
    #[serde(rename = "dtmin")]
    pub dt_min: f64,

    /// Maximum allowed load-factor increment
    #[serde(rename = "dtmax")]
    pub dt_max: f64,

    /// Increment growth ratio (> 1)
    #[serde(rename = "growth-factor")]
    pub growth_factor: f64,

    /// Increment cutback ratio on failure (∈ (0,1))
    #[serde(rename = "cutback-factor")]
    pub cutback_factor: f64,

    /// Number of consecutive converged increments required before growth
    #[serde(rename = "growth-steps")]
    pub n_growth_steps: usize,

    /// Absolute tolerance for the residual norm
    #[serde(rename = "abs-tolerance")]
    pub tol_rr_abs: f64,

    /// Relative tolerance for the residual norm (w.r.t. ‖R₀‖)
    #[serde(rename = "rel-tolerance")]
    pub tol_rr_rel: f64,

    /// Relative tolerance for the corrective displacement (mdu = -δu)
    #[serde(rename = "du-tolerance")]
    pub tol_mdu_rel: f64,

    /// Divergence multiple of the first evaluated residual norm
    #[serde(rename = "div-tolerance")]
    pub div_rr_max: f64,

    /// Maximum number of iterations per increment
    #[serde(rename = "maxiters")]
    pub n_max_iterations: usize,

    /// Maximum number of increments (including failed attempts)
    #[serde(rename = "max-increments")]
    pub n_max_increments: usize,

    /// Target iteration count gating the arc-length radius growth
    #[serde(rename = "destinate-iters")]
    pub n_target_iterations: usize,

    /// Maximum arc-length radius as a multiple of the initial radius
    #[serde(rename = "max-arc-len-param")]
    pub arc_len_max_factor: f64,

    /// Large-penalty pivot for prescribed equations (unit pivot if None)
    #[serde(rename = "dirichlet-penalty")]
    pub dirichlet_penalty: Option<f64>,

    /// Verbose mode during increments
    #[serde(rename = "verbose-increments")]
    pub verbose_increments: bool,

    /// Verbose mode during iterations
    #[serde(rename = "verbose-iterations")]
    pub verbose_iterations: bool,

    /// Linear solver kind
    #[serde(skip, default = "default_lin_sol_genie")]
    pub lin_sol_genie: Genie,

    /// Options for the linear solver
    #[serde(skip, default = "default_lin_sol_params")]
    pub lin_sol_params: LinSolParams,
}

fn default_lin_sol_genie() -> Genie {
    Genie::Umfpack
}

fn default_lin_sol_params() -> LinSolParams {
    LinSolParams::new()
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            method: Method::Standard,
            t_fin: 1.0,
            dt_ini: 0.1,
            dt_min: CONTROL_MIN_DT_MIN,
            dt_max: 0.1,
            growth_factor: 1.5,
            cutback_factor: 0.5,
            n_growth_steps: 5,
            tol_rr_abs: 1e-9,
            tol_rr_rel: 1e-7,
            tol_mdu_rel: 1e-7,
            div_rr_max: 1e4,
            n_max_iterations: 10,
            n_max_increments: 1_000,
            n_target_iterations: 5,
            arc_len_max_factor: 8.0,
            dirichlet_penalty: None,
            verbose_increments: true,
            verbose_iterations: false,
            lin_sol_genie: Genie::Umfpack,
            lin_sol_params: LinSolParams::new(),
        }
    }

    /// Reads a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, StrError> {
        serde_json::from_str(json).map_err(|_| "cannot parse the configuration JSON string")
    }

    /// Reads a configuration from a JSON file
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open the configuration file")?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|_| "cannot parse the configuration file")
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.t_fin <= 0.0 {
            return Some(format!("t_fin = {:?} is incorrect; it must be > 0.0", self.t_fin));
        }
        if self.dt_min < CONTROL_MIN_DT_MIN {
            return Some(format!(
                "dt_min = {:?} is incorrect; it must be ≥ {:e}",
                self.dt_min, CONTROL_MIN_DT_MIN
            ));
        }
        if self.dt_ini < self.dt_min {
            return Some(format!(
                "dt0 = {:?} is incorrect; it must be ≥ dt_min = {:?}",
                self.dt_ini, self.dt_min
            ));
        }
        if self.dt_max < self.dt_ini {
            return Some(format!(
                "dt_max = {:?} is incorrect; it must be ≥ dt0 = {:?}",
                self.dt_max, self.dt_ini
            ));
        }
        if self.t_fin < self.dt_max {
            return Some(format!(
                "t_fin = {:?} is incorrect; it must be ≥ dt_max = {:?}",
                self.t_fin, self.dt_max
            ));
        }
        if self.growth_factor <= 1.0 {
            return Some(format!(
                "growth_factor = {:?} is incorrect; it must be > 1.0",
                self.growth_factor
            ));
        }
        if self.cutback_factor <= 0.0 || self.cutback_factor >= 1.0 {
            return Some(format!(
                "cutback_factor = {:?} is incorrect; it must be 0.0 < ratio < 1.0",
                self.cutback_factor
            ));
        }
        if self.tol_rr_abs < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_rr_abs = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rr_abs, CONTROL_MIN_TOL
            ));
        }
        if self.tol_rr_rel < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_rr_rel = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rr_rel, CONTROL_MIN_TOL
            ));
        }
        if self.tol_mdu_rel < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_mdu_rel = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_mdu_rel, CONTROL_MIN_TOL
            ));
        }
        if self.div_rr_max <= 1.0 {
            return Some(format!(
                "div_rr_max = {:?} is incorrect; it must be > 1.0",
                self.div_rr_max
            ));
        }
        if self.n_max_iterations < 1 {
            return Some("n_max_iterations must be ≥ 1".to_string());
        }
        if self.n_max_increments < 1 {
            return Some("n_max_increments must be ≥ 1".to_string());
        }
        if self.n_target_iterations < 1 {
            return Some("n_target_iterations must be ≥ 1".to_string());
        }
        if self.arc_len_max_factor < 1.0 {
            return Some(format!(
                "arc_len_max_factor = {:?} is incorrect; it must be ≥ 1.0",
                self.arc_len_max_factor
            ));
        }
        if let Some(penalty) = self.dirichlet_penalty {
            if penalty < 1.0 {
                return Some(format!(
                    "dirichlet_penalty = {:?} is incorrect; it must be ≥ 1.0",
                    penalty
                ));
            }
        }
        None // all good
    }

    /// Sets the increment-driving method
    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// Sets the target total load factor
    pub fn set_t_fin(&mut self, value: f64) -> &mut Self {
        self.t_fin = value;
        self
    }

    /// Sets the initial load-factor increment
    pub fn set_dt_ini(&mut self, value: f64) -> &mut Self {
        self.dt_ini = value;
        self
    }

    /// Sets the minimum allowed load-factor increment
    pub fn set_dt_min(&mut self, value: f64) -> &mut Self {
        self.dt_min = value;
        self
    }

    /// Sets the maximum allowed load-factor increment
    pub fn set_dt_max(&mut self, value: f64) -> &mut Self {
        self.dt_max = value;
        self
    }

    /// Sets the increment growth ratio (> 1)
    pub fn set_growth_factor(&mut self, value: f64) -> &mut Self {
        self.growth_factor = value;
        self
    }

    /// Sets the increment cutback ratio on failure (∈ (0,1))
    pub fn set_cutback_factor(&mut self, value: f64) -> &mut Self {
        self.cutback_factor = value;
        self
    }

    /// Sets the number of consecutive converged increments required before growth
    pub fn set_growth_steps(&mut self, count: usize) -> &mut Self {
        self.n_growth_steps = count;
        self
    }

    /// Sets the absolute tolerance for the residual norm
    pub fn set_tol_rr_abs(&mut self, value: f64) -> &mut Self {
        self.tol_rr_abs = value;
        self
    }

    /// Sets the relative tolerance for the residual norm
    pub fn set_tol_rr_rel(&mut self, value: f64) -> &mut Self {
        self.tol_rr_rel = value;
        self
    }

    /// Sets the relative tolerance for the corrective displacement
    pub fn set_tol_mdu_rel(&mut self, value: f64) -> &mut Self {
        self.tol_mdu_rel = value;
        self
    }

    /// Sets the divergence multiple of the first evaluated residual norm
    pub fn set_div_rr_max(&mut self, value: f64) -> &mut Self {
        self.div_rr_max = value;
        self
    }

    /// Sets the maximum number of iterations per increment
    pub fn set_n_max_iterations(&mut self, count: usize) -> &mut Self {
        self.n_max_iterations = count;
        self
    }

    /// Sets the maximum number of increments (including failed attempts)
    pub fn set_n_max_increments(&mut self, count: usize) -> &mut Self {
        self.n_max_increments = count;
        self
    }

    /// Sets the target iteration count gating the arc-length radius growth
    pub fn set_n_target_iterations(&mut self, count: usize) -> &mut Self {
        self.n_target_iterations = count;
        self
    }

    /// Sets the maximum arc-length radius as a multiple of the initial radius
    pub fn set_arc_len_max_factor(&mut self, value: f64) -> &mut Self {
        self.arc_len_max_factor = value;
        self
    }

    /// Sets the large-penalty pivot for prescribed equations
    pub fn set_dirichlet_penalty(&mut self, value: Option<f64>) -> &mut Self {
        self.dirichlet_penalty = value;
        self
    }

    /// Sets the verbose mode during increments and iterations
    pub fn set_verbose(&mut self, increments: bool, iterations: bool) -> &mut Self {
        self.verbose_increments = increments;
        self.verbose_iterations = iterations;
        self
    }

    /// Sets the linear solver kind
    pub fn set_lin_sol_genie(&mut self, genie: Genie) -> &mut Self {
        self.lin_sol_genie = genie;
        self
    }

    /// Sets the options for the linear solver
    pub fn set_lin_sol_params(&mut self, params: LinSolParams) -> &mut Self {
        self.lin_sol_params = params;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Loading control parameters\n").unwrap();
        write!(f, "==========================\n").unwrap();
        write!(f, "method = {:?}\n", self.method).unwrap();
        write!(f, "t_fin = {:?}\n", self.t_fin).unwrap();
        write!(f, "dt_ini = {:?}\n", self.dt_ini).unwrap();
        write!(f, "dt_min = {:?}\n", self.dt_min).unwrap();
        write!(f, "dt_max = {:?}\n", self.dt_max).unwrap();
        write!(f, "growth_factor = {:?}\n", self.growth_factor).unwrap();
        write!(f, "cutback_factor = {:?}\n", self.cutback_factor).unwrap();
        write!(f, "n_growth_steps = {:?}\n", self.n_growth_steps).unwrap();
        write!(f, "tol_rr_abs = {:?}\n", self.tol_rr_abs).unwrap();
        write!(f, "tol_rr_rel = {:?}\n", self.tol_rr_rel).unwrap();
        write!(f, "tol_mdu_rel = {:?}\n", self.tol_mdu_rel).unwrap();
        write!(f, "div_rr_max = {:?}\n", self.div_rr_max).unwrap();
        write!(f, "n_max_iterations = {:?}\n", self.n_max_iterations).unwrap();
        write!(f, "n_max_increments = {:?}\n", self.n_max_increments).unwrap();
        write!(f, "n_target_iterations = {:?}\n", self.n_target_iterations).unwrap();
        write!(f, "arc_len_max_factor = {:?}\n", self.arc_len_max_factor).unwrap();
        write!(f, "dirichlet_penalty = {:?}\n", self.dirichlet_penalty).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
