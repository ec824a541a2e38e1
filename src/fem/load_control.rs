use crate::base::{Config, ARC_LEN_MIN_DIVISOR};
use crate::StrError;

/// Controls the loading factor and the increment size
///
/// Owns the scalar state machine of the loading history: the last
/// converged total factor, the candidate factor of the running increment,
/// the current/previous increment sizes, and the consecutive-convergence
/// streak gating the increment growth. In arc-length mode the proposed
/// step is a radius Δs instead of a load-factor increment; the radius is
/// seeded from the first-increment probe by [LoadControl::set_initial_arc].
///
/// All operations are local arithmetic: `update` never fails. Degenerate
/// configurations are rejected at construction.
pub struct LoadControl<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Last converged total loading factor
    factor_old: f64,

    /// Candidate total loading factor of the running increment
    factor_new: f64,

    /// Previous (committed) load-factor increment
    ddf_old: f64,

    /// Current proposed load-factor increment
    ddf: f64,

    /// Number of consecutive converged increments since the last growth
    n_converged_seq: usize,

    /// Current arc-length radius Δs (arc-length mode)
    dds: f64,

    /// Previous arc-length radius (arc-length mode)
    dds_old: f64,

    /// Minimum arc-length radius (arc-length mode)
    dds_min: f64,

    /// Maximum arc-length radius (arc-length mode)
    dds_max: f64,
}

impl<'a> LoadControl<'a> {
    /// Allocates a new instance
    ///
    /// The first proposed increment is `dt_ini` clamped to the distance to
    /// the final factor.
    pub fn new(config: &'a Config) -> Result<Self, StrError> {
        if !(config.dt_min <= config.dt_ini && config.dt_ini <= config.dt_max && config.dt_max <= config.t_fin) {
            return Err("the increment limits must satisfy dt_min ≤ dt0 ≤ dt_max ≤ t_fin");
        }
        let (ddf, factor_new) = if config.dt_ini >= config.t_fin {
            (config.t_fin, config.t_fin)
        } else {
            (config.dt_ini, config.dt_ini)
        };
        Ok(LoadControl {
            config,
            factor_old: 0.0,
            factor_new,
            ddf_old: ddf,
            ddf,
            n_converged_seq: 0,
            dds: 0.0,
            dds_old: 0.0,
            dds_min: 0.0,
            dds_max: 0.0,
        })
    }

    /// Returns the candidate total loading factor of the running increment
    pub fn factor(&self) -> f64 {
        self.factor_new
    }

    /// Returns the last converged total loading factor
    pub fn converged_factor(&self) -> f64 {
        self.factor_old
    }

    /// Returns the current proposed load-factor increment
    pub fn increment(&self) -> f64 {
        self.ddf
    }

    /// Returns the current arc-length radius Δs
    pub fn arc_length(&self) -> f64 {
        self.dds
    }

    /// Seeds the arc-length radius and its bounds from the first-increment probe
    pub fn set_initial_arc(&mut self, dds: f64) {
        self.dds = dds;
        self.dds_old = dds;
        self.dds_min = dds / ARC_LEN_MIN_DIVISOR;
        self.dds_max = self.config.arc_len_max_factor * dds;
    }

    /// Updates the increment size after an increment attempt (standard mode)
    ///
    /// On convergence, commits the candidate factor, then either grows the
    /// increment (after `n_growth_steps` consecutive convergences) or holds
    /// it; the result is clamped to `dt_max` and to the remaining distance
    /// to `t_fin`. On failure, shrinks the increment by `cutback_factor`
    /// with a floor at `dt_min` and resets the streak.
    ///
    /// Returns `true` when the final factor has been reached (analysis done).
    pub fn update(&mut self, converged: bool) -> bool {
        if converged {
            self.factor_old = self.factor_new;
            self.ddf_old = self.ddf;
            if self.factor_old >= self.config.t_fin {
                return true; // reached the final loading factor
            }
            if self.n_converged_seq >= self.config.n_growth_steps {
                self.ddf = f64::min(self.config.growth_factor * self.ddf_old, self.config.dt_max);
                self.n_converged_seq = 0;
            } else {
                self.ddf = self.ddf_old;
                self.n_converged_seq += 1;
            }
        } else {
            self.ddf = f64::max(self.ddf * self.config.cutback_factor, self.config.dt_min);
            self.n_converged_seq = 0;
        }
        // clamp to the remaining distance and land exactly on t_fin
        let remaining = self.config.t_fin - self.factor_old;
        if self.ddf >= remaining {
            self.ddf = remaining;
            self.factor_new = self.config.t_fin;
        } else {
            self.factor_new = self.factor_old + self.ddf;
        }
        false
    }

    /// Updates the arc-length radius after an increment attempt (arc-length mode)
    ///
    /// `ddl` is the total load-factor increment achieved by the converged
    /// increment and `iterations` the iteration count it took. Growth of
    /// the radius additionally requires `iterations ≤ n_target_iterations`.
    ///
    /// Returns `true` when the final factor has been reached.
    pub fn update_arc_length(&mut self, converged: bool, ddl: f64, iterations: usize) -> bool {
        if converged {
            self.factor_old += ddl;
            self.factor_new = self.factor_old;
            if self.factor_old >= self.config.t_fin {
                return true; // reached the final loading factor
            }
            self.dds_old = self.dds;
            if self.n_converged_seq >= self.config.n_growth_steps && iterations <= self.config.n_target_iterations {
                self.dds = f64::min(self.config.growth_factor * self.dds_old, self.dds_max);
                self.n_converged_seq = 0;
            } else {
                self.n_converged_seq += 1;
            }
        } else {
            self.dds = f64::max(self.dds * self.config.cutback_factor, self.dds_min);
            self.n_converged_seq = 0;
        }
        false
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
