use crate::base::{Config, ConvergedReason, DivergedReason, NonlinearStatus, N_MAX_STEP_FAILURES};

/// Controls the convergence of the nonlinear iterations
///
/// Tracks the residual and corrective-displacement norms of one increment
/// attempt and classifies every iteration with the closed
/// [NonlinearStatus] taxonomy:
///
/// 1. `‖R‖ < tol_rr_abs` — converged on the absolute residual norm
/// 2. `‖R‖ < tol_rr_rel · ‖R₀‖` — converged on the relative residual norm
/// 3. `‖mdu‖/(1 + ‖mdu₀‖) < tol_mdu_rel` — converged on the corrective displacement
/// 4. `‖R‖ > div_rr_max · ‖R₀‖` — diverging
/// 5. NaN or Inf anywhere — diverging
///
/// `‖R₀‖` is the first norm evaluated after [ConvergenceControl::reset];
/// in the standard branch that is the iteration-0 residual, whereas the
/// arc-length corrector only evaluates convergence from iteration 1 on.
///
/// The controller also counts consecutive failed attempts of the same
/// increment; the ceiling is fixed at [N_MAX_STEP_FAILURES].
pub struct ConvergenceControl<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Current iteration index
    iteration: usize,

    /// First evaluated residual norm ‖R₀‖ (baseline)
    norm_rr0: f64,

    /// Indicates that the baseline ‖R₀‖ has been recorded
    has_norm_rr0: bool,

    /// Current residual norm ‖R‖
    norm_rr: f64,

    /// Previous residual norm (for the converging/diverging icons)
    norm_rr_prev: f64,

    /// First corrective-displacement norm ‖mdu₀‖ (scaling baseline)
    norm_mdu0: f64,

    /// Indicates that the baseline ‖mdu₀‖ has been recorded
    has_norm_mdu0: bool,

    /// Current corrective-displacement norm ‖mdu‖
    norm_mdu: f64,

    /// Current relative corrective displacement
    rel_mdu: f64,

    /// Status of the last analyzed iteration
    status: NonlinearStatus,

    /// Total number of converged increments
    n_converged_total: usize,

    /// Number of consecutive failed attempts of the current increment
    n_failed_per_step: usize,
}

impl<'a> ConvergenceControl<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config) -> Self {
        ConvergenceControl {
            config,
            iteration: 0,
            norm_rr0: 0.0,
            has_norm_rr0: false,
            norm_rr: 0.0,
            norm_rr_prev: 0.0,
            norm_mdu0: 0.0,
            has_norm_mdu0: false,
            norm_mdu: 0.0,
            rel_mdu: 0.0,
            status: NonlinearStatus::Iterating,
            n_converged_total: 0,
            n_failed_per_step: 0,
        }
    }

    /// Resets the per-attempt data (baselines, norms, status)
    ///
    /// Must be called at the beginning of each increment attempt. The
    /// consecutive-failure counter is kept; see [ConvergenceControl::reset_failures].
    pub fn reset(&mut self) {
        self.iteration = 0;
        self.norm_rr0 = 0.0;
        self.has_norm_rr0 = false;
        self.norm_rr = 0.0;
        self.norm_rr_prev = 0.0;
        self.norm_mdu0 = 0.0;
        self.has_norm_mdu0 = false;
        self.norm_mdu = 0.0;
        self.rel_mdu = 0.0;
        self.status = NonlinearStatus::Iterating;
    }

    /// Analyzes the residual norm and classifies the iteration
    pub fn analyze_rr(&mut self, iteration: usize, norm_rr: f64) -> NonlinearStatus {
        self.iteration = iteration;
        self.norm_rr_prev = self.norm_rr;
        self.norm_rr = norm_rr;
        if !norm_rr.is_finite() {
            self.status = NonlinearStatus::Diverged(DivergedReason::NanResidual);
            return self.status;
        }
        if norm_rr < self.config.tol_rr_abs {
            self.status = NonlinearStatus::Converged(ConvergedReason::AbsResidual);
            return self.status;
        }
        if !self.has_norm_rr0 {
            self.norm_rr0 = norm_rr;
            self.has_norm_rr0 = true;
            self.status = NonlinearStatus::Iterating;
            return self.status;
        }
        if norm_rr < self.config.tol_rr_rel * self.norm_rr0 {
            self.status = NonlinearStatus::Converged(ConvergedReason::RelResidual);
        } else if norm_rr > self.config.div_rr_max * self.norm_rr0 {
            self.status = NonlinearStatus::Diverged(DivergedReason::DivergenceTolerance);
        } else {
            self.status = NonlinearStatus::Iterating;
        }
        self.status
    }

    /// Analyzes the corrective-displacement norm and classifies the iteration
    pub fn analyze_mdu(&mut self, iteration: usize, norm_mdu: f64) -> NonlinearStatus {
        self.iteration = iteration;
        self.norm_mdu = norm_mdu;
        if !norm_mdu.is_finite() {
            self.status = NonlinearStatus::Diverged(DivergedReason::NanResidual);
            return self.status;
        }
        if !self.has_norm_mdu0 {
            self.norm_mdu0 = norm_mdu;
            self.has_norm_mdu0 = true;
            self.rel_mdu = 1.0;
            self.status = NonlinearStatus::Iterating;
            return self.status;
        }
        self.rel_mdu = norm_mdu / (1.0 + self.norm_mdu0);
        if self.rel_mdu < self.config.tol_mdu_rel {
            self.status = NonlinearStatus::Converged(ConvergedReason::IncrementNorm);
        } else {
            self.status = NonlinearStatus::Iterating;
        }
        self.status
    }

    // bookkeeping

    /// Returns the status of the last analyzed iteration
    pub fn status(&self) -> NonlinearStatus {
        self.status
    }

    /// Returns the index of the last analyzed iteration
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Increments the total number of converged increments
    pub fn add_converged(&mut self) {
        self.n_converged_total += 1;
    }

    /// Increments the number of consecutive failed attempts
    pub fn add_failed(&mut self) {
        self.n_failed_per_step += 1;
    }

    /// Resets the consecutive-failure counter (after a converged increment)
    pub fn reset_failures(&mut self) {
        self.n_failed_per_step = 0;
    }

    /// Checks whether the consecutive-failure ceiling has been reached
    pub fn too_many_failures(&self) -> bool {
        self.n_failed_per_step >= N_MAX_STEP_FAILURES
    }

    /// Returns the total number of converged increments
    pub fn n_converged_total(&self) -> usize {
        self.n_converged_total
    }

    /// Returns the number of consecutive failed attempts of the current increment
    pub fn n_failed_per_step(&self) -> usize {
        self.n_failed_per_step
    }

    // printing

    /// Prints the header of the table with increment and iteration data
    pub fn print_header(&self) {
        if self.config.verbose_increments || self.config.verbose_iterations {
            println!("Legend:");
            println!("✅ : converged");
            println!("👍 : converging");
            println!("🥵 : diverging");
            println!("😱 : found NaN or Inf\n");
            println!(
                "{:>9} {:>13} {:>13} {:>4} {:>5} {:>11} {:>11}",
                "increment", "ℓ", "Δ", "att", "iter", "‖R‖", "‖mdu‖"
            );
        }
    }

    /// Prints the increment-attempt data (attempt number and attempted factor)
    ///
    /// `dd` is the proposed load-factor increment (standard mode) or the
    /// arc-length radius (arc-length mode).
    pub fn print_increment(&self, increment: usize, ell: f64, dd: f64) {
        if self.config.verbose_increments {
            println!(
                "{:>9} {:>13.6e} {:>13.6e} {:>4} {:>5} {:>11} {:>11}",
                increment + 1,
                ell,
                dd,
                self.n_failed_per_step + 1,
                ".",
                ".",
                "."
            );
        }
    }

    /// Prints the iteration data
    pub fn print_iteration(&self) {
        if !self.config.verbose_iterations {
            return;
        }
        let icon = if !self.norm_rr.is_finite() || !self.norm_mdu.is_finite() {
            "😱"
        } else if self.status.converged() {
            "✅"
        } else if self.status.diverged() || (self.iteration > 0 && self.norm_rr > self.norm_rr_prev) {
            "🥵"
        } else {
            "👍"
        };
        println!(
            "{:>9} {:>13} {:>13} {:>4} {:>5} {:>11.4e} {:>11.4e} {}",
            ".", ".", ".", ".", self.iteration, self.norm_rr, self.norm_mdu, icon
        );
    }

    /// Prints the outcome of an increment attempt (reason string)
    pub fn print_increment_end(&self, status: &NonlinearStatus, ell: f64) {
        if self.config.verbose_increments {
            println!("{:>9} ℓ = {:.6e} ... {}", ".", ell, status.description());
        }
    }

    /// Prints the horizontal line at the end of the analysis
    pub fn print_footer(&self) {
        if self.config.verbose_increments || self.config.verbose_iterations {
            println!("{}", "─".repeat(79));
            println!("converged increments: {}", self.n_converged_total);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
