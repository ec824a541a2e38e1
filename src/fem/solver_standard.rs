use super::{ConvergenceControl, ElementSystem, FemState, LoadControl, NonlinSolTrait, SolverData, SolverNewton};
use crate::base::{Config, NonlinearStatus};
use crate::StrError;
use russell_lab::{vec_copy, Vector};

/// Implements the standard (load-controlled) incremental solver
///
/// Drives the analysis increment by increment: proposes the next loading
/// factor through [LoadControl], hands one increment to the generic
/// nonlinear solver (an implementation of [NonlinSolTrait];
/// [SolverNewton] by default), and interprets the resulting status. A
/// diverged increment is retried with a cut-back increment after restoring
/// the last converged solution; after
/// [crate::base::N_MAX_STEP_FAILURES] consecutive failures the run is
/// aborted as fatal.
pub struct SolverStandard<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Holds data to assemble and solve the global linear system
    pub data: SolverData<'a>,

    /// Holds the convergence control
    control: ConvergenceControl<'a>,

    /// Holds the load-factor control
    load_control: LoadControl<'a>,

    /// Holds the generic nonlinear solver driving one increment
    nonlin: Box<dyn NonlinSolTrait + 'a>,

    /// Backup of the primary unknowns (restored on a failed attempt)
    u_backup: Vector,

    /// Status of the last increment attempt
    last_status: NonlinearStatus,

    /// Number of the current increment (converged increments so far)
    increment: usize,
}

impl<'a> SolverStandard<'a> {
    /// Allocates a new instance with the bundled Newton solver
    pub fn new(config: &'a Config, system: &'a mut dyn ElementSystem) -> Result<Self, StrError> {
        let data = SolverData::new(config, system)?;
        let neq_total = data.ls.neq_total;
        Ok(SolverStandard {
            config,
            data,
            control: ConvergenceControl::new(config),
            load_control: LoadControl::new(config)?,
            nonlin: Box::new(SolverNewton::new(config)),
            u_backup: Vector::new(neq_total),
            last_status: NonlinearStatus::Iterating,
            increment: 0,
        })
    }

    /// Replaces the generic nonlinear solver (e.g., with a globalized one)
    pub fn set_nonlinear_solver(&mut self, nonlin: Box<dyn NonlinSolTrait + 'a>) {
        self.nonlin = nonlin;
    }

    /// Returns the status of the last increment attempt
    pub fn status(&self) -> NonlinearStatus {
        self.last_status
    }

    /// Returns the total number of converged increments
    pub fn n_converged(&self) -> usize {
        self.control.n_converged_total()
    }

    /// Runs one increment attempt
    ///
    /// Returns `(converged, completed)`: whether this attempt converged and
    /// whether the final loading factor has been reached. A failed attempt
    /// leaves the state at the last converged solution with the next
    /// (cut-back) increment already proposed.
    pub fn run_increment(&mut self, state: &mut FemState) -> Result<(bool, bool), StrError> {
        // prepare the attempt
        vec_copy(&mut self.u_backup, &state.u).unwrap();
        state.ddu.fill(0.0);
        state.ell = self.load_control.factor();
        self.data.system.initial_guess(state, self.load_control.increment())?;
        self.control
            .print_increment(self.increment, state.ell, self.load_control.increment());

        // invoke the generic nonlinear solver
        let status = self.nonlin.solve_increment(state, &mut self.data, &mut self.control)?;
        self.last_status = status;
        self.control.print_increment_end(&status, state.ell);

        if status.converged() {
            self.control.add_converged();
            self.control.reset_failures();
            self.increment += 1;
            let completed = self.load_control.update(true);
            Ok((true, completed))
        } else {
            // restore the last converged solution
            vec_copy(&mut state.u, &self.u_backup).unwrap();
            state.ddu.fill(0.0);
            state.ell = self.load_control.converged_factor();
            self.control.add_failed();
            if self.control.too_many_failures() {
                return Err("too many attempts to get converged");
            }
            self.load_control.update(false);
            Ok((false, false))
        }
    }

    /// Runs the whole incremental analysis
    pub fn solve(&mut self, state: &mut FemState) -> Result<(), StrError> {
        if state.u.dim() != self.data.ls.neq_total {
            return Err("the dimension of the state vectors does not match the system");
        }
        self.control.print_header();
        for _ in 0..self.config.n_max_increments {
            let (_, completed) = self.run_increment(state)?;
            if completed {
                self.control.print_footer();
                return Ok(());
            }
        }
        Err("reached the maximum number of increments before the final loading factor")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SolverStandard;
    use crate::base::{Config, DivergedReason, NonlinearStatus};
    use crate::fem::{FemState, SampleSystems};
    use russell_lab::approx_eq;

    #[test]
    fn new_captures_errors() {
        let mut config = Config::new();
        config.set_dt_min(-1.0);
        let mut system = SampleSystems::linear_springs_3dof();
        assert_eq!(
            SolverStandard::new(&config, &mut system).err(),
            Some("cannot allocate the solver because config.validate() failed")
        );
    }

    #[test]
    fn linear_springs_complete_with_growth() {
        let mut config = Config::new();
        config
            .set_t_fin(1.0)
            .set_dt_ini(0.1)
            .set_dt_min(0.01)
            .set_dt_max(0.3)
            .set_growth_steps(1)
            .set_verbose(false, false);
        let mut system = SampleSystems::linear_springs_3dof();
        let mut state = FemState::new(3).unwrap();
        let mut solver = SolverStandard::new(&config, &mut system).unwrap();
        solver.solve(&mut state).unwrap();
        assert_eq!(state.ell, 1.0); // exact landing on t_fin
        assert_eq!(state.u[0], 0.0); // prescribed
        approx_eq(state.u[1], 1.0, 1e-10);
        approx_eq(state.u[2], 1.0, 1e-10);
        assert!(solver.n_converged() >= 4);
        assert!(solver.status().converged());
    }

    #[test]
    fn run_increment_reports_progress() {
        let mut config = Config::new();
        config
            .set_t_fin(0.2)
            .set_dt_ini(0.1)
            .set_dt_min(0.01)
            .set_dt_max(0.1)
            .set_verbose(false, false);
        let mut system = SampleSystems::hardening_bar_1dof();
        let mut state = FemState::new(1).unwrap();
        let mut solver = SolverStandard::new(&config, &mut system).unwrap();
        let (converged, completed) = solver.run_increment(&mut state).unwrap();
        assert!(converged);
        assert!(!completed);
        let (converged, completed) = solver.run_increment(&mut state).unwrap();
        assert!(converged);
        assert!(completed);
        assert_eq!(solver.n_converged(), 2);
    }

    #[test]
    fn unreachable_load_aborts_after_max_attempts() {
        // the saturating bar cannot carry more than ℓ = 1.0
        let mut config = Config::new();
        config
            .set_t_fin(2.0)
            .set_dt_ini(0.2)
            .set_dt_min(0.01)
            .set_dt_max(0.25)
            .set_n_max_iterations(8)
            .set_verbose(false, false);
        let mut system = SampleSystems::saturating_bar_1dof();
        let mut state = FemState::new(1).unwrap();
        let mut solver = SolverStandard::new(&config, &mut system).unwrap();
        assert_eq!(solver.solve(&mut state).err(), Some("too many attempts to get converged"));
        assert!(state.ell < 1.0); // restored to the last converged factor
        assert_eq!(
            solver.status(),
            NonlinearStatus::Diverged(DivergedReason::MaxIterations)
        );
    }
}
