use super::{ConvergenceControl, FemState, NonlinSolTrait, SolverData};
use crate::base::{Config, DivergedReason, NonlinearStatus};
use crate::StrError;
use russell_lab::{vec_norm, Norm};
use russell_sparse::LinSolTrait;

/// Implements the full Newton-Raphson solver for one increment
///
/// This is the bundled implementation of [NonlinSolTrait]. The candidate
/// loading factor is read from `state.ell`; the iterations stop at the
/// first terminal status of the convergence control, at a linear-solver
/// failure, or when the maximum number of iterations is reached.
pub struct SolverNewton<'a> {
    /// Holds the configuration
    config: &'a Config,
}

impl<'a> SolverNewton<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config) -> Self {
        SolverNewton { config }
    }
}

impl<'a> NonlinSolTrait for SolverNewton<'a> {
    /// Drives one increment to convergence or divergence
    fn solve_increment(
        &mut self,
        state: &mut FemState,
        data: &mut SolverData,
        control: &mut ConvergenceControl,
    ) -> Result<NonlinearStatus, StrError> {
        control.reset();
        let verbose = self.config.lin_sol_params.verbose;
        for iteration in 0..self.config.n_max_iterations {
            // residual R = F_int - ℓ F_ext (with Dirichlet rows zeroed)
            data.assemble_ff_int_and_ff_ext(state)?;
            data.calculate_residuals_vector(state.ell);

            // check convergence on the residual
            let norm_rr = vec_norm(&data.ls.rr, Norm::Euc);
            let status = control.analyze_rr(iteration, norm_rr);
            if status.converged() || status.diverged() {
                control.print_iteration();
                return Ok(status);
            }

            // tangent matrix with Dirichlet pivots
            data.assemble_kk(state)?;
            if data.factorize().is_err() {
                return Ok(NonlinearStatus::Diverged(DivergedReason::LinearSolve));
            }

            // solve the linear system K mdu = R
            let solved = data
                .ls
                .solver
                .actual
                .solve(&mut data.ls.mdu, &data.ls.kk, &data.ls.rr, verbose);
            if solved.is_err() {
                return Ok(NonlinearStatus::Diverged(DivergedReason::LinearSolve));
            }

            // check convergence on the corrective displacement
            let norm_mdu = vec_norm(&data.ls.mdu, Norm::Euc);
            let status = control.analyze_mdu(iteration, norm_mdu);
            control.print_iteration();
            if status.converged() || status.diverged() {
                return Ok(status);
            }

            // update U and ΔU
            data.update_primary_variables(state)?;
        }
        Ok(NonlinearStatus::Diverged(DivergedReason::MaxIterations))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
