use super::{ConvergenceControl, ElementSystem, FemState, LoadControl, SolverData};
use crate::base::{Config, DivergedReason, NonlinearStatus};
use crate::StrError;
use russell_lab::{vec_add, vec_copy, vec_copy_scaled, vec_inner, vec_norm, Norm, Vector};
use russell_sparse::LinSolTrait;

/// Implements the cylindrical arc-length (path-following) solver
///
/// The arc-length method traces the equilibrium path of nonlinear
/// structures through limit points (snap-through, softening) where the
/// load-controlled Newton method cannot converge because the tangent
/// stiffness loses positive-definiteness.
///
/// # Algorithm
///
/// Each increment constrains the norm of the incremental displacement to
/// the arc-length radius Δs. With `i = Δu` (running increment), `t` the
/// solution of `K t = F_ext`, and `r` the solution of `K r = -R`:
///
/// * iteration 0 (predictor): `δℓ = ±Δs/‖t‖`, the sign following the dot
///   product of `t` with the last converged increment direction;
/// * iteration k > 0 (corrector): `δℓ` is a root of
///
/// ```text
/// a δℓ² + b δℓ + c = 0
/// a = t·t
/// b = 2 (i·t + r·t)
/// c = i·i + 2 i·r + r·r - Δs²
/// ```
///
///   so that the updated increment `i + r + δℓ t` has norm Δs. With two
///   real roots, the one maximizing `i·i + i·r + δℓ (i·t)` is taken (the
///   root closer to the previous path direction). No real root means the
///   radius is incompatible with the current tangent direction and the
///   increment is abandoned (and retried with a smaller radius).
///
/// The radius of the very first increment is seeded from the trial
/// loading factor `dt_ini`; afterwards the radius is adapted by
/// [LoadControl::update_arc_length] using the iteration count of the
/// converged increment.
pub struct SolverArcLength<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Holds data to assemble and solve the global linear system
    pub data: SolverData<'a>,

    /// Holds the convergence control
    control: ConvergenceControl<'a>,

    /// Holds the load-factor and arc-length-radius control
    load_control: LoadControl<'a>,

    /// Solution of the tangent system against the external load (t)
    u_tan: Vector,

    /// Solution of the tangent system against the negated residual (r)
    u_res: Vector,

    /// Negated residual vector -R (right-hand side of the second solve)
    rr_neg: Vector,

    /// Last converged increment direction (for the predictor sign)
    ddu_conv: Vector,

    /// Backup of the primary unknowns (restored on a failed attempt)
    u_backup: Vector,

    /// Total load-factor increment Δℓ of the running increment
    ddl: f64,

    /// Predictor sign of the running increment (±1, fixed at iteration 0)
    sign: f64,

    /// Iteration count of the last increment attempt
    n_iterations: usize,

    /// Indicates that no increment has converged yet
    first_increment: bool,

    /// Status of the last increment attempt
    last_status: NonlinearStatus,

    /// Number of the current increment (converged increments so far)
    increment: usize,

    /// Loading factors of all converged increments
    pub arr_ell: Vec<f64>,
}

impl<'a> SolverArcLength<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config, system: &'a mut dyn ElementSystem) -> Result<Self, StrError> {
        let data = SolverData::new(config, system)?;
        let neq_total = data.ls.neq_total;
        Ok(SolverArcLength {
            config,
            data,
            control: ConvergenceControl::new(config),
            load_control: LoadControl::new(config)?,
            u_tan: Vector::new(neq_total),
            u_res: Vector::new(neq_total),
            rr_neg: Vector::new(neq_total),
            ddu_conv: Vector::new(neq_total),
            u_backup: Vector::new(neq_total),
            ddl: 0.0,
            sign: 1.0,
            n_iterations: 0,
            first_increment: true,
            last_status: NonlinearStatus::Iterating,
            increment: 0,
            arr_ell: Vec::with_capacity(50),
        })
    }

    /// Returns the status of the last increment attempt
    pub fn status(&self) -> NonlinearStatus {
        self.last_status
    }

    /// Returns the total number of converged increments
    pub fn n_converged(&self) -> usize {
        self.control.n_converged_total()
    }

    /// Solves one increment with the arc-length predictor/corrector
    ///
    /// `state.ddu` must arrive zeroed; on return it holds the accumulated
    /// incremental solution and `self.ddl` the achieved Δℓ.
    fn solve_increment(&mut self, state: &mut FemState) -> Result<NonlinearStatus, StrError> {
        let verbose = self.config.lin_sol_params.verbose;
        for iteration in 0..self.config.n_max_iterations {
            self.n_iterations = iteration;

            // residual R = F_int - ℓ F_ext (with Dirichlet rows zeroed)
            self.data.assemble_ff_int_and_ff_ext(state)?;
            self.data.calculate_residuals_vector(state.ell);
            let norm_rr = vec_norm(&self.data.ls.rr, Norm::Euc);

            // check convergence on the residual (the iteration-0 residual
            // belongs to the converged previous increment and is skipped)
            if iteration > 0 {
                let status = self.control.analyze_rr(iteration, norm_rr);
                self.control.print_iteration();
                if status.converged() || status.diverged() {
                    return Ok(status);
                }
            } else if !norm_rr.is_finite() {
                return Ok(NonlinearStatus::Diverged(DivergedReason::NanResidual));
            }

            // tangent matrix with Dirichlet pivots
            self.data.assemble_kk(state)?;
            if self.data.factorize().is_err() {
                return Ok(NonlinearStatus::Diverged(DivergedReason::LinearSolve));
            }

            // solve the tangent system against the external load: K t = F_ext
            let solved = self
                .data
                .ls
                .solver
                .actual
                .solve(&mut self.u_tan, &self.data.ls.kk, &self.data.ls.ff_ext, verbose);
            if solved.is_err() {
                return Ok(NonlinearStatus::Diverged(DivergedReason::LinearSolve));
            }

            // solve the tangent system against the negated residual: K r = -R
            vec_copy_scaled(&mut self.rr_neg, -1.0, &self.data.ls.rr).unwrap();
            let solved = self
                .data
                .ls
                .solver
                .actual
                .solve(&mut self.u_res, &self.data.ls.kk, &self.rr_neg, verbose);
            if solved.is_err() {
                return Ok(NonlinearStatus::Diverged(DivergedReason::LinearSolve));
            }

            // iterative increment in the loading factor
            let dl = if iteration == 0 {
                let norm_tan = vec_norm(&self.u_tan, Norm::Euc);
                if norm_tan < f64::EPSILON {
                    return Ok(NonlinearStatus::Diverged(DivergedReason::InnerSolve));
                }
                if self.first_increment {
                    // trial loading factor seeds the arc-length radius
                    self.sign = 1.0;
                    self.load_control.set_initial_arc(self.config.dt_ini * norm_tan);
                    self.config.dt_ini
                } else {
                    // predictor with the sign of the previous path direction
                    let direction = vec_inner(&self.ddu_conv, &self.u_tan);
                    self.sign = if direction < 0.0 { -1.0 } else { 1.0 };
                    self.sign * self.load_control.arc_length() / norm_tan
                }
            } else {
                // corrector: the quadratic arc-length constraint
                let dds = self.load_control.arc_length();
                let i_i = vec_inner(&state.ddu, &state.ddu);
                let i_t = vec_inner(&state.ddu, &self.u_tan);
                let i_r = vec_inner(&state.ddu, &self.u_res);
                let r_t = vec_inner(&self.u_res, &self.u_tan);
                let r_r = vec_inner(&self.u_res, &self.u_res);
                let t_t = vec_inner(&self.u_tan, &self.u_tan);
                let aa = t_t;
                let bb = 2.0 * (i_t + r_t);
                let cc = i_i + 2.0 * i_r + r_r - dds * dds;
                match constraint_root(aa, bb, cc, i_i, i_r, i_t) {
                    Some(root) => root,
                    None => return Ok(NonlinearStatus::Diverged(DivergedReason::InnerSolve)),
                }
            };

            // corrective displacement: mdu = -(r + δℓ t)
            vec_add(&mut self.data.ls.mdu, -1.0, &self.u_res, -dl, &self.u_tan).unwrap();

            // check convergence on the corrective displacement
            let norm_mdu = vec_norm(&self.data.ls.mdu, Norm::Euc);
            let status = self.control.analyze_mdu(iteration, norm_mdu);
            self.control.print_iteration();
            if status.converged() || status.diverged() {
                return Ok(status);
            }

            // update ΔU, U, Δℓ, and ℓ
            self.data.update_primary_variables(state)?;
            state.ell += dl;
            self.ddl += dl;
        }
        Ok(NonlinearStatus::Diverged(DivergedReason::MaxIterations))
    }

    /// Runs one increment attempt
    ///
    /// Returns `(converged, completed)`: whether this attempt converged and
    /// whether the final loading factor has been reached. A failed attempt
    /// leaves the state at the last converged solution with a cut-back
    /// arc-length radius already proposed.
    pub fn run_increment(&mut self, state: &mut FemState) -> Result<(bool, bool), StrError> {
        // prepare the attempt
        vec_copy(&mut self.u_backup, &state.u).unwrap();
        let ell_backup = state.ell;
        state.ddu.fill(0.0);
        self.ddl = 0.0;
        self.control.reset();
        self.control
            .print_increment(self.increment, state.ell, self.load_control.arc_length());

        // run the predictor/corrector
        let status = self.solve_increment(state)?;
        self.last_status = status;
        self.control.print_increment_end(&status, state.ell);

        if status.converged() {
            self.control.add_converged();
            self.control.reset_failures();
            self.increment += 1;
            vec_copy(&mut self.ddu_conv, &state.ddu).unwrap();
            self.first_increment = false;
            self.arr_ell.push(state.ell);
            let completed = self.load_control.update_arc_length(true, self.ddl, self.n_iterations);
            Ok((true, completed))
        } else {
            // restore the last converged solution
            vec_copy(&mut state.u, &self.u_backup).unwrap();
            state.ddu.fill(0.0);
            state.ell = ell_backup;
            self.control.add_failed();
            if self.control.too_many_failures() {
                return Err("too many attempts to get converged");
            }
            self.load_control.update_arc_length(false, 0.0, self.n_iterations);
            Ok((false, false))
        }
    }

    /// Runs the whole path-following analysis
    pub fn solve(&mut self, state: &mut FemState) -> Result<(), StrError> {
        if state.u.dim() != self.data.ls.neq_total {
            return Err("the dimension of the state vectors does not match the system");
        }
        self.control.print_header();
        self.arr_ell.push(state.ell);
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

/// Selects the root of the arc-length constraint `a δℓ² + b δℓ + c = 0`
///
/// With two real roots, returns the one maximizing `i·i + i·r + δℓ (i·t)`,
/// i.e. the root keeping the updated increment closest to the previous
/// path direction; ties resolve to the `+√` root so equal inputs always
/// select the same root. Returns `None` when no real root exists (the
/// radius is incompatible with the current tangent direction) or when the
/// quadratic degenerates (`a = 0`).
fn constraint_root(aa: f64, bb: f64, cc: f64, i_i: f64, i_r: f64, i_t: f64) -> Option<f64> {
    if aa < f64::EPSILON {
        return None;
    }
    let delta = bb * bb - 4.0 * aa * cc;
    if delta < 0.0 {
        return None;
    }
    let sq = f64::sqrt(delta);
    let root1 = (-bb + sq) / (2.0 * aa);
    let root2 = (-bb - sq) / (2.0 * aa);
    let path1 = i_i + i_r + root1 * i_t;
    let path2 = i_i + i_r + root2 * i_t;
    if path1 >= path2 {
        Some(root1)
    } else {
        Some(root2)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{constraint_root, SolverArcLength};
    use crate::base::{Config, Method};
    use crate::fem::{FemState, SampleSystems};
    use russell_lab::approx_eq;

    #[test]
    fn constraint_root_selects_by_path_continuity() {
        // i = (1,0), r = (-2,0), t = (2,0), Δs = 2 gives
        // a = 4, b = -4, c = -3 with roots { 1.5, -0.5 }
        let (i_i, i_r, i_t) = (1.0, -2.0, 2.0);
        let (r_r, r_t, t_t) = (4.0, -4.0, 4.0);
        let dds = 2.0;
        let aa = t_t;
        let bb = 2.0 * (i_t + r_t);
        let cc = i_i + 2.0 * i_r + r_r - dds * dds;
        assert_eq!(aa, 4.0);
        assert_eq!(bb, -4.0);
        assert_eq!(cc, -3.0);
        let root = constraint_root(aa, bb, cc, i_i, i_r, i_t).unwrap();
        assert_eq!(root, 1.5);

        // the selected root restores the arc length: ‖i + r + δℓ t‖ = Δs
        let updated = ((1.0 - 2.0 + root * 2.0) as f64).abs();
        approx_eq(updated, dds, 1e-15);

        // determinism: the same inputs always select the same root
        for _ in 0..10 {
            assert_eq!(constraint_root(aa, bb, cc, i_i, i_r, i_t), Some(1.5));
        }

        // reversing the previous direction flips the selection
        let root = constraint_root(aa, bb, cc, i_i, i_r, -i_t).unwrap();
        assert_eq!(root, -0.5);
    }

    #[test]
    fn constraint_root_handles_degenerate_cases() {
        // no real root: δℓ² + 1 = 0
        assert_eq!(constraint_root(1.0, 0.0, 1.0, 0.0, 0.0, 0.0), None);
        // degenerate quadratic (t = 0)
        assert_eq!(constraint_root(0.0, 1.0, 1.0, 0.0, 0.0, 0.0), None);
        // double root: (δℓ - 1)² = 0
        assert_eq!(constraint_root(1.0, -2.0, 1.0, 1.0, 0.0, 1.0), Some(1.0));
    }

    #[test]
    fn hardening_bar_completes() {
        // no limit point here; the arc-length driver must simply walk to t_fin
        let mut config = Config::new();
        config
            .set_method(Method::ArcLengthCylinder)
            .set_t_fin(1.0)
            .set_dt_ini(0.1)
            .set_dt_min(0.001)
            .set_dt_max(0.2)
            .set_n_max_iterations(15)
            .set_verbose(false, false);
        let mut system = SampleSystems::hardening_bar_1dof();
        let mut state = FemState::new(1).unwrap();
        let mut solver = SolverArcLength::new(&config, &mut system).unwrap();
        solver.solve(&mut state).unwrap();
        assert!(state.ell > 0.99);
        assert!(solver.n_converged() > 2);
        // the final point lies on the equilibrium path: u + u³ = ℓ
        let u = state.u[0];
        approx_eq(u + u * u * u, state.ell, 1e-6);
    }
}
