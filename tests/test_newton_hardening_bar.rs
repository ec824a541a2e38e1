use loadstep::base::Config;
use loadstep::fem::{FemState, SampleSystems, SolverStandard};
use loadstep::StrError;
use russell_lab::approx_eq;

// Standard (load-controlled) increments on a hardening bar
//
// TEST GOAL
//
// This test verifies the standard incremental driver end-to-end: growth of
// the increment after the convergence window, exact landing on the final
// loading factor, and the accuracy of the converged solution.
//
// MODEL
//
// One DOF with internal force F_int = u + u³ and reference load F_ext = 1.
// The tangent 1 + 3u² is positive everywhere, so every increment converges.
// At the final factor ℓ = 1 the solution satisfies u + u³ = 1, i.e.
// u = 0.6823278038280193.

#[test]
fn test_newton_hardening_bar() -> Result<(), StrError> {
    // configuration
    let mut config = Config::new();
    config
        .set_t_fin(1.0)
        .set_dt_ini(0.1)
        .set_dt_min(0.01)
        .set_dt_max(0.25)
        .set_growth_factor(1.5)
        .set_cutback_factor(0.5)
        .set_growth_steps(2)
        .set_tol_rr_abs(1e-11)
        .set_tol_rr_rel(1e-10)
        .set_tol_mdu_rel(1e-10)
        .set_n_max_iterations(20)
        .set_verbose(false, false);

    // system and state
    let mut system = SampleSystems::hardening_bar_1dof();
    let mut state = FemState::new(1)?;

    // solver
    let mut solver = SolverStandard::new(&config, &mut system)?;
    solver.solve(&mut state)?;

    // the analysis lands exactly on the final factor
    assert_eq!(state.ell, 1.0);

    // the converged solution solves u + u³ = 1
    approx_eq(state.u[0], 0.6823278038280193, 1e-8);

    // growth reduced the number of increments below the dt0-based count
    assert!(solver.n_converged() >= 5);
    assert!(solver.n_converged() < 10);
    assert!(solver.status().converged());
    Ok(())
}
