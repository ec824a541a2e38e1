use loadstep::base::{Config, DivergedReason, NonlinearStatus};
use loadstep::fem::{FemState, SampleSystems, SolverStandard};
use loadstep::StrError;
use russell_lab::approx_eq;

// Step cutback and the too-many-attempts fatal condition
//
// TEST GOAL
//
// This test verifies the failure-recovery policy of the standard driver:
// a diverged increment is retried with a cut-back increment (floored at
// dt_min), and after N_MAX_STEP_FAILURES consecutive failures the run is
// aborted as fatal while the state stays at the last converged solution.
//
// MODEL
//
// One DOF with the saturating internal force F_int = 1 - e^(-u) and
// reference load F_ext = 1. No equilibrium exists for ℓ ≥ 1, so a target
// factor of 2 is unreachable: the driver creeps towards ℓ = 1 with ever
// smaller increments and must eventually give up.

#[test]
fn test_reachable_target_converges() -> Result<(), StrError> {
    let mut config = Config::new();
    config
        .set_t_fin(0.9)
        .set_dt_ini(0.1)
        .set_dt_min(0.01)
        .set_dt_max(0.2)
        .set_tol_rr_abs(1e-11)
        .set_tol_rr_rel(1e-11)
        .set_tol_mdu_rel(1e-11)
        .set_n_max_iterations(20)
        .set_verbose(false, false);
    let mut system = SampleSystems::saturating_bar_1dof();
    let mut state = FemState::new(1)?;
    let mut solver = SolverStandard::new(&config, &mut system)?;
    solver.solve(&mut state)?;
    assert_eq!(state.ell, 0.9);
    // u = -ln(1 - 0.9) = ln(10)
    approx_eq(state.u[0], f64::ln(10.0), 1e-7);
    Ok(())
}

#[test]
fn test_unreachable_target_aborts() {
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

    // fatal after the consecutive-failure ceiling
    assert_eq!(solver.solve(&mut state).err(), Some("too many attempts to get converged"));

    // some increments converged before the wall at the capacity ℓ = 1
    assert!(solver.n_converged() > 3);
    assert!(state.ell > 0.5);
    assert!(state.ell < 1.0);

    // the state was restored to the last converged solution: equilibrium holds
    let residual = (1.0 - f64::exp(-state.u[0])) - state.ell;
    approx_eq(residual, 0.0, 1e-6);

    // the last attempt ran out of iterations (slow creep, not a blow-up)
    assert_eq!(solver.status(), NonlinearStatus::Diverged(DivergedReason::MaxIterations));
}
