use loadstep::base::{Config, Method};
use loadstep::fem::{FemState, SampleSystems, SolverArcLength};
use loadstep::StrError;
use plotpy::{Curve, Plot};
use russell_lab::approx_eq;

// Arc-length control (ALC) for a snap-through truss
//
// TEST GOAL
//
// This test verifies the arc-length implementation on a path with two
// limit points. The standard load-controlled method cannot pass the first
// limit point; the arc-length driver must follow the descending branch
// (including negative load factors) and terminate on the rising far
// branch once the target factor is reached.
//
// MODEL
//
// DOF 0 is the apex displacement w of a shallow two-bar (von Mises)
// truss with internal force
//
//   F_int,0(w) = w³ - 3w² + 2w
//
// and limit points at w = 1 ± 1/√3 with extreme load factors
// ±2/(3√3) ≈ ±0.3849. DOF 1 is an independent unit spring. The reference
// load is (1.0, 0.5). The target factor 0.5 exceeds the first limit load,
// so it is only reachable on the far branch (w ≈ 2.2).
//
// REFERENCES
//
// * Crisfield MA (1981) A fast incremental/iterative solution procedure
//   that handles "snap-through", Computers & Structures, 13(1):55-62

const SAVE_FIGURE: bool = false;

#[test]
fn test_alc_snap_through_2dof() -> Result<(), StrError> {
    // configuration
    let mut config = Config::new();
    config
        .set_method(Method::ArcLengthCylinder)
        .set_t_fin(0.5)
        .set_dt_ini(0.02)
        .set_dt_min(0.0001)
        .set_dt_max(0.5)
        .set_growth_factor(1.5)
        .set_cutback_factor(0.5)
        .set_growth_steps(2)
        .set_n_target_iterations(5)
        .set_arc_len_max_factor(10.0)
        .set_tol_rr_abs(1e-9)
        .set_tol_rr_rel(1e-8)
        .set_tol_mdu_rel(1e-10)
        .set_n_max_iterations(15)
        .set_n_max_increments(2_000)
        .set_verbose(false, false);

    // system and state
    let mut system = SampleSystems::snap_through_2dof();
    let mut state = FemState::new(2)?;

    // solver
    let mut solver = SolverArcLength::new(&config, &mut system)?;
    solver.solve(&mut state)?;

    // the final factor reached (or slightly passed) the target
    assert!(state.ell > 0.49);

    // the final point is on the far branch, beyond both limit points
    assert!(state.u[0] > 2.0);

    // the final point satisfies equilibrium: F_int = ℓ F_ext
    let w = state.u[0];
    approx_eq(w * w * w - 3.0 * w * w + 2.0 * w, state.ell, 1e-6);
    approx_eq(state.u[1], 0.5 * state.ell, 1e-6);

    // the path descended through negative factors between the branches
    let (ell_min, i_min) = solver
        .arr_ell
        .iter()
        .enumerate()
        .fold((f64::INFINITY, 0), |(acc, i_acc), (i, &ell)| {
            if ell < acc {
                (ell, i)
            } else {
                (acc, i_acc)
            }
        });
    assert!(ell_min < -0.3);
    assert!(ell_min > -0.3849 - 1e-3);

    // before the descent, it rose towards the first limit point (ℓ ≈ 0.3849)
    let ell_max_rising = solver.arr_ell[..i_min]
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &ell| f64::max(acc, ell));
    assert!(ell_max_rising > 0.3);
    assert!(ell_max_rising < 0.3849 + 1e-3);

    // a healthy number of increments traced the path
    assert!(solver.n_converged() > 10);

    if SAVE_FIGURE {
        let n = solver.arr_ell.len();
        let ww: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut curve = Curve::new();
        curve
            .set_label("loadstep: arc-length path")
            .set_line_style("None")
            .set_marker_style("o")
            .set_marker_color("blue")
            .set_marker_line_color("blue");
        curve.draw(&ww, &solver.arr_ell);
        let mut plot = Plot::new();
        plot.add(&curve)
            .grid_labels_legend("increment", "load factor")
            .set_figure_size_points(600.0, 300.0)
            .save("/tmp/loadstep/test_alc_snap_through_2dof.svg")
            .unwrap();
    }
    Ok(())
}
