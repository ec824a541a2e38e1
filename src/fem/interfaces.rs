use super::{ConvergenceControl, FemState, SolverData};
use crate::base::NonlinearStatus;
use crate::StrError;
use russell_lab::Vector;
use russell_sparse::CooMatrix;

/// Defines the callback contract to the element/material/BC collaborator
///
/// The increment drivers never assemble anything themselves; they borrow an
/// implementation of this trait for their whole lifetime and call it once
/// per residual/tangent evaluation. The loading factor is applied by the
/// drivers (`R = F_int - ℓ F_ext`), so `calc_f_ext` must return the
/// reference (unit-factor) external load.
pub trait ElementSystem {
    /// Returns the total number of equations (DOFs)
    fn neq(&self) -> usize;

    /// Returns the supremum of the number of nonzero values in the tangent matrix
    ///
    /// The count must not include the diagonal entries put on prescribed equations.
    fn nnz(&self) -> usize;

    /// Returns the array of Dirichlet (prescribed) flags, one per equation
    fn prescribed(&self) -> &[bool];

    /// Calculates the internal forces vector F_int at the given state
    fn calc_f_int(&mut self, ff_int: &mut Vector, state: &FemState) -> Result<(), StrError>;

    /// Calculates the reference external forces vector F_ext
    fn calc_f_ext(&mut self, ff_ext: &mut Vector) -> Result<(), StrError>;

    /// Calculates the tangent stiffness matrix at the given state
    ///
    /// The matrix arrives reset (all values cleared); the prescribed
    /// rows/columns are handled by the caller afterwards.
    fn calc_kk(&mut self, kk: &mut CooMatrix, state: &FemState) -> Result<(), StrError>;

    /// Writes the initial guess for a new increment into the state
    ///
    /// `ddf` is the proposed load-factor increment; implementations with
    /// non-zero prescribed values scale their prescribed increments by it.
    fn initial_guess(&self, _state: &mut FemState, _ddf: f64) -> Result<(), StrError> {
        Ok(())
    }
}

/// Defines the interface of the generic nonlinear solver driving one increment
///
/// The standard increment loop treats the nonlinear solver as an opaque
/// collaborator: it hands over the state, the assembly/linear-system bundle,
/// and the convergence control, and reads back a terminal status. The crate
/// ships [crate::fem::SolverNewton]; a globalized implementation (line
/// search, trust region) may be boxed in instead.
pub trait NonlinSolTrait {
    /// Drives one increment to convergence or divergence
    ///
    /// The candidate loading factor is `state.ell`; `state.ddu` arrives
    /// zeroed (apart from the initial guess). Numerical failures are
    /// reported through the status, never through `Err`.
    fn solve_increment(
        &mut self,
        state: &mut FemState,
        data: &mut SolverData,
        control: &mut ConvergenceControl,
    ) -> Result<NonlinearStatus, StrError>;
}
