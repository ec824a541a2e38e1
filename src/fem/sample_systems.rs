use super::{ElementSystem, FemState};
use crate::StrError;
use russell_lab::Vector;
use russell_sparse::CooMatrix;

/// Holds sample systems for testing the increment drivers
///
/// All systems are small analytic problems with closed-form internal
/// forces and tangents, so the drivers can be exercised without a mesh or
/// an element library.
pub struct SampleSystems {}

/// Implements a set of uncoupled linear springs (one prescribed DOF)
///
/// ```text
/// F_int,i = k_i u_i      (k = 1, 2, 4)
/// F_ext,i = f_i          (f = 1, 2, 4)
/// ```
///
/// DOF 0 is prescribed (fixed); the solution of the free DOFs is
/// `u_i = ℓ f_i / k_i = ℓ`.
pub struct LinearSprings {
    stiffness: Vec<f64>,
    load: Vec<f64>,
    prescribed: Vec<bool>,
}

/// Implements a one-DOF hardening bar
///
/// ```text
/// F_int = k u + h u³
/// F_ext = 1
/// ```
///
/// The tangent `k + 3 h u²` is positive everywhere; the standard driver
/// must converge for any target factor.
pub struct HardeningBar {
    stiffness: f64,
    hardening: f64,
}

/// Implements a one-DOF saturating (softening) bar
///
/// ```text
/// F_int = c (1 - e^(-u/u_ref))
/// F_ext = 1
/// ```
///
/// The internal force saturates at `c`: no equilibrium exists for
/// `ℓ ≥ c`, so driving the load beyond the capacity must end in the
/// too-many-attempts fatal condition.
pub struct SaturatingBar {
    capacity: f64,
    u_ref: f64,
}

/// Implements a two-DOF system with a snap-through path
///
/// DOF 0 is the vertical displacement `w` of the apex of a shallow
/// two-bar (von Mises) truss and DOF 1 an independent linear spring:
///
/// ```text
/// F_int,0 = c (w³ - 3 h w² + 2 h² w)
/// F_int,1 = k₂ u₁
/// ```
///
/// The truss force has limit points at `w = h (1 ± 1/√3)` with extreme
/// load factors `±(2 c h³)/(3 √3 f₀)`; between them the equilibrium path
/// descends (snap-through) and only the arc-length driver can follow it.
pub struct SnapThroughTruss {
    stiffness: f64,
    height: f64,
    spring: f64,
    load: [f64; 2],
}

impl SampleSystems {
    /// Returns the three-spring system with DOF 0 prescribed
    pub fn linear_springs_3dof() -> LinearSprings {
        LinearSprings {
            stiffness: vec![1.0, 2.0, 4.0],
            load: vec![1.0, 2.0, 4.0],
            prescribed: vec![true, false, false],
        }
    }

    /// Returns the hardening bar with `F_int = u + u³`
    pub fn hardening_bar_1dof() -> HardeningBar {
        HardeningBar {
            stiffness: 1.0,
            hardening: 1.0,
        }
    }

    /// Returns the saturating bar with capacity 1
    pub fn saturating_bar_1dof() -> SaturatingBar {
        SaturatingBar {
            capacity: 1.0,
            u_ref: 1.0,
        }
    }

    /// Returns the snap-through truss (+ spring) with unit parameters
    ///
    /// The limit load factors are `±2/(3√3) ≈ ±0.3849`.
    pub fn snap_through_2dof() -> SnapThroughTruss {
        SnapThroughTruss {
            stiffness: 1.0,
            height: 1.0,
            spring: 1.0,
            load: [1.0, 0.5],
        }
    }
}

impl ElementSystem for LinearSprings {
    fn neq(&self) -> usize {
        self.stiffness.len()
    }

    fn nnz(&self) -> usize {
        self.stiffness.len()
    }

    fn prescribed(&self) -> &[bool] {
        &self.prescribed
    }

    fn calc_f_int(&mut self, ff_int: &mut Vector, state: &FemState) -> Result<(), StrError> {
        for i in 0..self.stiffness.len() {
            ff_int[i] = self.stiffness[i] * state.u[i];
        }
        Ok(())
    }

    fn calc_f_ext(&mut self, ff_ext: &mut Vector) -> Result<(), StrError> {
        for i in 0..self.load.len() {
            ff_ext[i] = self.load[i];
        }
        Ok(())
    }

    fn calc_kk(&mut self, kk: &mut CooMatrix, _state: &FemState) -> Result<(), StrError> {
        for i in 0..self.stiffness.len() {
            kk.put(i, i, self.stiffness[i])?;
        }
        Ok(())
    }
}

impl ElementSystem for HardeningBar {
    fn neq(&self) -> usize {
        1
    }

    fn nnz(&self) -> usize {
        1
    }

    fn prescribed(&self) -> &[bool] {
        &[false]
    }

    fn calc_f_int(&mut self, ff_int: &mut Vector, state: &FemState) -> Result<(), StrError> {
        let u = state.u[0];
        ff_int[0] = self.stiffness * u + self.hardening * u * u * u;
        Ok(())
    }

    fn calc_f_ext(&mut self, ff_ext: &mut Vector) -> Result<(), StrError> {
        ff_ext[0] = 1.0;
        Ok(())
    }

    fn calc_kk(&mut self, kk: &mut CooMatrix, state: &FemState) -> Result<(), StrError> {
        let u = state.u[0];
        kk.put(0, 0, self.stiffness + 3.0 * self.hardening * u * u)?;
        Ok(())
    }
}

impl ElementSystem for SaturatingBar {
    fn neq(&self) -> usize {
        1
    }

    fn nnz(&self) -> usize {
        1
    }

    fn prescribed(&self) -> &[bool] {
        &[false]
    }

    fn calc_f_int(&mut self, ff_int: &mut Vector, state: &FemState) -> Result<(), StrError> {
        ff_int[0] = self.capacity * (1.0 - f64::exp(-state.u[0] / self.u_ref));
        Ok(())
    }

    fn calc_f_ext(&mut self, ff_ext: &mut Vector) -> Result<(), StrError> {
        ff_ext[0] = 1.0;
        Ok(())
    }

    fn calc_kk(&mut self, kk: &mut CooMatrix, state: &FemState) -> Result<(), StrError> {
        let value = self.capacity / self.u_ref * f64::exp(-state.u[0] / self.u_ref);
        kk.put(0, 0, value)?;
        Ok(())
    }
}

impl ElementSystem for SnapThroughTruss {
    fn neq(&self) -> usize {
        2
    }

    fn nnz(&self) -> usize {
        2
    }

    fn prescribed(&self) -> &[bool] {
        &[false, false]
    }

    fn calc_f_int(&mut self, ff_int: &mut Vector, state: &FemState) -> Result<(), StrError> {
        let (c, h) = (self.stiffness, self.height);
        let w = state.u[0];
        ff_int[0] = c * (w * w * w - 3.0 * h * w * w + 2.0 * h * h * w);
        ff_int[1] = self.spring * state.u[1];
        Ok(())
    }

    fn calc_f_ext(&mut self, ff_ext: &mut Vector) -> Result<(), StrError> {
        ff_ext[0] = self.load[0];
        ff_ext[1] = self.load[1];
        Ok(())
    }

    fn calc_kk(&mut self, kk: &mut CooMatrix, state: &FemState) -> Result<(), StrError> {
        let (c, h) = (self.stiffness, self.height);
        let w = state.u[0];
        kk.put(0, 0, c * (3.0 * w * w - 6.0 * h * w + 2.0 * h * h))?;
        kk.put(1, 1, self.spring)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
