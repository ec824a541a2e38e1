use super::{ElementSystem, FemState, LinearSystem};
use crate::base::Config;
use crate::StrError;
use russell_lab::vec_add;
use russell_sparse::LinSolTrait;

/// Holds data shared by the increment drivers
///
/// Bundles the borrowed element/BC collaborator with the owned linear-system
/// scratch. The global vectors and matrices live here; the collaborator is
/// only borrowed for the duration of one assembly call.
pub struct SolverData<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Holds the element/material/BC collaborator
    pub system: &'a mut dyn ElementSystem,

    /// Holds variables to solve the global linear system
    pub ls: LinearSystem<'a>,
}

impl<'a> SolverData<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config, system: &'a mut dyn ElementSystem) -> Result<Self, StrError> {
        if let Some(msg) = config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate the solver because config.validate() failed");
        }
        let ls = LinearSystem::new(config, system)?;
        Ok(SolverData { config, system, ls })
    }

    /// Assembles the internal and external forces vectors (F_int and F_ext)
    ///
    /// The prescribed rows of F_ext are zeroed so the vector can be used
    /// directly as a right-hand side of the tangent system.
    pub fn assemble_ff_int_and_ff_ext(&mut self, state: &FemState) -> Result<(), StrError> {
        self.ls.ff_int.fill(0.0);
        self.ls.ff_ext.fill(0.0);
        self.system.calc_f_int(&mut self.ls.ff_int, state)?;
        self.system.calc_f_ext(&mut self.ls.ff_ext)?;
        for eq in &self.ls.p_equations {
            self.ls.ff_ext[*eq] = 0.0;
        }
        Ok(())
    }

    /// Calculates the residual vector R
    ///
    /// ```text
    /// R = F_int - lf * F_ext
    /// ```
    ///
    /// where `lf` is the loading factor. The prescribed rows are zeroed
    /// afterwards (Dirichlet row elimination).
    pub fn calculate_residuals_vector(&mut self, loading_factor: f64) {
        vec_add(&mut self.ls.rr, 1.0, &self.ls.ff_int, -loading_factor, &self.ls.ff_ext).unwrap();
        for eq in &self.ls.p_equations {
            self.ls.rr[*eq] = 0.0;
        }
    }

    /// Assembles the (augmented) global tangent matrix K
    ///
    /// Puts either unit pivots or the configured large-penalty pivots on
    /// the prescribed equations after the element assembly.
    pub fn assemble_kk(&mut self, state: &FemState) -> Result<(), StrError> {
        self.ls.kk.reset()?;
        self.system.calc_kk(self.ls.kk.get_coo_mut()?, state)?;
        let pivot = match self.config.dirichlet_penalty {
            Some(value) => value,
            None => 1.0,
        };
        for eq in &self.ls.p_equations {
            self.ls.kk.put(*eq, *eq, pivot)?;
        }
        Ok(())
    }

    /// Factorizes the global tangent matrix
    pub fn factorize(&mut self) -> Result<(), StrError> {
        self.ls
            .solver
            .actual
            .factorize(&mut self.ls.kk, Some(self.config.lin_sol_params))
    }

    /// Updates the vectors of primary variables U and ΔU
    ///
    /// Only the unknown (non-prescribed) equations are updated.
    pub fn update_primary_variables(&mut self, state: &mut FemState) -> Result<(), StrError> {
        let mdu = &self.ls.mdu;
        for i in &self.ls.unknown_equations {
            state.u[*i] -= mdu[*i];
            state.ddu[*i] -= mdu[*i];
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SolverData;
    use crate::base::Config;
    use crate::fem::{FemState, SampleSystems};
    use russell_lab::approx_eq;

    #[test]
    fn new_captures_errors() {
        let mut config = Config::new();
        config.set_dt_min(-1.0);
        let mut system = SampleSystems::linear_springs_3dof();
        assert_eq!(
            SolverData::new(&config, &mut system).err(),
            Some("cannot allocate the solver because config.validate() failed")
        );
    }

    #[test]
    fn residual_assembly_works() {
        // springs: k = (1, 2, 4), f_ext = (1, 2, 4); DOF 0 prescribed
        let config = Config::new();
        let mut system = SampleSystems::linear_springs_3dof();
        let mut data = SolverData::new(&config, &mut system).unwrap();
        let mut state = FemState::new(3).unwrap();
        state.u[1] = 0.5;
        state.u[2] = 0.25;

        data.assemble_ff_int_and_ff_ext(&state).unwrap();
        assert_eq!(data.ls.ff_ext[0], 0.0); // prescribed row zeroed
        assert_eq!(data.ls.ff_ext[1], 2.0);
        assert_eq!(data.ls.ff_ext[2], 4.0);

        data.calculate_residuals_vector(0.5);
        assert_eq!(data.ls.rr[0], 0.0); // prescribed row zeroed
        approx_eq(data.ls.rr[1], 2.0 * 0.5 - 0.5 * 2.0, 1e-15);
        approx_eq(data.ls.rr[2], 4.0 * 0.25 - 0.5 * 4.0, 1e-15);
    }

    #[test]
    fn update_primary_variables_works() {
        let config = Config::new();
        let mut system = SampleSystems::linear_springs_3dof();
        let mut data = SolverData::new(&config, &mut system).unwrap();
        let mut state = FemState::new(3).unwrap();
        data.ls.mdu[0] = -1.0;
        data.ls.mdu[1] = -2.0;
        data.ls.mdu[2] = -3.0;
        data.update_primary_variables(&mut state).unwrap();
        assert_eq!(state.u[0], 0.0); // prescribed: untouched
        assert_eq!(state.u[1], 2.0);
        assert_eq!(state.u[2], 3.0);
        assert_eq!(state.ddu[1], 2.0);
    }
}
