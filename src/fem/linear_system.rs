use super::ElementSystem;
use crate::base::Config;
use crate::StrError;
use russell_lab::Vector;
use russell_sparse::{LinSolver, SparseMatrix, Sym};

/// Holds variables to solve the global linear system
///
/// This bundle is the crate's only per-driver scratch memory: it is
/// allocated once at driver construction and reused (zeroed) at the start
/// of every increment, so there is no allocation churn inside the loops.
pub struct LinearSystem<'a> {
    /// Total number of global equations (total number of DOFs)
    pub neq_total: usize,

    /// Holds the supremum of the number of nonzero values (nnz) in the global matrix
    ///
    /// Equals the count reported by the element collaborator plus the number
    /// of prescribed equations (one pivot entry each).
    pub nnz_sup: usize,

    /// Is an array indicating which DOFs (equations) are prescribed
    ///
    /// (neq_total)
    pub prescribed: Vec<bool>,

    /// Is an array with only the DOF numbers of the prescribed equations
    pub p_equations: Vec<usize>,

    /// Is an array with only the DOF numbers of the unknown equations
    pub unknown_equations: Vec<usize>,

    /// Internal forces vector F_int
    pub ff_int: Vector,

    /// External forces vector F_ext (reference load; prescribed rows zeroed)
    pub ff_ext: Vector,

    /// Residual vector R = F_int - ℓ F_ext (prescribed rows zeroed)
    pub rr: Vector,

    /// Global tangent (Jacobian) matrix K
    pub kk: SparseMatrix,

    /// Linear solver
    pub solver: LinSolver<'a>,

    /// The "minus-delta-U" vector (the solution of the linear system)
    pub mdu: Vector,
}

impl<'a> LinearSystem<'a> {
    /// Allocates a new instance
    pub fn new(config: &Config, system: &dyn ElementSystem) -> Result<Self, StrError> {
        let neq_total = system.neq();
        if neq_total < 1 {
            return Err("the number of equations reported by the system must be ≥ 1");
        }
        let prescribed = system.prescribed().to_vec();
        if prescribed.len() != neq_total {
            return Err("the length of the prescribed flags array must equal the number of equations");
        }
        let p_equations: Vec<_> = (0..neq_total).filter(|&eq| prescribed[eq]).collect();
        let unknown_equations: Vec<_> = (0..neq_total).filter(|&eq| !prescribed[eq]).collect();
        let nnz_sup = system.nnz() + p_equations.len();
        Ok(LinearSystem {
            neq_total,
            nnz_sup,
            prescribed,
            p_equations,
            unknown_equations,
            ff_int: Vector::new(neq_total),
            ff_ext: Vector::new(neq_total),
            rr: Vector::new(neq_total),
            kk: SparseMatrix::new_coo(neq_total, neq_total, nnz_sup, Sym::No)?,
            solver: LinSolver::new(config.lin_sol_genie)?,
            mdu: Vector::new(neq_total),
        })
    }

    /// Zeroes the prescribed (Dirichlet) rows of a global vector
    pub fn zero_prescribed(&self, v: &mut Vector) {
        for eq in &self.p_equations {
            v[*eq] = 0.0;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::LinearSystem;
    use crate::base::Config;
    use crate::fem::SampleSystems;

    #[test]
    fn new_works() {
        let config = Config::new();
        let system = SampleSystems::linear_springs_3dof();
        let ls = LinearSystem::new(&config, &system).unwrap();
        assert_eq!(ls.neq_total, 3);
        assert_eq!(ls.nnz_sup, 3 + 1); // 3 diagonal springs + 1 prescribed pivot
        assert_eq!(ls.prescribed, &[true, false, false]);
        assert_eq!(ls.p_equations, &[0]);
        assert_eq!(ls.unknown_equations, &[1, 2]);
        assert_eq!(ls.rr.dim(), 3);
        assert_eq!(ls.mdu.dim(), 3);
    }

    #[test]
    fn zero_prescribed_works() {
        let config = Config::new();
        let system = SampleSystems::linear_springs_3dof();
        let ls = LinearSystem::new(&config, &system).unwrap();
        let mut v = russell_lab::Vector::from(&[1.0, 2.0, 3.0]);
        ls.zero_prescribed(&mut v);
        assert_eq!(v.as_data(), &[0.0, 2.0, 3.0]);
    }
}
