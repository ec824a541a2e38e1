use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the increment-driving method
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Method {
    /// Standard load-controlled Newton increments
    #[serde(rename = "standard")]
    Standard,

    /// Cylindrical arc-length continuation (path-following)
    #[serde(rename = "arclength_cylinder")]
    ArcLengthCylinder,
}

/// Defines the reasons for a converged increment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConvergedReason {
    /// The residual norm fell below the absolute tolerance
    AbsResidual,

    /// The residual norm fell below the relative tolerance times ‖R₀‖
    RelResidual,

    /// The relative corrective-displacement norm fell below its tolerance
    IncrementNorm,
}

/// Defines the reasons for a diverged increment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DivergedReason {
    /// A line search failed (reported by external globalized solvers only)
    LineSearch,

    /// The linear solver failed (factorization or triangular solve)
    LinearSolve,

    /// The residual (or corrective displacement) contains NaN or Inf
    NanResidual,

    /// The maximum number of iterations was reached without convergence
    MaxIterations,

    /// The residual norm grew beyond the divergence multiple of ‖R₀‖
    DivergenceTolerance,

    /// The arc-length constraint has no real root at the current radius
    InnerSolve,
}

/// Defines the status of the nonlinear iterations (closed taxonomy)
///
/// Every enumerator of the external solver's convergence-code list maps
/// one-to-one onto this tagged union; any `Diverged` value is treated
/// uniformly as "not converged" by the increment drivers, and the reason
/// is retained for diagnostic reporting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NonlinearStatus {
    /// The iterations have not reached a verdict yet
    Iterating,

    /// The increment converged
    Converged(ConvergedReason),

    /// The increment diverged
    Diverged(DivergedReason),
}

impl NonlinearStatus {
    /// Returns whether the status indicates a converged increment
    pub fn converged(&self) -> bool {
        matches!(self, NonlinearStatus::Converged(..))
    }

    /// Returns whether the status indicates a diverged increment
    pub fn diverged(&self) -> bool {
        matches!(self, NonlinearStatus::Diverged(..))
    }

    /// Returns a human-readable description of the status
    pub fn description(&self) -> &'static str {
        match self {
            NonlinearStatus::Iterating => "still iterating",
            NonlinearStatus::Converged(reason) => match reason {
                ConvergedReason::AbsResidual => "converged on the absolute residual norm",
                ConvergedReason::RelResidual => "converged on the relative residual norm",
                ConvergedReason::IncrementNorm => "converged on the corrective-displacement norm",
            },
            NonlinearStatus::Diverged(reason) => match reason {
                DivergedReason::LineSearch => "diverged: the line search failed",
                DivergedReason::LinearSolve => "diverged: the linear solver failed",
                DivergedReason::NanResidual => "diverged: found NaN or Inf",
                DivergedReason::MaxIterations => "diverged: reached the maximum number of iterations",
                DivergedReason::DivergenceTolerance => "diverged: the residual norm grew beyond the divergence tolerance",
                DivergedReason::InnerSolve => "diverged: the arc-length constraint has no real root",
            },
        }
    }
}

impl fmt::Display for NonlinearStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ConvergedReason, DivergedReason, Method, NonlinearStatus};

    #[test]
    fn derive_works() {
        let method = Method::ArcLengthCylinder;
        let cloned = method.clone();
        assert_eq!(format!("{:?}", cloned), "ArcLengthCylinder");
        assert_eq!(method, Method::ArcLengthCylinder);

        let status = NonlinearStatus::Converged(ConvergedReason::AbsResidual);
        let cloned = status.clone();
        assert_eq!(cloned, status);
        assert_eq!(format!("{:?}", status), "Converged(AbsResidual)");
    }

    #[test]
    fn serde_method_works() {
        let method: Method = serde_json::from_str("\"arclength_cylinder\"").unwrap();
        assert_eq!(method, Method::ArcLengthCylinder);
        let method: Method = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(method, Method::Standard);
        assert_eq!(serde_json::to_string(&method).unwrap(), "\"standard\"");
    }

    #[test]
    fn helpers_work() {
        assert!(!NonlinearStatus::Iterating.converged());
        assert!(!NonlinearStatus::Iterating.diverged());
        assert!(NonlinearStatus::Converged(ConvergedReason::RelResidual).converged());
        assert!(NonlinearStatus::Diverged(DivergedReason::InnerSolve).diverged());
    }

    #[test]
    fn descriptions_work() {
        assert_eq!(NonlinearStatus::Iterating.description(), "still iterating");
        assert_eq!(
            NonlinearStatus::Converged(ConvergedReason::IncrementNorm).description(),
            "converged on the corrective-displacement norm"
        );
        assert_eq!(
            format!("{}", NonlinearStatus::Diverged(DivergedReason::LinearSolve)),
            "diverged: the linear solver failed"
        );
        assert_eq!(
            NonlinearStatus::Diverged(DivergedReason::InnerSolve).description(),
            "diverged: the arc-length constraint has no real root"
        );
    }
}
