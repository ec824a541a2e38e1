//! Makes available common structures needed to run an analysis
//!
//! You may write `use loadstep::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Config, Method, NonlinearStatus, DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
pub use crate::fem::{ElementSystem, FemState, SampleSystems, SolverArcLength, SolverStandard};
