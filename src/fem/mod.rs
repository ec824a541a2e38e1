//! Implements the incremental-loading drivers and their collaborator interfaces

mod convergence_control;
mod fem_state;
mod interfaces;
mod linear_system;
mod load_control;
mod sample_systems;
mod solver_arc_length;
mod solver_data;
mod solver_newton;
mod solver_standard;
pub use crate::fem::convergence_control::*;
pub use crate::fem::fem_state::*;
pub use crate::fem::interfaces::*;
pub use crate::fem::linear_system::*;
pub use crate::fem::load_control::*;
pub use crate::fem::sample_systems::*;
pub use crate::fem::solver_arc_length::*;
pub use crate::fem::solver_data::*;
pub use crate::fem::solver_newton::*;
pub use crate::fem::solver_standard::*;
