//! Implements the base structures for an implicit material point simulation

mod config;
mod constants;
mod dof_index_map;
mod enums;
mod error;
mod essential;
mod natural;
mod parameters;
pub use crate::base::config::*;
pub use crate::base::constants::*;
pub use crate::base::dof_index_map::*;
pub use crate::base::enums::*;
pub use crate::base::error::*;
pub use crate::base::essential::*;
pub use crate::base::natural::*;
pub use crate::base::parameters::*;
