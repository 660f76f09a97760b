//! Symbol tables for AgentLab scripts

pub mod builder;
pub mod symbol;
pub mod table;

pub use builder::*;
pub use symbol::*;
pub use table::*;
