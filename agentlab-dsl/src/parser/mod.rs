//! Parser module for AgentLab

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::*;
