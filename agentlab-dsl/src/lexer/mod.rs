//! Lexer module for AgentLab

pub mod token;
pub mod scanner;

pub use token::*;
pub use scanner::*;
