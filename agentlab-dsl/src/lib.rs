//! AgentLab DSL - Behaviour Script Compiler & Decompiler
//!
//! This crate turns AgentLab scripts into the bytecode objects defined in
//! `agentlab-core`, and writes those objects back out as scripts.
//!
//! Architecture:
//! ```text
//! Script Source
//!     ↓
//! Lexer (tokens)
//!     ↓
//! Parser (AST)
//!     ↓
//! SymbolTableBuilder (scopes, types, catalog ids)
//!     ↓
//! CodeGenerator (Graph / CommandsSequence / CommandPack / Starter)
//!     ↓
//! Decompiler (for round-trip testing)
//! ```
//!
//! The interpreter is a side utility that evaluates bare arithmetic
//! expressions without going through the compiler.

pub mod compiler;
pub mod config;
pub mod decompiler;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod pretty_printer;
pub mod symbols;

// Re-export key types for convenience
pub use compiler::{compile, try_compile, CompilerOptions, CompilerResult, CompilerStatus, Value};
pub use config::*;
pub use decompiler::{decompile, decompile_result, Decompile, DecompiledObject};
pub use error::*;
pub use interpreter::{interpret, interpret_expr};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::*;
pub use pretty_printer::{pretty_print, pretty_print_expr};
pub use symbols::{BuiltinType, Scope, Symbol, SymbolKind, SymbolTable, SymbolTableBuilder};
