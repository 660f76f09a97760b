//! Error types for each stage of the AgentLab pipeline

use agentlab_core::ResolveError;
use thiserror::Error;

/// Lexer errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LexError {
    #[error("Invalid numeric literal '{text}' at line {line}, column {column}")]
    InvalidNumber {
        text: String,
        line: usize,
        column: usize,
    },
}

/// Parser errors. The first one aborts the parse.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("Parse error at line {line}, column {column}: expected {expected}, found {found} '{text}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        text: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error at line {line}, column {column}: unknown attribute '{name}'")]
    UnknownAttribute {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Parse error at line {line}, column {column}: attribute {attribute} cannot be applied to a {target}")]
    MisplacedAttribute {
        attribute: String,
        target: &'static str,
        line: usize,
        column: usize,
    },

    #[error("Parse error at line {line}, column {column}: a behaviour can only have one starter")]
    DuplicateStarter { line: usize, column: usize },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnknownAttribute { line, .. }
            | ParseError::MisplacedAttribute { line, .. }
            | ParseError::DuplicateStarter { line, .. }
            | ParseError::Lex(LexError::InvalidNumber { line, .. }) => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { column, .. }
            | ParseError::UnknownAttribute { column, .. }
            | ParseError::MisplacedAttribute { column, .. }
            | ParseError::DuplicateStarter { column, .. }
            | ParseError::Lex(LexError::InvalidNumber { column, .. }) => *column,
        }
    }
}

/// Declaration, reference and type errors found by the symbol table builder
/// and by constant folding in the code generator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    #[error("'{name}' is already defined in this scope")]
    Redefinition { name: String },

    #[error("undefined {kind} '{name}'")]
    UndefinedReference { kind: &'static str, name: String },

    #[error("'{name}' is a {found}, expected a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("unary '{op}' cannot be applied to {operand}")]
    InvalidUnaryOperand { op: &'static str, operand: String },

    #[error("'{name}' expects {expected} arguments but got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'{name}' is not a valid {block} entry")]
    UnknownEntry { name: String, block: &'static str },

    #[error("'{member}' is not a member of {enum_name}")]
    UnknownEnumMember { enum_name: String, member: String },

    #[error("const declarations form a cycle through '{name}'")]
    ConstCycle { name: String },

    #[error("index {index} is out of bounds for '{name}' of size {size}")]
    IndexOutOfBounds { name: String, index: i64, size: usize },

    #[error("division by zero in constant expression")]
    DivisionByZero,

    #[error("value {value} does not fit in {target}")]
    OutOfRange { value: String, target: &'static str },
}

/// Configuration loading errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    Toml { reason: String },
}

/// Any failure of a compile or symbol-table build.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{catalog} definitions: {error}")]
    Catalog {
        catalog: &'static str,
        error: ParseError,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

impl From<LexError> for CompileError {
    fn from(error: LexError) -> Self {
        CompileError::Parse(ParseError::Lex(error))
    }
}

/// Decompilation errors. Fatal for the object being written only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecompileError {
    #[error("settings word has no {field} member with value {value}")]
    UnknownSettingValue { field: &'static str, value: u32 },

    #[error("data slot {slot} points at float {index} but the float table has {len} entries")]
    FloatIndexOutOfRange {
        slot: &'static str,
        index: u8,
        len: usize,
    },

    #[error("cannot write non-finite float with bits {bits:#010x}")]
    NonFiniteFloat { bits: u32 },

    #[error("no name known for condition {index}")]
    UnnamedCondition { index: u16 },

    #[error("no name known for action {index}")]
    UnnamedAction { index: u16 },

    #[error("action '{name}' expects {expected} arguments but the command has {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("argument word {word:#x} of '{name}' is not a boolean")]
    NotBoolean { name: String, word: u32 },

    #[error("state jumps to missing state {target}")]
    MissingJumpTarget { target: i32 },

    #[error("object slot {index} does not exist")]
    UnknownObjectSlot { index: i16 },
}

pub type LexResult<T> = Result<T, LexError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type SemanticResult<T> = Result<T, SemanticError>;
pub type CompileResult<T> = Result<T, CompileError>;
pub type DecompileResult<T> = Result<T, DecompileError>;
