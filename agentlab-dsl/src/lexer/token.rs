//! Lexer token types

use std::fmt;

// ============================================================================
// LEXER TYPES
// ============================================================================

/// Token kinds for AgentLab.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Declarations
    Library,
    Behaviour,
    State,
    Starter,
    Packet,
    Const,
    Action,
    Condition,

    // State bodies
    If,
    Interval,
    Unknown,
    Execute,

    // Blocks
    Settings,
    Data,
    Assigner,

    // Attributes
    Priority,
    StartFrom,
    NonBlocking,
    SkipFirstBody,
    UseObjectSlot,
    ControlPacket,
    GlobalIndex,
    InstanceType,

    // Types
    BoolType,
    IntType,
    FloatType,
    StringType,

    // Literals
    True,
    False,
    Integer(i32),
    Float(f32),
    String(String),
    Identifier(String),

    // Operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Assign,
    Equal,
    GreaterEqual,
    LessEqual,
    Greater,
    Less,
    Not,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    AttributeOpen,
    AttributeClose,
    Comma,
    Colon,
    Semicolon,

    // Special
    Eof,
}

impl TokenKind {
    /// Reclassify an identifier as a keyword. Matching is exact.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "library" => TokenKind::Library,
            "behaviour" => TokenKind::Behaviour,
            "state" => TokenKind::State,
            "starter" => TokenKind::Starter,
            "packet" => TokenKind::Packet,
            "const" => TokenKind::Const,
            "action" => TokenKind::Action,
            "condition" => TokenKind::Condition,

            "if" => TokenKind::If,
            "interval" => TokenKind::Interval,
            "Unknown" => TokenKind::Unknown,
            "execute" => TokenKind::Execute,

            "settings" => TokenKind::Settings,
            "data" => TokenKind::Data,
            "assigner" => TokenKind::Assigner,

            "Priority" => TokenKind::Priority,
            "StartFrom" => TokenKind::StartFrom,
            "NonBlocking" => TokenKind::NonBlocking,
            "SkipFirstBody" => TokenKind::SkipFirstBody,
            "UseObjectSlot" => TokenKind::UseObjectSlot,
            "ControlPacket" => TokenKind::ControlPacket,
            "GlobalIndex" => TokenKind::GlobalIndex,
            "InstanceType" => TokenKind::InstanceType,

            "bool" => TokenKind::BoolType,
            "int" => TokenKind::IntType,
            "float" => TokenKind::FloatType,
            "string" => TokenKind::StringType,

            "true" => TokenKind::True,
            "false" => TokenKind::False,

            _ => return None,
        };
        Some(kind)
    }

    /// Human-readable kind name used in parse errors.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Library => "'library'",
            TokenKind::Behaviour => "'behaviour'",
            TokenKind::State => "'state'",
            TokenKind::Starter => "'starter'",
            TokenKind::Packet => "'packet'",
            TokenKind::Const => "'const'",
            TokenKind::Action => "'action'",
            TokenKind::Condition => "'condition'",
            TokenKind::If => "'if'",
            TokenKind::Interval => "'interval'",
            TokenKind::Unknown => "'Unknown'",
            TokenKind::Execute => "'execute'",
            TokenKind::Settings => "'settings'",
            TokenKind::Data => "'data'",
            TokenKind::Assigner => "'assigner'",
            TokenKind::Priority => "'Priority'",
            TokenKind::StartFrom => "'StartFrom'",
            TokenKind::NonBlocking => "'NonBlocking'",
            TokenKind::SkipFirstBody => "'SkipFirstBody'",
            TokenKind::UseObjectSlot => "'UseObjectSlot'",
            TokenKind::ControlPacket => "'ControlPacket'",
            TokenKind::GlobalIndex => "'GlobalIndex'",
            TokenKind::InstanceType => "'InstanceType'",
            TokenKind::BoolType => "'bool'",
            TokenKind::IntType => "'int'",
            TokenKind::FloatType => "'float'",
            TokenKind::StringType => "'string'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Integer(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::String(_) => "string",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Add => "'+'",
            TokenKind::Subtract => "'-'",
            TokenKind::Multiply => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::Assign => "'='",
            TokenKind::Equal => "'=='",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::Less => "'<'",
            TokenKind::Not => "'!'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::AttributeOpen => "'['",
            TokenKind::AttributeClose => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Eof => "end of input",
        }
    }

    /// Whether a token of this kind can be the last token of an operand.
    ///
    /// A `-` directly before a digit is a sign only when the previous token
    /// cannot end an operand.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Integer(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Identifier(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::RParen
                | TokenKind::AttributeClose
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Integer(value) => write!(f, "{value}"),
            TokenKind::Float(value) => write!(f, "{value:?}"),
            TokenKind::String(value) => write!(f, "\"{value}\""),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Eof => f.write_str("<eof>"),
            other => f.write_str(other.name().trim_matches('\'')),
        }
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
