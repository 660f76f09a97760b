//! Lexer implementation

use super::token::*;
use crate::error::LexError;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// Characters that always end a lexeme and form their own token.
fn is_reserved(c: char) -> bool {
    matches!(
        c,
        '/' | '*' | '!' | '[' | ']' | '{' | '}' | '(' | ')' | '+' | '-' | '=' | ';' | ':' | ',' | '>' | '<' | '"' | '\''
    )
}

/// Lexer for AgentLab source.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    prev_ends_operand: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            prev_ends_operand: false,
        }
    }

    /// Tokenize the entire source into a vector of tokens ending with `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token from the source. Returns `Eof` forever once the
    /// input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();
            if self.peek_char() == Some('/') && self.peek_next_char() == Some('/') {
                self.skip_line();
                continue;
            }
            break;
        }

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '[' => self.single(TokenKind::AttributeOpen),
                ']' => self.single(TokenKind::AttributeClose),
                ',' => self.single(TokenKind::Comma),
                ':' => self.single(TokenKind::Colon),
                ';' => self.single(TokenKind::Semicolon),
                '+' => self.single(TokenKind::Add),
                '*' => self.single(TokenKind::Multiply),
                '/' => self.single(TokenKind::Divide),
                '!' => self.single(TokenKind::Not),

                '=' => self.pair('=', TokenKind::Equal, TokenKind::Assign),
                '>' => self.pair('=', TokenKind::GreaterEqual, TokenKind::Greater),
                '<' => self.pair('=', TokenKind::LessEqual, TokenKind::Less),

                '-' => {
                    let signs_literal = !self.prev_ends_operand
                        && self.peek_next_char().map(|c| c.is_ascii_digit()).unwrap_or(false);
                    self.advance();
                    if signs_literal {
                        self.scan_number(true, start_line, start_col)?
                    } else {
                        TokenKind::Subtract
                    }
                }

                '"' | '\'' => self.scan_string(c),

                c if c.is_ascii_digit() => self.scan_number(false, start_line, start_col)?,

                _ => self.scan_identifier(),
            },
        };

        self.prev_ends_operand = kind.ends_operand();

        Ok(Token {
            kind,
            span: Span {
                start: start_pos,
                end: self.pos,
                line: start_line,
                column: start_col,
            },
        })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn pair(&mut self, second: char, matched: TokenKind, alone: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            matched
        } else {
            alone
        }
    }

    /// Consume a run of non-whitespace, non-reserved characters.
    fn advance_lexeme(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || is_reserved(c) {
                break;
            }
            self.advance();
        }
        &self.source[start..self.pos]
    }

    /// Scan a numeric literal. A `-` directly after the lexeme is taken into
    /// it together with the following run, so `1e-5` stays one literal.
    fn scan_number(&mut self, negative: bool, line: usize, column: usize) -> Result<TokenKind, LexError> {
        let mut text = String::from(self.advance_lexeme());
        if self.peek_char() == Some('-') {
            self.advance();
            text.push('-');
            text.push_str(self.advance_lexeme());
        }

        let invalid = || LexError::InvalidNumber {
            text: if negative { format!("-{text}") } else { text.clone() },
            line,
            column,
        };

        let is_hex = text.starts_with("0x") || text.starts_with("0X");
        if !is_hex && (text.contains('.') || text.contains(['e', 'E'])) {
            let value: f32 = text.parse().map_err(|_| invalid())?;
            return Ok(TokenKind::Float(if negative { -value } else { value }));
        }

        let value = if is_hex {
            u32::from_str_radix(&text[2..], 16).map_err(|_| invalid())? as i32
        } else {
            let signed = if negative { format!("-{text}") } else { text.clone() };
            return signed.parse::<i32>().map(TokenKind::Integer).map_err(|_| invalid());
        };
        Ok(TokenKind::Integer(if negative { value.wrapping_neg() } else { value }))
    }

    /// Scan a string literal up to the same quote character or the end of the line.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance(); // consume opening quote
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c == quote || c == '\n' {
                break;
            }
            self.advance();
        }

        let value = self.source[start..self.pos].trim_end_matches('\r').to_string();
        if self.peek_char() == Some(quote) {
            self.advance();
        }

        TokenKind::String(value)
    }

    /// Scan an identifier and reclassify it when it names a keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let ident = self.advance_lexeme();
        TokenKind::keyword(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.pos = pos + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
