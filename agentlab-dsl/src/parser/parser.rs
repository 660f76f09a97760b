//! Recursive-descent parser for AgentLab

use super::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Span, Token, TokenKind};
use agentlab_core::ParamType;
use std::mem;

static EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    span: Span {
        start: 0,
        end: 0,
        line: 1,
        column: 1,
    },
};

/// Parser for AgentLab source.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
}

impl Parser {
    /// Create a new parser from a vector of tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse one complete top-level form. Fails if tokens remain after it.
    pub fn parse(&mut self) -> ParseResult<Ast> {
        let ast = match self.current().kind {
            TokenKind::Action => Ast::Actions(self.action_definitions()?),
            TokenKind::Condition => Ast::Conditions(self.condition_definitions()?),
            TokenKind::Behaviour => Ast::Behaviour(self.behaviour(AttributeList::default())?),
            TokenKind::Identifier(_) => Ast::ActionList(self.action_list()?),
            TokenKind::AttributeOpen => self.attributed_form()?,
            _ => return Err(self.error_expected("'behaviour', 'library', a definition or an action")),
        };
        self.eat(TokenKind::Eof)?;
        Ok(ast)
    }

    /// Parse a bare expression followed by end of input.
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.expression()?;
        self.eat(TokenKind::Eof)?;
        Ok(expr)
    }

    // ========================================================================
    // TOKEN HELPERS
    // ========================================================================

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF_TOKEN)
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|token| &token.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current().kind) == mem::discriminant(kind)
    }

    /// Consume a token of the expected kind or fail with expected vs actual.
    fn eat(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_expected(kind.name()))
        }
    }

    fn eat_if(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_expected("identifier")),
        }
    }

    fn expect_integer(&mut self) -> ParseResult<i32> {
        match self.current().kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.error_expected("integer")),
        }
    }

    fn number(&mut self) -> ParseResult<Number> {
        let number = match self.current().kind {
            TokenKind::Integer(value) => Number::Integer(value),
            TokenKind::Float(value) => Number::Float(value),
            _ => return Err(self.error_expected("number")),
        };
        self.advance();
        Ok(number)
    }

    fn boolean(&mut self) -> ParseResult<bool> {
        let value = match self.current().kind {
            TokenKind::True => true,
            TokenKind::False => false,
            _ => return Err(self.error_expected("'true' or 'false'")),
        };
        self.advance();
        Ok(value)
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind.name().to_string(),
            text: token.kind.to_string(),
            line: token.span.line,
            column: token.span.column,
        }
    }

    // ========================================================================
    // ATTRIBUTES
    // ========================================================================

    fn attributed_form(&mut self) -> ParseResult<Ast> {
        let attributes = self.attribute_entries()?;
        let implies_behaviour = attributes
            .iter()
            .any(|(attr, _)| matches!(attr, Attribute::Priority(_) | Attribute::StartFrom(_)));
        let implies_library = attributes
            .iter()
            .any(|(attr, _)| matches!(attr, Attribute::GlobalIndex(_) | Attribute::InstanceType(_)));

        let target = if implies_behaviour {
            AttributeTarget::Behaviour
        } else if implies_library {
            AttributeTarget::Library
        } else if self.check(&TokenKind::Library) {
            AttributeTarget::Library
        } else {
            AttributeTarget::Behaviour
        };

        let attributes = Self::restrict(attributes, target)?;
        match target {
            AttributeTarget::Library => Ok(Ast::Library(self.library(attributes)?)),
            _ => Ok(Ast::Behaviour(self.behaviour(attributes)?)),
        }
    }

    fn restrict(entries: Vec<(Attribute, Span)>, target: AttributeTarget) -> ParseResult<AttributeList> {
        let mut list = AttributeList::default();
        for (attribute, span) in entries {
            if !attribute.applies_to(target) {
                return Err(ParseError::MisplacedAttribute {
                    attribute: attribute.name().to_string(),
                    target: target.name(),
                    line: span.line,
                    column: span.column,
                });
            }
            list.push(attribute);
        }
        Ok(list)
    }

    fn attribute_entries(&mut self) -> ParseResult<Vec<(Attribute, Span)>> {
        let mut entries = Vec::new();
        while self.check(&TokenKind::AttributeOpen) {
            let span = self.current().span;
            entries.push((self.attribute()?, span));
        }
        Ok(entries)
    }

    fn attribute(&mut self) -> ParseResult<Attribute> {
        self.eat(TokenKind::AttributeOpen)?;
        let kind = self.current().kind.clone();
        let attribute = match kind {
            TokenKind::Priority => Attribute::Priority(self.parenthesized(Self::number)?),
            TokenKind::StartFrom => Attribute::StartFrom(self.parenthesized(Self::expect_identifier)?),
            TokenKind::NonBlocking => {
                self.advance();
                Attribute::NonBlocking
            }
            TokenKind::SkipFirstBody => {
                self.advance();
                Attribute::SkipFirstBody
            }
            TokenKind::UseObjectSlot => Attribute::UseObjectSlot(self.parenthesized(Self::expect_identifier)?),
            TokenKind::ControlPacket => Attribute::ControlPacket(self.parenthesized(Self::expect_identifier)?),
            TokenKind::GlobalIndex => Attribute::GlobalIndex(self.parenthesized(Self::number)?),
            TokenKind::InstanceType => Attribute::InstanceType(self.parenthesized(Self::expect_identifier)?),
            TokenKind::Unknown => Attribute::Unknown(self.parenthesized(Self::number)?),
            TokenKind::Identifier(name) => {
                let span = self.current().span;
                return Err(ParseError::UnknownAttribute {
                    name,
                    line: span.line,
                    column: span.column,
                });
            }
            _ => return Err(self.error_expected("attribute")),
        };
        self.eat(TokenKind::AttributeClose)?;
        Ok(attribute)
    }

    /// `keyword ( inner )`; the keyword is the current token.
    fn parenthesized<T>(&mut self, inner: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.advance();
        self.eat(TokenKind::LParen)?;
        let value = inner(self)?;
        self.eat(TokenKind::RParen)?;
        Ok(value)
    }

    // ========================================================================
    // BEHAVIOURS
    // ========================================================================

    fn behaviour(&mut self, attributes: AttributeList) -> ParseResult<Behaviour> {
        self.eat(TokenKind::Behaviour)?;
        let name = self.expect_identifier()?;
        self.eat(TokenKind::LBrace)?;

        let mut body = BehaviourBody::default();
        loop {
            match self.current().kind {
                TokenKind::RBrace => break,
                TokenKind::Const => body.consts.push(self.const_declaration()?),
                TokenKind::Starter => {
                    if body.starter.is_some() {
                        let span = self.current().span;
                        return Err(ParseError::DuplicateStarter {
                            line: span.line,
                            column: span.column,
                        });
                    }
                    body.starter = Some(self.starter()?);
                }
                TokenKind::Packet => body.packets.push(self.control_packet()?),
                TokenKind::State | TokenKind::AttributeOpen => body.states.push(self.state()?),
                _ => return Err(self.error_expected("'const', 'starter', 'packet', 'state' or '}'")),
            }
        }

        self.eat(TokenKind::RBrace)?;
        Ok(Behaviour {
            name,
            attributes,
            body,
        })
    }

    fn const_declaration(&mut self) -> ParseResult<ConstDeclaration> {
        self.eat(TokenKind::Const)?;
        let name = self.expect_identifier()?;
        self.eat(TokenKind::Assign)?;
        let value = self.expression()?;
        self.eat(TokenKind::Semicolon)?;
        Ok(ConstDeclaration { name, value })
    }

    fn starter(&mut self) -> ParseResult<StarterDecl> {
        self.eat(TokenKind::Starter)?;
        self.eat(TokenKind::LBrace)?;
        let mut starter = StarterDecl::default();
        while self.eat_if(TokenKind::Assigner) {
            self.eat(TokenKind::Assign)?;
            let entries = self.assign_block()?;
            starter.assigners.push(AssignerBlock { entries });
        }
        self.eat(TokenKind::RBrace)?;
        Ok(starter)
    }

    /// `{ assign* }`
    fn assign_block(&mut self) -> ParseResult<AssignList> {
        self.eat(TokenKind::LBrace)?;
        let mut entries = AssignList::default();
        while !self.check(&TokenKind::RBrace) {
            entries.push(self.assign()?);
        }
        self.eat(TokenKind::RBrace)?;
        Ok(entries)
    }

    fn assign(&mut self) -> ParseResult<Assign> {
        let name = self.expect_identifier()?;
        let target = if self.eat_if(TokenKind::AttributeOpen) {
            let index = self.expression()?;
            self.eat(TokenKind::AttributeClose)?;
            AssignTarget::Element { name, index }
        } else {
            AssignTarget::Const(name)
        };
        self.eat(TokenKind::Assign)?;
        let value = self.expression()?;
        self.eat(TokenKind::Semicolon)?;
        Ok(Assign { target, value })
    }

    fn control_packet(&mut self) -> ParseResult<ControlPacketDecl> {
        self.eat(TokenKind::Packet)?;
        let name = self.expect_identifier()?;
        self.eat(TokenKind::LBrace)?;
        let settings = if self.eat_if(TokenKind::Settings) {
            Some(self.assign_block()?)
        } else {
            None
        };
        let data = if self.eat_if(TokenKind::Data) {
            Some(self.assign_block()?)
        } else {
            None
        };
        self.eat(TokenKind::RBrace)?;
        Ok(ControlPacketDecl { name, settings, data })
    }

    fn state(&mut self) -> ParseResult<StateDecl> {
        let attributes = self.attribute_entries()?;
        let attributes = Self::restrict(attributes, AttributeTarget::State)?;
        self.eat(TokenKind::State)?;
        let name = self.expect_identifier()?;

        self.eat(TokenKind::LParen)?;
        let behaviour_ref = match &self.current().kind {
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Some(value)
            }
            _ => None,
        };
        self.eat(TokenKind::RParen)?;

        self.eat(TokenKind::LBrace)?;
        let mut bodies = StateBodyList::default();
        while self.check(&TokenKind::If) {
            bodies.push(self.state_body()?);
        }
        self.eat(TokenKind::RBrace)?;

        Ok(StateDecl {
            name,
            attributes,
            behaviour_ref,
            bodies,
        })
    }

    fn state_body(&mut self) -> ParseResult<StateBody> {
        self.eat(TokenKind::If)?;
        let condition = self.condition_call()?;
        let not_gate = match self.current().kind {
            TokenKind::GreaterEqual => false,
            TokenKind::LessEqual => true,
            _ => return Err(self.error_expected("'>=' or '<='")),
        };
        self.advance();
        let threshold = self.factor()?;

        self.eat(TokenKind::LBrace)?;
        self.eat(TokenKind::Interval)?;
        self.eat(TokenKind::Assign)?;
        let interval = self.factor()?;
        self.eat(TokenKind::Semicolon)?;
        self.eat(TokenKind::Unknown)?;
        self.eat(TokenKind::Assign)?;
        let unknown = self.boolean()?;
        self.eat(TokenKind::Semicolon)?;

        let block = match self.current().kind {
            TokenKind::Identifier(_) => StateBlock::Actions(self.action_list()?),
            TokenKind::Execute => {
                self.advance();
                let state = self.expect_identifier()?;
                self.eat(TokenKind::Semicolon)?;
                StateBlock::Execute(StateExecute { state })
            }
            _ => StateBlock::NoOp,
        };
        self.eat(TokenKind::RBrace)?;

        Ok(StateBody {
            condition,
            not_gate,
            threshold,
            interval,
            unknown,
            block,
        })
    }

    fn condition_call(&mut self) -> ParseResult<ConditionCall> {
        let name = self.expect_identifier()?;
        self.eat(TokenKind::LParen)?;
        let argument = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.factor()?)
        };
        self.eat(TokenKind::RParen)?;
        Ok(ConditionCall { name, argument })
    }

    fn action_list(&mut self) -> ParseResult<ActionList> {
        let mut actions = ActionList::default();
        while matches!(self.current().kind, TokenKind::Identifier(_)) {
            actions.push(self.action()?);
        }
        Ok(actions)
    }

    fn action(&mut self) -> ParseResult<ActionCall> {
        let name = self.expect_identifier()?;
        self.eat(TokenKind::LParen)?;
        let mut arguments = ParamList::default();
        if !self.check(&TokenKind::RParen) {
            arguments.push(self.expression()?);
            while self.eat_if(TokenKind::Comma) {
                arguments.push(self.expression()?);
            }
        }
        self.eat(TokenKind::RParen)?;
        self.eat(TokenKind::Semicolon)?;
        Ok(ActionCall { name, arguments })
    }

    // ========================================================================
    // LIBRARIES
    // ========================================================================

    fn library(&mut self, attributes: AttributeList) -> ParseResult<Library> {
        self.eat(TokenKind::Library)?;
        let name = self.expect_identifier()?;
        self.eat(TokenKind::LBrace)?;

        let mut behaviours = LinearBehaviourList::default();
        while self.eat_if(TokenKind::Behaviour) {
            let name = self.expect_identifier()?;
            self.eat(TokenKind::LBrace)?;
            let actions = self.action_list()?;
            self.eat(TokenKind::RBrace)?;
            behaviours.push(LinearBehaviour { name, actions });
        }
        let creation = self.action_list()?;
        self.eat(TokenKind::RBrace)?;

        Ok(Library {
            name,
            attributes,
            behaviours,
            creation,
        })
    }

    // ========================================================================
    // DEFINITIONS
    // ========================================================================

    fn action_definitions(&mut self) -> ParseResult<ActionDefinitionList> {
        let mut definitions = ActionDefinitionList::default();
        while self.eat_if(TokenKind::Action) {
            let name = self.expect_identifier()?;
            self.eat(TokenKind::LParen)?;
            let mut parameters = Vec::new();
            if !self.check(&TokenKind::RParen) {
                parameters.push(self.parameter()?);
                while self.eat_if(TokenKind::Comma) {
                    parameters.push(self.parameter()?);
                }
            }
            self.eat(TokenKind::RParen)?;
            let (aliases, id) = self.definition_tail()?;
            definitions.push(ActionDefinition {
                name,
                parameters,
                aliases,
                id,
            });
        }
        Ok(definitions)
    }

    fn condition_definitions(&mut self) -> ParseResult<ConditionDefinitionList> {
        let mut definitions = ConditionDefinitionList::default();
        while self.eat_if(TokenKind::Condition) {
            let name = self.expect_identifier()?;
            self.eat(TokenKind::LParen)?;
            let parameter = if self.check(&TokenKind::RParen) {
                None
            } else {
                Some(self.parameter()?)
            };
            self.eat(TokenKind::RParen)?;
            let (aliases, id) = self.definition_tail()?;
            definitions.push(ConditionDefinition {
                name,
                parameter,
                aliases,
                id,
            });
        }
        Ok(definitions)
    }

    fn parameter(&mut self) -> ParseResult<ParameterDecl> {
        let ty = match self.current().kind {
            TokenKind::BoolType => ParamType::Bool,
            TokenKind::IntType => ParamType::Int,
            TokenKind::FloatType => ParamType::Float,
            _ => return Err(self.error_expected("'bool', 'int' or 'float'")),
        };
        self.advance();
        let name = self.expect_identifier()?;
        Ok(ParameterDecl { ty, name })
    }

    /// `[Alias, ...]? (: id)? ;`
    fn definition_tail(&mut self) -> ParseResult<(Vec<String>, Option<i32>)> {
        let mut aliases = Vec::new();
        if self.eat_if(TokenKind::AttributeOpen) {
            aliases.push(self.expect_identifier()?);
            while self.eat_if(TokenKind::Comma) {
                aliases.push(self.expect_identifier()?);
            }
            self.eat(TokenKind::AttributeClose)?;
        }
        let id = if self.eat_if(TokenKind::Colon) {
            Some(self.expect_integer()?)
        } else {
            None
        };
        self.eat(TokenKind::Semicolon)?;
        Ok((aliases, id))
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    /// `term (('+' | '-') term)*`
    fn expression(&mut self) -> ParseResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Add => BinaryOp::Add,
                TokenKind::Subtract => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `factor (('*' | '/') factor)*`
    fn term(&mut self) -> ParseResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Multiply => BinaryOp::Multiply,
                TokenKind::Divide => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let kind = self.current().kind.clone();
        match kind {
            TokenKind::Add | TokenKind::Subtract => {
                self.advance();
                let op = if kind == TokenKind::Add { UnaryOp::Plus } else { UnaryOp::Minus };
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(self.factor()?),
                })
            }
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Expr::Number(Number::Integer(value)))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::Number(Number::Float(value)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.eat(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Expr::String(value))
            }
            TokenKind::True | TokenKind::False => Ok(Expr::Bool(self.boolean()?)),
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::AttributeOpen) && !matches!(self.peek_kind(1), TokenKind::AttributeClose) {
                    self.advance();
                    let index = self.expression()?;
                    self.eat(TokenKind::AttributeClose)?;
                    Ok(Expr::ArrayAccess {
                        name,
                        index: Box::new(index),
                    })
                } else {
                    Ok(Expr::Const(name))
                }
            }
            _ => Err(self.error_expected("expression")),
        }
    }
}

// ============================================================================
// CONVENIENCE FUNCTIONS
// ============================================================================

/// Lex and parse a complete script.
pub fn parse(source: &str) -> ParseResult<Ast> {
    let tokens = Lexer::new(source).tokenize()?;
    let ast = Parser::new(tokens).parse()?;
    tracing::debug!(form = ast.form(), "parsed AgentLab script");
    Ok(ast)
}

/// Lex and parse a bare expression.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_expression()
}

// ============================================================================
// TESTS
// ============================================================================
