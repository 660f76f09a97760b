//! Symbol table construction and semantic checks
//!
//! Stages run in a fixed order: built-ins, the condition catalog, the action
//! catalog, then the script. Each stage walks a complete AST.

use super::table::{Scope, GLOBAL_OBJECT_ID};
use super::{BuiltinType, Symbol, SymbolKind, SymbolTable};
use crate::compiler::CompilerStatus;
use crate::error::{CompileError, CompileResult, SemanticError, SemanticResult};
use crate::lexer::Lexer;
use crate::parser::*;
use agentlab_core::{PacketData, SettingField};
use std::collections::HashMap;
use std::iter;
use tracing::{debug, error};

/// Enum-valued entries of an `assigner = { ... }` block.
pub const ASSIGNER_ENUMS: [&str; 4] = ["AssignType", "AssignLocality", "AssignStatus", "AssignPreference"];

/// Staged builder producing the symbol table for one compile.
#[derive(Debug, Default)]
pub struct SymbolTableBuilder {
    root: SymbolTable,
    /// Nested behaviour or library scopes being visited.
    scopes: Vec<SymbolTable>,
    next_condition_id: u32,
    next_action_id: u32,
}

impl SymbolTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every stage and folds the first failure into a status. The table
    /// holds whatever was registered before the failure.
    pub fn build(ast: &Ast, conditions: &str, actions: &str) -> (SymbolTable, CompilerStatus) {
        let mut builder = Self::new();
        let outcome = builder.run(ast, conditions, actions);
        let status = match outcome {
            Ok(()) => CompilerStatus::default(),
            Err(e) => {
                error!(error = %e, "symbol table build failed");
                CompilerStatus::failed(&e)
            }
        };
        (builder.finish(), status)
    }

    /// Like [`Self::build`] but returns the error itself.
    pub fn try_build(ast: &Ast, conditions: &str, actions: &str) -> CompileResult<SymbolTable> {
        let mut builder = Self::new();
        builder.run(ast, conditions, actions)?;
        Ok(builder.finish())
    }

    fn run(&mut self, ast: &Ast, conditions: &str, actions: &str) -> CompileResult<()> {
        self.build_builtin_types()
            .build_conditions(conditions)?
            .build_actions(actions)?
            .build_from_ast(ast)?;
        Ok(())
    }

    pub fn build_builtin_types(&mut self) -> &mut Self {
        self.root = SymbolTable::with_builtins();
        self
    }

    pub fn build_conditions(&mut self, source: &str) -> CompileResult<&mut Self> {
        self.build_catalog("condition", source)
    }

    pub fn build_actions(&mut self, source: &str) -> CompileResult<&mut Self> {
        self.build_catalog("action", source)
    }

    fn build_catalog(&mut self, catalog: &'static str, source: &str) -> CompileResult<&mut Self> {
        let tokens = Lexer::new(source).tokenize().map_err(|e| CompileError::Catalog {
            catalog,
            error: e.into(),
        })?;
        // Empty or comment-only catalog.
        if tokens.len() <= 1 {
            return Ok(self);
        }

        let ast = Parser::new(tokens)
            .parse()
            .map_err(|error| CompileError::Catalog { catalog, error })?;
        match &ast {
            Ast::Conditions(definitions) => self.define_conditions(definitions)?,
            Ast::Actions(definitions) => self.define_actions(definitions)?,
            other => {
                return Err(SemanticError::WrongKind {
                    name: format!("{catalog} catalog"),
                    expected: "definition list",
                    found: other.form(),
                }
                .into())
            }
        }
        debug!(catalog, symbols = self.root.len(), "loaded definition catalog");
        Ok(self)
    }

    pub fn build_from_ast(&mut self, ast: &Ast) -> SemanticResult<&mut Self> {
        match ast {
            Ast::Behaviour(behaviour) => self.behaviour(behaviour)?,
            Ast::Library(library) => self.library(library)?,
            Ast::Actions(definitions) => self.define_actions(definitions)?,
            Ast::Conditions(definitions) => self.define_conditions(definitions)?,
            Ast::ActionList(actions) => self.actions(actions)?,
        }
        debug!(form = ast.form(), symbols = self.root.len(), "built symbol table");
        Ok(self)
    }

    pub fn finish(self) -> SymbolTable {
        self.root
    }

    // ========================================================================
    // SCOPES
    // ========================================================================

    fn current(&self) -> &SymbolTable {
        self.scopes.last().unwrap_or(&self.root)
    }

    fn current_mut(&mut self) -> &mut SymbolTable {
        match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.root,
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(&self.root, self.current())
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scope().lookup(name)
    }

    fn define(&mut self, symbol: Symbol) -> SemanticResult<()> {
        self.current_mut().define(symbol)
    }

    /// Looks up `name` and checks it is a symbol of the kind `expected`.
    fn expect_kind(
        &self,
        name: &str,
        expected: &'static str,
        matches: fn(&SymbolKind) -> bool,
    ) -> SemanticResult<&Symbol> {
        let symbol = self.lookup(name).ok_or_else(|| SemanticError::UndefinedReference {
            kind: expected,
            name: name.to_string(),
        })?;
        if matches(&symbol.kind) {
            Ok(symbol)
        } else {
            Err(SemanticError::WrongKind {
                name: name.to_string(),
                expected,
                found: symbol.kind.describe(),
            })
        }
    }

    // ========================================================================
    // DEFINITIONS
    // ========================================================================

    fn define_conditions(&mut self, definitions: &ConditionDefinitionList) -> SemanticResult<()> {
        for definition in definitions {
            let id = next_id(&mut self.next_condition_id, definition.id)?;
            let parameter = definition.parameter.as_ref().map(|p| p.ty);
            for name in iter::once(&definition.name).chain(&definition.aliases) {
                self.root.define(Symbol {
                    name: name.clone(),
                    ty: Some(BuiltinType::Condition),
                    kind: SymbolKind::Condition {
                        id,
                        return_type: BuiltinType::Float,
                        parameter,
                    },
                })?;
            }
        }
        Ok(())
    }

    fn define_actions(&mut self, definitions: &ActionDefinitionList) -> SemanticResult<()> {
        for definition in definitions {
            let id = next_id(&mut self.next_action_id, definition.id)?;
            let parameters: Vec<_> = definition.parameters.iter().map(|p| p.ty).collect();
            for name in iter::once(&definition.name).chain(&definition.aliases) {
                self.root.define(Symbol {
                    name: name.clone(),
                    ty: Some(BuiltinType::Action),
                    kind: SymbolKind::Action {
                        id,
                        parameters: parameters.clone(),
                    },
                })?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // BEHAVIOURS
    // ========================================================================

    fn behaviour(&mut self, behaviour: &Behaviour) -> SemanticResult<()> {
        if self.root.lookup(&behaviour.name).is_some() {
            return Err(SemanticError::Redefinition {
                name: behaviour.name.clone(),
            });
        }

        self.scopes.push(SymbolTable::seeded_from(&self.root));
        let result = self
            .behaviour_body(&behaviour.body)
            .and_then(|()| self.behaviour_attributes(&behaviour.attributes));
        let scope = self.scopes.pop().unwrap_or_default();

        self.root.define(Symbol {
            name: behaviour.name.clone(),
            ty: Some(BuiltinType::Behaviour),
            kind: SymbolKind::Behaviour { scope },
        })?;
        result
    }

    fn behaviour_body(&mut self, body: &BehaviourBody) -> SemanticResult<()> {
        self.consts(&body.consts)?;
        if let Some(starter) = &body.starter {
            for assigner in &starter.assigners {
                self.assigner(&assigner.entries)?;
            }
        }
        for packet in &body.packets {
            self.control_packet(packet)?;
        }

        // Every state is declared before any body is checked.
        for (id, state) in body.states.children().iter().enumerate() {
            self.define(Symbol {
                name: state.name.clone(),
                ty: Some(BuiltinType::State),
                kind: SymbolKind::State { id: id as i32 },
            })?;
        }
        for state in &body.states {
            self.state(state)?;
        }
        Ok(())
    }

    fn behaviour_attributes(&self, attributes: &AttributeList) -> SemanticResult<()> {
        for attribute in attributes {
            match attribute {
                Attribute::Priority(number) => expect_integer("Priority", *number)?,
                Attribute::StartFrom(state) => {
                    self.expect_kind(state, "state", |k| matches!(k, SymbolKind::State { .. }))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn consts(&mut self, consts: &ConstDeclarationList) -> SemanticResult<()> {
        for (id, declaration) in consts.children().iter().enumerate() {
            self.define(Symbol::constant(&declaration.name, None, id as u32))?;
        }
        for declaration in const_order(consts)? {
            let ty = self.expr_type(&declaration.value)?;
            if let Some(symbol) = self.current_mut().lookup_mut(&declaration.name) {
                symbol.ty = Some(ty);
            }
        }
        Ok(())
    }

    fn assigner(&self, entries: &AssignList) -> SemanticResult<()> {
        for assign in entries {
            let name = entry_name(assign, "assigner")?;
            if ASSIGNER_ENUMS.contains(&name) {
                self.enum_assign(name, &assign.value)?;
            } else if name == GLOBAL_OBJECT_ID {
                self.check_assign(name, BuiltinType::String, &assign.value)?;
            } else {
                return Err(SemanticError::UnknownEntry {
                    name: name.to_string(),
                    block: "assigner",
                });
            }
        }
        Ok(())
    }

    fn control_packet(&mut self, packet: &ControlPacketDecl) -> SemanticResult<()> {
        self.define(Symbol {
            name: packet.name.clone(),
            ty: Some(BuiltinType::ControlPacket),
            kind: SymbolKind::ControlPacket,
        })?;

        for assign in packet.settings.iter().flatten() {
            let name = entry_name(assign, "settings")?;
            if SettingField::from_name(name).is_some() {
                self.enum_assign(name, &assign.value)?;
            } else if self.root.is_flag_setting(name) {
                self.check_assign(name, BuiltinType::Boolean, &assign.value)?;
            } else {
                return Err(SemanticError::UnknownEntry {
                    name: name.to_string(),
                    block: "settings",
                });
            }
        }

        for assign in packet.data.iter().flatten() {
            let name = entry_name(assign, "data")?;
            let slot = PacketData::from_name(name).ok_or_else(|| SemanticError::UnknownEntry {
                name: name.to_string(),
                block: "data",
            })?;
            let expected = if slot.is_integer() {
                BuiltinType::Integer
            } else {
                BuiltinType::Float
            };
            self.check_assign(name, expected, &assign.value)?;
        }
        Ok(())
    }

    fn state(&self, state: &StateDecl) -> SemanticResult<()> {
        for body in &state.bodies {
            self.state_body(body)?;
        }
        for attribute in &state.attributes {
            match attribute {
                Attribute::UseObjectSlot(slot) => {
                    self.scope().enum_member("ObjectBehaviourSlot", slot)?;
                }
                Attribute::ControlPacket(packet) => {
                    self.expect_kind(packet, "control packet", |k| matches!(k, SymbolKind::ControlPacket))?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn state_body(&self, body: &StateBody) -> SemanticResult<()> {
        self.expect_numeric("interval", &body.interval)?;
        self.expect_numeric("threshold", &body.threshold)?;

        let condition = &body.condition;
        self.expect_kind(&condition.name, "condition", |k| matches!(k, SymbolKind::Condition { .. }))?;
        if let Some(argument) = &condition.argument {
            let found = self.expr_type(argument)?;
            if found != BuiltinType::Integer {
                return Err(SemanticError::TypeMismatch {
                    context: format!("parameter of '{}'", condition.name),
                    expected: BuiltinType::Integer.name().to_string(),
                    found: found.name().to_string(),
                });
            }
        }

        match &body.block {
            StateBlock::Actions(actions) => self.actions(actions),
            StateBlock::Execute(execute) => self
                .expect_kind(&execute.state, "state", |k| matches!(k, SymbolKind::State { .. }))
                .map(|_| ()),
            StateBlock::NoOp => Ok(()),
        }
    }

    fn actions(&self, actions: &ActionList) -> SemanticResult<()> {
        for action in actions {
            self.action_call(action)?;
        }
        Ok(())
    }

    fn action_call(&self, call: &ActionCall) -> SemanticResult<()> {
        let symbol = self.expect_kind(&call.name, "action", |k| matches!(k, SymbolKind::Action { .. }))?;
        let SymbolKind::Action { parameters, .. } = &symbol.kind else {
            return Ok(());
        };
        if parameters.len() != call.arguments.len() {
            return Err(SemanticError::ArgumentCount {
                name: call.name.clone(),
                expected: parameters.len(),
                found: call.arguments.len(),
            });
        }
        for (at, (parameter, argument)) in parameters.iter().zip(&call.arguments).enumerate() {
            let expected = BuiltinType::from(*parameter);
            let found = self.expr_type(argument)?;
            if found != expected {
                return Err(SemanticError::TypeMismatch {
                    context: format!("argument {} of '{}'", at + 1, call.name),
                    expected: expected.name().to_string(),
                    found: found.name().to_string(),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // LIBRARIES
    // ========================================================================

    fn library(&mut self, library: &Library) -> SemanticResult<()> {
        if self.root.lookup(&library.name).is_some() {
            return Err(SemanticError::Redefinition {
                name: library.name.clone(),
            });
        }

        self.scopes.push(SymbolTable::seeded_from(&self.root));
        let result = self.library_body(library);
        let scope = self.scopes.pop().unwrap_or_default();

        self.root.define(Symbol {
            name: library.name.clone(),
            ty: Some(BuiltinType::BehaviourLibrary),
            kind: SymbolKind::BehaviourLibrary { scope },
        })?;
        result
    }

    fn library_body(&mut self, library: &Library) -> SemanticResult<()> {
        for attribute in &library.attributes {
            match attribute {
                Attribute::GlobalIndex(number) => expect_integer("GlobalIndex", *number)?,
                Attribute::InstanceType(key) => {
                    self.scope().enum_member("InstanceType", key)?;
                }
                _ => {}
            }
        }
        for linear in &library.behaviours {
            self.define(Symbol {
                name: linear.name.clone(),
                ty: Some(BuiltinType::Behaviour),
                kind: SymbolKind::LinearBehaviour,
            })?;
            self.actions(&linear.actions)?;
        }
        self.actions(&library.creation)
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    /// Infers the type of an expression.
    pub fn expr_type(&self, expr: &Expr) -> SemanticResult<BuiltinType> {
        match expr {
            Expr::Number(Number::Integer(_)) => Ok(BuiltinType::Integer),
            Expr::Number(Number::Float(_)) => Ok(BuiltinType::Float),
            Expr::String(_) => Ok(BuiltinType::String),
            Expr::Bool(_) => Ok(BuiltinType::Boolean),
            Expr::Const(name) => {
                let symbol = self.expect_kind(name, "const", |k| matches!(k, SymbolKind::Const { .. }))?;
                symbol.ty.ok_or_else(|| SemanticError::UndefinedReference {
                    kind: "const",
                    name: name.clone(),
                })
            }
            Expr::ArrayAccess { name, index } => {
                let symbol = self.expect_kind(name, "array", |k| matches!(k, SymbolKind::Array { .. }))?;
                let index_type = self.expr_type(index)?;
                if index_type != BuiltinType::Integer {
                    return Err(SemanticError::TypeMismatch {
                        context: format!("index of '{name}'"),
                        expected: BuiltinType::Integer.name().to_string(),
                        found: index_type.name().to_string(),
                    });
                }
                match symbol.kind {
                    SymbolKind::Array { storage, .. } => Ok(storage),
                    _ => Ok(BuiltinType::Float),
                }
            }
            Expr::Unary { op, operand } => {
                let ty = self.expr_type(operand)?;
                if ty.is_numeric() {
                    Ok(ty)
                } else {
                    Err(SemanticError::InvalidUnaryOperand {
                        op: unary_symbol(*op),
                        operand: ty.name().to_string(),
                    })
                }
            }
            Expr::Binary { op, left, right } => binary_type(*op, self.expr_type(left)?, self.expr_type(right)?),
        }
    }

    /// Integers may be assigned to floats; everything else must match exactly.
    fn check_assign(&self, context: &str, expected: BuiltinType, value: &Expr) -> SemanticResult<()> {
        let found = self.expr_type(value)?;
        if found == expected || (expected == BuiltinType::Float && found == BuiltinType::Integer) {
            Ok(())
        } else {
            Err(SemanticError::TypeMismatch {
                context: context.to_string(),
                expected: expected.name().to_string(),
                found: found.name().to_string(),
            })
        }
    }

    /// Right-hand side must name a member of the enum `enum_name`.
    fn enum_assign(&self, enum_name: &str, value: &Expr) -> SemanticResult<()> {
        match value {
            Expr::Const(member) => self.scope().enum_member(enum_name, member).map(|_| ()),
            other => Err(SemanticError::TypeMismatch {
                context: enum_name.to_string(),
                expected: format!("{enum_name} member"),
                found: self.expr_type(other)?.name().to_string(),
            }),
        }
    }

    fn expect_numeric(&self, context: &str, expr: &Expr) -> SemanticResult<()> {
        let found = self.expr_type(expr)?;
        if found.is_numeric() {
            Ok(())
        } else {
            Err(SemanticError::TypeMismatch {
                context: context.to_string(),
                expected: "number".to_string(),
                found: found.name().to_string(),
            })
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn next_id(counter: &mut u32, explicit: Option<i32>) -> SemanticResult<u16> {
    let requested = explicit.map(i64::from).unwrap_or(i64::from(*counter));
    let id = u16::try_from(requested).map_err(|_| SemanticError::OutOfRange {
        value: requested.to_string(),
        target: "u16",
    })?;
    *counter = u32::from(id) + 1;
    Ok(id)
}

fn expect_integer(context: &str, number: Number) -> SemanticResult<()> {
    match number {
        Number::Integer(_) => Ok(()),
        Number::Float(_) => Err(SemanticError::TypeMismatch {
            context: context.to_string(),
            expected: BuiltinType::Integer.name().to_string(),
            found: BuiltinType::Float.name().to_string(),
        }),
    }
}

/// Settings, data and assigner entries are plain names.
fn entry_name<'a>(assign: &'a Assign, block: &'static str) -> SemanticResult<&'a str> {
    match &assign.target {
        AssignTarget::Const(name) => Ok(name),
        AssignTarget::Element { name, .. } => Err(SemanticError::UnknownEntry {
            name: format!("{name}[..]"),
            block,
        }),
    }
}

pub(crate) fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
    }
}

/// Result type of a binary operation.
pub fn binary_type(op: BinaryOp, left: BuiltinType, right: BuiltinType) -> SemanticResult<BuiltinType> {
    use BuiltinType::*;

    match (left, right) {
        (String, String) if op == BinaryOp::Add => Ok(String),
        (l, r) if l.is_numeric() && r.is_numeric() => Ok(if l == Float || r == Float { Float } else { Integer }),
        _ => Err(SemanticError::InvalidOperands {
            op: op.symbol(),
            left: left.name().to_string(),
            right: right.name().to_string(),
        }),
    }
}

/// Const declarations in dependency order. Consts may reference ones declared
/// later in the same list; a cycle is an error.
pub fn const_order(consts: &ConstDeclarationList) -> SemanticResult<Vec<&ConstDeclaration>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        declaration: &'a ConstDeclaration,
        by_name: &HashMap<&'a str, &'a ConstDeclaration>,
        marks: &mut HashMap<&'a str, Mark>,
        order: &mut Vec<&'a ConstDeclaration>,
    ) -> SemanticResult<()> {
        match marks.get(declaration.name.as_str()) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(SemanticError::ConstCycle {
                    name: declaration.name.clone(),
                })
            }
            None => {}
        }
        marks.insert(&declaration.name, Mark::Visiting);
        for dependency in declaration.value.referenced_consts() {
            if let Some(next) = by_name.get(dependency) {
                visit(next, by_name, marks, order)?;
            }
        }
        marks.insert(&declaration.name, Mark::Done);
        order.push(declaration);
        Ok(())
    }

    let by_name: HashMap<&str, &ConstDeclaration> = consts
        .children()
        .iter()
        .map(|declaration| (declaration.name.as_str(), declaration))
        .collect();
    let mut marks = HashMap::new();
    let mut order = Vec::with_capacity(consts.len());
    for declaration in consts {
        visit(declaration, &by_name, &mut marks, &mut order)?;
    }
    Ok(order)
}
