//! Code generation: the second walk over a checked AST

use super::memory::{AgentLabMemory, Stored};
use super::value::{self, Value};
use super::{CompilerOptions, CompilerResult};
use crate::error::{CompileError, CompileResult, SemanticError};
use crate::parser::{self as ast, AttributeList, Ast, Attribute, Expr, Number, OrderedChildren};
use crate::symbols::{const_order, Scope, Symbol, SymbolKind, SymbolTable, GLOBAL_OBJECT_ID, INSTANCE_FLOAT};
use agentlab_core::{
    flag_setting, reserved_link_id, AssignLocality, AssignPreference, AssignStatus, AssignType, Assigner,
    BehaviourPack, Command, CommandPack, CommandsSequence, ControlPacket, GameReservedId, Graph, InstanceType,
    PacketData, ResolveError, SettingField, Starter, State, StateBody, INSTANCE_FLOAT_COUNT, NO_GLOBAL_OBJECT,
};
use tracing::{trace, warn};

/// Lowers one script. Consumed by [`CodeGenerator::compile`].
pub struct CodeGenerator<'a> {
    symbols: &'a SymbolTable,
    /// Table of the behaviour or library being compiled; the root otherwise.
    scope: &'a SymbolTable,
    options: &'a CompilerOptions<'a>,
    memory: AgentLabMemory,
    result: CompilerResult,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(symbols: &'a SymbolTable, options: &'a CompilerOptions<'a>) -> Self {
        Self {
            symbols,
            scope: symbols,
            options,
            memory: AgentLabMemory::new(),
            result: CompilerResult::new(),
        }
    }

    pub fn compile(mut self, ast: &Ast) -> CompileResult<CompilerResult> {
        match ast {
            Ast::Behaviour(behaviour) => {
                let graph = self.behaviour(behaviour)?;
                self.result.add(graph);
            }
            Ast::Library(library) => {
                let sequence = self.library(library)?;
                self.result.add(sequence);
            }
            Ast::ActionList(actions) => {
                self.commands(actions)?;
            }
            // Definitions only add symbols.
            Ast::Actions(_) | Ast::Conditions(_) => {}
        }
        Ok(self.result)
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    fn enter(&mut self, name: &str) -> CompileResult<()> {
        self.scope = self
            .symbols
            .lookup(name)
            .and_then(Symbol::scope)
            .ok_or_else(|| SemanticError::UndefinedReference {
                kind: "scope",
                name: name.to_string(),
            })?;
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&'a Symbol> {
        Scope::new(self.symbols, self.scope).lookup(name)
    }

    fn undefined(kind: &'static str, name: &str) -> CompileError {
        SemanticError::UndefinedReference {
            kind,
            name: name.to_string(),
        }
        .into()
    }

    fn action_id(&self, name: &str) -> CompileResult<u16> {
        match self.lookup(name).map(|symbol| &symbol.kind) {
            Some(SymbolKind::Action { id, .. }) => Ok(*id),
            _ => Err(Self::undefined("action", name)),
        }
    }

    fn condition_id(&self, name: &str) -> CompileResult<u16> {
        match self.lookup(name).map(|symbol| &symbol.kind) {
            Some(SymbolKind::Condition { id, .. }) => Ok(*id),
            _ => Err(Self::undefined("condition", name)),
        }
    }

    fn state_id(&self, name: &str) -> CompileResult<i32> {
        self.lookup(name)
            .and_then(Symbol::state_id)
            .ok_or_else(|| Self::undefined("state", name))
    }

    /// Value of the member named by `value` in the enum `enum_name`.
    fn enum_value(&self, enum_name: &str, value: &Expr) -> CompileResult<u32> {
        match value {
            Expr::Const(member) => Ok(Scope::new(self.symbols, self.scope).enum_member(enum_name, member)?),
            other => Err(SemanticError::TypeMismatch {
                context: enum_name.to_string(),
                expected: format!("{enum_name} member"),
                found: self.eval(other)?.ty().name().to_string(),
            }
            .into()),
        }
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn eval(&self, expr: &Expr) -> CompileResult<Value> {
        let value = match expr {
            Expr::Number(Number::Integer(v)) => Value::Int(*v),
            Expr::Number(Number::Float(v)) => Value::Float(*v),
            Expr::String(v) => Value::Str(v.clone()),
            Expr::Bool(v) => Value::Bool(*v),
            Expr::Const(name) => self
                .memory
                .value(name)
                .cloned()
                .ok_or_else(|| Self::undefined("const", name))?,
            Expr::ArrayAccess { name, .. } => {
                return Err(SemanticError::TypeMismatch {
                    context: format!("'{name}'"),
                    expected: "constant value".to_string(),
                    found: "array element".to_string(),
                }
                .into())
            }
            Expr::Unary { op, operand } => value::unary(*op, self.eval(operand)?)?,
            Expr::Binary { op, left, right } => value::binary(*op, self.eval(left)?, self.eval(right)?)?,
        };
        Ok(value)
    }

    fn number(&self, context: &str, expr: &Expr) -> CompileResult<f32> {
        let value = self.eval(expr)?;
        value.as_f32().ok_or_else(|| mismatch(context, "number", &value))
    }

    fn integer(&self, context: &str, expr: &Expr) -> CompileResult<i32> {
        let value = self.eval(expr)?;
        value.as_i32().ok_or_else(|| mismatch(context, "IntegerType", &value))
    }

    fn consts(&mut self, consts: &ast::ConstDeclarationList) -> CompileResult<()> {
        for declaration in const_order(consts)? {
            let value = self.eval(&declaration.value)?;
            trace!(name = %declaration.name, %value, "folded const");
            self.memory.add(&declaration.name, Stored::Value(value))?;
        }
        Ok(())
    }

    // ========================================================================
    // BEHAVIOURS
    // ========================================================================

    fn behaviour(&mut self, behaviour: &ast::Behaviour) -> CompileResult<Graph> {
        self.enter(&behaviour.name)?;
        warn_duplicates("behaviour", &behaviour.name, &behaviour.attributes);

        let mut graph = self.options.descs.graph.construct();
        graph.name = behaviour.name.clone();
        for attribute in &behaviour.attributes {
            match attribute {
                Attribute::Priority(number) => graph.priority = literal("Priority", "u8", *number)?,
                Attribute::StartFrom(state) => graph.start_state = self.state_id(state)?,
                _ => {}
            }
        }

        let body = &behaviour.body;
        self.consts(&body.consts)?;
        for packet in &body.packets {
            let compiled = self.control_packet(packet)?;
            self.memory.add(&packet.name, Stored::Packet(compiled))?;
        }
        for state in &body.states {
            let compiled = self.state(state)?;
            graph.states.push(compiled);
        }

        if let Some(starter) = &body.starter {
            let starter = self.starter(starter, &graph)?;
            self.result.add(starter);
        }
        trace!(graph = %graph.name, states = graph.states.len(), "compiled behaviour");
        Ok(graph)
    }

    fn starter(&self, decl: &ast::StarterDecl, graph: &Graph) -> CompileResult<Starter> {
        let reference = self.options.resolver.resolve_graph_reference(&graph.name)?;
        let behaviour = reference.checked_add(1).ok_or_else(|| SemanticError::OutOfRange {
            value: reference.to_string(),
            target: "i32",
        })?;

        let mut starter = Starter {
            priority: graph.priority,
            assigners: Vec::with_capacity(decl.assigners.len()),
        };
        for block in &decl.assigners {
            let mut assigner = Assigner {
                behaviour,
                ..Assigner::default()
            };
            for assign in &block.entries {
                let name = assign.target.name();
                match name {
                    "AssignType" => {
                        assigner.assign_type = member(name, self.enum_value(name, &assign.value)?, AssignType::from_value)?
                    }
                    "AssignLocality" => {
                        assigner.locality = member(name, self.enum_value(name, &assign.value)?, AssignLocality::from_value)?
                    }
                    "AssignStatus" => {
                        assigner.status = member(name, self.enum_value(name, &assign.value)?, AssignStatus::from_value)?
                    }
                    "AssignPreference" => {
                        assigner.preference =
                            member(name, self.enum_value(name, &assign.value)?, AssignPreference::from_value)?
                    }
                    GLOBAL_OBJECT_ID => assigner.global_object_id = self.global_object(&assign.value)?,
                    _ => {
                        return Err(SemanticError::UnknownEntry {
                            name: name.to_string(),
                            block: "assigner",
                        }
                        .into())
                    }
                }
            }
            starter.assigners.push(assigner);
        }
        Ok(starter)
    }

    fn global_object(&self, value: &Expr) -> CompileResult<u16> {
        match self.eval(value)? {
            Value::Str(name) if name.is_empty() => Ok(NO_GLOBAL_OBJECT),
            Value::Str(name) => Ok(self.options.resolver.resolve_global_object_id(&name)?),
            other => Err(mismatch(GLOBAL_OBJECT_ID, "StringType", &other)),
        }
    }

    fn control_packet(&self, decl: &ast::ControlPacketDecl) -> CompileResult<ControlPacket> {
        let mut packet = ControlPacket::new();

        for assign in decl.settings.iter().flatten() {
            let name = assign.target.name();
            if let Some(field) = SettingField::from_name(name) {
                packet.set_field(field, self.enum_value(name, &assign.value)?);
            } else if let Some(flag) = flag_setting(name) {
                match self.eval(&assign.value)? {
                    Value::Bool(enabled) => packet.set_flag(flag, enabled),
                    other => return Err(mismatch(name, "BooleanType", &other)),
                }
            } else {
                return Err(SemanticError::UnknownEntry {
                    name: name.to_string(),
                    block: "settings",
                }
                .into());
            }
        }

        for assign in decl.data.iter().flatten() {
            let name = assign.target.name();
            let slot = PacketData::from_name(name).ok_or_else(|| SemanticError::UnknownEntry {
                name: name.to_string(),
                block: "data",
            })?;
            match &assign.value {
                Expr::ArrayAccess { name: array, index } if array == INSTANCE_FLOAT => {
                    let index = self.integer(array, index)?;
                    let index = u8::try_from(index)
                        .ok()
                        .filter(|index| *index < INSTANCE_FLOAT_COUNT)
                        .ok_or_else(|| SemanticError::IndexOutOfBounds {
                            name: array.clone(),
                            index: i64::from(index),
                            size: usize::from(INSTANCE_FLOAT_COUNT),
                        })?;
                    packet.set_data_instance_float(slot, index);
                }
                value => {
                    let value = self.eval(value)?;
                    let word = match (&value, slot.is_integer()) {
                        (Value::Int(v), true) => *v as u32,
                        (_, false) => value
                            .as_f32()
                            .map(f32::to_bits)
                            .ok_or_else(|| mismatch(name, "FloatType", &value))?,
                        (_, true) => return Err(mismatch(name, "IntegerType", &value)),
                    };
                    packet.set_data_word(slot, word);
                }
            }
        }

        trace!(packet = %decl.name, settings = packet.settings, floats = packet.floats.len(), "compiled control packet");
        Ok(packet)
    }

    fn state(&mut self, decl: &ast::StateDecl) -> CompileResult<State> {
        warn_duplicates("state", &decl.name, &decl.attributes);

        let mut state = self.options.descs.state.construct();
        state.name = decl.name.clone();

        for attribute in &decl.attributes {
            match attribute {
                Attribute::NonBlocking => state.non_blocking = true,
                Attribute::SkipFirstBody => state.skips_first_body = true,
                Attribute::UseObjectSlot(name) => {
                    let slot = self.options.resolver.resolve_object_slot(name)?;
                    state.uses_object_slot = true;
                    state.behaviour_index_or_slot = i16::from(slot.index());
                }
                Attribute::ControlPacket(name) => {
                    let packet = self
                        .memory
                        .packet(name)
                        .cloned()
                        .ok_or_else(|| Self::undefined("control packet", name))?;
                    state.control_packet = Some(packet);
                }
                _ => {}
            }
        }

        // The reference is never resolved for a state bound to an object slot.
        if let Some(reference) = decl.behaviour_ref.as_deref().filter(|_| !state.uses_object_slot) {
            state.behaviour_index_or_slot = self.behaviour_reference(reference)?;
        }

        for body in &decl.bodies {
            let compiled = self.state_body(body)?;
            state.bodies.push(compiled);
        }
        trace!(state = %state.name, bodies = state.bodies.len(), bitfield = state.bitfield(), "compiled state");
        Ok(state)
    }

    /// Reserved names go through the library link tables before the resolver.
    fn behaviour_reference(&self, name: &str) -> CompileResult<i16> {
        let resolver = self.options.resolver;
        let id = match reserved_link_id(name, resolver.associated_sequence(), resolver.known_sequences()) {
            Some(id) => i64::from(id),
            None => i64::from(resolver.resolve_graph_reference(name)?),
        };
        i16::try_from(id).map_err(|_| {
            ResolveError::OutOfRange {
                name: name.to_string(),
                id,
                width: "i16",
            }
            .into()
        })
    }

    fn state_body(&mut self, body: &ast::StateBody) -> CompileResult<StateBody> {
        let mut compiled = self.options.descs.state_body.construct();

        let condition = &body.condition;
        compiled.condition.index = self.condition_id(&condition.name)?;
        if let Some(argument) = &condition.argument {
            let parameter = self.integer(&condition.name, argument)?;
            compiled.condition.parameter = u16::try_from(parameter).map_err(|_| SemanticError::OutOfRange {
                value: parameter.to_string(),
                target: "u16",
            })?;
        }
        compiled.condition.check_interval = self.number("interval", &body.interval)?;
        compiled.condition.return_check = self.number("threshold", &body.threshold)?;
        compiled.condition.not_gate = body.not_gate;
        compiled.unknown_flag = body.unknown;

        match &body.block {
            ast::StateBlock::Actions(actions) => compiled.commands = self.commands(actions)?,
            ast::StateBlock::Execute(execute) => {
                compiled.jump_to_state = self.state_id(&execute.state)?;
                compiled.has_state_jump = true;
            }
            ast::StateBlock::NoOp => {}
        }
        Ok(compiled)
    }

    // ========================================================================
    // COMMANDS AND LIBRARIES
    // ========================================================================

    /// Compiles an action list. The first list of a script also becomes the
    /// result's [`CommandPack`].
    fn commands(&mut self, actions: &ast::ActionList) -> CompileResult<Vec<Command>> {
        let commands = actions
            .children()
            .iter()
            .map(|call| self.command(call))
            .collect::<CompileResult<Vec<_>>>()?;

        if !self.result.contains::<CommandPack>() {
            let mut pack = self.options.descs.command_pack.construct();
            pack.commands = commands.clone();
            self.result.add(pack);
        }
        Ok(commands)
    }

    fn command(&self, call: &ast::ActionCall) -> CompileResult<Command> {
        let mut command = self.options.descs.command.construct();
        command.index = self.action_id(&call.name)?;
        for argument in &call.arguments {
            let value = self.eval(argument)?;
            let word = value
                .word()
                .ok_or_else(|| mismatch(&call.name, "number or boolean", &value))?;
            command.arguments.push(word);
        }
        trace!(action = %call.name, index = command.index, arguments = command.arguments.len(), "compiled command");
        Ok(command)
    }

    fn library(&mut self, library: &ast::Library) -> CompileResult<CommandsSequence> {
        self.enter(&library.name)?;
        warn_duplicates("library", &library.name, &library.attributes);

        let mut sequence = self.options.descs.commands_sequence.construct();
        sequence.name = library.name.clone();
        for attribute in &library.attributes {
            match attribute {
                Attribute::GlobalIndex(number) => {
                    sequence.index_in_global_storage = literal("GlobalIndex", "u8", *number)?
                }
                Attribute::InstanceType(key) => {
                    sequence.key = InstanceType::from_name(key).ok_or_else(|| SemanticError::UnknownEnumMember {
                        enum_name: "InstanceType".to_string(),
                        member: key.clone(),
                    })?
                }
                _ => {}
            }
        }

        for linear in &library.behaviours {
            let id = self.linear_behaviour_id(&linear.name)?;
            let mut pack = self.options.descs.command_pack.construct();
            pack.commands = self.commands(&linear.actions)?;
            sequence.behaviour_packs.push(BehaviourPack { id, pack });
        }
        sequence.commands = self.commands(&library.creation)?;

        trace!(library = %sequence.name, header = sequence.header(), "compiled library");
        Ok(sequence)
    }

    /// Reserved names carry their own id. Other names go to the resolver, with
    /// `Behaviour_{id}` accepted for ids it has no name for.
    fn linear_behaviour_id(&self, name: &str) -> CompileResult<u16> {
        if let Some(reserved) = GameReservedId::from_name(name) {
            return Ok(reserved.value());
        }
        match self.options.resolver.resolve_graph_reference(name) {
            Ok(id) => u16::try_from(id).map_err(|_| {
                ResolveError::OutOfRange {
                    name: name.to_string(),
                    id: i64::from(id),
                    width: "u16",
                }
                .into()
            }),
            Err(error) => name
                .strip_prefix("Behaviour_")
                .and_then(|id| id.parse().ok())
                .ok_or_else(|| CompileError::from(error)),
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn mismatch(context: &str, expected: &str, found: &Value) -> CompileError {
    SemanticError::TypeMismatch {
        context: context.to_string(),
        expected: expected.to_string(),
        found: found.ty().name().to_string(),
    }
    .into()
}

fn member<T>(enum_name: &str, value: u32, from_value: fn(u32) -> Option<T>) -> CompileResult<T> {
    from_value(value).ok_or_else(|| {
        SemanticError::UnknownEnumMember {
            enum_name: enum_name.to_string(),
            member: value.to_string(),
        }
        .into()
    })
}

/// Integer attribute argument narrowed to `T`.
fn literal<T: TryFrom<i32>>(context: &str, target: &'static str, number: Number) -> CompileResult<T> {
    match number {
        Number::Integer(v) => T::try_from(v).map_err(|_| {
            SemanticError::OutOfRange {
                value: v.to_string(),
                target,
            }
            .into()
        }),
        Number::Float(v) => Err(mismatch(context, "IntegerType", &Value::Float(v))),
    }
}

fn warn_duplicates(declaration: &'static str, owner: &str, attributes: &AttributeList) {
    let mut seen: Vec<&str> = Vec::new();
    for attribute in attributes {
        let name = attribute.name();
        if seen.contains(&name) {
            warn!(declaration, owner, attribute = name, "duplicate attribute overrides the earlier one");
        } else {
            seen.push(name);
        }
    }
}
