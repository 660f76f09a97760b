//! Decompiler: bytecode objects back to AgentLab source
//!
//! Each object kind writes its own text directly, in the shape the parser
//! reads back. The resolver supplies names for the numeric ids embedded in
//! the bytecode.

use crate::compiler::CompilerResult;
use crate::error::{DecompileError, DecompileResult};
use agentlab_core::{
    reserved_link_name, Command, CommandPack, CommandsSequence, ControlPacket, DataValue, DecompilerResolver,
    GameReservedId, Graph, ObjectBehaviourSlot, PacketData, ParamType, SettingField, Starter, State, StateBody,
    FLAG_SETTINGS, NO_GLOBAL_OBJECT,
};
use tracing::debug;

const INDENT: &str = "    ";

/// A bytecode object that can be written as AgentLab source.
pub trait Decompile {
    fn decompile(&self, resolver: &dyn DecompilerResolver) -> DecompileResult<String>;
}

pub fn decompile<T: Decompile + ?Sized>(object: &T, resolver: &dyn DecompilerResolver) -> DecompileResult<String> {
    object.decompile(resolver)
}

/// Text of one registered object. A failure only affects its own entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompiledObject {
    pub kind: &'static str,
    pub text: DecompileResult<String>,
}

/// Decompiles every graph, library and command pack in `result`.
pub fn decompile_result(result: &CompilerResult, resolver: &dyn DecompilerResolver) -> Vec<DecompiledObject> {
    let mut objects = Vec::new();
    if let Some(graph) = result.get::<Graph>() {
        objects.push(DecompiledObject {
            kind: "graph",
            text: graph.decompile(resolver),
        });
    }
    if let Some(sequence) = result.get::<CommandsSequence>() {
        objects.push(DecompiledObject {
            kind: "library",
            text: sequence.decompile(resolver),
        });
    }
    if let Some(pack) = result.get::<CommandPack>() {
        objects.push(DecompiledObject {
            kind: "command pack",
            text: pack.decompile(resolver),
        });
    }
    debug!(
        objects = objects.len(),
        failed = objects.iter().filter(|o| o.text.is_err()).count(),
        "decompiled result"
    );
    objects
}

fn line(out: &mut String, indent: usize, text: &str) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

/// Shortest round-trip text, always with a decimal point.
pub fn float_literal(value: f32) -> DecompileResult<String> {
    if !value.is_finite() {
        return Err(DecompileError::NonFiniteFloat { bits: value.to_bits() });
    }
    let text = format!("{value:?}");
    if text.contains('.') {
        Ok(text)
    } else if let Some(at) = text.find('e') {
        Ok(format!("{}.0{}", &text[..at], &text[at..]))
    } else {
        Ok(format!("{text}.0"))
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn argument(name: &str, ty: ParamType, word: u32) -> DecompileResult<String> {
    match ty {
        ParamType::Float => float_literal(f32::from_bits(word)),
        ParamType::Int => Ok((word as i32).to_string()),
        ParamType::Bool => match word {
            0 => Ok("false".to_string()),
            1 => Ok("true".to_string()),
            _ => Err(DecompileError::NotBoolean {
                name: name.to_string(),
                word,
            }),
        },
    }
}

fn command_text(command: &Command, resolver: &dyn DecompilerResolver) -> DecompileResult<String> {
    let signature = resolver
        .action(command.index)
        .ok_or(DecompileError::UnnamedAction { index: command.index })?;
    if signature.parameters.len() != command.arguments.len() {
        return Err(DecompileError::ArgumentCount {
            name: signature.name,
            expected: signature.parameters.len(),
            found: command.arguments.len(),
        });
    }
    let arguments = signature
        .parameters
        .iter()
        .zip(&command.arguments)
        .map(|(ty, word)| argument(&signature.name, *ty, *word))
        .collect::<DecompileResult<Vec<_>>>()?;
    Ok(format!("{}({});", signature.name, arguments.join(", ")))
}

fn write_commands(
    out: &mut String,
    indent: usize,
    commands: &[Command],
    resolver: &dyn DecompilerResolver,
) -> DecompileResult<()> {
    for command in commands {
        line(out, indent, &command_text(command, resolver)?);
    }
    Ok(())
}

impl Decompile for CommandPack {
    fn decompile(&self, resolver: &dyn DecompilerResolver) -> DecompileResult<String> {
        let mut out = String::new();
        write_commands(&mut out, 0, &self.commands, resolver)?;
        Ok(out)
    }
}

// ============================================================================
// GRAPHS
// ============================================================================

fn state_name(graph: &Graph, index: usize) -> String {
    match graph.states.get(index) {
        Some(state) if !state.name.is_empty() => state.name.clone(),
        _ => format!("State_{index}"),
    }
}

fn packet_name(index: usize) -> String {
    format!("ControlPacket_{index}")
}

impl Decompile for Graph {
    fn decompile(&self, resolver: &dyn DecompilerResolver) -> DecompileResult<String> {
        let mut out = String::new();
        line(&mut out, 0, &format!("[Priority({})]", self.priority));
        if self.start_state != 0 {
            let start = usize::try_from(self.start_state)
                .ok()
                .filter(|at| *at < self.states.len())
                .ok_or(DecompileError::MissingJumpTarget {
                    target: self.start_state,
                })?;
            line(&mut out, 0, &format!("[StartFrom({})]", state_name(self, start)));
        }
        line(&mut out, 0, &format!("behaviour {} {{", self.name));

        if let Some(starter) = resolver.starter() {
            write_starter(&mut out, starter, resolver);
        }
        for (at, state) in self.states.iter().enumerate() {
            if let Some(packet) = &state.control_packet {
                write_packet(&mut out, &packet_name(at), packet)?;
            }
        }
        for (at, state) in self.states.iter().enumerate() {
            write_state(&mut out, self, at, state, resolver)?;
        }

        line(&mut out, 0, "}");
        Ok(out)
    }
}

fn write_starter(out: &mut String, starter: &Starter, resolver: &dyn DecompilerResolver) {
    line(out, 1, "starter {");
    for assigner in &starter.assigners {
        line(out, 2, "assigner = {");
        line(out, 3, &format!("AssignType = {};", assigner.assign_type));
        line(out, 3, &format!("AssignLocality = {};", assigner.locality));
        line(out, 3, &format!("AssignStatus = {};", assigner.status));
        line(out, 3, &format!("AssignPreference = {};", assigner.preference));
        if assigner.global_object_id != NO_GLOBAL_OBJECT {
            let name = resolver
                .global_object_name(assigner.global_object_id)
                .unwrap_or_else(|| assigner.global_object_id.to_string());
            line(out, 3, &format!("GlobalObjectId = \"{name}\";"));
        }
        line(out, 2, "}");
    }
    line(out, 1, "}");
}

fn write_packet(out: &mut String, name: &str, packet: &ControlPacket) -> DecompileResult<()> {
    line(out, 1, &format!("packet {name} {{"));

    line(out, 2, "settings {");
    for field in SettingField::ALL {
        let value = packet.field(field);
        let member = field.member_name(value).ok_or(DecompileError::UnknownSettingValue {
            field: field.name(),
            value,
        })?;
        line(out, 3, &format!("{} = {};", field.name(), member));
    }
    let flags = packet.flags();
    for (setting, flag) in FLAG_SETTINGS {
        line(out, 3, &format!("{} = {};", setting, flags.contains(flag)));
    }
    line(out, 2, "}");

    // Ordered by byte value so float-table entries come back in table order.
    let mut entries = Vec::new();
    for slot in PacketData::ALL.iter().copied() {
        let text = match packet.data(slot) {
            DataValue::Unset => continue,
            DataValue::InstanceFloat(index) => format!("InstanceFloat[{index}]"),
            DataValue::Word { word: None, index } => {
                return Err(DecompileError::FloatIndexOutOfRange {
                    slot: slot.name(),
                    index,
                    len: packet.floats.len(),
                })
            }
            DataValue::Word { word: Some(word), .. } if slot.is_integer() => (word as i32).to_string(),
            DataValue::Word { word: Some(word), .. } => float_literal(f32::from_bits(word))?,
        };
        entries.push((packet.bytes[slot.value() as usize], slot, text));
    }
    entries.sort_by_key(|(byte, _, _)| *byte);

    if !entries.is_empty() {
        line(out, 2, "data {");
        for (_, slot, text) in entries {
            line(out, 3, &format!("{} = {};", slot.name(), text));
        }
        line(out, 2, "}");
    }

    line(out, 1, "}");
    Ok(())
}

fn write_state(
    out: &mut String,
    graph: &Graph,
    at: usize,
    state: &State,
    resolver: &dyn DecompilerResolver,
) -> DecompileResult<()> {
    if state.non_blocking {
        line(out, 1, "[NonBlocking]");
    }
    if state.skips_first_body {
        line(out, 1, "[SkipFirstBody]");
    }
    let mut reference = String::new();
    if state.uses_object_slot {
        let slot = u8::try_from(state.behaviour_index_or_slot)
            .ok()
            .and_then(ObjectBehaviourSlot::new)
            .ok_or(DecompileError::UnknownObjectSlot {
                index: state.behaviour_index_or_slot,
            })?;
        line(out, 1, &format!("[UseObjectSlot({slot})]"));
    } else if state.behaviour_index_or_slot != -1 {
        reference = format!("\"{}\"", behaviour_reference(i32::from(state.behaviour_index_or_slot), resolver));
    }
    if state.control_packet.is_some() {
        line(out, 1, &format!("[ControlPacket({})]", packet_name(at)));
    }

    line(out, 1, &format!("state {}({}) {{", state_name(graph, at), reference));
    for body in &state.bodies {
        write_body(out, graph, body, resolver)?;
    }
    line(out, 1, "}");
    Ok(())
}

/// Inverse of the compiler's reserved-then-resolver lookup.
fn behaviour_reference(id: i32, resolver: &dyn DecompilerResolver) -> String {
    reserved_link_name(id, resolver.associated_sequence(), resolver.known_sequences())
        .or_else(|| resolver.graph_name(id))
        .unwrap_or_else(|| id.to_string())
}

fn write_body(out: &mut String, graph: &Graph, body: &StateBody, resolver: &dyn DecompilerResolver) -> DecompileResult<()> {
    let condition = &body.condition;
    let name = resolver
        .condition_name(condition.index)
        .ok_or(DecompileError::UnnamedCondition { index: condition.index })?;
    let comparison = if condition.not_gate { "<=" } else { ">=" };
    line(
        out,
        2,
        &format!(
            "if {}({}) {} {} {{",
            name,
            condition.parameter,
            comparison,
            float_literal(condition.return_check)?
        ),
    );
    line(out, 3, &format!("interval = {};", float_literal(condition.check_interval)?));
    line(out, 3, &format!("Unknown = {};", body.unknown_flag));

    if body.has_state_jump {
        let target = usize::try_from(body.jump_to_state)
            .ok()
            .filter(|at| *at < graph.states.len())
            .ok_or(DecompileError::MissingJumpTarget {
                target: body.jump_to_state,
            })?;
        line(out, 3, &format!("execute {};", state_name(graph, target)));
    } else {
        write_commands(out, 3, &body.commands, resolver)?;
    }

    line(out, 2, "}");
    Ok(())
}

// ============================================================================
// LIBRARIES
// ============================================================================

fn link_name(id: u16, resolver: &dyn DecompilerResolver) -> String {
    match GameReservedId::from_value(id) {
        Some(reserved) => reserved.name().to_string(),
        None => resolver
            .graph_name(i32::from(id))
            .unwrap_or_else(|| CommandsSequence::link_name(id)),
    }
}

impl Decompile for CommandsSequence {
    fn decompile(&self, resolver: &dyn DecompilerResolver) -> DecompileResult<String> {
        let mut out = String::new();
        line(&mut out, 0, &format!("[GlobalIndex({})]", self.index_in_global_storage));
        line(&mut out, 0, &format!("[InstanceType({})]", self.key));
        let name = if self.name.is_empty() {
            format!("Library_{}", self.index_in_global_storage)
        } else {
            self.name.clone()
        };
        line(&mut out, 0, &format!("library {name} {{"));
        for pack in &self.behaviour_packs {
            line(&mut out, 1, &format!("behaviour {} {{", link_name(pack.id, resolver)));
            write_commands(&mut out, 2, &pack.pack.commands, resolver)?;
            line(&mut out, 1, "}");
        }
        write_commands(&mut out, 1, &self.commands, resolver)?;
        line(&mut out, 0, "}");
        Ok(out)
    }
}
