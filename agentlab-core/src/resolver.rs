//! Resolvers map between script names and the numeric id space of a loaded level

use crate::{named_enum, CommandsSequence, GameReservedId, ObjectBehaviourSlot, ResolveError, ResolveResult, Starter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

named_enum! {
    /// Parameter types allowed in action and condition definitions.
    pub enum ParamType: u8 {
        Bool = "bool" => 0,
        Int = "int" => 1,
        Float = "float" => 2,
    }
}

/// Name and parameter shape of a catalog action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSignature {
    pub name: String,
    pub parameters: Vec<ParamType>,
}

impl ActionSignature {
    pub fn new(name: impl Into<String>, parameters: Vec<ParamType>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Name-to-id lookups used while compiling.
pub trait CompilerResolver {
    fn resolve_graph_reference(&self, name: &str) -> ResolveResult<i32>;

    fn resolve_global_object_id(&self, name: &str) -> ResolveResult<u16>;

    fn resolve_object_slot(&self, name: &str) -> ResolveResult<ObjectBehaviourSlot> {
        ObjectBehaviourSlot::from_name(name).ok_or_else(|| ResolveError::UnknownObjectSlot {
            name: name.to_string(),
        })
    }

    /// Library the script being compiled belongs to, if any.
    fn associated_sequence(&self) -> Option<&CommandsSequence> {
        None
    }

    /// Every library loaded in the level.
    fn known_sequences(&self) -> &[CommandsSequence] {
        &[]
    }
}

/// Id-to-name lookups used while decompiling.
pub trait DecompilerResolver {
    fn graph_name(&self, id: i32) -> Option<String>;

    fn global_object_name(&self, id: u16) -> Option<String>;

    fn condition_name(&self, index: u16) -> Option<String>;

    fn action(&self, index: u16) -> Option<ActionSignature>;

    /// Starter to embed when decompiling a graph.
    fn starter(&self) -> Option<&Starter> {
        None
    }

    fn associated_sequence(&self) -> Option<&CommandsSequence> {
        None
    }

    fn known_sequences(&self) -> &[CommandsSequence] {
        &[]
    }
}

/// Resolves a reserved behaviour name through the associated library first,
/// then any known library.
pub fn reserved_link_id(
    name: &str,
    associated: Option<&CommandsSequence>,
    known: &[CommandsSequence],
) -> Option<u16> {
    GameReservedId::from_name(name)?;
    associated
        .and_then(|sequence| sequence.link_id(name))
        .or_else(|| known.iter().find_map(|sequence| sequence.link_id(name)))
}

/// Inverse of [`reserved_link_id`].
pub fn reserved_link_name(
    id: i32,
    associated: Option<&CommandsSequence>,
    known: &[CommandsSequence],
) -> Option<String> {
    if !GameReservedId::contains(id) {
        return None;
    }
    let id = u16::try_from(id).ok()?;
    associated
        .and_then(|sequence| sequence.link_name_of(id))
        .or_else(|| known.iter().find_map(|sequence| sequence.link_name_of(id)))
}

/// In-memory name table implementing both resolver directions.
///
/// Names that are plain decimal numbers resolve to themselves, so ids the
/// table has no name for survive a decompile/compile round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelResolver {
    graphs: BTreeMap<String, i32>,
    objects: BTreeMap<String, u16>,
    conditions: BTreeMap<u16, String>,
    actions: BTreeMap<u16, ActionSignature>,
    starter: Option<Starter>,
    sequences: Vec<CommandsSequence>,
    associated: Option<usize>,
}

impl LevelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(mut self, name: impl Into<String>, id: i32) -> Self {
        self.graphs.insert(name.into(), id);
        self
    }

    pub fn with_global_object(mut self, name: impl Into<String>, id: u16) -> Self {
        self.objects.insert(name.into(), id);
        self
    }

    pub fn with_condition(mut self, index: u16, name: impl Into<String>) -> Self {
        self.conditions.insert(index, name.into());
        self
    }

    pub fn with_action(mut self, index: u16, signature: ActionSignature) -> Self {
        self.actions.insert(index, signature);
        self
    }

    /// Registers catalog names, first name per index wins.
    pub fn with_catalog(
        mut self,
        conditions: impl IntoIterator<Item = (u16, String)>,
        actions: impl IntoIterator<Item = (u16, ActionSignature)>,
    ) -> Self {
        for (index, name) in conditions {
            self.conditions.entry(index).or_insert(name);
        }
        for (index, signature) in actions {
            self.actions.entry(index).or_insert(signature);
        }
        self
    }

    pub fn with_starter(mut self, starter: Starter) -> Self {
        self.starter = Some(starter);
        self
    }

    pub fn set_starter(&mut self, starter: Option<Starter>) {
        self.starter = starter;
    }

    pub fn with_sequence(mut self, sequence: CommandsSequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    /// Adds a library and marks it as the one scripts belong to.
    pub fn with_associated_sequence(mut self, sequence: CommandsSequence) -> Self {
        self.associated = Some(self.sequences.len());
        self.sequences.push(sequence);
        self
    }
}

impl CompilerResolver for LevelResolver {
    fn resolve_graph_reference(&self, name: &str) -> ResolveResult<i32> {
        self.graphs
            .get(name)
            .copied()
            .or_else(|| name.parse().ok())
            .ok_or_else(|| ResolveError::UnknownGraph {
                name: name.to_string(),
            })
    }

    fn resolve_global_object_id(&self, name: &str) -> ResolveResult<u16> {
        self.objects
            .get(name)
            .copied()
            .or_else(|| name.parse().ok())
            .ok_or_else(|| ResolveError::UnknownGlobalObject {
                name: name.to_string(),
            })
    }

    fn associated_sequence(&self) -> Option<&CommandsSequence> {
        self.associated.and_then(|at| self.sequences.get(at))
    }

    fn known_sequences(&self) -> &[CommandsSequence] {
        &self.sequences
    }
}

impl DecompilerResolver for LevelResolver {
    fn graph_name(&self, id: i32) -> Option<String> {
        self.graphs
            .iter()
            .find(|(_, graph)| **graph == id)
            .map(|(name, _)| name.clone())
    }

    fn global_object_name(&self, id: u16) -> Option<String> {
        self.objects
            .iter()
            .find(|(_, object)| **object == id)
            .map(|(name, _)| name.clone())
    }

    fn condition_name(&self, index: u16) -> Option<String> {
        self.conditions.get(&index).cloned()
    }

    fn action(&self, index: u16) -> Option<ActionSignature> {
        self.actions.get(&index).cloned()
    }

    fn starter(&self) -> Option<&Starter> {
        self.starter.as_ref()
    }

    fn associated_sequence(&self) -> Option<&CommandsSequence> {
        self.associated.and_then(|at| self.sequences.get(at))
    }

    fn known_sequences(&self) -> &[CommandsSequence] {
        &self.sequences
    }
}
