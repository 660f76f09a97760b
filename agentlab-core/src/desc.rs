//! Factories the compiler builds bytecode objects through
//!
//! Callers targeting a different engine layout swap in their own factory
//! without touching the code generator.

use crate::{Command, CommandPack, CommandsSequence, Graph, State, StateBody};

pub trait CommandDesc {
    fn construct(&self) -> Command;
}

pub trait CommandPackDesc {
    fn construct(&self) -> CommandPack;
}

pub trait CommandsSequenceDesc {
    fn construct(&self) -> CommandsSequence;
}

pub trait GraphDesc {
    fn construct(&self) -> Graph;
}

pub trait StateDesc {
    fn construct(&self) -> State;
}

pub trait StateBodyDesc {
    fn construct(&self) -> StateBody;
}

/// Builds every object in its default engine layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDescs;

impl CommandDesc for StandardDescs {
    fn construct(&self) -> Command {
        Command::default()
    }
}

impl CommandPackDesc for StandardDescs {
    fn construct(&self) -> CommandPack {
        CommandPack::default()
    }
}

impl CommandsSequenceDesc for StandardDescs {
    fn construct(&self) -> CommandsSequence {
        CommandsSequence::default()
    }
}

impl GraphDesc for StandardDescs {
    fn construct(&self) -> Graph {
        Graph::default()
    }
}

impl StateDesc for StandardDescs {
    fn construct(&self) -> State {
        State {
            bodies: Vec::with_capacity(0x1F),
            ..State::default()
        }
    }
}

impl StateBodyDesc for StandardDescs {
    fn construct(&self) -> StateBody {
        StateBody::default()
    }
}

/// One factory per bytecode kind.
pub struct Descs {
    pub command: Box<dyn CommandDesc>,
    pub command_pack: Box<dyn CommandPackDesc>,
    pub commands_sequence: Box<dyn CommandsSequenceDesc>,
    pub graph: Box<dyn GraphDesc>,
    pub state: Box<dyn StateDesc>,
    pub state_body: Box<dyn StateBodyDesc>,
}

impl Default for Descs {
    fn default() -> Self {
        Self {
            command: Box::new(StandardDescs),
            command_pack: Box::new(StandardDescs),
            commands_sequence: Box::new(StandardDescs),
            graph: Box::new(StandardDescs),
            state: Box::new(StandardDescs),
            state_body: Box::new(StandardDescs),
        }
    }
}

impl std::fmt::Debug for Descs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descs").finish_non_exhaustive()
    }
}
