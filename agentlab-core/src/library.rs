//! Behaviour libraries: command packs and commands sequences

use crate::{Command, GameReservedId, InstanceType};
use serde::{Deserialize, Serialize};

/// A linear run of commands.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandPack {
    pub commands: Vec<Command>,
}

/// A command pack linked under a behaviour id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourPack {
    pub id: u16,
    pub pack: CommandPack,
}

/// Library of linear behaviours for one instance type, plus its creation commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsSequence {
    /// Source name. Not part of the engine encoding.
    pub name: String,
    pub index_in_global_storage: u8,
    pub key: InstanceType,
    pub commands: Vec<Command>,
    pub behaviour_packs: Vec<BehaviourPack>,
}

impl Default for CommandsSequence {
    fn default() -> Self {
        Self {
            name: String::new(),
            index_in_global_storage: 0,
            key: InstanceType::Pickup,
            commands: Vec::new(),
            behaviour_packs: Vec::new(),
        }
    }
}

impl CommandsSequence {
    /// `packs << 16 | index << 8 | key`
    pub fn header(&self) -> u32 {
        ((self.behaviour_packs.len() as u32) << 16)
            | (u32::from(self.index_in_global_storage) << 8)
            | u32::from(self.key.value())
    }

    /// Name a linked pack is written under.
    pub fn link_name(id: u16) -> String {
        match GameReservedId::from_value(id) {
            Some(reserved) => reserved.name().to_string(),
            None => format!("Behaviour_{id}"),
        }
    }

    /// Name-to-id link table of this library.
    pub fn links(&self) -> impl Iterator<Item = (String, u16)> + '_ {
        self.behaviour_packs
            .iter()
            .map(|pack| (Self::link_name(pack.id), pack.id))
    }

    pub fn link_id(&self, name: &str) -> Option<u16> {
        self.links().find(|(link, _)| link == name).map(|(_, id)| id)
    }

    pub fn link_name_of(&self, id: u16) -> Option<String> {
        self.behaviour_packs
            .iter()
            .any(|pack| pack.id == id)
            .then(|| Self::link_name(id))
    }
}
