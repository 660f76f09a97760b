//! Per-compile storage of folded consts and built control packets

use super::Value;
use crate::error::{SemanticError, SemanticResult};
use agentlab_core::ControlPacket;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Stored {
    Value(Value),
    Packet(ControlPacket),
}

/// Name store owned by a single compile. Entries are write-once through
/// [`add`](Self::add); [`set`](Self::set) overwrites.
#[derive(Debug, Default)]
pub struct AgentLabMemory {
    entries: HashMap<String, Stored>,
}

impl AgentLabMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, stored: Stored) -> SemanticResult<()> {
        if self.entries.contains_key(name) {
            return Err(SemanticError::Redefinition { name: name.to_string() });
        }
        self.entries.insert(name.to_string(), stored);
        Ok(())
    }

    /// Replaces the entry for `name`, returning the previous one.
    pub fn set(&mut self, name: &str, stored: Stored) -> Option<Stored> {
        self.entries.insert(name.to_string(), stored)
    }

    pub fn get(&self, name: &str) -> Option<&Stored> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.entries.get(name) {
            Some(Stored::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn packet(&self, name: &str) -> Option<&ControlPacket> {
        match self.entries.get(name) {
            Some(Stored::Packet(packet)) => Some(packet),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
