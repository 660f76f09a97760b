//! Behaviour graphs and their states, bodies, conditions and commands

use crate::ControlPacket;
use serde::{Deserialize, Serialize};

/// One engine command: an index into the action catalog plus raw argument words.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Command {
    pub index: u16,
    /// Floats as raw bits, booleans as 0/1, integers reinterpreted as unsigned.
    pub arguments: Vec<u32>,
}

/// The condition a state body polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub index: u16,
    pub power_multiplier: f32,
    pub parameter: u16,
    /// Seconds between checks; zero or less checks every frame.
    pub check_interval: f32,
    /// Threshold the condition's return value is compared against.
    pub return_check: f32,
    /// Compare with `<=` instead of `>=`.
    pub not_gate: bool,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            index: 0,
            power_multiplier: 2.0,
            parameter: 0,
            check_interval: 0.0,
            return_check: 0.0,
            not_gate: false,
        }
    }
}

/// One conditional branch of a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBody {
    pub condition: Condition,
    pub unknown_flag: bool,
    pub commands: Vec<Command>,
    /// Target state id, or -1.
    pub jump_to_state: i32,
    pub has_state_jump: bool,
}

impl Default for StateBody {
    fn default() -> Self {
        Self {
            condition: Condition::default(),
            unknown_flag: false,
            commands: Vec::new(),
            jump_to_state: -1,
            has_state_jump: false,
        }
    }
}

impl StateBody {
    pub fn interval(&self) -> f32 {
        self.condition.check_interval
    }

    pub fn threshold(&self) -> f32 {
        self.condition.return_check
    }

    pub fn not_gate(&self) -> bool {
        self.condition.not_gate
    }
}

/// A node of a behaviour graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Source name. Not part of the engine encoding.
    pub name: String,
    /// Behaviour graph id, or the object slot index when `uses_object_slot`;
    /// -1 when neither.
    pub behaviour_index_or_slot: i16,
    pub skips_first_body: bool,
    pub non_blocking: bool,
    pub uses_object_slot: bool,
    pub control_packet: Option<ControlPacket>,
    pub bodies: Vec<StateBody>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            name: String::new(),
            behaviour_index_or_slot: -1,
            skips_first_body: false,
            non_blocking: false,
            uses_object_slot: false,
            control_packet: None,
            bodies: Vec::new(),
        }
    }
}

impl State {
    pub const SKIPS_FIRST_BODY: u16 = 0x400;
    pub const NON_BLOCKING: u16 = 0x800;
    pub const USES_OBJECT_SLOT: u16 = 0x1000;
    pub const HAS_CONTROL_PACKET: u16 = 0x4000;

    /// Header bitfield as the engine reads it (body count in the low five bits).
    pub fn bitfield(&self) -> u16 {
        let mut bits = (self.bodies.len() & 0x1F) as u16;
        if self.skips_first_body {
            bits |= Self::SKIPS_FIRST_BODY;
        }
        if self.non_blocking {
            bits |= Self::NON_BLOCKING;
        }
        if self.uses_object_slot {
            bits |= Self::USES_OBJECT_SLOT;
        }
        if self.control_packet.is_some() {
            bits |= Self::HAS_CONTROL_PACKET;
        }
        bits
    }
}

/// A compiled behaviour.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub priority: u8,
    pub start_state: i32,
    pub states: Vec<State>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_bitfield() {
        let mut state = State {
            bodies: vec![StateBody::default(); 3],
            ..State::default()
        };
        assert_eq!(state.bitfield(), 3);

        state.skips_first_body = true;
        state.non_blocking = true;
        state.uses_object_slot = true;
        state.control_packet = Some(ControlPacket::new());
        assert_eq!(state.bitfield(), 3 | 0x400 | 0x800 | 0x1000 | 0x4000);
    }

    #[test]
    fn test_body_count_is_masked() {
        let state = State {
            bodies: vec![StateBody::default(); 33],
            ..State::default()
        };
        assert_eq!(state.bitfield() & 0x1F, 1);
    }

    #[test]
    fn test_defaults() {
        let body = StateBody::default();
        assert_eq!(body.jump_to_state, -1);
        assert_eq!(body.condition.power_multiplier, 2.0);
        assert_eq!(State::default().behaviour_index_or_slot, -1);
    }

    #[test]
    fn test_graph_json_roundtrip() -> Result<(), serde_json::Error> {
        let graph = Graph {
            name: "COM_TEST".to_string(),
            priority: 100,
            start_state: 0,
            states: vec![State {
                name: "StateA".to_string(),
                control_packet: Some(ControlPacket::new()),
                bodies: vec![StateBody {
                    commands: vec![Command {
                        index: 5,
                        arguments: vec![1.5f32.to_bits(), 1],
                    }],
                    ..StateBody::default()
                }],
                ..State::default()
            }],
        };
        let json = serde_json::to_string(&graph)?;
        assert_eq!(serde_json::from_str::<Graph>(&json)?, graph);
        Ok(())
    }
}
