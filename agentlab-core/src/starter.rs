//! Starters decide which objects a behaviour is initially handed to

use crate::{AssignLocality, AssignPreference, AssignStatus, AssignType};
use serde::{Deserialize, Serialize};

/// Global object id meaning "any object".
pub const NO_GLOBAL_OBJECT: u16 = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assigner {
    pub behaviour: i32,
    pub global_object_id: u16,
    pub assign_type: AssignType,
    pub locality: AssignLocality,
    pub status: AssignStatus,
    pub preference: AssignPreference,
}

impl Default for Assigner {
    fn default() -> Self {
        Self {
            behaviour: 0,
            global_object_id: NO_GLOBAL_OBJECT,
            assign_type: AssignType::Me,
            locality: AssignLocality::Nearby,
            status: AssignStatus::Idle,
            preference: AssignPreference::Nearest,
        }
    }
}

impl Assigner {
    /// `gid << 16 | type | locality << 4 | status << 8 | preference << 12`
    pub fn packed(&self) -> u32 {
        (u32::from(self.global_object_id) << 16)
            | self.assign_type.value()
            | (self.locality.value() << 4)
            | (self.status.value() << 8)
            | (self.preference.value() << 12)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Starter {
    /// Always the owning graph's priority.
    pub priority: u8,
    pub assigners: Vec<Assigner>,
}
