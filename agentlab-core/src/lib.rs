//! AgentLab Core - Bytecode Object Contracts
//!
//! Field-for-field structures the AgentLab compiler populates and the game
//! engine consumes, together with their packing rules. Serializing them to the
//! level format is left to the caller.
//!
//! ```text
//! Graph ── State ── StateBody ── Condition
//!   │        │          └──────── Command
//!   │        └── ControlPacket (settings word + byte table + float table)
//!   └─ Starter ── Assigner
//!
//! CommandsSequence ── BehaviourPack ── CommandPack ── Command
//! ```

mod macros;

pub mod control_packet;
pub mod desc;
pub mod enums;
pub mod error;
pub mod graph;
pub mod library;
pub mod resolver;
pub mod starter;

pub use control_packet::{
    flag_setting, ControlPacket, DataValue, PacketFlags, SettingField, FLAG_SETTINGS, INSTANCE_FLOAT_BIAS,
    INSTANCE_FLOAT_COUNT, UNSET_SLOT,
};
pub use desc::{
    CommandDesc, CommandPackDesc, CommandsSequenceDesc, Descs, GraphDesc, StandardDescs, StateBodyDesc, StateDesc,
};
pub use enums::{
    AccelerationFunction, AssignLocality, AssignPreference, AssignStatus, AssignType, Axes, ContinuousRotate,
    GameReservedId, InstanceType, MotionType, ObjectBehaviourSlot, PacketData, SpaceType,
};
pub use error::{ResolveError, ResolveResult, UnknownMember};
pub use graph::{Command, Condition, Graph, State, StateBody};
pub use library::{BehaviourPack, CommandPack, CommandsSequence};
pub use resolver::{
    reserved_link_id, reserved_link_name, ActionSignature, CompilerResolver, DecompilerResolver, LevelResolver,
    ParamType,
};
pub use starter::{Assigner, Starter, NO_GLOBAL_OBJECT};
