//! Enum types shared by the compiler, the decompiler and the bytecode objects

use crate::named_enum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STARTER ASSIGNMENT
// ============================================================================

named_enum! {
    /// Who an assigner hands the behaviour to.
    pub enum AssignType: u32 {
        Me = "ME" => 0,
        LinkedObject = "LINKED_OBJECT" => 2,
        GlobalAgent = "GLOBAL_AGENT" => 3,
        HumanPlayer = "HUMAN_PLAYER" => 4,
        Originator = "ORIGINATOR" => 8,
    }
}

named_enum! {
    /// Search radius for the assignment target.
    pub enum AssignLocality: u32 {
        Nearby = "NEARBY" => 0,
        Local = "LOCAL" => 1,
        Global = "GLOBAL" => 2,
        Anywhere = "ANYWHERE" => 3,
    }
}

named_enum! {
    /// Required activity of the assignment target.
    pub enum AssignStatus: u32 {
        Idle = "IDLE" => 0,
        Busy = "BUSY" => 1,
        AnyState = "ANYSTATE" => 2,
    }
}

named_enum! {
    /// Tie-breaker between candidate targets.
    pub enum AssignPreference: u32 {
        Nearest = "NEAREST" => 0,
        Furthest = "FURTHEST" => 1,
        Strongest = "STRONGEST" => 2,
        Weakest = "WEAKEST" => 3,
        BestAligned = "BEST_ALIGNED" => 4,
        Anyhow = "ANYHOW" => 5,
    }
}

// ============================================================================
// CONTROL PACKET SETTINGS
// ============================================================================

named_enum! {
    /// Reference frame for packet positions.
    pub enum SpaceType: u32 {
        WorldSpace = "WORLD_SPACE" => 0,
        InitialSpace = "INITIAL_SPACE" => 1,
        CurrentSpace = "CURRENT_SPACE" => 2,
        TargetSpace = "TARGET_SPACE" => 3,
        ParentSpace = "PARENT_SPACE" => 4,
        /// Alias of `PARENT_SPACE`
        ChaseSpace = "CHASE_SPACE" => 4,
        InitialPos = "INITIAL_POS" => 5,
        CurrentPos = "CURRENT_POS" => 6,
        StoredSpace = "STORED_SPACE" => 7,
    }
}

named_enum! {
    pub enum MotionType: u32 {
        NoMotion = "NO_MOTION" => 0,
        ConstantVel = "CONSTANT_VEL" => 1,
        Accelerated = "ACCELERATED" => 2,
        Spring = "SPRING" => 3,
        Projectile = "PROJECTILE" => 4,
        LinearInterp = "LINEAR_INTERP" => 5,
        SmoothPath = "SMOOTH_PATH" => 6,
        FaceDestOnly = "FACE_DEST_ONLY" => 7,
        Drive = "DRIVE" => 8,
        GroundChase = "GROUND_CHASE" => 9,
        AirChase = "AIR_CHASE" => 10,
        Unknown11 = "UNKNOWN_11" => 11,
        Unknown12 = "UNKNOWN_12" => 12,
        Unknown13 = "UNKNOWN_13" => 13,
    }
}

named_enum! {
    pub enum ContinuousRotate: u32 {
        NoContRotation = "NO_CONT_ROTATION" => 0,
        NumFullRots = "NUM_FULL_ROTS" => 1,
        RadsPerSecond = "RADS_PER_SECOND" => 2,
        NaturalRoll = "NATURAL_ROLL" => 3,
    }
}

named_enum! {
    /// Axes that roll naturally while moving.
    pub enum Axes: u32 {
        NoNatural = "NO_NATURAL" => 0,
        XNatural = "X_NATURAL" => 1,
        YNatural = "Y_NATURAL" => 2,
        ZNatural = "Z_NATURAL" => 3,
        AllNatural = "ALL_NATURAL" => 4,
    }
}

named_enum! {
    pub enum AccelerationFunction: u32 {
        NoAccel = "NO_ACCEL" => 0,
        ConstantAccel = "CONSTANT_ACCEL" => 1,
        SmoothCurve = "SMOOTH_CURVE" => 2,
    }
}

named_enum! {
    /// Named slots of a control packet's byte table, in table order.
    pub enum PacketData: u8 {
        Selector = "Selector" => 0,
        KeyIndex = "KeyIndex" => 1,
        MoveSpeed = "MoveSpeed" => 2,
        TurnSpeed = "TurnSpeed" => 3,
        RawPosX = "RawPosX" => 4,
        RawPosY = "RawPosY" => 5,
        RawPosZ = "RawPosZ" => 6,
        Pitch = "Pitch" => 7,
        Yaw = "Yaw" => 8,
        Roll = "Roll" => 9,
        Delay = "Delay" => 10,
        Duration = "Duration" => 11,
        TumbleData = "TumbleData" => 12,
        SpinData = "SpinData" => 13,
        TwistData = "TwistData" => 14,
        RandRange = "RandRange" => 15,
        Power = "Power" => 16,
        Damping = "Damping" => 17,
        AcDist = "AcDist" => 18,
        DecDist = "DecDist" => 19,
        Bounce = "Bounce" => 20,
        SyncUnit = "SyncUnit" => 21,
        JointIndex = "JointIndex" => 22,
    }
}

impl PacketData {
    /// Integer slots store their value as a plain word; all others store f32 bits.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PacketData::Selector | PacketData::KeyIndex | PacketData::SyncUnit | PacketData::JointIndex
        )
    }
}

// ============================================================================
// LIBRARIES
// ============================================================================

named_enum! {
    /// Object family a behaviour library is keyed on.
    pub enum InstanceType: u8 {
        Pickup = "Pickup" => 0x11,
        Projectile = "Projectile" => 0x12,
    }
}

named_enum! {
    /// Behaviour ids the game reserves for pickup and projectile linear behaviours.
    pub enum GameReservedId: u16 {
        PupStateInactive = "PUP_STATE_INACTIVE" => 562,
        PupStateInvisible = "PUP_STATE_INVISIBLE" => 564,
        PupStateSpawnInAir = "PUP_STATE_SPAWN_IN_AIR" => 566,
        PupStateSpawnFromCrate = "PUP_STATE_SPAWN_FROM_CRATE" => 568,
        PupStateIdle = "PUP_STATE_IDLE" => 570,
        PupStateExcite = "PUP_STATE_EXCITE" => 572,
        PupStateSuckIn = "PUP_STATE_SUCK_IN" => 574,
        PupStateCollect = "PUP_STATE_COLLECT" => 576,
        PupStateFlyAway = "PUP_STATE_FLY_AWAY" => 578,
        PupStateDestroy = "PUP_STATE_DESTROY" => 580,
        ProStateInactive = "PRO_STATE_INACTIVE" => 590,
        ProStateInvisible = "PRO_STATE_INVISIBLE" => 592,
        ProStateLaunch = "PRO_STATE_LAUNCH" => 594,
        ProStateTravel = "PRO_STATE_TRAVEL" => 596,
        ProStateImpactCrate = "PRO_STATE_IMPACT_CRATE" => 598,
        ProStateImpactCreature = "PRO_STATE_IMPACT_CREATURE" => 600,
        ProStateImpactFurniture = "PRO_STATE_IMPACT_FURNITURE" => 602,
        ProStateImpactPlayer = "PRO_STATE_IMPACT_PLAYER" => 604,
        ProStateImpactScenery = "PRO_STATE_IMPACT_SCENERY" => 606,
        ProStateCreateDamage = "PRO_STATE_CREATE_DAMAGE" => 608,
        ProStateDestroy = "PRO_STATE_DESTROY" => 610,
        ProStateUnk1 = "PRO_STATE_UNK1" => 612,
        ProStateUnk2 = "PRO_STATE_UNK2" => 614,
    }
}

impl GameReservedId {
    /// Inclusive bounds of the reserved id range.
    pub const RANGE: std::ops::RangeInclusive<i32> = 562..=614;

    pub fn contains(id: i32) -> bool {
        Self::RANGE.contains(&id)
    }
}

// ============================================================================
// OBJECT SLOTS
// ============================================================================

/// Event slot on a game object whose script a state runs.
///
/// Slots 0-10 have event names, the remainder are positional (`Slot_11`..`Slot_110`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectBehaviourSlot(u8);

const NAMED_SLOTS: [&str; 11] = [
    "OnSpawn",
    "OnTrigger",
    "OnDamage",
    "OnTouch",
    "OnHeadbutt",
    "OnLand",
    "OnGettingSpinAttacked",
    "OnGettingBodyslamAttacked",
    "OnGettingSlideAttacked",
    "OnPhysicsCollision",
    "OnUnknownCollision",
];

impl ObjectBehaviourSlot {
    pub const COUNT: u8 = 111;

    pub fn new(index: u8) -> Option<Self> {
        (index < Self::COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn name(self) -> String {
        match NAMED_SLOTS.get(self.0 as usize) {
            Some(name) => (*name).to_string(),
            None => format!("Slot_{}", self.0),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(index) = NAMED_SLOTS.iter().position(|slot| *slot == name) {
            return Some(Self(index as u8));
        }
        let index: u8 = name.strip_prefix("Slot_")?.parse().ok()?;
        if (NAMED_SLOTS.len() as u8..Self::COUNT).contains(&index) {
            Some(Self(index))
        } else {
            None
        }
    }

    /// All slots in index order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }
}

impl fmt::Display for ObjectBehaviourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ObjectBehaviourSlot {
    type Err = crate::UnknownMember;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| crate::UnknownMember {
            enum_name: "ObjectBehaviourSlot",
            member: s.to_string(),
        })
    }
}
