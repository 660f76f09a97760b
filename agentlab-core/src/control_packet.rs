//! Control packets: the motion/physics record a state runs with

use crate::{AccelerationFunction, Axes, ContinuousRotate, MotionType, PacketData, SpaceType};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Byte-table value meaning "slot not written".
pub const UNSET_SLOT: u8 = 0xFF;

/// Byte-table values at or above this bias reference an instance float.
pub const INSTANCE_FLOAT_BIAS: u8 = 0x80;

/// Number of addressable instance floats (`InstanceFloat[0..126]`).
pub const INSTANCE_FLOAT_COUNT: u8 = 126;

bitflags! {
    /// Boolean bits of the packed settings word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PacketFlags: u32 {
        const TRANSLATES = 1 << 13;
        const ROTATES = 1 << 14;
        const TRANSLATION_CONTINUES = 1 << 15;
        const TRACKS_DESTINATION = 1 << 16;
        const INTERPOLATES_ANGLES = 1 << 17;
        const YAW_FACES = 1 << 18;
        const PITCH_FACES = 1 << 19;
        const ORIENTS_PREDICTS = 1 << 20;
        /// Set on every packet the game ships.
        const ALWAYS_SET = 1 << 21;
        const KEY_IS_LOCAL = 1 << 22;
        const USES_ROTATOR = 1 << 23;
        const USES_INTERPOLATOR = 1 << 24;
        const USES_PHYSICS = 1 << 25;
        const CONT_ROTATES_IN_WORLD_SPACE = 1 << 26;
        const STALLS = 1 << 31;
    }
}

/// Script names of the boolean settings, in decompilation order.
pub const FLAG_SETTINGS: [(&str, PacketFlags); 14] = [
    ("DoesTranslate", PacketFlags::TRANSLATES),
    ("DoesRotate", PacketFlags::ROTATES),
    ("DoesTranslationContinue", PacketFlags::TRANSLATION_CONTINUES),
    ("TracksDestination", PacketFlags::TRACKS_DESTINATION),
    ("DoesInterpolateAngles", PacketFlags::INTERPOLATES_ANGLES),
    ("DoesYawFaces", PacketFlags::YAW_FACES),
    ("DoesPitchFaces", PacketFlags::PITCH_FACES),
    ("DoesOrientPredicts", PacketFlags::ORIENTS_PREDICTS),
    ("KeyIsLocal", PacketFlags::KEY_IS_LOCAL),
    ("UsesRotator", PacketFlags::USES_ROTATOR),
    ("UsesInterpolator", PacketFlags::USES_INTERPOLATOR),
    ("UsesPhysics", PacketFlags::USES_PHYSICS),
    ("ContinuouslyRotatesInWorldSpace", PacketFlags::CONT_ROTATES_IN_WORLD_SPACE),
    ("Stalls", PacketFlags::STALLS),
];

/// Looks up a boolean setting by its script name.
pub fn flag_setting(name: &str) -> Option<PacketFlags> {
    FLAG_SETTINGS
        .iter()
        .find(|(setting, _)| *setting == name)
        .map(|(_, flag)| *flag)
}

/// Enum-valued bit fields of the packed settings word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingField {
    Space,
    Motion,
    ContinuousRotate,
    Acceleration,
    Axes,
}

impl SettingField {
    /// All fields in decompilation order.
    pub const ALL: [SettingField; 5] = [
        SettingField::Space,
        SettingField::Motion,
        SettingField::ContinuousRotate,
        SettingField::Acceleration,
        SettingField::Axes,
    ];

    /// Setting name as written in a `settings` block. Also the name of the
    /// enum the value is drawn from.
    pub fn name(self) -> &'static str {
        match self {
            SettingField::Space => "SpaceType",
            SettingField::Motion => "MotionType",
            SettingField::ContinuousRotate => "ContinuousRotate",
            SettingField::Acceleration => "AccelerationFunction",
            SettingField::Axes => "Axes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    fn shift(self) -> u32 {
        match self {
            SettingField::Space => 0,
            SettingField::Motion => 3,
            SettingField::ContinuousRotate => 7,
            SettingField::Acceleration => 11,
            SettingField::Axes => 27,
        }
    }

    fn mask(self) -> u32 {
        match self {
            SettingField::Space => 0x7,
            SettingField::Motion => 0xF,
            SettingField::ContinuousRotate => 0xF,
            SettingField::Acceleration => 0x3,
            SettingField::Axes => 0x7,
        }
    }

    /// Member names and values of the enum backing this field.
    pub fn members(self) -> Vec<(&'static str, u32)> {
        fn collect<T: Copy>(all: &[T], name: fn(T) -> &'static str, value: fn(T) -> u32) -> Vec<(&'static str, u32)> {
            all.iter().map(|m| (name(*m), value(*m))).collect()
        }
        match self {
            SettingField::Space => collect(SpaceType::ALL, SpaceType::name, SpaceType::value),
            SettingField::Motion => collect(MotionType::ALL, MotionType::name, MotionType::value),
            SettingField::ContinuousRotate => {
                collect(ContinuousRotate::ALL, ContinuousRotate::name, ContinuousRotate::value)
            }
            SettingField::Acceleration => collect(
                AccelerationFunction::ALL,
                AccelerationFunction::name,
                AccelerationFunction::value,
            ),
            SettingField::Axes => collect(Axes::ALL, Axes::name, Axes::value),
        }
    }

    /// Canonical member name for a raw field value.
    pub fn member_name(self, value: u32) -> Option<&'static str> {
        match self {
            SettingField::Space => SpaceType::from_value(value).map(SpaceType::name),
            SettingField::Motion => MotionType::from_value(value).map(MotionType::name),
            SettingField::ContinuousRotate => ContinuousRotate::from_value(value).map(ContinuousRotate::name),
            SettingField::Acceleration => {
                AccelerationFunction::from_value(value).map(AccelerationFunction::name)
            }
            SettingField::Axes => Axes::from_value(value).map(Axes::name),
        }
    }
}

/// Where a data slot's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataValue {
    Unset,
    /// `InstanceFloat[n]`
    InstanceFloat(u8),
    /// Index into the float table, with the word if the index is in range.
    Word { index: u8, word: Option<u32> },
}

/// Packed settings word plus the parallel byte and float tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlPacket {
    pub settings: u32,
    pub bytes: Vec<u8>,
    pub floats: Vec<u32>,
}

impl Default for ControlPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPacket {
    /// Fresh packet: only the always-set bit, every slot unset, no floats.
    pub fn new() -> Self {
        Self {
            settings: PacketFlags::ALWAYS_SET.bits(),
            bytes: vec![UNSET_SLOT; PacketData::ALL.len()],
            floats: Vec::new(),
        }
    }

    pub fn flags(&self) -> PacketFlags {
        PacketFlags::from_bits_truncate(self.settings)
    }

    pub fn set_flag(&mut self, flag: PacketFlags, enabled: bool) {
        if enabled {
            self.settings |= flag.bits();
        } else {
            self.settings &= !flag.bits();
        }
    }

    pub fn field(&self, field: SettingField) -> u32 {
        (self.settings >> field.shift()) & field.mask()
    }

    pub fn set_field(&mut self, field: SettingField, value: u32) {
        let mask = field.mask() << field.shift();
        self.settings = (self.settings & !mask) | ((value & field.mask()) << field.shift());
    }

    pub fn data(&self, slot: PacketData) -> DataValue {
        match self.bytes.get(slot.value() as usize).copied() {
            None | Some(UNSET_SLOT) => DataValue::Unset,
            Some(byte) if byte >= INSTANCE_FLOAT_BIAS => DataValue::InstanceFloat(byte - INSTANCE_FLOAT_BIAS),
            Some(index) => DataValue::Word {
                index,
                word: self.floats.get(index as usize).copied(),
            },
        }
    }

    /// Stores a raw word for `slot`, reusing the slot's float-table entry if it
    /// already has one.
    pub fn set_data_word(&mut self, slot: PacketData, word: u32) {
        let at = slot.value() as usize;
        self.ensure_slot(at);
        let current = self.bytes[at];
        if current < INSTANCE_FLOAT_BIAS && (current as usize) < self.floats.len() {
            self.floats[current as usize] = word;
        } else {
            self.bytes[at] = self.floats.len() as u8;
            self.floats.push(word);
        }
    }

    /// Points `slot` at `InstanceFloat[index]`, dropping any float-table entry
    /// the slot held.
    pub fn set_data_instance_float(&mut self, slot: PacketData, index: u8) {
        let at = slot.value() as usize;
        self.ensure_slot(at);
        self.release_float(at);
        self.bytes[at] = INSTANCE_FLOAT_BIAS + index.min(INSTANCE_FLOAT_COUNT - 1);
    }

    /// Removes the float-table entry owned by byte `at` and shifts later
    /// indices down so the table stays dense.
    fn release_float(&mut self, at: usize) {
        let released = self.bytes[at];
        if released >= INSTANCE_FLOAT_BIAS || usize::from(released) >= self.floats.len() {
            return;
        }
        self.floats.remove(usize::from(released));
        self.bytes[at] = UNSET_SLOT;
        for byte in &mut self.bytes {
            if *byte > released && *byte < INSTANCE_FLOAT_BIAS {
                *byte -= 1;
            }
        }
    }

    fn ensure_slot(&mut self, at: usize) {
        if self.bytes.len() <= at {
            self.bytes.resize(at + 1, UNSET_SLOT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_packet_is_all_unset() {
        let packet = ControlPacket::new();
        assert_eq!(packet.bytes, vec![0xFF; 23]);
        assert!(packet.floats.is_empty());
        assert_eq!(packet.settings, 0x0020_0000);
    }

    #[test]
    fn test_settings_bit_layout() {
        let mut packet = ControlPacket::new();
        packet.set_field(SettingField::Space, SpaceType::StoredSpace.value());
        packet.set_field(SettingField::Motion, MotionType::AirChase.value());
        packet.set_field(SettingField::ContinuousRotate, ContinuousRotate::NaturalRoll.value());
        packet.set_field(SettingField::Acceleration, AccelerationFunction::SmoothCurve.value());
        packet.set_field(SettingField::Axes, Axes::AllNatural.value());
        packet.set_flag(PacketFlags::STALLS, true);
        packet.set_flag(PacketFlags::TRANSLATES, true);

        let expected = 7 | (10 << 3) | (3 << 7) | (2 << 11) | (1 << 13) | (1 << 21) | (4 << 27) | (1 << 31);
        assert_eq!(packet.settings, expected);
        assert_eq!(packet.field(SettingField::Motion), 10);
        assert_eq!(packet.field(SettingField::Axes), 4);

        packet.set_flag(PacketFlags::TRANSLATES, false);
        assert!(!packet.flags().contains(PacketFlags::TRANSLATES));
        assert!(packet.flags().contains(PacketFlags::ALWAYS_SET));
    }

    #[test]
    fn test_data_tables() {
        let mut packet = ControlPacket::new();
        packet.set_data_word(PacketData::MoveSpeed, 2.5f32.to_bits());
        packet.set_data_instance_float(PacketData::Yaw, 3);
        packet.set_data_word(PacketData::Selector, 7);

        assert_eq!(packet.bytes[PacketData::MoveSpeed.value() as usize], 0);
        assert_eq!(packet.bytes[PacketData::Yaw.value() as usize], 0x83);
        assert_eq!(packet.bytes[PacketData::Selector.value() as usize], 1);
        assert_eq!(packet.floats, vec![2.5f32.to_bits(), 7]);
        assert_eq!(packet.data(PacketData::Yaw), DataValue::InstanceFloat(3));
        assert_eq!(packet.data(PacketData::Roll), DataValue::Unset);
    }

    #[test]
    fn test_rewriting_a_slot_reuses_its_float() {
        let mut packet = ControlPacket::new();
        packet.set_data_word(PacketData::Delay, 1);
        packet.set_data_word(PacketData::Delay, 2);
        assert_eq!(packet.floats, vec![2]);
    }

    #[test]
    fn test_instance_float_releases_the_slot_float() {
        let mut packet = ControlPacket::new();
        packet.set_data_word(PacketData::MoveSpeed, 10);
        packet.set_data_word(PacketData::Yaw, 20);
        packet.set_data_word(PacketData::Roll, 30);
        packet.set_data_instance_float(PacketData::Yaw, 2);

        assert_eq!(packet.floats, vec![10, 30]);
        assert_eq!(packet.data(PacketData::Yaw), DataValue::InstanceFloat(2));
        assert_eq!(packet.data(PacketData::Roll), DataValue::Word { index: 1, word: Some(30) });

        packet.set_data_instance_float(PacketData::Yaw, 5);
        assert_eq!(packet.floats, vec![10, 30]);

        packet.set_data_word(PacketData::Yaw, 40);
        assert_eq!(packet.data(PacketData::Yaw), DataValue::Word { index: 2, word: Some(40) });
    }

    #[test]
    fn test_dangling_float_index() {
        let mut packet = ControlPacket::new();
        packet.bytes[PacketData::Power.value() as usize] = 4;
        assert_eq!(
            packet.data(PacketData::Power),
            DataValue::Word { index: 4, word: None }
        );
    }

    #[test]
    fn test_flag_setting_lookup() {
        assert_eq!(flag_setting("Stalls"), Some(PacketFlags::STALLS));
        assert_eq!(flag_setting("MoveSpeed"), None);
        assert_eq!(SettingField::from_name("Axes"), Some(SettingField::Axes));
        assert_eq!(SettingField::Space.member_name(4), Some("PARENT_SPACE"));
        assert_eq!(SettingField::Motion.member_name(15), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_set_field_leaves_other_bits(
            field in proptest::sample::select(SettingField::ALL.to_vec()),
            value in 0u32..64,
            settings in proptest::prelude::any::<u32>(),
        ) {
            let mut packet = ControlPacket { settings, ..ControlPacket::new() };
            packet.set_field(field, value);
            let mask = field.mask() << field.shift();
            proptest::prop_assert_eq!(packet.field(field), value & field.mask());
            proptest::prop_assert_eq!(packet.settings & !mask, settings & !mask);
        }

        #[test]
        fn prop_slot_words_land_in_write_order(
            slots in proptest::sample::subsequence(PacketData::ALL.to_vec(), 0..=PacketData::ALL.len()),
        ) {
            let mut packet = ControlPacket::new();
            for (i, slot) in slots.iter().enumerate() {
                packet.set_data_word(*slot, i as u32);
            }
            proptest::prop_assert_eq!(packet.floats.len(), slots.len());
            for (i, slot) in slots.iter().enumerate() {
                proptest::prop_assert_eq!(packet.data(*slot), DataValue::Word { index: i as u8, word: Some(i as u32) });
            }
        }
    }
}
