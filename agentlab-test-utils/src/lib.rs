//! AgentLab Test Utilities
//!
//! Shared test infrastructure for the AgentLab workspace:
//! - Catalog fixtures (condition and action definition scripts)
//! - A fixture resolver that agrees with those catalogs
//! - Proptest generators for bytecode objects the compiler can reproduce
//! - Custom assertions for bytecode-specific checks

// Re-export core types for convenience
pub use agentlab_core::{
    ActionSignature, Assigner, AssignLocality, AssignPreference, AssignStatus, AssignType, BehaviourPack, Command,
    CommandPack, CommandsSequence, Condition, ControlPacket, DataValue, GameReservedId, Graph, InstanceType,
    LevelResolver, ObjectBehaviourSlot, PacketData, ParamType, SettingField, Starter, State, StateBody,
    FLAG_SETTINGS, INSTANCE_FLOAT_COUNT, NO_GLOBAL_OBJECT, UNSET_SLOT,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Catalogs and a resolver that agree with each other.

    use super::*;

    /// Condition catalog: `SomeCondition` = 0, `Near`/`Close` = 1, `Timer` = 2.
    pub const CONDITION_DEFINITIONS: &str = r#"
condition SomeCondition(int slot);
condition Near(int range) [Close];
condition Timer();
"#;

    /// Action catalog: `DoSomething` = 0, `Jump` = 5, `Spin` = 6, `Wait`/`Sleep` = 7.
    pub const ACTION_DEFINITIONS: &str = r#"
action DoSomething();
action Jump(float height, bool spin) : 5;
action Spin(int turns);
action Wait(float seconds) [Sleep];
"#;

    /// Graph ids known to [`level_resolver`].
    pub const GRAPHS: [(&str, i32); 3] = [("COM_TEST", 40), ("COM_OTHER", 12), ("SPARKLE", 41)];

    /// Global object ids known to [`level_resolver`].
    pub const GLOBAL_OBJECTS: [(&str, u16); 2] = [("Crash", 3), ("Aku", 7)];

    pub fn condition_catalog() -> Vec<(u16, String)> {
        [(0, "SomeCondition"), (1, "Near"), (1, "Close"), (2, "Timer")]
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect()
    }

    pub fn action_catalog() -> Vec<(u16, ActionSignature)> {
        vec![
            (0, ActionSignature::new("DoSomething", vec![])),
            (5, ActionSignature::new("Jump", vec![ParamType::Float, ParamType::Bool])),
            (6, ActionSignature::new("Spin", vec![ParamType::Int])),
            (7, ActionSignature::new("Wait", vec![ParamType::Float])),
            (7, ActionSignature::new("Sleep", vec![ParamType::Float])),
        ]
    }

    /// Resolver naming every fixture graph, global object and catalog entry.
    pub fn level_resolver() -> LevelResolver {
        let resolver = GRAPHS
            .iter()
            .fold(LevelResolver::new(), |resolver, (name, id)| resolver.with_graph(*name, *id));
        GLOBAL_OBJECTS
            .iter()
            .fold(resolver, |resolver, (name, id)| resolver.with_global_object(*name, *id))
            .with_catalog(condition_catalog(), action_catalog())
    }

    /// The library a projectile behaviour's reserved references go through.
    pub fn projectile_library() -> CommandsSequence {
        CommandsSequence {
            name: "Shots".to_string(),
            index_in_global_storage: 1,
            key: InstanceType::Projectile,
            commands: vec![],
            behaviour_packs: [GameReservedId::ProStateLaunch, GameReservedId::ProStateDestroy]
                .into_iter()
                .map(|reserved| BehaviourPack {
                    id: reserved.value(),
                    pack: CommandPack::default(),
                })
                .collect(),
        }
    }

    /// `COM_TEST` with one state that polls `SomeCondition` and calls `DoSomething`.
    pub fn com_test_graph() -> Graph {
        Graph {
            name: "COM_TEST".to_string(),
            priority: 100,
            start_state: 0,
            states: vec![State {
                name: "StateA".to_string(),
                bodies: vec![StateBody {
                    condition: Condition {
                        check_interval: 1.0,
                        return_check: 0.5,
                        ..Condition::default()
                    },
                    commands: vec![Command {
                        index: 0,
                        arguments: vec![],
                    }],
                    ..StateBody::default()
                }],
                ..State::default()
            }],
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for bytecode objects the compiler can reproduce
    //! from their decompiled text under [`fixtures::level_resolver`].

    use super::fixtures::GRAPHS;
    use super::*;
    use proptest::prelude::*;

    /// Finite floats, with a few values that print in exponent form.
    pub fn arb_float() -> impl Strategy<Value = f32> {
        prop_oneof![
            8 => -1.0e6f32..1.0e6f32,
            1 => Just(0.0f32),
            1 => Just(1.0e-7f32),
            1 => Just(-3.5e20f32),
        ]
    }

    /// A command against the fixture action catalog.
    pub fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            Just(Command {
                index: 0,
                arguments: vec![]
            }),
            (arb_float(), any::<bool>()).prop_map(|(height, spin)| Command {
                index: 5,
                arguments: vec![height.to_bits(), u32::from(spin)],
            }),
            any::<i32>().prop_map(|turns| Command {
                index: 6,
                arguments: vec![turns as u32],
            }),
            arb_float().prop_map(|seconds| Command {
                index: 7,
                arguments: vec![seconds.to_bits()],
            }),
        ]
    }

    pub fn arb_condition() -> impl Strategy<Value = Condition> {
        (0u16..3, any::<u16>(), arb_float(), arb_float(), any::<bool>()).prop_map(
            |(index, parameter, check_interval, return_check, not_gate)| Condition {
                index,
                power_multiplier: 2.0,
                parameter,
                check_interval,
                return_check,
                not_gate,
            },
        )
    }

    /// A body that either runs commands or jumps to one of `state_count` states.
    pub fn arb_state_body(state_count: usize) -> impl Strategy<Value = StateBody> {
        (
            arb_condition(),
            any::<bool>(),
            prop::collection::vec(arb_command(), 0..4),
            prop::option::of(0..state_count as i32),
        )
            .prop_map(|(condition, unknown_flag, commands, jump)| match jump {
                Some(target) => StateBody {
                    condition,
                    unknown_flag,
                    commands: vec![],
                    jump_to_state: target,
                    has_state_jump: true,
                },
                None => StateBody {
                    condition,
                    unknown_flag,
                    commands,
                    jump_to_state: -1,
                    has_state_jump: false,
                },
            })
    }

    fn arb_setting(field: SettingField) -> impl Strategy<Value = (SettingField, u32)> {
        prop::sample::select(field.members()).prop_map(move |(_, value)| (field, value))
    }

    /// Value written into one data slot.
    #[derive(Debug, Clone, Copy)]
    enum SlotValue {
        Instance(u8),
        Int(i32),
        Float(f32),
    }

    fn arb_slot_value() -> impl Strategy<Value = SlotValue> {
        prop_oneof![
            (0..INSTANCE_FLOAT_COUNT).prop_map(SlotValue::Instance),
            any::<i32>().prop_map(SlotValue::Int),
            arb_float().prop_map(SlotValue::Float),
        ]
    }

    /// A packet with every setting chosen and each data slot written at most once.
    pub fn arb_control_packet() -> impl Strategy<Value = ControlPacket> {
        let settings: Vec<_> = SettingField::ALL.into_iter().map(arb_setting).collect();
        let slots = prop::sample::subsequence(PacketData::ALL.to_vec(), 0..=8)
            .prop_shuffle()
            .prop_flat_map(|slots| {
                let count = slots.len();
                (Just(slots), prop::collection::vec(arb_slot_value(), count))
            });

        (settings, prop::collection::vec(any::<bool>(), FLAG_SETTINGS.len()), slots).prop_map(
            |(settings, flags, (slots, values))| {
                let mut packet = ControlPacket::new();
                for (field, value) in settings {
                    packet.set_field(field, value);
                }
                for ((_, flag), enabled) in FLAG_SETTINGS.iter().zip(flags) {
                    packet.set_flag(*flag, enabled);
                }
                for (slot, value) in slots.into_iter().zip(values) {
                    match value {
                        SlotValue::Instance(index) => packet.set_data_instance_float(slot, index),
                        SlotValue::Int(v) if slot.is_integer() => packet.set_data_word(slot, v as u32),
                        SlotValue::Int(v) => packet.set_data_word(slot, (v as f32).to_bits()),
                        SlotValue::Float(v) if slot.is_integer() => packet.set_data_word(slot, v as i32 as u32),
                        SlotValue::Float(v) => packet.set_data_word(slot, v.to_bits()),
                    }
                }
                packet
            },
        )
    }

    /// Behaviour reference of a state: none, a fixture graph, or an object slot.
    fn arb_reference() -> impl Strategy<Value = (i16, bool)> {
        prop_oneof![
            Just((-1, false)),
            prop::sample::select(GRAPHS.iter().map(|(_, id)| *id as i16).collect::<Vec<_>>())
                .prop_map(|id| (id, false)),
            (0..ObjectBehaviourSlot::COUNT).prop_map(|slot| (i16::from(slot), true)),
        ]
    }

    /// State `index` of a graph with `state_count` states.
    pub fn arb_state(index: usize, state_count: usize) -> impl Strategy<Value = State> {
        (
            arb_reference(),
            any::<bool>(),
            any::<bool>(),
            prop::option::of(arb_control_packet()),
            prop::collection::vec(arb_state_body(state_count), 0..3),
        )
            .prop_map(
                move |((behaviour_index_or_slot, uses_object_slot), skips_first_body, non_blocking, control_packet, bodies)| {
                    State {
                        name: format!("State{index}"),
                        behaviour_index_or_slot,
                        skips_first_body,
                        non_blocking,
                        uses_object_slot,
                        control_packet,
                        bodies,
                    }
                },
            )
    }

    /// A graph named after a fixture graph, with 1-3 states.
    pub fn arb_graph() -> impl Strategy<Value = Graph> {
        (1usize..4).prop_flat_map(|count| {
            let states: Vec<_> = (0..count).map(|index| arb_state(index, count)).collect();
            (
                prop::sample::select(GRAPHS.iter().map(|(name, _)| *name).collect::<Vec<_>>()),
                any::<u8>(),
                0..count as i32,
                states,
            )
                .prop_map(|(name, priority, start_state, states)| Graph {
                    name: name.to_string(),
                    priority,
                    start_state,
                    states,
                })
        })
    }

    pub fn arb_assigner(behaviour: i32) -> impl Strategy<Value = Assigner> {
        (
            prop::sample::select(AssignType::ALL.to_vec()),
            prop::sample::select(AssignLocality::ALL.to_vec()),
            prop::sample::select(AssignStatus::ALL.to_vec()),
            prop::sample::select(AssignPreference::ALL.to_vec()),
            prop::sample::select(vec![NO_GLOBAL_OBJECT, 3, 7]),
        )
            .prop_map(move |(assign_type, locality, status, preference, global_object_id)| Assigner {
                behaviour,
                global_object_id,
                assign_type,
                locality,
                status,
                preference,
            })
    }

    /// Starter for a graph whose resolved reference is `graph_id`.
    pub fn arb_starter(priority: u8, graph_id: i32) -> impl Strategy<Value = Starter> {
        prop::collection::vec(arb_assigner(graph_id + 1), 0..3).prop_map(move |assigners| Starter {
            priority,
            assigners,
        })
    }

    /// Library whose linear behaviours mix reserved, fixture and unnamed ids.
    pub fn arb_commands_sequence() -> impl Strategy<Value = CommandsSequence> {
        let ids = vec![
            GameReservedId::PupStateIdle.value(),
            GameReservedId::ProStateLaunch.value(),
            GameReservedId::ProStateDestroy.value(),
            12,
            40,
            77,
        ];
        let packs = prop::sample::subsequence(ids, 0..4).prop_flat_map(|ids| {
            let count = ids.len();
            (
                Just(ids),
                prop::collection::vec(prop::collection::vec(arb_command(), 0..3), count),
            )
        });
        (
            "Lib_[A-Za-z0-9]{1,8}",
            any::<u8>(),
            prop::sample::select(InstanceType::ALL.to_vec()),
            prop::collection::vec(arb_command(), 0..3),
            packs,
        )
            .prop_map(|(name, index_in_global_storage, key, commands, (ids, packs))| CommandsSequence {
                name,
                index_in_global_storage,
                key,
                commands,
                behaviour_packs: ids
                    .into_iter()
                    .zip(packs)
                    .map(|(id, commands)| BehaviourPack {
                        id,
                        pack: CommandPack { commands },
                    })
                    .collect(),
            })
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for bytecode-specific checks.

    use super::*;

    /// Assert that a float-carrying word holds exactly `expected`.
    #[track_caller]
    pub fn assert_float_word(word: u32, expected: f32) {
        assert_eq!(
            word,
            expected.to_bits(),
            "expected {expected:?}, got {:?}",
            f32::from_bits(word)
        );
    }

    /// Assert that no data slot of `packet` is set.
    #[track_caller]
    pub fn assert_packet_data_unset(packet: &ControlPacket) {
        assert_eq!(packet.bytes.len(), PacketData::ALL.len());
        assert!(
            packet.bytes.iter().all(|byte| *byte == UNSET_SLOT),
            "expected all slots unset, got {:?}",
            packet.bytes
        );
        assert!(packet.floats.is_empty(), "expected no floats, got {:?}", packet.floats);
    }

    #[track_caller]
    pub fn assert_slot(packet: &ControlPacket, slot: PacketData, expected: DataValue) {
        assert_eq!(packet.data(slot), expected, "slot {slot}");
    }

    /// Assert the header bitfield of `state`.
    #[track_caller]
    pub fn assert_bitfield(state: &State, expected: u16) {
        assert_eq!(
            state.bitfield(),
            expected,
            "state '{}' bitfield {:#06x}, expected {expected:#06x}",
            state.name,
            state.bitfield()
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agentlab_core::{CompilerResolver, DecompilerResolver};
    use proptest::prelude::*;

    #[test]
    fn test_resolver_names_catalog_entries() {
        let resolver = fixtures::level_resolver();
        assert_eq!(resolver.condition_name(1).as_deref(), Some("Near"));
        assert_eq!(resolver.action(7).map(|a| a.name), Some("Wait".to_string()));
        assert_eq!(resolver.resolve_graph_reference("COM_OTHER"), Ok(12));
        assert_eq!(resolver.global_object_name(7).as_deref(), Some("Aku"));
    }

    #[test]
    fn test_com_test_graph_fixture() {
        let graph = fixtures::com_test_graph();
        assert_eq!(graph.priority, 100);
        assertions::assert_bitfield(&graph.states[0], 1);
        assertions::assert_float_word(graph.states[0].bodies[0].condition.return_check.to_bits(), 0.5);
    }

    #[test]
    fn test_fresh_packet_is_unset() {
        assertions::assert_packet_data_unset(&ControlPacket::new());
    }

    proptest! {
        #[test]
        fn prop_generated_packets_keep_the_always_set_bit(packet in generators::arb_control_packet()) {
            prop_assert_eq!(packet.settings & (1 << 21), 1 << 21);
            prop_assert!(packet.floats.len() <= 8);
        }

        #[test]
        fn prop_generated_jumps_stay_in_range(graph in generators::arb_graph()) {
            let count = graph.states.len() as i32;
            prop_assert!(graph.start_state < count);
            for body in graph.states.iter().flat_map(|state| &state.bodies) {
                prop_assert!(!body.has_state_jump || (0..count).contains(&body.jump_to_state));
            }
        }
    }
}
