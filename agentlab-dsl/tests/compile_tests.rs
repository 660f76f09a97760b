//! End-to-end compile tests: script text in, bytecode objects out.

use agentlab_dsl::{
    compile, interpret, try_compile, Catalogs, CompileError, CompilerConfig, CompilerOptions, CompilerResult,
    Lexer, LexError, ParseError, SemanticError, TokenKind, Value,
};
use agentlab_test_utils::assertions::{assert_bitfield, assert_float_word, assert_packet_data_unset, assert_slot};
use agentlab_test_utils::fixtures::{self, ACTION_DEFINITIONS, CONDITION_DEFINITIONS};
use agentlab_test_utils::{
    CommandPack, CommandsSequence, DataValue, GameReservedId, Graph, InstanceType, LevelResolver, PacketData, Starter,
};

fn catalogs() -> Catalogs {
    Catalogs::new(CONDITION_DEFINITIONS, ACTION_DEFINITIONS)
}

fn compile_with(resolver: &LevelResolver, source: &str) -> CompilerResult {
    let result = compile(source, &CompilerOptions::new(resolver, catalogs()));
    assert!(!result.is_error(), "{}", result.status());
    result
}

const COM_TEST: &str = r#"
[Priority(100)]
behaviour COM_TEST {
    const my_const = 10.0 + 2.0;
    state StateA() {
        if SomeCondition(0) >= 0.5 {
            interval = 1.0;
            Unknown = false;
            DoSomething();
        }
    }
}
"#;

#[test]
fn test_com_test_end_to_end() {
    let result = compile_with(&fixtures::level_resolver(), COM_TEST);

    let graph = result.get::<Graph>().expect("graph");
    assert_eq!(graph.priority, 100);
    assert_eq!(graph.states.len(), 1);

    let state = &graph.states[0];
    assert_eq!(state.name, "StateA");
    assert_eq!(state.bodies.len(), 1);

    let body = &state.bodies[0];
    assert!(!body.condition.not_gate);
    assert_eq!(body.condition.check_interval, 1.0);
    assert_eq!(body.condition.return_check, 0.5);
    assert_eq!(body.commands.len(), 1);
    assert_eq!(body.commands[0].index, 0);
    assert!(body.commands[0].arguments.is_empty());

    assert_eq!(*graph, fixtures::com_test_graph());
    assert_eq!(interpret("10.0 + 2.0"), Some(Value::Float(12.0)));
}

#[test]
fn test_result_registry_kinds() {
    let result = compile_with(&fixtures::level_resolver(), COM_TEST);
    assert!(result.contains::<Graph>());
    assert!(result.contains::<CommandPack>());
    assert!(!result.contains::<Starter>());
    assert!(!result.contains::<CommandsSequence>());
    assert_eq!(result.len(), 2);
}

#[test]
fn test_lexer_examples() -> Result<(), LexError> {
    let kinds = |source: &str| -> Result<Vec<TokenKind>, LexError> {
        Ok(Lexer::new(source).tokenize()?.into_iter().map(|t| t.kind).collect())
    };
    assert_eq!(kinds("0xFF")?, vec![TokenKind::Integer(255), TokenKind::Eof]);
    assert_eq!(kinds("-12.5")?, vec![TokenKind::Float(-12.5), TokenKind::Eof]);
    assert_eq!(
        kinds("10 - 5")?,
        vec![TokenKind::Integer(10), TokenKind::Subtract, TokenKind::Integer(5), TokenKind::Eof]
    );
    Ok(())
}

#[test]
fn test_digit_run_absorbs_a_trailing_minus() {
    assert!(matches!(
        Lexer::new("10-5").tokenize(),
        Err(LexError::InvalidNumber { ref text, .. }) if text == "10-5"
    ));
    assert_eq!(
        Lexer::new("1e-7").tokenize().map(|tokens| tokens[0].kind.clone()),
        Ok(TokenKind::Float(1e-7))
    );
}

#[test]
fn test_unset_packet_tables() {
    let result = compile_with(
        &fixtures::level_resolver(),
        r#"
        behaviour COM_TEST {
            packet Idle { settings { DoesRotate = true; } }
            [ControlPacket(Idle)] [NonBlocking]
            state Rest() { }
        }
        "#,
    );
    let state = &result.get::<Graph>().unwrap().states[0];
    let packet = state.control_packet.as_ref().unwrap();
    assert_packet_data_unset(packet);
    assert_eq!(packet.settings, (1 << 21) | (1 << 14));
    assert_bitfield(state, 0x4000 | 0x800);
}

#[test]
fn test_packet_data_words() {
    let result = compile_with(
        &fixtures::level_resolver(),
        r#"
        behaviour COM_TEST {
            const half = 0.5;
            packet Move {
                settings { MotionType = CONSTANT_VEL; Axes = ALL_NATURAL; }
                data { MoveSpeed = half * 4; JointIndex = -2; Delay = InstanceFloat[125]; }
            }
            [ControlPacket(Move)]
            state Go() { }
        }
        "#,
    );
    let packet = result.get::<Graph>().unwrap().states[0].control_packet.clone().unwrap();
    assert_eq!(packet.settings, (1 << 21) | (1 << 3) | (4 << 27));
    assert_slot(&packet, PacketData::MoveSpeed, DataValue::Word { index: 0, word: Some(2.0f32.to_bits()) });
    assert_slot(&packet, PacketData::JointIndex, DataValue::Word { index: 1, word: Some(-2i32 as u32) });
    assert_slot(&packet, PacketData::Delay, DataValue::InstanceFloat(125));
    assert_slot(&packet, PacketData::Yaw, DataValue::Unset);
}

#[test]
fn test_starter_assigners() {
    let result = compile_with(
        &fixtures::level_resolver(),
        r#"
        [Priority(7)]
        behaviour COM_OTHER {
            starter {
                assigner = { AssignType = ORIGINATOR; AssignPreference = BEST_ALIGNED; GlobalObjectId = "Aku"; }
            }
        }
        "#,
    );
    let starter = result.get::<Starter>().unwrap();
    assert_eq!(starter.priority, 7);
    let assigner = &starter.assigners[0];
    assert_eq!(assigner.behaviour, 13);
    assert_eq!(assigner.packed(), (7 << 16) | 8 | (4 << 12));
}

#[test]
fn test_reserved_reference_through_associated_library() {
    let resolver = fixtures::level_resolver().with_associated_sequence(fixtures::projectile_library());
    let result = compile_with(
        &resolver,
        r#"
        behaviour COM_TEST {
            state Fire("PRO_STATE_LAUNCH") { }
            state Gone("PRO_STATE_DESTROY") { }
        }
        "#,
    );
    let graph = result.get::<Graph>().unwrap();
    assert_eq!(graph.states[0].behaviour_index_or_slot, 594);
    assert_eq!(graph.states[1].behaviour_index_or_slot, 610);

    let err = try_compile(
        "behaviour COM_TEST { state Idle(\"PUP_STATE_IDLE\") { } }",
        &CompilerOptions::new(&resolver, catalogs()),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Resolve(_)));
}

#[test]
fn test_object_slot_skips_behaviour_reference() {
    let result = compile_with(
        &fixtures::level_resolver(),
        r#"
        behaviour COM_TEST {
            [UseObjectSlot(Slot_93)]
            state Bound("NOT_A_GRAPH") { }
        }
        "#,
    );
    let state = &result.get::<Graph>().unwrap().states[0];
    assert!(state.uses_object_slot);
    assert_eq!(state.behaviour_index_or_slot, 93);

    let err = try_compile(
        "behaviour COM_TEST { state Loose(\"NOT_A_GRAPH\") { } }",
        &CompilerOptions::new(&fixtures::level_resolver(), catalogs()),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Resolve(_)));
}

#[test]
fn test_library_compiles_to_commands_sequence() {
    let result = compile_with(
        &fixtures::level_resolver(),
        r#"
        [GlobalIndex(3)]
        [InstanceType(Pickup)]
        library Gems {
            behaviour PUP_STATE_IDLE { Spin(2); }
            behaviour SPARKLE { Sleep(0.25); }
            behaviour Behaviour_77 { }
            Jump(1.5, true);
        }
        "#,
    );
    let sequence = result.get::<CommandsSequence>().unwrap();
    assert_eq!(sequence.name, "Gems");
    assert_eq!(sequence.key, InstanceType::Pickup);
    assert_eq!(sequence.header(), (3 << 16) | (3 << 8) | 0x11);
    let ids: Vec<u16> = sequence.behaviour_packs.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![GameReservedId::PupStateIdle.value(), 41, 77]);
    assert_float_word(sequence.behaviour_packs[1].pack.commands[0].arguments[0], 0.25);
    assert_eq!(sequence.behaviour_packs[1].pack.commands[0].index, 7);
    assert_eq!(sequence.commands[0].arguments[1], 1);
}

#[test]
fn test_compile_from_config() -> Result<(), CompileError> {
    let config = CompilerConfig::from_toml_str(&format!(
        "[definitions.conditions]\ntext = '''{CONDITION_DEFINITIONS}'''\n\n[definitions.actions]\ntext = '''{ACTION_DEFINITIONS}'''\n"
    ))?;
    let resolver = fixtures::level_resolver();
    let options = CompilerOptions::from_config(&resolver, &config)?;
    let result = try_compile("Wait(2); Spin(3);", &options);
    assert!(matches!(
        result,
        Err(CompileError::Semantic(SemanticError::TypeMismatch { .. }))
    ));

    let result = try_compile("Wait(2.0); Spin(3);", &options)?;
    let pack = result.get::<CommandPack>().unwrap();
    assert_eq!(pack.commands.iter().map(|c| c.index).collect::<Vec<_>>(), vec![7, 6]);
    Ok(())
}

#[test]
fn test_first_error_becomes_status() {
    let resolver = fixtures::level_resolver();
    let options = CompilerOptions::new(&resolver, catalogs());

    let result = compile("behaviour COM_TEST { state A() { if Nope() >= 1 { interval = 0; Unknown = false; } } }", &options);
    assert!(result.is_error());
    assert!(result.is_empty());
    assert!(result.status().message.contains("Nope"));

    let result = compile("behaviour COM_TEST { state A() { } state A() { } }", &options);
    assert!(result.is_error());

    let err = try_compile("[Priority(1)] [Priority(2)", &options).unwrap_err();
    assert!(matches!(err, CompileError::Parse(ParseError::UnexpectedToken { .. })));
}

#[test]
fn test_duplicate_attribute_last_wins() {
    let result = compile_with(&fixtures::level_resolver(), "[Priority(1)] [Priority(9)] behaviour COM_TEST { }");
    assert_eq!(result.get::<Graph>().unwrap().priority, 9);
}
