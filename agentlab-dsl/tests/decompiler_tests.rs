//! Decompiler output and compile → decompile → compile agreement.

use agentlab_dsl::{
    decompile, decompile_result, try_compile, Catalogs, CompileError, CompilerOptions, CompilerResult,
    DecompileError,
};
use agentlab_test_utils::fixtures::{self, ACTION_DEFINITIONS, CONDITION_DEFINITIONS};
use agentlab_test_utils::{
    Command, CommandPack, CommandsSequence, ControlPacket, Graph, LevelResolver, PacketData, SettingField, Starter,
    State,
};

fn recompile(resolver: &LevelResolver, text: &str) -> Result<CompilerResult, CompileError> {
    try_compile(
        text,
        &CompilerOptions::new(resolver, Catalogs::new(CONDITION_DEFINITIONS, ACTION_DEFINITIONS)),
    )
}

#[test]
fn test_com_test_text() -> Result<(), DecompileError> {
    let text = decompile(&fixtures::com_test_graph(), &fixtures::level_resolver())?;
    assert_eq!(
        text,
        "[Priority(100)]
behaviour COM_TEST {
    state StateA() {
        if SomeCondition(0) >= 0.5 {
            interval = 1.0;
            Unknown = false;
            DoSomething();
        }
    }
}
"
    );
    Ok(())
}

#[test]
fn test_graph_with_starter_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let source = r#"
        [Priority(3)]
        [StartFrom(Chase)]
        behaviour COM_OTHER {
            starter {
                assigner = { AssignType = HUMAN_PLAYER; AssignLocality = LOCAL; GlobalObjectId = "Crash"; }
                assigner = { AssignStatus = ANYSTATE; }
            }
            packet Fast {
                settings { SpaceType = TARGET_SPACE; MotionType = SPRING; DoesTranslate = true; Stalls = true; }
                data { Yaw = 0.000001; MoveSpeed = 12.5; Selector = -4; Roll = InstanceFloat[3]; }
            }
            [NonBlocking]
            state Idle("SPARKLE") {
                if Close(30) <= -2 { interval = 0.5; Unknown = true; execute Chase; }
            }
            [ControlPacket(Fast)] [UseObjectSlot(Slot_93)] [SkipFirstBody]
            state Chase() {
                if Timer() >= 1e20 { interval = 0; Unknown = false; Jump(-1.5, true); Spin(-7); Sleep(3); }
                if SomeCondition(65535) >= 0 { interval = 0; Unknown = false; }
            }
        }
    "#;
    let resolver = fixtures::level_resolver();
    let first = recompile(&resolver, source);
    assert!(matches!(first, Err(CompileError::Semantic(_))), "Sleep(3) passes an int to a float");

    let source = source.replace("Sleep(3)", "Sleep(3.0)");
    let first = recompile(&resolver, &source)?;
    let graph = first.get::<Graph>().unwrap();
    let starter = first.get::<Starter>().unwrap();

    let resolver = resolver.with_starter(starter.clone());
    let text = decompile(graph, &resolver)?;
    assert!(text.contains("[StartFrom(Chase)]"));
    assert!(text.contains("[UseObjectSlot(Slot_93)]"));
    assert!(text.contains("state Idle(\"SPARKLE\")"));
    assert!(text.contains("GlobalObjectId = \"Crash\";"));

    let second = recompile(&resolver, &text)?;
    assert_eq!(second.get::<Graph>(), Some(graph));
    assert_eq!(second.get::<Starter>(), Some(starter));
    Ok(())
}

#[test]
fn test_reassigned_data_slot_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let resolver = fixtures::level_resolver();
    let first = recompile(
        &resolver,
        r#"
        behaviour COM_TEST {
            packet Aim {
                data { MoveSpeed = 4.0; Yaw = 1.0; Roll = 2.0; Yaw = InstanceFloat[2]; }
            }
            [ControlPacket(Aim)]
            state Track() { }
        }
        "#,
    )?;
    let graph = first.get::<Graph>().unwrap();
    let packet = graph.states[0].control_packet.as_ref().unwrap();
    assert_eq!(packet.floats, vec![4.0f32.to_bits(), 2.0f32.to_bits()]);

    let text = decompile(graph, &resolver)?;
    let second = recompile(&resolver, &text)?;
    assert_eq!(second.get::<Graph>(), Some(graph), "{text}");
    Ok(())
}

#[test]
fn test_library_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let resolver = fixtures::level_resolver();
    let first = recompile(
        &resolver,
        r#"
        [GlobalIndex(9)] [InstanceType(Projectile)]
        library Shots {
            behaviour PRO_STATE_TRAVEL { Wait(0.1); }
            behaviour COM_TEST { }
            behaviour Behaviour_300 { DoSomething(); DoSomething(); }
            Jump(2.0, false);
        }
        "#,
    )?;
    let sequence = first.get::<CommandsSequence>().unwrap();
    let text = decompile(sequence, &resolver)?;
    assert!(text.contains("behaviour PRO_STATE_TRAVEL {"));
    assert!(text.contains("behaviour COM_TEST {"));
    assert!(text.contains("behaviour Behaviour_300 {"));

    let second = recompile(&resolver, &text)?;
    assert_eq!(second.get::<CommandsSequence>(), Some(sequence));
    Ok(())
}

#[test]
fn test_bare_pack_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let resolver = fixtures::level_resolver();
    let first = recompile(&resolver, "Spin(2147483647); Spin(-2147483648); Jump(0.0, false);")?;
    let pack = first.get::<CommandPack>().unwrap();
    let text = decompile(pack, &resolver)?;
    assert_eq!(text, "Spin(2147483647);\nSpin(-2147483648);\nJump(0.0, false);\n");
    assert_eq!(recompile(&resolver, &text)?.get::<CommandPack>(), Some(pack));
    Ok(())
}

#[test]
fn test_result_objects_decompile_independently() -> Result<(), CompileError> {
    let resolver = fixtures::level_resolver();
    let result = recompile(&resolver, "[GlobalIndex(1)] library L { behaviour Behaviour_5 { Spin(1); } }")?;

    let empty = LevelResolver::new();
    let objects = decompile_result(&result, &empty);
    assert_eq!(objects.len(), 2);
    for object in objects {
        assert_eq!(object.text, Err(DecompileError::UnnamedAction { index: 6 }), "{}", object.kind);
    }

    let objects = decompile_result(&result, &resolver);
    assert!(objects.iter().all(|object| object.text.is_ok()));
    Ok(())
}

#[test]
fn test_malformed_objects() {
    let resolver = fixtures::level_resolver();

    let mut packet = ControlPacket::new();
    packet.set_field(SettingField::Motion, 15);
    let graph = Graph {
        name: "COM_TEST".to_string(),
        states: vec![State {
            control_packet: Some(packet),
            ..State::default()
        }],
        ..Graph::default()
    };
    assert_eq!(
        decompile(&graph, &resolver),
        Err(DecompileError::UnknownSettingValue {
            field: "MotionType",
            value: 15,
        })
    );

    let mut packet = ControlPacket::new();
    packet.set_data_word(PacketData::Power, f32::INFINITY.to_bits());
    let graph = Graph {
        states: vec![State {
            control_packet: Some(packet),
            ..State::default()
        }],
        ..graph
    };
    assert!(matches!(decompile(&graph, &resolver), Err(DecompileError::NonFiniteFloat { .. })));

    let pack = CommandPack {
        commands: vec![Command {
            index: 5,
            arguments: vec![0, 2],
        }],
    };
    assert_eq!(
        decompile(&pack, &resolver),
        Err(DecompileError::NotBoolean {
            name: "Jump".to_string(),
            word: 2,
        })
    );

    let pack = CommandPack {
        commands: vec![Command {
            index: 6,
            arguments: vec![],
        }],
    };
    assert!(matches!(
        decompile(&pack, &resolver),
        Err(DecompileError::ArgumentCount { expected: 1, found: 0, .. })
    ));
}
