//! Symbol table construction over whole scripts.

use agentlab_dsl::{
    parse, BuiltinType, CompileError, CompileResult, SemanticError, SymbolKind, SymbolTable, SymbolTableBuilder,
};
use agentlab_test_utils::fixtures::{ACTION_DEFINITIONS, CONDITION_DEFINITIONS};
use agentlab_test_utils::ParamType;

fn build(source: &str) -> CompileResult<SymbolTable> {
    let ast = parse(source)?;
    SymbolTableBuilder::try_build(&ast, CONDITION_DEFINITIONS, ACTION_DEFINITIONS)
}

fn semantic(source: &str) -> SemanticError {
    match build(source) {
        Err(CompileError::Semantic(error)) => error,
        other => panic!("expected a semantic error, got {other:?}"),
    }
}

fn behaviour_scope<'a>(table: &'a SymbolTable, name: &str) -> &'a SymbolTable {
    table.lookup(name).and_then(|s| s.scope()).expect("behaviour scope")
}

#[test]
fn test_catalog_ids() -> CompileResult<()> {
    let table = build("DoSomething();")?;
    let action = |name: &str| match table.lookup(name).map(|s| &s.kind) {
        Some(SymbolKind::Action { id, parameters }) => (*id, parameters.clone()),
        other => panic!("{name}: {other:?}"),
    };
    assert_eq!(action("DoSomething"), (0, vec![]));
    assert_eq!(action("Jump"), (5, vec![ParamType::Float, ParamType::Bool]));
    assert_eq!(action("Spin"), (6, vec![ParamType::Int]));
    assert_eq!(action("Wait").0, 7);
    assert_eq!(action("Sleep").0, 7);

    match table.lookup("Close").map(|s| &s.kind) {
        Some(SymbolKind::Condition {
            id,
            return_type,
            parameter,
        }) => {
            assert_eq!(*id, 1);
            assert_eq!(*return_type, BuiltinType::Float);
            assert_eq!(*parameter, Some(ParamType::Int));
        }
        other => panic!("Close: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_explicit_ids_restart_the_sequence() -> CompileResult<()> {
    let ast = parse("DoSomething();")?;
    let table = SymbolTableBuilder::try_build(
        &ast,
        "",
        "action DoSomething(); action A() : 40; action B(); action C() : 3; action D();",
    )?;
    let ids: Vec<u16> = ["DoSomething", "A", "B", "C", "D"]
        .iter()
        .map(|name| match table.lookup(name).map(|s| &s.kind) {
            Some(SymbolKind::Action { id, .. }) => *id,
            other => panic!("{name}: {other:?}"),
        })
        .collect();
    assert_eq!(ids, vec![0, 40, 41, 3, 4]);
    Ok(())
}

#[test]
fn test_behaviour_scope_contents() -> CompileResult<()> {
    let table = build(
        r#"
        behaviour COM_TEST {
            const speed = base * 2;
            const base = 3;
            packet P { }
            state First() { }
            state Second() { }
        }
        "#,
    )?;
    let scope = behaviour_scope(&table, "COM_TEST");
    assert_eq!(scope.lookup("First").and_then(|s| s.state_id()), Some(0));
    assert_eq!(scope.lookup("Second").and_then(|s| s.state_id()), Some(1));
    assert!(matches!(scope.lookup("P").map(|s| &s.kind), Some(SymbolKind::ControlPacket)));
    assert_eq!(scope.lookup("speed").and_then(|s| s.ty), Some(BuiltinType::Integer));
    assert!(scope.lookup("Jump").is_some());
    assert!(table.lookup("speed").is_none());
    Ok(())
}

#[test]
fn test_duplicate_const() {
    assert_eq!(
        semantic("behaviour B { const a = 1; const a = 2.0; }"),
        SemanticError::Redefinition { name: "a".to_string() }
    );
}

#[test]
fn test_undefined_execute_target() {
    assert!(matches!(
        semantic("behaviour B { state S() { if Timer() >= 1 { interval = 0; Unknown = false; execute Missing; } } }"),
        SemanticError::UndefinedReference { ref name, .. } if name == "Missing"
    ));
}

#[test]
fn test_forward_execute_and_start() -> CompileResult<()> {
    build(
        r#"
        [StartFrom(Later)]
        behaviour B {
            state Early() { if Timer() >= 1 { interval = 0; Unknown = false; execute Later; } }
            state Later() { }
        }
        "#,
    )?;
    Ok(())
}

#[test]
fn test_state_cannot_shadow_an_action() {
    assert_eq!(
        semantic("behaviour B { state Jump() { } }"),
        SemanticError::Redefinition { name: "Jump".to_string() }
    );
}

#[test]
fn test_const_cycle() {
    assert!(matches!(
        semantic("behaviour B { const a = b + 1; const b = a; }"),
        SemanticError::ConstCycle { .. }
    ));
}

#[test]
fn test_action_argument_types() {
    assert!(matches!(
        semantic("Jump(1, true);"),
        SemanticError::TypeMismatch { .. }
    ));
    assert_eq!(
        semantic("Spin();"),
        SemanticError::ArgumentCount {
            name: "Spin".to_string(),
            expected: 1,
            found: 0,
        }
    );
}

#[test]
fn test_unknown_packet_entries() {
    assert!(matches!(
        semantic("behaviour B { packet P { settings { Wobbles = true; } } }"),
        SemanticError::UnknownEntry { .. }
    ));
    assert!(matches!(
        semantic("behaviour B { packet P { settings { MotionType = SIDEWAYS; } } }"),
        SemanticError::UnknownEnumMember { .. }
    ));
}

#[test]
fn test_failed_build_reports_status() -> CompileResult<()> {
    let ast = parse("Missing();")?;
    let (table, status) = SymbolTableBuilder::build(&ast, CONDITION_DEFINITIONS, ACTION_DEFINITIONS);
    assert!(status.is_error);
    assert!(status.message.contains("Missing"));
    assert!(table.lookup("DoSomething").is_some());
    Ok(())
}

#[test]
fn test_broken_catalog_is_named() -> CompileResult<()> {
    let ast = parse("DoSomething();")?;
    let err = SymbolTableBuilder::try_build(&ast, "condition Broken(", ACTION_DEFINITIONS).unwrap_err();
    assert!(matches!(err, CompileError::Catalog { catalog: "condition", .. }));
    Ok(())
}
