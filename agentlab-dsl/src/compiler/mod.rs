//! AgentLab Compiler - Lower scripts to bytecode objects
//!
//! # Pipeline
//!
//! ```text
//! source → Lexer → Parser → SymbolTableBuilder → CodeGenerator → CompilerResult
//!                                  ↑                   ↓
//!                        condition/action catalogs   CompilerResolver + Descs
//! ```
//!
//! Every stage returns a `Result`; the first failure is folded into the
//! result's [`CompilerStatus`] by [`compile`].

pub mod codegen;
pub mod memory;
pub mod result;
pub mod value;

pub use codegen::CodeGenerator;
pub use memory::{AgentLabMemory, Stored};
pub use result::{CompilerResult, CompilerStatus};
pub use value::Value;

use crate::config::{Catalogs, CompilerConfig};
use crate::error::{CompileResult, ConfigError};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::symbols::SymbolTableBuilder;
use agentlab_core::{CompilerResolver, Descs};
use tracing::{debug, error};

/// Everything a compile needs besides the script.
pub struct CompilerOptions<'a> {
    pub resolver: &'a dyn CompilerResolver,
    pub descs: Descs,
    pub catalogs: Catalogs,
}

impl<'a> CompilerOptions<'a> {
    pub fn new(resolver: &'a dyn CompilerResolver, catalogs: Catalogs) -> Self {
        Self {
            resolver,
            descs: Descs::default(),
            catalogs,
        }
    }

    /// Reads the catalogs named by `config`.
    pub fn from_config(resolver: &'a dyn CompilerResolver, config: &CompilerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(resolver, config.load_catalogs()?))
    }

    pub fn with_descs(mut self, descs: Descs) -> Self {
        self.descs = descs;
        self
    }
}

impl std::fmt::Debug for CompilerOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("descs", &self.descs)
            .field("catalogs", &self.catalogs)
            .finish_non_exhaustive()
    }
}

/// Compiles `source`. Failures come back as an empty result with an error status.
pub fn compile(source: &str, options: &CompilerOptions<'_>) -> CompilerResult {
    match try_compile(source, options) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "compile failed");
            CompilerResult::failed(CompilerStatus::failed(&e))
        }
    }
}

/// Like [`compile`] but returns the error itself.
pub fn try_compile(source: &str, options: &CompilerOptions<'_>) -> CompileResult<CompilerResult> {
    let tokens = Lexer::new(source).tokenize()?;
    debug!(tokens = tokens.len(), "lexed script");

    let ast = Parser::new(tokens).parse()?;
    let symbols = SymbolTableBuilder::try_build(&ast, &options.catalogs.conditions, &options.catalogs.actions)?;

    let result = CodeGenerator::new(&symbols, options).compile(&ast)?;
    debug!(form = ast.form(), objects = ?result.kinds(), "compiled script");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, SemanticError};
    use agentlab_core::{
        CommandPack, CommandsSequence, DataValue, Graph, InstanceType, LevelResolver, PacketData, Starter,
        INSTANCE_FLOAT_BIAS,
    };

    const CONDITIONS: &str = "condition SomeCondition(int slot); condition Near(int range) [Close];";
    const ACTIONS: &str = "action DoSomething(); action Jump(float height, bool spin) : 5; action Spin(int turns);";

    fn options(resolver: &LevelResolver) -> CompilerOptions<'_> {
        CompilerOptions::new(resolver, Catalogs::new(CONDITIONS, ACTIONS))
    }

    fn compiled(source: &str) -> CompilerResult {
        let resolver = LevelResolver::new().with_graph("COM_TEST", 40).with_global_object("Crash", 3);
        let result = compile(source, &options(&resolver));
        assert!(result.status().is_ok(), "{}", result.status());
        result
    }

    fn body(actions: &str) -> String {
        format!(
            "behaviour COM_TEST {{ state S() {{ if SomeCondition(2) >= 0.5 {{ interval = 1.0; Unknown = true; {actions} }} }} }}"
        )
    }

    #[test]
    fn test_argument_words() {
        let result = compiled(&body("Jump(-2.5, true); Spin(-1);"));
        let graph = result.get::<Graph>().unwrap();
        let commands = &graph.states[0].bodies[0].commands;
        assert_eq!(commands[0].index, 5);
        assert_eq!(commands[0].arguments, vec![(-2.5f32).to_bits(), 1]);
        assert_eq!(commands[1].index, 6);
        assert_eq!(commands[1].arguments, vec![0xFFFF_FFFF]);
        assert_eq!(result.get::<CommandPack>().map(|p| p.commands.len()), Some(2));
    }

    #[test]
    fn test_unary_minus_is_folded() {
        let result = compiled(
            "behaviour COM_TEST { const h = 2.0; state S() { if SomeCondition() >= -h { interval = -(1 + 1); Unknown = false; Jump(-h * 2.0, false); } } }",
        );
        let body = &result.get::<Graph>().unwrap().states[0].bodies[0];
        assert_eq!(body.condition.return_check, -2.0);
        assert_eq!(body.condition.check_interval, -2.0);
        assert_eq!(body.commands[0].arguments[0], (-4.0f32).to_bits());
    }

    #[test]
    fn test_condition_fields() {
        let result = compiled(
            "behaviour COM_TEST { state S() { if Close(7) <= 3 { interval = 0.25; Unknown = true; execute S; } } }",
        );
        let body = &result.get::<Graph>().unwrap().states[0].bodies[0];
        assert_eq!(body.condition.index, 1);
        assert_eq!(body.condition.parameter, 7);
        assert!(body.condition.not_gate);
        assert_eq!(body.condition.power_multiplier, 2.0);
        assert!(body.unknown_flag);
        assert_eq!(body.jump_to_state, 0);
        assert!(body.has_state_jump);
        assert!(body.commands.is_empty());
    }

    #[test]
    fn test_control_packet_tables() {
        let result = compiled(
            r#"
            behaviour COM_TEST {
                const speed = 2;
                packet P {
                    settings { MotionType = SPRING; SpaceType = CHASE_SPACE; Stalls = true; }
                    data { MoveSpeed = speed * 1.5; Selector = 3; Yaw = InstanceFloat[speed + 1]; MoveSpeed = 4.0; }
                }
                [ControlPacket(P)]
                state S() { }
            }
            "#,
        );
        let state = &result.get::<Graph>().unwrap().states[0];
        let packet = state.control_packet.as_ref().unwrap();
        assert_eq!(packet.settings, (1 << 21) | (1 << 31) | (3 << 3) | 4);
        assert_eq!(packet.data(PacketData::Yaw), DataValue::InstanceFloat(3));
        assert_eq!(packet.bytes[PacketData::Yaw.value() as usize], INSTANCE_FLOAT_BIAS + 3);
        assert_eq!(packet.floats, vec![4.0f32.to_bits(), 3]);
        assert_eq!(packet.bytes[PacketData::MoveSpeed.value() as usize], 0);
        assert_eq!(state.bitfield() & 0x4000, 0x4000);
    }

    #[test]
    fn test_instance_float_out_of_bounds() {
        let resolver = LevelResolver::new();
        let result = try_compile(
            "behaviour B { packet P { data { Yaw = InstanceFloat[126]; } } }",
            &options(&resolver),
        );
        assert!(matches!(
            result,
            Err(CompileError::Semantic(SemanticError::IndexOutOfBounds { index: 126, .. }))
        ));
    }

    #[test]
    fn test_starter_inherits_priority() {
        let result = compiled(
            r#"
            [Priority(9)]
            behaviour COM_TEST {
                starter {
                    assigner = { AssignType = GLOBAL_AGENT; AssignLocality = ANYWHERE; GlobalObjectId = "Crash"; }
                    assigner = { AssignStatus = BUSY; GlobalObjectId = ""; }
                }
            }
            "#,
        );
        let starter = result.get::<Starter>().unwrap();
        assert_eq!(starter.priority, 9);
        assert_eq!(starter.assigners.len(), 2);
        assert_eq!(starter.assigners[0].behaviour, 41);
        assert_eq!(starter.assigners[0].global_object_id, 3);
        assert_eq!(starter.assigners[0].packed() & 0xFF, 3 | (3 << 4));
        assert_eq!(starter.assigners[1].global_object_id, 0xFFFF);
        assert_eq!(result.get::<Graph>().map(|g| g.priority), Some(9));
    }

    #[test]
    fn test_state_flags_and_references() {
        let resolver = LevelResolver::new().with_graph("COM_OTHER", 12);
        let result = compile(
            r#"
            [StartFrom(Second)]
            behaviour B {
                [NonBlocking] [SkipFirstBody]
                state First("COM_OTHER") { }
                [UseObjectSlot(OnTouch)]
                state Second("COM_OTHER") { }
                state Third() { }
            }
            "#,
            &options(&resolver),
        );
        let graph = result.get::<Graph>().unwrap();
        assert_eq!(graph.start_state, 1);
        assert_eq!(graph.states[0].behaviour_index_or_slot, 12);
        assert!(graph.states[0].non_blocking && graph.states[0].skips_first_body);
        assert!(graph.states[1].uses_object_slot);
        assert_eq!(graph.states[1].behaviour_index_or_slot, 3);
        assert_eq!(graph.states[2].behaviour_index_or_slot, -1);
    }

    #[test]
    fn test_library_sequence() {
        let resolver = LevelResolver::new().with_graph("SPARKLE", 40);
        let result = compile(
            r#"
            [GlobalIndex(2)] [InstanceType(Projectile)]
            library Shots {
                behaviour PRO_STATE_LAUNCH { Spin(1); }
                behaviour SPARKLE { DoSomething(); }
                Jump(1.0, false);
            }
            "#,
            &options(&resolver),
        );
        assert!(result.status().is_ok(), "{}", result.status());
        let sequence = result.get::<CommandsSequence>().unwrap();
        assert_eq!(sequence.key, InstanceType::Projectile);
        assert_eq!(sequence.header(), (2 << 16) | (2 << 8) | 0x12);
        assert_eq!(sequence.behaviour_packs[0].id, 594);
        assert_eq!(sequence.behaviour_packs[1].id, 40);
        assert_eq!(sequence.commands.len(), 1);
        assert_eq!(result.get::<CommandPack>().map(|p| p.commands[0].index), Some(6));
    }

    #[test]
    fn test_failures_become_status() {
        let resolver = LevelResolver::new();
        let result = compile(&body("Missing();"), &options(&resolver));
        assert!(result.is_error());
        assert!(result.is_empty());
        assert!(result.status().message.contains("Missing"));

        let result = compile("behaviour {", &options(&resolver));
        assert!(result.is_error());
    }

    #[test]
    fn test_unknown_graph_is_a_resolve_error() {
        let resolver = LevelResolver::new();
        let err = try_compile(
            "behaviour B { state S(\"COM_NOWHERE\") { } }",
            &options(&resolver),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Resolve(_)));
    }

    #[test]
    fn test_bare_action_list() {
        let result = compiled("DoSomething(); Jump(0.5, true);");
        let pack = result.get::<CommandPack>().unwrap();
        assert_eq!(pack.commands.len(), 2);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_definition_scripts_register_nothing() {
        let result = compiled("action Extra(int a);");
        assert!(result.is_empty());
    }
}
