//! Fuzz test for the AgentLab Parser
//!
//! Parses arbitrary UTF-8 and, when it parses, pushes it through the pretty
//! printer and the compiler. Nothing on that path may panic.
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use agentlab_core::LevelResolver;
use agentlab_dsl::{compile, decompile_result, parse, pretty_print, Catalogs, CompilerOptions, ParseError};
use libfuzzer_sys::fuzz_target;

const CONDITIONS: &str = "condition SomeCondition(int slot); condition Timer();";
const ACTIONS: &str = "action DoSomething(); action Jump(float height, bool spin); action Spin(int turns);";

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let ast = match parse(input) {
        Ok(ast) => ast,
        Err(ParseError::UnexpectedToken { line, column, .. }) => {
            assert!(line >= 1 && column >= 1, "error location out of range");
            return;
        }
        Err(_) => return,
    };

    // Canonical text must parse back to the same tree.
    let printed = pretty_print(&ast);
    assert_eq!(parse(&printed).as_ref(), Ok(&ast), "pretty printer output:\n{printed}");

    let resolver = LevelResolver::new();
    let result = compile(input, &CompilerOptions::new(&resolver, Catalogs::new(CONDITIONS, ACTIONS)));
    if !result.is_error() {
        let _ = decompile_result(&result, &resolver);
    }
});
