/// AgentLab Tracer - Shows the flow through Lexer → Parser → Compiler → Decompiler
///
/// Usage: cargo run --bin trace_agentlab <script> [agentlab.toml]
///
/// Set RUST_LOG (e.g. `RUST_LOG=agentlab_dsl=trace`) to see per-stage logging.

use agentlab_core::{CommandPack, CommandsSequence, Graph, LevelResolver, Starter};
use agentlab_dsl::{
    decompile_result, pretty_print, try_compile, Ast, CompilerConfig, CompilerOptions, Lexer, Parser,
    SymbolTableBuilder,
};
use serde::Serialize;
use std::fs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn section(title: &str) {
    println!("{title}");
    println!("─────────────────────────────────────────────────────────────");
}

fn dump<T: Serialize>(label: &str, object: Option<&T>) {
    if let Some(object) = object {
        match serde_json::to_string_pretty(object) {
            Ok(json) => println!("{label}:\n{json}\n"),
            Err(e) => eprintln!("❌ Failed to serialize {label}: {e}"),
        }
    }
}

fn fail(message: String) -> ! {
    eprintln!("❌ {message}");
    std::process::exit(1);
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agentlab_dsl=info"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_agentlab <script> [agentlab.toml]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_agentlab scripts/com_test.al agentlab.toml");
        std::process::exit(1);
    }

    let config = match args.get(2) {
        Some(path) => CompilerConfig::from_file(path).unwrap_or_else(|e| fail(format!("Failed to load {path}: {e}"))),
        None => CompilerConfig::default(),
    };
    let source = fs::read_to_string(&args[1]).unwrap_or_else(|e| fail(format!("Failed to read {}: {e}", args[1])));

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ AGENTLAB COMPILER TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    section("🔤 TOKENS:");
    let tokens = Lexer::new(&source)
        .tokenize()
        .unwrap_or_else(|e| fail(format!("Lex error: {e}")));
    for token in &tokens {
        println!("{:>4}:{:<3} {:?}", token.span.line, token.span.column, token.kind);
    }
    println!();

    section("🌳 AST:");
    let ast = Parser::new(tokens)
        .parse()
        .unwrap_or_else(|e| fail(format!("Parse error: {e}")));
    println!("{}", pretty_print(&ast));

    let catalogs = config
        .load_catalogs()
        .unwrap_or_else(|e| fail(format!("Failed to load catalogs: {e}")));

    section("📚 SYMBOLS:");
    let (symbols, status) = SymbolTableBuilder::build(&ast, &catalogs.conditions, &catalogs.actions);
    println!("{} root symbols, status: {status}\n", symbols.len());

    // The script's own behaviour resolves to graph 0 so its starter compiles.
    let mut resolver = LevelResolver::new().with_catalog(symbols.condition_names(), symbols.action_signatures());
    if let Ast::Behaviour(behaviour) = &ast {
        resolver = resolver.with_graph(behaviour.name.clone(), 0);
    }
    let options = CompilerOptions::new(&resolver, catalogs);

    section("⚙️  BYTECODE:");
    let result = try_compile(&source, &options).unwrap_or_else(|e| fail(format!("Compile error: {e}")));
    println!("status: {}", result.status());
    dump("Graph", result.get::<Graph>());
    dump("Starter", result.get::<Starter>());
    dump("CommandsSequence", result.get::<CommandsSequence>());
    dump("CommandPack", result.get::<CommandPack>());

    section("🔄 DECOMPILED:");
    resolver.set_starter(result.get::<Starter>().cloned());
    for object in decompile_result(&result, &resolver) {
        match object.text {
            Ok(text) => println!("// {}\n{text}", object.kind),
            Err(e) => println!("// {} failed: {e}\n", object.kind),
        }
    }

    println!("✅ Trace complete!");
}
