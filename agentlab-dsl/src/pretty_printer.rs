//! Pretty printer for AgentLab ASTs
//!
//! Output re-parses to an equal AST. Parentheses are emitted around nested
//! binary operands, which the parser drops again.

use crate::parser::*;

/// Pretty-print an AST back to AgentLab source.
pub fn pretty_print(ast: &Ast) -> String {
    match ast {
        Ast::Behaviour(behaviour) => pretty_print_behaviour(behaviour),
        Ast::Library(library) => pretty_print_library(library),
        Ast::Actions(definitions) => definitions.children().iter().map(pretty_print_action_definition).collect(),
        Ast::Conditions(definitions) => definitions
            .children()
            .iter()
            .map(pretty_print_condition_definition)
            .collect(),
        Ast::ActionList(actions) => pretty_print_actions(actions, 0),
    }
}

fn indent_str(level: usize) -> String {
    "    ".repeat(level)
}

fn pretty_print_attributes(attributes: &AttributeList, indent: usize) -> String {
    let mut output = String::new();
    for attribute in attributes {
        output.push_str(&format!("{}[{}]\n", indent_str(indent), pretty_print_attribute(attribute)));
    }
    output
}

fn pretty_print_attribute(attribute: &Attribute) -> String {
    match attribute {
        Attribute::Priority(n) | Attribute::GlobalIndex(n) | Attribute::Unknown(n) => {
            format!("{}({})", attribute.name(), pretty_print_number(*n))
        }
        Attribute::StartFrom(name)
        | Attribute::UseObjectSlot(name)
        | Attribute::ControlPacket(name)
        | Attribute::InstanceType(name) => format!("{}({})", attribute.name(), name),
        Attribute::NonBlocking | Attribute::SkipFirstBody => attribute.name().to_string(),
    }
}

fn pretty_print_behaviour(behaviour: &Behaviour) -> String {
    let mut output = pretty_print_attributes(&behaviour.attributes, 0);
    output.push_str(&format!("behaviour {} {{\n", behaviour.name));

    let body = &behaviour.body;
    for decl in &body.consts {
        output.push_str(&format!("{}const {} = {};\n", indent_str(1), decl.name, pretty_print_expr(&decl.value)));
    }
    if let Some(starter) = &body.starter {
        output.push_str(&format!("{}starter {{\n", indent_str(1)));
        for assigner in &starter.assigners {
            output.push_str(&format!("{}assigner = {{\n", indent_str(2)));
            output.push_str(&pretty_print_assigns(&assigner.entries, 3));
            output.push_str(&format!("{}}}\n", indent_str(2)));
        }
        output.push_str(&format!("{}}}\n", indent_str(1)));
    }
    for packet in &body.packets {
        output.push_str(&pretty_print_packet(packet));
    }
    for state in &body.states {
        output.push_str(&pretty_print_state(state));
    }

    output.push_str("}\n");
    output
}

fn pretty_print_assigns(assigns: &AssignList, indent: usize) -> String {
    let mut output = String::new();
    for assign in assigns {
        let target = match &assign.target {
            AssignTarget::Const(name) => name.clone(),
            AssignTarget::Element { name, index } => format!("{}[{}]", name, pretty_print_expr(index)),
        };
        output.push_str(&format!("{}{} = {};\n", indent_str(indent), target, pretty_print_expr(&assign.value)));
    }
    output
}

fn pretty_print_packet(packet: &ControlPacketDecl) -> String {
    let mut output = format!("{}packet {} {{\n", indent_str(1), packet.name);
    for (keyword, block) in [("settings", &packet.settings), ("data", &packet.data)] {
        if let Some(assigns) = block {
            output.push_str(&format!("{}{} {{\n", indent_str(2), keyword));
            output.push_str(&pretty_print_assigns(assigns, 3));
            output.push_str(&format!("{}}}\n", indent_str(2)));
        }
    }
    output.push_str(&format!("{}}}\n", indent_str(1)));
    output
}

fn pretty_print_state(state: &StateDecl) -> String {
    let mut output = pretty_print_attributes(&state.attributes, 1);
    let reference = state
        .behaviour_ref
        .as_ref()
        .map(|name| format!("\"{}\"", name))
        .unwrap_or_default();
    output.push_str(&format!("{}state {}({}) {{\n", indent_str(1), state.name, reference));

    for body in &state.bodies {
        let argument = body.condition.argument.as_ref().map(pretty_print_expr).unwrap_or_default();
        let comparison = if body.not_gate { "<=" } else { ">=" };
        output.push_str(&format!(
            "{}if {}({}) {} {} {{\n",
            indent_str(2),
            body.condition.name,
            argument,
            comparison,
            pretty_print_operand(&body.threshold)
        ));
        output.push_str(&format!("{}interval = {};\n", indent_str(3), pretty_print_operand(&body.interval)));
        output.push_str(&format!("{}Unknown = {};\n", indent_str(3), body.unknown));
        match &body.block {
            StateBlock::Actions(actions) => output.push_str(&pretty_print_actions(actions, 3)),
            StateBlock::Execute(execute) => {
                output.push_str(&format!("{}execute {};\n", indent_str(3), execute.state));
            }
            StateBlock::NoOp => {}
        }
        output.push_str(&format!("{}}}\n", indent_str(2)));
    }

    output.push_str(&format!("{}}}\n", indent_str(1)));
    output
}

fn pretty_print_actions(actions: &ActionList, indent: usize) -> String {
    let mut output = String::new();
    for action in actions {
        let arguments: Vec<String> = action.arguments.children().iter().map(pretty_print_expr).collect();
        output.push_str(&format!("{}{}({});\n", indent_str(indent), action.name, arguments.join(", ")));
    }
    output
}

fn pretty_print_library(library: &Library) -> String {
    let mut output = pretty_print_attributes(&library.attributes, 0);
    output.push_str(&format!("library {} {{\n", library.name));
    for behaviour in &library.behaviours {
        output.push_str(&format!("{}behaviour {} {{\n", indent_str(1), behaviour.name));
        output.push_str(&pretty_print_actions(&behaviour.actions, 2));
        output.push_str(&format!("{}}}\n", indent_str(1)));
    }
    output.push_str(&pretty_print_actions(&library.creation, 1));
    output.push_str("}\n");
    output
}

fn pretty_print_definition_tail(aliases: &[String], id: Option<i32>) -> String {
    let mut output = String::new();
    if !aliases.is_empty() {
        output.push_str(&format!(" [{}]", aliases.join(", ")));
    }
    if let Some(id) = id {
        output.push_str(&format!(" : {}", id));
    }
    output.push_str(";\n");
    output
}

fn pretty_print_action_definition(definition: &ActionDefinition) -> String {
    let parameters: Vec<String> = definition
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    format!(
        "action {}({}){}",
        definition.name,
        parameters.join(", "),
        pretty_print_definition_tail(&definition.aliases, definition.id)
    )
}

fn pretty_print_condition_definition(definition: &ConditionDefinition) -> String {
    let parameter = definition
        .parameter
        .as_ref()
        .map(|p| format!("{} {}", p.ty, p.name))
        .unwrap_or_default();
    format!(
        "condition {}({}){}",
        definition.name,
        parameter,
        pretty_print_definition_tail(&definition.aliases, definition.id)
    )
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn pretty_print_number(number: Number) -> String {
    match number {
        Number::Integer(value) => value.to_string(),
        Number::Float(value) => format!("{:?}", value),
    }
}

/// Print an expression in a position the grammar reads as a single factor.
fn pretty_print_operand(expr: &Expr) -> String {
    match expr {
        Expr::Binary { .. } => format!("({})", pretty_print_expr(expr)),
        _ => pretty_print_expr(expr),
    }
}

pub fn pretty_print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Number(number) => pretty_print_number(*number),
        Expr::String(value) => format!("\"{}\"", value),
        Expr::Bool(value) => value.to_string(),
        Expr::Const(name) => name.clone(),
        Expr::ArrayAccess { name, index } => format!("{}[{}]", name, pretty_print_expr(index)),
        Expr::Unary { op, operand } => {
            let sign = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Minus => "-",
            };
            // A sign directly before a digit would lex as a signed literal.
            match operand.as_ref() {
                Expr::Number(_) | Expr::Binary { .. } => format!("{}({})", sign, pretty_print_expr(operand)),
                _ => format!("{}{}", sign, pretty_print_expr(operand)),
            }
        }
        Expr::Binary { op, left, right } => format!(
            "{} {} {}",
            pretty_print_operand(left),
            op.symbol(),
            pretty_print_operand(right)
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn round_trip(source: &str) -> Result<(), ParseError> {
        let ast = parse(source)?;
        let printed = pretty_print(&ast);
        let reparsed = parse(&printed)?;
        assert_eq!(ast, reparsed, "printed:\n{printed}");
        Ok(())
    }

    #[test]
    fn test_pretty_print_behaviour_round_trip() -> Result<(), ParseError> {
        round_trip(
            r#"
            [Priority(3)] [StartFrom(Two)]
            behaviour Sample {
                const a = -(1 + 2) * 3;
                const b = a / -4.5;
                starter { assigner = { AssignType = ME; GlobalObjectId = "Crash"; } }
                packet P { settings { DoesTranslate = true; } data { Yaw = InstanceFloat[a - 2]; } }
                [NonBlocking] [ControlPacket(P)]
                state One("COM_IDLE") {
                    if Near(-1) <= (a + 1) { interval = 0.25; Unknown = true; Jump(1, false); }
                    if Else() >= 1 { interval = 0; Unknown = false; execute Two; }
                }
                state Two() { }
            }
            "#,
        )
    }

    #[test]
    fn test_pretty_print_library_round_trip() -> Result<(), ParseError> {
        round_trip("[GlobalIndex(1)] [InstanceType(Projectile)] library L { behaviour B { Spin(2.0); } Fire(); }")
    }

    #[test]
    fn test_pretty_print_definitions_round_trip() -> Result<(), ParseError> {
        round_trip("action Move(float speed, bool run) [Go] : 4; action Stop();")?;
        round_trip("condition Near(int range) [Close, Nearby] : 2; condition Else();")
    }

    #[test]
    fn test_pretty_print_unary_number_keeps_shape() {
        let expr = Expr::Unary {
            op: UnaryOp::Minus,
            operand: Box::new(Expr::Number(Number::Integer(5))),
        };
        assert_eq!(pretty_print_expr(&expr), "-(5)");
        assert_eq!(pretty_print_expr(&Expr::Number(Number::Float(1e-7))), "1e-7");
    }
}
