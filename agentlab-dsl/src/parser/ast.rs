//! AST types for AgentLab

use agentlab_core::ParamType;
use serde::{Deserialize, Serialize};

// ============================================================================
// LIST NODES
// ============================================================================

/// Capability shared by every list construct so generic walkers can treat
/// them uniformly.
pub trait OrderedChildren {
    type Child;

    fn children(&self) -> &[Self::Child];

    fn len(&self) -> usize {
        self.children().len()
    }

    fn is_empty(&self) -> bool {
        self.children().is_empty()
    }
}

macro_rules! list_node {
    ($(#[$meta:meta])* $name:ident => $child:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub struct $name(pub Vec<$child>);

        impl $name {
            pub fn push(&mut self, child: $child) {
                self.0.push(child);
            }
        }

        impl OrderedChildren for $name {
            type Child = $child;

            fn children(&self) -> &[$child] {
                &self.0
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $child;
            type IntoIter = std::slice::Iter<'a, $child>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }

        impl From<Vec<$child>> for $name {
            fn from(children: Vec<$child>) -> Self {
                Self(children)
            }
        }
    };
}

list_node!(
    /// `[...]` attributes in declaration order.
    AttributeList => Attribute
);
list_node!(ConstDeclarationList => ConstDeclaration);
list_node!(
    /// `name = expr;` entries of a settings, data or assigner block.
    AssignList => Assign
);
list_node!(AssignerList => AssignerBlock);
list_node!(ControlPacketList => ControlPacketDecl);
list_node!(StateList => StateDecl);
list_node!(StateBodyList => StateBody);
list_node!(ActionList => ActionCall);
list_node!(ParamList => Expr);
list_node!(LinearBehaviourList => LinearBehaviour);
list_node!(ActionDefinitionList => ActionDefinition);
list_node!(ConditionDefinitionList => ConditionDefinition);

// ============================================================================
// TOP LEVEL
// ============================================================================

/// Root of a parsed script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ast {
    Behaviour(Behaviour),
    Library(Library),
    /// Catalog file of action definitions.
    Actions(ActionDefinitionList),
    /// Catalog file of condition definitions.
    Conditions(ConditionDefinitionList),
    /// Bare list of action calls.
    ActionList(ActionList),
}

impl Ast {
    pub fn form(&self) -> &'static str {
        match self {
            Ast::Behaviour(_) => "behaviour",
            Ast::Library(_) => "library",
            Ast::Actions(_) => "action definitions",
            Ast::Conditions(_) => "condition definitions",
            Ast::ActionList(_) => "action list",
        }
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

/// Numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Integer(i32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    Priority(Number),
    StartFrom(String),
    NonBlocking,
    SkipFirstBody,
    UseObjectSlot(String),
    ControlPacket(String),
    GlobalIndex(Number),
    InstanceType(String),
    Unknown(Number),
}

/// Declaration kinds attributes attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTarget {
    Behaviour,
    Library,
    State,
}

impl AttributeTarget {
    pub fn name(self) -> &'static str {
        match self {
            AttributeTarget::Behaviour => "behaviour",
            AttributeTarget::Library => "library",
            AttributeTarget::State => "state",
        }
    }
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Priority(_) => "Priority",
            Attribute::StartFrom(_) => "StartFrom",
            Attribute::NonBlocking => "NonBlocking",
            Attribute::SkipFirstBody => "SkipFirstBody",
            Attribute::UseObjectSlot(_) => "UseObjectSlot",
            Attribute::ControlPacket(_) => "ControlPacket",
            Attribute::GlobalIndex(_) => "GlobalIndex",
            Attribute::InstanceType(_) => "InstanceType",
            Attribute::Unknown(_) => "Unknown",
        }
    }

    pub fn applies_to(&self, target: AttributeTarget) -> bool {
        match self {
            Attribute::Priority(_) | Attribute::StartFrom(_) | Attribute::Unknown(_) => {
                target == AttributeTarget::Behaviour
            }
            Attribute::GlobalIndex(_) | Attribute::InstanceType(_) => target == AttributeTarget::Library,
            Attribute::NonBlocking
            | Attribute::SkipFirstBody
            | Attribute::UseObjectSlot(_)
            | Attribute::ControlPacket(_) => target == AttributeTarget::State,
        }
    }
}

// ============================================================================
// BEHAVIOURS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    pub name: String,
    pub attributes: AttributeList,
    pub body: BehaviourBody,
}

/// Declarations inside `behaviour Name { ... }`, grouped by kind in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BehaviourBody {
    pub consts: ConstDeclarationList,
    pub starter: Option<StarterDecl>,
    pub packets: ControlPacketList,
    pub states: StateList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDeclaration {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StarterDecl {
    pub assigners: AssignerList,
}

/// `assigner = { ... }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssignerBlock {
    pub entries: AssignList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    Const(String),
    Element { name: String, index: Expr },
}

impl AssignTarget {
    pub fn name(&self) -> &str {
        match self {
            AssignTarget::Const(name) | AssignTarget::Element { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub target: AssignTarget,
    pub value: Expr,
}

/// `packet Name { settings { ... } data { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPacketDecl {
    pub name: String,
    pub settings: Option<AssignList>,
    pub data: Option<AssignList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDecl {
    pub name: String,
    pub attributes: AttributeList,
    /// Behaviour the state runs, by name.
    pub behaviour_ref: Option<String>,
    pub bodies: StateBodyList,
}

/// `if Cond(param) >= threshold { interval = ..; Unknown = ..; block }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBody {
    pub condition: ConditionCall,
    /// Written `<=` instead of `>=`.
    pub not_gate: bool,
    pub threshold: Expr,
    pub interval: Expr,
    pub unknown: bool,
    pub block: StateBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateBlock {
    Actions(ActionList),
    Execute(StateExecute),
    /// Explicitly empty block.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateExecute {
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionCall {
    pub name: String,
    pub argument: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub name: String,
    pub arguments: ParamList,
}

// ============================================================================
// LIBRARIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub attributes: AttributeList,
    pub behaviours: LinearBehaviourList,
    pub creation: ActionList,
}

/// `behaviour Name { actions }` inside a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearBehaviour {
    pub name: String,
    pub actions: ActionList,
}

// ============================================================================
// DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub ty: ParamType,
    pub name: String,
}

/// `action Name(type p, ...) [Alias, ...] : id;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    pub aliases: Vec<String>,
    pub id: Option<i32>,
}

/// `condition Name(type p) [Alias, ...] : id;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    pub name: String,
    pub parameter: Option<ParameterDecl>,
    pub aliases: Vec<String>,
    pub id: Option<i32>,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(Number),
    String(String),
    Bool(bool),
    Const(String),
    /// `name[index]`
    ArrayAccess { name: String, index: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    /// Names of every const the expression reads.
    pub fn referenced_consts(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_consts(&mut names);
        names
    }

    fn collect_consts<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Const(name) => names.push(name),
            Expr::ArrayAccess { index, .. } => index.collect_consts(names),
            Expr::Unary { operand, .. } => operand.collect_consts(names),
            Expr::Binary { left, right, .. } => {
                left.collect_consts(names);
                right.collect_consts(names);
            }
            Expr::Number(_) | Expr::String(_) | Expr::Bool(_) => {}
        }
    }
}
