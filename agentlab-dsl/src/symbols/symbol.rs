//! Symbol kinds

use super::SymbolTable;
use agentlab_core::ParamType;
use std::fmt;

/// Built-in type symbols registered in every root table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Integer,
    Float,
    Boolean,
    String,
    Array,
    Enum,
    ControlPacket,
    State,
    Action,
    Condition,
    Behaviour,
    BehaviourLibrary,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 12] = [
        BuiltinType::Integer,
        BuiltinType::Float,
        BuiltinType::Boolean,
        BuiltinType::String,
        BuiltinType::Array,
        BuiltinType::Enum,
        BuiltinType::ControlPacket,
        BuiltinType::State,
        BuiltinType::Action,
        BuiltinType::Condition,
        BuiltinType::Behaviour,
        BuiltinType::BehaviourLibrary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Integer => "IntegerType",
            BuiltinType::Float => "FloatType",
            BuiltinType::Boolean => "BooleanType",
            BuiltinType::String => "StringType",
            BuiltinType::Array => "ArrayType",
            BuiltinType::Enum => "EnumType",
            BuiltinType::ControlPacket => "ControlPacket",
            BuiltinType::State => "State",
            BuiltinType::Action => "Action",
            BuiltinType::Condition => "Condition",
            BuiltinType::Behaviour => "Behaviour",
            BuiltinType::BehaviourLibrary => "BehaviourLibrary",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BuiltinType::Integer | BuiltinType::Float)
    }
}

impl From<ParamType> for BuiltinType {
    fn from(ty: ParamType) -> Self {
        match ty {
            ParamType::Bool => BuiltinType::Boolean,
            ParamType::Int => BuiltinType::Integer,
            ParamType::Float => BuiltinType::Float,
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    /// `None` until a const's initializer has been typed.
    pub ty: Option<BuiltinType>,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    BuiltIn,
    /// Declared or built-in const. Enum members carry their numeric value as the id.
    Const { id: u32 },
    Array { size: usize, storage: BuiltinType },
    Action { id: u16, parameters: Vec<ParamType> },
    Condition {
        id: u16,
        return_type: BuiltinType,
        parameter: Option<ParamType>,
    },
    State { id: i32 },
    Enum { members: SymbolTable },
    ControlPacket,
    Behaviour { scope: SymbolTable },
    BehaviourLibrary { scope: SymbolTable },
    /// `behaviour Name { ... }` inside a library.
    LinearBehaviour,
}

impl SymbolKind {
    /// Kind name used in semantic errors.
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::BuiltIn => "type",
            SymbolKind::Const { .. } => "const",
            SymbolKind::Array { .. } => "array",
            SymbolKind::Action { .. } => "action",
            SymbolKind::Condition { .. } => "condition",
            SymbolKind::State { .. } => "state",
            SymbolKind::Enum { .. } => "enum",
            SymbolKind::ControlPacket => "control packet",
            SymbolKind::Behaviour { .. } => "behaviour",
            SymbolKind::BehaviourLibrary { .. } => "behaviour library",
            SymbolKind::LinearBehaviour => "linear behaviour",
        }
    }
}

impl Symbol {
    pub fn builtin(ty: BuiltinType) -> Self {
        Self {
            name: ty.name().to_string(),
            ty: None,
            kind: SymbolKind::BuiltIn,
        }
    }

    pub fn constant(name: impl Into<String>, ty: Option<BuiltinType>, id: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: SymbolKind::Const { id },
        }
    }

    /// Enum symbol whose member table maps each name to its value.
    pub fn enumeration<N: Into<String>>(name: impl Into<String>, members: impl IntoIterator<Item = (N, u32)>) -> Self {
        let name = name.into();
        let mut table = SymbolTable::new();
        for (member, value) in members {
            // Aliases sharing a value are separate members.
            let defined = table.define(Symbol::constant(member, Some(BuiltinType::Enum), value));
            debug_assert!(defined.is_ok(), "duplicate member in enum {name}: {defined:?}");
        }
        Self {
            name,
            ty: Some(BuiltinType::Enum),
            kind: SymbolKind::Enum { members: table },
        }
    }

    pub fn state_id(&self) -> Option<i32> {
        match self.kind {
            SymbolKind::State { id } => Some(id),
            _ => None,
        }
    }

    pub fn enum_members(&self) -> Option<&SymbolTable> {
        match &self.kind {
            SymbolKind::Enum { members } => Some(members),
            _ => None,
        }
    }

    /// Nested table of a behaviour or library symbol.
    pub fn scope(&self) -> Option<&SymbolTable> {
        match &self.kind {
            SymbolKind::Behaviour { scope } | SymbolKind::BehaviourLibrary { scope } => Some(scope),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SymbolKind::Action { id, parameters } => {
                let parameters: Vec<&str> = parameters.iter().map(|p| p.name()).collect();
                write!(f, "<action {}({}) : {}>", self.name, parameters.join(", "), id)
            }
            SymbolKind::Condition { id, parameter, .. } => {
                let parameter = parameter.map(|p| p.name()).unwrap_or_default();
                write!(f, "<condition {}({}) : {}>", self.name, parameter, id)
            }
            SymbolKind::Enum { members } => write!(f, "<{}:enum {} members>", self.name, members.len()),
            kind => match self.ty {
                Some(ty) => write!(f, "<{}:{} {}>", self.name, kind.describe(), ty),
                None => write!(f, "<{}:{}>", self.name, kind.describe()),
            },
        }
    }
}
