//! Flat per-scope symbol tables

use super::{BuiltinType, Symbol, SymbolKind};
use crate::error::{SemanticError, SemanticResult};
use agentlab_core::{
    flag_setting, ActionSignature, AssignLocality, AssignPreference, AssignStatus, AssignType, InstanceType,
    ObjectBehaviourSlot, PacketData, SettingField, FLAG_SETTINGS, INSTANCE_FLOAT_COUNT,
};
use std::collections::HashMap;
use std::fmt;

/// Name of the built-in string const holding a starter's target object.
pub const GLOBAL_OBJECT_ID: &str = "GlobalObjectId";

/// Name of the built-in instance-float array.
pub const INSTANCE_FLOAT: &str = "InstanceFloat";

/// A name-to-symbol mapping for one scope. Symbols are never removed and
/// keep their definition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
    /// Number of leading symbols registered as built-ins.
    builtins: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child scope seeded with copies of every action and condition visible in
    /// `parent`. Later additions to `parent` are not seen by the child.
    pub fn seeded_from(parent: &SymbolTable) -> Self {
        let mut table = Self::new();
        for symbol in &parent.symbols {
            if matches!(symbol.kind, SymbolKind::Action { .. } | SymbolKind::Condition { .. }) {
                table.index.insert(symbol.name.clone(), table.symbols.len());
                table.symbols.push(symbol.clone());
            }
        }
        table
    }

    /// Root table with built-in types, setting and data names, and domain enums.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for ty in BuiltinType::ALL {
            table.insert_builtin(Symbol::builtin(ty));
        }

        table.insert_builtin(Symbol::enumeration(
            "ObjectBehaviourSlot",
            ObjectBehaviourSlot::all().map(|slot| (slot.name(), u32::from(slot.index()))),
        ));
        table.insert_builtin(Symbol::enumeration(
            "InstanceType",
            InstanceType::ALL.iter().map(|t| (t.name(), u32::from(t.value()))),
        ));

        table.insert_builtin(Symbol::constant(GLOBAL_OBJECT_ID, Some(BuiltinType::String), 0));
        table.insert_builtin(Symbol::enumeration(
            "AssignType",
            AssignType::ALL.iter().map(|m| (m.name(), m.value())),
        ));
        table.insert_builtin(Symbol::enumeration(
            "AssignLocality",
            AssignLocality::ALL.iter().map(|m| (m.name(), m.value())),
        ));
        table.insert_builtin(Symbol::enumeration(
            "AssignStatus",
            AssignStatus::ALL.iter().map(|m| (m.name(), m.value())),
        ));
        table.insert_builtin(Symbol::enumeration(
            "AssignPreference",
            AssignPreference::ALL.iter().map(|m| (m.name(), m.value())),
        ));

        for slot in PacketData::ALL {
            let ty = if slot.is_integer() { BuiltinType::Integer } else { BuiltinType::Float };
            table.insert_builtin(Symbol::constant(slot.name(), Some(ty), u32::from(slot.value())));
        }
        for field in SettingField::ALL {
            table.insert_builtin(Symbol::enumeration(field.name(), field.members()));
        }
        for (at, (name, _)) in FLAG_SETTINGS.iter().enumerate() {
            table.insert_builtin(Symbol::constant(*name, Some(BuiltinType::Boolean), at as u32));
        }

        table.insert_builtin(Symbol {
            name: INSTANCE_FLOAT.to_string(),
            ty: Some(BuiltinType::Array),
            kind: SymbolKind::Array {
                size: usize::from(INSTANCE_FLOAT_COUNT),
                storage: BuiltinType::Float,
            },
        });
        table
    }

    fn insert_builtin(&mut self, symbol: Symbol) {
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        self.builtins = self.symbols.len();
    }

    /// Adds a symbol. Redefining a name already in this table is an error.
    pub fn define(&mut self, symbol: Symbol) -> SemanticResult<()> {
        if self.index.contains_key(&symbol.name) {
            return Err(SemanticError::Redefinition { name: symbol.name });
        }
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|at| &self.symbols[*at])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.index.get(name).map(|at| &mut self.symbols[*at])
    }

    /// Looks a name up among the built-ins registered by [`Self::with_builtins`].
    pub fn builtin(&self, name: &str) -> Option<&Symbol> {
        self.index
            .get(name)
            .filter(|at| **at < self.builtins)
            .map(|at| &self.symbols[*at])
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Condition names by id, canonical names before their aliases.
    pub fn condition_names(&self) -> Vec<(u16, String)> {
        self.symbols
            .iter()
            .filter_map(|symbol| match symbol.kind {
                SymbolKind::Condition { id, .. } => Some((id, symbol.name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Action signatures by id, canonical names before their aliases.
    pub fn action_signatures(&self) -> Vec<(u16, ActionSignature)> {
        self.symbols
            .iter()
            .filter_map(|symbol| match &symbol.kind {
                SymbolKind::Action { id, parameters } => {
                    Some((*id, ActionSignature::new(symbol.name.clone(), parameters.clone())))
                }
                _ => None,
            })
            .collect()
    }

    pub fn is_flag_setting(&self, name: &str) -> bool {
        flag_setting(name).is_some() && self.builtin(name).is_some()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symbols:")?;
        for symbol in &self.symbols[self.builtins..] {
            writeln!(f, "\t{symbol}")?;
        }
        Ok(())
    }
}

/// Lookup view over one scope with fallback to the root's built-ins.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub table: &'a SymbolTable,
    pub root: &'a SymbolTable,
}

impl<'a> Scope<'a> {
    pub fn new(root: &'a SymbolTable, table: &'a SymbolTable) -> Self {
        Self { table, root }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a Symbol> {
        self.table.lookup(name).or_else(|| self.root.builtin(name))
    }

    /// Value of `member` in the built-in enum `enum_name`.
    pub fn enum_member(&self, enum_name: &str, member: &str) -> SemanticResult<u32> {
        let members = self
            .lookup(enum_name)
            .and_then(Symbol::enum_members)
            .ok_or_else(|| SemanticError::UndefinedReference {
                kind: "enum",
                name: enum_name.to_string(),
            })?;
        match members.lookup(member).map(|symbol| &symbol.kind) {
            Some(SymbolKind::Const { id }) => Ok(*id),
            _ => Err(SemanticError::UnknownEnumMember {
                enum_name: enum_name.to_string(),
                member: member.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentlab_core::ParamType;

    fn action(name: &str, id: u16) -> Symbol {
        Symbol {
            name: name.to_string(),
            ty: Some(BuiltinType::Action),
            kind: SymbolKind::Action {
                id,
                parameters: vec![ParamType::Float],
            },
        }
    }

    #[test]
    fn test_redefinition_is_rejected() {
        let mut table = SymbolTable::new();
        assert!(table.define(Symbol::constant("a", None, 0)).is_ok());
        assert_eq!(
            table.define(Symbol::constant("a", None, 1)),
            Err(SemanticError::Redefinition { name: "a".to_string() })
        );
    }

    #[test]
    fn test_seeded_scope_is_a_snapshot() {
        let mut root = SymbolTable::with_builtins();
        root.define(action("Jump", 3)).unwrap();
        root.define(Symbol::constant("notCopied", None, 0)).unwrap();

        let child = SymbolTable::seeded_from(&root);
        root.define(action("Late", 4)).unwrap();

        assert!(child.lookup("Jump").is_some());
        assert!(child.lookup("notCopied").is_none());
        assert!(child.lookup("Late").is_none());
        assert!(child.lookup("IntegerType").is_none());
    }

    #[test]
    fn test_scope_falls_back_to_builtins_only() {
        let mut root = SymbolTable::with_builtins();
        root.define(action("Jump", 3)).unwrap();
        let child = SymbolTable::new();
        let scope = Scope::new(&root, &child);

        assert!(scope.lookup("MoveSpeed").is_some());
        assert!(scope.lookup("Jump").is_none());
        assert_eq!(scope.enum_member("MotionType", "SPRING"), Ok(3));
        assert_eq!(scope.enum_member("SpaceType", "CHASE_SPACE"), Ok(4));
        assert_eq!(scope.enum_member("ObjectBehaviourSlot", "Slot_93"), Ok(93));
        assert!(matches!(
            scope.enum_member("AssignType", "NOBODY"),
            Err(SemanticError::UnknownEnumMember { .. })
        ));
    }

    #[test]
    fn test_builtin_data_slots_are_typed() {
        let root = SymbolTable::with_builtins();
        assert_eq!(root.lookup("Selector").and_then(|s| s.ty), Some(BuiltinType::Integer));
        assert_eq!(root.lookup("Yaw").and_then(|s| s.ty), Some(BuiltinType::Float));
        assert!(root.is_flag_setting("Stalls"));
        assert!(matches!(
            root.lookup(INSTANCE_FLOAT).map(|s| &s.kind),
            Some(SymbolKind::Array { size: 126, .. })
        ));
    }

    #[test]
    fn test_builtin_enums_keep_every_member() {
        let root = SymbolTable::with_builtins();
        let members = |name: &str| root.lookup(name).and_then(Symbol::enum_members).map(SymbolTable::len);
        for field in SettingField::ALL {
            assert_eq!(members(field.name()), Some(field.members().len()), "{}", field.name());
        }
        assert_eq!(members("ObjectBehaviourSlot"), Some(usize::from(ObjectBehaviourSlot::COUNT)));
        assert_eq!(members("AssignType"), Some(AssignType::ALL.len()));
    }

    #[test]
    fn test_catalog_exports_keep_canonical_names_first() {
        let mut root = SymbolTable::new();
        root.define(action("Jump", 3)).unwrap();
        root.define(action("Hop", 3)).unwrap();
        let signatures = root.action_signatures();
        assert_eq!(signatures[0].1.name, "Jump");
        assert_eq!(signatures[1].0, 3);
    }
}
