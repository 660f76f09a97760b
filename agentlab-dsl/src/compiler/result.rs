//! Compile outcome: a typed object registry plus a status for the caller

use serde::Serialize;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Outcome surfaced to the caller. Errors never escape `compile` any other way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilerStatus {
    pub is_error: bool,
    pub message: String,
}

impl CompilerStatus {
    pub fn failed(error: &impl fmt::Display) -> Self {
        Self {
            is_error: true,
            message: error.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.is_error
    }
}

impl fmt::Display for CompilerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_error {
            write!(f, "error: {}", self.message)
        } else {
            f.write_str("ok")
        }
    }
}

/// At most one compiled object per type.
#[derive(Default)]
pub struct CompilerResult {
    objects: HashMap<TypeId, (&'static str, Box<dyn Any>)>,
    status: CompilerStatus,
}

impl CompilerResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty result carrying a failure.
    pub fn failed(status: CompilerStatus) -> Self {
        Self {
            objects: HashMap::new(),
            status,
        }
    }

    /// Registers `object`.
    ///
    /// # Panics
    ///
    /// Panics if an object of the same type is already registered.
    pub fn add<T: Any>(&mut self, object: T) {
        let previous = self
            .objects
            .insert(TypeId::of::<T>(), (type_name::<T>(), Box::new(object)));
        assert!(previous.is_none(), "{} registered twice", type_name::<T>());
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.objects
            .get(&TypeId::of::<T>())
            .and_then(|(_, object)| object.downcast_ref())
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.objects.contains_key(&TypeId::of::<T>())
    }

    pub fn status(&self) -> &CompilerStatus {
        &self.status
    }

    pub fn is_error(&self) -> bool {
        self.status.is_error
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Type names of the registered objects, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.objects.values().map(|(name, _)| *name).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for CompilerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerResult")
            .field("objects", &self.kinds())
            .field("status", &self.status)
            .finish()
    }
}
