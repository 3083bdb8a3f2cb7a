//! Semantic identifiers for symbols, references and scopes.

use std::fmt;

use uuid::Uuid;

/// Identity of a declared symbol.
///
/// Freshly generated for every analysis run. Two analyses of the same text
/// produce the same symbols under different ids.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolId(Uuid);

impl SymbolId {
    /// Generate a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0.simple())
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identity of one use site.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceId(Uuid);

impl ReferenceId {
    /// Generate a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReferenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceId({})", self.0.simple())
    }
}

/// Index of a scope inside its model's scope tree.
///
/// Only meaningful together with the [`SemanticModel`](super::SemanticModel)
/// that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The global scope, always the first one allocated.
    pub const GLOBAL: ScopeId = ScopeId(0);

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_ids_are_unique() {
        let a = SymbolId::new();
        let b = SymbolId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_scope_id_size() {
        assert_eq!(std::mem::size_of::<ScopeId>(), 4);
        assert_eq!(ScopeId::GLOBAL.index(), 0);
    }
}
