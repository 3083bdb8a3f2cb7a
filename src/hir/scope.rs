//! Lexical scopes.
//!
//! Scopes live in one arena per model. The first scope is the global root;
//! every other scope names its parent by [`ScopeId`], and lookups walk that
//! chain outward so the nearest enclosing declaration wins.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{Position, Range};
use super::ids::{ScopeId, SymbolId};

/// What introduced a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Class,
    Block,
    For,
    Catch,
}

/// A region of source in which declared names are visible.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// `None` only for the global scope.
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub range: Range,
    /// Declared names in declaration order. A redeclaration replaces the
    /// earlier binding.
    symbols: IndexMap<SmolStr, SymbolId>,
    /// Class members. Reached through `this` or an instance, never by a bare
    /// name, so lookups skip them.
    members: IndexMap<SmolStr, SymbolId>,
}

impl Scope {
    /// Look up a name declared directly in this scope.
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    /// Names and symbols declared directly in this scope.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, SymbolId)> + '_ {
        self.symbols.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Look up a class member declared in this scope.
    pub fn member(&self, name: &str) -> Option<SymbolId> {
        self.members.get(name).copied()
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, SymbolId)> + '_ {
        self.members.iter().map(|(name, &id)| (name.as_str(), id))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Arena of scopes rooted at a single global scope.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Create a tree holding only the global scope.
    pub fn new(range: Range) -> Self {
        Self {
            scopes: vec![Scope {
                id: ScopeId::GLOBAL,
                kind: ScopeKind::Global,
                parent: None,
                children: Vec::new(),
                range,
                symbols: IndexMap::new(),
                members: IndexMap::new(),
            }],
        }
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[ScopeId::GLOBAL.index()]
    }

    /// Allocate a child scope of `parent`.
    pub(crate) fn alloc(&mut self, kind: ScopeKind, parent: ScopeId, range: Range) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            range,
            symbols: IndexMap::new(),
            members: IndexMap::new(),
        });
        if let Some(parent) = self.scopes.get_mut(parent.index()) {
            parent.children.push(id);
        }
        id
    }

    /// Bind `name` in `scope`, returning the symbol it replaced.
    pub(crate) fn insert(&mut self, scope: ScopeId, name: SmolStr, symbol: SymbolId) -> Option<SymbolId> {
        self.scopes
            .get_mut(scope.index())
            .and_then(|s| s.symbols.insert(name, symbol))
    }

    /// Bind a class member in `scope`, returning the member it replaced.
    pub(crate) fn insert_member(
        &mut self,
        scope: ScopeId,
        name: SmolStr,
        symbol: SymbolId,
    ) -> Option<SymbolId> {
        self.scopes
            .get_mut(scope.index())
            .and_then(|s| s.members.insert(name, symbol))
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    /// Resolve `name` from `from` outward through the parent chain.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<SymbolId> {
        self.ancestors(from).find_map(|scope| scope.get(name))
    }

    /// `id` and its parents, innermost first, ending at the global scope.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(self.get(id), |scope| scope.parent.and_then(|p| self.get(p)))
    }

    /// Whether following parent links from `id` reaches the global scope.
    pub fn reaches_global(&self, id: ScopeId) -> bool {
        self.ancestors(id)
            .take(self.scopes.len())
            .any(|scope| scope.id == ScopeId::GLOBAL)
    }

    /// The innermost scope whose range contains `pos`.
    ///
    /// The file's top-level scopes are entered unconditionally, so positions
    /// in leading or trailing trivia still see module-level names.
    pub fn innermost_at(&self, pos: Position) -> ScopeId {
        let mut current = self.global();
        if let Some(top) = current.children.first().and_then(|&c| self.get(c)) {
            current = top;
        }
        loop {
            let next = current
                .children
                .iter()
                .filter_map(|&c| self.get(c))
                .find(|child| child.range.contains(pos));
            match next {
                Some(child) => current = child,
                None => return current.id,
            }
        }
    }

    /// All scopes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Scope> + '_ {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(l1: u32, c1: u32, l2: u32, c2: u32) -> Range {
        Range::new(Position::at(l1, c1), Position::at(l2, c2))
    }

    fn sample() -> (ScopeTree, ScopeId, ScopeId) {
        let mut tree = ScopeTree::new(range(1, 1, 20, 1));
        let module = tree.alloc(ScopeKind::Module, ScopeId::GLOBAL, range(1, 1, 20, 1));
        let func = tree.alloc(ScopeKind::Function, module, range(2, 1, 5, 1));
        (tree, module, func)
    }

    #[test]
    fn test_lookup_walks_outward() {
        let (mut tree, module, func) = sample();
        let outer = SymbolId::new();
        let inner = SymbolId::new();
        tree.insert(module, "x".into(), outer);
        assert_eq!(tree.lookup(func, "x"), Some(outer));

        tree.insert(func, "x".into(), inner);
        assert_eq!(tree.lookup(func, "x"), Some(inner));
        assert_eq!(tree.lookup(module, "x"), Some(outer));
        assert_eq!(tree.lookup(func, "missing"), None);
    }

    #[test]
    fn test_redeclaration_last_write_wins() {
        let (mut tree, module, _) = sample();
        let first = SymbolId::new();
        let second = SymbolId::new();
        assert_eq!(tree.insert(module, "a".into(), first), None);
        assert_eq!(tree.insert(module, "a".into(), second), Some(first));
        assert_eq!(tree.get(module).unwrap().len(), 1);
        assert_eq!(tree.lookup(module, "a"), Some(second));
    }

    #[test]
    fn test_members_are_not_looked_up() {
        let (mut tree, module, func) = sample();
        let class = tree.alloc(ScopeKind::Class, module, range(6, 1, 9, 1));
        let method = tree.alloc(ScopeKind::Function, class, range(7, 3, 8, 3));
        let outer = SymbolId::new();
        let member = SymbolId::new();
        tree.insert(module, "x".into(), outer);
        tree.insert_member(class, "x".into(), member);

        assert_eq!(tree.lookup(method, "x"), Some(outer));
        assert_eq!(tree.get(class).unwrap().member("x"), Some(member));
        assert!(tree.get(class).unwrap().is_empty());
        assert_eq!(tree.lookup(func, "x"), Some(outer));
    }

    #[test]
    fn test_single_root() {
        let (tree, _, func) = sample();
        let roots: Vec<_> = tree.iter().filter(|s| s.parent.is_none()).collect();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].kind, ScopeKind::Global);
        assert!(tree.reaches_global(func));
        let chain: Vec<_> = tree.ancestors(func).map(|s| s.kind).collect();
        assert_eq!(chain, vec![ScopeKind::Function, ScopeKind::Module, ScopeKind::Global]);
    }

    #[test]
    fn test_innermost_at() {
        let (tree, module, func) = sample();
        assert_eq!(tree.innermost_at(Position::at(3, 4)), func);
        assert_eq!(tree.innermost_at(Position::at(10, 1)), module);
        // past the end of the file still lands in the module scope
        assert_eq!(tree.innermost_at(Position::at(99, 1)), module);
    }
}
