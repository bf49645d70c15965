//! Lexical scopes and symbols.
//!
//! A scope stores symbols in a slot array indexed directly by the
//! identifier interner's dense index, so local lookup is one array access.
//! Scopes form a tree held in a [`ScopeTree`]; lookup walks the parent
//! chain. All identifiers are interned before analysis starts, so the slot
//! capacity is fixed at the interner's count plus a little slack.

use kilnc_lex::NameId;
use kilnc_par::{ConstValue, TypeId};
use kilnc_util::{define_idx, Idx, IndexVec};

define_idx!(
    /// Handle of a scope in the tree.
    ScopeId
);

/// Extra slots beyond the identifier count, for names interned after
/// sizing (none today, but the headroom is cheap).
const SLOT_SLACK: usize = 16;

/// What a symbol names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    /// A user-declared type name. No declaration form produces these yet;
    /// the kind exists so type resolution can consult scopes uniformly.
    Type,
}

/// Symbol state bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolFlags {
    pub is_const: bool,
    pub used: bool,
    pub initialized: bool,
    /// The symbol's constant value is known (set together with `value`).
    pub computed_value: bool,
}

/// A named declaration recorded in a scope.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: NameId,
    /// `None` when the declared type failed to resolve; uses of the
    /// symbol then fail quietly instead of cascading.
    pub ty: Option<TypeId>,
    pub kind: SymbolKind,
    pub flags: SymbolFlags,
    pub value: Option<ConstValue>,
}

/// One lexical scope: a slot array plus a parent link.
#[derive(Debug)]
pub struct Scope {
    slots: Vec<Option<Symbol>>,
    parent: Option<ScopeId>,
    depth: u32,
}

/// The scope tree of one compilation.
pub struct ScopeTree {
    scopes: IndexVec<ScopeId, Scope>,
    slot_capacity: usize,
}

impl ScopeTree {
    /// Create an empty tree; scopes are sized for `ident_count` dense
    /// indices.
    pub fn new(ident_count: usize) -> Self {
        Self {
            scopes: IndexVec::new(),
            slot_capacity: ident_count + SLOT_SLACK,
        }
    }

    /// Open a new scope under `parent` (`None` for the global scope).
    pub fn push_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let depth = match parent {
            Some(p) => self.scopes[p].depth + 1,
            None => 0,
        };
        self.scopes.push(Scope {
            slots: vec![None; self.slot_capacity],
            parent,
            depth,
        })
    }

    pub fn depth(&self, scope: ScopeId) -> u32 {
        self.scopes[scope].depth
    }

    /// Define a symbol in `scope`. Fails if the name is already defined in
    /// this scope (shadowing an outer scope is fine).
    pub fn define(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), ()> {
        let index = symbol.name.index();
        let slots = &mut self.scopes[scope].slots;
        if index >= slots.len() {
            slots.resize(index + 1, None);
        }
        if slots[index].is_some() {
            return Err(());
        }
        slots[index] = Some(symbol);
        Ok(())
    }

    /// Look a name up in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: NameId) -> Option<&Symbol> {
        self.scopes[scope]
            .slots
            .get(name.index())
            .and_then(|slot| slot.as_ref())
    }

    /// Look a name up in `scope` and its ancestors; returns the defining
    /// scope along with the symbol.
    pub fn lookup(&self, scope: ScopeId, name: NameId) -> Option<(ScopeId, &Symbol)> {
        let mut current = scope;
        loop {
            if let Some(symbol) = self.lookup_local(current, name) {
                return Some((current, symbol));
            }
            current = self.scopes[current].parent?;
        }
    }

    /// Mutable access to a symbol defined in `scope` itself.
    pub fn symbol_mut(&mut self, scope: ScopeId, name: NameId) -> Option<&mut Symbol> {
        self.scopes[scope]
            .slots
            .get_mut(name.index())
            .and_then(|slot| slot.as_mut())
    }
}
