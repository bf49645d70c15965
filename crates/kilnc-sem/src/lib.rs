//! kilnc-sem - Semantic Analysis
//!
//! Resolves syntactic type expressions to canonical semantic types,
//! type-checks the AST with bidirectional hints, folds constants, inserts
//! implicit casts, and manages lexical scopes.
//!
//! Entry points: build a [`TypeStore`] over the lexer's identifier
//! interner, then run a [`Checker`] over the parsed program. Diagnostics
//! come back as a vector of [`TypeError`]s in detection order; the AST
//! comes back annotated with canonical [`kilnc_par::TypeId`]s and any
//! synthesised `Cast` nodes.

pub mod check;
pub mod error;
pub mod scope;
pub mod ty;


pub use check::Checker;
pub use error::{TypeError, TypeErrorKind};
pub use scope::{Scope, ScopeId, ScopeTree, Symbol, SymbolFlags, SymbolKind};
pub use ty::{PrimKind, TypeKind, TypeStore};
