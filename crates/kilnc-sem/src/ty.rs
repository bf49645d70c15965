//! Semantic types and the structural type store.
//!
//! Types are interned: the store assigns each distinct structural shape one
//! [`TypeId`], and two semantic types are equal exactly when their ids are
//! equal. Because a [`TypeKind`]'s components are themselves ids, hashing
//! and comparing a shape never recurses into already-interned subtypes.
//!
//! Primitives are interned first and registered in the primitive registry
//! keyed by the identifier interner's dense index for their name, making
//! "is this name a primitive type?" a single map lookup during resolution.

use indexmap::IndexMap;
use kilnc_lex::{NameId, PRIMITIVE_NAMES};
use kilnc_par::TypeId;
use kilnc_util::{ArenaError, FxHashMap, IndexVec, Interner};

/// The primitive types of the language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimKind {
    Void,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Char,
    Str,
}

impl PrimKind {
    /// In the same order as [`PRIMITIVE_NAMES`].
    pub const ALL: [PrimKind; 8] = [
        PrimKind::Void,
        PrimKind::I32,
        PrimKind::I64,
        PrimKind::F32,
        PrimKind::F64,
        PrimKind::Bool,
        PrimKind::Char,
        PrimKind::Str,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimKind::Void => "void",
            PrimKind::I32 => "i32",
            PrimKind::I64 => "i64",
            PrimKind::F32 => "f32",
            PrimKind::F64 => "f64",
            PrimKind::Bool => "bool",
            PrimKind::Char => "char",
            PrimKind::Str => "str",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, PrimKind::I32 | PrimKind::I64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimKind::F32 | PrimKind::F64)
    }
}

/// Structural shape of a semantic type. Components are canonical ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Prim(PrimKind),
    Ptr(TypeId),
    Array {
        elem: TypeId,
        size: i64,
        /// False for inferred-size array types (`T[]`).
        size_known: bool,
    },
    Fn {
        ret: TypeId,
        params: Vec<TypeId>,
    },
    /// Reserved for user-defined nominal types; bodies are never resolved.
    User(NameId),
}

/// Structural interner over semantic types.
pub struct TypeStore {
    types: IndexVec<TypeId, TypeKind>,
    lookup: FxHashMap<TypeKind, TypeId>,
    /// Identifier dense index of a primitive name -> its canonical type.
    /// Insertion-ordered; registration order is the order of `ALL`.
    primitive_registry: IndexMap<NameId, TypeId>,

    pub void_ty: TypeId,
    pub i32_ty: TypeId,
    pub i64_ty: TypeId,
    pub f32_ty: TypeId,
    pub f64_ty: TypeId,
    pub bool_ty: TypeId,
    pub char_ty: TypeId,
    pub str_ty: TypeId,
}

impl TypeStore {
    /// Create the store and register the primitives. The primitive names
    /// are interned through `idents` (hits when the lexer pre-seeded
    /// them), so the registry keys line up with identifier tokens.
    pub fn new(idents: &mut Interner<'_, NameId, ()>) -> Result<TypeStore, ArenaError> {
        let mut types = IndexVec::new();
        let mut lookup = FxHashMap::default();
        let mut ids = [TypeId(0); 8];
        for (slot, prim) in ids.iter_mut().zip(PrimKind::ALL) {
            let kind = TypeKind::Prim(prim);
            let id = types.push(kind.clone());
            lookup.insert(kind, id);
            *slot = id;
        }

        let mut primitive_registry = IndexMap::new();
        for (name, &ty) in PRIMITIVE_NAMES.iter().zip(&ids) {
            let name_id = idents.intern(name, ())?;
            primitive_registry.insert(name_id, ty);
        }

        let [void_ty, i32_ty, i64_ty, f32_ty, f64_ty, bool_ty, char_ty, str_ty] = ids;
        Ok(TypeStore {
            types,
            lookup,
            primitive_registry,
            void_ty,
            i32_ty,
            i64_ty,
            f32_ty,
            f64_ty,
            bool_ty,
            char_ty,
            str_ty,
        })
    }

    /// Intern a structural shape, returning its canonical id.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.lookup.get(&kind) {
            return id;
        }
        let id = self.types.push(kind.clone());
        self.lookup.insert(kind, id);
        id
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id]
    }

    /// Number of distinct types interned.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The primitive registered under an identifier name, if any.
    pub fn primitive_for_name(&self, name: NameId) -> Option<TypeId> {
        self.primitive_registry.get(&name).copied()
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Prim(p) if p.is_integer())
    }

    pub fn is_float(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Prim(p) if p.is_float())
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.is_integer(id) || self.is_float(id)
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Ptr(_))
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Array { .. })
    }

    /// Nested array depth: `i64` is 0, `i64[]` is 1, `i64[][2]` is 2.
    pub fn array_rank(&self, id: TypeId) -> usize {
        match self.kind(id) {
            TypeKind::Array { elem, .. } => 1 + self.array_rank(*elem),
            _ => 0,
        }
    }

    /// The wider of two numeric types by the rule `f64 > f32 > i64 > i32`;
    /// `None` when either side is not numeric.
    pub fn common_numeric(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        let rank = |id: TypeId| -> Option<u8> {
            match self.kind(id) {
                TypeKind::Prim(PrimKind::I32) => Some(0),
                TypeKind::Prim(PrimKind::I64) => Some(1),
                TypeKind::Prim(PrimKind::F32) => Some(2),
                TypeKind::Prim(PrimKind::F64) => Some(3),
                _ => None,
            }
        };
        let (ra, rb) = (rank(a)?, rank(b)?);
        Some(if ra >= rb { a } else { b })
    }

    /// Whether `source` converts to `target` without an explicit cast:
    /// identity, `i32 -> i64`, `f32 -> f64`, integer -> float, and arrays
    /// when the target is unsized or the sizes match, with element types
    /// recursively convertible (`T[N] -> T[]`, `T[N][M] -> T[][]`).
    pub fn can_implicit_cast(&self, target: TypeId, source: TypeId) -> bool {
        if target == source {
            return true;
        }
        match (self.kind(target), self.kind(source)) {
            (TypeKind::Prim(t), TypeKind::Prim(s)) => {
                (*t == PrimKind::I64 && *s == PrimKind::I32)
                    || (*t == PrimKind::F64 && *s == PrimKind::F32)
                    || (t.is_float() && s.is_integer())
            }
            (
                TypeKind::Array {
                    elem: target_elem,
                    size: target_size,
                    size_known: target_known,
                },
                TypeKind::Array {
                    elem: source_elem,
                    size: source_size,
                    size_known: source_known,
                },
            ) => {
                let size_ok = !*target_known || (*source_known && target_size == source_size);
                size_ok && self.can_implicit_cast(*target_elem, *source_elem)
            }
            _ => false,
        }
    }

    /// Human-readable form for diagnostics. `idents` resolves user type
    /// names.
    pub fn display(&self, id: TypeId, idents: &Interner<'_, NameId, ()>) -> String {
        match self.kind(id) {
            TypeKind::Prim(p) => p.name().to_string(),
            TypeKind::Ptr(base) => format!("{}*", self.display(*base, idents)),
            TypeKind::Array {
                elem,
                size,
                size_known,
            } => {
                if *size_known {
                    format!("{}[{}]", self.display(*elem, idents), size)
                } else {
                    format!("{}[]", self.display(*elem, idents))
                }
            }
            TypeKind::Fn { ret, params } => {
                let params = params
                    .iter()
                    .map(|&p| self.display(p, idents))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("fn({}) -> {}", params, self.display(*ret, idents))
            }
            TypeKind::User(name) => idents.key(*name).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kilnc_util::Arena;

    fn store_with_idents(arena: &Arena) -> (TypeStore, Interner<'_, NameId, ()>) {
        let mut idents = Interner::new(arena);
        for name in PRIMITIVE_NAMES {
            idents.intern(name, ()).unwrap();
        }
        let store = TypeStore::new(&mut idents).unwrap();
        (store, idents)
    }

    #[test]
    fn test_primitives_are_canonical() {
        let arena = Arena::new(1 << 12);
        let (mut store, _) = store_with_idents(&arena);
        assert_eq!(store.intern(TypeKind::Prim(PrimKind::I64)), store.i64_ty);
        assert_eq!(store.intern(TypeKind::Prim(PrimKind::Void)), store.void_ty);
    }

    #[test]
    fn test_registry_keys_on_seeded_names() {
        let arena = Arena::new(1 << 12);
        let (store, idents) = store_with_idents(&arena);
        let i32_name = idents.peek("i32").unwrap().index;
        assert_eq!(store.primitive_for_name(i32_name), Some(store.i32_ty));
        let stray = NameId(900);
        assert_eq!(store.primitive_for_name(stray), None);
    }

    #[test]
    fn test_structural_interning_is_pointer_equality() {
        let arena = Arena::new(1 << 12);
        let (mut store, _) = store_with_idents(&arena);
        let a = store.intern(TypeKind::Ptr(store.i32_ty));
        let b = store.intern(TypeKind::Ptr(store.i32_ty));
        assert_eq!(a, b);
        let c = store.intern(TypeKind::Ptr(store.i64_ty));
        assert_ne!(a, c);

        let f1 = store.intern(TypeKind::Fn {
            ret: store.i64_ty,
            params: vec![store.i64_ty, store.bool_ty],
        });
        let f2 = store.intern(TypeKind::Fn {
            ret: store.i64_ty,
            params: vec![store.i64_ty, store.bool_ty],
        });
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_sized_and_unsized_arrays_are_distinct() {
        let arena = Arena::new(1 << 12);
        let (mut store, _) = store_with_idents(&arena);
        let sized = store.intern(TypeKind::Array {
            elem: store.i64_ty,
            size: 4,
            size_known: true,
        });
        let unsized_ = store.intern(TypeKind::Array {
            elem: store.i64_ty,
            size: 0,
            size_known: false,
        });
        assert_ne!(sized, unsized_);
        assert_eq!(store.array_rank(sized), 1);
    }

    #[test]
    fn test_common_numeric_rule() {
        let arena = Arena::new(1 << 12);
        let (store, _) = store_with_idents(&arena);
        assert_eq!(
            store.common_numeric(store.i32_ty, store.i64_ty),
            Some(store.i64_ty)
        );
        assert_eq!(
            store.common_numeric(store.i64_ty, store.f32_ty),
            Some(store.f32_ty)
        );
        assert_eq!(
            store.common_numeric(store.f32_ty, store.f64_ty),
            Some(store.f64_ty)
        );
        assert_eq!(
            store.common_numeric(store.i32_ty, store.i32_ty),
            Some(store.i32_ty)
        );
        assert_eq!(store.common_numeric(store.bool_ty, store.i32_ty), None);
    }

    #[test]
    fn test_implicit_cast_rules() {
        let arena = Arena::new(1 << 12);
        let (mut store, _) = store_with_idents(&arena);
        assert!(store.can_implicit_cast(store.i64_ty, store.i32_ty));
        assert!(!store.can_implicit_cast(store.i32_ty, store.i64_ty));
        assert!(store.can_implicit_cast(store.f64_ty, store.f32_ty));
        assert!(store.can_implicit_cast(store.f32_ty, store.i64_ty));
        assert!(!store.can_implicit_cast(store.i64_ty, store.f32_ty));
        assert!(!store.can_implicit_cast(store.bool_ty, store.i32_ty));

        // T[N] -> T[]
        let sized = store.intern(TypeKind::Array {
            elem: store.i64_ty,
            size: 3,
            size_known: true,
        });
        let unsized_ = store.intern(TypeKind::Array {
            elem: store.i64_ty,
            size: 0,
            size_known: false,
        });
        assert!(store.can_implicit_cast(unsized_, sized));
        assert!(!store.can_implicit_cast(sized, unsized_));

        // T[N][M] -> T[][]
        let sized2 = store.intern(TypeKind::Array {
            elem: sized,
            size: 2,
            size_known: true,
        });
        let unsized2 = store.intern(TypeKind::Array {
            elem: unsized_,
            size: 0,
            size_known: false,
        });
        assert!(store.can_implicit_cast(unsized2, sized2));
    }

    #[test]
    fn test_display() {
        let arena = Arena::new(1 << 12);
        let (mut store, idents) = store_with_idents(&arena);
        let ptr = store.intern(TypeKind::Ptr(store.i32_ty));
        assert_eq!(store.display(ptr, &idents), "i32*");
        let arr = store.intern(TypeKind::Array {
            elem: ptr,
            size: 4,
            size_known: true,
        });
        assert_eq!(store.display(arr, &idents), "i32*[4]");
        let f = store.intern(TypeKind::Fn {
            ret: store.void_ty,
            params: vec![store.i64_ty],
        });
        assert_eq!(store.display(f, &idents), "fn(i64) -> void");
    }
}
