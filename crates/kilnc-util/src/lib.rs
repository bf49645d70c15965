//! kilnc-util - Core Utilities and Foundation Types
//!
//! Foundation crate for the Kiln compiler: the compilation [`Arena`], the
//! arena-backed sequence [`ArenaVec`], the dense [`Interner`], typed
//! indices ([`Idx`]/[`IndexVec`]), and source [`Span`]s.
//!
//! Everything here is designed around one lifecycle: a compilation creates
//! an arena, every downstream structure either lives in it or addresses
//! into it by dense index, and the whole graph is dropped together. There
//! is no process-wide state.

pub mod arena;
pub mod index_vec;
pub mod intern;
pub mod seq;
pub mod span;

pub use arena::{Arena, ArenaError, DEFAULT_CAPACITY, MAX_ALIGN};
pub use index_vec::{Idx, IndexVec};
pub use intern::{InternEntry, Interner};
pub use seq::ArenaVec;
pub use span::Span;

// The maps of choice throughout the compiler; hash/eq strategy is baked
// into the key type rather than supplied per call.
pub use rustc_hash::{FxHashMap, FxHashSet};
