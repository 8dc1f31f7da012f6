//! The open-code identifier interning table.
//!
//! Every open-code parse owns one `IdStorage`. Macro cache keys hold a
//! [`std::rc::Weak`] handle to the owning open code's storage rather than a
//! strong reference (`comparable_weak_ptr` in
//! `examples/original_source/parser_library/src/workspaces/macro_cache.h`):
//! once the open code that produced a cache entry is gone, the entry becomes
//! unreachable by construction, without the cache needing to know that the
//! open code closed.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// An interned identifier: a small integer standing in for a symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(u32);

/// A single open-code file's identifier interning table.
///
/// Wrapped in `Rc<RefCell<_>>` so that [`MacroCacheKey`](crate::macro_cache::MacroCacheKey)
/// can hold a [`Weak`] reference to it that naturally expires when the open
/// code is dropped.
#[derive(Debug, Default)]
pub struct IdStorage {
    names: Vec<SmolStr>,
    lookup: FxHashMap<SmolStr, Ident>,
}

impl IdStorage {
    /// Creates an empty table and wraps it for weak-reference sharing.
    #[must_use]
    pub fn new_shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Interns `name`, returning its stable [`Ident`].
    pub fn intern(&mut self, name: &str) -> Ident {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = Ident(u32::try_from(self.names.len()).expect("identifier table exceeds u32::MAX entries"));
        let name: SmolStr = name.into();
        self.names.push(name.clone());
        self.lookup.insert(name, id);
        id
    }

    /// Looks up the text for a previously interned identifier.
    #[must_use]
    pub fn text(&self, id: Ident) -> &str {
        &self.names[id.0 as usize]
    }
}

/// A weak handle to an [`IdStorage`] that compares and hashes by the
/// strong-pointer identity of the storage it points into, matching
/// `comparable_weak_ptr<T>`'s `operator==`/`operator<=>` semantics: two
/// handles are equal iff they refer to the same storage, and a handle whose
/// storage has been dropped never compares equal to a live one (including
/// another expired handle from the same original storage).
#[derive(Debug, Clone)]
pub struct WeakIdStorageHandle(Weak<RefCell<IdStorage>>);

impl WeakIdStorageHandle {
    /// Creates a handle from a shared storage.
    #[must_use]
    pub fn new(storage: &Rc<RefCell<IdStorage>>) -> Self {
        Self(Rc::downgrade(storage))
    }

    /// Upgrades to a strong reference, if the storage is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Rc<RefCell<IdStorage>>> {
        self.0.upgrade()
    }
}

impl PartialEq for WeakIdStorageHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self.0.upgrade(), other.0.upgrade()) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
            _ => false,
        }
    }
}

impl Eq for WeakIdStorageHandle {}

impl std::hash::Hash for WeakIdStorageHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ptr().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut storage = IdStorage::default();
        let a = storage.intern("MYMACRO");
        let b = storage.intern("MYMACRO");
        assert_eq!(a, b);
        assert_eq!(storage.text(a), "MYMACRO");
    }

    #[test]
    fn weak_handles_to_same_storage_are_equal() {
        let storage = IdStorage::new_shared();
        let h1 = WeakIdStorageHandle::new(&storage);
        let h2 = WeakIdStorageHandle::new(&storage);
        assert_eq!(h1, h2);
    }

    #[test]
    fn expired_handle_never_compares_equal() {
        let storage = IdStorage::new_shared();
        let h1 = WeakIdStorageHandle::new(&storage);
        let h2 = h1.clone();
        drop(storage);
        assert_ne!(h1, h2);
        assert!(h1.upgrade().is_none());
    }
}
