//! The macro/copy member definition cache.
//!
//! Grounded in `examples/original_source/parser_library/src/workspaces/macro_cache.h`.
//! Parsing a macro or copy member definition is one of the more expensive
//! steps in assembling a file, and the same definition is re-parsed on every
//! reference unless its result is cached. A cache entry is only valid for a
//! specific combination of:
//!
//! - which open code is asking (a [`crate::ident_storage::WeakIdStorageHandle`],
//!   so the entry naturally expires when that open code's parse is dropped),
//! - which library data the member was found under, and
//! - the current `OPSYN` state (mnemonic/operation code redefinitions), since
//!   those change how the member's own statements are classified.
//!
//! and is additionally invalidated per-member by comparing version stamps:
//! the member's own resource version, plus the versions of every copy member
//! it transitively includes.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::rc::Rc;

use crate::ident_storage::{IdStorage, WeakIdStorageHandle};
use crate::location::ResourceLocation;
use std::cell::RefCell;

/// A document version number, as reported by `FileManager`/LSP.
pub type VersionStamp = i32;

/// One entry of the `OPSYN` mnemonic-redefinition table in effect when a
/// cached member was parsed, sorted for comparison by
/// [`MacroCacheKey::create_from_context`].
///
/// Equivalent to `cached_opsyn_mnemo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpsynMnemo {
    /// The mnemonic being redefined.
    pub from: SmolStr,
    /// What it now means.
    pub to: SmolStr,
    /// `true` if `to` names a macro rather than a machine/assembler instruction.
    pub is_macro: bool,
}

/// The cache key identifying "this macro/copy member, as seen from this
/// open code, under this library data, under this `OPSYN` state."
///
/// Equivalent to `macro_cache_key`.
#[derive(Debug, Clone)]
pub struct MacroCacheKey {
    related_open_code: WeakIdStorageHandle,
    data: ResourceLocation,
    opsyn_state: Vec<OpsynMnemo>,
}

impl MacroCacheKey {
    /// Builds a key from the current context, sorting the `OPSYN` state so
    /// that two contexts with the same redefinitions in different insertion
    /// order still produce equal keys.
    ///
    /// Equivalent to `create_from_context` + `sort_opsyn_state`.
    #[must_use]
    pub fn create_from_context(
        open_code_storage: &Rc<RefCell<IdStorage>>,
        data: ResourceLocation,
        mut opsyn_state: Vec<OpsynMnemo>,
    ) -> Self {
        opsyn_state.sort();
        Self {
            related_open_code: WeakIdStorageHandle::new(open_code_storage),
            data,
            opsyn_state,
        }
    }
}

impl PartialEq for MacroCacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.related_open_code == other.related_open_code && self.data == other.data && self.opsyn_state == other.opsyn_state
    }
}

impl Eq for MacroCacheKey {}

impl std::hash::Hash for MacroCacheKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.related_open_code.hash(state);
        self.data.hash(state);
        self.opsyn_state.hash(state);
    }
}

/// A parsed macro definition prototype, cached across references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    /// The macro's name.
    pub name: SmolStr,
    /// Where it is defined.
    pub resource: ResourceLocation,
}

/// A parsed copy member, cached across `COPY` statements referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyDefinition {
    /// The copy member's name.
    pub name: SmolStr,
    /// Where it is defined.
    pub resource: ResourceLocation,
}

/// Either shape a cache entry can hold.
///
/// Equivalent to `macro_cache_data::cached_member`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedMember {
    /// A cached macro prototype.
    Macro(Rc<MacroDefinition>),
    /// A cached copy member.
    Copy(Rc<CopyDefinition>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: MacroCacheKey,
    /// Version stamp of the member's own resource, plus every copy member it
    /// transitively includes, in inclusion order.
    stamps: Vec<(ResourceLocation, VersionStamp)>,
    member: CachedMember,
}

/// The macro/copy member cache.
///
/// Equivalent to `macro_cache`.
#[derive(Debug, Default)]
pub struct MacroCache {
    entries: FxHashMap<(MacroCacheKeyHash, SmolStr), CacheEntry>,
}

/// `MacroCacheKey` does not implement `Ord`, and isn't `Copy`, so entries are
/// additionally indexed by member name; the key itself is stored alongside
/// the entry to resolve hash collisions precisely via `PartialEq`.
type MacroCacheKeyHash = u64;

fn key_hash(key: &MacroCacheKey) -> MacroCacheKeyHash {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

impl MacroCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a cached member by key and name, returning it only if every
    /// tracked resource's current version (as reported by `current_version`)
    /// still matches the stamp recorded when it was cached.
    ///
    /// Equivalent to `load_from_cache`.
    pub fn load_from_cache(
        &self,
        key: &MacroCacheKey,
        name: &str,
        current_version: impl Fn(&ResourceLocation) -> Option<VersionStamp>,
    ) -> Option<CachedMember> {
        let entry = self.entries.get(&(key_hash(key), SmolStr::from(name)))?;
        if &entry.key != key {
            return None;
        }
        let up_to_date = entry
            .stamps
            .iter()
            .all(|(loc, stamp)| current_version(loc) == Some(*stamp));
        up_to_date.then(|| entry.member.clone())
    }

    /// Saves a macro definition, recording the version stamps of its own
    /// resource and every copy member it includes.
    ///
    /// Equivalent to `save_macro`.
    pub fn save_macro(
        &mut self,
        key: MacroCacheKey,
        definition: Rc<MacroDefinition>,
        stamps: Vec<(ResourceLocation, VersionStamp)>,
    ) {
        let name = definition.name.clone();
        self.entries.insert(
            (key_hash(&key), name.clone()),
            CacheEntry {
                key,
                stamps,
                member: CachedMember::Macro(definition),
            },
        );
    }

    /// Saves a copy member definition.
    pub fn save_copy(&mut self, key: MacroCacheKey, definition: Rc<CopyDefinition>, stamps: Vec<(ResourceLocation, VersionStamp)>) {
        let name = definition.name.clone();
        self.entries.insert(
            (key_hash(&key), name.clone()),
            CacheEntry {
                key,
                stamps,
                member: CachedMember::Copy(definition),
            },
        );
    }

    /// Drops every entry whose related open code has expired, i.e. whose
    /// owning parse is no longer alive.
    ///
    /// Equivalent to `erase_unused`.
    pub fn erase_unused(&mut self) {
        self.entries.retain(|_, entry| entry.key.related_open_code.upgrade().is_some());
    }

    /// The number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(storage: &Rc<RefCell<IdStorage>>) -> MacroCacheKey {
        MacroCacheKey::create_from_context(storage, ResourceLocation::new("lib:///A"), vec![])
    }

    #[test]
    fn round_trips_a_cached_macro() {
        let storage = IdStorage::new_shared();
        let mut cache = MacroCache::new();
        let def = Rc::new(MacroDefinition {
            name: "MYMACRO".into(),
            resource: ResourceLocation::new("file:///MYMACRO.hlasm"),
        });
        let stamps = vec![(def.resource.clone(), 1)];
        cache.save_macro(key(&storage), def.clone(), stamps);

        let found = cache.load_from_cache(&key(&storage), "MYMACRO", |_| Some(1));
        assert_eq!(found, Some(CachedMember::Macro(def)));
    }

    #[test]
    fn stale_version_misses_cache() {
        let storage = IdStorage::new_shared();
        let mut cache = MacroCache::new();
        let def = Rc::new(MacroDefinition {
            name: "MYMACRO".into(),
            resource: ResourceLocation::new("file:///MYMACRO.hlasm"),
        });
        let stamps = vec![(def.resource.clone(), 1)];
        cache.save_macro(key(&storage), def, stamps);

        let found = cache.load_from_cache(&key(&storage), "MYMACRO", |_| Some(2));
        assert_eq!(found, None);
    }

    #[test]
    fn different_opsyn_state_is_a_different_key() {
        let storage = IdStorage::new_shared();
        let k1 = MacroCacheKey::create_from_context(&storage, ResourceLocation::new("lib:///A"), vec![]);
        let k2 = MacroCacheKey::create_from_context(
            &storage,
            ResourceLocation::new("lib:///A"),
            vec![OpsynMnemo { from: "AIF".into(), to: "MYAIF".into(), is_macro: true }],
        );
        assert_ne!(k1, k2);
    }

    #[test]
    fn dropped_open_code_makes_key_unreachable() {
        let storage = IdStorage::new_shared();
        let k1 = key(&storage);
        drop(storage);
        let storage2 = IdStorage::new_shared();
        let k2 = key(&storage2);
        assert_ne!(k1, k2);
    }

    #[test]
    fn erase_unused_drops_entries_from_dead_open_code() {
        let storage = IdStorage::new_shared();
        let mut cache = MacroCache::new();
        let def = Rc::new(MacroDefinition {
            name: "MYMACRO".into(),
            resource: ResourceLocation::new("file:///MYMACRO.hlasm"),
        });
        cache.save_macro(key(&storage), def.clone(), vec![(def.resource.clone(), 1)]);
        assert_eq!(cache.len(), 1);

        drop(storage);
        cache.erase_unused();
        assert!(cache.is_empty());
    }
}
