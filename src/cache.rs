use std::sync::Mutex;

use linked_hash_map::LinkedHashMap;
use uuid::Uuid;

use crate::errors::ResolveError;
use crate::lock;
use crate::profile::{name_key, Profile, ProfileQuery};
use crate::resolver::ProfileResolver;

pub type Lookup = std::result::Result<Profile, ResolveError>;

/// Bounded, bidirectional cache of profiles.
///
/// Profiles are reachable by identifier and by lowercased name. Both tables
/// keep insertion order and are trimmed oldest-inserted first; a cache hit
/// does not refresh an entry.
///
/// Each table is locked on its own, so single reads and writes are safe
/// from any thread, but a miss (resolve, reconcile, insert, evict) is not
/// atomic across the two tables. Two concurrent misses for the same query
/// both reach the resolver, and racing renames may briefly leave the tables
/// disagreeing. Once every operation has returned, the tables agree again.
pub struct ProfileCache {
    /// Label for logging
    label: String,
    resolver: Box<dyn ProfileResolver>,
    max_cache_size: usize,
    by_id: Mutex<LinkedHashMap<Uuid, Profile>>,
    by_name: Mutex<LinkedHashMap<String, Profile>>,
}

impl ProfileCache {
    /// Creates an empty cache holding at most `max_cache_size` profiles.
    ///
    /// A bound of zero is raised to one.
    pub fn new(
        label: String,
        resolver: impl ProfileResolver + 'static,
        max_cache_size: usize,
    ) -> Self {
        if max_cache_size == 0 {
            log::warn!("cache/{}: size bound of 0 raised to 1", label);
        }
        let max_cache_size = max_cache_size.max(1);

        log::debug!(
            "cache/{}: initialized with {} entries limit",
            label,
            max_cache_size
        );

        Self {
            label,
            resolver: Box::new(resolver),
            max_cache_size,
            by_id: Mutex::new(LinkedHashMap::new()),
            by_name: Mutex::new(LinkedHashMap::new()),
        }
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    /// Classifies `raw` and dispatches to the matching lookup.
    ///
    /// Blank input is `NotFound` without consulting the resolver.
    pub fn lookup(&self, raw: &str) -> Lookup {
        match ProfileQuery::classify(raw) {
            Some(ProfileQuery::Id(id)) => self.lookup_by_id(&id),
            Some(ProfileQuery::Name(name)) => self.lookup_by_name(&name),
            None => Err(ResolveError::NotFound(raw.to_owned())),
        }
    }

    pub fn lookup_by_id(&self, id: &Uuid) -> Lookup {
        if let Some(profile) = self.cached_by_id(id) {
            log::debug!("cache/{}: hit for {}", self.label, id);
            return Ok(profile);
        }

        log::debug!("cache/{}: miss for {}", self.label, id);
        self.resolve_and_install(&ProfileQuery::Id(*id))
    }

    /// Blank names are `NotFound` without consulting the resolver.
    pub fn lookup_by_name(&self, name: &str) -> Lookup {
        if name.trim().is_empty() {
            return Err(ResolveError::NotFound(name.to_owned()));
        }
        if let Some(profile) = self.cached_by_name(name) {
            log::debug!("cache/{}: hit for {}", self.label, name);
            return Ok(profile);
        }

        log::debug!("cache/{}: miss for {}", self.label, name);
        self.resolve_and_install(&ProfileQuery::Name(name.to_owned()))
    }

    /// Reads the by-identifier table without resolving.
    pub fn cached_by_id(&self, id: &Uuid) -> Option<Profile> {
        lock(&self.by_id).get(id).cloned()
    }

    /// Reads the by-name table without resolving.
    pub fn cached_by_name(&self, name: &str) -> Option<Profile> {
        lock(&self.by_name)
            .get(&name_key(name))
            .cloned()
    }

    /// A malformed answer reaches callers as `Unreachable`.
    fn resolve_and_install(&self, query: &ProfileQuery) -> Lookup {
        let profile = self.resolver.resolve(query).map_err(|e| {
            if !e.is_not_found() {
                log::warn!(
                    "cache/{}: failed resolving {}: {}",
                    self.label,
                    query,
                    e
                );
            }
            match e {
                ResolveError::MalformedResponse(reason) => {
                    ResolveError::Unreachable(reason)
                }
                e => e,
            }
        })?;

        self.install(profile.clone());
        self.trim();
        Ok(profile)
    }

    /// Inserts `profile` into both tables, first dropping the entries it
    /// supersedes.
    fn install(&self, profile: Profile) {
        let key = profile.name_key();

        // the identifier used to go by another name
        let stale_name = lock(&self.by_id)
            .get(&profile.id)
            .map(Profile::name_key)
            .filter(|stale| *stale != key);
        if let Some(stale_name) = stale_name {
            log::debug!(
                "cache/{}: {} renamed from {} to {}",
                self.label,
                profile.id,
                stale_name,
                profile.name
            );
            self.remove_name_if_owned(&stale_name, &profile.id);
        }

        // the name used to belong to another identifier
        let stale_id = lock(&self.by_name)
            .get(&key)
            .map(|owner| owner.id)
            .filter(|owner| *owner != profile.id);
        if let Some(stale_id) = stale_id {
            log::debug!(
                "cache/{}: {} moved from {} to {}",
                self.label,
                profile.name,
                stale_id,
                profile.id
            );
            self.remove_id_if_named(&stale_id, &key);
        }

        lock(&self.by_id).insert(profile.id, profile.clone());
        lock(&self.by_name).insert(key, profile);
    }

    fn remove_name_if_owned(&self, key: &str, id: &Uuid) {
        let mut by_name = lock(&self.by_name);
        if by_name
            .get(key)
            .map_or(false, |owner| owner.id == *id)
        {
            by_name.remove(key);
        }
    }

    fn remove_id_if_named(&self, id: &Uuid, key: &str) {
        let mut by_id = lock(&self.by_id);
        if by_id
            .get(id)
            .map_or(false, |profile| profile.name_key() == key)
        {
            by_id.remove(id);
        }
    }

    /// Evicts oldest-inserted entries until both tables fit the bound.
    fn trim(&self) {
        loop {
            let evicted = {
                let mut by_id = lock(&self.by_id);
                if by_id.len() <= self.max_cache_size {
                    break;
                }
                by_id.pop_front()
            };
            if let Some((id, profile)) = evicted {
                log::debug!("cache/{}: evicted {}", self.label, profile);
                self.remove_name_if_owned(&profile.name_key(), &id);
            }
        }

        // only diverges from the identifier table after a race
        loop {
            let evicted = {
                let mut by_name = lock(&self.by_name);
                if by_name.len() <= self.max_cache_size {
                    break;
                }
                by_name.pop_front()
            };
            if let Some((key, profile)) = evicted {
                log::debug!("cache/{}: evicted {}", self.label, profile);
                self.remove_id_if_named(&profile.id, &key);
            }
        }
    }

    /// Replaces the whole content of the cache, e.g. after reading it from
    /// disk. Entries are installed in order, then trimmed to the bound.
    pub fn replace_all(&self, profiles: impl IntoIterator<Item = Profile>) {
        self.clear();
        for profile in profiles {
            self.install(profile);
        }
        self.trim();
    }

    pub fn clear(&self) {
        lock(&self.by_id).clear();
        lock(&self.by_name).clear();
    }

    /// Profiles of the by-identifier table, oldest-inserted first.
    pub fn snapshot(&self) -> Vec<Profile> {
        lock(&self.by_id).values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.by_id).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every profile reachable by identifier is reachable under its
    /// lowercased name, and the other way around.
    pub fn is_consistent(&self) -> bool {
        let by_id = lock(&self.by_id).clone();
        let by_name = lock(&self.by_name).clone();

        by_id.len() == by_name.len()
            && by_id.iter().all(|(id, profile)| {
                by_name
                    .get(&profile.name_key())
                    .map_or(false, |owner| owner.id == *id)
            })
            && by_name.iter().all(|(key, profile)| {
                by_id
                    .get(&profile.id)
                    .map_or(false, |owner| owner.name_key() == *key)
            })
    }
}
