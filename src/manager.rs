use std::path::Path;

use uuid::Uuid;

use crate::cache::ProfileCache;
use crate::config::CacheConfig;
use crate::profile::Profile;
use crate::resolver::{FallbackResolver, HttpResolver, ProfileResolver};
use crate::storage::ProfileStore;
use crate::Result;

const LABEL: &str = "uuid-cache";

/// Entry point for resolving players by identifier or by name.
///
/// Lookups never fail loudly: failures are logged and reported as `None`,
/// and are retried on the next call. `load` and `save` report errors and
/// leave it to the caller whether to carry on with a cold cache.
pub struct ProfileManager {
    cache: ProfileCache,
    store: ProfileStore,
}

impl ProfileManager {
    /// A manager backed by the identity service, as configured.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        let resolver = HttpResolver::from_config(config)?;
        Ok(Self::with_resolver(
            &config.cache_file,
            resolver,
            config.max_cache_size,
        ))
    }

    /// A manager that asks `resolver` on every cache miss.
    pub fn with_resolver(
        path: &Path,
        resolver: impl ProfileResolver + 'static,
        max_cache_size: usize,
    ) -> Self {
        Self {
            cache: ProfileCache::new(
                LABEL.to_owned(),
                resolver,
                max_cache_size,
            ),
            store: ProfileStore::new(LABEL.to_owned(), path),
        }
    }

    /// A manager that consults `local` (e.g. players of the current session)
    /// before falling back to the identity service.
    pub fn with_local_source(
        config: &CacheConfig,
        local: impl ProfileResolver + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let remote = HttpResolver::from_config(config)?;
        Ok(Self::with_resolver(
            &config.cache_file,
            FallbackResolver::new(local, remote),
            config.max_cache_size,
        ))
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Looks `raw` up as an identifier when it has that shape, as a name
    /// otherwise.
    pub fn get_by_string(&self, raw: &str) -> Option<Profile> {
        self.cache.lookup(raw).map_err(log_failure).ok()
    }

    pub fn get_by_uuid(&self, id: &Uuid) -> Option<Profile> {
        self.cache.lookup_by_id(id).map_err(log_failure).ok()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Profile> {
        self.cache
            .lookup_by_name(name)
            .map_err(log_failure)
            .ok()
    }

    /// Replaces the cache content with the cache file's.
    ///
    /// On error the in-memory content is left untouched.
    pub fn load(&self) -> Result<usize> {
        match self.store.read_fs() {
            Ok(profiles) => {
                self.cache.replace_all(profiles);
                let loaded = self.cache.len();
                log::info!("{}: loaded {} profiles", LABEL, loaded);
                Ok(loaded)
            }
            Err(e) => {
                log::error!("{}: failed loading cache: {}", LABEL, e);
                Err(e)
            }
        }
    }

    /// Writes the cache content to the cache file.
    pub fn save(&self) -> Result<usize> {
        self.store
            .write_fs(self.cache.snapshot())
            .map_err(|e| {
                log::error!("{}: failed saving cache: {}", LABEL, e);
                e
            })
    }
}

fn log_failure(e: crate::ResolveError) {
    if e.is_not_found() {
        log::debug!("{}: {}", LABEL, e);
    } else {
        log::warn!("{}: {}", LABEL, e);
    }
}
