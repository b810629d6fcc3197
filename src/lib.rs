use std::sync::{
    Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

pub mod cache;
pub mod cape;
pub mod config;
mod errors;
pub mod history;
pub mod id;
pub mod manager;
pub mod profile;
pub mod resolver;
pub mod storage;

pub use cache::{Lookup, ProfileCache};
pub use config::CacheConfig;
pub use errors::{CacheError, ResolveError, Result};
pub use history::{NameHistory, NameMemo};
pub use manager::ProfileManager;
pub use profile::{NameRecord, Profile, ProfileQuery, ResolvedIdentity};
pub use resolver::{
    FallbackResolver, HttpResolver, LocalResolver, ProfileResolver,
};
pub use storage::ProfileStore;

pub const CACHE_FILE: &str = "uuid_cache.json";
pub const DEFAULT_MAX_CACHE_SIZE: usize = 500;

// Remote identity service
pub const DEFAULT_API_BASE_URL: &str = "https://api.mojang.com";
pub const DEFAULT_NAMESPACE: &str = "minecraft";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

// Guarded data is plain and stays valid after a panic, poisoned or not.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read()
        .unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write()
        .unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) fn initialize() {
    let _ = env_logger::builder()
        .is_test(true)
        .try_init();
}
