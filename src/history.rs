use std::collections::HashMap;

use uuid::Uuid;

use crate::errors::ResolveError;
use crate::id::parse_identifier;
use crate::profile::{NameRecord, Profile, ProfileQuery, ResolvedIdentity};
use crate::resolver::HttpResolver;

type HistoryResult<T> = std::result::Result<T, ResolveError>;

/// Source of name-change histories.
pub trait NameHistory {
    /// All names `id` went by, oldest first. Never empty on success.
    fn name_history(&self, id: &Uuid) -> HistoryResult<Vec<NameRecord>>;

    /// The profile currently holding `name`.
    fn profile_by_name(&self, name: &str) -> HistoryResult<Profile>;
}

impl NameHistory for HttpResolver {
    fn name_history(&self, id: &Uuid) -> HistoryResult<Vec<NameRecord>> {
        self.fetch_names(id)
    }

    fn profile_by_name(&self, name: &str) -> HistoryResult<Profile> {
        self.fetch_profile(name)
    }
}

pub fn identity_by_id(
    source: &impl NameHistory,
    id: &Uuid,
) -> HistoryResult<ResolvedIdentity> {
    let names = source.name_history(id)?;
    Ok(ResolvedIdentity { id: *id, names })
}

/// Resolves `name` to its current holder, then fetches that holder's
/// history.
pub fn identity_by_name(
    source: &impl NameHistory,
    name: &str,
) -> HistoryResult<ResolvedIdentity> {
    if let Some(id) = parse_identifier(name) {
        return identity_by_id(source, &id);
    }
    let profile = source.profile_by_name(name)?;
    identity_by_id(source, &profile.id)
}

pub fn identity_by_query(
    source: &impl NameHistory,
    raw: &str,
) -> HistoryResult<ResolvedIdentity> {
    match ProfileQuery::classify(raw) {
        Some(ProfileQuery::Id(id)) => identity_by_id(source, &id),
        Some(ProfileQuery::Name(name)) => identity_by_name(source, &name),
        None => Err(ResolveError::NotFound(raw.to_owned())),
    }
}

/// Unbounded identifier → current name memo, owned by whoever needs it.
///
/// Unlike [`crate::ProfileCache`] it never evicts and is not persisted.
#[derive(Debug, Default, Clone)]
pub struct NameMemo {
    names: HashMap<Uuid, String>,
}

impl NameMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name for `raw`.
    ///
    /// Input that is not an identifier is returned as is. Identifiers are
    /// answered from the memo, or from `source` on the first request.
    /// Failed lookups yield `None` and are not remembered.
    pub fn cached_name(
        &mut self,
        source: &impl NameHistory,
        raw: &str,
    ) -> Option<String> {
        let id = match parse_identifier(raw) {
            Some(id) => id,
            None => return Some(raw.to_owned()),
        };

        if let Some(name) = self.names.get(&id) {
            return Some(name.clone());
        }

        match identity_by_id(source, &id) {
            Ok(identity) => {
                let name = identity.current_name()?.to_owned();
                self.names.insert(id, name.clone());
                Some(name)
            }
            Err(e) => {
                log::debug!("no name for {}: {}", id, e);
                None
            }
        }
    }

    pub fn remember(&mut self, profile: &Profile) {
        self.names
            .insert(profile.id, profile.name.clone());
    }

    pub fn get(&self, id: &Uuid) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn forget(&mut self, id: &Uuid) -> Option<String> {
        self.names.remove(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
