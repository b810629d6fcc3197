use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::errors::ResolveError;
use crate::id::{parse_identifier, remove_dashes};
use crate::profile::{name_key, NameRecord, Profile, ProfileQuery};
use crate::{read_lock, write_lock, CacheError, Result};

/// Source of authoritative profiles, consulted by the cache on a miss.
pub trait ProfileResolver: Send + Sync {
    fn resolve(
        &self,
        query: &ProfileQuery,
    ) -> std::result::Result<Profile, ResolveError>;
}

impl<R: ProfileResolver + ?Sized> ProfileResolver for Box<R> {
    fn resolve(
        &self,
        query: &ProfileQuery,
    ) -> std::result::Result<Profile, ResolveError> {
        (**self).resolve(query)
    }
}

impl<R: ProfileResolver + ?Sized> ProfileResolver for Arc<R> {
    fn resolve(
        &self,
        query: &ProfileQuery,
    ) -> std::result::Result<Profile, ResolveError> {
        (**self).resolve(query)
    }
}

/// Body of the name → profile endpoint.
#[derive(Debug, Deserialize)]
struct RemoteProfile {
    id: String,
    name: String,
}

/// Talks to the remote identity service.
///
/// Every call is a single blocking GET: no retry, no backoff. Only the
/// connection phase is bounded, by `connect_timeout`.
pub struct HttpResolver {
    base_url: Url,
    namespace: String,
    client: Client,
}

impl HttpResolver {
    pub fn new(
        base_url: &str,
        namespace: &str,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(CacheError::Config(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(None)
            .build()
            .map_err(|e| CacheError::Other(e.into()))?;

        Ok(Self {
            base_url,
            namespace: namespace.to_owned(),
            client,
        })
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            &config.namespace,
            config.connect_timeout(),
        )
    }

    /// `GET <base>/users/profiles/<namespace>/<name>`
    pub fn fetch_profile(
        &self,
        name: &str,
    ) -> std::result::Result<Profile, ResolveError> {
        let url = self.endpoint(&[
            "users",
            "profiles",
            self.namespace.as_str(),
            name,
        ])?;
        let body = self.get(url, name)?;

        let remote: RemoteProfile = serde_json::from_str(&body)
            .map_err(|e| malformed(name, e.to_string()))?;
        let id = parse_identifier(&remote.id).ok_or_else(|| {
            malformed(name, format!("invalid identifier {:?}", remote.id))
        })?;

        Ok(Profile::new(id, remote.name))
    }

    /// `GET <base>/user/profiles/<id without dashes>/names`
    pub fn fetch_names(
        &self,
        id: &Uuid,
    ) -> std::result::Result<Vec<NameRecord>, ResolveError> {
        let simple = remove_dashes(id);
        let url =
            self.endpoint(&["user", "profiles", simple.as_str(), "names"])?;
        let body = self.get(url, &simple)?;

        let names: Vec<NameRecord> = serde_json::from_str(&body)
            .map_err(|e| malformed(&simple, e.to_string()))?;
        if names.is_empty() {
            return Err(ResolveError::NotFound(id.to_string()));
        }
        Ok(names)
    }

    fn endpoint(
        &self,
        segments: &[&str],
    ) -> std::result::Result<Url, ResolveError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ResolveError::Unreachable(format!(
                    "{} cannot be used as a base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs the request and returns a non-blank body.
    fn get(
        &self,
        url: Url,
        subject: &str,
    ) -> std::result::Result<String, ResolveError> {
        log::debug!("requesting {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .map_err(|e| {
                log::warn!("failed requesting {}: {}", subject, e);
                ResolveError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND
        {
            return Err(ResolveError::NotFound(subject.to_owned()));
        }
        if !status.is_success() {
            log::warn!(
                "identity service answered {} for {}",
                status,
                subject
            );
            return Err(ResolveError::Unreachable(format!("HTTP {}", status)));
        }

        let body = response.text().map_err(|e| {
            log::warn!("failed reading response for {}: {}", subject, e);
            ResolveError::Unreachable(e.to_string())
        })?;
        if body.trim().is_empty() {
            return Err(ResolveError::NotFound(subject.to_owned()));
        }
        Ok(body)
    }
}

impl ProfileResolver for HttpResolver {
    fn resolve(
        &self,
        query: &ProfileQuery,
    ) -> std::result::Result<Profile, ResolveError> {
        match query {
            ProfileQuery::Id(id) => {
                let names = self.fetch_names(id)?;
                names
                    .last()
                    .map(|current| Profile::new(*id, current.name.clone()))
                    .ok_or_else(|| ResolveError::NotFound(id.to_string()))
            }
            ProfileQuery::Name(name) => self.fetch_profile(name),
        }
    }
}

fn malformed(subject: &str, reason: String) -> ResolveError {
    log::warn!("failed parsing profile of {}: {}", subject, reason);
    ResolveError::MalformedResponse(reason)
}

/// Profiles that are already known locally, e.g. players connected to the
/// current session.
#[derive(Default)]
pub struct LocalResolver {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl LocalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        write_lock(&self.profiles).insert(profile.id, profile);
    }

    pub fn remove(&self, id: &Uuid) -> Option<Profile> {
        write_lock(&self.profiles).remove(id)
    }

    pub fn clear(&self) {
        write_lock(&self.profiles).clear();
    }

    pub fn len(&self) -> usize {
        read_lock(&self.profiles).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Profile> for LocalResolver {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let profiles = iter
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect();
        Self {
            profiles: RwLock::new(profiles),
        }
    }
}

impl ProfileResolver for LocalResolver {
    fn resolve(
        &self,
        query: &ProfileQuery,
    ) -> std::result::Result<Profile, ResolveError> {
        let profiles = read_lock(&self.profiles);
        let found = match query {
            ProfileQuery::Id(id) => profiles.get(id).cloned(),
            ProfileQuery::Name(name) => {
                let key = name_key(name);
                profiles
                    .values()
                    .find(|profile| profile.name_key() == key)
                    .cloned()
            }
        };
        found.ok_or_else(|| ResolveError::NotFound(query.to_string()))
    }
}

/// Asks `primary` first and `fallback` whenever `primary` fails.
pub struct FallbackResolver<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackResolver<P, F>
where
    P: ProfileResolver,
    F: ProfileResolver,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P, F> ProfileResolver for FallbackResolver<P, F>
where
    P: ProfileResolver,
    F: ProfileResolver,
{
    fn resolve(
        &self,
        query: &ProfileQuery,
    ) -> std::result::Result<Profile, ResolveError> {
        self.primary.resolve(query).or_else(|e| {
            log::debug!("primary source failed for {}: {}", query, e);
            self.fallback.resolve(query)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notch() -> Profile {
        Profile::new(
            Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap(),
            "Notch",
        )
    }

    #[test]
    fn local_resolver_matches_names_case_insensitively() {
        let local: LocalResolver = [notch()].into_iter().collect();

        let by_name = local
            .resolve(&ProfileQuery::Name("NOTCH".to_owned()))
            .unwrap();
        assert_eq!(by_name.name, "Notch");

        let by_id = local
            .resolve(&ProfileQuery::Id(notch().id))
            .unwrap();
        assert_eq!(by_id, notch());

        let missing = local.resolve(&ProfileQuery::Name("jeb_".to_owned()));
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn fallback_is_used_only_when_primary_fails() {
        let primary = LocalResolver::new();
        let fallback: LocalResolver = [notch()].into_iter().collect();
        let resolver = FallbackResolver::new(primary, fallback);

        let query = ProfileQuery::Name("notch".to_owned());
        assert_eq!(resolver.resolve(&query).unwrap(), notch());

        resolver
            .primary
            .insert(Profile::new(notch().id, "Session"));
        let by_id = resolver
            .resolve(&ProfileQuery::Id(notch().id))
            .unwrap();
        assert_eq!(by_id.name, "Session");
    }

    #[test]
    fn endpoints_are_built_from_the_base_url() {
        let resolver = HttpResolver::new(
            "https://example.com/api/",
            "minecraft",
            Duration::from_secs(1),
        )
        .unwrap();

        let url = resolver
            .endpoint(&["users", "profiles", "minecraft", "a name/with?junk"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/users/profiles/minecraft/a%20name%2Fwith%3Fjunk"
        );
    }

    #[test]
    fn non_base_urls_are_rejected() {
        let result = HttpResolver::new(
            "mailto:someone",
            "minecraft",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(CacheError::Config(_))));
    }
}
