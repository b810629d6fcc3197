use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::parse_identifier;

/// An identifier together with the display name it currently carries.
///
/// This is the unit stored in the cache and in the cache file. Two profiles
/// are equal when their identifiers are, whatever their names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
}

impl Profile {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Key of this profile in the by-name table.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}

/// Names are matched case-insensitively.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// One entry of a name-change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    /// Epoch millis of the change. Absent for the name the account was
    /// created with.
    #[serde(rename = "changedToAt", default)]
    pub changed_to_at: Option<i64>,
}

/// An identifier with its full name history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub id: Uuid,
    pub names: Vec<NameRecord>,
}

impl ResolvedIdentity {
    /// The last record of the history, if there is any.
    pub fn current(&self) -> Option<&NameRecord> {
        self.names.last()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current().map(|record| record.name.as_str())
    }

    pub fn to_profile(&self) -> Option<Profile> {
        self.current_name()
            .map(|name| Profile::new(self.id, name))
    }
}

/// What a caller is looking a profile up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileQuery {
    Id(Uuid),
    Name(String),
}

impl ProfileQuery {
    /// Classifies raw user input.
    ///
    /// Anything that parses as an identifier (dashed, or 32 hex digits) is
    /// one; everything else non-blank is a name.
    pub fn classify(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        Some(match parse_identifier(raw) {
            Some(id) => ProfileQuery::Id(id),
            None => ProfileQuery::Name(raw.to_owned()),
        })
    }
}

impl fmt::Display for ProfileQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileQuery::Id(id) => write!(f, "{}", id),
            ProfileQuery::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";

    #[test]
    fn profiles_compare_by_identifier() {
        let id = Uuid::parse_str(ID).unwrap();
        assert_eq!(Profile::new(id, "Notch"), Profile::new(id, "NotNotch"));
        let other = Profile::new(Uuid::nil(), "Notch");
        assert_ne!(Profile::new(id, "Notch"), other);
    }

    #[test]
    fn profile_wire_format() {
        let profile = Profile::new(Uuid::parse_str(ID).unwrap(), "Notch");
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json, serde_json::json!({ "id": ID, "name": "Notch" }));

        let back: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(back.name, "Notch");
        assert_eq!(back.name_key(), "notch");
    }

    #[test]
    fn history_current_name_is_the_last_record() {
        let history: Vec<NameRecord> = serde_json::from_str(
            r#"[{"name":"first"},{"name":"second","changedToAt":1414059749000}]"#,
        )
        .unwrap();
        assert_eq!(history[0].changed_to_at, None);
        assert_eq!(history[1].changed_to_at, Some(1414059749000));

        let identity = ResolvedIdentity {
            id: Uuid::parse_str(ID).unwrap(),
            names: history,
        };
        assert_eq!(identity.current_name(), Some("second"));
        assert_eq!(identity.to_profile().unwrap().name, "second");
    }

    #[test]
    fn queries_are_classified() {
        let id = Uuid::parse_str(ID).unwrap();
        assert_eq!(ProfileQuery::classify(ID), Some(ProfileQuery::Id(id)));
        assert_eq!(
            ProfileQuery::classify(&ID.replace('-', "")),
            Some(ProfileQuery::Id(id))
        );
        assert_eq!(
            ProfileQuery::classify("Notch"),
            Some(ProfileQuery::Name("Notch".to_owned()))
        );
        assert_eq!(ProfileQuery::classify(""), None);
        assert_eq!(ProfileQuery::classify("   "), None);
    }
}
