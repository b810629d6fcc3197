//! Cosmetic capes attached to users of the cape service.
//!
//! These are plain records exchanged with that service as JSON; nothing in
//! here talks to the network.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CAPE_UUID_LEN: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapeUser {
    pub id: i64,
    pub capes: Vec<Cape>,
    #[serde(default)]
    pub is_premium: bool,
}

impl PartialEq for CapeUser {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.capes == other.capes
    }
}

impl Eq for CapeUser {}

impl Hash for CapeUser {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.capes.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CapeRecord")]
pub struct Cape {
    pub player_uuid: Option<String>,
    pub cape_uuid: String,
    #[serde(rename = "type")]
    pub cape_type: CapeType,
    pub color: CapeColor,
}

impl Cape {
    /// A fresh cape of `cape_type`, colored after its type.
    pub fn new(player_uuid: Option<String>, cape_type: CapeType) -> Self {
        Self {
            player_uuid,
            cape_uuid: random_cape_uuid(),
            cape_type,
            color: CapeColor::for_type(cape_type),
        }
    }
}

impl PartialEq for Cape {
    fn eq(&self, other: &Self) -> bool {
        self.cape_uuid == other.cape_uuid && self.cape_type == other.cape_type
    }
}

impl Eq for Cape {}

impl Hash for Cape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cape_uuid.hash(state);
        self.cape_type.hash(state);
    }
}

/// Wire shape of a [`Cape`], where the identifier and color are optional.
#[derive(Deserialize)]
struct CapeRecord {
    player_uuid: Option<String>,
    cape_uuid: Option<String>,
    #[serde(rename = "type")]
    cape_type: CapeType,
    color: Option<CapeColor>,
}

impl From<CapeRecord> for Cape {
    fn from(record: CapeRecord) -> Self {
        Self {
            player_uuid: record.player_uuid,
            cape_uuid: record
                .cape_uuid
                .unwrap_or_else(random_cape_uuid),
            cape_type: record.cape_type,
            color: record
                .color
                .unwrap_or_else(|| CapeColor::for_type(record.cape_type)),
        }
    }
}

fn random_cape_uuid() -> String {
    Uuid::new_v4().to_string()[..CAPE_UUID_LEN].to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapeType {
    Booster,
    Contest,
    Contributor,
    Donor,
    Inviter,
    Special,
}

impl CapeType {
    pub const ALL: [CapeType; 6] = [
        CapeType::Booster,
        CapeType::Contest,
        CapeType::Contributor,
        CapeType::Donor,
        CapeType::Inviter,
        CapeType::Special,
    ];

    /// Human readable name
    pub fn real_name(&self) -> &'static str {
        match self {
            CapeType::Booster => "Booster",
            CapeType::Contest => "Contest",
            CapeType::Contributor => "Contributor",
            CapeType::Donor => "Donor",
            CapeType::Inviter => "Inviter",
            CapeType::Special => "Special",
        }
    }

    /// Key of the texture used to render the cape
    pub fn image_key(&self) -> &'static str {
        match self {
            CapeType::Booster => "booster",
            CapeType::Contest => "contest",
            CapeType::Contributor => "github1",
            CapeType::Donor => "donator2",
            CapeType::Inviter => "inviter",
            CapeType::Special => "special",
        }
    }
}

/// Hex RGB colors, without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapeColor {
    pub primary: String,
    pub border: String,
}

impl CapeColor {
    pub fn new(primary: &str, border: &str) -> Self {
        Self {
            primary: primary.to_owned(),
            border: border.to_owned(),
        }
    }

    pub fn for_type(cape_type: CapeType) -> Self {
        match cape_type {
            CapeType::Booster => Self::new("e68cc8", "ffa0e6"),
            CapeType::Contest => Self::new("90b3ff", "3869d1"),
            CapeType::Contributor => Self::new("333333", "211f1f"),
            CapeType::Inviter => Self::new("de90ff", "9c30c9"),
            CapeType::Donor | CapeType::Special => {
                Self::new("9b90ff", "8778ff")
            }
        }
    }
}

impl fmt::Display for CapeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}, #{}", self.primary, self.border)
    }
}
