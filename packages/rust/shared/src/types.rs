//! Core domain types for the VTC catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::VtcFinderError;

/// Stable external identifier of a VTC (the number in `/vtc/<id>`).
pub type VtcId = u64;

// ---------------------------------------------------------------------------
// VtcStatus
// ---------------------------------------------------------------------------

/// Verification tier shown on a VTC page.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum VtcStatus {
    Verified,
    Validated,
    #[default]
    Normal,
}

impl VtcStatus {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Validated => "validated",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for VtcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VtcStatus {
    type Err = VtcFinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verified" => Ok(Self::Verified),
            "validated" => Ok(Self::Validated),
            "normal" => Ok(Self::Normal),
            other => Err(VtcFinderError::validation(format!(
                "unknown status '{other}': expected verified, validated or normal"
            ))),
        }
    }
}

/// Lenient conversion used when loading a catalog: anything unrecognised is `normal`.
impl From<String> for VtcStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Recruitment
// ---------------------------------------------------------------------------

/// Recruitment state advertised on a VTC page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Recruitment {
    Open,
    Closed,
    #[default]
    Unknown,
}

impl Recruitment {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Recruitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Recruitment {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "open" | "opened" => Self::Open,
            "closed" => Self::Closed,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A truck simulator a VTC drives in.
///
/// Variant order matches the alphabetical order of the wire names, so a
/// `BTreeSet<Game>` serializes as a sorted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Game {
    #[serde(rename = "ATS")]
    Ats,
    #[serde(rename = "ETS2")]
    Ets2,
}

impl Game {
    /// Parse a game from its abbreviation or full title, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "ets2" | "euro truck simulator 2" => Some(Self::Ets2),
            "ats" | "american truck simulator" => Some(Self::Ats),
            _ => None,
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ats => "ATS",
            Self::Ets2 => "ETS2",
        })
    }
}

/// Per-game flags, the shape the filter engine tests against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameFlags {
    pub ets2: bool,
    pub ats: bool,
}

impl From<&BTreeSet<Game>> for GameFlags {
    fn from(games: &BTreeSet<Game>) -> Self {
        Self {
            ets2: games.contains(&Game::Ets2),
            ats: games.contains(&Game::Ats),
        }
    }
}

// ---------------------------------------------------------------------------
// VtcRecord
// ---------------------------------------------------------------------------

/// One entry of the catalog.
///
/// Skeleton records produced by the directory crawl only carry an `id`;
/// every other descriptive field stays unset until the record is scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VtcRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: VtcId,

    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<VtcStatus>,

    #[serde(default, deserialize_with = "lenient")]
    pub recruitment: Option<Recruitment>,

    /// Accepts either `["ETS2", "ATS"]` or `{"ets2": true, "ats": false}`.
    #[serde(default, deserialize_with = "deserialize_games")]
    pub games: BTreeSet<Game>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub tmp_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub discord_invites: Vec<String>,

    /// Member count; `0` or absent means unknown.
    #[serde(
        default,
        deserialize_with = "deserialize_members",
        skip_serializing_if = "Option::is_none"
    )]
    pub members: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub language: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,

    /// Fields written by other tools, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl VtcRecord {
    /// An id-only skeleton record.
    pub fn skeleton(id: VtcId) -> Self {
        Self {
            id,
            name: None,
            status: None,
            recruitment: None,
            games: BTreeSet::new(),
            tmp_url: None,
            discord_invites: Vec::new(),
            members: None,
            language: None,
            region: None,
            extra: BTreeMap::new(),
        }
    }

    /// Name used when a page yields no usable name.
    pub fn placeholder_name(id: VtcId) -> String {
        format!("VTC {id}")
    }

    pub fn status_or_default(&self) -> VtcStatus {
        self.status.unwrap_or_default()
    }

    pub fn recruitment_or_default(&self) -> Recruitment {
        self.recruitment.unwrap_or_default()
    }

    pub fn game_flags(&self) -> GameFlags {
        GameFlags::from(&self.games)
    }

    /// Known member count, `None` when absent or zero.
    pub fn known_members(&self) -> Option<u32> {
        self.members.filter(|&m| m > 0)
    }

    /// Language code, ignoring empty strings.
    pub fn language(&self) -> Option<&str> {
        non_blank(&self.language)
    }

    /// Region code, ignoring empty strings.
    pub fn region(&self) -> Option<&str> {
        non_blank(&self.region)
    }

    /// Trimmed name, ignoring empty strings.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

fn deserialize_id<'de, D>(deserializer: D) -> Result<VtcId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Number(VtcId),
        Text(String),
    }

    match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(id) => Ok(id),
        IdRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| <D::Error as DeError>::custom(format!("invalid VTC id '{text}'"))),
    }
}

// Only `id` may reject a record. Every other field falls back to its
// default when the stored value has the wrong type, so one bad field never
// drops a record from the catalog.

/// Deserialize `T`, or `T::default()` when the value does not fit.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Member count from a number or numeric string; anything else is unknown.
fn deserialize_members<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let members = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(members)
}

/// String items of a list; non-string items and non-list values are dropped.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(items)
}

fn deserialize_games<'de, D>(deserializer: D) -> Result<BTreeSet<Game>, D::Error>
where
    D: Deserializer<'de>,
{
    let games = match Value::deserialize(deserializer)? {
        Value::Array(labels) => labels
            .iter()
            .filter_map(Value::as_str)
            .filter_map(Game::from_label)
            .collect(),
        Value::Object(flags) => flags
            .iter()
            .filter(|(_, enabled)| enabled.as_bool() == Some(true))
            .filter_map(|(key, _)| Game::from_label(key))
            .collect(),
        _ => BTreeSet::new(),
    };
    Ok(games)
}
