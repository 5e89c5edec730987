use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Identifiers ────────────────────────────────────────────────────────────

/// Identifier of a creative within the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreativeId(String);

impl CreativeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh id for an ingested creative.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..12].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for CreativeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for CreativeId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

/// An aspect-ratio or format label describing one deliverable variant of a
/// creative, e.g. `9:16` or `HTML5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(String);

impl Dimension {
    pub const PLAYABLE: &'static str = "HTML5";
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_playable(&self) -> bool {
        self.0 == Self::PLAYABLE
    }

    /// Human label for a deliverable version of this dimension.
    pub fn version_label(&self) -> &'static str {
        match self.0.as_str() {
            Self::PLAYABLE => "Playable",
            "1:1" => "Square",
            "16:9" | "1.91:1" => "Landscape",
            _ => "Portrait",
        }
    }
}

impl AsRef<str> for Dimension {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Dimension {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

// ─── Platforms ──────────────────────────────────────────────────────────────

/// Supported ad networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Meta,
    Tiktok,
    Google,
    Applovin,
    Unity,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Meta,
        Platform::Tiktok,
        Platform::Google,
        Platform::Applovin,
        Platform::Unity,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Platform::Meta => "meta",
            Platform::Tiktok => "tiktok",
            Platform::Google => "google",
            Platform::Applovin => "applovin",
            Platform::Unity => "unity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Meta => "Meta Ads",
            Platform::Tiktok => "TikTok",
            Platform::Google => "Google Ads",
            Platform::Applovin => "AppLovin",
            Platform::Unity => "Unity Ads",
        }
    }

    /// Format requirements as advertised by the network.
    pub fn requirements(&self) -> &'static str {
        match self {
            Platform::Meta => "1:1, 9:16 Images/Video",
            Platform::Tiktok => "9:16 Video only",
            Platform::Google => "1.91:1, 1:1, 4:5",
            Platform::Applovin => "Playables, Video",
            Platform::Unity => "Video, Playables",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform: {0}")]
pub struct ParsePlatformError(pub String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.id() == lowered)
            .ok_or_else(|| ParsePlatformError(s.to_string()))
    }
}

// ─── Creatives ──────────────────────────────────────────────────────────────

/// Media kind of a creative asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Playable,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Video, MediaKind::Image, MediaKind::Playable];

    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::Video => "Video",
            MediaKind::Image => "Image",
            MediaKind::Playable => "Playable",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown media kind: {0}")]
pub struct ParseMediaKindError(pub String);

impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "image" => Ok(MediaKind::Image),
            "playable" => Ok(MediaKind::Playable),
            _ => Err(ParseMediaKindError(s.to_string())),
        }
    }
}

/// Size and modification time of the source file, used to skip re-uploads
/// of the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFingerprint {
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

/// A single ad asset with one or more dimension variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    pub id: CreativeId,
    pub game_id: String,
    pub name: String,
    pub kind: MediaKind,
    pub dimensions: Vec<Dimension>,
    pub owner: String,
    pub created_on: NaiveDate,
    pub thumb: String,
    /// Platforms suggested at ingest time; derived from dimensions when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<Platform>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<FileFingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_image_hash: Option<String>,
}

impl Creative {
    /// Stored platforms, or the compatible platforms of every dimension.
    pub fn effective_platforms(&self) -> Vec<Platform> {
        match &self.platforms {
            Some(platforms) => platforms.clone(),
            None => crate::compatibility::compatible_platforms(&self.dimensions)
                .into_iter()
                .collect(),
        }
    }

    /// Number of ad units the creative expands to across delivery slots.
    pub fn ad_units(&self) -> usize {
        self.dimensions.len() * 3
    }
}

/// A game title owning a set of creatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub genre: String,
}

/// A campaign or ad set as listed by an ad network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdObject {
    pub id: String,
    pub name: String,
}

impl AdObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ─── Publish history ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryStatus {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HistoryStatus::Success => "Success",
            HistoryStatus::Partial => "Partial",
            HistoryStatus::Failed => "Failed",
        };
        f.pad(s)
    }
}

impl FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(HistoryStatus::Success),
            "partial" => Ok(HistoryStatus::Partial),
            "failed" => Ok(HistoryStatus::Failed),
            _ => Err(format!("unknown history status: {s}")),
        }
    }
}

/// Immutable log entry of a completed publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    #[serde(default)]
    pub game_id: Option<String>,
    pub platform: Platform,
    pub campaign: String,
    pub status: HistoryStatus,
    pub date: NaiveDate,
    pub creatives: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_ids: Vec<String>,
}

/// Creative id → platforms the creative has been published to.
pub type UploadStatusMap = BTreeMap<CreativeId, Vec<Platform>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert_eq!(" META ".parse::<Platform>().unwrap(), Platform::Meta);
        assert!("snapchat".parse::<Platform>().is_err());
    }

    #[test]
    fn platform_serializes_as_lowercase_id() {
        let json = serde_json::to_string(&Platform::Applovin).unwrap();
        assert_eq!(json, "\"applovin\"");
    }

    #[test]
    fn generated_ids_have_no_separator() {
        for _ in 0..32 {
            let id = CreativeId::generate();
            assert!(!id.as_str().contains('-'));
            assert_eq!(id.as_str().len(), 12);
        }
    }

    #[test]
    fn effective_platforms_prefer_stored_suggestion() {
        let mut creative = Creative {
            id: CreativeId::from(1),
            game_id: "g1".into(),
            name: "Hero Gameplay v1".into(),
            kind: MediaKind::Video,
            dimensions: vec![Dimension::from("HTML5")],
            owner: "Dev Team".into(),
            created_on: NaiveDate::from_ymd_opt(2025, 10, 24).unwrap(),
            thumb: String::new(),
            platforms: None,
            fingerprint: None,
            meta_image_hash: None,
        };
        assert_eq!(
            creative.effective_platforms(),
            vec![Platform::Applovin, Platform::Unity]
        );

        creative.platforms = Some(vec![Platform::Meta]);
        assert_eq!(creative.effective_platforms(), vec![Platform::Meta]);
    }

    #[test]
    fn history_status_round_trips_through_display() {
        for status in [HistoryStatus::Success, HistoryStatus::Partial, HistoryStatus::Failed] {
            assert_eq!(status.to_string().parse::<HistoryStatus>().unwrap(), status);
        }
    }
}
