//! Turning uploaded files into catalog creatives.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use creative_core::compatibility::{snap_ratio, suggested_platforms};
use creative_core::{
    Creative, CreativeError, CreativeId, CreativeResult, Dimension, FileFingerprint, MediaKind,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::DataStore;

/// Descriptor of a file offered for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFile {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Preview location recorded as the creative's thumbnail.
    #[serde(default)]
    pub preview: Option<String>,
}

impl IngestFile {
    /// Describe a file on disk. Image sizes are read from the header; the
    /// MIME type is derived from the extension.
    pub fn probe(path: &Path) -> CreativeResult<Self> {
        let meta = std::fs::metadata(path)?;
        let last_modified = meta
            .modified()
            .ok()
            .map(|t| DateTime::<chrono::Utc>::from(t).timestamp_millis())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let mime_type = mime_for_extension(extension.as_deref()).to_string();

        let (width, height) = if mime_type.starts_with("image/") {
            match image::image_dimensions(path) {
                Ok((w, h)) => (Some(w), Some(h)),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Could not read image size");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        Ok(Self {
            file_name,
            mime_type,
            size: meta.len(),
            last_modified,
            width,
            height,
            preview: Some(path.display().to_string()),
        })
    }

    /// File name without its last extension, or the whole name if it has none.
    pub fn base_name(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => self.file_name.clone(),
        }
    }

    pub fn fingerprint(&self) -> FileFingerprint {
        FileFingerprint {
            size: self.size,
            last_modified: self.last_modified,
        }
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        let mime = self.mime_type.to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else if matches!(
            mime.as_str(),
            "text/html" | "application/zip" | "application/x-zip-compressed"
        ) {
            Some(MediaKind::Playable)
        } else {
            None
        }
    }
}

fn mime_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("html" | "htm") => "text/html",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Outcome of one ingest batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub added: Vec<Creative>,
    pub duplicates: Vec<String>,
    pub rejected: Vec<(String, CreativeError)>,
}

/// Build the catalog entry for `file`. Fails for unsupported MIME types.
pub fn describe(file: &IngestFile, game_id: &str, owner: &str) -> CreativeResult<Creative> {
    let kind = file
        .media_kind()
        .ok_or_else(|| CreativeError::UnsupportedMedia(file.mime_type.clone()))?;

    let (dimensions, platforms) = match kind {
        MediaKind::Playable => (vec![Dimension::new(Dimension::PLAYABLE)], None),
        MediaKind::Image | MediaKind::Video => match (file.width, file.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => {
                (vec![snap_ratio(w, h)], Some(suggested_platforms(w, h)))
            }
            _ => (vec![Dimension::new(Dimension::UNKNOWN)], Some(Vec::new())),
        },
    };

    let created_on = DateTime::from_timestamp_millis(file.last_modified)
        .map(|d| d.date_naive())
        .unwrap_or_else(today);

    Ok(Creative {
        id: CreativeId::generate(),
        game_id: game_id.to_string(),
        name: file.base_name(),
        kind,
        dimensions,
        owner: owner.to_string(),
        created_on,
        thumb: file.preview.clone().unwrap_or_default(),
        platforms,
        fingerprint: Some(file.fingerprint()),
        meta_image_hash: None,
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn is_duplicate(existing: &[Creative], name: &str, fingerprint: FileFingerprint) -> bool {
    existing
        .iter()
        .any(|c| c.name == name && c.fingerprint == Some(fingerprint))
}

/// Add `files` to the catalog of `game_id`, skipping files already present
/// (same name, size and modification time) and unsupported media.
pub fn ingest(store: &DataStore, game_id: &str, owner: &str, files: Vec<IngestFile>) -> IngestReport {
    let catalog = store.creatives();
    let mut seen: HashSet<(String, FileFingerprint)> = HashSet::new();
    let mut report = IngestReport::default();

    for file in files {
        let name = file.base_name();
        let fingerprint = file.fingerprint();
        if is_duplicate(&catalog, &name, fingerprint) || !seen.insert((name.clone(), fingerprint)) {
            let err = CreativeError::DuplicateAsset { name: name.clone() };
            warn!(file = %file.file_name, "{err}");
            metrics::counter!("ingest.duplicates_skipped").increment(1);
            report.duplicates.push(name);
            continue;
        }
        match describe(&file, game_id, owner) {
            Ok(creative) => report.added.push(creative),
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "File rejected");
                metrics::counter!("ingest.rejected").increment(1);
                report.rejected.push((file.file_name, e));
            }
        }
    }

    info!(
        game_id,
        added = report.added.len(),
        duplicates = report.duplicates.len(),
        rejected = report.rejected.len(),
        "Ingest batch processed"
    );
    store.add_creatives(report.added.clone());
    report
}
