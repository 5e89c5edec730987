//! Durable dashboard state.
//!
//! Every collection lives in memory behind a `RwLock` and is written back to
//! the key-value backend after each change. Reads fail open: a missing or
//! unreadable key falls back to its default and the store stays usable.

use std::collections::HashSet;
use std::sync::Arc;

use creative_core::{
    Creative, CreativeError, CreativeId, CreativeResult, Dimension, HistoryRecord, Platform,
    UploadStatusMap,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{KeyValueBackend, MemoryBackend};
use crate::seed::seed_creatives;

pub const CREATIVES_KEY: &str = "creatives";
pub const HISTORY_KEY: &str = "history";
pub const UPLOADED_STATUS_KEY: &str = "uploadedStatus";
pub const META_TOKEN_KEY: &str = "metaToken";

/// Partial update applied to a stored creative.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeUpdate {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub thumb: Option<String>,
    pub dimensions: Option<Vec<Dimension>>,
    pub platforms: Option<Vec<Platform>>,
    pub meta_image_hash: Option<String>,
}

pub struct DataStore {
    backend: Arc<dyn KeyValueBackend>,
    creatives: RwLock<Vec<Creative>>,
    history: RwLock<Vec<HistoryRecord>>,
    uploaded: RwLock<UploadStatusMap>,
    meta_token: RwLock<Option<String>>,
}

impl DataStore {
    /// Load every collection from `backend`, substituting defaults for keys
    /// that are missing or fail to parse.
    pub fn load(backend: Arc<dyn KeyValueBackend>) -> Self {
        let creatives = read_key(backend.as_ref(), CREATIVES_KEY).unwrap_or_else(seed_creatives);
        let history: Vec<HistoryRecord> = read_key(backend.as_ref(), HISTORY_KEY).unwrap_or_default();
        let uploaded: UploadStatusMap =
            read_key(backend.as_ref(), UPLOADED_STATUS_KEY).unwrap_or_default();
        let meta_token: Option<String> = read_key::<String>(backend.as_ref(), META_TOKEN_KEY)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        info!(
            creatives = creatives.len(),
            history = history.len(),
            uploaded = uploaded.len(),
            connected = meta_token.is_some(),
            "Data store loaded"
        );

        Self {
            backend,
            creatives: RwLock::new(creatives),
            history: RwLock::new(history),
            uploaded: RwLock::new(uploaded),
            meta_token: RwLock::new(meta_token),
        }
    }

    /// Store over a fresh in-memory backend, starting from the seeded catalog.
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemoryBackend::new()))
    }

    // Callers hold the collection's write lock, so writes to one key land in
    // the same order as the in-memory changes.
    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(CreativeError::from)
            .and_then(|raw| self.backend.write(key, &raw));
        if let Err(e) = result {
            warn!(key, error = %e, "Failed to persist key, keeping in-memory state");
        }
    }

    /// Write every collection back to the backend.
    pub fn flush_all(&self) {
        self.persist(CREATIVES_KEY, &*self.creatives.read());
        self.persist(HISTORY_KEY, &*self.history.read());
        self.persist(UPLOADED_STATUS_KEY, &*self.uploaded.read());
        self.persist_token(self.meta_token.read().as_deref());
        debug!("Data store flushed");
    }

    // ─── Creatives ─────────────────────────────────────────────────────────

    pub fn creatives(&self) -> Vec<Creative> {
        self.creatives.read().clone()
    }

    pub fn creatives_for_game(&self, game_id: &str) -> Vec<Creative> {
        self.creatives
            .read()
            .iter()
            .filter(|c| c.game_id == game_id)
            .cloned()
            .collect()
    }

    pub fn creative(&self, id: &CreativeId) -> Option<Creative> {
        self.creatives.read().iter().find(|c| &c.id == id).cloned()
    }

    /// Prepend `new` to the catalog, preserving its order. Creatives whose id
    /// is already taken, or that have no dimensions, are skipped. Returns how
    /// many were added.
    pub fn add_creatives(&self, new: Vec<Creative>) -> usize {
        if new.is_empty() {
            return 0;
        }
        let mut creatives = self.creatives.write();
        let mut taken: HashSet<CreativeId> = creatives.iter().map(|c| c.id.clone()).collect();
        let accepted: Vec<Creative> = new
            .into_iter()
            .filter(|c| {
                if c.dimensions.is_empty() {
                    warn!(id = %c.id, "Creative without dimensions skipped");
                    return false;
                }
                if !taken.insert(c.id.clone()) {
                    warn!(id = %c.id, "Creative id already in catalog, skipped");
                    return false;
                }
                true
            })
            .collect();
        let added = accepted.len();
        if added == 0 {
            return 0;
        }
        creatives.splice(0..0, accepted);
        info!(added, total = creatives.len(), "Creatives added");
        self.persist(CREATIVES_KEY, &*creatives);
        added
    }

    /// Remove every creative whose id is in `ids`. Returns how many were removed.
    pub fn delete_creatives(&self, ids: &[CreativeId]) -> usize {
        let mut creatives = self.creatives.write();
        let before = creatives.len();
        creatives.retain(|c| !ids.contains(&c.id));
        let removed = before - creatives.len();
        if removed > 0 {
            info!(removed, "Creatives deleted");
            self.persist(CREATIVES_KEY, &*creatives);
        }
        removed
    }

    /// Apply the set fields of `update`. Returns `Ok(None)` for an unknown
    /// id; an empty dimension list is rejected and leaves the creative as is.
    pub fn update_creative(
        &self,
        id: &CreativeId,
        update: CreativeUpdate,
    ) -> CreativeResult<Option<Creative>> {
        if update.dimensions.as_ref().is_some_and(|d| d.is_empty()) {
            return Err(CreativeError::Validation(format!(
                "Creative {id} must keep at least one dimension"
            )));
        }
        let mut creatives = self.creatives.write();
        let Some(creative) = creatives.iter_mut().find(|c| &c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            creative.name = name;
        }
        if let Some(owner) = update.owner {
            creative.owner = owner;
        }
        if let Some(thumb) = update.thumb {
            creative.thumb = thumb;
        }
        if let Some(dimensions) = update.dimensions {
            creative.dimensions = dimensions;
        }
        if let Some(platforms) = update.platforms {
            creative.platforms = Some(platforms);
        }
        if let Some(hash) = update.meta_image_hash {
            creative.meta_image_hash = Some(hash);
        }
        let updated = creative.clone();
        self.persist(CREATIVES_KEY, &*creatives);
        Ok(Some(updated))
    }

    // ─── History ───────────────────────────────────────────────────────────

    pub fn history(&self) -> Vec<HistoryRecord> {
        self.history.read().clone()
    }

    /// Prepend a record; history is kept newest first.
    pub fn add_history_item(&self, record: HistoryRecord) {
        let mut history = self.history.write();
        info!(
            id = %record.id,
            platform = %record.platform,
            status = %record.status,
            "History record added"
        );
        history.insert(0, record);
        self.persist(HISTORY_KEY, &*history);
    }

    // ─── Upload status ─────────────────────────────────────────────────────

    pub fn uploaded_status(&self) -> UploadStatusMap {
        self.uploaded.read().clone()
    }

    /// Record that `creative_id` was published to `platform`. Returns false
    /// when the pair was already recorded.
    pub fn mark_uploaded(&self, creative_id: &CreativeId, platform: Platform) -> bool {
        let mut uploaded = self.uploaded.write();
        let platforms = uploaded.entry(creative_id.clone()).or_default();
        if platforms.contains(&platform) {
            return false;
        }
        platforms.push(platform);
        self.persist(UPLOADED_STATUS_KEY, &*uploaded);
        true
    }

    pub fn is_uploaded(&self, creative_id: &CreativeId, platform: Platform) -> bool {
        self.uploaded
            .read()
            .get(creative_id)
            .is_some_and(|p| p.contains(&platform))
    }

    // ─── Credential ────────────────────────────────────────────────────────

    pub fn meta_token(&self) -> Option<String> {
        self.meta_token.read().clone()
    }

    /// Store the trimmed token; an empty value disconnects and removes the key.
    pub fn set_meta_token(&self, token: &str) {
        let token = token.trim();
        let value = (!token.is_empty()).then(|| token.to_string());
        let mut current = self.meta_token.write();
        *current = value;
        self.persist_token(current.as_deref());
        info!(connected = current.is_some(), "Meta token updated");
    }

    pub fn clear_meta_token(&self) {
        self.set_meta_token("");
    }

    fn persist_token(&self, token: Option<&str>) {
        match token {
            Some(token) => self.persist(META_TOKEN_KEY, token),
            None => {
                if let Err(e) = self.backend.remove(META_TOKEN_KEY) {
                    warn!(error = %e, "Failed to remove stored token");
                }
            }
        }
    }
}

fn read_key<T: DeserializeOwned>(backend: &dyn KeyValueBackend, key: &str) -> Option<T> {
    match backend.read(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Stored value is unreadable, using default");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read key, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FileBackend;
    use chrono::NaiveDate;
    use creative_core::{CreativeResult, HistoryStatus, MediaKind};
    use uuid::Uuid;

    struct BrokenBackend;

    impl KeyValueBackend for BrokenBackend {
        fn read(&self, key: &str) -> CreativeResult<Option<String>> {
            Err(CreativeError::persistence(key, "storage unavailable"))
        }
        fn write(&self, key: &str, _value: &str) -> CreativeResult<()> {
            Err(CreativeError::persistence(key, "quota exceeded"))
        }
        fn remove(&self, key: &str) -> CreativeResult<()> {
            Err(CreativeError::persistence(key, "storage unavailable"))
        }
    }

    fn record(campaign: &str) -> HistoryRecord {
        HistoryRecord {
            id: Uuid::new_v4(),
            game_id: Some("g1".into()),
            platform: Platform::Meta,
            campaign: campaign.into(),
            status: HistoryStatus::Success,
            date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            creatives: 2,
            network_ids: vec![],
        }
    }

    fn creative(id: &str) -> Creative {
        Creative {
            id: CreativeId::from(id),
            game_id: "g1".into(),
            name: format!("Creative {id}"),
            kind: MediaKind::Image,
            dimensions: vec![Dimension::from("1:1")],
            owner: "Me".into(),
            created_on: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            thumb: String::new(),
            platforms: None,
            fingerprint: None,
            meta_image_hash: None,
        }
    }

    #[test]
    fn empty_backend_starts_from_seed() {
        let store = DataStore::in_memory();
        assert_eq!(store.creatives().len(), 14);
        assert!(store.history().is_empty());
        assert!(store.meta_token().is_none());
    }

    #[test]
    fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let backend: Arc<dyn KeyValueBackend> = Arc::new(FileBackend::new(dir.path()));

        let store = DataStore::load(backend.clone());
        store.add_history_item(record("first"));
        store.add_history_item(record("second"));
        store.mark_uploaded(&CreativeId::from(1), Platform::Meta);
        store.set_meta_token("  EAAB_TEST_token  ");
        store.add_creatives(vec![creative("new")]);
        drop(store);

        let reloaded = DataStore::load(backend);
        let campaigns: Vec<String> = reloaded.history().into_iter().map(|r| r.campaign).collect();
        assert_eq!(campaigns, vec!["second", "first"]);
        assert!(reloaded.is_uploaded(&CreativeId::from(1), Platform::Meta));
        assert_eq!(reloaded.meta_token().as_deref(), Some("EAAB_TEST_token"));
        assert_eq!(reloaded.creatives()[0].id, CreativeId::from("new"));
        assert_eq!(reloaded.creatives().len(), 15);
    }

    #[test]
    fn unreadable_keys_fall_back_to_defaults() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write(HISTORY_KEY, "{not json").unwrap();
        backend.write(CREATIVES_KEY, "42").unwrap();
        let store = DataStore::load(backend);
        assert!(store.history().is_empty());
        assert_eq!(store.creatives().len(), 14);
    }

    #[test]
    fn failing_backend_keeps_store_usable() {
        let store = DataStore::load(Arc::new(BrokenBackend));
        assert_eq!(store.creatives().len(), 14);
        store.add_history_item(record("offline"));
        store.set_meta_token("abc");
        store.flush_all();
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.meta_token().as_deref(), Some("abc"));
    }

    #[test]
    fn empty_token_disconnects() {
        let backend = Arc::new(MemoryBackend::new());
        let store = DataStore::load(backend.clone());
        store.set_meta_token("abc");
        assert!(backend.read(META_TOKEN_KEY).unwrap().is_some());
        store.set_meta_token("   ");
        assert!(store.meta_token().is_none());
        assert!(backend.read(META_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn mark_uploaded_is_idempotent() {
        let store = DataStore::in_memory();
        let id = CreativeId::from(3);
        assert!(store.mark_uploaded(&id, Platform::Tiktok));
        assert!(!store.mark_uploaded(&id, Platform::Tiktok));
        assert!(store.mark_uploaded(&id, Platform::Meta));
        assert_eq!(
            store.uploaded_status().get(&id),
            Some(&vec![Platform::Tiktok, Platform::Meta])
        );
        assert!(!store.is_uploaded(&CreativeId::from(4), Platform::Meta));
    }

    #[test]
    fn delete_and_update_creatives() {
        let store = DataStore::in_memory();
        let removed = store.delete_creatives(&[CreativeId::from(1), CreativeId::from(99)]);
        assert_eq!(removed, 1);
        assert!(store.creative(&CreativeId::from(1)).is_none());

        let updated = store
            .update_creative(
                &CreativeId::from(2),
                CreativeUpdate {
                    name: Some("Level 3 Playable v2".into()),
                    meta_image_hash: Some("h123".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Level 3 Playable v2");
        assert_eq!(updated.meta_image_hash.as_deref(), Some("h123"));
        assert_eq!(updated.owner, "Dev Team");
        assert!(store
            .update_creative(&CreativeId::from(99), CreativeUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_rejects_empty_dimensions() {
        let store = DataStore::in_memory();
        let id = CreativeId::from(1);
        let before = store.creative(&id).unwrap().dimensions;

        let err = store
            .update_creative(
                &id,
                CreativeUpdate {
                    name: Some("Renamed".into()),
                    dimensions: Some(vec![]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CreativeError::Validation(_)));

        let after = store.creative(&id).unwrap();
        assert_eq!(after.dimensions, before);
        assert_eq!(after.name, "Hero Gameplay v1");
    }

    #[test]
    fn add_creatives_keeps_ids_unique() {
        let store = DataStore::in_memory();
        let mut no_dims = creative("bare");
        no_dims.dimensions.clear();

        let added = store.add_creatives(vec![
            creative("1"),
            creative("fresh"),
            creative("fresh"),
            no_dims,
        ]);
        assert_eq!(added, 1);

        let creatives = store.creatives();
        assert_eq!(creatives.len(), 15);
        assert_eq!(creatives[0].id, CreativeId::from("fresh"));
        assert_eq!(creatives.iter().filter(|c| c.id == CreativeId::from(1)).count(), 1);
        assert_eq!(store.creative(&CreativeId::from(1)).unwrap().name, "Hero Gameplay v1");
        assert!(store.creative(&CreativeId::from("bare")).is_none());
    }
}
