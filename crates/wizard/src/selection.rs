//! Step 1 and step 2 state: which creative versions and which ad networks
//! are part of the publish.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use creative_core::compatibility::is_compatible;
use creative_core::{Creative, CreativeId, Dimension, Platform};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Selection keys ─────────────────────────────────────────────────────────

/// One chosen deliverable version: a creative in one dimension.
///
/// Serialized as `"<creativeId>-<dimension>"`. Dimension labels never
/// contain `-`, so parsing splits on the last one and ids may contain dashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SelectionKey {
    pub creative_id: CreativeId,
    pub dimension: Dimension,
}

impl SelectionKey {
    pub fn new(creative_id: CreativeId, dimension: Dimension) -> Self {
        Self {
            creative_id,
            dimension,
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.creative_id, self.dimension)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selection key '{0}', expected <creativeId>-<dimension>")]
pub struct ParseSelectionKeyError(pub String);

impl FromStr for SelectionKey {
    type Err = ParseSelectionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('-') {
            Some((id, dim)) if !id.is_empty() && !dim.is_empty() => {
                Ok(SelectionKey::new(CreativeId::from(id), Dimension::from(dim)))
            }
            _ => Err(ParseSelectionKeyError(s.to_string())),
        }
    }
}

impl TryFrom<String> for SelectionKey {
    type Error = ParseSelectionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectionKey> for String {
    fn from(key: SelectionKey) -> Self {
        key.to_string()
    }
}

// ─── Version selection (step 1) ─────────────────────────────────────────────

/// How much of a creative's dimension set is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    keys: BTreeSet<SelectionKey>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, creative_id: &CreativeId, dimension: &Dimension) -> bool {
        self.keys
            .contains(&SelectionKey::new(creative_id.clone(), dimension.clone()))
    }

    /// Flip one version in or out. Returns whether it is now selected.
    pub fn toggle_dimension(&mut self, creative_id: &CreativeId, dimension: &Dimension) -> bool {
        let key = SelectionKey::new(creative_id.clone(), dimension.clone());
        if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        }
    }

    /// Select-all-or-none: a fully selected creative is cleared, anything
    /// else (including a partial selection) becomes fully selected.
    pub fn toggle_all_dimensions(&mut self, creative: &Creative) {
        if self.coverage(creative) == Coverage::Full {
            for dim in &creative.dimensions {
                self.keys
                    .remove(&SelectionKey::new(creative.id.clone(), dim.clone()));
            }
        } else {
            for dim in &creative.dimensions {
                self.keys
                    .insert(SelectionKey::new(creative.id.clone(), dim.clone()));
            }
        }
    }

    pub fn coverage(&self, creative: &Creative) -> Coverage {
        let selected = creative
            .dimensions
            .iter()
            .filter(|d| self.contains(&creative.id, d))
            .count();
        match selected {
            0 => Coverage::None,
            n if n == creative.dimensions.len() => Coverage::Full,
            _ => Coverage::Partial,
        }
    }

    /// Number of unique creatives referenced by the selection.
    pub fn distinct_creative_count(&self) -> usize {
        self.selected_creative_ids().len()
    }

    /// Number of selected versions.
    pub fn total_version_count(&self) -> usize {
        self.keys.len()
    }

    pub fn selected_creative_ids(&self) -> Vec<CreativeId> {
        let ids: BTreeSet<&CreativeId> = self.keys.iter().map(|k| &k.creative_id).collect();
        ids.into_iter().cloned().collect()
    }

    /// Selected dimensions grouped by creative.
    pub fn dimensions_by_creative(&self) -> BTreeMap<CreativeId, Vec<Dimension>> {
        let mut grouped: BTreeMap<CreativeId, Vec<Dimension>> = BTreeMap::new();
        for key in &self.keys {
            grouped
                .entry(key.creative_id.clone())
                .or_default()
                .push(key.dimension.clone());
        }
        grouped
    }

    pub fn keys(&self) -> impl Iterator<Item = &SelectionKey> {
        self.keys.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<SelectionKey> for SelectionState {
    fn from_iter<I: IntoIterator<Item = SelectionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

// ─── Platform selection (step 2) ────────────────────────────────────────────

/// Chosen ad networks, kept in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSelection {
    platforms: Vec<Platform>,
}

impl PlatformSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the platform is selected after the call.
    pub fn toggle(&mut self, platform: Platform) -> bool {
        if self.remove(platform) {
            false
        } else {
            self.platforms.push(platform);
            true
        }
    }

    pub fn insert(&mut self, platform: Platform) -> bool {
        if self.contains(platform) {
            return false;
        }
        self.platforms.push(platform);
        true
    }

    pub fn remove(&mut self, platform: Platform) -> bool {
        let before = self.platforms.len();
        self.platforms.retain(|p| *p != platform);
        self.platforms.len() != before
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    pub fn iter(&self) -> impl Iterator<Item = Platform> + '_ {
        self.platforms.iter().copied()
    }

    pub fn as_slice(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl FromIterator<Platform> for PlatformSelection {
    fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
        let mut selection = PlatformSelection::new();
        for platform in iter {
            selection.insert(platform);
        }
        selection
    }
}

// ─── Compatibility issues ───────────────────────────────────────────────────

/// A selected platform that cannot serve some of the selected creatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityIssue {
    pub platform: Platform,
    pub affected_count: usize,
}

impl CompatibilityIssue {
    pub fn message(&self) -> String {
        format!(
            "{} creative(s) have no format supported by {}",
            self.affected_count,
            self.platform.display_name()
        )
    }
}

/// For each selected platform, count the selected creatives that have no
/// dimension it accepts.
///
/// A creative is judged on its full catalog dimension set, so one
/// compatible variant is enough. Creatives missing from `catalog` are judged
/// on their selected dimensions.
pub fn incompatible_platforms(
    selection: &SelectionState,
    platforms: &PlatformSelection,
    catalog: &[Creative],
) -> Vec<CompatibilityIssue> {
    let selected = selection.dimensions_by_creative();
    let dimension_sets: Vec<&[Dimension]> = selected
        .iter()
        .map(|(id, selected_dims)| {
            catalog
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.dimensions.as_slice())
                .unwrap_or(selected_dims.as_slice())
        })
        .collect();

    platforms
        .iter()
        .filter_map(|platform| {
            let affected_count = dimension_sets
                .iter()
                .filter(|dims| !dims.iter().any(|d| is_compatible(d.as_str(), platform)))
                .count();
            (affected_count > 0).then_some(CompatibilityIssue {
                platform,
                affected_count,
            })
        })
        .collect()
}
