//! Step 4: the ads that will be created, one group per creative and
//! platform.

use creative_core::compatibility::is_compatible;
use creative_core::{Creative, CreativeId, Dimension, Platform};
use serde::Serialize;

use crate::selection::{PlatformSelection, SelectionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdGroup {
    /// `"<creativeId>-<platform>"`
    pub id: String,
    pub creative_id: CreativeId,
    pub creative_name: String,
    pub platform: Platform,
    pub dimensions: Vec<Dimension>,
    /// At least one selected dimension is accepted by the platform.
    pub compatible: bool,
}

/// Group selected versions per (creative, platform). Keys referring to
/// creatives missing from the catalog are skipped.
pub fn build_ad_groups(
    selection: &SelectionState,
    platforms: &PlatformSelection,
    catalog: &[Creative],
) -> Vec<AdGroup> {
    let mut groups = Vec::new();
    for (creative_id, dimensions) in selection.dimensions_by_creative() {
        let Some(creative) = catalog.iter().find(|c| c.id == creative_id) else {
            continue;
        };
        for platform in platforms.iter() {
            let compatible = dimensions
                .iter()
                .any(|d| is_compatible(d.as_str(), platform));
            groups.push(AdGroup {
                id: format!("{creative_id}-{platform}"),
                creative_id: creative_id.clone(),
                creative_name: creative.name.clone(),
                platform,
                dimensions: dimensions.clone(),
                compatible,
            });
        }
    }
    groups
}

/// Review list the user can prune before publishing.
#[derive(Debug, Clone, Default)]
pub struct ReviewList {
    groups: Vec<AdGroup>,
}

impl ReviewList {
    pub fn new(groups: Vec<AdGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[AdGroup] {
        &self.groups
    }

    pub fn remove(&mut self, group_id: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        self.groups.len() != before
    }

    /// Total number of ads (one per dimension per group).
    pub fn total_ads(&self) -> usize {
        self.groups.iter().map(|g| g.dimensions.len()).sum()
    }

    pub fn incompatible(&self) -> impl Iterator<Item = &AdGroup> {
        self.groups.iter().filter(|g| !g.compatible)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
