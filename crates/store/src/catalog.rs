//! Filters over the creative catalog.

use std::collections::BTreeSet;

use creative_core::{Creative, MediaKind, Platform};

/// Catalog page filter: game, free-text search, kind set and platform set.
#[derive(Debug, Clone)]
pub struct CreativeFilter {
    pub game_id: Option<String>,
    pub search: String,
    pub kinds: BTreeSet<MediaKind>,
    pub platforms: BTreeSet<Platform>,
}

impl Default for CreativeFilter {
    fn default() -> Self {
        Self {
            game_id: None,
            search: String::new(),
            kinds: MediaKind::ALL.into_iter().collect(),
            platforms: Platform::ALL.into_iter().collect(),
        }
    }
}

impl CreativeFilter {
    pub fn for_game(game_id: impl Into<String>) -> Self {
        Self {
            game_id: Some(game_id.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, creative: &Creative) -> bool {
        if let Some(game_id) = &self.game_id {
            if &creative.game_id != game_id {
                return false;
            }
        }
        let needle = self.search.to_lowercase();
        let matches_search = creative.name.to_lowercase().contains(&needle)
            || creative.owner.to_lowercase().contains(&needle);
        if !matches_search || !self.kinds.contains(&creative.kind) {
            return false;
        }
        let platforms = creative.effective_platforms();
        // Creatives without any known platform are never hidden by the
        // platform filter.
        platforms.is_empty() || platforms.iter().any(|p| self.platforms.contains(p))
    }

    pub fn apply(&self, creatives: &[Creative]) -> Vec<Creative> {
        creatives.iter().filter(|c| self.matches(c)).cloned().collect()
    }
}

/// Wizard step-1 filter: name search plus an optional single kind.
#[derive(Debug, Clone, Default)]
pub struct StepOneFilter {
    pub search: String,
    pub kind: Option<MediaKind>,
}

impl StepOneFilter {
    pub fn matches(&self, creative: &Creative) -> bool {
        creative
            .name
            .to_lowercase()
            .contains(&self.search.to_lowercase())
            && self.kind.map_or(true, |k| creative.kind == k)
    }

    pub fn apply<'a>(&self, creatives: &'a [Creative]) -> Vec<&'a Creative> {
        creatives.iter().filter(|c| self.matches(c)).collect()
    }
}
