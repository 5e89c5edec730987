//! Step 3: per-platform campaign, ad set and naming configuration.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use creative_core::{AdObject, Platform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::selection::PlatformSelection;

/// Placeholder left in the naming template until a campaign is known.
pub const CAMPAIGN_PLACEHOLDER: &str = "{Campaign}";
pub const DATE_PLACEHOLDER: &str = "{Date}";
pub const CREATIVE_PLACEHOLDER: &str = "{Creative}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMode {
    #[default]
    Existing,
    New,
}

/// Campaign pick made in the setup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignChoice {
    Existing(String),
    New(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSetupData {
    pub campaign_mode: EntryMode,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_set_mode: EntryMode,
    pub ad_set_id: Option<String>,
    pub ad_set_name: Option<String>,
    pub naming: String,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl PlatformSetupData {
    pub fn has_campaign(&self) -> bool {
        match self.campaign_mode {
            EntryMode::Existing => present(&self.campaign_id),
            EntryMode::New => present(&self.campaign_name),
        }
    }

    pub fn has_ad_set(&self) -> bool {
        match self.ad_set_mode {
            EntryMode::Existing => present(&self.ad_set_id),
            EntryMode::New => present(&self.ad_set_name),
        }
    }

    pub fn has_naming(&self) -> bool {
        !self.naming.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.has_campaign() && self.has_ad_set() && self.has_naming()
    }

    /// Names of the fields still blocking this platform.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.has_campaign() {
            missing.push("campaign");
        }
        if !self.has_ad_set() {
            missing.push("ad set");
        }
        if !self.has_naming() {
            missing.push("naming convention");
        }
        missing
    }
}

/// Vacuously true with no platforms; otherwise every selected platform must
/// have complete setup data.
pub fn is_setup_valid(
    platforms: &PlatformSelection,
    form: &HashMap<Platform, PlatformSetupData>,
) -> bool {
    platforms
        .iter()
        .all(|p| form.get(&p).is_some_and(PlatformSetupData::is_complete))
}

/// `"{label}_{YYYY-MM-DD}_{Creative}"`, keeping the campaign placeholder
/// when the label is unknown.
pub fn auto_name(campaign_label: &str, date: NaiveDate) -> String {
    let label = if campaign_label.is_empty() {
        CAMPAIGN_PLACEHOLDER
    } else {
        campaign_label
    };
    format!("{label}_{}_{CREATIVE_PLACEHOLDER}", date.format("%Y-%m-%d"))
}

/// Expand the naming placeholders for one ad.
pub fn render_ad_name(template: &str, campaign: &str, date: NaiveDate, creative: &str) -> String {
    template
        .replace(CAMPAIGN_PLACEHOLDER, campaign)
        .replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string())
        .replace(CREATIVE_PLACEHOLDER, creative)
}

fn default_campaigns() -> Vec<AdObject> {
    vec![
        AdObject::new("c1", "User Acquisition Q4"),
        AdObject::new("c2", "Retargeting Nov"),
    ]
}

fn default_ad_sets() -> Vec<AdObject> {
    vec![
        AdObject::new("as1", "US_Males_18-34_Int"),
        AdObject::new("as2", "WW_Broad_Android"),
        AdObject::new("as3", "T1_iOS_HighLTV"),
    ]
}

/// Setup data for every platform plus the campaign/ad-set catalogs the
/// existing-entry pickers offer.
#[derive(Debug, Clone)]
pub struct SetupForm {
    entries: HashMap<Platform, PlatformSetupData>,
    campaigns: Vec<AdObject>,
    ad_sets: Vec<AdObject>,
}

impl Default for SetupForm {
    fn default() -> Self {
        Self::with_catalog(default_campaigns(), default_ad_sets())
    }
}

impl SetupForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(campaigns: Vec<AdObject>, ad_sets: Vec<AdObject>) -> Self {
        Self {
            entries: HashMap::new(),
            campaigns,
            ad_sets,
        }
    }

    pub fn campaigns(&self) -> &[AdObject] {
        &self.campaigns
    }

    pub fn ad_sets(&self) -> &[AdObject] {
        &self.ad_sets
    }

    pub fn data(&self, platform: Platform) -> Option<&PlatformSetupData> {
        self.entries.get(&platform)
    }

    pub fn entries(&self) -> &HashMap<Platform, PlatformSetupData> {
        &self.entries
    }

    fn entry(&mut self, platform: Platform) -> &mut PlatformSetupData {
        self.entries.entry(platform).or_default()
    }

    pub fn set_campaign_mode(&mut self, platform: Platform, mode: EntryMode) {
        self.entry(platform).campaign_mode = mode;
    }

    pub fn set_ad_set_mode(&mut self, platform: Platform, mode: EntryMode) {
        self.entry(platform).ad_set_mode = mode;
    }

    pub fn set_campaign(&mut self, platform: Platform, choice: CampaignChoice) {
        self.set_campaign_on(platform, choice, Local::now().date_naive());
    }

    /// Record the campaign pick and refresh the naming template unless the
    /// user has already customized it.
    pub fn set_campaign_on(&mut self, platform: Platform, choice: CampaignChoice, date: NaiveDate) {
        let label = match &choice {
            CampaignChoice::Existing(id) => self
                .campaigns
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            CampaignChoice::New(name) => name.clone(),
        };

        let entry = self.entry(platform);
        match choice {
            CampaignChoice::Existing(id) => {
                entry.campaign_mode = EntryMode::Existing;
                entry.campaign_id = Some(id);
            }
            CampaignChoice::New(name) => {
                entry.campaign_mode = EntryMode::New;
                entry.campaign_name = Some(name);
            }
        }

        if entry.naming.is_empty() || entry.naming.contains(CAMPAIGN_PLACEHOLDER) {
            entry.naming = auto_name(&label, date);
            debug!(platform = %platform, naming = %entry.naming, "Naming template auto-filled");
        }
    }

    pub fn select_existing_ad_set(&mut self, platform: Platform, id: impl Into<String>) {
        let entry = self.entry(platform);
        entry.ad_set_mode = EntryMode::Existing;
        entry.ad_set_id = Some(id.into());
    }

    pub fn set_new_ad_set_name(&mut self, platform: Platform, name: impl Into<String>) {
        let entry = self.entry(platform);
        entry.ad_set_mode = EntryMode::New;
        entry.ad_set_name = Some(name.into());
    }

    pub fn set_naming(&mut self, platform: Platform, template: impl Into<String>) {
        self.entry(platform).naming = template.into();
    }

    /// Display label of the platform's campaign, if one is set.
    pub fn campaign_label(&self, platform: Platform) -> Option<String> {
        let data = self.entries.get(&platform)?;
        match data.campaign_mode {
            EntryMode::New => data.campaign_name.clone().filter(|n| !n.is_empty()),
            EntryMode::Existing => {
                let id = data.campaign_id.as_deref()?;
                self.campaigns
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.clone())
            }
        }
    }

    pub fn is_valid(&self, platforms: &PlatformSelection) -> bool {
        is_setup_valid(platforms, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    fn platforms(list: &[Platform]) -> PlatformSelection {
        list.iter().copied().collect()
    }

    #[test]
    fn empty_platform_selection_is_vacuously_valid() {
        assert!(SetupForm::new().is_valid(&PlatformSelection::new()));
    }

    #[test]
    fn single_platform_requires_all_three_fields() {
        let selected = platforms(&[Platform::Meta]);
        let mut form = SetupForm::new();
        assert!(!form.is_valid(&selected));

        form.set_campaign_on(Platform::Meta, CampaignChoice::Existing("c1".into()), date());
        form.set_naming(Platform::Meta, "");
        assert!(!form.is_valid(&selected));

        form.select_existing_ad_set(Platform::Meta, "as2");
        assert!(!form.is_valid(&selected));

        form.set_naming(Platform::Meta, "{Campaign}_{Creative}");
        assert!(form.is_valid(&selected));
    }

    #[test]
    fn every_selected_platform_must_be_complete() {
        let selected = platforms(&[Platform::Meta, Platform::Tiktok]);
        let mut form = SetupForm::new();
        form.set_campaign_on(Platform::Meta, CampaignChoice::New("Launch".into()), date());
        form.set_new_ad_set_name(Platform::Meta, "Broad");
        assert!(!form.is_valid(&selected));

        form.set_campaign_on(Platform::Tiktok, CampaignChoice::Existing("c2".into()), date());
        form.select_existing_ad_set(Platform::Tiktok, "as1");
        assert!(form.is_valid(&selected));
    }

    #[test]
    fn mode_decides_which_field_counts() {
        let mut data = PlatformSetupData {
            campaign_id: Some("c1".into()),
            ad_set_id: Some("as1".into()),
            naming: "x".into(),
            ..Default::default()
        };
        assert!(data.is_complete());

        data.campaign_mode = EntryMode::New;
        assert!(!data.has_campaign());
        data.campaign_name = Some(String::new());
        assert!(!data.has_campaign());
        data.campaign_name = Some("Fresh".into());
        assert!(data.has_campaign());

        data.ad_set_mode = EntryMode::New;
        assert_eq!(data.missing_fields(), vec!["ad set"]);
    }

    #[test]
    fn auto_naming_fills_empty_template() {
        let mut form = SetupForm::new();
        form.set_campaign_on(Platform::Meta, CampaignChoice::Existing("c1".into()), date());
        assert_eq!(
            form.data(Platform::Meta).unwrap().naming,
            "User Acquisition Q4_2026-03-09_{Creative}"
        );
    }

    #[test]
    fn auto_naming_keeps_placeholder_for_unknown_campaign_and_replaces_it_later() {
        let mut form = SetupForm::new();
        form.set_campaign_on(Platform::Unity, CampaignChoice::Existing("missing".into()), date());
        assert_eq!(
            form.data(Platform::Unity).unwrap().naming,
            "{Campaign}_2026-03-09_{Creative}"
        );

        form.set_campaign_on(Platform::Unity, CampaignChoice::New("Winter Push".into()), date());
        assert_eq!(
            form.data(Platform::Unity).unwrap().naming,
            "Winter Push_2026-03-09_{Creative}"
        );
    }

    #[test]
    fn auto_naming_never_overwrites_custom_template() {
        let mut form = SetupForm::new();
        form.set_naming(Platform::Google, "UA_{Creative}_v2");
        form.set_campaign_on(Platform::Google, CampaignChoice::Existing("c2".into()), date());
        assert_eq!(form.data(Platform::Google).unwrap().naming, "UA_{Creative}_v2");

        form.set_campaign_on(Platform::Google, CampaignChoice::New("Other".into()), date());
        assert_eq!(form.data(Platform::Google).unwrap().naming, "UA_{Creative}_v2");
    }

    #[test]
    fn campaign_label_resolves_catalog_names() {
        let mut form = SetupForm::with_catalog(vec![AdObject::new("6923708839550", "Sandbox")], vec![]);
        assert_eq!(form.campaign_label(Platform::Meta), None);
        form.set_campaign_on(
            Platform::Meta,
            CampaignChoice::Existing("6923708839550".into()),
            date(),
        );
        assert_eq!(form.campaign_label(Platform::Meta).as_deref(), Some("Sandbox"));
    }

    #[test]
    fn render_expands_every_placeholder() {
        let name = render_ad_name("{Campaign}_{Date}_{Creative}", "UA", date(), "Hero");
        assert_eq!(name, "UA_2026-03-09_Hero");
        assert_eq!(render_ad_name("static", "UA", date(), "Hero"), "static");
    }
}
