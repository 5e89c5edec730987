//! Linear wizard state machine: select creatives → choose platforms →
//! platform setup → review → publish.

use std::collections::HashMap;
use std::fmt;

use creative_core::{CreativeId, Platform};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::selection::{PlatformSelection, SelectionKey, SelectionState};
use crate::setup::{PlatformSetupData, SetupForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum WizardStep {
    SelectCreatives,
    ChoosePlatforms,
    PlatformSetup,
    Review,
    Publish,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::SelectCreatives,
        WizardStep::ChoosePlatforms,
        WizardStep::PlatformSetup,
        WizardStep::Review,
        WizardStep::Publish,
    ];

    pub fn number(&self) -> u8 {
        match self {
            WizardStep::SelectCreatives => 1,
            WizardStep::ChoosePlatforms => 2,
            WizardStep::PlatformSetup => 3,
            WizardStep::Review => 4,
            WizardStep::Publish => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WizardStep::SelectCreatives => "Select Creatives",
            WizardStep::ChoosePlatforms => "Choose Platforms",
            WizardStep::PlatformSetup => "Platform Setup",
            WizardStep::Review => "Review",
            WizardStep::Publish => "Publish",
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        WizardStep::ALL.into_iter().find(|s| s.number() == n)
    }

    fn following(&self) -> Option<Self> {
        WizardStep::from_number(self.number() + 1)
    }

    fn preceding(&self) -> Option<Self> {
        self.number().checked_sub(1).and_then(WizardStep::from_number)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("Step '{0}' is incomplete")]
    StepIncomplete(WizardStep),

    #[error("Already at the first step")]
    NoPreviousStep,

    #[error("Review advances only through the publish action")]
    PublishRequired,

    #[error("Publishing is only possible from the review step (currently at '{0}')")]
    NotAtReview(WizardStep),

    #[error("Wizard session has finished")]
    Finished,
}

/// Snapshot handed to the publisher when the user publishes.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    /// Stamped once per publish action; the publisher processes a batch id
    /// at most once.
    pub batch_id: Uuid,
    pub game_id: String,
    pub selection: Vec<SelectionKey>,
    pub platforms: Vec<Platform>,
    pub setup: HashMap<Platform, PlatformSetupData>,
    pub campaign_labels: HashMap<Platform, String>,
}

impl PublishRequest {
    pub fn distinct_creative_ids(&self) -> Vec<CreativeId> {
        let mut ids: Vec<CreativeId> = self.selection.iter().map(|k| k.creative_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// One wizard session for one game.
#[derive(Debug, Clone)]
pub struct CreateAdsWizard {
    game_id: String,
    step: WizardStep,
    selection: SelectionState,
    platforms: PlatformSelection,
    setup: SetupForm,
}

impl CreateAdsWizard {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self::resume(game_id, WizardStep::SelectCreatives, SelectionState::new())
    }

    /// Start at a later step with a pre-filled selection, as when a bulk
    /// action in the creative list opens the wizard.
    pub fn resume(game_id: impl Into<String>, step: WizardStep, selection: SelectionState) -> Self {
        Self {
            game_id: game_id.into(),
            step,
            selection,
            platforms: PlatformSelection::new(),
            setup: SetupForm::new(),
        }
    }

    pub fn with_setup_form(mut self, setup: SetupForm) -> Self {
        self.setup = setup;
        self
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn platforms(&self) -> &PlatformSelection {
        &self.platforms
    }

    pub fn platforms_mut(&mut self) -> &mut PlatformSelection {
        &mut self.platforms
    }

    pub fn setup(&self) -> &SetupForm {
        &self.setup
    }

    pub fn setup_mut(&mut self) -> &mut SetupForm {
        &mut self.setup
    }

    /// Whether the current step's completion predicate holds.
    pub fn can_advance(&self) -> bool {
        match self.step {
            WizardStep::SelectCreatives => !self.selection.is_empty(),
            WizardStep::ChoosePlatforms => !self.platforms.is_empty(),
            WizardStep::PlatformSetup => self.setup.is_valid(&self.platforms),
            WizardStep::Review | WizardStep::Publish => false,
        }
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        match self.step {
            WizardStep::Publish => return Err(WizardError::Finished),
            WizardStep::Review => return Err(WizardError::PublishRequired),
            _ => {}
        }
        if !self.can_advance() {
            return Err(WizardError::StepIncomplete(self.step));
        }
        self.step = self.step.following().ok_or(WizardError::Finished)?;
        info!(step = %self.step, "Wizard advanced");
        Ok(self.step)
    }

    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Publish {
            return Err(WizardError::Finished);
        }
        self.step = self.step.preceding().ok_or(WizardError::NoPreviousStep)?;
        Ok(self.step)
    }

    /// Move from review to the terminal publish step and hand back what
    /// should be published.
    pub fn publish(&mut self) -> Result<PublishRequest, WizardError> {
        match self.step {
            WizardStep::Review => {}
            WizardStep::Publish => return Err(WizardError::Finished),
            other => return Err(WizardError::NotAtReview(other)),
        }
        self.step = WizardStep::Publish;

        let campaign_labels = self
            .platforms
            .iter()
            .filter_map(|p| self.setup.campaign_label(p).map(|label| (p, label)))
            .collect();
        let setup = self
            .platforms
            .iter()
            .filter_map(|p| self.setup.data(p).map(|d| (p, d.clone())))
            .collect();

        info!(
            game_id = %self.game_id,
            creatives = self.selection.distinct_creative_count(),
            versions = self.selection.total_version_count(),
            platforms = self.platforms.len(),
            "Wizard publish requested"
        );

        Ok(PublishRequest {
            batch_id: Uuid::new_v4(),
            game_id: self.game_id.clone(),
            selection: self.selection.keys().cloned().collect(),
            platforms: self.platforms.as_slice().to_vec(),
            setup,
            campaign_labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::CampaignChoice;
    use creative_core::Dimension;

    fn ready_for_setup() -> CreateAdsWizard {
        let mut wizard = CreateAdsWizard::new("g1");
        wizard
            .selection_mut()
            .toggle_dimension(&CreativeId::from(1), &Dimension::from("9:16"));
        wizard.next().unwrap();
        wizard.platforms_mut().toggle(Platform::Meta);
        wizard.next().unwrap();
        wizard
    }

    fn complete_setup(wizard: &mut CreateAdsWizard) {
        let setup = wizard.setup_mut();
        setup.set_campaign(Platform::Meta, CampaignChoice::Existing("c1".into()));
        setup.select_existing_ad_set(Platform::Meta, "as1");
    }

    #[test]
    fn step_one_blocks_until_something_is_selected() {
        let mut wizard = CreateAdsWizard::new("g1");
        assert_eq!(
            wizard.next(),
            Err(WizardError::StepIncomplete(WizardStep::SelectCreatives))
        );
        assert_eq!(wizard.back(), Err(WizardError::NoPreviousStep));
    }

    #[test]
    fn step_two_blocks_without_platforms() {
        let mut wizard = CreateAdsWizard::new("g1");
        wizard
            .selection_mut()
            .toggle_dimension(&CreativeId::from(1), &Dimension::from("9:16"));
        assert_eq!(wizard.next(), Ok(WizardStep::ChoosePlatforms));
        assert_eq!(
            wizard.next(),
            Err(WizardError::StepIncomplete(WizardStep::ChoosePlatforms))
        );
    }

    #[test]
    fn setup_step_requires_valid_forms() {
        let mut wizard = ready_for_setup();
        assert_eq!(wizard.step(), WizardStep::PlatformSetup);
        assert!(wizard.next().is_err());

        complete_setup(&mut wizard);
        assert_eq!(wizard.next(), Ok(WizardStep::Review));
    }

    #[test]
    fn review_only_advances_by_publishing() {
        let mut wizard = ready_for_setup();
        complete_setup(&mut wizard);
        wizard.next().unwrap();

        assert_eq!(wizard.next(), Err(WizardError::PublishRequired));
        let request = wizard.publish().unwrap();
        assert_eq!(wizard.step(), WizardStep::Publish);
        assert_eq!(request.platforms, vec![Platform::Meta]);
        assert_eq!(request.selection.len(), 1);
        assert_eq!(
            request.campaign_labels.get(&Platform::Meta).map(String::as_str),
            Some("User Acquisition Q4")
        );
    }

    #[test]
    fn publish_step_is_terminal() {
        let mut wizard = ready_for_setup();
        complete_setup(&mut wizard);
        wizard.next().unwrap();
        wizard.publish().unwrap();

        assert_eq!(wizard.next(), Err(WizardError::Finished));
        assert_eq!(wizard.back(), Err(WizardError::Finished));
        assert!(matches!(wizard.publish(), Err(WizardError::Finished)));
    }

    #[test]
    fn back_is_always_allowed_between_two_and_four() {
        let mut wizard = ready_for_setup();
        complete_setup(&mut wizard);
        wizard.next().unwrap();
        assert_eq!(wizard.back(), Ok(WizardStep::PlatformSetup));
        assert_eq!(wizard.back(), Ok(WizardStep::ChoosePlatforms));
        wizard.platforms_mut().toggle(Platform::Meta);
        assert_eq!(wizard.back(), Ok(WizardStep::SelectCreatives));
    }

    #[test]
    fn publish_outside_review_is_rejected() {
        let mut wizard = ready_for_setup();
        assert!(matches!(
            wizard.publish(),
            Err(WizardError::NotAtReview(WizardStep::PlatformSetup))
        ));
    }

    #[test]
    fn resumed_wizard_starts_with_selection() {
        let selection: SelectionState = ["4-1:1".parse().unwrap(), "4-4:5".parse().unwrap()]
            .into_iter()
            .collect();
        let mut wizard =
            CreateAdsWizard::resume("g2", WizardStep::ChoosePlatforms, selection);
        assert_eq!(wizard.selection().total_version_count(), 2);
        assert_eq!(wizard.back(), Ok(WizardStep::SelectCreatives));
    }

    #[test]
    fn request_counts_distinct_creatives() {
        let mut wizard = CreateAdsWizard::new("g1");
        for key in ["1-9:16", "1-1:1", "3-9:16"] {
            let key: SelectionKey = key.parse().unwrap();
            wizard
                .selection_mut()
                .toggle_dimension(&key.creative_id, &key.dimension);
        }
        wizard.next().unwrap();
        wizard.platforms_mut().toggle(Platform::Meta);
        wizard.next().unwrap();
        complete_setup(&mut wizard);
        wizard.next().unwrap();
        let request = wizard.publish().unwrap();
        assert_eq!(
            request.distinct_creative_ids(),
            vec![CreativeId::from(1), CreativeId::from(3)]
        );
    }
}
