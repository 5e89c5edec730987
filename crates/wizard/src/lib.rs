//! Create-ads wizard — selection of creative versions, platform choice,
//! per-platform setup validation and the review step, driven by a linear
//! five-step state machine.

pub mod flow;
pub mod review;
pub mod selection;
pub mod setup;

pub use flow::{CreateAdsWizard, PublishRequest, WizardError, WizardStep};
pub use review::{build_ad_groups, AdGroup, ReviewList};
pub use selection::{
    incompatible_platforms, CompatibilityIssue, Coverage, PlatformSelection, SelectionKey,
    SelectionState,
};
pub use setup::{is_setup_valid, render_ad_name, CampaignChoice, EntryMode, PlatformSetupData, SetupForm};
