//! Dimension ↔ ad-network compatibility rules.
//!
//! Two tables live here: the acceptance table used when validating a
//! selection against the chosen platforms, and the standard-ratio table used
//! to snap raw pixel sizes to a dimension tag at ingest time.

use std::collections::BTreeSet;

use crate::types::{Dimension, Platform};

use Platform::{Applovin, Google, Meta, Tiktok, Unity};

/// Platforms that accept a given dimension tag. Unknown tags accept nothing.
pub fn platforms_for(dimension: &str) -> &'static [Platform] {
    match dimension {
        "9:16" => &[Meta, Tiktok, Unity, Applovin, Google],
        "1:1" => &[Meta, Google, Applovin, Unity],
        "4:5" => &[Meta, Google],
        "16:9" => &[Meta, Google, Unity, Applovin],
        "HTML5" => &[Applovin, Unity],
        _ => &[],
    }
}

/// Union of accepting platforms over every dimension.
pub fn compatible_platforms<I>(dimensions: I) -> BTreeSet<Platform>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    dimensions
        .into_iter()
        .flat_map(|d| platforms_for(d.as_ref()).iter().copied())
        .collect()
}

pub fn is_compatible(dimension: &str, platform: Platform) -> bool {
    platforms_for(dimension).contains(&platform)
}

/// String form of [`is_compatible`]; the platform id is matched
/// case-insensitively and unknown ids are never compatible.
pub fn is_compatible_id(dimension: &str, platform_id: &str) -> bool {
    platform_id
        .parse::<Platform>()
        .map(|p| is_compatible(dimension, p))
        .unwrap_or(false)
}

// ─── Standard ratios ────────────────────────────────────────────────────────

/// Relative tolerance when snapping a measured ratio to a standard one.
pub const RATIO_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct StandardRatio {
    pub label: &'static str,
    pub value: f64,
    pub suggested: &'static [Platform],
}

pub const STANDARD_RATIOS: [StandardRatio; 7] = [
    StandardRatio { label: "9:16", value: 9.0 / 16.0, suggested: &[Meta, Tiktok, Google] },
    StandardRatio { label: "1:1", value: 1.0, suggested: &[Meta, Tiktok, Google] },
    StandardRatio { label: "4:5", value: 4.0 / 5.0, suggested: &[Meta, Google] },
    StandardRatio { label: "16:9", value: 16.0 / 9.0, suggested: &[Google, Meta, Tiktok] },
    StandardRatio { label: "3:4", value: 3.0 / 4.0, suggested: &[Meta, Tiktok] },
    StandardRatio { label: "2:3", value: 2.0 / 3.0, suggested: &[Meta] },
    StandardRatio { label: "1.91:1", value: 1.91, suggested: &[Meta, Google] },
];

/// First standard ratio within [`RATIO_TOLERANCE`] of `width / height`.
pub fn nearest_standard_ratio(width: u32, height: u32) -> Option<&'static StandardRatio> {
    if height == 0 {
        return None;
    }
    let ratio = f64::from(width) / f64::from(height);
    STANDARD_RATIOS
        .iter()
        .find(|r| (ratio - r.value).abs() / r.value < RATIO_TOLERANCE)
}

/// Dimension tag for a pixel size: the snapped standard label, or `w:h`.
pub fn snap_ratio(width: u32, height: u32) -> Dimension {
    match nearest_standard_ratio(width, height) {
        Some(r) => Dimension::new(r.label),
        None => Dimension::new(format!("{width}:{height}")),
    }
}

pub fn suggested_platforms(width: u32, height: u32) -> Vec<Platform> {
    nearest_standard_ratio(width, height)
        .map(|r| r.suggested.to_vec())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(platforms: &[Platform]) -> BTreeSet<Platform> {
        platforms.iter().copied().collect()
    }

    #[test]
    fn table_entries_are_reproduced() {
        assert_eq!(compatible_platforms(["9:16"]), set(&Platform::ALL));
        assert_eq!(compatible_platforms(["1:1"]), set(&[Meta, Google, Applovin, Unity]));
        assert_eq!(compatible_platforms(["4:5"]), set(&[Meta, Google]));
        assert_eq!(compatible_platforms(["16:9"]), set(&[Meta, Google, Unity, Applovin]));
        assert_eq!(compatible_platforms(["HTML5"]), set(&[Applovin, Unity]));
    }

    #[test]
    fn union_ignores_unknown_tags() {
        let platforms = compatible_platforms(["4:5", "HTML5", "Unknown", "3:4"]);
        assert_eq!(platforms, set(&[Meta, Google, Applovin, Unity]));
        assert!(compatible_platforms(["Unknown"]).is_empty());
        assert!(compatible_platforms(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn union_is_order_independent() {
        let a = compatible_platforms(["1:1", "4:5"]);
        let b = compatible_platforms(["4:5", "1:1", "4:5"]);
        assert_eq!(a, b);
    }

    #[test]
    fn pairwise_check_is_case_insensitive_on_platform() {
        assert!(is_compatible_id("9:16", "TikTok"));
        assert!(is_compatible_id("9:16", "META"));
        assert!(!is_compatible_id("1:1", "tiktok"));
        assert!(!is_compatible_id("9:16", "snapchat"));
        assert!(!is_compatible("html5", Unity));
    }

    #[test]
    fn snapping_uses_five_percent_tolerance() {
        assert_eq!(snap_ratio(1080, 1920).as_str(), "9:16");
        assert_eq!(snap_ratio(1000, 1010).as_str(), "1:1");
        assert_eq!(snap_ratio(1200, 628).as_str(), "1.91:1");
        assert_eq!(snap_ratio(500, 100).as_str(), "500:100");
        assert_eq!(snap_ratio(10, 0).as_str(), "10:0");
    }

    #[test]
    fn suggestions_follow_standard_ratio_table() {
        assert_eq!(suggested_platforms(1920, 1080), vec![Google, Meta, Tiktok]);
        assert_eq!(suggested_platforms(800, 1200), vec![Meta]);
        assert!(suggested_platforms(500, 100).is_empty());
    }
}
