//! Overlay guideline policy for the capture screen.
//!
//! Some defect categories photograph better against the light half of the
//! frame; the rest go on the dark half. Pure membership test, no state, no
//! failure mode.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Which half of the capture frame the overlay guideline renders on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuidelineSide {
    Light,
    Dark,
}

impl std::fmt::Display for GuidelineSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidelineSide::Light => write!(f, "light"),
            GuidelineSide::Dark => write!(f, "dark"),
        }
    }
}

/// Chooses the guideline side for a defect type.
#[derive(Debug, Clone, Default)]
pub struct GuidelineSelector {
    /// Upper-cased defect types mapped to the light side
    light_defects: HashSet<String>,
}

impl GuidelineSelector {
    /// Build a selector from the configured light-side defect list.
    /// Matching is case-insensitive and whitespace-tolerant.
    pub fn new<I, S>(light_defects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            light_defects: light_defects
                .into_iter()
                .map(|d| d.as_ref().trim().to_uppercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Side the guideline should render on for `defect_type`.
    pub fn choose(&self, defect_type: &str) -> GuidelineSide {
        if self.light_defects.contains(&defect_type.trim().to_uppercase()) {
            GuidelineSide::Light
        } else {
            GuidelineSide::Dark
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_side_membership_is_case_insensitive() {
        let selector = GuidelineSelector::new(["Chip", "scratch"]);
        assert_eq!(selector.choose("CHIP"), GuidelineSide::Light);
        assert_eq!(selector.choose(" chip "), GuidelineSide::Light);
        assert_eq!(selector.choose("Scratch"), GuidelineSide::Light);
    }

    #[test]
    fn unknown_defects_go_dark() {
        let selector = GuidelineSelector::new(["Chip"]);
        assert_eq!(selector.choose("Dent"), GuidelineSide::Dark);
        assert_eq!(selector.choose(""), GuidelineSide::Dark);
    }

    #[test]
    fn empty_selector_maps_everything_dark() {
        let selector = GuidelineSelector::default();
        assert_eq!(selector.choose("Chip"), GuidelineSide::Dark);
    }
}
