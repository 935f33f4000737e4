//! Calculator settings: placement policy, extractor and rail tables
//!
//! Everything here has a built-in default; a TOML file may override any
//! section. Example:
//!
//! ```toml
//! default_rail = 240
//!
//! [placement]
//! forced_raw = ["Calcium Ore"]
//! left_of_consumer = ["Helium-3"]
//! pinned = { "Basic Building Material" = 1 }
//!
//! [extractors]
//! impure = 60.0
//! special = { "Helium-3" = 240.0 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};

/// Data-driven column overrides for the tier-biased layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementPolicy {
    /// Raw materials always drawn in column 0.
    pub forced_raw: BTreeSet<String>,
    /// Materials drawn one column left of their leftmost consumer.
    pub left_of_consumer: BTreeSet<String>,
    /// Items pinned to a fixed column.
    pub pinned: BTreeMap<String, u32>,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            forced_raw: ["Calcium Ore", "Titanium Ore", "Wolfram Ore"]
                .into_iter()
                .map(String::from)
                .collect(),
            left_of_consumer: ["Helium-3", "Sulphur Ore"]
                .into_iter()
                .map(String::from)
                .collect(),
            pinned: BTreeMap::from([("Basic Building Material".to_string(), 1)]),
        }
    }
}

impl PlacementPolicy {
    /// A policy with no overrides at all.
    pub fn empty() -> Self {
        Self {
            forced_raw: BTreeSet::new(),
            left_of_consumer: BTreeSet::new(),
            pinned: BTreeMap::new(),
        }
    }
}

/// Per-node extraction rates (units/min) by node purity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    pub impure: f64,
    pub normal: f64,
    pub pure: f64,
    /// Resources with a single fixed extractor rate instead of purities.
    pub special: BTreeMap<String, f64>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            impure: 60.0,
            normal: 120.0,
            pure: 240.0,
            special: BTreeMap::from([
                ("Helium-3".to_string(), 240.0),
                ("Goethite Ore".to_string(), 400.0),
                ("Sulphur Ore".to_string(), 240.0),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub placement: PlacementPolicy,
    pub extractors: ExtractorSettings,
    /// Available rail speeds in units/min.
    pub rail_speeds: Vec<u32>,
    pub default_rail: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            placement: PlacementPolicy::default(),
            extractors: ExtractorSettings::default(),
            rail_speeds: vec![120, 240, 480],
            default_rail: 120,
        }
    }
}

impl Settings {
    pub fn from_toml_str(content: &str, file: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| CalcError::Settings {
            file: file.to_path_buf(),
            detail: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            default_rail = 480

            [placement]
            left_of_consumer = ["Water"]
            "#,
            Path::new("settings.toml"),
        )
        .unwrap();

        assert_eq!(settings.default_rail, 480);
        assert_eq!(settings.rail_speeds, vec![120, 240, 480]);
        assert!(settings.placement.left_of_consumer.contains("Water"));
        // Unspecified policy fields fall back to their own defaults.
        assert!(settings.placement.forced_raw.contains("Calcium Ore"));
        assert_eq!(settings.extractors.normal, 120.0);
    }

    #[test]
    fn invalid_toml_is_a_settings_error() {
        let err = Settings::from_toml_str("default_rail = \"fast\"", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, CalcError::Settings { .. }));
    }
}
