//! Dependency tiers via bounded fixed-point propagation

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::catalog::Catalog;

/// Upper bound on propagation passes; cyclic catalogs stop here.
pub const MAX_TIER_PASSES: usize = 50;

/// Integer dependency tier per item.
///
/// Items missing from the map (raw materials without a hint) are tier 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierMap {
    tiers: BTreeMap<String, u32>,
}

impl TierMap {
    pub fn get(&self, item: &str) -> u32 {
        self.tiers.get(item).copied().unwrap_or(0)
    }

    /// Whether the item has an explicit entry (a recipe or a hint).
    pub fn contains(&self, item: &str) -> bool {
        self.tiers.contains_key(item)
    }
}

/// Compute tiers for every recipe item in the catalog.
///
/// tier(item) = 1 + max tier of its inputs, or 1 for a recipe without
/// inputs. Each pass re-derives every recipe from the current estimates, so
/// the result does not depend on iteration order. On a dependency cycle the
/// pass cap is hit and the last estimates are returned as-is.
pub fn resolve_tiers(catalog: &Catalog) -> TierMap {
    let mut tiers: BTreeMap<String, u32> = catalog
        .tier_hints()
        .map(|(name, tier)| (name.to_string(), tier))
        .collect();
    for (name, _) in catalog.recipes() {
        tiers.entry(name.to_string()).or_insert(0);
    }

    let mut stable = false;
    for pass in 0..MAX_TIER_PASSES {
        let mut changed = false;
        for (name, recipe) in catalog.recipes() {
            let tier = 1 + recipe
                .inputs
                .keys()
                .map(|input| tiers.get(input).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            if tiers.get(name) != Some(&tier) {
                tiers.insert(name.to_string(), tier);
                changed = true;
            }
        }
        if !changed {
            debug!(passes = pass + 1, "tiers converged");
            stable = true;
            break;
        }
    }

    if !stable {
        warn!(
            passes = MAX_TIER_PASSES,
            "tier propagation hit the pass cap; catalog likely has a dependency cycle"
        );
    }

    TierMap { tiers }
}
