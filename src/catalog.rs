//! The recipe catalog: item name -> recipe, plus tier hints for raw items

use std::collections::BTreeMap;

use crate::models::{ItemSource, Recipe};

/// Read-only recipe data for one catalog version.
///
/// Items without a recipe are raw materials. `tier_hints` carries explicit
/// tiers for raw items (recipes carry their own hint).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    recipes: BTreeMap<String, Recipe>,
    tier_hints: BTreeMap<String, u32>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a recipe.
    ///
    /// Returns `false` (and leaves the catalog untouched) when the output
    /// quantity or craft time is not a positive finite number, since such a
    /// recipe has no meaningful machine rate.
    pub fn insert_recipe(&mut self, item: impl Into<String>, recipe: Recipe) -> bool {
        if !is_positive(recipe.output_qty) || !is_positive(recipe.craft_time_s) {
            return false;
        }
        if recipe.inputs.values().any(|qty| !qty.is_finite() || *qty < 0.0) {
            return false;
        }
        self.recipes.insert(item.into(), recipe);
        true
    }

    pub fn insert_tier_hint(&mut self, item: impl Into<String>, tier: u32) {
        self.tier_hints.insert(item.into(), tier);
    }

    /// Merge another catalog into this one; entries in `other` win.
    pub fn merge(&mut self, other: Catalog) {
        self.recipes.extend(other.recipes);
        self.tier_hints.extend(other.tier_hints);
    }

    pub fn lookup(&self, item: &str) -> ItemSource<'_> {
        match self.recipes.get(item) {
            Some(recipe) => ItemSource::Crafted(recipe),
            None => ItemSource::Raw,
        }
    }

    pub fn recipe(&self, item: &str) -> Option<&Recipe> {
        self.recipes.get(item)
    }

    pub fn recipes(&self) -> impl Iterator<Item = (&str, &Recipe)> {
        self.recipes.iter().map(|(name, recipe)| (name.as_str(), recipe))
    }

    /// Explicit tier hints: raw-item hints plus each recipe's own hint.
    pub fn tier_hints(&self) -> impl Iterator<Item = (&str, u32)> {
        let recipe_hints = self
            .recipes
            .iter()
            .filter_map(|(name, recipe)| recipe.tier_hint.map(|tier| (name.as_str(), tier)));
        self.tier_hints
            .iter()
            .map(|(name, tier)| (name.as_str(), *tier))
            .chain(recipe_hints)
    }

    pub fn raw_tier_hints(&self) -> &BTreeMap<String, u32> {
        &self.tier_hints
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Natural production rate of one machine for `item`, rounded to whole
    /// units per minute. `None` for raw items.
    pub fn natural_rate(&self, item: &str) -> Option<f64> {
        self.recipes
            .get(item)
            .map(|recipe| recipe.output_per_minute().round())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
