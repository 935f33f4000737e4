//! Property-based tests for tiers, chain expansion and column layout.
//!
//! Random acyclic catalogs are generated by letting item `I{n}` consume only
//! items with a higher index or one of a handful of raw materials.

use std::collections::BTreeMap;

use proptest::prelude::*;
use sr_crafting_calculator::settings::PlacementPolicy;
use sr_crafting_calculator::{
    Catalog, LayoutStrategy, ProductionPlan, Recipe, assign_depths, expand, resolve_tiers,
};

const RAW_MATERIALS: [&str; 4] = ["Iron Ore", "Copper Ore", "Helium-3", "Calcium Ore"];
const BUILDINGS: [&str; 3] = ["Smelter", "Fabricator", "Assembler"];

// ===========================================================================
// Generators
// ===========================================================================

type RecipeShape = (usize, u32, u32, Vec<(usize, u32)>);

fn build_catalog(shapes: Vec<RecipeShape>) -> Catalog {
    let n = shapes.len();
    let mut catalog = Catalog::new();

    for (i, (building, output, time, inputs)) in shapes.into_iter().enumerate() {
        let later_items = n - i - 1;
        let candidates = later_items + RAW_MATERIALS.len();
        let inputs: BTreeMap<String, f64> = inputs
            .into_iter()
            .map(|(pick, qty)| {
                let pick = pick % candidates;
                let name = if pick < later_items {
                    format!("I{}", i + 1 + pick)
                } else {
                    RAW_MATERIALS[pick - later_items].to_string()
                };
                (name, f64::from(qty))
            })
            .collect();

        catalog.insert_recipe(
            format!("I{}", i),
            Recipe {
                building: BUILDINGS[building].to_string(),
                output_qty: f64::from(output),
                craft_time_s: f64::from(time),
                inputs,
                tier_hint: None,
            },
        );
    }

    catalog
}

fn arb_catalog(max_items: usize) -> impl Strategy<Value = Catalog> {
    proptest::collection::vec(
        (
            0..BUILDINGS.len(),
            1..5u32,
            1..30u32,
            proptest::collection::vec((0..16usize, 1..5u32), 0..4),
        ),
        1..=max_items,
    )
    .prop_map(build_catalog)
}

fn arb_rate() -> impl Strategy<Value = f64> {
    (1..600u32).prop_map(f64::from)
}

fn consumed_rate(plan: &ProductionPlan, item: &str) -> f64 {
    plan.nodes
        .values()
        .filter_map(|node| node.input_rates.get(item))
        .sum()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tiers_increase_along_every_recipe(catalog in arb_catalog(10)) {
        let tiers = resolve_tiers(&catalog);
        for (item, recipe) in catalog.recipes() {
            prop_assert!(tiers.get(item) >= 1);
            for input in recipe.inputs.keys() {
                prop_assert!(
                    tiers.get(item) > tiers.get(input),
                    "{} (tier {}) consumes {} (tier {})",
                    item, tiers.get(item), input, tiers.get(input)
                );
            }
        }
    }

    #[test]
    fn machine_counts_cover_demand_exactly(catalog in arb_catalog(10), rate in arb_rate()) {
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "I0", rate).unwrap();

        for (item, node) in &plan.nodes {
            match catalog.recipe(item) {
                Some(recipe) => {
                    let per_machine = recipe.output_per_minute();
                    prop_assert!(!node.is_raw);
                    prop_assert_eq!(node.machine_count, (node.rate / per_machine).ceil() as u64);
                    prop_assert!(node.machine_count as f64 * per_machine >= node.rate);
                }
                None => {
                    prop_assert!(node.is_raw);
                    prop_assert_eq!(node.machine_count, 0);
                    prop_assert!(node.input_rates.is_empty());
                }
            }
        }
    }

    #[test]
    fn demand_is_conserved(catalog in arb_catalog(10), rate in arb_rate()) {
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "I0", rate).unwrap();

        prop_assert_eq!(plan.nodes["I0"].rate, rate);
        for (item, node) in &plan.nodes {
            if item == "I0" {
                continue;
            }
            let demand = consumed_rate(&plan, item);
            prop_assert!((node.rate - demand).abs() <= 1e-9 * demand.max(1.0));
        }
    }

    #[test]
    fn totals_aggregate_plan_nodes(catalog in arb_catalog(10), rate in arb_rate()) {
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "I0", rate).unwrap();

        let mut machines: BTreeMap<String, u64> = BTreeMap::new();
        let mut extraction: BTreeMap<String, f64> = BTreeMap::new();
        for (item, node) in &plan.nodes {
            if node.is_raw {
                extraction.insert(item.clone(), node.rate);
            } else {
                *machines.entry(node.building.clone()).or_default() += node.machine_count;
            }
        }
        prop_assert_eq!(&plan.machine_totals, &machines);
        prop_assert_eq!(&plan.extractor_totals, &extraction);
    }

    #[test]
    fn expansion_is_deterministic(catalog in arb_catalog(10), rate in arb_rate()) {
        let tiers = resolve_tiers(&catalog);
        let first = expand(&catalog, &tiers, "I0", rate).unwrap();
        let second = expand(&catalog, &tiers, "I0", rate).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn breadth_columns_are_valid_and_contiguous(catalog in arb_catalog(10), rate in arb_rate()) {
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "I0", rate).unwrap();
        let depths = assign_depths(&plan, LayoutStrategy::Breadth);

        prop_assert_eq!(depths.len(), plan.nodes.len());
        for link in plan.links() {
            prop_assert!(depths[&link.from_consumer] > depths[&link.to_input]);
        }
        let max = depths.values().copied().max().unwrap_or(0);
        for column in 0..=max {
            prop_assert!(depths.values().any(|d| *d == column), "column {} is empty", column);
        }
        for (item, node) in &plan.nodes {
            if node.is_raw {
                prop_assert_eq!(depths[item], 0);
            }
        }
    }

    #[test]
    fn tier_layout_places_every_node(catalog in arb_catalog(10), rate in arb_rate()) {
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "I0", rate).unwrap();
        let policy = PlacementPolicy::default();

        let depths = assign_depths(&plan, LayoutStrategy::TierBiased { tiers: &tiers, policy: &policy });
        prop_assert_eq!(depths.len(), plan.nodes.len());
        let again = assign_depths(&plan, LayoutStrategy::TierBiased { tiers: &tiers, policy: &policy });
        prop_assert_eq!(depths, again);
    }
}
