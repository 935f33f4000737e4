//! Plain-text production report and column listing

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::graph::{ChainGraph, name_order};
use crate::models::ProductionPlan;
use crate::routing::{Route, RoutingPlan};
use crate::settings::ExtractorSettings;
use crate::tiers::TierMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub item: String,
    pub rate: f64,
    pub output_per_machine: Option<u64>,
    pub machines: u64,
    pub building: String,
    pub inputs: Vec<(String, f64)>,
    pub rails_needed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRow {
    pub resource: String,
    pub impure: Option<u64>,
    pub normal: u64,
    pub pure: Option<u64>,
    pub qty: u64,
}

/// Summary of a production chain calculation
#[derive(Debug)]
pub struct ChainSummary {
    pub target_item: String,
    pub target_rate: f64,
    pub rail_speed: u32,
    /// Crafted rows grouped by tier, highest tier first.
    pub levels: Vec<(u32, Vec<ReportRow>)>,
    pub machine_totals: Vec<(String, u64)>,
    pub extraction: Vec<ExtractionRow>,
}

/// Belts needed to carry the summed input flow, `None` without a rail speed.
pub fn rails_needed(inputs: &BTreeMap<String, f64>, rail_speed: u32) -> Option<u64> {
    if rail_speed == 0 {
        return None;
    }
    let total: f64 = inputs.values().sum();
    Some((total / f64::from(rail_speed)).ceil() as u64)
}

/// Extractor node counts for one raw resource.
pub fn extraction_row(resource: &str, qty: f64, settings: &ExtractorSettings) -> ExtractionRow {
    let rounded = qty.ceil();
    let nodes = |per_node: f64| (rounded / per_node).ceil() as u64;
    match settings.special.get(resource) {
        Some(rate) => ExtractionRow {
            resource: resource.to_string(),
            impure: None,
            normal: nodes(*rate),
            pure: None,
            qty: rounded as u64,
        },
        None => ExtractionRow {
            resource: resource.to_string(),
            impure: Some(nodes(settings.impure)),
            normal: nodes(settings.normal),
            pure: Some(nodes(settings.pure)),
            qty: rounded as u64,
        },
    }
}

/// Generate a summary of the production plan
pub fn summarize_plan(
    plan: &ProductionPlan,
    catalog: &Catalog,
    tiers: &TierMap,
    extractors: &ExtractorSettings,
    rail_speed: u32,
) -> ChainSummary {
    let mut by_tier: BTreeMap<u32, Vec<ReportRow>> = BTreeMap::new();
    for (item, node) in &plan.nodes {
        if node.is_raw {
            continue;
        }
        let output_per_machine = catalog
            .recipe(item)
            .map(|recipe| recipe.output_per_minute().ceil() as u64);
        by_tier.entry(tiers.get(item)).or_default().push(ReportRow {
            item: item.clone(),
            rate: node.rate,
            output_per_machine,
            machines: node.machine_count,
            building: node.building.clone(),
            inputs: node
                .input_rates
                .iter()
                .map(|(input, rate)| (input.clone(), *rate))
                .collect(),
            rails_needed: rails_needed(&node.input_rates, rail_speed),
        });
    }
    let levels = by_tier
        .into_iter()
        .rev()
        .map(|(tier, mut rows)| {
            rows.sort_by(|a, b| name_order(&a.item, &b.item));
            (tier, rows)
        })
        .collect();

    let mut machine_totals: Vec<(String, u64)> = plan
        .machine_totals
        .iter()
        .map(|(building, count)| (building.clone(), *count))
        .collect();
    machine_totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut extraction: Vec<ExtractionRow> = plan
        .extractor_totals
        .iter()
        .filter(|(_, qty)| **qty > 0.0)
        .map(|(resource, qty)| extraction_row(resource, *qty, extractors))
        .collect();
    extraction.sort_by(|a, b| b.qty.cmp(&a.qty).then_with(|| a.resource.cmp(&b.resource)));

    ChainSummary {
        target_item: plan.root.clone(),
        target_rate: plan.target_rate,
        rail_speed,
        levels,
        machine_totals,
        extraction,
    }
}

fn dash(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl std::fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Production chain for {} / min of {} ===", self.target_rate, self.target_item)?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<32} {:>8} {:>10} {:>8}  {:<14} {:>6}  Inputs",
            "Item", "Qty/min", "Out/mach", "Machines", "Machine Type", "Rails"
        )?;
        writeln!(f, "{}", "-".repeat(96))?;
        for (tier, rows) in &self.levels {
            writeln!(f, "--- Level {} ---", tier)?;
            for row in rows {
                let inputs = row
                    .inputs
                    .iter()
                    .map(|(input, rate)| format!("{}: {}/min", input, rate.ceil()))
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(
                    f,
                    "{:<32} {:>8} {:>10} {:>8}  {:<14} {:>6}  {}",
                    row.item,
                    row.rate.ceil(),
                    dash(row.output_per_machine),
                    row.machines,
                    row.building,
                    dash(row.rails_needed),
                    if inputs.is_empty() { "-".to_string() } else { inputs }
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Machines required (total):")?;
        for (building, count) in &self.machine_totals {
            writeln!(f, "  {:>5}x {}", count, building)?;
        }
        writeln!(f)?;

        writeln!(f, "Extraction required:")?;
        writeln!(f, "  {:<24} {:>7} {:>7} {:>7} {:>8}", "Resource", "Impure", "Normal", "Pure", "Qty/min")?;
        for row in &self.extraction {
            writeln!(
                f,
                "  {:<24} {:>7} {:>7} {:>7} {:>8}",
                row.resource,
                dash(row.impure),
                row.normal,
                dash(row.pure),
                row.qty
            )?;
        }

        Ok(())
    }
}

/// Format the laid-out graph column by column, including bypass routes
pub fn format_layout(graph: &ChainGraph, routing: &RoutingPlan) -> String {
    let mut output = String::new();

    for depth in 0..graph.column_count() {
        output.push_str(&format!("Column {}:\n", depth));
        for node in graph.column(depth) {
            let kind = if node.is_raw {
                "raw".to_string()
            } else {
                format!("{}x {}", node.machine_count, node.building)
            };
            let connector = if routing.keeps_local_connector(&node.id) { "" } else { " [bypass]" };
            output.push_str(&format!("  {:>3}. {} ({}){}\n", node.row, node.label, kind, connector));
        }
    }

    let bypasses: Vec<_> = routing
        .routes
        .iter()
        .filter_map(|r| match &r.route {
            Route::Bypass { spine_column, anchor, .. } => Some((r, spine_column, anchor)),
            Route::Direct => None,
        })
        .collect();
    if !bypasses.is_empty() {
        output.push_str("Bypass routes:\n");
        for (route, spine_column, anchor) in bypasses {
            output.push_str(&format!(
                "  {} -> {} via spine at column {} (anchor {})\n",
                route.to_input, route.from_consumer, spine_column, anchor
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::expand;
    use crate::graph::build_graph;
    use crate::layout::{LayoutStrategy, assign_depths};
    use crate::models::Recipe;
    use crate::routing::route_links;
    use crate::tiers::resolve_tiers;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_recipe(
            "Rotor",
            Recipe {
                building: "Assembler".to_string(),
                output_qty: 1.0,
                craft_time_s: 12.0,
                inputs: BTreeMap::from([("Plate".to_string(), 2.0), ("Helium-3".to_string(), 1.0)]),
                tier_hint: None,
            },
        );
        catalog.insert_recipe(
            "Plate",
            Recipe {
                building: "Smelter".to_string(),
                output_qty: 1.0,
                craft_time_s: 2.0,
                inputs: BTreeMap::from([("Ore".to_string(), 1.0)]),
                tier_hint: None,
            },
        );
        catalog
    }

    #[test]
    fn extraction_uses_purity_rates() {
        let row = extraction_row("Ore", 130.2, &ExtractorSettings::default());
        assert_eq!(row.qty, 131);
        assert_eq!(row.impure, Some(3));
        assert_eq!(row.normal, 2);
        assert_eq!(row.pure, Some(1));
    }

    #[test]
    fn special_extractors_have_a_single_rate() {
        let row = extraction_row("Goethite Ore", 801.0, &ExtractorSettings::default());
        assert_eq!(row.impure, None);
        assert_eq!(row.normal, 3);
        assert_eq!(row.pure, None);
    }

    #[test]
    fn rails_round_up_total_input_flow() {
        let inputs = BTreeMap::from([("A".to_string(), 100.0), ("B".to_string(), 30.5)]);
        assert_eq!(rails_needed(&inputs, 120), Some(2));
        assert_eq!(rails_needed(&inputs, 240), Some(1));
        assert_eq!(rails_needed(&inputs, 0), None);
    }

    #[test]
    fn summary_groups_by_tier_and_sorts_totals() {
        let catalog = catalog();
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "Rotor", 10.0).unwrap();
        let summary = summarize_plan(&plan, &catalog, &tiers, &ExtractorSettings::default(), 120);

        let order: Vec<(u32, Vec<&str>)> = summary
            .levels
            .iter()
            .map(|(tier, rows)| (*tier, rows.iter().map(|r| r.item.as_str()).collect()))
            .collect();
        assert_eq!(order, vec![(2, vec!["Rotor"]), (1, vec!["Plate"])]);

        // Rotor: 5/min per assembler -> 2; Plate: 20/min at 30/min per smelter -> 1.
        assert_eq!(summary.machine_totals, vec![("Assembler".to_string(), 2), ("Smelter".to_string(), 1)]);
        assert_eq!(summary.extraction[0].resource, "Ore");
        assert_eq!(summary.extraction[1].resource, "Helium-3");
        assert_eq!(summary.extraction[1].impure, None);

        let text = summary.to_string();
        assert!(text.contains("--- Level 2 ---"));
        assert!(text.contains("Machines required (total):"));
    }

    #[test]
    fn rows_within_a_level_ignore_case() {
        let mut catalog = Catalog::new();
        for item in ["beta Rod", "Alpha Rod", "Gamma Rod"] {
            catalog.insert_recipe(
                item,
                Recipe {
                    building: "Press".to_string(),
                    output_qty: 1.0,
                    craft_time_s: 60.0,
                    inputs: BTreeMap::from([("Ore".to_string(), 1.0)]),
                    tier_hint: None,
                },
            );
        }
        catalog.insert_recipe(
            "Bundle",
            Recipe {
                building: "Assembler".to_string(),
                output_qty: 1.0,
                craft_time_s: 60.0,
                inputs: BTreeMap::from([
                    ("beta Rod".to_string(), 1.0),
                    ("Alpha Rod".to_string(), 1.0),
                    ("Gamma Rod".to_string(), 1.0),
                ]),
                tier_hint: None,
            },
        );
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "Bundle", 1.0).unwrap();
        let summary = summarize_plan(&plan, &catalog, &tiers, &ExtractorSettings::default(), 120);

        let (tier, rows) = &summary.levels[1];
        assert_eq!(*tier, 1);
        let items: Vec<&str> = rows.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, vec!["Alpha Rod", "beta Rod", "Gamma Rod"]);
    }

    #[test]
    fn layout_listing_marks_bypassed_consumers() {
        let catalog = catalog();
        let tiers = resolve_tiers(&catalog);
        let plan = expand(&catalog, &tiers, "Rotor", 10.0).unwrap();
        let depths = assign_depths(&plan, LayoutStrategy::Breadth);
        let graph = build_graph(&plan, &depths);
        let routing = route_links(&graph);

        let text = format_layout(&graph, &routing);
        assert!(text.contains("Column 2:"));
        assert!(text.contains("Rotor (2x Assembler) [bypass]"));
        assert!(text.contains("Helium-3 -> Rotor via spine at column 1"));
    }
}
