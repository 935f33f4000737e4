//! Data models for recipes, production plans and chain graphs

use std::collections::BTreeMap;

use serde::Serialize;

/// Building name recorded on plan nodes for extracted (raw) items.
pub const RAW_BUILDING: &str = "RAW";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub building: String,
    pub output_qty: f64,    // Units per craft
    pub craft_time_s: f64,  // Seconds per craft
    pub inputs: BTreeMap<String, f64>, // Input item -> units per craft
    pub tier_hint: Option<u32>,
}

impl Recipe {
    /// Output of a single machine in units per minute.
    pub fn output_per_minute(&self) -> f64 {
        self.output_qty * 60.0 / self.craft_time_s
    }
}

/// Where an item comes from: extraction, or a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemSource<'a> {
    Raw,
    Crafted(&'a Recipe),
}

/// Resolved demand for one item within a single expansion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanNode {
    pub rate: f64, // Units per minute, unrounded
    pub is_raw: bool,
    pub building: String,
    pub machine_count: u64,
    pub input_rates: BTreeMap<String, f64>,
}

impl PlanNode {
    pub(crate) fn raw(rate: f64) -> Self {
        Self {
            rate,
            is_raw: true,
            building: RAW_BUILDING.to_string(),
            machine_count: 0,
            input_rates: BTreeMap::new(),
        }
    }
}

/// Result of expanding a target item into its full production chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionPlan {
    pub root: String,
    pub target_rate: f64,
    pub nodes: BTreeMap<String, PlanNode>,
    pub machine_totals: BTreeMap<String, u64>,
    pub extractor_totals: BTreeMap<String, f64>,
}

impl ProductionPlan {
    /// Logical consumer -> input edges, one per `input_rates` entry.
    pub fn links(&self) -> Vec<GraphLink> {
        self.nodes
            .iter()
            .flat_map(|(consumer, node)| {
                node.input_rates.keys().map(move |input| GraphLink {
                    from_consumer: consumer.clone(),
                    to_input: input.clone(),
                })
            })
            .collect()
    }
}

/// Renderer-facing projection of a [`PlanNode`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub is_raw: bool,
    pub building: String,
    pub machine_count: u64,
    pub inputs: BTreeMap<String, f64>,
    pub depth: u32,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct GraphLink {
    pub from_consumer: String,
    pub to_input: String,
}
