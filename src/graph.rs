//! Renderer-facing chain graph: nodes with columns and rows, plus links

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{GraphLink, GraphNode, ProductionPlan};
use crate::routing::{RoutingPlan, route_links};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl ChainGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn column_count(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth + 1).max().unwrap_or(0)
    }

    /// Nodes of one column in row order.
    pub fn column(&self, depth: u32) -> Vec<&GraphNode> {
        let mut nodes: Vec<&GraphNode> = self.nodes.iter().filter(|n| n.depth == depth).collect();
        nodes.sort_by_key(|node| node.row);
        nodes
    }
}

/// Order of nodes within a column: case-insensitive label, then id.
pub fn row_order(a: &GraphNode, b: &GraphNode) -> std::cmp::Ordering {
    name_order(&a.label, &b.label).then_with(|| a.id.cmp(&b.id))
}

/// Case-insensitive name order, falling back to byte order so that names
/// differing only in case still sort deterministically.
pub fn name_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Project a plan and its column assignment into graph nodes and links.
///
/// Nodes missing from `depths` land in column 0. Rows are assigned per
/// column with [`row_order`], so they never depend on map iteration order.
pub fn build_graph(plan: &ProductionPlan, depths: &BTreeMap<String, u32>) -> ChainGraph {
    let mut nodes: Vec<GraphNode> = plan
        .nodes
        .iter()
        .map(|(item, node)| GraphNode {
            id: item.clone(),
            label: item.clone(),
            is_raw: node.is_raw,
            building: node.building.clone(),
            machine_count: node.machine_count,
            inputs: node.input_rates.clone(),
            depth: depths.get(item).copied().unwrap_or(0),
            row: 0,
        })
        .collect();

    nodes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| row_order(a, b)));
    let mut next_row: BTreeMap<u32, u32> = BTreeMap::new();
    for node in &mut nodes {
        let row = next_row.entry(node.depth).or_insert(0);
        node.row = *row;
        *row += 1;
    }

    ChainGraph {
        nodes,
        links: plan.links(),
    }
}

/// Everything an external renderer needs for one chain diagram.
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub root: String,
    pub target_rate: f64,
    pub graph: ChainGraph,
    pub routing: RoutingPlan,
}

impl GraphExport {
    pub fn new(plan: &ProductionPlan, depths: &BTreeMap<String, u32>) -> Self {
        let graph = build_graph(plan, depths);
        let routing = route_links(&graph);
        Self {
            root: plan.root.clone(),
            target_rate: plan.target_rate,
            graph,
            routing,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
