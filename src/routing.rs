//! Edge routing between diagram columns
//!
//! A link whose consumer sits more than one column away from its input would
//! cut across the nodes in between if drawn as a straight line. Such links are
//! turned into bypasses: they leave the input sideways, climb to the shared
//! horizontal spine of the consumer's column, run along it through the
//! intermediate columns and drop into the consumer from the gutter next to
//! its column.
//!
//! Coordinates are in grid units: `column` is the layout depth and `row` the
//! in-column row, with half units addressing the gutters between them.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::graph::ChainGraph;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub column: f64,
    pub row: f64,
}

impl Point {
    fn new(column: f64, row: f64) -> Self {
        Self { column, row }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Straight line from input to consumer.
    Direct,
    Bypass {
        /// Intermediate column whose gutter the spine drops through.
        spine_column: u32,
        /// Row of the shared horizontal spine.
        spine_row: f64,
        /// Topmost node of the consumer's column; the spine is anchored on it.
        anchor: String,
        waypoints: Vec<Point>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRoute {
    pub from_consumer: String,
    pub to_input: String,
    pub route: Route,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutingPlan {
    pub routes: Vec<LinkRoute>,
    /// Consumers whose short local connector is replaced by a bypass.
    pub suppressed_connectors: BTreeSet<String>,
}

impl RoutingPlan {
    /// Whether the node still draws its own short local connector.
    pub fn keeps_local_connector(&self, id: &str) -> bool {
        !self.suppressed_connectors.contains(id)
    }

    pub fn bypass_count(&self) -> usize {
        self.routes
            .iter()
            .filter(|r| matches!(r.route, Route::Bypass { .. }))
            .count()
    }
}

/// Decide how each link of `graph` is drawn.
///
/// Depends only on node columns and rows; call it again whenever the column
/// assignment changes. Links that refer to unknown nodes are drawn direct.
pub fn route_links(graph: &ChainGraph) -> RoutingPlan {
    let positions: BTreeMap<&str, (u32, u32)> = graph
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), (node.depth, node.row)))
        .collect();

    // Bypass anchor per column: minimum row, ties broken by id.
    let mut anchors: BTreeMap<u32, (u32, &str)> = BTreeMap::new();
    for node in &graph.nodes {
        let candidate = (node.row, node.id.as_str());
        anchors
            .entry(node.depth)
            .and_modify(|best| {
                if candidate < *best {
                    *best = candidate;
                }
            })
            .or_insert(candidate);
    }

    let mut plan = RoutingPlan::default();
    for link in &graph.links {
        let endpoints = positions
            .get(link.to_input.as_str())
            .zip(positions.get(link.from_consumer.as_str()));
        let route = match endpoints {
            Some((&source, &target)) if source.0.abs_diff(target.0) > 1 => {
                let (anchor_row, anchor) = anchors[&target.0];
                plan.suppressed_connectors.insert(link.from_consumer.clone());
                bypass(source, target, anchor_row, anchor)
            }
            _ => Route::Direct,
        };
        plan.routes.push(LinkRoute {
            from_consumer: link.from_consumer.clone(),
            to_input: link.to_input.clone(),
            route,
        });
    }
    plan
}

fn bypass(source: (u32, u32), target: (u32, u32), anchor_row: u32, anchor: &str) -> Route {
    let (source_col, source_row) = (f64::from(source.0), f64::from(source.1));
    let (target_col, target_row) = (f64::from(target.0), f64::from(target.1));
    let step: f64 = if target.0 > source.0 { 1.0 } else { -1.0 };

    let spine_row = f64::from(anchor_row) - 0.5;
    let exit_gutter = source_col + step * 0.5;
    let entry_gutter = target_col - step * 0.5;
    let spine_column = if target.0 > source.0 {
        target.0 - 1
    } else {
        target.0 + 1
    };

    Route::Bypass {
        spine_column,
        spine_row,
        anchor: anchor.to_string(),
        waypoints: vec![
            Point::new(source_col, source_row),
            Point::new(exit_gutter, source_row),
            Point::new(exit_gutter, spine_row),
            Point::new(entry_gutter, spine_row),
            Point::new(entry_gutter, target_row),
            Point::new(target_col, target_row),
        ],
    }
}
