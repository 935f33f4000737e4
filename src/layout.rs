//! Column ("depth") assignment for the layered chain diagram
//!
//! Two strategies are available and never blended:
//!
//! - [`LayoutStrategy::Breadth`] (the default) layers nodes outward from the
//!   raw materials and compacts the result to contiguous columns.
//! - [`LayoutStrategy::TierBiased`] starts from each item's tier and applies
//!   the overrides of a [`PlacementPolicy`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::models::ProductionPlan;
use crate::settings::PlacementPolicy;
use crate::tiers::TierMap;

/// Upper bound on override passes for the tier-biased strategy.
pub const MAX_LAYOUT_PASSES: usize = 6;

#[derive(Debug, Clone, Copy)]
pub enum LayoutStrategy<'a> {
    Breadth,
    TierBiased {
        tiers: &'a TierMap,
        policy: &'a PlacementPolicy,
    },
}

/// Assign every plan node a column. Pure: the result depends only on the
/// plan contents (and the tier/policy inputs for the tier-biased strategy).
pub fn assign_depths(plan: &ProductionPlan, strategy: LayoutStrategy<'_>) -> BTreeMap<String, u32> {
    let depths = match strategy {
        LayoutStrategy::Breadth => breadth_depths(plan),
        LayoutStrategy::TierBiased { tiers, policy } => tier_biased_depths(plan, tiers, policy),
    };
    debug!(
        root = %plan.root,
        nodes = depths.len(),
        columns = depths.values().max().map_or(0, |max| max + 1),
        "assigned depths"
    );
    depths
}

// ---------------------------------------------------------------------------
// Breadth-first layering
// ---------------------------------------------------------------------------

fn breadth_depths(plan: &ProductionPlan) -> BTreeMap<String, u32> {
    // Reverse adjacency (input -> consumers), forward adjacency for cycle
    // lookup, and the number of distinct in-plan inputs each consumer still
    // waits on.
    let mut consumers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut inputs_of: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
    for (name, node) in &plan.nodes {
        let inputs: Vec<&str> = node
            .input_rates
            .keys()
            .map(String::as_str)
            .filter(|input| plan.nodes.contains_key(*input))
            .collect();
        remaining.insert(name.as_str(), inputs.len());
        for &input in &inputs {
            consumers.entry(input).or_default().push(name.as_str());
        }
        inputs_of.insert(name.as_str(), inputs);
    }

    let mut depth: BTreeMap<&str, u32> = BTreeMap::new();
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for (name, node) in &plan.nodes {
        if node.is_raw {
            depth.insert(name.as_str(), 0);
            placed.insert(name.as_str());
            queue.push_back(name.as_str());
        }
    }

    loop {
        while let Some(current) = queue.pop_front() {
            let next = depth[current] + 1;
            for &consumer in consumers.get(current).into_iter().flatten() {
                // Links inside a parked cycle.
                if placed.contains(consumer) {
                    continue;
                }
                let entry = depth.entry(consumer).or_insert(next);
                *entry = (*entry).max(next);
                if let Some(left) = remaining.get_mut(consumer) {
                    *left = left.saturating_sub(1);
                    if *left == 0 {
                        placed.insert(consumer);
                        queue.push_back(consumer);
                    }
                }
            }
        }

        let unresolved: Vec<&str> = plan
            .nodes
            .keys()
            .map(String::as_str)
            .filter(|name| !placed.contains(name))
            .collect();
        if unresolved.is_empty() {
            break;
        }
        let beyond = depth.values().max().map_or(0, |max| max + 1);

        // Crafted items without inputs cannot be reached from a raw node.
        let seeds: Vec<&str> = unresolved
            .iter()
            .copied()
            .filter(|name| remaining[name] == 0)
            .collect();
        if !seeds.is_empty() {
            for name in seeds {
                depth.insert(name, beyond);
                placed.insert(name);
                queue.push_back(name);
            }
            continue;
        }

        // Everything left waits on a cycle. Park one cycle in a single
        // column, keeping the depth its members already got from their
        // placed inputs, then resume layering from it.
        let cycle = source_cycle(&unresolved, &inputs_of, &placed);
        let column = cycle
            .iter()
            .filter_map(|name| depth.get(name).copied())
            .max()
            .unwrap_or(beyond);
        debug!(members = ?cycle, column, "parking dependency cycle");
        for name in cycle {
            depth.insert(name, column);
            placed.insert(name);
            queue.push_back(name);
        }
    }

    compact(depth)
}

/// The strongly connected component among unplaced nodes that waits on no
/// unplaced node outside itself.
///
/// A node whose upstream set (itself plus every unplaced node it
/// transitively consumes) is smallest lies in such a component, and its
/// upstream set is exactly that component. Ties go to the first name.
fn source_cycle<'a>(
    unresolved: &[&'a str],
    inputs_of: &BTreeMap<&'a str, Vec<&'a str>>,
    placed: &BTreeSet<&'a str>,
) -> BTreeSet<&'a str> {
    let mut best: Option<BTreeSet<&'a str>> = None;
    for &start in unresolved {
        let upstream = upstream_of(start, inputs_of, placed);
        if best.as_ref().is_none_or(|b| upstream.len() < b.len()) {
            best = Some(upstream);
        }
    }
    best.unwrap_or_default()
}

fn upstream_of<'a>(
    start: &'a str,
    inputs_of: &BTreeMap<&'a str, Vec<&'a str>>,
    placed: &BTreeSet<&'a str>,
) -> BTreeSet<&'a str> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for &input in inputs_of.get(node).into_iter().flatten() {
            if !placed.contains(input) && seen.insert(input) {
                stack.push(input);
            }
        }
    }
    seen
}

/// Renumber used depths to 0, 1, 2, ... preserving order.
fn compact(depth: BTreeMap<&str, u32>) -> BTreeMap<String, u32> {
    let used: BTreeSet<u32> = depth.values().copied().collect();
    let index: BTreeMap<u32, u32> = used
        .into_iter()
        .enumerate()
        .map(|(i, d)| (d, i as u32))
        .collect();
    depth
        .into_iter()
        .map(|(name, d)| (name.to_string(), index[&d]))
        .collect()
}

// ---------------------------------------------------------------------------
// Tier-biased overrides
// ---------------------------------------------------------------------------

fn tier_biased_depths(
    plan: &ProductionPlan,
    tiers: &TierMap,
    policy: &PlacementPolicy,
) -> BTreeMap<String, u32> {
    let mut previous: Option<BTreeMap<String, u32>> = None;
    for pass in 0..MAX_LAYOUT_PASSES {
        let next = tier_pass(plan, tiers, policy, previous.as_ref());
        if previous.as_ref() == Some(&next) {
            debug!(passes = pass + 1, "tier-biased layout stable");
            return next;
        }
        previous = Some(next);
    }
    warn!(passes = MAX_LAYOUT_PASSES, "tier-biased layout did not settle; using the last pass");
    previous.unwrap_or_default()
}

/// One full application of every override rule.
///
/// Each pass starts again from the tier defaults; only the consumer depths
/// used by the left-of-consumer rule come from the previous pass.
fn tier_pass(
    plan: &ProductionPlan,
    tiers: &TierMap,
    policy: &PlacementPolicy,
    previous: Option<&BTreeMap<String, u32>>,
) -> BTreeMap<String, u32> {
    let mut depth: BTreeMap<&str, i64> = plan
        .nodes
        .keys()
        .map(|name| (name.as_str(), i64::from(tiers.get(name)) + 1))
        .collect();

    for (name, node) in &plan.nodes {
        if node.is_raw && (policy.forced_raw.contains(name) || !tiers.contains(name)) {
            depth.insert(name.as_str(), 0);
        }
    }

    for (name, column) in &policy.pinned {
        if let Some(d) = depth.get_mut(name.as_str()) {
            *d = i64::from(*column);
        }
    }

    let current = depth.clone();
    for name in &policy.left_of_consumer {
        if !plan.nodes.contains_key(name) {
            continue;
        }
        let leftmost_consumer = plan
            .nodes
            .iter()
            .filter(|(_, node)| node.input_rates.contains_key(name))
            .map(|(consumer, _)| match previous {
                Some(prev) => i64::from(prev[consumer]),
                None => current[consumer.as_str()],
            })
            .min();
        depth.insert(name.as_str(), leftmost_consumer.map_or(0, |d| d - 1));
    }

    for d in depth.values_mut() {
        *d = (*d).max(0);
    }

    // Raw-left and tier placement must agree: once any raw item sits in
    // column 0 every raw item goes there and crafted items move right.
    let placed_by_policy =
        |name: &str| policy.left_of_consumer.contains(name) || policy.pinned.contains_key(name);
    let raw_at_zero = plan
        .nodes
        .iter()
        .any(|(name, node)| node.is_raw && !placed_by_policy(name) && depth[name.as_str()] == 0);
    if raw_at_zero {
        for (name, node) in &plan.nodes {
            if placed_by_policy(name) {
                continue;
            }
            if let Some(d) = depth.get_mut(name.as_str()) {
                if node.is_raw {
                    *d = 0;
                } else {
                    *d += 1;
                }
            }
        }
    }

    depth
        .into_iter()
        .map(|(name, d)| (name.to_string(), u32::try_from(d).unwrap_or(u32::MAX)))
        .collect()
}
