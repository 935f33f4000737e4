//! Production chain calculator logic

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{CalcError, Result};
use crate::models::{ItemSource, PlanNode, ProductionPlan};
use crate::tiers::TierMap;

/// Worklist entry: highest tier first, then first-enqueued first.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    tier: u32,
    seq: Reverse<u64>,
    item: String,
}

/// Per-call expansion state. Nothing here outlives one `expand` call.
struct Expansion<'a> {
    catalog: &'a Catalog,
    tiers: &'a TierMap,
    pending: HashMap<String, f64>,
    resolved: HashSet<String>,
    queued: HashSet<String>,
    queue: BinaryHeap<QueueEntry>,
    next_seq: u64,
    nodes: BTreeMap<String, PlanNode>,
    machine_totals: BTreeMap<String, u64>,
    extractor_totals: BTreeMap<String, f64>,
}

impl<'a> Expansion<'a> {
    fn new(catalog: &'a Catalog, tiers: &'a TierMap) -> Self {
        Self {
            catalog,
            tiers,
            pending: HashMap::new(),
            resolved: HashSet::new(),
            queued: HashSet::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
            nodes: BTreeMap::new(),
            machine_totals: BTreeMap::new(),
            extractor_totals: BTreeMap::new(),
        }
    }

    fn enqueue(&mut self, item: &str, rate: f64) {
        if let ItemSource::Raw = self.catalog.lookup(item) {
            // Raw demand is final as soon as it arrives
            *self.extractor_totals.entry(item.to_string()).or_default() += rate;
            self.nodes
                .entry(item.to_string())
                .and_modify(|node| node.rate += rate)
                .or_insert_with(|| PlanNode::raw(rate));
            return;
        }

        *self.pending.entry(item.to_string()).or_default() += rate;

        if self.resolved.contains(item) {
            // Only reachable through a dependency cycle: the item was
            // finalized before this consumer was, so this demand is lost.
            warn!(item, rate, "demand arrived after the item was resolved; rate is under-counted");
            return;
        }
        if self.queued.insert(item.to_string()) {
            self.queue.push(QueueEntry {
                tier: self.tiers.get(item),
                seq: Reverse(self.next_seq),
                item: item.to_string(),
            });
            self.next_seq += 1;
        }
    }

    fn run(&mut self) {
        while let Some(QueueEntry { item, .. }) = self.queue.pop() {
            self.queued.remove(&item);
            if !self.resolved.insert(item.clone()) {
                continue;
            }
            let rate = self.pending.get(&item).copied().unwrap_or(0.0);
            self.resolve(&item, rate);
        }
    }

    fn resolve(&mut self, item: &str, rate: f64) {
        let recipe = match self.catalog.lookup(item) {
            ItemSource::Crafted(recipe) => recipe,
            ItemSource::Raw => return,
        };

        let machine_count = (rate / recipe.output_per_minute()).ceil() as u64;
        let crafts_per_minute = rate / recipe.output_qty;

        let mut input_rates = BTreeMap::new();
        for (input, qty) in &recipe.inputs {
            input_rates.insert(input.clone(), crafts_per_minute * qty);
        }

        debug!(
            item,
            rate,
            machines = machine_count,
            building = %recipe.building,
            "resolved item"
        );

        *self
            .machine_totals
            .entry(recipe.building.clone())
            .or_default() += machine_count;

        for (input, input_rate) in &input_rates {
            self.enqueue(input, *input_rate);
        }

        self.nodes.insert(
            item.to_string(),
            PlanNode {
                rate,
                is_raw: false,
                building: recipe.building.clone(),
                machine_count,
                input_rates,
            },
        );
    }
}

/// Expand `root` at `target_rate` units per minute into a full production plan.
///
/// Items are resolved exactly once, in descending tier order, so every
/// consumer has added its demand before the producer's rate is read. A root
/// without a recipe yields a plan holding a single raw node.
pub fn expand(
    catalog: &Catalog,
    tiers: &TierMap,
    root: &str,
    target_rate: f64,
) -> Result<ProductionPlan> {
    if root.trim().is_empty() {
        return Err(CalcError::InvalidInput("target item is empty".to_string()));
    }
    if !target_rate.is_finite() || target_rate <= 0.0 {
        return Err(CalcError::InvalidInput(format!(
            "target rate must be a positive number, got {target_rate}"
        )));
    }

    let mut expansion = Expansion::new(catalog, tiers);
    expansion.enqueue(root, target_rate);
    expansion.run();

    Ok(ProductionPlan {
        root: root.to_string(),
        target_rate,
        nodes: expansion.nodes,
        machine_totals: expansion.machine_totals,
        extractor_totals: expansion.extractor_totals,
    })
}
