//! Production chain calculator
//!
//! Expands a target item and rate into the full chain of machines and raw
//! extraction needed to sustain it, then lays the chain out as a layered
//! diagram with routed edges.
//!
//! ```no_run
//! use sr_crafting_calculator::{catalog::Catalog, calculator, layout, tiers};
//!
//! let catalog = Catalog::new();
//! let tiers = tiers::resolve_tiers(&catalog);
//! let plan = calculator::expand(&catalog, &tiers, "Iron Plate", 60.0)?;
//! let depths = layout::assign_depths(&plan, layout::LayoutStrategy::Breadth);
//! # Ok::<(), sr_crafting_calculator::error::CalcError>(())
//! ```

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod graph;
pub mod import;
pub mod layout;
pub mod logging;
pub mod models;
pub mod rate;
pub mod report;
pub mod routing;
pub mod settings;
pub mod tiers;

pub use calculator::expand;
pub use catalog::Catalog;
pub use error::CalcError;
pub use layout::{LayoutStrategy, assign_depths};
pub use models::{GraphLink, GraphNode, ItemSource, PlanNode, ProductionPlan, Recipe};
pub use tiers::{TierMap, resolve_tiers};
