//! Production chain calculator CLI
//!
//! Computes the machines and raw extraction needed to sustain a target
//! production rate, and exports the layered chain diagram for rendering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use tracing::{info, warn};

use sr_crafting_calculator::calculator;
use sr_crafting_calculator::catalog::Catalog;
use sr_crafting_calculator::db;
use sr_crafting_calculator::error::Result as CalcResult;
use sr_crafting_calculator::graph::GraphExport;
use sr_crafting_calculator::import;
use sr_crafting_calculator::layout::{LayoutStrategy, assign_depths};
use sr_crafting_calculator::logging;
use sr_crafting_calculator::models::{ProductionPlan, Recipe};
use sr_crafting_calculator::rate;
use sr_crafting_calculator::report;
use sr_crafting_calculator::settings::Settings;
use sr_crafting_calculator::tiers::{TierMap, resolve_tiers};

#[derive(Parser)]
#[command(name = "sr-calc")]
#[command(about = "Production chain calculator with layered chain diagrams")]
struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, default_value = "recipes.db", global = true)]
    database: PathBuf,

    /// Optional TOML settings (placement policy, extractors, rails)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutChoice {
    /// Layer outward from raw materials
    Breadth,
    /// Tier columns with placement-policy overrides
    Tier,
}

#[derive(clap::Args)]
struct ChainArgs {
    /// Target item to produce (e.g., "Iron Frame")
    item: String,

    /// Target rate: 60, 60/min, 1/s or 3600/h (default: one machine's output)
    #[arg(short, long, value_parser = parse_rate_arg)]
    rate: Option<f64>,

    /// Read recipes from a JSON file or directory instead of the database
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Column layout strategy
    #[arg(short, long, value_enum, default_value = "breadth")]
    layout: LayoutChoice,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import recipe JSON (a file, or a directory searched recursively)
    Import {
        path: PathBuf,

        /// Clear existing catalog before importing
        #[arg(long)]
        clear: bool,
    },

    /// Calculate the production chain for a target item
    Calc {
        #[command(flatten)]
        chain: ChainArgs,

        /// Rail speed in units/min for the rails-needed column
        #[arg(long)]
        rail: Option<u32>,

        /// Also list diagram columns and bypass routes
        #[arg(short, long)]
        verbose: bool,
    },

    /// Export the laid-out chain graph as JSON
    Graph {
        #[command(flatten)]
        chain: ChainArgs,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List all craftable items
    ListItems,

    /// Show the recipe for a specific item
    Item {
        /// Item name
        name: String,
    },

    /// Load sample data for testing (without a recipe file)
    LoadSample,
}

fn parse_rate_arg(text: &str) -> std::result::Result<f64, String> {
    rate::parse_rate(text).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Init => {
            open_database(&cli.database)?;
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { path, clear } => {
            let mut conn = open_database(&cli.database)?;
            if clear {
                info!("clearing existing catalog");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_to_database(&mut conn, &path)?;
            println!("{}", stats);
        }

        Commands::Calc {
            chain,
            rail,
            verbose,
        } => {
            let catalog = load_catalog(&cli.database, chain.catalog.as_deref());
            let tiers = resolve_tiers(&catalog);
            let plan = run_chain(&catalog, &tiers, &chain)?;

            let rail_speed = rail.unwrap_or(settings.default_rail);
            if !settings.rail_speeds.contains(&rail_speed) {
                warn!(rail_speed, known = ?settings.rail_speeds, "rail speed is not one of the configured speeds");
            }
            let summary = report::summarize_plan(&plan, &catalog, &tiers, &settings.extractors, rail_speed);
            println!("{}", summary);

            if verbose {
                let export = layout_chain(&plan, &tiers, &settings, chain.layout);
                println!("Diagram layout:\n");
                println!("{}", report::format_layout(&export.graph, &export.routing));
            }
        }

        Commands::Graph { chain, output } => {
            let catalog = load_catalog(&cli.database, chain.catalog.as_deref());
            let tiers = resolve_tiers(&catalog);
            let plan = run_chain(&catalog, &tiers, &chain)?;
            let json = layout_chain(&plan, &tiers, &settings, chain.layout).to_json()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Graph written to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::ListItems => {
            let conn = open_database(&cli.database)?;
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Craftable items:");
                for item in items {
                    println!("  {}", item);
                }
            }
        }

        Commands::Item { name } => {
            let conn = open_database(&cli.database)?;
            let catalog = import::catalog_or_empty(db::load_catalog(&conn), "database");
            let tiers = resolve_tiers(&catalog);
            match catalog.recipe(&name) {
                Some(recipe) => {
                    println!("Item: {}", name);
                    println!("  Building: {}", recipe.building);
                    println!("  Output: {} per {}s", recipe.output_qty, recipe.craft_time_s);
                    println!("  Per machine: {:.2}/min", recipe.output_per_minute());
                    println!("  Tier: {}", tiers.get(&name));
                    if !recipe.inputs.is_empty() {
                        println!("  Inputs per craft:");
                        for (input, qty) in &recipe.inputs {
                            println!("    {} x{}", input, qty);
                        }
                    }
                }
                None => println!("'{}' has no recipe (raw material)", name),
            }

            let consumers = db::get_consumers(&conn, &name)?;
            if !consumers.is_empty() {
                println!("  Used by:");
                for consumer in consumers {
                    println!("    {}", consumer);
                }
            }
        }

        Commands::LoadSample => {
            let mut conn = open_database(&cli.database)?;
            let catalog = sample_catalog();
            db::clear_catalog(&conn)?;
            db::store_catalog(&mut conn, &catalog)?;
            println!("Loaded {} sample recipes", catalog.len());
        }
    }

    Ok(())
}

/// Open the catalog database, creating the schema if needed.
fn open_database(path: &Path) -> CalcResult<Connection> {
    let conn = Connection::open(path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

/// Read the catalog once, from a recipe file if given, else from the database.
///
/// The database is only touched when no recipe file is given.
fn load_catalog(database: &Path, path: Option<&Path>) -> Catalog {
    let catalog = match path {
        Some(path) => import::catalog_or_empty(
            import::load_catalog_path(path).map(|(catalog, _)| catalog),
            &path.display().to_string(),
        ),
        None => import::catalog_or_empty(
            open_database(database).and_then(|conn| db::load_catalog(&conn)),
            "database",
        ),
    };
    if catalog.is_empty() {
        warn!("catalog is empty; every item will be treated as raw");
    }
    catalog
}

fn run_chain(catalog: &Catalog, tiers: &TierMap, chain: &ChainArgs) -> Result<ProductionPlan> {
    let rate = match chain.rate {
        Some(rate) => rate,
        None => match catalog.natural_rate(&chain.item) {
            Some(rate) if rate > 0.0 => rate,
            _ => bail!("'{}' has no recipe; pass --rate explicitly", chain.item),
        },
    };
    info!(item = %chain.item, rate, "expanding production chain");
    Ok(calculator::expand(catalog, tiers, &chain.item, rate)?)
}

fn layout_chain(
    plan: &ProductionPlan,
    tiers: &TierMap,
    settings: &Settings,
    choice: LayoutChoice,
) -> GraphExport {
    let strategy = match choice {
        LayoutChoice::Breadth => LayoutStrategy::Breadth,
        LayoutChoice::Tier => LayoutStrategy::TierBiased {
            tiers,
            policy: &settings.placement,
        },
    };
    let depths = assign_depths(plan, strategy);
    GraphExport::new(plan, &depths)
}

/// Small built-in catalog for trying the calculator without a recipe file
fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();
    let recipes: [(&str, &str, f64, f64, &[(&str, f64)]); 9] = [
        ("Iron Bar", "Smelter", 1.0, 2.0, &[("Iron Ore", 1.0)]),
        ("Copper Bar", "Smelter", 1.0, 2.0, &[("Copper Ore", 1.0)]),
        ("Steel Bar", "Furnace", 1.0, 4.0, &[("Iron Bar", 1.0), ("Calcium Ore", 1.0)]),
        ("Basic Building Material", "Fabricator", 1.0, 1.0, &[]),
        ("Iron Frame", "Fabricator", 1.0, 3.0, &[("Iron Bar", 2.0), ("Basic Building Material", 1.0)]),
        ("Copper Wire", "Fabricator", 2.0, 2.0, &[("Copper Bar", 1.0)]),
        ("Electronics", "Assembler", 1.0, 6.0, &[("Copper Wire", 3.0), ("Iron Frame", 1.0)]),
        ("Helium Cell", "Compounder", 1.0, 8.0, &[("Helium-3", 2.0), ("Steel Bar", 1.0)]),
        (
            "Reactor Core",
            "Mega Press",
            1.0,
            20.0,
            &[("Electronics", 2.0), ("Helium Cell", 1.0), ("Steel Bar", 4.0)],
        ),
    ];

    for (item, building, output_qty, craft_time_s, inputs) in recipes {
        catalog.insert_recipe(
            item,
            Recipe {
                building: building.to_string(),
                output_qty,
                craft_time_s,
                inputs: inputs
                    .iter()
                    .map(|(input, qty)| (input.to_string(), *qty))
                    .collect::<BTreeMap<_, _>>(),
                tier_hint: None,
            },
        );
    }
    catalog.insert_tier_hint("Calcium Ore", 0);
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_file_catalog_leaves_database_alone() {
        let dir = tempfile::tempdir().unwrap();
        let recipes = dir.path().join("recipes.json");
        std::fs::write(
            &recipes,
            r#"{ "Iron Bar": { "building": "Smelter", "output": 1, "time": 2, "inputs": { "Iron Ore": 1 } } }"#,
        )
        .unwrap();
        let database = dir.path().join("recipes.db");

        let catalog = load_catalog(&database, Some(recipes.as_path()));

        assert_eq!(catalog.len(), 1);
        assert!(!database.exists());
    }

    #[test]
    fn database_catalog_is_read_when_no_file_is_given() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("recipes.db");
        let mut conn = open_database(&database).unwrap();
        db::store_catalog(&mut conn, &sample_catalog()).unwrap();
        drop(conn);

        let catalog = load_catalog(&database, None);
        assert_eq!(catalog.len(), sample_catalog().len());
    }
}
