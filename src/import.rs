//! Recipe catalog import from JSON files
//!
//! A recipe file is a JSON object mapping item names to entries:
//!
//! ```json
//! {
//!   "Iron Plate": { "building": "Smelter", "output": 1, "time": 2, "inputs": { "Iron Ore": 1 } },
//!   "Calcium Ore": { "tier": 0 },
//!   "_version": "1.4"
//! }
//! ```
//!
//! Keys starting with `_` are internal metadata and skipped. An entry with
//! only a `tier` is a tier hint for a raw material.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::db;
use crate::error::{CalcError, Result};
use crate::models::Recipe;

/// One catalog entry before validation
#[derive(Debug, Deserialize)]
struct RecipeEntry {
    building: Option<String>,
    output: Option<f64>,
    time: Option<f64>,
    #[serde(default)]
    inputs: BTreeMap<String, f64>,
    tier: Option<u32>,
}

/// Find all *.json files below `dir`, sorted for a stable merge order
pub fn find_recipe_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Parse the contents of one recipe file.
///
/// Malformed entries are skipped and counted; only a document that is not a
/// JSON object at all is an error.
pub fn parse_catalog_str(content: &str, source_name: &str) -> Result<(Catalog, ImportStats)> {
    let document: serde_json::Value = serde_json::from_str(content).map_err(|e| CalcError::Catalog {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    })?;
    let serde_json::Value::Object(entries) = document else {
        return Err(CalcError::Catalog {
            source_name: source_name.to_string(),
            detail: "top level is not an object".to_string(),
        });
    };

    let mut catalog = Catalog::new();
    let mut stats = ImportStats::default();

    for (name, value) in entries {
        if name.starts_with('_') {
            stats.internal_skipped += 1;
            continue;
        }

        let entry: RecipeEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(source = source_name, item = %name, error = %e, "skipping malformed entry");
                stats.malformed += 1;
                continue;
            }
        };

        match entry {
            RecipeEntry {
                building: Some(building),
                output: Some(output_qty),
                time: Some(craft_time_s),
                inputs,
                tier,
            } => {
                let recipe = Recipe {
                    building,
                    output_qty,
                    craft_time_s,
                    inputs,
                    tier_hint: tier,
                };
                if catalog.insert_recipe(name.clone(), recipe) {
                    stats.recipes += 1;
                } else {
                    warn!(source = source_name, item = %name, "skipping recipe without a positive output rate");
                    stats.malformed += 1;
                }
            }
            RecipeEntry {
                building: None,
                output: None,
                time: None,
                tier: Some(tier),
                ..
            } => {
                catalog.insert_tier_hint(name, tier);
                stats.tier_hints += 1;
            }
            _ => {
                warn!(source = source_name, item = %name, "skipping incomplete recipe");
                stats.malformed += 1;
            }
        }
    }

    Ok((catalog, stats))
}

/// Read and parse a single recipe file
pub fn parse_recipe_file(path: &Path) -> Result<(Catalog, ImportStats)> {
    let content = fs::read_to_string(path).map_err(|e| CalcError::Catalog {
        source_name: path.display().to_string(),
        detail: e.to_string(),
    })?;
    let (catalog, mut stats) = parse_catalog_str(&content, &path.display().to_string())?;
    stats.files = 1;
    Ok((catalog, stats))
}

/// Load a catalog from a JSON file or a directory of JSON files.
///
/// Files are merged in path order; later files win on duplicate items.
pub fn load_catalog_path(path: &Path) -> Result<(Catalog, ImportStats)> {
    let files = if path.is_dir() {
        find_recipe_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut catalog = Catalog::new();
    let mut stats = ImportStats::default();
    for file in &files {
        match parse_recipe_file(file) {
            Ok((parsed, file_stats)) => {
                info!(
                    file = %file.display(),
                    recipes = file_stats.recipes,
                    hints = file_stats.tier_hints,
                    "parsed recipe file"
                );
                catalog.merge(parsed);
                stats.absorb(&file_stats);
            }
            Err(e) if path.is_dir() => {
                warn!(file = %file.display(), error = %e, "skipping unreadable recipe file");
                stats.errors += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok((catalog, stats))
}

/// Import recipe files into the catalog store
pub fn import_to_database(conn: &mut Connection, path: &Path) -> Result<ImportStats> {
    info!(path = %path.display(), "importing recipes");
    let (catalog, stats) = load_catalog_path(path)?;
    db::store_catalog(conn, &catalog)?;
    Ok(stats)
}

/// Degrade a failed catalog read to an empty catalog.
///
/// The core treats a missing catalog as "everything is raw"; the failure is
/// logged here and the caller decides whether to surface it further.
pub fn catalog_or_empty(result: Result<Catalog>, source_name: &str) -> Catalog {
    match result {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(source = source_name, error = %e, "catalog unavailable; continuing with an empty catalog");
            Catalog::new()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub recipes: usize,
    pub tier_hints: usize,
    pub internal_skipped: usize,
    pub malformed: usize,
    pub errors: usize,
}

impl ImportStats {
    fn absorb(&mut self, other: &ImportStats) {
        self.files += other.files;
        self.recipes += other.recipes;
        self.tier_hints += other.tier_hints;
        self.internal_skipped += other.internal_skipped;
        self.malformed += other.malformed;
        self.errors += other.errors;
    }
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} recipes and {} tier hints from {} files. Internal keys skipped: {}, Malformed: {}, Errors: {}",
            self.recipes, self.tier_hints, self.files, self.internal_skipped, self.malformed, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemSource;

    const SAMPLE: &str = r#"{
        "Iron Plate": { "building": "Smelter", "output": 1, "time": 2, "inputs": { "Iron Ore": 1 } },
        "Basic Building Material": { "building": "Fabricator", "output": 1, "time": 1, "tier": 1 },
        "Calcium Ore": { "tier": 0 },
        "_meta": { "version": 3 },
        "Broken": { "building": "Smelter", "output": "lots" },
        "Half": { "building": "Smelter" },
        "Zero": { "building": "Smelter", "output": 0, "time": 1 }
    }"#;

    #[test]
    fn parses_recipes_hints_and_skips_the_rest() {
        let (catalog, stats) = parse_catalog_str(SAMPLE, "sample").unwrap();

        assert_eq!(stats.recipes, 2);
        assert_eq!(stats.tier_hints, 1);
        assert_eq!(stats.internal_skipped, 1);
        assert_eq!(stats.malformed, 3);

        let plate = catalog.recipe("Iron Plate").unwrap();
        assert_eq!(plate.building, "Smelter");
        assert_eq!(plate.inputs["Iron Ore"], 1.0);
        assert!(catalog.recipe("Basic Building Material").unwrap().inputs.is_empty());
        assert_eq!(catalog.raw_tier_hints().get("Calcium Ore"), Some(&0));
        assert_eq!(catalog.lookup("_meta"), ItemSource::Raw);
    }

    #[test]
    fn non_object_document_is_a_catalog_error() {
        assert!(matches!(
            parse_catalog_str("[1, 2]", "list"),
            Err(CalcError::Catalog { .. })
        ));
        assert!(matches!(
            parse_catalog_str("{ not json", "broken"),
            Err(CalcError::Catalog { .. })
        ));
    }

    #[test]
    fn failed_read_degrades_to_empty_catalog() {
        let missing = load_catalog_path(Path::new("/definitely/not/here.json")).map(|(c, _)| c);
        assert!(catalog_or_empty(missing, "missing").is_empty());
    }

    #[test]
    fn directory_import_merges_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{ "Gear": { "building": "Old", "output": 1, "time": 1 } }"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested").join("b.json"),
            r#"{ "Gear": { "building": "New", "output": 1, "time": 1 }, "Rod": { "building": "Press", "output": 2, "time": 1 } }"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("c.json"), "not json").unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_to_database(&mut conn, dir.path()).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.recipes, 3);
        assert_eq!(stats.errors, 1);
        let catalog = db::load_catalog(&conn).unwrap();
        assert_eq!(catalog.recipe("Gear").unwrap().building, "New");
        assert_eq!(catalog.len(), 2);
    }
}
