//! Database schema and operations for the recipe catalog cache

use std::collections::BTreeMap;

use rusqlite::Connection;
use tracing::warn;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::Recipe;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per craftable item
        CREATE TABLE IF NOT EXISTS recipes (
            item TEXT PRIMARY KEY,
            building TEXT NOT NULL,
            output_qty REAL NOT NULL,
            craft_time_s REAL NOT NULL,
            tier_hint INTEGER
        );

        -- Inputs consumed per craft
        CREATE TABLE IF NOT EXISTS recipe_inputs (
            item TEXT NOT NULL,
            input_item TEXT NOT NULL,
            qty REAL NOT NULL,
            PRIMARY KEY (item, input_item)
        );

        -- Explicit tiers for raw materials
        CREATE TABLE IF NOT EXISTS tier_hints (
            item TEXT PRIMARY KEY,
            tier INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_inputs_input ON recipe_inputs(input_item);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a recipe together with its inputs
pub fn upsert_recipe(conn: &Connection, item: &str, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (item, building, output_qty, craft_time_s, tier_hint)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            item,
            &recipe.building,
            recipe.output_qty,
            recipe.craft_time_s,
            recipe.tier_hint,
        ),
    )?;
    conn.execute("DELETE FROM recipe_inputs WHERE item = ?1", [item])?;
    for (input, qty) in &recipe.inputs {
        conn.execute(
            "INSERT INTO recipe_inputs (item, input_item, qty) VALUES (?1, ?2, ?3)",
            (item, input, qty),
        )?;
    }
    Ok(())
}

pub fn upsert_tier_hint(conn: &Connection, item: &str, tier: u32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO tier_hints (item, tier) VALUES (?1, ?2)",
        (item, tier),
    )?;
    Ok(())
}

/// Write a whole catalog in one transaction
pub fn store_catalog(conn: &mut Connection, catalog: &Catalog) -> Result<()> {
    let tx = conn.transaction()?;
    for (item, recipe) in catalog.recipes() {
        upsert_recipe(&tx, item, recipe)?;
    }
    for (item, tier) in catalog.raw_tier_hints() {
        upsert_tier_hint(&tx, item, *tier)?;
    }
    tx.commit()?;
    Ok(())
}

/// Clear all catalog data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM tier_hints;
        "#,
    )?;
    Ok(())
}

/// Read the stored catalog
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let mut inputs: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT item, input_item, qty FROM recipe_inputs")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;
    for row in rows {
        let (item, input, qty) = row?;
        inputs.entry(item).or_default().insert(input, qty);
    }

    let mut catalog = Catalog::new();
    let mut stmt = conn.prepare(
        "SELECT item, building, output_qty, craft_time_s, tier_hint FROM recipes ORDER BY item",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            Recipe {
                building: row.get(1)?,
                output_qty: row.get(2)?,
                craft_time_s: row.get(3)?,
                inputs: BTreeMap::new(),
                tier_hint: row.get(4)?,
            },
        ))
    })?;
    for row in rows {
        let (item, mut recipe) = row?;
        recipe.inputs = inputs.remove(&item).unwrap_or_default();
        if !catalog.insert_recipe(item.clone(), recipe) {
            warn!(item, "skipping stored recipe without a positive output rate");
        }
    }

    let mut stmt = conn.prepare("SELECT item, tier FROM tier_hints")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;
    for row in rows {
        let (item, tier) = row?;
        catalog.insert_tier_hint(item, tier);
    }

    Ok(catalog)
}

/// List all craftable items
pub fn list_items(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT item FROM recipes ORDER BY item COLLATE NOCASE")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Items whose recipes consume `item`
pub fn get_consumers(conn: &Connection, item: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT item FROM recipe_inputs WHERE input_item = ?1 ORDER BY item")?;

    let rows = stmt.query_map([item], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
