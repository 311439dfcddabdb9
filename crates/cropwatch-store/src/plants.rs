//! Plant records.

use cropwatch_core::Plant;
use rusqlite::{params, OptionalExtension, Row};

use crate::store::{new_id, FarmStore, StoreError};

/// Id and name of a plant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantName {
    pub id: String,
    pub name: String,
}

fn plant_from_row(row: &Row<'_>) -> rusqlite::Result<Plant> {
    Ok(Plant {
        id: row.get(0)?,
        name: row.get(1)?,
        life_cycle: row.get(2)?,
    })
}

impl FarmStore {
    /// Creates a plant with a fresh id.
    pub fn create_plant(&self, name: &str, life_cycle: i64) -> Result<Plant, StoreError> {
        let plant = Plant::new(new_id(), name, life_cycle);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO plants (id, name, life_cycle) VALUES (?1, ?2, ?3)",
            params![plant.id, plant.name, plant.life_cycle],
        )?;
        Ok(plant)
    }

    pub fn get_plant(&self, id: &str) -> Result<Option<Plant>, StoreError> {
        let conn = self.lock()?;
        let plant = conn
            .query_row(
                "SELECT id, name, life_cycle FROM plants WHERE id = ?1",
                params![id],
                plant_from_row,
            )
            .optional()?;
        Ok(plant)
    }

    /// Finds a plant by exact name. When names repeat, the earliest created wins.
    pub fn find_plant_by_name(&self, name: &str) -> Result<Option<Plant>, StoreError> {
        let conn = self.lock()?;
        let plant = conn
            .query_row(
                "SELECT id, name, life_cycle FROM plants WHERE name = ?1 ORDER BY rowid LIMIT 1",
                params![name],
                plant_from_row,
            )
            .optional()?;
        Ok(plant)
    }

    /// Lists every plant's id and name in creation order.
    pub fn list_plant_names(&self) -> Result<Vec<PlantName>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name FROM plants ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(PlantName {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Replaces the provided fields; absent fields keep their value.
    ///
    /// Returns `None` if no plant has this id. Assignments already referencing
    /// the plant keep their harvest dates.
    pub fn update_plant(
        &self,
        id: &str,
        name: Option<&str>,
        life_cycle: Option<i64>,
    ) -> Result<Option<Plant>, StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE plants SET name = COALESCE(?1, name), life_cycle = COALESCE(?2, life_cycle)
             WHERE id = ?3",
            params![name, life_cycle, id],
        )?;
        if updated == 0 {
            return Ok(None);
        }

        let plant = conn.query_row(
            "SELECT id, name, life_cycle FROM plants WHERE id = ?1",
            params![id],
            plant_from_row,
        )?;
        Ok(Some(plant))
    }

    /// Deletes a plant. Returns false if it did not exist.
    ///
    /// Farm assignments referencing the plant are left in place.
    pub fn delete_plant(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM plants WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
