//! Farm records and their embedded plant assignments.

use chrono::{DateTime, Utc};
use cropwatch_core::{
    Farm, HealthStatus, Plant, PlantAssignment, PlantHealth, ResolvedAssignment, ResolvedFarm,
};
use rusqlite::{params, Connection, ErrorCode};
use tracing::debug;

use crate::store::{new_id, FarmStore, StoreError};

struct FarmHeader {
    id: String,
    serial_number: String,
    name: String,
    owner_id: String,
}

const FARM_COLUMNS: &str = "SELECT id, serial_number, name, owner_id FROM farms";

fn query_headers(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<FarmHeader>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok(FarmHeader {
            id: row.get(0)?,
            serial_number: row.get(1)?,
            name: row.get(2)?,
            owner_id: row.get(3)?,
        })
    })?;

    let mut headers = Vec::new();
    for row in rows {
        headers.push(row?);
    }
    Ok(headers)
}

fn load_assignments(conn: &Connection, farm_id: &str) -> Result<Vec<PlantAssignment>, StoreError> {
    let mut stmt = conn.prepare(
        r#"SELECT plant_id, plant_count, harvest_date, status
           FROM plant_assignments WHERE farm_id = ?1 ORDER BY position"#,
    )?;
    let rows = stmt.query_map(params![farm_id], |row| {
        let plant_id: String = row.get(0)?;
        let plant_count: u32 = row.get(1)?;
        let harvest_date: DateTime<Utc> = row.get(2)?;
        let status: String = row.get(3)?;
        Ok((plant_id, plant_count, harvest_date, status))
    })?;

    let mut assignments = Vec::new();
    for row in rows {
        let (plant_id, plant_count, harvest_date, status) = row?;
        assignments.push(PlantAssignment {
            plant_id,
            plant_count,
            plant_health: PlantHealth::restore(harvest_date, status.parse::<HealthStatus>()?),
        });
    }
    Ok(assignments)
}

fn load_resolved(conn: &Connection, farm_id: &str) -> Result<Vec<ResolvedAssignment>, StoreError> {
    let mut stmt = conn.prepare(
        r#"SELECT a.plant_id, a.plant_count, a.harvest_date, a.status,
                  p.name, p.life_cycle
           FROM plant_assignments a
           LEFT JOIN plants p ON p.id = a.plant_id
           WHERE a.farm_id = ?1
           ORDER BY a.position"#,
    )?;
    let rows = stmt.query_map(params![farm_id], |row| {
        let plant_id: String = row.get(0)?;
        let plant_count: u32 = row.get(1)?;
        let harvest_date: DateTime<Utc> = row.get(2)?;
        let status: String = row.get(3)?;
        let name: Option<String> = row.get(4)?;
        let life_cycle: Option<i64> = row.get(5)?;
        Ok((plant_id, plant_count, harvest_date, status, name, life_cycle))
    })?;

    let mut resolved = Vec::new();
    for row in rows {
        let (plant_id, plant_count, harvest_date, status, name, life_cycle) = row?;
        let plant = match (name, life_cycle) {
            (Some(name), Some(life_cycle)) => Some(Plant::new(plant_id.clone(), name, life_cycle)),
            _ => None,
        };
        resolved.push(ResolvedAssignment {
            assignment: PlantAssignment {
                plant_id,
                plant_count,
                plant_health: PlantHealth::restore(harvest_date, status.parse::<HealthStatus>()?),
            },
            plant,
        });
    }
    Ok(resolved)
}

fn into_farm(conn: &Connection, header: FarmHeader) -> Result<Farm, StoreError> {
    let plants = load_assignments(conn, &header.id)?;
    Ok(Farm {
        id: header.id,
        serial_number: header.serial_number,
        name: header.name,
        owner_id: header.owner_id,
        plants,
    })
}

fn into_resolved(conn: &Connection, header: FarmHeader) -> Result<ResolvedFarm, StoreError> {
    let plants = load_resolved(conn, &header.id)?;
    Ok(ResolvedFarm {
        id: header.id,
        serial_number: header.serial_number,
        name: header.name,
        owner_id: header.owner_id,
        plants,
    })
}

impl FarmStore {
    /// Registers a farm with an empty assignment list.
    pub fn create_farm(&self, serial_number: &str, name: &str, owner_id: &str) -> Result<Farm, StoreError> {
        let farm = Farm::new(new_id(), serial_number, name, owner_id);
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO farms (id, serial_number, name, owner_id) VALUES (?1, ?2, ?3, ?4)",
            params![farm.id, farm.serial_number, farm.name, farm.owner_id],
        );

        match inserted {
            Ok(_) => Ok(farm),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::DuplicateSerial(serial_number.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_farm_by_serial(&self, serial_number: &str) -> Result<Option<Farm>, StoreError> {
        let conn = self.lock()?;
        let header = query_headers(
            &conn,
            &format!("{FARM_COLUMNS} WHERE serial_number = ?1"),
            params![serial_number],
        )?
        .into_iter()
        .next();

        header.map(|h| into_farm(&conn, h)).transpose()
    }

    /// Lists every farm in registration order.
    pub fn list_farms(&self) -> Result<Vec<Farm>, StoreError> {
        let conn = self.lock()?;
        query_headers(&conn, &format!("{FARM_COLUMNS} ORDER BY rowid"), params![])?
            .into_iter()
            .map(|h| into_farm(&conn, h))
            .collect()
    }

    /// Appends an assignment after the farm's last one.
    ///
    /// The position is computed by the insert itself, so concurrent appends
    /// never overwrite each other and existing rows keep their health state.
    pub fn append_assignment(&self, farm_id: &str, assignment: &PlantAssignment) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            r#"INSERT INTO plant_assignments
               (farm_id, position, plant_id, plant_count, harvest_date, status)
               SELECT f.id,
                      (SELECT COALESCE(MAX(position) + 1, 0) FROM plant_assignments WHERE farm_id = f.id),
                      ?2, ?3, ?4, ?5
               FROM farms f WHERE f.id = ?1"#,
            params![
                farm_id,
                assignment.plant_id,
                assignment.plant_count,
                assignment.plant_health.harvest_date,
                assignment.plant_health.status().as_str(),
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::FarmMissing(farm_id.to_string()));
        }

        debug!(farm_id = %farm_id, plant_id = %assignment.plant_id, "Appended assignment");
        Ok(())
    }

    /// Flags every assignment of the farm. Returns how many changed state.
    pub fn flag_farm(&self, farm_id: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let flagged = HealthStatus::Flagged.as_str();
        let changed = conn.execute(
            "UPDATE plant_assignments SET status = ?2 WHERE farm_id = ?1 AND status <> ?2",
            params![farm_id, flagged],
        )?;
        debug!(farm_id = %farm_id, changed, "Flagged farm");
        Ok(changed)
    }

    /// Loads a farm with its plant references expanded.
    pub fn resolve_farm(&self, serial_number: &str) -> Result<Option<ResolvedFarm>, StoreError> {
        let conn = self.lock()?;
        let header = query_headers(
            &conn,
            &format!("{FARM_COLUMNS} WHERE serial_number = ?1"),
            params![serial_number],
        )?
        .into_iter()
        .next();

        header.map(|h| into_resolved(&conn, h)).transpose()
    }

    /// Loads every farm owned by `owner_id`, with plant references expanded.
    pub fn resolve_farms_by_owner(&self, owner_id: &str) -> Result<Vec<ResolvedFarm>, StoreError> {
        let conn = self.lock()?;
        query_headers(
            &conn,
            &format!("{FARM_COLUMNS} WHERE owner_id = ?1 ORDER BY rowid"),
            params![owner_id],
        )?
        .into_iter()
        .map(|h| into_resolved(&conn, h))
        .collect()
    }
}
