use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{ensure_deleted, non_blank, required, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, NewVehicle, Vehicle, VehiclePatch, VehicleStatus};
use crate::search::Searchable;

const COLUMNS: &str = "id, plate, make, model, year, capacity, color, driver_name, driver_license,
     driver_phone, status, chassis, registration, notes, created_at, updated_at";

pub struct Vehicles<'c> {
    conn: &'c Connection,
}

/// Plates are compared and stored upper-case without surrounding blanks.
fn normalize_plate(plate: &str) -> StoreResult<String> {
    Ok(required(plate, "plate")?.to_uppercase())
}

impl<'c> Vehicles<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Vehicles { conn }
    }

    pub fn update(&self, id: &str, patch: &VehiclePatch) -> StoreResult<Vehicle> {
        self.get(id)?;
        let plate = patch.plate.as_deref().map(normalize_plate).transpose()?;
        if matches!(patch.capacity, Some(c) if c < 0) {
            return Err(StoreError::Invalid("capacity must not be negative".into()));
        }
        self.conn
            .execute(
                "UPDATE vehicles SET
                   plate = COALESCE(?, plate),
                   make = COALESCE(?, make),
                   model = COALESCE(?, model),
                   year = COALESCE(?, year),
                   capacity = COALESCE(?, capacity),
                   color = COALESCE(?, color),
                   driver_name = COALESCE(?, driver_name),
                   driver_license = COALESCE(?, driver_license),
                   driver_phone = COALESCE(?, driver_phone),
                   status = COALESCE(?, status),
                   chassis = COALESCE(?, chassis),
                   registration = COALESCE(?, registration),
                   notes = COALESCE(?, notes),
                   updated_at = ?
                 WHERE id = ?",
                params![
                    plate,
                    patch.make,
                    patch.model,
                    patch.year,
                    patch.capacity,
                    patch.color,
                    patch.driver_name,
                    patch.driver_license,
                    patch.driver_phone,
                    patch.status,
                    non_blank(&patch.chassis),
                    non_blank(&patch.registration),
                    non_blank(&patch.notes),
                    now_stamp(),
                    id,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "plate"))?;
        self.get(id)
    }

    pub fn statuses(&self) -> StoreResult<Vec<VehicleStatus>> {
        let mut stmt = self.conn.prepare("SELECT status FROM vehicles")?;
        let statuses = stmt
            .query_map([], |r| r.get::<_, VehicleStatus>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: r.get(0)?,
        plate: r.get(1)?,
        make: r.get(2)?,
        model: r.get(3)?,
        year: r.get(4)?,
        capacity: r.get(5)?,
        color: r.get(6)?,
        driver_name: r.get(7)?,
        driver_license: r.get(8)?,
        driver_phone: r.get(9)?,
        status: r.get(10)?,
        chassis: r.get(11)?,
        registration: r.get(12)?,
        notes: r.get(13)?,
        created_at: r.get(14)?,
        updated_at: r.get(15)?,
    })
}

impl Repository for Vehicles<'_> {
    type Record = Vehicle;
    type New = NewVehicle;

    fn list(&self) -> StoreResult<Vec<Vehicle>> {
        let sql = format!("SELECT {COLUMNS} FROM vehicles ORDER BY plate");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Vehicle> {
        let sql = format!("SELECT {COLUMNS} FROM vehicles WHERE id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("vehicle"))
    }

    fn create(&self, new: &NewVehicle) -> StoreResult<Vehicle> {
        let plate = normalize_plate(&new.plate)?;
        if new.capacity < 0 {
            return Err(StoreError::Invalid("capacity must not be negative".into()));
        }
        let id = Uuid::new_v4().to_string();
        let now = now_stamp();
        self.conn
            .execute(
                "INSERT INTO vehicles(
                   id, plate, make, model, year, capacity, color, driver_name, driver_license,
                   driver_phone, status, chassis, registration, notes, created_at, updated_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    plate,
                    new.make.trim(),
                    new.model.trim(),
                    new.year,
                    new.capacity,
                    new.color.trim(),
                    new.driver_name.trim(),
                    new.driver_license.trim(),
                    new.driver_phone.trim(),
                    new.status,
                    non_blank(&new.chassis),
                    non_blank(&new.registration),
                    non_blank(&new.notes),
                    now,
                    now,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "plate"))?;
        self.get(&id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM vehicles WHERE id = ?", [id])
            .map_err(|e| StoreError::from_delete(e, "vehicle"))?;
        ensure_deleted(changed, "vehicle")
    }
}

impl Searchable for Vehicle {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.plate.as_str()),
            Some(self.model.as_str()),
            Some(self.make.as_str()),
            Some(self.driver_name.as_str()),
        ]
    }
}
