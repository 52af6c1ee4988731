use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

use super::{ensure_deleted, non_blank, required, Repository};
use crate::error::{StoreError, StoreResult};
use crate::model::{now_stamp, NewRoute, Route, RoutePatch, RouteVehicle};
use crate::search::Searchable;

const SELECT: &str = "SELECT r.id, r.name, r.description, r.shift, r.start_time, r.end_time,
            r.active, r.vehicle_id, r.notes, r.created_at, r.updated_at,
            v.plate, v.make, v.model
     FROM routes r
     LEFT JOIN vehicles v ON v.id = r.vehicle_id";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCapacity {
    pub route_id: String,
    /// Seats of the assigned vehicle; `None` when no vehicle is assigned.
    pub capacity: Option<i64>,
    pub assigned: i64,
    pub available: Option<i64>,
}

pub struct Routes<'c> {
    conn: &'c Connection,
}

impl<'c> Routes<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Routes { conn }
    }

    /// An empty `vehicleId` in the patch unassigns the vehicle.
    pub fn update(&self, id: &str, patch: &RoutePatch) -> StoreResult<Route> {
        self.get(id)?;
        let name = patch
            .name
            .as_deref()
            .map(|v| required(v, "name"))
            .transpose()?;
        let start_time = patch
            .start_time
            .as_deref()
            .map(|v| required(v, "startTime"))
            .transpose()?;
        let vehicle_id = patch.vehicle_id.as_deref().map(str::trim);
        self.conn
            .execute(
                "UPDATE routes SET
                   name = COALESCE(?1, name),
                   description = COALESCE(?2, description),
                   shift = COALESCE(?3, shift),
                   start_time = COALESCE(?4, start_time),
                   end_time = COALESCE(?5, end_time),
                   active = COALESCE(?6, active),
                   vehicle_id = CASE WHEN ?7 IS NULL THEN vehicle_id ELSE NULLIF(?7, '') END,
                   notes = COALESCE(?8, notes),
                   updated_at = ?9
                 WHERE id = ?10",
                params![
                    name,
                    non_blank(&patch.description),
                    patch.shift,
                    start_time,
                    non_blank(&patch.end_time),
                    patch.active,
                    vehicle_id,
                    non_blank(&patch.notes),
                    now_stamp(),
                    id,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "route"))?;
        self.get(id)
    }

    pub fn active_flags(&self) -> StoreResult<Vec<bool>> {
        let mut stmt = self.conn.prepare("SELECT active FROM routes")?;
        let flags = stmt
            .query_map([], |r| r.get::<_, bool>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(flags)
    }

    /// Seats left on the route's vehicle after active assignments.
    pub fn capacity(&self, id: &str) -> StoreResult<RouteCapacity> {
        let route = self.get(id)?;
        let capacity: Option<i64> = match route.vehicle_id.as_deref() {
            Some(vid) => self
                .conn
                .query_row("SELECT capacity FROM vehicles WHERE id = ?", [vid], |r| {
                    r.get(0)
                })
                .optional()?,
            None => None,
        };
        let assigned: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM student_routes WHERE route_id = ? AND active = 1",
            [id],
            |r| r.get(0),
        )?;
        Ok(RouteCapacity {
            route_id: route.id,
            capacity,
            assigned,
            available: capacity.map(|c| (c - assigned).max(0)),
        })
    }
}

fn read_row(r: &Row<'_>) -> rusqlite::Result<Route> {
    let plate: Option<String> = r.get(11)?;
    let vehicle = match plate {
        Some(plate) => Some(RouteVehicle {
            plate,
            make: r.get(12)?,
            model: r.get(13)?,
        }),
        None => None,
    };
    Ok(Route {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        shift: r.get(3)?,
        start_time: r.get(4)?,
        end_time: r.get(5)?,
        active: r.get(6)?,
        vehicle_id: r.get(7)?,
        vehicle,
        notes: r.get(8)?,
        created_at: r.get(9)?,
        updated_at: r.get(10)?,
    })
}

impl Repository for Routes<'_> {
    type Record = Route;
    type New = NewRoute;

    fn list(&self) -> StoreResult<Vec<Route>> {
        let sql = format!("{SELECT} ORDER BY r.name, r.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get(&self, id: &str) -> StoreResult<Route> {
        let sql = format!("{SELECT} WHERE r.id = ?");
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found("route"))
    }

    fn create(&self, new: &NewRoute) -> StoreResult<Route> {
        let name = required(&new.name, "name")?;
        let start_time = required(&new.start_time, "startTime")?;
        let id = Uuid::new_v4().to_string();
        let now = now_stamp();
        self.conn
            .execute(
                "INSERT INTO routes(
                   id, name, description, shift, start_time, end_time, active, vehicle_id,
                   notes, created_at, updated_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id,
                    name,
                    non_blank(&new.description),
                    new.shift,
                    start_time,
                    non_blank(&new.end_time),
                    new.active,
                    non_blank(&new.vehicle_id),
                    non_blank(&new.notes),
                    now,
                    now,
                ],
            )
            .map_err(|e| StoreError::from_write(e, "route"))?;
        self.get(&id)
    }

    /// Removes the route's student assignments with it. Routes with
    /// monitoring history cannot be deleted.
    fn delete(&self, id: &str) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM student_routes WHERE route_id = ?", [id])
            .map_err(|e| StoreError::from_delete(e, "route"))?;
        let changed = tx
            .execute("DELETE FROM routes WHERE id = ?", [id])
            .map_err(|e| StoreError::from_delete(e, "route"))?;
        ensure_deleted(changed, "route")?;
        tx.commit()?;
        Ok(())
    }
}

impl Searchable for Route {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.name.as_str()),
            self.description.as_deref(),
            self.vehicle.as_ref().map(|v| v.plate.as_str()),
        ]
    }
}
