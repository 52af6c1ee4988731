//! Typed repositories, one per table.

pub mod assignments;
pub mod incidents;
pub mod monitoring;
pub mod profiles;
pub mod routes;
pub mod students;
pub mod uploads;
pub mod vehicles;

use crate::error::{StoreError, StoreResult};

pub use assignments::Assignments;
pub use incidents::Incidents;
pub use monitoring::MonitoringLogs;
pub use profiles::Profiles;
pub use routes::Routes;
pub use students::Students;
pub use uploads::Uploads;
pub use vehicles::Vehicles;

/// CRUD surface shared by the entity tables. Editable entities add an
/// inherent `update`.
pub trait Repository {
    type Record;
    type New;

    /// Whole collection, ordered by the entity's natural key.
    fn list(&self) -> StoreResult<Vec<Self::Record>>;
    fn get(&self, id: &str) -> StoreResult<Self::Record>;
    fn create(&self, new: &Self::New) -> StoreResult<Self::Record>;
    fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Require a non-blank value, returning it trimmed.
pub(crate) fn required(value: &str, field: &str) -> StoreResult<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(StoreError::Invalid(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

/// Blank optional text is stored as NULL.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn ensure_deleted(changed: usize, entity: &'static str) -> StoreResult<()> {
    if changed == 0 {
        return Err(StoreError::not_found(entity));
    }
    Ok(())
}
