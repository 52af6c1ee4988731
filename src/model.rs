use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Operating period of a student or route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    #[default]
    #[serde(alias = "manha")]
    Morning,
    #[serde(alias = "tarde")]
    Afternoon,
    #[serde(alias = "noite")]
    Night,
}

impl Shift {
    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Afternoon => "afternoon",
            Shift::Night => "night",
        }
    }

    /// Accepts the canonical names and the Portuguese ones found in older data.
    pub fn parse(raw: &str) -> Option<Shift> {
        match raw.trim().to_lowercase().as_str() {
            "morning" | "manha" | "manhã" => Some(Shift::Morning),
            "afternoon" | "tarde" => Some(Shift::Afternoon),
            "night" | "noite" => Some(Shift::Night),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    #[default]
    #[serde(alias = "ativo")]
    Active,
    #[serde(alias = "manutencao")]
    Maintenance,
    #[serde(alias = "inativo")]
    Inactive,
}

impl VehicleStatus {
    pub const ALL_STR: &'static [&'static str] = &["active", "maintenance", "inactive"];

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Inactive => "inactive",
        }
    }

    pub fn parse(raw: &str) -> Option<VehicleStatus> {
        match raw.trim().to_lowercase().as_str() {
            "active" | "ativo" => Some(VehicleStatus::Active),
            "maintenance" | "manutencao" | "manutenção" => Some(VehicleStatus::Maintenance),
            "inactive" | "inativo" => Some(VehicleStatus::Inactive),
            _ => None,
        }
    }

    pub fn is_operational(self) -> bool {
        self == VehicleStatus::Active
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                <$ty>::parse(raw).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {} value: {}", stringify!($ty), raw).into())
                })
            }
        }
    };
}

sql_text_enum!(Shift);
sql_text_enum!(VehicleStatus);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub birth_date: Option<String>,
    pub school: String,
    pub shift: Shift,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub document: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub full_name: String,
    pub school: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub shift: Shift,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub guardian_phone: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub full_name: Option<String>,
    pub school: Option<String>,
    pub birth_date: Option<String>,
    pub shift: Option<Shift>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub document: Option<String>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub plate: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub capacity: i64,
    pub color: String,
    pub driver_name: String,
    pub driver_license: String,
    pub driver_phone: String,
    pub status: VehicleStatus,
    pub chassis: Option<String>,
    pub registration: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub plate: String,
    #[serde(default)]
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub driver_license: String,
    #[serde(default)]
    pub driver_phone: String,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub chassis: Option<String>,
    #[serde(default)]
    pub registration: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePatch {
    pub plate: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub capacity: Option<i64>,
    pub color: Option<String>,
    pub driver_name: Option<String>,
    pub driver_license: Option<String>,
    pub driver_phone: Option<String>,
    pub status: Option<VehicleStatus>,
    pub chassis: Option<String>,
    pub registration: Option<String>,
    pub notes: Option<String>,
}

/// Subset of the assigned vehicle shown alongside a route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteVehicle {
    pub plate: String,
    pub make: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub shift: Shift,
    pub start_time: String,
    pub end_time: Option<String>,
    pub active: bool,
    pub vehicle_id: Option<String>,
    pub vehicle: Option<RouteVehicle>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shift: Shift,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub shift: Option<Shift>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub active: Option<bool>,
    pub vehicle_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub student_id: String,
    pub route_id: String,
    pub boarding_point: String,
    pub boarding_time: Option<String>,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub student_id: String,
    pub route_id: String,
    pub boarding_point: String,
    #[serde(default)]
    pub boarding_time: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringLog {
    pub id: String,
    pub route_id: String,
    pub student_id: Option<String>,
    pub user_id: Option<String>,
    pub event_type: String,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewMonitoringLog {
    pub route_id: String,
    pub student_id: Option<String>,
    pub user_id: Option<String>,
    pub event_type: String,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub description: String,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewIncident {
    pub description: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub id: String,
    pub file_name: String,
    pub stored_path: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

/// Current time in the format every `created_at`/`updated_at` column uses.
pub fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
