pub mod assignments;
pub mod core;
pub mod incidents;
pub mod monitoring;
pub mod profiles;
pub mod reports;
pub mod routes;
pub mod session;
pub mod settings;
pub mod students;
pub mod uploads;
pub mod vehicles;
