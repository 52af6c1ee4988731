//! Quick-entry forms: field state, submission and the message shown after.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::StoreResult;
use crate::messages;
use crate::model::{NewIncident, NewStudent, NewVehicle};
use crate::store::Repository;

/// Whatever accepts a submitted form. Every repository does.
pub trait Registrar<N> {
    fn register(&self, new: &N) -> StoreResult<()>;
}

impl<R: Repository> Registrar<R::New> for R {
    fn register(&self, new: &R::New) -> StoreResult<()> {
        self.create(new).map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Registered,
    Invalid,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub outcome: Outcome,
    pub message: String,
}

impl Submission {
    fn new(outcome: Outcome, message: &str) -> Self {
        Submission {
            outcome,
            message: message.to_string(),
        }
    }
}

/// Clear the form on success; keep the fields for another try on failure.
fn settle<F: Default>(
    form: &mut F,
    what: &str,
    res: StoreResult<()>,
    ok_msg: &str,
    fail_msg: &str,
) -> Submission {
    match res {
        Ok(()) => {
            *form = F::default();
            Submission::new(Outcome::Registered, ok_msg)
        }
        Err(e) => {
            error!(form = what, error = %e, "registration failed");
            Submission::new(Outcome::Failed, fail_msg)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentForm {
    pub name: String,
    pub course: String,
}

impl StudentForm {
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.course.trim().is_empty()
    }

    /// Invalid forms never reach the registrar.
    pub fn submit<R: Registrar<NewStudent>>(&mut self, registrar: &R) -> Submission {
        if !self.is_valid() {
            return Submission::new(Outcome::Invalid, messages::STUDENT_INVALID);
        }
        let new = NewStudent {
            full_name: self.name.clone(),
            school: self.course.clone(),
            active: true,
            ..Default::default()
        };
        let res = registrar.register(&new);
        settle(
            self,
            "student",
            res,
            messages::STUDENT_REGISTERED,
            messages::STUDENT_FAILED,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleForm {
    pub plate: String,
    pub model: String,
}

impl VehicleForm {
    pub fn submit<R: Registrar<NewVehicle>>(&mut self, registrar: &R) -> Submission {
        let new = NewVehicle {
            plate: self.plate.clone(),
            model: self.model.clone(),
            ..Default::default()
        };
        let res = registrar.register(&new);
        settle(
            self,
            "vehicle",
            res,
            messages::VEHICLE_REGISTERED,
            messages::VEHICLE_FAILED,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentForm {
    pub description: String,
    pub date: String,
}

impl IncidentForm {
    pub fn submit<R: Registrar<NewIncident>>(&mut self, registrar: &R) -> Submission {
        let new = NewIncident {
            description: self.description.clone(),
            date: self.date.clone(),
        };
        let res = registrar.register(&new);
        settle(
            self,
            "incident",
            res,
            messages::INCIDENT_REGISTERED,
            messages::INCIDENT_FAILED,
        )
    }
}
