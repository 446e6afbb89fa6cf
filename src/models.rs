/// Data models for the booking client.
///
/// This module defines the records exchanged with the appointment service
/// and the small enums the lifecycle rules are written against:
/// - AppointmentStatus: the four lifecycle states
/// - Role: who is looking at the appointment
/// - StatusFilter: the dashboard's status dropdown
/// - Action: what the interface may offer for an appointment
/// - Appointment / NewAppointment: stored and to-be-created appointments
/// - Doctor / Patient / Department / Profile: read-only directory records

use crate::error::ModelError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an appointment.
///
/// `Scheduled` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Convert a string to a status. Accepts the wire form in any case.
    pub fn from_string(value: &str) -> Result<Self, ModelError> {
        match value.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "SCHEDULED" => Ok(AppointmentStatus::Scheduled),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "NO_SHOW" => Ok(AppointmentStatus::NoShow),
            _ => Err(ModelError::InvalidStatus(value.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Role of the signed-in viewer, as issued by the backend at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_PATIENT")]
    Patient,
    #[serde(rename = "ROLE_DOCTOR")]
    Doctor,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn from_string(value: &str) -> Result<Self, ModelError> {
        let upper = value.trim().to_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(upper.as_str()) {
            "PATIENT" => Ok(Role::Patient),
            "DOCTOR" => Ok(Role::Doctor),
            "ADMIN" | "ADMINISTRATOR" => Ok(Role::Admin),
            _ => Err(ModelError::InvalidRole(value.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Status dropdown value: everything, or exactly one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl StatusFilter {
    pub fn from_string(value: &str) -> Result<Self, ModelError> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        AppointmentStatus::from_string(value)
            .map(StatusFilter::Only)
            .map_err(|_| ModelError::InvalidFilter(value.to_string()))
    }

    pub fn matches(&self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.pad("all"),
            StatusFilter::Only(status) => f.pad(status.name()),
        }
    }
}

/// Something the interface can offer on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    View,
    MarkCompleted,
    MarkNoShow,
    Cancel,
}

impl Action {
    /// The status this action moves the appointment to, if any.
    pub fn target_status(&self) -> Option<AppointmentStatus> {
        match self {
            Action::View => None,
            Action::MarkCompleted => Some(AppointmentStatus::Completed),
            Action::MarkNoShow => Some(AppointmentStatus::NoShow),
            Action::Cancel => Some(AppointmentStatus::Cancelled),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::View => "View details",
            Action::MarkCompleted => "Mark as completed",
            Action::MarkNoShow => "Mark as no-show",
            Action::Cancel => "Cancel appointment",
        }
    }
}

/// Doctor details embedded in a patient's appointment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// Patient details embedded in a doctor's appointment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    #[serde(default)]
    pub patient_name: Option<String>,
}

/// An appointment as held by the backend.
///
/// Only `status` is ever changed on the client, and only after the backend
/// has acknowledged the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    pub appointment_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub appointment_time: NaiveTime,
    #[serde(default)]
    pub reason_for_visit: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PatientSummary>,
}

impl Appointment {
    pub fn doctor_name(&self) -> &str {
        self.doctor
            .as_ref()
            .and_then(|d| d.full_name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn patient_name(&self) -> &str {
        self.patient
            .as_ref()
            .and_then(|p| p.patient_name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn reason(&self) -> &str {
        match self.reason_for_visit.as_deref() {
            Some(reason) if !reason.trim().is_empty() => reason,
            _ => "Not specified",
        }
    }
}

/// A doctor as listed on the booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
}

/// A registered patient, as listed for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,
    pub patient_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Patient {
    /// Case-insensitive match on name or email.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.patient_name.to_lowercase().contains(&term)
            || self
                .email
                .as_deref()
                .map_or(false, |email| email.to_lowercase().contains(&term))
    }
}

/// Patients whose name or email contains `term`, in listing order.
pub fn search_patients<'a>(patients: &'a [Patient], term: &str) -> Vec<&'a Patient> {
    patients.iter().filter(|p| p.matches(term)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The signed-in user's own profile.
///
/// Patients, doctors and administrators share one shape; fields a role
/// does not have stay `None`. Patients carry `patientName`, staff carry
/// `fullName`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    /// Years of practice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl Profile {
    pub fn name(&self) -> &str {
        self.patient_name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or("")
    }
}

/// A validated request to create an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "time_of_day")]
    pub appointment_time: NaiveTime,
    pub reason_for_visit: String,
    pub status: AppointmentStatus,
}

impl NewAppointment {
    /// Create a new appointment request with validation.
    pub fn new(
        patient_id: i64,
        doctor_id: Option<i64>,
        appointment_date: Option<NaiveDate>,
        appointment_time: Option<NaiveTime>,
        reason: &str,
    ) -> Result<Self, ModelError> {
        let doctor_id = doctor_id.ok_or(ModelError::MissingField("doctor"))?;
        let appointment_date = appointment_date.ok_or(ModelError::MissingField("date"))?;
        let appointment_time = appointment_time.ok_or(ModelError::MissingField("time"))?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ModelError::MissingField("reason for visit"));
        }

        Ok(NewAppointment {
            patient_id,
            doctor_id,
            appointment_date,
            appointment_time,
            reason_for_visit: reason.to_string(),
            status: AppointmentStatus::Scheduled,
        })
    }
}

/// Factory function to build a booking request from raw form input.
pub fn create_new_appointment(
    patient_id: i64,
    doctor_id: &str,
    date: &str,
    time: &str,
    reason: &str,
) -> Result<NewAppointment, ModelError> {
    let doctor_id = parse_optional(doctor_id, "doctor", |v| v.parse::<i64>().ok())?;
    let date = parse_optional(date, "date", |v| {
        NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()
    })?;
    let time = parse_optional(time, "time", time_of_day::parse)?;

    NewAppointment::new(patient_id, doctor_id, date, time, reason)
}

fn parse_optional<T>(
    value: &str,
    field: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ModelError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    parse(value).map(Some).ok_or_else(|| ModelError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// `HH:MM` on the way out; `HH:MM` or `HH:MM:SS` on the way in.
pub(crate) mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(value: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid appointment time '{}'", raw))
        })
    }
}
