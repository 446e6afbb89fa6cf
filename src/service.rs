/// Appointment service client.
///
/// `AppointmentService` is the contract the rest of the crate programs
/// against; `HttpAppointmentService` implements it over the backend's
/// REST API with a blocking reqwest client. No call is ever retried.

use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::models::{
    Appointment, AppointmentStatus, Department, Doctor, NewAppointment, Patient, Profile, Role,
};
use crate::session::{LoginResponse, Session};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Operations the booking client needs from the backend.
pub trait AppointmentService {
    fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ServiceError>;

    fn list_doctors(&self) -> Result<Vec<Doctor>, ServiceError>;

    fn list_appointments_for_patient(
        &self,
        session: &Session,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, ServiceError>;

    fn list_appointments_for_doctor(
        &self,
        session: &Session,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, ServiceError>;

    /// Every appointment, for administrators.
    fn list_all_appointments(&self, session: &Session) -> Result<Vec<Appointment>, ServiceError>;

    fn update_status(
        &self,
        session: &Session,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, ServiceError>;

    fn create_appointment(
        &self,
        session: &Session,
        request: &NewAppointment,
    ) -> Result<Appointment, ServiceError>;

    /// Mark the signed-in doctor as taking, or not taking, new bookings.
    fn set_availability(&self, session: &Session, available: bool) -> Result<(), ServiceError>;

    fn list_patients(&self, session: &Session) -> Result<Vec<Patient>, ServiceError>;

    fn list_departments(&self, session: &Session) -> Result<Vec<Department>, ServiceError>;

    /// The signed-in user's profile, from the endpoint for their role.
    fn get_profile(&self, session: &Session) -> Result<Profile, ServiceError>;
}

/// Profile endpoint for each role.
fn profile_path(role: Role) -> &'static str {
    match role {
        Role::Patient => "/api/patient/profile",
        Role::Doctor => "/api/doctor/profile",
        Role::Admin => "/api/admin/profile",
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StatusUpdateRequest {
    status: AppointmentStatus,
}

#[derive(Serialize)]
struct AvailabilityRequest {
    available: bool,
}

/// Error body the backend sends with non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// REST client for the hospital booking backend.
pub struct HttpAppointmentService {
    config: ClientConfig,
    client: Client,
}

impl HttpAppointmentService {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Ok(HttpAppointmentService { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.bearer_auth(session.token())
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, ServiceError> {
        let response = builder.send().map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = error_message(&body, status);
        warn!(status = status.as_u16(), %message, "appointment service rejected request");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ServiceError::Unauthorized(message));
        }
        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ServiceError> {
        self.send(builder)?
            .json::<T>()
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    fn transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.config.timeout_secs)
        } else if e.is_connect() {
            ServiceError::Connection(self.config.base_url.clone())
        } else {
            ServiceError::Http(e.to_string())
        }
    }
}

/// Pull a human-readable message out of an error response body.
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error.or(parsed.message) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

impl AppointmentService for HttpAppointmentService {
    fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let url = self.config.endpoint("/api/auth/login");
        let response: LoginResponse = self
            .send_json(self.client.post(&url).json(&LoginRequest { email, password }))?;
        info!(user_id = response.user_id, role = %response.role, "logged in");
        Ok(response)
    }

    fn list_doctors(&self) -> Result<Vec<Doctor>, ServiceError> {
        let url = self.config.endpoint("/api/doctors");
        self.send_json(self.client.get(&url))
    }

    fn list_appointments_for_patient(
        &self,
        session: &Session,
        patient_id: i64,
    ) -> Result<Vec<Appointment>, ServiceError> {
        let url = self.config.endpoint("/api/appointments/patient");
        let appointments: Vec<Appointment> =
            self.send_json(self.authorized(self.client.get(&url), session))?;
        debug!(patient_id, count = appointments.len(), "fetched patient appointments");
        Ok(appointments)
    }

    fn list_appointments_for_doctor(
        &self,
        session: &Session,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, ServiceError> {
        let url = self.config.endpoint("/api/appointments/doctor");
        let appointments: Vec<Appointment> =
            self.send_json(self.authorized(self.client.get(&url), session))?;
        debug!(doctor_id, count = appointments.len(), "fetched doctor appointments");
        Ok(appointments)
    }

    fn list_all_appointments(&self, session: &Session) -> Result<Vec<Appointment>, ServiceError> {
        let url = self.config.endpoint("/api/appointments");
        let appointments: Vec<Appointment> =
            self.send_json(self.authorized(self.client.get(&url), session))?;
        debug!(count = appointments.len(), "fetched all appointments");
        Ok(appointments)
    }

    fn update_status(
        &self,
        session: &Session,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, ServiceError> {
        let url = self
            .config
            .endpoint(&format!("/api/appointments/{}/status", appointment_id));
        let builder = self
            .authorized(self.client.put(&url), session)
            .json(&StatusUpdateRequest { status });
        let updated: Appointment = self.send_json(builder)?;
        info!(appointment_id, %status, "appointment status updated");
        Ok(updated)
    }

    fn create_appointment(
        &self,
        session: &Session,
        request: &NewAppointment,
    ) -> Result<Appointment, ServiceError> {
        let url = self.config.endpoint("/api/appointments");
        let builder = self.authorized(self.client.post(&url), session).json(request);
        let created: Appointment = self.send_json(builder)?;
        info!(
            appointment_id = created.id,
            doctor_id = request.doctor_id,
            date = %request.appointment_date,
            "appointment created"
        );
        Ok(created)
    }

    fn set_availability(&self, session: &Session, available: bool) -> Result<(), ServiceError> {
        let url = self.config.endpoint("/api/doctor/availability");
        let builder = self
            .authorized(self.client.put(&url), session)
            .json(&AvailabilityRequest { available });
        // The acknowledgement body is not used.
        self.send(builder)?;
        info!(doctor_id = session.user_id(), available, "availability updated");
        Ok(())
    }

    fn list_patients(&self, session: &Session) -> Result<Vec<Patient>, ServiceError> {
        let url = self.config.endpoint("/api/patients");
        let patients: Vec<Patient> =
            self.send_json(self.authorized(self.client.get(&url), session))?;
        debug!(count = patients.len(), "fetched patients");
        Ok(patients)
    }

    fn list_departments(&self, session: &Session) -> Result<Vec<Department>, ServiceError> {
        let url = self.config.endpoint("/api/departments");
        self.send_json(self.authorized(self.client.get(&url), session))
    }

    fn get_profile(&self, session: &Session) -> Result<Profile, ServiceError> {
        let url = self.config.endpoint(profile_path(session.role()));
        self.send_json(self.authorized(self.client.get(&url), session))
    }
}
