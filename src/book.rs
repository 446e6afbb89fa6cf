/// Client-side appointment book.
///
/// This module provides the AppointmentBook struct, the dashboard's cached
/// copy of the backend's appointments plus the one open in the detail view.
/// Status changes are two-phase: the backend is asked first and the cache
/// is only touched once it has acknowledged.

use crate::error::{BookError, ServiceError};
use crate::lifecycle;
use crate::models::{Action, Appointment, AppointmentStatus, NewAppointment, Role, StatusFilter};
use crate::service::AppointmentService;
use crate::session::Session;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A status change that has been validated and is waiting on the backend.
///
/// Only `apply_transition` creates one, and it always hands it back to
/// `finish_transition`, so no id stays in flight past that call.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
struct PendingTransition {
    appointment_id: i64,
    status: AppointmentStatus,
}

#[derive(Debug, Default)]
pub struct AppointmentBook {
    appointments: Vec<Appointment>,
    selected: Option<Appointment>,
    in_flight: HashSet<i64>,
    last_error: Option<String>,
}

impl AppointmentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// All cached appointments in fetch order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn get(&self, appointment_id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }

    /// Cached appointments matching `filter`, in fetch order.
    pub fn visible(&self, filter: StatusFilter) -> Vec<&Appointment> {
        lifecycle::filter_appointments(&self.appointments, filter)
    }

    /// Most recent non-fatal error, for inline display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_pending(&self, appointment_id: i64) -> bool {
        self.in_flight.contains(&appointment_id)
    }

    /// Replace the cache with a freshly fetched list.
    pub fn replace_all(&mut self, appointments: Vec<Appointment>) {
        if let Some(selected) = &self.selected {
            let id = selected.id;
            self.selected = appointments.iter().find(|a| a.id == id).cloned();
        }
        self.appointments = appointments;
        self.last_error = None;
    }

    /// Fetch the viewer's appointments. On failure the current list is kept.
    pub fn load<S: AppointmentService + ?Sized>(
        &mut self,
        service: &S,
        session: &Session,
    ) -> Result<usize, ServiceError> {
        let result = match session.role() {
            Role::Patient => service.list_appointments_for_patient(session, session.user_id()),
            Role::Doctor => service.list_appointments_for_doctor(session, session.user_id()),
            Role::Admin => service.list_all_appointments(session),
        };

        match result {
            Ok(appointments) => {
                let count = appointments.len();
                self.replace_all(appointments);
                info!(session_id = %session.session_id(), count, "appointments loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id(),
                    error = %e,
                    "failed to fetch appointments"
                );
                self.last_error = Some(format!("Failed to fetch appointments: {}", e));
                Err(e)
            }
        }
    }

    /// Open the detail view on an appointment.
    pub fn select(&mut self, appointment_id: i64) -> Result<&Appointment, BookError> {
        let appointment = self
            .get(appointment_id)
            .cloned()
            .ok_or(BookError::NotFound(appointment_id))?;
        let selected: &Appointment = self.selected.insert(appointment);
        Ok(selected)
    }

    pub fn selected(&self) -> Option<&Appointment> {
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Actions offered to `role` on a cached appointment at `now`.
    ///
    /// Nothing beyond `View` is offered while a change is in flight.
    pub fn actions_for(
        &self,
        appointment_id: i64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Option<Vec<Action>> {
        let appointment = self.get(appointment_id)?;
        if self.is_pending(appointment_id) {
            return Some(vec![Action::View]);
        }
        Some(lifecycle::offered_actions(appointment, role, now))
    }

    /// Validate a status change and mark the appointment as in flight.
    fn begin_transition(
        &mut self,
        session: &Session,
        appointment_id: i64,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<PendingTransition, BookError> {
        let appointment = self
            .get(appointment_id)
            .ok_or(BookError::NotFound(appointment_id))?;

        if self.in_flight.contains(&appointment_id) {
            warn!(appointment_id, "status change already in flight");
            return Err(BookError::RequestPending(appointment_id));
        }

        let role = session.role();
        lifecycle::validate_transition(appointment, status, role, now)?;
        lifecycle::check_assigned_doctor(appointment, role, session.user_id())?;

        self.in_flight.insert(appointment_id);
        debug!(appointment_id, %status, "status change started");
        Ok(PendingTransition {
            appointment_id,
            status,
        })
    }

    /// Apply the backend's answer to a pending change.
    ///
    /// Success updates the list entry and the detail copy, status only.
    /// Failure leaves the cache exactly as it was.
    fn finish_transition(
        &mut self,
        pending: PendingTransition,
        outcome: Result<Appointment, ServiceError>,
    ) -> Result<(), BookError> {
        let PendingTransition {
            appointment_id,
            status,
        } = pending;
        self.in_flight.remove(&appointment_id);

        if let Err(e) = outcome {
            warn!(appointment_id, %status, error = %e, "status change rejected");
            self.last_error = Some(format!("Failed to update appointment: {}", e));
            return Err(e.into());
        }

        if let Some(entry) = self.appointments.iter_mut().find(|a| a.id == appointment_id) {
            entry.status = status;
        }
        if let Some(selected) = self.selected.as_mut().filter(|s| s.id == appointment_id) {
            selected.status = status;
        }
        self.last_error = None;
        info!(appointment_id, %status, "status change applied");
        Ok(())
    }

    /// Request a status change from the backend and apply it on success.
    ///
    /// Validation failures never reach the backend. A backend rejection
    /// leaves the cache exactly as it was.
    pub fn apply_transition<S: AppointmentService + ?Sized>(
        &mut self,
        service: &S,
        session: &Session,
        appointment_id: i64,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), BookError> {
        let pending = self.begin_transition(session, appointment_id, status, now)?;
        let outcome = service.update_status(session, appointment_id, status);
        self.finish_transition(pending, outcome)
    }

    /// Create an appointment and add the acknowledged record to the list.
    pub fn book<S: AppointmentService + ?Sized>(
        &mut self,
        service: &S,
        session: &Session,
        request: &NewAppointment,
    ) -> Result<&Appointment, BookError> {
        match service.create_appointment(session, request) {
            Ok(created) => {
                self.last_error = None;
                self.appointments.push(created);
                let index = self.appointments.len() - 1;
                Ok(&self.appointments[index])
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to schedule appointment: {}", e));
                Err(e.into())
            }
        }
    }
}
