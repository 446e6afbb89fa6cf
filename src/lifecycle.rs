/// Appointment lifecycle rules.
///
/// Holds the status state machine, the patient cancellation window and
/// the role projection that decides which actions a viewer is offered.
/// Nothing here talks to the backend; see `book` for applying changes.

use crate::error::LifecycleError;
use crate::models::{Action, Appointment, AppointmentStatus, Role, StatusFilter};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, warn};

/// Minimum lead time for a patient-initiated cancellation.
pub const CANCELLATION_NOTICE_HOURS: i64 = 24;

/// Every transition the interface may offer, with the role that may take it.
const TRANSITIONS: [(AppointmentStatus, AppointmentStatus, Role); 4] = [
    (AppointmentStatus::Scheduled, AppointmentStatus::Completed, Role::Doctor),
    (AppointmentStatus::Scheduled, AppointmentStatus::NoShow, Role::Doctor),
    (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled, Role::Doctor),
    (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled, Role::Patient),
];

/// Whether `role` may move an appointment from `from` to `to`, ignoring time.
pub fn allowed_transition(from: AppointmentStatus, to: AppointmentStatus, role: Role) -> bool {
    TRANSITIONS
        .iter()
        .any(|&(f, t, r)| f == from && t == to && r == role)
}

/// Statuses reachable from `from` by `role`.
pub fn next_statuses(from: AppointmentStatus, role: Role) -> Vec<AppointmentStatus> {
    TRANSITIONS
        .iter()
        .filter(|&&(f, _, r)| f == from && r == role)
        .map(|&(_, t, _)| t)
        .collect()
}

/// The instant the cancellation window is measured against.
///
/// Only the calendar date counts; the slot's time of day is ignored and the
/// date is read as midnight UTC.
pub fn cutoff_reference(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Time left between `now` and the appointment's reference instant.
pub fn lead_time(appointment: &Appointment, now: DateTime<Utc>) -> Duration {
    cutoff_reference(appointment.appointment_date) - now
}

/// Whether a patient may still cancel this appointment at `now`.
///
/// Inclusive at exactly 24 hours. Evaluate this against a fresh clock
/// reading each time it is shown.
pub fn can_patient_cancel(appointment: &Appointment, now: DateTime<Utc>) -> bool {
    appointment.status == AppointmentStatus::Scheduled
        && lead_time(appointment, now) >= Duration::hours(CANCELLATION_NOTICE_HOURS)
}

/// Check that `role` may move `appointment` to `to` at `now`.
pub fn validate_transition(
    appointment: &Appointment,
    to: AppointmentStatus,
    role: Role,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    let from = appointment.status;

    if !allowed_transition(from, to, role) {
        warn!(
            appointment_id = appointment.id,
            %from,
            %to,
            %role,
            "transition not offered"
        );
        return Err(LifecycleError::TransitionNotOffered { from, to, role });
    }

    if role == Role::Patient && !can_patient_cancel(appointment, now) {
        warn!(
            appointment_id = appointment.id,
            date = %appointment.appointment_date,
            "patient cancellation inside notice window"
        );
        return Err(LifecycleError::CancellationWindowClosed);
    }

    debug!(appointment_id = appointment.id, %from, %to, %role, "transition validated");
    Ok(())
}

/// Check that a doctor acting on `appointment` is the one it is booked with.
///
/// Listings that only embed the doctor summary carry no `doctorId`; those
/// are left to the backend to enforce.
pub fn check_assigned_doctor(
    appointment: &Appointment,
    role: Role,
    viewer_id: i64,
) -> Result<(), LifecycleError> {
    if role != Role::Doctor {
        return Ok(());
    }
    match appointment.doctor_id {
        Some(doctor_id) if doctor_id != viewer_id => {
            warn!(
                appointment_id = appointment.id,
                doctor_id,
                viewer_id,
                "doctor is not assigned to appointment"
            );
            Err(LifecycleError::NotAssignedDoctor {
                appointment_id: appointment.id,
            })
        }
        _ => Ok(()),
    }
}

/// Actions offered to `role` for `appointment` at `now`.
///
/// `View` is always first; the rest follow `Action`'s ordering.
pub fn offered_actions(appointment: &Appointment, role: Role, now: DateTime<Utc>) -> Vec<Action> {
    let mut actions = vec![Action::View];

    match role {
        Role::Patient => {
            if can_patient_cancel(appointment, now) {
                actions.push(Action::Cancel);
            }
        }
        Role::Doctor => {
            if appointment.status == AppointmentStatus::Scheduled {
                actions.extend([Action::MarkCompleted, Action::MarkNoShow, Action::Cancel]);
            }
        }
        Role::Admin => {}
    }

    actions
}

/// Appointments matching `filter`, in their original order.
pub fn filter_appointments(
    appointments: &[Appointment],
    filter: StatusFilter,
) -> Vec<&Appointment> {
    appointments
        .iter()
        .filter(|a| filter.matches(a.status))
        .collect()
}
