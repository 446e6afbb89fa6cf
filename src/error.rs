/// Error types for the booking client.
///
/// Each concern gets its own enum so callers can tell a rejected form
/// from a rejected transition from a failed HTTP exchange.

use crate::models::{AppointmentStatus, Role};
use thiserror::Error;

/// Validation failures on locally constructed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid status: '{0}'. Must be one of: SCHEDULED, COMPLETED, CANCELLED, NO_SHOW")]
    InvalidStatus(String),

    #[error("Invalid status filter: '{0}'. Must be 'all' or a status")]
    InvalidFilter(String),

    #[error("Invalid role: '{0}'. Must be one of: ROLE_PATIENT, ROLE_DOCTOR, ROLE_ADMIN")]
    InvalidRole(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
}

/// A transition that the state machine does not offer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("{role} may not move an appointment from {from} to {to}")]
    TransitionNotOffered {
        from: AppointmentStatus,
        to: AppointmentStatus,
        role: Role,
    },

    #[error("Appointments can only be cancelled at least 24 hours in advance")]
    CancellationWindowClosed,

    #[error("Appointment {appointment_id} is assigned to another doctor")]
    NotAssignedDoctor { appointment_id: i64 },
}

/// Failures talking to the appointment backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Cannot reach appointment service at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Appointment service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Failures while applying an operation to the local appointment cache.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Appointment {0} is not in the current list")]
    NotFound(i64),

    #[error("A status change for appointment {0} is already in progress")]
    RequestPending(i64),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
