//! Client-side appointment lifecycle for a hospital booking service.
//!
//! The backend owns every record. This crate keeps a cached copy of the
//! viewer's appointments, decides which status changes to offer to whom,
//! and applies a change locally only after the backend has accepted it.

pub mod book;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod service;
pub mod session;

pub use book::AppointmentBook;
pub use config::ClientConfig;
pub use error::{BookError, LifecycleError, ModelError, ServiceError};
pub use models::{
    create_new_appointment, search_patients, Action, Appointment, AppointmentStatus, Department,
    Doctor, NewAppointment, Patient, Profile, Role, StatusFilter,
};
pub use service::{AppointmentService, HttpAppointmentService};
pub use session::{LoginResponse, Session, SessionStore};
