//! Exercises `HttpAppointmentService` and `AppointmentBook` against a
//! single-shot HTTP responder on loopback.

use carebook::{
    search_patients, AppointmentBook, AppointmentService, AppointmentStatus, BookError,
    ClientConfig, HttpAppointmentService, LifecycleError, Role, ServiceError, Session,
};
use chrono::{TimeZone, Utc};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Accept one connection, answer it with `status` and `body`, and return
/// the raw request that was received.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
            request.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut payload = vec![0u8; content_length];
        reader.read_exact(&mut payload).unwrap();
        request.push_str(&String::from_utf8(payload).unwrap());

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });

    (base_url, handle)
}

fn service(base_url: &str) -> HttpAppointmentService {
    HttpAppointmentService::new(ClientConfig::new(base_url, 5)).unwrap()
}

fn doctor_session() -> Session {
    Session::new("secret-token".to_string(), 12, Role::Doctor, "Dr. Rao".to_string())
}

fn admin_session() -> Session {
    Session::new("admin-token".to_string(), 1, Role::Admin, "Admin".to_string())
}

const LISTING: &str = r#"[
    {"id":5,"patientId":1,"doctorId":12,"appointmentDate":"2024-06-20","appointmentTime":"09:00:00","reasonForVisit":"Cough","status":"SCHEDULED","patient":{"patientName":"Ana"}},
    {"id":7,"patientId":2,"doctorId":12,"appointmentDate":"2024-06-21","appointmentTime":"10:30:00","reasonForVisit":"Rash","status":"SCHEDULED"},
    {"id":9,"patientId":3,"doctorId":12,"appointmentDate":"2024-06-22","appointmentTime":"11:00:00","reasonForVisit":"","status":"CANCELLED"}
]"#;

#[test]
fn update_status_sends_bearer_and_status_body() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"id":7,"appointmentDate":"2024-06-21","appointmentTime":"10:30","status":"COMPLETED"}"#,
    );

    let updated = service(&base_url)
        .update_status(&doctor_session(), 7, AppointmentStatus::Completed)
        .unwrap();
    let request = server.join().unwrap();

    assert_eq!(updated.status, AppointmentStatus::Completed);
    assert!(request.starts_with("PUT /api/appointments/7/status HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer secret-token"));
    assert!(request.ends_with(r#"{"status":"COMPLETED"}"#));
}

#[test]
fn forbidden_maps_to_unauthorized() {
    let (base_url, server) = serve_once("403 Forbidden", r#"{"error":"Token expired"}"#);

    let result = service(&base_url).list_appointments_for_doctor(&doctor_session(), 12);
    server.join().unwrap();

    match result {
        Err(ServiceError::Unauthorized(message)) => assert_eq!(message, "Token expired"),
        other => panic!("expected Unauthorized, got {:?}", other.map(|l| l.len())),
    }
}

#[test]
fn unknown_status_in_listing_is_rejected() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"id":1,"appointmentDate":"2024-06-20","appointmentTime":"09:00","status":"PENDING"}]"#,
    );

    let result = service(&base_url).list_appointments_for_doctor(&doctor_session(), 12);
    server.join().unwrap();

    assert!(matches!(result, Err(ServiceError::Decode(_))));
}

#[test]
fn rejected_transition_leaves_cache_identical() {
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let session = doctor_session();
    let mut book = AppointmentBook::new();

    let (base_url, server) = serve_once("200 OK", LISTING);
    let listing = service(&base_url);
    assert_eq!(book.load(&listing, &session).unwrap(), 3);
    server.join().unwrap();

    let before = serde_json::to_string(book.appointments()).unwrap();

    let (base_url, server) =
        serve_once("400 Bad Request", r#"{"error":"Appointment is already closed"}"#);
    let rejecting = service(&base_url);
    let result = book.apply_transition(&rejecting, &session, 7, AppointmentStatus::NoShow, now);
    server.join().unwrap();

    match result {
        Err(BookError::Service(ServiceError::Status { status, message })) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Appointment is already closed");
        }
        other => panic!("expected a service rejection, got {:?}", other),
    }
    assert_eq!(serde_json::to_string(book.appointments()).unwrap(), before);
    assert!(!book.is_pending(7));
}

#[test]
fn accepted_transition_updates_one_entry() {
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let session = doctor_session();
    let mut book = AppointmentBook::new();

    let (base_url, server) = serve_once("200 OK", LISTING);
    book.load(&service(&base_url), &session).unwrap();
    server.join().unwrap();

    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"id":7,"appointmentDate":"2024-06-21","appointmentTime":"10:30","status":"COMPLETED"}"#,
    );
    let accepting = service(&base_url);
    book.apply_transition(&accepting, &session, 7, AppointmentStatus::Completed, now)
        .unwrap();
    server.join().unwrap();

    let statuses: Vec<(i64, AppointmentStatus)> =
        book.appointments().iter().map(|a| (a.id, a.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (5, AppointmentStatus::Scheduled),
            (7, AppointmentStatus::Completed),
            (9, AppointmentStatus::Cancelled),
        ]
    );
    assert_eq!(book.get(5).map(|a| a.patient_name()), Some("Ana"));
    assert_eq!(book.get(7).and_then(|a| a.reason_for_visit.as_deref()), Some("Rash"));
}

#[test]
fn set_availability_puts_the_flag() {
    let (base_url, server) = serve_once("200 OK", r#"{"id":12,"available":false}"#);

    service(&base_url)
        .set_availability(&doctor_session(), false)
        .unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("PUT /api/doctor/availability HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer secret-token"));
    assert!(request.ends_with(r#"{"available":false}"#));
}

#[test]
fn set_availability_rejection_is_reported() {
    let (base_url, server) = serve_once("500 Internal Server Error", "");

    let result = service(&base_url).set_availability(&doctor_session(), true);
    server.join().unwrap();

    match result {
        Err(ServiceError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[test]
fn patients_listing_is_searchable() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"id":1,"patientName":"Ana Lima","email":"ana@example.com"},{"id":2,"patientName":"Ben Okafor","email":"ben@clinic.org"}]"#,
    );

    let patients = service(&base_url).list_patients(&admin_session()).unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/patients HTTP/1.1"));
    assert!(request
        .to_ascii_lowercase()
        .contains("authorization: bearer admin-token"));
    let found: Vec<i64> = search_patients(&patients, "okafor").iter().map(|p| p.id).collect();
    assert_eq!(found, vec![2]);
}

#[test]
fn departments_are_listed() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"[{"id":1,"name":"Cardiology","phone":"1234567890"},{"id":2,"name":"Pediatrics"}]"#,
    );

    let departments = service(&base_url).list_departments(&admin_session()).unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/departments HTTP/1.1"));
    let names: Vec<&str> = departments.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Cardiology", "Pediatrics"]);
    assert_eq!(departments[1].phone, None);
}

#[test]
fn profile_is_fetched_from_the_role_endpoint() {
    let (base_url, server) = serve_once(
        "200 OK",
        r#"{"fullName":"Dr. Rao","email":"rao@clinic.org","specialization":"Cardiology","licenseNumber":"MD-1","experience":12,"available":true}"#,
    );

    let profile = service(&base_url).get_profile(&doctor_session()).unwrap();
    let request = server.join().unwrap();

    assert!(request.starts_with("GET /api/doctor/profile HTTP/1.1"));
    assert_eq!(profile.name(), "Dr. Rao");
    assert_eq!(profile.license_number.as_deref(), Some("MD-1"));
    assert_eq!(profile.available, Some(true));
}

#[test]
fn unassigned_doctor_is_stopped_before_the_backend() {
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let mut book = AppointmentBook::new();

    let (base_url, server) = serve_once("200 OK", LISTING);
    book.load(&service(&base_url), &doctor_session()).unwrap();
    server.join().unwrap();

    // Nothing listens here; reaching the backend would be a transport error.
    let offline = service("http://127.0.0.1:9");
    let other = Session::new("other-token".to_string(), 40, Role::Doctor, "Dr. Mills".to_string());
    let result = book.apply_transition(&offline, &other, 7, AppointmentStatus::Completed, now);

    assert!(matches!(
        result,
        Err(BookError::Lifecycle(LifecycleError::NotAssignedDoctor { appointment_id: 7 }))
    ));
    assert_eq!(book.get(7).map(|a| a.status), Some(AppointmentStatus::Scheduled));
}
