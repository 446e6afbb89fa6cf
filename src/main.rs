/// Command-line dashboard for the hospital booking service.
///
/// This module provides an interactive CLI for signing in, listing and
/// filtering appointments, acting on them according to the viewer's role,
/// booking new appointments, and the per-role extras: a doctor's
/// availability switch and an administrator's patient and department lists.

use anyhow::Result;
use carebook::{
    create_new_appointment, search_patients, Action, Appointment, AppointmentBook,
    AppointmentService, ClientConfig, HttpAppointmentService, Role, SessionStore, StatusFilter,
};
use chrono::Utc;
use clap::Parser;
use std::io::{self, Write};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// carebook - hospital appointment dashboard
#[derive(Parser, Debug)]
#[command(name = "carebook")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the appointment service [overrides CAREBOOK_API_URL]
    #[arg(long)]
    api_url: Option<String>,

    /// Request timeout in seconds [overrides CAREBOOK_TIMEOUT_SECS]
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

struct BookingCli<S: AppointmentService> {
    service: S,
    sessions: SessionStore,
    book: AppointmentBook,
    filter: StatusFilter,
    running: bool,
}

impl<S: AppointmentService> BookingCli<S> {
    fn new(service: S) -> Self {
        BookingCli {
            service,
            sessions: SessionStore::new(),
            book: AppointmentBook::new(),
            filter: StatusFilter::All,
            running: true,
        }
    }

    fn print_header(&self) {
        println!("\n{}", "=".repeat(60));
        println!("       HOSPITAL APPOINTMENT DASHBOARD");
        println!("{}", "=".repeat(60));
    }

    fn print_menu(&self) {
        match self.sessions.current() {
            None => {
                println!("\n--- Main Menu ---");
                println!("1. Log in");
                println!("2. List doctors");
                println!("9. Exit");
            }
            Some(session) => {
                println!(
                    "\n--- {} ({}) ---",
                    session.display_name(),
                    session.role()
                );
                println!("1. List appointments [filter: {}]", self.filter);
                println!("2. Change status filter");
                println!("3. View appointment details");
                match session.role() {
                    Role::Patient => println!("4. Book an appointment"),
                    Role::Doctor => println!("4. Change availability"),
                    Role::Admin => println!("4. List patients"),
                }
                println!("5. List doctors");
                println!("6. My profile");
                println!("7. Reload appointments");
                println!("8. Log out");
                if session.role() == Role::Admin {
                    println!("10. List departments");
                }
                println!("9. Exit");
            }
        }
        println!("{}", "-".repeat(20));
    }

    fn get_input(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        if let Some(def) = default {
            print!("{} [{}]: ", prompt, def);
        } else {
            print!("{}: ", prompt);
        }
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            self.running = false;
            return Ok(String::new());
        }
        let input = input.trim();

        if input.is_empty() {
            Ok(default.unwrap_or("").to_string())
        } else {
            Ok(input.to_string())
        }
    }

    fn get_int_input(&mut self, prompt: &str, default: Option<i64>) -> Result<i64> {
        loop {
            let default_str = default.map(|d| d.to_string());
            let input = self.get_input(prompt, default_str.as_deref())?;
            if !self.running {
                return Ok(default.unwrap_or(0));
            }

            if let Ok(value) = input.parse::<i64>() {
                return Ok(value);
            }
            println!("Please enter a valid number");
        }
    }

    fn login(&mut self) -> Result<()> {
        println!("\n--- Log In ---");

        let email = self.get_input("Email", None)?;
        let password = self.get_input("Password", None)?;
        if email.is_empty() || password.is_empty() {
            println!("\nEmail and password are required");
            return Ok(());
        }

        match self.service.login(&email, &password) {
            Ok(response) => {
                self.book = AppointmentBook::new();
                self.filter = StatusFilter::All;
                let session = self.sessions.login(response);
                println!("\nWelcome, {}!", session.display_name());
                self.reload();
            }
            Err(e) => println!("\nLogin failed: {}", e),
        }
        Ok(())
    }

    fn logout(&mut self) {
        if self.sessions.logout() {
            self.book = AppointmentBook::new();
            self.filter = StatusFilter::All;
            println!("\nLogged out");
        }
    }

    fn reload(&mut self) {
        let Some(session) = self.sessions.current() else {
            return;
        };

        match self.book.load(&self.service, session) {
            Ok(count) => println!("Loaded {} appointments", count),
            Err(_) => {
                if let Some(message) = self.book.last_error() {
                    println!("\n{}", message);
                }
            }
        }
    }

    fn list_doctors(&self) {
        match self.service.list_doctors() {
            Ok(doctors) if doctors.is_empty() => println!("\nNo doctors found"),
            Ok(doctors) => {
                println!("\n--- Doctors ({}) ---", doctors.len());
                for doctor in doctors {
                    let availability = match doctor.available {
                        Some(false) => " (unavailable)",
                        _ => "",
                    };
                    println!(
                        "  {:>4}  {} - {}{}",
                        doctor.id,
                        doctor.full_name,
                        doctor.specialization.as_deref().unwrap_or("General"),
                        availability
                    );
                }
            }
            Err(e) => println!("\nFailed to fetch doctors: {}", e),
        }
    }

    fn show_profile(&self) {
        let Some(session) = self.sessions.current() else {
            return;
        };

        let profile = match self.service.get_profile(session) {
            Ok(profile) => profile,
            Err(e) => {
                println!("\nFailed to load profile data: {}", e);
                return;
            }
        };

        println!("\n--- Profile ---");
        println!("  Name: {}", profile.name());
        let fields = [
            ("Email", profile.email.as_deref()),
            ("Phone", profile.phone.as_deref()),
            ("Date of Birth", profile.date_of_birth.as_deref()),
            ("Address", profile.address.as_deref()),
            ("Gender", profile.gender.as_deref()),
            ("Specialization", profile.specialization.as_deref()),
            ("License Number", profile.license_number.as_deref()),
        ];
        for (label, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                println!("  {}: {}", label, value);
            }
        }
        if let Some(age) = profile.age {
            println!("  Age: {}", age);
        }
        if let Some(years) = profile.experience {
            println!("  Experience: {} years", years);
        }
    }

    fn change_availability(&mut self) -> Result<()> {
        let Some(session) = self.sessions.current().filter(|s| s.role() == Role::Doctor) else {
            println!("\nOnly doctors can change availability");
            return Ok(());
        };

        // Doctors are bookable unless the backend says otherwise.
        let available = match self.service.get_profile(session) {
            Ok(profile) => profile.available.unwrap_or(true),
            Err(e) => {
                println!("\nFailed to fetch availability: {}", e);
                return Ok(());
            }
        };
        println!(
            "\nYou are currently {} for appointments",
            if available { "available" } else { "unavailable" }
        );

        let prompt = if available {
            "Set as unavailable? (y/n)"
        } else {
            "Set as available? (y/n)"
        };
        let answer = self.get_input(prompt, Some("n"))?;
        if !answer.eq_ignore_ascii_case("y") {
            return Ok(());
        }

        let Some(session) = self.sessions.current() else {
            return Ok(());
        };
        match self.service.set_availability(session, !available) {
            Ok(()) => println!(
                "\nYou are now {}",
                if available { "unavailable" } else { "available" }
            ),
            Err(e) => println!("\nError updating availability: {}", e),
        }
        Ok(())
    }

    fn list_patients(&mut self) -> Result<()> {
        if self.sessions.current().map(|s| s.role()) != Some(Role::Admin) {
            println!("\nOnly administrators can list patients");
            return Ok(());
        }

        let term = self.get_input("Search by name or email (blank for all)", None)?;
        let Some(session) = self.sessions.current() else {
            return Ok(());
        };
        let patients = match self.service.list_patients(session) {
            Ok(patients) => patients,
            Err(e) => {
                println!("\nFailed to fetch patients: {}", e);
                return Ok(());
            }
        };

        let found = search_patients(&patients, &term);
        if found.is_empty() {
            println!("\nNo patients found");
            return Ok(());
        }
        println!("\n--- Patients ({} of {}) ---", found.len(), patients.len());
        for patient in found {
            println!(
                "  {:>4}  {:<24} {}",
                patient.id,
                patient.patient_name,
                patient.email.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    fn list_departments(&self) {
        let Some(session) = self.sessions.current().filter(|s| s.role() == Role::Admin) else {
            println!("\nOnly administrators can list departments");
            return;
        };

        match self.service.list_departments(session) {
            Ok(departments) if departments.is_empty() => println!("\nNo departments found"),
            Ok(departments) => {
                println!("\n--- Departments ({}) ---", departments.len());
                for department in departments {
                    println!(
                        "  {:>4}  {:<24} {}",
                        department.id,
                        department.name,
                        department.phone.as_deref().unwrap_or("")
                    );
                }
            }
            Err(e) => println!("\nFailed to fetch departments: {}", e),
        }
    }

    fn counterpart(role: Role, appointment: &Appointment) -> &str {
        match role {
            Role::Doctor => appointment.patient_name(),
            _ => appointment.doctor_name(),
        }
    }

    fn list_appointments(&self) {
        let Some(session) = self.sessions.current() else {
            return;
        };
        let role = session.role();
        let now = Utc::now();

        let visible = self.book.visible(self.filter);
        if visible.is_empty() {
            println!("\nNo appointments found");
            return;
        }

        println!("\n--- Appointments ({} shown, filter: {}) ---", visible.len(), self.filter);
        for appointment in visible {
            let can_act = self
                .book
                .actions_for(appointment.id, role, now)
                .map(|actions| actions.len() > 1)
                .unwrap_or(false);
            println!(
                "  #{:<5} {}  {}  {:<24} {:<10}{}",
                appointment.id,
                appointment.appointment_date.format("%Y-%m-%d"),
                appointment.appointment_time.format("%H:%M"),
                Self::counterpart(role, appointment),
                appointment.status,
                if can_act { "  *" } else { "" }
            );
        }
    }

    fn change_filter(&mut self) -> Result<()> {
        println!("\nFilter by status: all, SCHEDULED, COMPLETED, CANCELLED, NO_SHOW");
        let current = self.filter.to_string();
        let input = self.get_input("Filter", Some(current.as_str()))?;

        match StatusFilter::from_string(&input) {
            Ok(filter) => self.filter = filter,
            Err(e) => println!("\n{}", e),
        }
        Ok(())
    }

    fn print_details(&self, role: Role, appointment: &Appointment) {
        println!("\n--- Appointment #{} ---", appointment.id);
        match role {
            Role::Doctor => println!("  Patient: {}", appointment.patient_name()),
            _ => {
                println!("  Doctor: {}", appointment.doctor_name());
                let specialization = appointment
                    .doctor
                    .as_ref()
                    .and_then(|d| d.specialization.as_deref())
                    .unwrap_or("Not specified");
                println!("  Specialization: {}", specialization);
            }
        }
        println!("  Date: {}", appointment.appointment_date.format("%B %-d, %Y"));
        println!("  Time: {}", appointment.appointment_time.format("%H:%M"));
        println!("  Status: {}", appointment.status);
        println!("  Reason for Visit: {}", appointment.reason());
    }

    fn view_details(&mut self) -> Result<()> {
        let Some(role) = self.sessions.current().map(|s| s.role()) else {
            return Ok(());
        };

        let id = self.get_int_input("Appointment number (0 to go back)", Some(0))?;
        if id == 0 {
            return Ok(());
        }

        let selected = match self.book.select(id) {
            Ok(appointment) => appointment.clone(),
            Err(e) => {
                println!("\n{}", e);
                return Ok(());
            }
        };
        self.print_details(role, &selected);

        // Re-read the clock each time actions are shown.
        let actions: Vec<Action> = self
            .book
            .actions_for(id, role, Utc::now())
            .unwrap_or_default()
            .into_iter()
            .filter(|a| *a != Action::View)
            .collect();

        if actions.is_empty() {
            self.book.clear_selection();
            return Ok(());
        }

        println!();
        for (i, action) in actions.iter().enumerate() {
            println!("  {}. {}", i + 1, action.label());
        }
        let choice = self.get_int_input("Select action (0 to go back)", Some(0))?;

        if choice > 0 && (choice as usize) <= actions.len() {
            self.perform(id, actions[choice as usize - 1]);
        }

        self.book.clear_selection();
        Ok(())
    }

    fn perform(&mut self, appointment_id: i64, action: Action) {
        let Some(status) = action.target_status() else {
            return;
        };
        let Some(session) = self.sessions.current() else {
            return;
        };

        match self
            .book
            .apply_transition(&self.service, session, appointment_id, status, Utc::now())
        {
            Ok(()) => {
                println!("\nAppointment #{} is now {}", appointment_id, status);
                if let Some(appointment) = self.book.selected() {
                    self.print_details(session.role(), appointment);
                }
            }
            Err(e) => println!("\nError: {}", e),
        }
    }

    fn book_appointment(&mut self) -> Result<()> {
        let Some(patient_id) = self
            .sessions
            .current()
            .filter(|s| s.role() == Role::Patient)
            .map(|s| s.user_id())
        else {
            println!("\nOnly patients can book appointments");
            return Ok(());
        };

        println!("\n--- Book an Appointment ---");
        self.list_doctors();

        let doctor = self.get_input("Doctor number", None)?;
        let date = self.get_input("Date (YYYY-MM-DD)", None)?;
        let time = self.get_input("Time (HH:MM)", None)?;
        let reason = self.get_input("Reason for visit", None)?;

        let request = match create_new_appointment(patient_id, &doctor, &date, &time, &reason) {
            Ok(request) => request,
            Err(e) => {
                println!("\nPlease fill in all fields: {}", e);
                return Ok(());
            }
        };

        let Some(session) = self.sessions.current() else {
            return Ok(());
        };
        match self.book.book(&self.service, session, &request) {
            Ok(appointment) => println!(
                "\nAppointment #{} scheduled for {} at {}",
                appointment.id,
                appointment.appointment_date.format("%Y-%m-%d"),
                appointment.appointment_time.format("%H:%M")
            ),
            Err(e) => println!("\nFailed to schedule appointment: {}", e),
        }
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        self.print_header();

        while self.running {
            self.print_menu();

            let choice = self.get_int_input("Enter choice", None)?;
            if !self.running {
                break;
            }

            if let Some(role) = self.sessions.current().map(|s| s.role()) {
                match (choice, role) {
                    (1, _) => self.list_appointments(),
                    (2, _) => self.change_filter()?,
                    (3, _) => self.view_details()?,
                    (4, Role::Patient) => self.book_appointment()?,
                    (4, Role::Doctor) => self.change_availability()?,
                    (4, Role::Admin) => self.list_patients()?,
                    (5, _) => self.list_doctors(),
                    (6, _) => self.show_profile(),
                    (7, _) => self.reload(),
                    (8, _) => self.logout(),
                    (10, Role::Admin) => self.list_departments(),
                    (9, _) => self.running = false,
                    _ => println!("Invalid choice"),
                }
            } else {
                match choice {
                    1 => self.login()?,
                    2 => self.list_doctors(),
                    9 => self.running = false,
                    _ => println!("Invalid choice"),
                }
            }
        }

        println!("\nGoodbye!");
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = ClientConfig::from_env()
        .with_base_url(cli.api_url)
        .with_timeout(cli.timeout);
    tracing::info!(base_url = %config.base_url, "starting {}", carebook::config::APP_NAME);

    let service = HttpAppointmentService::new(config)?;
    BookingCli::new(service).run()
}
