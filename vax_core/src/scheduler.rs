//! Request-scoped scheduler context.
//!
//! A [`Scheduler`] pairs one [`Session`] with one database connection. Every
//! command checks the session's role before it looks at its arguments, then
//! delegates to the ledgers or the reservation engine.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::{AuthConfig, Config};
use crate::input::{parse_date, parse_dose_count};
use crate::ledger::{AppointmentLedger, AvailabilityLedger, CredentialStore, InventoryLedger};
use crate::password::{is_strong_password, Credentials, PASSWORD_POLICY};
use crate::session::Session;
use crate::sqlite::Database;
use crate::{engine, Appointment, Error, Identity, Reservation, Result, Role, Schedule, Vaccine};

const LOGIN_FAILED: &str = "Login failed. Please try again!";

/// One caller's view of the scheduling system
pub struct Scheduler {
    db: Database,
    session: Session,
    auth: AuthConfig,
    session_id: Uuid,
}

impl Scheduler {
    pub fn new(db: Database, auth: AuthConfig) -> Self {
        let session_id = Uuid::new_v4();
        tracing::debug!(session = %session_id, "Scheduler session started");
        Self {
            db,
            session: Session::default(),
            auth,
            session_id,
        }
    }

    /// Open the configured database and start an anonymous session.
    pub fn open(config: &Config) -> Result<Self> {
        let db = Database::open(&config.data.db_path, config.storage.busy_timeout())?;
        Ok(Self::new(db, config.auth.clone()))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create an account in `role`'s namespace.
    ///
    /// Registration does not require (or check) the current session. It logs
    /// the new account in only when `auth.login_after_register` is set and
    /// nobody is logged in yet.
    pub fn register(&mut self, role: Role, username: &str, password: &str) -> Result<Identity> {
        let conn = self.db.connection();
        if conn.username_exists(role, username)? {
            return Err(Error::Conflict("Username taken, try again!".into()));
        }
        if !is_strong_password(password) {
            return Err(Error::InvalidInput(PASSWORD_POLICY.into()));
        }

        let credentials = Credentials::derive(password);
        conn.create_identity(role, username, &credentials)?;
        tracing::info!(session = %self.session_id, %role, username, "Account created");

        let identity = Identity::new(role, username);
        if self.auth.login_after_register && !self.session.is_authenticated() {
            self.session.login(identity.clone())?;
        }
        Ok(identity)
    }

    /// Authenticate as `username` in `role`'s namespace.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub fn login(&mut self, role: Role, username: &str, password: &str) -> Result<&Identity> {
        if let Some(current) = self.session.current() {
            return Err(Error::Unauthorized(format!(
                "Already logged-in as {}! Please logout first.",
                current.username
            )));
        }

        let verified = match self.db.connection().credentials(role, username)? {
            Some(credentials) => credentials.verify(password),
            None => false,
        };
        if !verified {
            tracing::info!(session = %self.session_id, %role, username, "Login rejected");
            return Err(Error::Unauthorized(LOGIN_FAILED.into()));
        }

        self.session.login(Identity::new(role, username))?;
        self.session.require_authenticated()
    }

    pub fn logout(&mut self) -> Result<Identity> {
        let identity = self.session.logout()?;
        tracing::info!(session = %self.session_id, username = %identity.username, "Logged out");
        Ok(identity)
    }

    /// Caregivers free on `date` plus the whole vaccine inventory.
    pub fn search_schedule(&self, date: &str) -> Result<Schedule> {
        self.session.require_authenticated()?;
        let date = parse_date(date)?;

        let conn = self.db.connection();
        Ok(Schedule {
            date,
            caregivers: conn.caregivers_on(date)?,
            vaccines: conn.vaccines()?,
        })
    }

    /// Book an appointment for the logged-in patient.
    pub fn reserve(&mut self, date: &str, vaccine: &str) -> Result<Reservation> {
        let patient = self.session.require(Role::Patient)?.username.clone();
        let date = parse_date(date)?;
        engine::reserve(&mut self.db, &patient, date, vaccine)
    }

    /// Publish a slot for the logged-in caregiver.
    pub fn upload_availability(&mut self, date: &str) -> Result<NaiveDate> {
        let caregiver = self.session.require(Role::Caregiver)?;
        let date = parse_date(date)?;
        self.db.connection().publish(&caregiver.username, date)?;
        tracing::info!(session = %self.session_id, caregiver = %caregiver.username, %date, "Availability uploaded");
        Ok(date)
    }

    /// Create or top up a vaccine's inventory.
    pub fn add_doses(&mut self, vaccine: &str, count: &str) -> Result<Vaccine> {
        self.session.require(Role::Caregiver)?;
        let count = parse_dose_count(count)?;
        let updated = self.db.connection().add_doses(vaccine, count)?;
        tracing::info!(session = %self.session_id, vaccine, doses = updated.doses, "Doses updated");
        Ok(updated)
    }

    /// Appointments in which the logged-in identity takes part.
    pub fn show_appointments(&self) -> Result<Vec<Appointment>> {
        let identity = self.session.require_authenticated()?;
        let conn = self.db.connection();
        match identity.role {
            Role::Patient => conn.appointments_for_patient(&identity.username),
            Role::Caregiver => conn.appointments_for_caregiver(&identity.username),
        }
    }
}
