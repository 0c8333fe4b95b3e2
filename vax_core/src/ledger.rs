//! Storage interfaces used by the session layer and the reservation engine.
//!
//! Every trait is implemented for `rusqlite::Connection` in [`crate::sqlite`],
//! so the same calls run against a plain connection or inside a transaction
//! (a `rusqlite::Transaction` derefs to its connection).

use crate::password::Credentials;
use crate::{Appointment, AppointmentId, Result, Role, Vaccine};
use chrono::NaiveDate;

/// Per-role account storage
pub trait CredentialStore {
    fn username_exists(&self, role: Role, username: &str) -> Result<bool>;

    /// Insert a new account. Fails with `Conflict` if the username is taken.
    fn create_identity(&self, role: Role, username: &str, credentials: &Credentials) -> Result<()>;

    fn credentials(&self, role: Role, username: &str) -> Result<Option<Credentials>>;
}

/// Vaccines and their dose counts
pub trait InventoryLedger {
    fn vaccine(&self, name: &str) -> Result<Option<Vaccine>>;

    /// All vaccines ordered by name.
    fn vaccines(&self) -> Result<Vec<Vaccine>>;

    /// Create the vaccine with `count` doses, or add `count` to an existing one.
    fn add_doses(&self, name: &str, count: u32) -> Result<Vaccine>;

    /// Remove exactly one dose. Fails with `OutOfStock` rather than going negative.
    fn take_dose(&self, name: &str) -> Result<()>;
}

/// Open `(caregiver, date)` slots
pub trait AvailabilityLedger {
    /// Publish one slot. Fails with `Conflict` if the pair already exists.
    fn publish(&self, caregiver: &str, date: NaiveDate) -> Result<()>;

    /// Caregivers with an open slot on `date`, lexicographically ordered.
    fn caregivers_on(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Consume a slot. Fails with `NoAvailability` if it no longer exists.
    fn remove_slot(&self, caregiver: &str, date: NaiveDate) -> Result<()>;
}

/// Booked appointments
pub trait AppointmentLedger {
    /// Draw the next id from the persisted sequence.
    fn allocate_appointment_id(&self) -> Result<AppointmentId>;

    fn insert_appointment(&self, appointment: &Appointment) -> Result<()>;

    fn appointments_for_patient(&self, patient: &str) -> Result<Vec<Appointment>>;

    fn appointments_for_caregiver(&self, caregiver: &str) -> Result<Vec<Appointment>>;

    /// Every appointment, ordered by id.
    fn appointments(&self) -> Result<Vec<Appointment>>;
}
