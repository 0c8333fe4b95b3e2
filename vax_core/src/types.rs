//! Core domain types for the vaccine scheduler.
//!
//! This module defines the records shared by the ledgers, the session and the
//! reservation engine:
//! - Roles and authenticated identities
//! - Vaccines and their dose counts
//! - Availability slots and appointments
//! - Read models returned by schedule queries and reservations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identity Types
// ============================================================================

/// The two account namespaces. A username is unique within a role only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Caregiver,
}

impl Role {
    /// Table holding this role's credentials.
    pub(crate) fn table(self) -> &'static str {
        match self {
            Role::Patient => "patients",
            Role::Caregiver => "caregivers",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => f.write_str("Patient"),
            Role::Caregiver => f.write_str("Caregiver"),
        }
    }
}

/// An authenticated (or freshly registered) account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub username: String,
}

impl Identity {
    pub fn new(role: Role, username: impl Into<String>) -> Self {
        Self {
            role,
            username: username.into(),
        }
    }
}

// ============================================================================
// Ledger Records
// ============================================================================

/// A named vaccine and its remaining doses
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vaccine {
    pub name: String,
    pub doses: u64,
}

/// Appointment identifier drawn from the persisted sequence (starts at 1)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AppointmentId(pub i64);

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A booked appointment. Immutable once inserted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub vaccine: String,
    pub date: NaiveDate,
    pub patient: String,
    pub caregiver: String,
}

impl Appointment {
    /// The other party from the point of view of `role`.
    pub fn counterpart(&self, role: Role) -> &str {
        match role {
            Role::Patient => &self.caregiver,
            Role::Caregiver => &self.patient,
        }
    }
}

// ============================================================================
// Read Models
// ============================================================================

/// Result of `search_caregiver_schedule`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub date: NaiveDate,
    /// Caregivers with an open slot, lexicographically ordered
    pub caregivers: Vec<String>,
    /// Full inventory, ordered by vaccine name
    pub vaccines: Vec<Vaccine>,
}

/// Outcome of a successful reservation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub appointment_id: AppointmentId,
    pub caregiver: String,
    pub vaccine: String,
    pub date: NaiveDate,
}
