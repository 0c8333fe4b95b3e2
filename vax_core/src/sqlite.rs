//! SQLite-backed ledgers.
//!
//! All ledger traits are implemented directly on [`rusqlite::Connection`].
//! [`Database`] owns the connection, applies the schema, and provides the
//! immediate-mode transaction boundary used by multi-step mutations.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::is_duplicate_key;
use crate::ledger::{AppointmentLedger, AvailabilityLedger, CredentialStore, InventoryLedger};
use crate::password::Credentials;
use crate::{Appointment, AppointmentId, Error, Result, Role, Vaccine};

const APPOINTMENT_SEQUENCE: &str = "appointment";

/// Handle to the scheduler database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens or creates the database at `path`.
    ///
    /// Enables WAL mode so readers do not block the writer, and waits at most
    /// `busy_timeout` for a competing writer before failing.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened database at {:?}", path);
        Self::init_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Connection for reads and single-statement writes.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken up front, so two callers cannot both read the
    /// same slot or dose count and then both consume it. Commits when `f`
    /// returns `Ok`; any `Err` drops the transaction, which rolls it back.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

impl CredentialStore for Connection {
    fn username_exists(&self, role: Role, username: &str) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE username = ?1)",
            role.table()
        );
        let exists: bool = self.query_row(&sql, params![username], |row| row.get(0))?;
        Ok(exists)
    }

    fn create_identity(&self, role: Role, username: &str, credentials: &Credentials) -> Result<()> {
        let sql = format!(
            "INSERT INTO {}(username, salt, hash) VALUES (?1, ?2, ?3)",
            role.table()
        );
        self.execute(&sql, params![username, credentials.salt, credentials.hash])
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    Error::Conflict("Username taken, try again!".into())
                } else {
                    Error::Storage(e)
                }
            })?;
        Ok(())
    }

    fn credentials(&self, role: Role, username: &str) -> Result<Option<Credentials>> {
        let sql = format!("SELECT salt, hash FROM {} WHERE username = ?1", role.table());
        let found = self
            .query_row(&sql, params![username], |row| {
                Ok(Credentials {
                    salt: row.get(0)?,
                    hash: row.get(1)?,
                })
            })
            .optional()?;
        Ok(found)
    }
}

impl InventoryLedger for Connection {
    fn vaccine(&self, name: &str) -> Result<Option<Vaccine>> {
        let found = self
            .query_row(
                "SELECT name, doses FROM vaccines WHERE name = ?1",
                params![name],
                vaccine_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn vaccines(&self) -> Result<Vec<Vaccine>> {
        let mut stmt = self.prepare("SELECT name, doses FROM vaccines ORDER BY name ASC")?;
        let rows = stmt.query_map([], vaccine_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn add_doses(&self, name: &str, count: u32) -> Result<Vaccine> {
        let vaccine = self.query_row(
            "INSERT INTO vaccines(name, doses) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET doses = doses + excluded.doses
             RETURNING name, doses",
            params![name, count],
            vaccine_from_row,
        )?;
        Ok(vaccine)
    }

    fn take_dose(&self, name: &str) -> Result<()> {
        let changed = self.execute(
            "UPDATE vaccines SET doses = doses - 1 WHERE name = ?1 AND doses > 0",
            params![name],
        )?;
        if changed == 1 {
            return Ok(());
        }

        match self.vaccine(name)? {
            Some(_) => Err(Error::OutOfStock(name.to_string())),
            None => Err(Error::NotFound(format!("Vaccine {}", name))),
        }
    }
}

impl AvailabilityLedger for Connection {
    fn publish(&self, caregiver: &str, date: NaiveDate) -> Result<()> {
        self.execute(
            "INSERT INTO availabilities(caregiver, date) VALUES (?1, ?2)",
            params![caregiver, date],
        )
        .map_err(|e| {
            if is_duplicate_key(&e) {
                Error::Conflict(format!("Availability for {} is already uploaded", date))
            } else {
                Error::Storage(e)
            }
        })?;
        Ok(())
    }

    fn caregivers_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        let mut stmt = self.prepare(
            "SELECT caregiver FROM availabilities WHERE date = ?1 ORDER BY caregiver ASC",
        )?;
        let rows = stmt.query_map(params![date], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn remove_slot(&self, caregiver: &str, date: NaiveDate) -> Result<()> {
        let removed = self.execute(
            "DELETE FROM availabilities WHERE caregiver = ?1 AND date = ?2",
            params![caregiver, date],
        )?;
        if removed == 0 {
            return Err(Error::NoAvailability(date));
        }
        Ok(())
    }
}

impl AppointmentLedger for Connection {
    fn allocate_appointment_id(&self) -> Result<AppointmentId> {
        let id: i64 = self.query_row(
            "UPDATE sequences SET next_value = next_value + 1 WHERE name = ?1
             RETURNING next_value - 1",
            params![APPOINTMENT_SEQUENCE],
            |row| row.get(0),
        )?;
        Ok(AppointmentId(id))
    }

    fn insert_appointment(&self, appointment: &Appointment) -> Result<()> {
        self.execute(
            "INSERT INTO appointments(id, vaccine, date, patient, caregiver)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                appointment.id.0,
                appointment.vaccine,
                appointment.date,
                appointment.patient,
                appointment.caregiver,
            ],
        )
        .map_err(|e| {
            if is_duplicate_key(&e) {
                Error::Conflict(format!("Appointment #{} already exists", appointment.id))
            } else {
                Error::Storage(e)
            }
        })?;
        Ok(())
    }

    fn appointments_for_patient(&self, patient: &str) -> Result<Vec<Appointment>> {
        query_appointments(
            self,
            "SELECT id, vaccine, date, patient, caregiver FROM appointments
             WHERE patient = ?1 ORDER BY id ASC",
            patient,
        )
    }

    fn appointments_for_caregiver(&self, caregiver: &str) -> Result<Vec<Appointment>> {
        query_appointments(
            self,
            "SELECT id, vaccine, date, patient, caregiver FROM appointments
             WHERE caregiver = ?1 ORDER BY id ASC",
            caregiver,
        )
    }

    fn appointments(&self) -> Result<Vec<Appointment>> {
        let mut stmt = self.prepare(
            "SELECT id, vaccine, date, patient, caregiver FROM appointments ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], appointment_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn query_appointments(conn: &Connection, sql: &str, username: &str) -> Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![username], appointment_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn vaccine_from_row(row: &Row<'_>) -> rusqlite::Result<Vaccine> {
    let doses: i64 = row.get(1)?;
    Ok(Vaccine {
        name: row.get(0)?,
        // CHECK (doses >= 0) holds for every stored row
        doses: doses.max(0) as u64,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: AppointmentId(row.get(0)?),
        vaccine: row.get(1)?,
        date: row.get(2)?,
        patient: row.get(3)?,
        caregiver: row.get(4)?,
    })
}
