//! Reservation engine for booking vaccination appointments.
//!
//! This module turns a patient's `(date, vaccine)` request into an appointment:
//! - Check the vaccine exists and still has doses
//! - Pick a caregiver with an open slot on the date
//! - Allocate an appointment id from the persisted sequence
//! - Record the appointment, consume the slot and take one dose atomically

use crate::ledger::{AppointmentLedger, AvailabilityLedger, InventoryLedger};
use crate::sqlite::Database;
use crate::{Appointment, Error, Reservation, Result};
use chrono::NaiveDate;

/// Reserve one dose of `vaccine` for `patient` on `date`
///
/// ## Steps
///
/// 1. **Pre-check** (read-only): vaccine exists (`NotFound`), has doses
///    (`OutOfStock`), and some caregiver is free on `date` (`NoAvailability`).
///    Nothing is written if this fails.
///
/// 2. **Id allocation**: the next appointment id is drawn and committed on
///    its own, so an id is never handed out twice even if step 3 fails.
///
/// 3. **Apply** inside one `BEGIN IMMEDIATE` transaction: re-run the
///    pre-check under the write lock, insert the appointment, remove the
///    slot, take the dose. Any failure rolls back all three writes.
///
/// The caregiver is the lexicographically smallest username with an open
/// slot, independent of storage order.
pub fn reserve(
    db: &mut Database,
    patient: &str,
    date: NaiveDate,
    vaccine: &str,
) -> Result<Reservation> {
    let candidate = select_caregiver(db.connection(), date, vaccine)?;
    tracing::debug!(%date, vaccine, caregiver = %candidate, "Reservation pre-check passed");

    let appointment_id = db.connection().allocate_appointment_id()?;

    let result = db.transaction(|tx| {
        // Another session may have taken the slot or the last dose meanwhile
        let caregiver = select_caregiver(tx, date, vaccine)?;

        let appointment = Appointment {
            id: appointment_id,
            vaccine: vaccine.to_string(),
            date,
            patient: patient.to_string(),
            caregiver: caregiver.clone(),
        };
        tx.insert_appointment(&appointment)?;
        tx.remove_slot(&caregiver, date)?;
        tx.take_dose(vaccine)?;

        Ok(Reservation {
            appointment_id,
            caregiver,
            vaccine: vaccine.to_string(),
            date,
        })
    });

    match &result {
        Ok(reservation) => tracing::info!(
            id = %reservation.appointment_id,
            caregiver = %reservation.caregiver,
            patient,
            "Reservation committed"
        ),
        Err(e) => tracing::warn!(
            id = %appointment_id,
            patient,
            "Reservation rolled back: {}",
            e
        ),
    }

    result
}

/// Validate stock and pick the caregiver for `date`.
fn select_caregiver<L>(ledger: &L, date: NaiveDate, vaccine: &str) -> Result<String>
where
    L: InventoryLedger + AvailabilityLedger + ?Sized,
{
    let stock = ledger
        .vaccine(vaccine)?
        .ok_or_else(|| Error::NotFound(format!("Vaccine {}", vaccine)))?;

    if stock.doses == 0 {
        return Err(Error::OutOfStock(stock.name));
    }

    choose_caregiver(ledger.caregivers_on(date)?).ok_or(Error::NoAvailability(date))
}

/// Tie-break among available caregivers: smallest username wins.
pub fn choose_caregiver(candidates: impl IntoIterator<Item = String>) -> Option<String> {
    candidates.into_iter().min()
}
