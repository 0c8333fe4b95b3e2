//! Read-only export of the appointment ledger.
//!
//! Appointments are written as CSV (one row per appointment, with headers) or
//! as a JSON array, ordered by appointment id.

use crate::ledger::AppointmentLedger;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Output encoding for [`export_appointments`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Write every appointment to `writer`, returning how many were written.
pub fn export_appointments<L, W>(ledger: &L, format: ExportFormat, writer: W) -> Result<usize>
where
    L: AppointmentLedger + ?Sized,
    W: Write,
{
    let appointments = ledger.appointments()?;

    match format {
        ExportFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for appointment in &appointments {
                csv_writer.serialize(appointment)?;
            }
            csv_writer.flush()?;
        }
        ExportFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &appointments)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }

    tracing::info!("Exported {} appointments as {:?}", appointments.len(), format);
    Ok(appointments.len())
}

/// Export to a file, replacing it atomically
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over `path`, so readers never observe a half-written export.
pub fn export_appointments_to_path<L>(ledger: &L, format: ExportFormat, path: &Path) -> Result<usize>
where
    L: AppointmentLedger + ?Sized,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let count = export_appointments(ledger, format, std::io::BufWriter::new(temp.as_file()))?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Wrote export to {:?}", path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CredentialStore, InventoryLedger};
    use crate::password::Credentials;
    use crate::sqlite::Database;
    use crate::{Appointment, Role};
    use chrono::NaiveDate;

    fn db_with_appointments(n: usize) -> Database {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let creds = Credentials::derive("Abcdef1!");
        conn.create_identity(Role::Patient, "pat", &creds).unwrap();
        conn.create_identity(Role::Caregiver, "cg", &creds).unwrap();
        conn.add_doses("Pfizer", 10).unwrap();

        for day in 1..=n as u32 {
            conn.insert_appointment(&Appointment {
                id: conn.allocate_appointment_id().unwrap(),
                vaccine: "Pfizer".into(),
                date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                patient: "pat".into(),
                caregiver: "cg".into(),
            })
            .unwrap();
        }
        db
    }

    #[test]
    fn test_csv_export() {
        let db = db_with_appointments(2);
        let mut out = Vec::new();

        let count = export_appointments(db.connection(), ExportFormat::Csv, &mut out).unwrap();

        assert_eq!(count, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "id,vaccine,date,patient,caregiver");
        assert_eq!(lines[1], "1,Pfizer,2024-06-01,pat,cg");
        assert_eq!(lines[2], "2,Pfizer,2024-06-02,pat,cg");
    }

    #[test]
    fn test_json_export() {
        let db = db_with_appointments(1);
        let mut out = Vec::new();

        export_appointments(db.connection(), ExportFormat::Json, &mut out).unwrap();

        let parsed: Vec<Appointment> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, db.connection().appointments().unwrap());
    }

    #[test]
    fn test_empty_export() {
        let db = db_with_appointments(0);
        let mut out = Vec::new();
        let count = export_appointments(db.connection(), ExportFormat::Json, &mut out).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }

    #[test]
    fn test_export_to_path_replaces_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out/appointments.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        let db = db_with_appointments(3);
        let count = export_appointments_to_path(db.connection(), ExportFormat::Csv, &path).unwrap();

        assert_eq!(count, 3);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(text.lines().count(), 4);

        let extras: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "appointments.csv")
            .collect();
        assert!(extras.is_empty(), "stray temp files: {:?}", extras);
    }
}
