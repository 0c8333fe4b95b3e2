//! Interactive read/dispatch loop.
//!
//! Each input line runs to completion before the next is read. Command-level
//! failures are printed as one outcome line and never end the loop; only
//! `quit`, end of input, or a broken stdout does.

use std::io::{self, BufRead, Write};

use vax_core::{Role, Scheduler, Session};

use crate::command::{gate, Command, ParseError, OPERATIONS};

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn print_greeting<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Welcome to the COVID-19 Vaccine Reservation Scheduling Application!")?;
    writeln!(out, "*** Please enter one of the following commands ***")?;
    for (_, usage) in OPERATIONS {
        writeln!(out, "> {}", usage)?;
    }
    writeln!(out)
}

/// Run the prompt loop until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(scheduler: &mut Scheduler, mut input: R, out: &mut W) -> io::Result<()> {
    print_greeting(out)?;

    let mut buf = Vec::new();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            break;
        }
        // Undecodable bytes become U+FFFD and fail like any other bad token
        let line = String::from_utf8_lossy(&buf);

        match Command::parse(&line) {
            Ok(Some(command)) => {
                if execute(scheduler, command, out)? == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(ParseError::WrongArity { operation, usage }) => {
                // An unauthorized caller learns about the login first
                match gate(operation).map(|g| g.check(scheduler.session())) {
                    Some(Err(e)) => writeln!(out, "{}", e)?,
                    _ => writeln!(out, "{}", ParseError::WrongArity { operation, usage })?,
                }
            }
            Err(e) => writeln!(out, "{}", e)?,
        }
    }

    tracing::debug!(session = %scheduler.session_id(), "Shell loop finished");
    Ok(())
}

/// Execute one command, writing its outcome to `out`.
pub fn execute<W: Write>(scheduler: &mut Scheduler, command: Command, out: &mut W) -> io::Result<Flow> {
    let outcome = match command {
        Command::Quit => {
            writeln!(out, "Bye!")?;
            return Ok(Flow::Quit);
        }
        Command::Register {
            role,
            username,
            password,
        } => scheduler
            .register(role, &username, &password)
            .map(|identity| format!("{} account created: {}", identity.role, identity.username)),
        Command::Login {
            role,
            username,
            password,
        } => scheduler
            .login(role, &username, &password)
            .map(|identity| format!("{} logged in as: {}", identity.role, identity.username)),
        Command::SearchSchedule { date } => scheduler.search_schedule(&date).map(|schedule| {
            let caregivers = if schedule.caregivers.is_empty() {
                "none".to_string()
            } else {
                schedule.caregivers.join(", ")
            };
            let mut text = format!("Caregivers available on {}: {}", schedule.date, caregivers);
            if schedule.vaccines.is_empty() {
                text.push_str("\nNo vaccines in inventory.");
            }
            for vaccine in &schedule.vaccines {
                text.push_str(&format!(
                    "\nThere are {} doses of the {} vaccine available!",
                    vaccine.doses, vaccine.name
                ));
            }
            text
        }),
        Command::Reserve { date, vaccine } => scheduler
            .reserve(&date, &vaccine)
            .map(|r| format!("Reservation {} made with {}!", r.appointment_id, r.caregiver)),
        Command::UploadAvailability { date } => scheduler
            .upload_availability(&date)
            .map(|date| format!("Availability uploaded for {}!", date)),
        Command::AddDoses { vaccine, count } => scheduler
            .add_doses(&vaccine, &count)
            .map(|v| format!("Doses updated! {} now has {} doses.", v.name, v.doses)),
        Command::ShowAppointments => show_appointments(scheduler),
        Command::Cancel { appointment_id } => {
            tracing::debug!(%appointment_id, "Cancel requested");
            Ok("Cancelling appointments is not supported yet.".to_string())
        }
        Command::Logout => scheduler
            .logout()
            .map(|_| "You have been logged out".to_string()),
    };

    match outcome {
        Ok(text) => writeln!(out, "{}", text)?,
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "Command failed: {}", e);
            writeln!(out, "{}", e)?;
        }
    }
    Ok(Flow::Continue)
}

fn show_appointments(scheduler: &Scheduler) -> vax_core::Result<String> {
    let appointments = scheduler.show_appointments()?;
    let role = match scheduler.session() {
        Session::Caregiver(_) => Role::Caregiver,
        _ => Role::Patient,
    };

    if appointments.is_empty() {
        return Ok("No appointments scheduled.".to_string());
    }

    let counterpart_label = match role {
        Role::Patient => "caregiver",
        Role::Caregiver => "patient",
    };
    let lines: Vec<String> = appointments
        .iter()
        .map(|a| {
            format!(
                "Appointment #{}: {} on {} with {} {}",
                a.id,
                a.vaccine,
                a.date,
                counterpart_label,
                a.counterpart(role)
            )
        })
        .collect();
    Ok(lines.join("\n"))
}
