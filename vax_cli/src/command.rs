//! Tokenizing shell input lines into commands.

use std::fmt;
use vax_core::{Error, Role, Session};

/// Every operation with its usage string, in menu order
pub const OPERATIONS: &[(&str, &str)] = &[
    ("create_patient", "create_patient <username> <password>"),
    ("create_caregiver", "create_caregiver <username> <password>"),
    ("login_patient", "login_patient <username> <password>"),
    ("login_caregiver", "login_caregiver <username> <password>"),
    ("search_caregiver_schedule", "search_caregiver_schedule <date>"),
    ("reserve", "reserve <date> <vaccine>"),
    ("upload_availability", "upload_availability <date>"),
    ("cancel", "cancel <appointment_id>"),
    ("add_doses", "add_doses <vaccine> <number>"),
    ("show_appointments", "show_appointments"),
    ("logout", "logout"),
    ("quit", "quit"),
];

/// One parsed shell command. Arguments are raw tokens; their meaning is
/// validated by the scheduler after the session check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Register {
        role: Role,
        username: String,
        password: String,
    },
    Login {
        role: Role,
        username: String,
        password: String,
    },
    SearchSchedule {
        date: String,
    },
    Reserve {
        date: String,
        vaccine: String,
    },
    UploadAvailability {
        date: String,
    },
    Cancel {
        appointment_id: String,
    },
    AddDoses {
        vaccine: String,
        count: String,
    },
    ShowAppointments,
    Logout,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    UnknownOperation(String),
    WrongArity {
        operation: &'static str,
        usage: &'static str,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownOperation(_) => write!(f, "Invalid operation name!"),
            ParseError::WrongArity { usage, .. } => {
                write!(f, "Please try again! Usage: {}", usage)
            }
        }
    }
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&operation, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let &(name, usage) = OPERATIONS
            .iter()
            .find(|(name, _)| *name == operation)
            .ok_or_else(|| ParseError::UnknownOperation(operation.to_string()))?;

        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(ParseError::WrongArity {
                    operation: name,
                    usage,
                })
            }
        };
        let owned = |i: usize| args[i].to_string();

        let command = match operation {
            "create_patient" | "create_caregiver" => {
                arity(2)?;
                Command::Register {
                    role: role_suffix(operation),
                    username: owned(0),
                    password: owned(1),
                }
            }
            "login_patient" | "login_caregiver" => {
                arity(2)?;
                Command::Login {
                    role: role_suffix(operation),
                    username: owned(0),
                    password: owned(1),
                }
            }
            "search_caregiver_schedule" => {
                arity(1)?;
                Command::SearchSchedule { date: owned(0) }
            }
            "reserve" => {
                arity(2)?;
                Command::Reserve {
                    date: owned(0),
                    vaccine: owned(1),
                }
            }
            "upload_availability" => {
                arity(1)?;
                Command::UploadAvailability { date: owned(0) }
            }
            "cancel" => {
                arity(1)?;
                Command::Cancel {
                    appointment_id: owned(0),
                }
            }
            "add_doses" => {
                arity(2)?;
                Command::AddDoses {
                    vaccine: owned(0),
                    count: owned(1),
                }
            }
            "show_appointments" => {
                arity(0)?;
                Command::ShowAppointments
            }
            "logout" => {
                arity(0)?;
                Command::Logout
            }
            "quit" => {
                arity(0)?;
                Command::Quit
            }
            other => return Err(ParseError::UnknownOperation(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Who may run an operation, checked before its arguments are looked at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Role(Role),
    Authenticated,
}

impl Gate {
    pub fn check(self, session: &Session) -> Result<(), Error> {
        match self {
            Gate::Role(role) => session.require(role).map(|_| ()),
            Gate::Authenticated => session.require_authenticated().map(|_| ()),
        }
    }
}

/// Session gate for `operation`, if it has one.
pub fn gate(operation: &str) -> Option<Gate> {
    match operation {
        "reserve" => Some(Gate::Role(Role::Patient)),
        "upload_availability" | "add_doses" => Some(Gate::Role(Role::Caregiver)),
        "search_caregiver_schedule" | "show_appointments" => Some(Gate::Authenticated),
        _ => None,
    }
}

fn role_suffix(operation: &str) -> Role {
    if operation.ends_with("caregiver") {
        Role::Caregiver
    } else {
        Role::Patient
    }
}
