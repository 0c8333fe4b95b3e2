//! Authentication state for one interactive caller.
//!
//! At most one identity is authenticated at a time, and the role tag is part of
//! the state, so "patient and caregiver both logged in" is unrepresentable.

use crate::{Error, Identity, Result, Role};

/// Who, if anyone, is logged in
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Patient(Identity),
    Caregiver(Identity),
}

impl Session {
    /// The authenticated identity, if any.
    pub fn current(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Patient(identity) | Session::Caregiver(identity) => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Transition `Anonymous` -> `Authenticated<role>`.
    ///
    /// Fails without changing state if someone is already logged in.
    pub fn login(&mut self, identity: Identity) -> Result<()> {
        if let Some(current) = self.current() {
            return Err(Error::Unauthorized(format!(
                "Already logged-in as {}! Please logout first.",
                current.username
            )));
        }

        tracing::info!(username = %identity.username, role = %identity.role, "Session authenticated");
        *self = match identity.role {
            Role::Patient => Session::Patient(identity),
            Role::Caregiver => Session::Caregiver(identity),
        };
        Ok(())
    }

    /// Transition back to `Anonymous`, returning who was logged in.
    pub fn logout(&mut self) -> Result<Identity> {
        match std::mem::take(self) {
            Session::Anonymous => Err(Error::Unauthorized("User is not logged in!".into())),
            Session::Patient(identity) | Session::Caregiver(identity) => Ok(identity),
        }
    }

    /// Gate for role-specific commands.
    pub fn require(&self, role: Role) -> Result<&Identity> {
        match (self, role) {
            (Session::Patient(identity), Role::Patient)
            | (Session::Caregiver(identity), Role::Caregiver) => Ok(identity),
            _ => Err(Error::Unauthorized(match role {
                Role::Patient => "Please login as a patient!".into(),
                Role::Caregiver => "Please login as a caregiver!".into(),
            })),
        }
    }

    /// Gate for commands open to either role.
    pub fn require_authenticated(&self) -> Result<&Identity> {
        self.current()
            .ok_or_else(|| Error::Unauthorized("Please login as a caregiver or patient!".into()))
    }
}
