//! # Authorization collaborator.
//!
//! Operations carry an opaque [`Identity`] token. The executor asks an [`Authorize`]
//! implementation whether the identity holds the [`Privilege`] an operation needs;
//! denials come back as [`Fault::AccessDenied`](crate::Fault::AccessDenied) and are
//! classified like any other fault.

use std::fmt;
use std::sync::Arc;

use crate::faults::Fault;

/// Opaque caller identity (session token, principal name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(Arc<str>);

impl Identity {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Privilege required by an administrative operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// Read plan status.
    Monitor,
    /// Run statements and control plans.
    Admin,
}

impl Privilege {
    pub const fn as_label(self) -> &'static str {
        match self {
            Privilege::Monitor => "monitor",
            Privilege::Admin => "admin",
        }
    }
}

/// External authorization checker.
pub trait Authorize: Send + Sync + 'static {
    /// `Ok(())` when `identity` holds `privilege`; an access-denied fault otherwise.
    fn check(&self, identity: &Identity, privilege: Privilege) -> Result<(), Fault>;
}

/// Grants every privilege.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorize for AllowAll {
    fn check(&self, _identity: &Identity, _privilege: Privilege) -> Result<(), Fault> {
        Ok(())
    }
}
