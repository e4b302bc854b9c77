//! User registry
//!
//! Active identities in registration order, each bound to exactly one connection.

use serde_json::Value;

use crate::error::RegistrationError;
use crate::types::{non_blank_text, ConnectionId, IdentityId};

/// A registered participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Display name, unique among active identities
    pub display_name: String,
    /// Token handed back to the client
    pub id: IdentityId,
    /// Owning connection
    pub connection: ConnectionId,
}

/// In-memory set of active identities
///
/// Backed by a `Vec` so replay follows registration order.
#[derive(Debug, Default)]
pub struct UserRegistry {
    identities: Vec<Identity>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `candidate` as the display name for `connection`
    ///
    /// Rejects non-string and blank names, names held by another active
    /// identity (exact match), and connections that already hold an identity.
    pub fn register(
        &mut self,
        candidate: &Value,
        connection: ConnectionId,
    ) -> Result<Identity, RegistrationError> {
        let name = non_blank_text(candidate)?;

        if let Some(existing) = self.lookup_by_connection(connection) {
            return Err(RegistrationError::AlreadyRegistered(
                existing.display_name.clone(),
            ));
        }

        if self.identities.iter().any(|i| i.display_name == name) {
            return Err(RegistrationError::NameTaken(name.to_string()));
        }

        let identity = Identity {
            display_name: name.to_string(),
            id: IdentityId::new(),
            connection,
        };
        self.identities.push(identity.clone());
        Ok(identity)
    }

    pub fn lookup_by_connection(&self, connection: ConnectionId) -> Option<&Identity> {
        self.identities.iter().find(|i| i.connection == connection)
    }

    pub fn lookup_by_id(&self, id: IdentityId) -> Option<&Identity> {
        self.identities.iter().find(|i| i.id == id)
    }

    /// Remove the identity bound to `connection`, if any
    ///
    /// Safe to call for connections that never registered or were already removed.
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Identity> {
        let index = self
            .identities
            .iter()
            .position(|i| i.connection == connection)?;
        Some(self.identities.remove(index))
    }

    /// All active identities in registration order
    pub fn list_all(&self) -> &[Identity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
