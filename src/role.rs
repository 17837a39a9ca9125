use std::fmt;

use crate::client::ClientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Holds the single admin slot. First connection to find the slot empty takes it,
/// and only that connection's disconnect frees it again.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    admin: Option<ClientId>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admin(&self) -> Option<ClientId> {
        self.admin
    }

    pub fn is_admin(&self, client_id: ClientId) -> bool {
        self.admin == Some(client_id)
    }

    pub fn assign(&mut self, client_id: ClientId) -> Role {
        match self.admin {
            None => {
                self.admin = Some(client_id);
                Role::Admin
            }
            Some(_) => Role::Viewer,
        }
    }

    /// Returns true when the released client was the admin.
    pub fn release(&mut self, client_id: ClientId) -> bool {
        if self.is_admin(client_id) {
            self.admin = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.admin = None;
    }
}
