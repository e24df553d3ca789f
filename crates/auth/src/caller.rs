use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// A resolved, authenticated caller.
///
/// Construction is decoupled from transport: the outer layer verifies
/// credentials and hands the engine this boundary object. Checks here are
/// pure policy, no IO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            is_active: true,
            is_verified: true,
        }
    }

    /// Deactivated accounts are locked out of every operation.
    pub fn ensure_active(&self) -> DomainResult<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(DomainError::AccessDenied)
        }
    }

    /// Require an active caller with the given role.
    pub fn ensure_role(&self, role: Role) -> DomainResult<()> {
        self.ensure_active()?;
        if self.role == role {
            Ok(())
        } else {
            Err(DomainError::AccessDenied)
        }
    }

    /// Admins bypass ownership checks but not activity checks.
    pub fn ensure_admin(&self) -> DomainResult<()> {
        self.ensure_role(Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> Caller {
        Caller::new(UserId::new(), role)
    }

    #[test]
    fn inactive_caller_is_denied() {
        let mut c = caller(Role::Admin);
        c.is_active = false;
        assert_eq!(c.ensure_active(), Err(DomainError::AccessDenied));
        assert_eq!(c.ensure_admin(), Err(DomainError::AccessDenied));
    }

    #[test]
    fn role_checks_are_exact() {
        let c = caller(Role::Reseller);
        assert!(c.ensure_role(Role::Reseller).is_ok());
        assert_eq!(c.ensure_role(Role::Manufacturer), Err(DomainError::AccessDenied));
        assert!(!c.is_admin());
    }
}
