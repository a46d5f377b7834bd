use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Unknown username or wrong password. Callers must not be able to tell
    /// the two apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The password may or may not have matched; the account is disabled.
    #[error("Account is inactive")]
    AccountInactive,

    /// No refresh token row matches the presented secret.
    #[error("Refresh token not found")]
    TokenNotFound,

    #[error("Assigning role {parent_id} as parent of role {role_id} would create a cycle")]
    CyclicRoleAssignment { role_id: DbId, parent_id: DbId },
}

impl CoreError {
    /// Whether this error is one of the authentication failures that must be
    /// collapsed into a single outward-facing outcome.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidCredentials | CoreError::AccountInactive | CoreError::TokenNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failures_are_grouped() {
        assert!(CoreError::InvalidCredentials.is_authentication_failure());
        assert!(CoreError::AccountInactive.is_authentication_failure());
        assert!(CoreError::TokenNotFound.is_authentication_failure());
        assert!(!CoreError::Validation("x".into()).is_authentication_failure());
        assert!(!CoreError::CyclicRoleAssignment {
            role_id: 1,
            parent_id: 2
        }
        .is_authentication_failure());
    }

    #[test]
    fn cyclic_assignment_message_names_both_roles() {
        let err = CoreError::CyclicRoleAssignment {
            role_id: 3,
            parent_id: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("role 3"));
        assert!(msg.contains("7"));
    }
}
