//! The administrative role name.
//!
//! Must match the seed data in `crates/db/migrations/20240101000001_create_roles.sql`.

pub const ROLE_ADMIN: &str = "Admin";

/// Whether `role_name` grants administrative access. Role names are compared
/// case-insensitively because the legacy data set mixes `admin` and `Admin`.
pub fn is_admin(role_name: &str) -> bool {
    role_name.eq_ignore_ascii_case(ROLE_ADMIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check_ignores_case() {
        assert!(is_admin("Admin"));
        assert!(is_admin("admin"));
        assert!(is_admin("ADMIN"));
        assert!(!is_admin("User"));
        assert!(!is_admin("administrator"));
    }
}
