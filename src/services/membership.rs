use crate::error::Result;

/// Account and role provisioning backend.
///
/// Used by the account and role step kinds. The dispatcher fails with
/// [`UpdateError::InvalidOperation`](crate::UpdateError::InvalidOperation)
/// when such a step runs without an adapter configured on the
/// [`Updater`](crate::Updater).
pub trait MembershipAdapter: Send + Sync {
    /// Creates a new user.
    fn create_user(&self, user_name: &str, password: &str, email: Option<&str>) -> Result<()>;

    /// Assigns an existing user to roles.
    fn add_user_to_roles(&self, user_name: &str, roles: &[String]) -> Result<()>;

    /// Deletes a user. Returns `false` if the user did not exist.
    fn delete_user(&self, user_name: &str) -> Result<bool>;

    /// Returns `true` if the user exists.
    fn user_exists(&self, user_name: &str) -> Result<bool>;

    /// Creates a role.
    fn create_role(&self, role_name: &str) -> Result<()>;

    /// Deletes a role.
    fn delete_role(&self, role_name: &str) -> Result<()>;
}
