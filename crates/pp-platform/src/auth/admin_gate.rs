//! Role Resolver
//!
//! Maps a verified identity to its role by lookup in the user directory and
//! gates admin-scoped operations. Fails closed: an unknown email or any role
//! other than admin is rejected, and the check always runs against the
//! authenticated identity, never a client-supplied path email.

use crate::shared::error::{PlatformError, Result};
use crate::user::repository::UserRepository;

/// Require that the authenticated email resolves to an admin user.
///
/// The rejection message is identical for "no such user" and "not an admin"
/// so the gate does not leak directory contents.
pub async fn require_admin(users: &UserRepository, email: &str) -> Result<()> {
    let user = users.find_by_email(email).await?;
    match user {
        Some(u) if u.role.is_admin() => Ok(()),
        _ => Err(PlatformError::forbidden("Admin role required")),
    }
}
