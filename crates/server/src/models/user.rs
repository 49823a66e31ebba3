//! User account model.

use perche_core::{Email, UserId};

/// A registered user.
///
/// The password hash lives in the same row but is only surfaced through
/// [`crate::db::users::UserRepository::get_password_hash`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub is_active: bool,
    /// Set once the user completes the SDK wizard; never cleared.
    pub has_submitted_website: bool,
}
