//! User profiles.

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::status::ProfileRole;

/// A row of the `profiles` table, keyed by the auth user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: ProfileRole,
}

impl Profile {
    /// Only profiles with the `admin` role may use the admin panel.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ProfileRole::Admin
    }
}
