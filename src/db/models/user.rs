//! User, session, and platform role models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Platform-level roles assigned to accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Oversees the whole call lifecycle
    Admin,
    /// Submits and runs startups
    Founder,
    /// Scores submitted startups
    Reviewer,
    /// Funds accepted startups
    Sponsor,
}

impl UserRole {
    /// Roles that can be chosen at self-registration. Admin accounts are
    /// only created through bootstrap config or by another admin.
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Founder => write!(f, "founder"),
            UserRole::Reviewer => write!(f, "reviewer"),
            UserRole::Sponsor => write!(f, "sponsor"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "founder" => Ok(UserRole::Founder),
            "reviewer" => Ok(UserRole::Reviewer),
            "sponsor" => Ok(UserRole::Sponsor),
            _ => Err(format!("Unknown user role: {}", s)),
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(UserRole::Founder)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Get the role as a UserRole enum
    pub fn role_enum(&self) -> UserRole {
        UserRole::from(self.role.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.role_enum() == UserRole::Admin
    }
}

/// User shape returned by the API (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Self-registration request (founder, reviewer, or sponsor accounts)
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::Admin,
            UserRole::Founder,
            UserRole::Reviewer,
            UserRole::Sponsor,
        ] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_defaults_to_founder() {
        assert_eq!(UserRole::from("board_member".to_string()), UserRole::Founder);
    }

    #[test]
    fn test_admin_is_not_self_registrable() {
        assert!(!UserRole::Admin.is_self_registrable());
        assert!(UserRole::Founder.is_self_registrable());
        assert!(UserRole::Reviewer.is_self_registrable());
        assert!(UserRole::Sponsor.is_self_registrable());
    }
}
