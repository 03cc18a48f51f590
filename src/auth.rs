//! Login gate for the command-line front end
//!
//! The library itself is auth-agnostic; binaries call [`Credentials::login`]
//! before touching the registry or store.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CatalogError, Result};

/// Role granted to a logged-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

/// The single configured account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

/// A successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub role: Role,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin123".to_string()
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Credentials {
    /// Check a username/password pair against the configured account
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let pass_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());

        if user_ok && pass_ok {
            info!(user = username, "login accepted");
            Ok(Session {
                user: username.to_string(),
                role: Role::Admin,
            })
        } else {
            warn!(user = username, "login rejected");
            Err(CatalogError::Unauthorized)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_login() {
        let session = Credentials::default().login("admin", "admin123").unwrap();
        assert_eq!(session.user, "admin");
        assert_eq!(session.role, Role::Admin);
    }

    #[test]
    fn test_wrong_password_rejected() {
        let err = Credentials::default().login("admin", "admin").unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized));
        assert!(Credentials::default().login("root", "admin123").is_err());
    }

    #[test]
    fn test_configured_credentials() {
        let creds = Credentials {
            username: "ops".to_string(),
            password: "s3cret".to_string(),
        };
        assert!(creds.login("ops", "s3cret").is_ok());
        assert!(creds.login("admin", "admin123").is_err());
    }
}
