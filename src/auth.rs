// src/auth.rs
//! Session handling against the seeded user list.
//!
//! Credentials are plaintext and compared in memory. Nothing here is
//! suitable for real access control; it only gates which views a user sees.
use crate::error::AuthError;
use crate::models::{Role, User};
use log;

#[derive(Debug, Default)]
pub struct SessionManager {
    users: Vec<User>,
    current: Option<usize>,
}

impl SessionManager {
    pub fn new(users: Vec<User>) -> Self {
        SessionManager { users, current: None }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<&User, AuthError> {
        let username = username.trim();
        let password = password.trim();
        match self.users.iter().position(|u| u.username == username && u.password == password) {
            Some(idx) => {
                self.current = Some(idx);
                log::info!("User '{}' logged in as {:?}", username, self.users[idx].role);
                Ok(&self.users[idx])
            }
            None => {
                log::warn!("Login failed for '{}'", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.current() {
            log::info!("User '{}' logged out", user.username);
        }
        self.current = None;
    }

    pub fn current(&self) -> Option<&User> {
        self.current.and_then(|idx| self.users.get(idx))
    }

    /// The logged-in user, if they hold `role`.
    pub fn require(&self, role: Role) -> Result<&User, AuthError> {
        let user = self.current().ok_or(AuthError::NotLoggedIn)?;
        if user.role != role {
            return Err(AuthError::Forbidden(format!("'{}' is not a {:?}", user.username, role)));
        }
        Ok(user)
    }

    /// Changes a password for the lifetime of this process only; the seed is never rewritten.
    pub fn change_password(&mut self, username: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::Validation("New password cannot be empty.".to_string()));
        }
        let user = self
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;
        user.password = new_password.to_string();
        log::info!("Password changed for '{}' (in memory only)", username);
        Ok(())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn caretakers(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|u| u.role == Role::Caretaker)
    }

    /// Distinct caretaker guesthouses in first-seen order.
    pub fn guesthouses(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.caretakers().filter_map(|u| u.guesthouse.as_ref()) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_seed;

    fn manager() -> SessionManager {
        SessionManager::new(sample_seed().users)
    }

    #[test]
    fn test_login_wrong_password_leaves_no_session() {
        let mut auth = manager();
        assert!(matches!(auth.login("manager1", "wrongpass"), Err(AuthError::InvalidCredentials)));
        assert!(auth.current().is_none());
    }

    #[test]
    fn test_login_manager_sets_role() {
        let mut auth = manager();
        let user = auth.login("manager1", "admin123").unwrap();
        assert_eq!(user.role, Role::Manager);
        assert_eq!(auth.current().map(|u| u.username.as_str()), Some("manager1"));
    }

    #[test]
    fn test_login_trims_input_and_failure_keeps_previous_session() {
        let mut auth = manager();
        auth.login("  caretaker1 ", " care123 ").unwrap();
        assert!(auth.login("caretaker1", "nope").is_err());
        assert_eq!(auth.current().map(|u| u.username.as_str()), Some("caretaker1"));
    }

    #[test]
    fn test_logout_clears_session() {
        let mut auth = manager();
        auth.login("manager1", "admin123").unwrap();
        auth.logout();
        assert!(auth.current().is_none());
        assert!(matches!(auth.require(Role::Manager), Err(AuthError::NotLoggedIn)));
    }

    #[test]
    fn test_require_role_mismatch() {
        let mut auth = manager();
        auth.login("caretaker1", "care123").unwrap();
        assert!(matches!(auth.require(Role::Manager), Err(AuthError::Forbidden(_))));
        assert!(auth.require(Role::Caretaker).is_ok());
    }

    #[test]
    fn test_change_password() {
        let mut auth = manager();
        assert!(matches!(auth.change_password("caretaker1", ""), Err(AuthError::Validation(_))));
        assert!(matches!(auth.change_password("ghost", "x"), Err(AuthError::UnknownUser(_))));

        auth.change_password("caretaker1", "fresh").unwrap();
        assert!(auth.login("caretaker1", "care123").is_err());
        assert!(auth.login("caretaker1", "fresh").is_ok());
    }

    #[test]
    fn test_guesthouses_distinct_in_order() {
        let mut users = sample_seed().users;
        users.push(User {
            username: "caretaker3".to_string(),
            password: "x".to_string(),
            role: Role::Caretaker,
            guesthouse: Some("مهمانسرای رامسر".to_string()),
        });
        let auth = SessionManager::new(users);
        assert_eq!(auth.guesthouses(), vec!["مهمانسرای رامسر".to_string(), "مهمانسرای مشهد".to_string()]);
        assert_eq!(auth.caretakers().count(), 3);
    }
}
