//! User service - registration, login and credential management
//!
//! Credentials are always hashed through the explicit set-credential path;
//! nothing here infers intent from changed fields. Register and login write
//! activity-log rows as a side effect.

use std::sync::Arc;

use serde::Deserialize;

use crate::auth::password::{hash_password, verify_password};
use crate::db::{activity_log, users, CreateUserInput, SopDb, User, UserProfile};
use crate::error::SopdeskError;

use super::events::{DomainEvent, EventBus};

/// Input for registering a user
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// User service for business logic
pub struct UserService {
    db: Arc<SopDb>,
    events: Arc<EventBus>,
}

impl UserService {
    /// Create a new user service
    pub fn new(db: Arc<SopDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Registration & Login
    // =========================================================================

    /// Register a user. The password is hashed before it touches the store;
    /// role defaults to Viewer and hire date to today.
    pub fn register(
        &self,
        input: RegisterInput,
        ip_address: Option<&str>,
    ) -> Result<User, SopdeskError> {
        if input.password.is_empty() {
            return Err(SopdeskError::InvalidInput("password is required".into()));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(SopdeskError::InvalidInput(format!(
                "Invalid email: {}",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password)?;

        let user = self.db.with_conn(|conn| {
            let user = users::create_user(
                conn,
                CreateUserInput {
                    email: input.email.clone(),
                    name: input.name.clone(),
                    password_hash,
                    role: input.role.clone(),
                    hire_date: Some(crate::db::models::current_date()),
                    ..Default::default()
                },
            )?;

            activity_log::record(
                conn,
                Some(&user.id),
                "register",
                Some("user"),
                Some(&user.id),
                None,
                ip_address,
            )?;

            Ok(user)
        })?;

        self.events.emit(DomainEvent::UserRegistered {
            id: user.id.clone(),
            name: user.name.clone(),
        });

        Ok(user)
    }

    /// Verify credentials and stamp last_login.
    ///
    /// Unknown email, deactivated account and wrong password are all the
    /// same `Unauthenticated` failure; the caller learns nothing about which.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<&str>,
    ) -> Result<User, SopdeskError> {
        let user = self.db.with_conn(|conn| {
            let user = users::find_by_email(conn, email)?
                .filter(|u| u.is_active == 1)
                .ok_or_else(|| SopdeskError::Unauthenticated("Invalid credentials".into()))?;

            if !verify_password(password, &user.password_hash)? {
                return Err(SopdeskError::Unauthenticated("Invalid credentials".into()));
            }

            users::record_login(conn, &user.id)?;
            activity_log::record(
                conn,
                Some(&user.id),
                "login",
                Some("user"),
                Some(&user.id),
                None,
                ip_address,
            )?;

            users::get_user(conn, &user.id)?
                .ok_or_else(|| SopdeskError::Database("Failed to retrieve user".into()))
        })?;

        self.events
            .emit(DomainEvent::UserLoggedIn { id: user.id.clone() });

        Ok(user)
    }

    // =========================================================================
    // Credential Management
    // =========================================================================

    /// Replace a user's credential. Always hashes; invoked only when the
    /// caller explicitly intends to change the password.
    pub fn set_credential(&self, user_id: &str, new_password: &str) -> Result<(), SopdeskError> {
        if new_password.is_empty() {
            return Err(SopdeskError::InvalidInput("password is required".into()));
        }

        let password_hash = hash_password(new_password)?;
        self.db
            .with_conn(|conn| users::set_password_hash(conn, user_id, &password_hash))
    }

    /// Change a user's password after verifying the current one
    pub fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), SopdeskError> {
        let user = self.db.with_conn(|conn| {
            users::get_user(conn, user_id)?
                .ok_or_else(|| SopdeskError::NotFound(format!("User not found: {}", user_id)))
        })?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(SopdeskError::Unauthenticated(
                "Current password is incorrect".into(),
            ));
        }

        self.set_credential(user_id, new_password)
    }

    // =========================================================================
    // Profile & Mentoring
    // =========================================================================

    /// The user with mentor and mentees resolved
    pub fn me(&self, user_id: &str) -> Result<UserProfile, SopdeskError> {
        self.db.with_conn(|conn| {
            users::get_profile(conn, user_id)?
                .ok_or_else(|| SopdeskError::NotFound(format!("User not found: {}", user_id)))
        })
    }

    /// Assign or clear a user's mentor. Self-mentoring is rejected.
    pub fn assign_mentor(
        &self,
        user_id: &str,
        mentor_id: Option<&str>,
    ) -> Result<User, SopdeskError> {
        let user = self
            .db
            .with_conn(|conn| users::set_mentor(conn, user_id, mentor_id))?;

        self.events.emit(DomainEvent::MentorAssigned {
            user_id: user.id.clone(),
            mentor_id: user.mentor_id.clone(),
        });

        Ok(user)
    }

    /// Recent audit entries for a user, newest-first
    pub fn activity(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<crate::db::models::ActivityLogEntry>, SopdeskError> {
        self.db
            .with_conn(|conn| activity_log::recent_for_user(conn, user_id, limit))
    }
}
