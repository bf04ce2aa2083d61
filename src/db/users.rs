//! User account operations
//!
//! Credentials arrive here already hashed; callers go through
//! `auth::password` so intent to change a credential is always explicit.
//! The mentor link is an optional back-reference; mentees are the reverse
//! lookup on `mentor_id`.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use uuid::Uuid;

use super::diesel_schema::users;
use super::models::{
    current_timestamp, onboarding_statuses, roles, NewUser, User, UserProfile,
};
use crate::error::SopdeskError;

/// Input for creating a user (password already hashed)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub hire_date: Option<String>,
    #[serde(default)]
    pub mentor_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a user by ID
pub fn get_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>, SopdeskError> {
    users::table
        .filter(users::id.eq(user_id))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Find a user by email
pub fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, SopdeskError> {
    users::table
        .filter(users::email.eq(email))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// All users mentored by the given user
pub fn mentees_of(
    conn: &mut SqliteConnection,
    mentor_id: &str,
) -> Result<Vec<User>, SopdeskError> {
    users::table
        .filter(users::mentor_id.eq(mentor_id))
        .order(users::name.asc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// User with mentor and mentees resolved
pub fn get_profile(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<UserProfile>, SopdeskError> {
    let user = match get_user(conn, user_id)? {
        Some(u) => u,
        None => return Ok(None),
    };

    let mentor = match user.mentor_id.as_deref() {
        Some(mentor_id) => get_user(conn, mentor_id)?,
        None => None,
    };
    let mentees = mentees_of(conn, user_id)?;

    Ok(Some(UserProfile {
        user,
        mentor,
        mentees,
    }))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create a user. Email is unique; the constraint backs up the pre-check.
pub fn create_user(
    conn: &mut SqliteConnection,
    input: CreateUserInput,
) -> Result<User, SopdeskError> {
    let role = input.role.as_deref().unwrap_or(roles::VIEWER);
    if !roles::is_valid(role) {
        return Err(SopdeskError::InvalidInput(format!(
            "Invalid role: {}. Valid roles: {:?}",
            role,
            roles::ALL
        )));
    }

    if find_by_email(conn, &input.email)?.is_some() {
        return Err(SopdeskError::InvalidInput(format!(
            "User already exists: {}",
            input.email
        )));
    }

    let id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Some(ref mentor_id) = input.mentor_id {
        validate_mentor(conn, &id, mentor_id)?;
    }

    let new_user = NewUser {
        id: &id,
        email: &input.email,
        name: &input.name,
        password_hash: &input.password_hash,
        role,
        hire_date: input.hire_date.as_deref(),
        onboarding_status: onboarding_statuses::PRE_DAY1,
        mentor_id: input.mentor_id.as_deref(),
        avatar_url: input.avatar_url.as_deref(),
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                SopdeskError::InvalidInput(format!("User already exists: {}", input.email))
            }
            other => SopdeskError::Database(format!("Insert failed: {}", other)),
        })?;

    get_user(conn, &id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve created user".into()))
}

/// Replace the stored credential hash. Callers hash first; this never
/// inspects or infers from the previous value.
pub fn set_password_hash(
    conn: &mut SqliteConnection,
    user_id: &str,
    password_hash: &str,
) -> Result<(), SopdeskError> {
    let updated = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::password_hash.eq(password_hash),
            users::updated_at.eq(current_timestamp()),
        ))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(SopdeskError::NotFound(format!("User not found: {}", user_id)));
    }
    Ok(())
}

/// Stamp last_login
pub fn record_login(conn: &mut SqliteConnection, user_id: &str) -> Result<(), SopdeskError> {
    let now = current_timestamp();
    diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((users::last_login.eq(&now), users::updated_at.eq(&now)))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;
    Ok(())
}

/// Assign or clear a user's mentor
pub fn set_mentor(
    conn: &mut SqliteConnection,
    user_id: &str,
    mentor_id: Option<&str>,
) -> Result<User, SopdeskError> {
    if get_user(conn, user_id)?.is_none() {
        return Err(SopdeskError::NotFound(format!("User not found: {}", user_id)));
    }

    if let Some(mentor_id) = mentor_id {
        validate_mentor(conn, user_id, mentor_id)?;
    }

    diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::mentor_id.eq(mentor_id),
            users::updated_at.eq(current_timestamp()),
        ))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    get_user(conn, user_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve updated user".into()))
}

/// Move a user through the onboarding lifecycle
pub fn set_onboarding_status(
    conn: &mut SqliteConnection,
    user_id: &str,
    status: &str,
) -> Result<User, SopdeskError> {
    if !onboarding_statuses::is_valid(status) {
        return Err(SopdeskError::InvalidInput(format!(
            "Invalid onboarding status: {}. Valid statuses: {:?}",
            status,
            onboarding_statuses::ALL
        )));
    }

    let updated = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::onboarding_status.eq(status),
            users::updated_at.eq(current_timestamp()),
        ))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(SopdeskError::NotFound(format!("User not found: {}", user_id)));
    }

    get_user(conn, user_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve updated user".into()))
}

/// Activate or deactivate an account
pub fn set_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    active: bool,
) -> Result<(), SopdeskError> {
    let updated = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set((
            users::is_active.eq(i32::from(active)),
            users::updated_at.eq(current_timestamp()),
        ))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(SopdeskError::NotFound(format!("User not found: {}", user_id)));
    }
    Ok(())
}

fn validate_mentor(
    conn: &mut SqliteConnection,
    user_id: &str,
    mentor_id: &str,
) -> Result<(), SopdeskError> {
    if mentor_id == user_id {
        return Err(SopdeskError::InvalidInput(
            "A user cannot mentor themselves".into(),
        ));
    }
    if get_user(conn, mentor_id)?.is_none() {
        return Err(SopdeskError::NotFound(format!(
            "Mentor not found: {}",
            mentor_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;
    use diesel::Connection;

    fn setup_test_db() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
        init_schema(&mut conn).expect("Failed to init schema");
        conn
    }

    fn viewer(email: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.into(),
            name: "Someone".into(),
            password_hash: "$argon2id$x".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults_to_viewer() {
        let mut conn = setup_test_db();
        let user = create_user(&mut conn, viewer("v@example.com")).unwrap();
        assert_eq!(user.role, "Viewer");
        assert_eq!(user.onboarding_status, "PreDay1");
        assert_eq!(user.is_active, 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut conn = setup_test_db();
        create_user(&mut conn, viewer("dup@example.com")).unwrap();

        let result = create_user(&mut conn, viewer("dup@example.com"));
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut conn = setup_test_db();
        let mut input = viewer("r@example.com");
        input.role = Some("Owner".into());

        let result = create_user(&mut conn, input);
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }

    #[test]
    fn test_self_mentoring_rejected() {
        let mut conn = setup_test_db();
        let user = create_user(&mut conn, viewer("m@example.com")).unwrap();

        let result = set_mentor(&mut conn, &user.id, Some(&user.id));
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }

    #[test]
    fn test_mentor_assignment_and_reverse_lookup() {
        let mut conn = setup_test_db();
        let mentor = create_user(&mut conn, viewer("mentor@example.com")).unwrap();
        let mentee = create_user(&mut conn, viewer("mentee@example.com")).unwrap();

        let updated = set_mentor(&mut conn, &mentee.id, Some(&mentor.id)).unwrap();
        assert_eq!(updated.mentor_id.as_deref(), Some(mentor.id.as_str()));

        let mentees = mentees_of(&mut conn, &mentor.id).unwrap();
        assert_eq!(mentees.len(), 1);
        assert_eq!(mentees[0].id, mentee.id);

        let profile = get_profile(&mut conn, &mentee.id).unwrap().unwrap();
        assert_eq!(profile.mentor.unwrap().id, mentor.id);
    }

    #[test]
    fn test_set_password_hash_replaces_credential() {
        let mut conn = setup_test_db();
        let user = create_user(&mut conn, viewer("p@example.com")).unwrap();

        set_password_hash(&mut conn, &user.id, "$argon2id$new").unwrap();
        let reloaded = get_user(&mut conn, &user.id).unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "$argon2id$new");
    }

    #[test]
    fn test_onboarding_status_validation() {
        let mut conn = setup_test_db();
        let user = create_user(&mut conn, viewer("o@example.com")).unwrap();

        let updated = set_onboarding_status(&mut conn, &user.id, "Training").unwrap();
        assert_eq!(updated.onboarding_status, "Training");

        let result = set_onboarding_status(&mut conn, &user.id, "Onboarded");
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }
}
