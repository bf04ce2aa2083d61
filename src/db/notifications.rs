//! Notification operations
//!
//! Rows are owned by the target user; the only mutation is the read flag.
//! Generation logic lives elsewhere.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_schema::notifications;
use super::models::{current_timestamp, NewNotification, Notification};
use crate::error::SopdeskError;

/// Create a notification for a user
pub fn create(
    conn: &mut SqliteConnection,
    user_id: &str,
    notification_type: &str,
    title: &str,
    message: Option<&str>,
    action_url: Option<&str>,
) -> Result<Notification, SopdeskError> {
    let id = Uuid::new_v4().to_string();
    let new_notification = NewNotification {
        id: &id,
        user_id,
        notification_type,
        title,
        message,
        action_url,
    };

    diesel::insert_into(notifications::table)
        .values(&new_notification)
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Insert failed: {}", e)))?;

    get(conn, &id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve created notification".into()))
}

/// Get a notification by ID
pub fn get(
    conn: &mut SqliteConnection,
    notification_id: &str,
) -> Result<Option<Notification>, SopdeskError> {
    notifications::table
        .filter(notifications::id.eq(notification_id))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Notifications for a user, newest-first
pub fn list_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    unread_only: bool,
) -> Result<Vec<Notification>, SopdeskError> {
    let mut query = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .into_boxed();

    if unread_only {
        query = query.filter(notifications::is_read.eq(0));
    }

    query
        .order(notifications::created_at.desc())
        .then_order_by(notifications::id.desc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Mark a notification as read; read_at is stamped on the first read only
pub fn mark_read(
    conn: &mut SqliteConnection,
    notification_id: &str,
) -> Result<Notification, SopdeskError> {
    let existing = get(conn, notification_id)?.ok_or_else(|| {
        SopdeskError::NotFound(format!("Notification not found: {}", notification_id))
    })?;

    let read_at = existing
        .read_at
        .clone()
        .unwrap_or_else(current_timestamp);

    diesel::update(notifications::table.filter(notifications::id.eq(notification_id)))
        .set((
            notifications::is_read.eq(1),
            notifications::read_at.eq(Some(read_at)),
        ))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    get(conn, notification_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve updated notification".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;
    use crate::db::users::{self, CreateUserInput};
    use diesel::Connection;

    fn setup_test_db() -> (SqliteConnection, String) {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
        init_schema(&mut conn).expect("Failed to init schema");
        let user = users::create_user(
            &mut conn,
            CreateUserInput {
                email: "n@example.com".into(),
                name: "N".into(),
                password_hash: "$argon2id$x".into(),
                ..Default::default()
            },
        )
        .unwrap();
        (conn, user.id)
    }

    #[test]
    fn test_create_and_filter_unread() {
        let (mut conn, user_id) = setup_test_db();

        let first = create(&mut conn, &user_id, "review_due", "SOP review due", None, None).unwrap();
        create(&mut conn, &user_id, "mention", "You were mentioned", None, None).unwrap();

        mark_read(&mut conn, &first.id).unwrap();

        let all = list_for_user(&mut conn, &user_id, false).unwrap();
        assert_eq!(all.len(), 2);

        let unread = list_for_user(&mut conn, &user_id, true).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].title, "You were mentioned");
    }

    #[test]
    fn test_read_at_stamped_once() {
        let (mut conn, user_id) = setup_test_db();
        let n = create(&mut conn, &user_id, "review_due", "Title", None, None).unwrap();
        assert_eq!(n.is_read, 0);

        let read = mark_read(&mut conn, &n.id).unwrap();
        assert_eq!(read.is_read, 1);
        let first_read_at = read.read_at.clone();
        assert!(first_read_at.is_some());

        let read_again = mark_read(&mut conn, &n.id).unwrap();
        assert_eq!(read_again.read_at, first_read_at);
    }

    #[test]
    fn test_mark_read_missing_not_found() {
        let (mut conn, _) = setup_test_db();
        let result = mark_read(&mut conn, "missing");
        assert!(matches!(result, Err(SopdeskError::NotFound(_))));
    }
}
