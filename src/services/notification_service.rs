//! Notification service - owned reads and the read flag
//!
//! Notifications belong to their target user; only the owner may list them
//! or mark them read. No generation logic lives here.

use std::sync::Arc;

use crate::auth::Actor;
use crate::db::{notifications, Notification, SopDb};
use crate::error::SopdeskError;

use super::events::{DomainEvent, EventBus};

/// Notification service for business logic
pub struct NotificationService {
    db: Arc<SopDb>,
    events: Arc<EventBus>,
}

impl NotificationService {
    /// Create a new notification service
    pub fn new(db: Arc<SopDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// The acting user's notifications, newest-first
    pub fn list(&self, actor: &Actor, unread_only: bool) -> Result<Vec<Notification>, SopdeskError> {
        self.db
            .with_conn(|conn| notifications::list_for_user(conn, &actor.id, unread_only))
    }

    /// Mark one of the acting user's notifications as read
    pub fn mark_read(&self, actor: &Actor, id: &str) -> Result<Notification, SopdeskError> {
        let result = self.db.with_conn(|conn| {
            let existing = notifications::get(conn, id)?
                .ok_or_else(|| SopdeskError::NotFound(format!("Notification not found: {}", id)))?;

            if existing.user_id != actor.id {
                return Err(SopdeskError::Forbidden(
                    "Not authorized to modify this notification".into(),
                ));
            }

            notifications::mark_read(conn, id)
        })?;

        self.events
            .emit(DomainEvent::NotificationRead { id: id.to_string() });

        Ok(result)
    }
}
