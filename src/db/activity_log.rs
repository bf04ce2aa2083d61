//! Activity log operations
//!
//! Write-once audit trail: rows carry no updated_at and are never modified.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_schema::activity_log;
use super::models::{ledger_timestamp, ActivityLogEntry, NewActivityLogEntry};
use crate::error::SopdeskError;

/// Record one audit entry
pub fn record(
    conn: &mut SqliteConnection,
    user_id: Option<&str>,
    action: &str,
    entity_type: Option<&str>,
    entity_id: Option<&str>,
    details: Option<&serde_json::Value>,
    ip_address: Option<&str>,
) -> Result<ActivityLogEntry, SopdeskError> {
    let id = Uuid::new_v4().to_string();
    let created_at = ledger_timestamp();
    let details_json = match details {
        Some(value) => Some(serde_json::to_string(value)?),
        None => None,
    };

    let new_entry = NewActivityLogEntry {
        id: &id,
        user_id,
        action,
        entity_type,
        entity_id,
        details_json: details_json.as_deref(),
        ip_address,
        created_at: &created_at,
    };

    diesel::insert_into(activity_log::table)
        .values(&new_entry)
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Insert failed: {}", e)))?;

    activity_log::table
        .filter(activity_log::id.eq(&id))
        .first(conn)
        .map_err(|e| SopdeskError::Database(format!("Fetch failed: {}", e)))
}

/// Most recent entries for a user, newest-first
pub fn recent_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    limit: i64,
) -> Result<Vec<ActivityLogEntry>, SopdeskError> {
    activity_log::table
        .filter(activity_log::user_id.eq(user_id))
        .order(activity_log::created_at.desc())
        .then_order_by(activity_log::id.desc())
        .limit(limit)
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}
