//! Version ledger operations
//!
//! Append-only history of prior document states. Rows are created exclusively
//! by the document store's update path, immediately before a content- or
//! version-changing write, inside the same transaction. No deduplication:
//! two qualifying updates with identical content produce two rows.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_schema::sop_versions;
use super::models::{ledger_timestamp, NewSopVersion, SopVersion};
use crate::error::SopdeskError;

/// Append one immutable snapshot row
pub fn snapshot(
    conn: &mut SqliteConnection,
    document_id: &str,
    version: &str,
    content: &str,
    changed_by: Option<&str>,
    change_summary: Option<&str>,
) -> Result<SopVersion, SopdeskError> {
    let id = Uuid::new_v4().to_string();
    let created_at = ledger_timestamp();

    let new_version = NewSopVersion {
        id: &id,
        sop_document_id: document_id,
        version,
        content,
        changed_by,
        change_summary,
        created_at: &created_at,
    };

    diesel::insert_into(sop_versions::table)
        .values(&new_version)
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Snapshot insert failed: {}", e)))?;

    sop_versions::table
        .filter(sop_versions::id.eq(&id))
        .first(conn)
        .map_err(|e| SopdeskError::Database(format!("Snapshot fetch failed: {}", e)))
}

/// Most recent snapshots for a document, newest-first
pub fn history(
    conn: &mut SqliteConnection,
    document_id: &str,
    limit: i64,
) -> Result<Vec<SopVersion>, SopdeskError> {
    sop_versions::table
        .filter(sop_versions::sop_document_id.eq(document_id))
        .order(sop_versions::created_at.desc())
        .then_order_by(sop_versions::id.desc())
        .limit(limit)
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("History query failed: {}", e)))
}

/// Number of snapshots held for a document
pub fn count_for_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<i64, SopdeskError> {
    sop_versions::table
        .filter(sop_versions::sop_document_id.eq(document_id))
        .count()
        .get_result(conn)
        .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))
}

/// Delete all snapshots for a document (admin cascade path only)
pub fn delete_for_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<usize, SopdeskError> {
    diesel::delete(sop_versions::table.filter(sop_versions::sop_document_id.eq(document_id)))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Delete failed: {}", e)))
}
