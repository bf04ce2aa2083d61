//! Diesel model definitions for database tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)
//!
//! Closed enumerations (roles, categories, statuses, phases) are modeled as
//! string-constant modules with `ALL` + `is_valid`; values outside the
//! enumeration are rejected at the boundary, never coerced.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::diesel_schema::*;

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Get current UTC date as ISO 8601 date string (for DATE-like TEXT columns)
pub fn current_date() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Microsecond-precision timestamp for append-only ledger rows, where
/// newest-first ordering must hold between rows written in the same second
pub fn ledger_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

// ============================================================================
// User Models
// ============================================================================

/// User row from SELECT query
///
/// The password hash never leaves the store: it is skipped on serialization.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub hire_date: Option<String>,
    pub onboarding_status: String,
    pub mentor_id: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: i32,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New user for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub hire_date: Option<&'a str>,
    pub onboarding_status: &'a str,
    pub mentor_id: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// User with mentor and mentees resolved (API response)
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub mentor: Option<User>,
    pub mentees: Vec<User>,
}

// ============================================================================
// SOP Document Models
// ============================================================================

/// SOP document row from SELECT query
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = sop_documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SopDocument {
    pub id: String,
    pub title: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub purpose: String,
    pub scope: Option<String>,
    pub owner_user_id: Option<String>,
    pub status: String,
    pub version: String,
    pub content: String,
    pub review_interval_days: i32,
    pub last_review_date: Option<String>,
    pub published_at: Option<String>,
    pub archived_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New SOP document for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sop_documents)]
pub struct NewSopDocument<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub purpose: &'a str,
    pub scope: Option<&'a str>,
    pub owner_user_id: Option<&'a str>,
    pub status: &'a str,
    pub version: &'a str,
    pub content: &'a str,
    pub review_interval_days: i32,
    pub last_review_date: Option<&'a str>,
}

/// Document with tags attached (API response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentWithTags {
    #[serde(flatten)]
    pub document: SopDocument,
    pub tags: Vec<String>,
}

/// Document with tags, recent versions and feedback (detail response)
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: SopDocument,
    pub tags: Vec<String>,
    pub versions: Vec<SopVersion>,
    pub feedback: Vec<SopFeedback>,
}

/// SOP tag row
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = sop_tags)]
pub struct SopTag {
    pub document_id: String,
    pub tag: String,
}

/// New SOP tag for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sop_tags)]
pub struct NewSopTag<'a> {
    pub document_id: &'a str,
    pub tag: &'a str,
}

// ============================================================================
// Version Ledger Models
// ============================================================================

/// Immutable snapshot of a document's prior content/version
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = sop_versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SopVersion {
    pub id: String,
    pub sop_document_id: String,
    pub version: String,
    pub content: String,
    pub changed_by: Option<String>,
    pub change_summary: Option<String>,
    pub created_at: String,
}

/// New version snapshot for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sop_versions)]
pub struct NewSopVersion<'a> {
    pub id: &'a str,
    pub sop_document_id: &'a str,
    pub version: &'a str,
    pub content: &'a str,
    pub changed_by: Option<&'a str>,
    pub change_summary: Option<&'a str>,
    pub created_at: &'a str,
}

// ============================================================================
// Feedback Models
// ============================================================================

/// Reader feedback row (append-only)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = sop_feedback)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SopFeedback {
    pub id: String,
    pub sop_document_id: String,
    pub user_id: Option<String>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub is_helpful: Option<i32>,
    pub created_at: String,
}

/// New feedback for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sop_feedback)]
pub struct NewSopFeedback<'a> {
    pub id: &'a str,
    pub sop_document_id: &'a str,
    pub user_id: Option<&'a str>,
    pub rating: Option<i32>,
    pub comment: Option<&'a str>,
    pub is_helpful: Option<i32>,
}

// ============================================================================
// Onboarding Models
// ============================================================================

/// Onboarding module row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = onboarding_modules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OnboardingModule {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub phase: String,
    pub sequence_order: i32,
    pub is_required: i32,
    pub estimated_hours: Option<f32>,
    pub linked_sop_ids_json: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New onboarding module for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = onboarding_modules)]
pub struct NewOnboardingModule<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub phase: &'a str,
    pub sequence_order: i32,
    pub is_required: i32,
    pub estimated_hours: Option<f32>,
    pub linked_sop_ids_json: Option<&'a str>,
}

/// Onboarding task row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = onboarding_tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OnboardingTask {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub description: Option<String>,
    pub task_type: String,
    pub task_metadata_json: Option<String>,
    pub sequence_order: i32,
    pub is_required: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New onboarding task for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = onboarding_tasks)]
pub struct NewOnboardingTask<'a> {
    pub id: &'a str,
    pub module_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub task_type: &'a str,
    pub task_metadata_json: Option<&'a str>,
    pub sequence_order: i32,
    pub is_required: i32,
}

// ============================================================================
// Task Progress Models
// ============================================================================

/// Per-user task progress row (unique per user+task)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = user_task_progress)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserTaskProgress {
    pub id: String,
    pub user_id: String,
    pub task_id: String,
    pub status: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub notes: Option<String>,
    pub quiz_score: Option<f32>,
    pub created_at: String,
    pub updated_at: String,
}

/// New task progress for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_task_progress)]
pub struct NewUserTaskProgress<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub task_id: &'a str,
    pub status: &'a str,
}

// ============================================================================
// Audit & Notification Models
// ============================================================================

/// Activity log row (write-once, no updated_at)
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = activity_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActivityLogEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub details_json: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: String,
}

/// New activity log entry for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activity_log)]
pub struct NewActivityLogEntry<'a> {
    pub id: &'a str,
    pub user_id: Option<&'a str>,
    pub action: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<&'a str>,
    pub details_json: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub created_at: &'a str,
}

/// Notification row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
    pub is_read: i32,
    pub action_url: Option<String>,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// New notification for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub notification_type: &'a str,
    pub title: &'a str,
    pub message: Option<&'a str>,
    pub action_url: Option<&'a str>,
}

// ============================================================================
// Role Constants
// ============================================================================

/// User roles
pub mod roles {
    pub const ADMIN: &str = "Admin";
    pub const EDITOR: &str = "Editor";
    pub const VIEWER: &str = "Viewer";
    pub const MENTOR: &str = "Mentor";

    /// All roles
    pub const ALL: [&str; 4] = [ADMIN, EDITOR, VIEWER, MENTOR];

    /// Check if a role is valid
    pub fn is_valid(role: &str) -> bool {
        ALL.contains(&role)
    }

    /// Roles allowed to create and edit any document
    pub fn is_editorial(role: &str) -> bool {
        matches!(role, ADMIN | EDITOR)
    }
}

// ============================================================================
// Document Category Constants
// ============================================================================

/// SOP document categories
pub mod categories {
    pub const TECHNICAL_SEO: &str = "TechnicalSEO";
    pub const CONTENT: &str = "Content";
    pub const LINK_BUILDING: &str = "LinkBuilding";
    pub const ANALYTICS: &str = "Analytics";
    pub const TOOL_ACCESS: &str = "ToolAccess";
    pub const GENERAL: &str = "General";

    /// All categories
    pub const ALL: [&str; 6] = [
        TECHNICAL_SEO,
        CONTENT,
        LINK_BUILDING,
        ANALYTICS,
        TOOL_ACCESS,
        GENERAL,
    ];

    /// Check if a category is valid
    pub fn is_valid(category: &str) -> bool {
        ALL.contains(&category)
    }
}

// ============================================================================
// Document Status Constants
// ============================================================================

/// SOP document lifecycle statuses
pub mod doc_statuses {
    pub const DRAFT: &str = "Draft";
    pub const PUBLISHED: &str = "Published";
    pub const ARCHIVED: &str = "Archived";

    /// All statuses in lifecycle order
    pub const ALL: [&str; 3] = [DRAFT, PUBLISHED, ARCHIVED];

    /// Check if a status is valid
    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

// ============================================================================
// Onboarding Phase Constants
// ============================================================================

/// Onboarding module phases
pub mod phases {
    pub const PREPARATION: &str = "Preparation";
    pub const ORIENTATION: &str = "Orientation";
    pub const TRAINING: &str = "Training";
    pub const EVALUATION: &str = "Evaluation";

    /// All phases in order
    pub const ALL: [&str; 4] = [PREPARATION, ORIENTATION, TRAINING, EVALUATION];

    /// Check if a phase is valid
    pub fn is_valid(phase: &str) -> bool {
        ALL.contains(&phase)
    }
}

// ============================================================================
// Task Status Constants
// ============================================================================

/// Per-user task progress statuses
pub mod task_statuses {
    pub const NOT_STARTED: &str = "NotStarted";
    pub const IN_PROGRESS: &str = "InProgress";
    pub const COMPLETED: &str = "Completed";

    /// All statuses in lifecycle order
    pub const ALL: [&str; 3] = [NOT_STARTED, IN_PROGRESS, COMPLETED];

    /// Check if a status is valid
    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

// ============================================================================
// Onboarding Status Constants
// ============================================================================

/// Per-user onboarding lifecycle statuses
pub mod onboarding_statuses {
    pub const PRE_DAY1: &str = "PreDay1";
    pub const ORIENTATION: &str = "Orientation";
    pub const TRAINING: &str = "Training";
    pub const EVALUATION: &str = "Evaluation";
    pub const COMPLETED: &str = "Completed";

    /// All statuses in lifecycle order
    pub const ALL: [&str; 5] = [PRE_DAY1, ORIENTATION, TRAINING, EVALUATION, COMPLETED];

    /// Check if a status is valid
    pub fn is_valid(status: &str) -> bool {
        ALL.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_validity() {
        assert!(roles::is_valid("Admin"));
        assert!(roles::is_valid("Mentor"));
        assert!(!roles::is_valid("SuperAdmin"));
        assert!(roles::is_editorial("Editor"));
        assert!(!roles::is_editorial("Viewer"));
    }

    #[test]
    fn test_closed_enumerations() {
        assert!(categories::is_valid("TechnicalSEO"));
        assert!(!categories::is_valid("technicalseo"));
        assert!(doc_statuses::is_valid("Draft"));
        assert!(!doc_statuses::is_valid("draft"));
        assert!(task_statuses::is_valid("InProgress"));
        assert!(!task_statuses::is_valid("Started"));
        assert!(phases::is_valid("Evaluation"));
        assert!(onboarding_statuses::is_valid("PreDay1"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: "u-1".into(),
            email: "a@example.com".into(),
            name: "A".into(),
            password_hash: "$argon2id$secret".into(),
            role: "Viewer".into(),
            hire_date: None,
            onboarding_status: "PreDay1".into(),
            mentor_id: None,
            avatar_url: None,
            is_active: 1,
            last_login: None,
            created_at: current_timestamp(),
            updated_at: current_timestamp(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
