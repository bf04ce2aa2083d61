//! Database schema definitions

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use tracing::info;

use crate::error::SopdeskError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

#[derive(QueryableByName)]
struct VersionRow {
    #[diesel(sql_type = Integer)]
    version: i32,
}

/// Initialize the database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), SopdeskError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        create_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32, SopdeskError> {
    conn.batch_execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .map_err(|e| {
            SopdeskError::Database(format!("Failed to create schema_version table: {}", e))
        })?;

    let rows: Vec<VersionRow> =
        diesel::sql_query("SELECT version FROM schema_version LIMIT 1")
            .load(conn)
            .map_err(|e| SopdeskError::Database(format!("Failed to read schema_version: {}", e)))?;

    Ok(rows.first().map(|r| r.version).unwrap_or(0))
}

/// Set schema version
fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<(), SopdeskError> {
    diesel::sql_query("DELETE FROM schema_version")
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Failed to clear schema_version: {}", e)))?;
    diesel::sql_query(format!(
        "INSERT INTO schema_version (version) VALUES ({})",
        version
    ))
    .execute(conn)
    .map_err(|e| SopdeskError::Database(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

/// Create all tables
fn create_tables(conn: &mut SqliteConnection) -> Result<(), SopdeskError> {
    conn.batch_execute(USERS_SCHEMA)
        .map_err(|e| SopdeskError::Database(format!("Failed to create user tables: {}", e)))?;

    conn.batch_execute(DOCUMENTS_SCHEMA)
        .map_err(|e| SopdeskError::Database(format!("Failed to create document tables: {}", e)))?;

    conn.batch_execute(ONBOARDING_SCHEMA)
        .map_err(|e| {
            SopdeskError::Database(format!("Failed to create onboarding tables: {}", e))
        })?;

    conn.batch_execute(INDEXES_SCHEMA)
        .map_err(|e| SopdeskError::Database(format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Migrate schema from older version
fn migrate_schema(conn: &mut SqliteConnection, from_version: i32) -> Result<(), SopdeskError> {
    // Add migration steps here as schema evolves
    match from_version {
        _ => {}
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

/// Users, audit trail and notifications
const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'Viewer',
    hire_date TEXT,
    onboarding_status TEXT NOT NULL DEFAULT 'PreDay1',

    -- Self-reference for mentor assignment; mentees are the reverse lookup
    mentor_id TEXT,
    avatar_url TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    last_login TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),

    FOREIGN KEY (mentor_id) REFERENCES users(id) ON DELETE SET NULL
);

-- Write-once audit trail (no updated_at)
CREATE TABLE IF NOT EXISTS activity_log (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT,
    action TEXT NOT NULL,
    entity_type TEXT,
    entity_id TEXT,
    details_json TEXT,
    ip_address TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    notification_type TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT,
    is_read INTEGER NOT NULL DEFAULT 0,
    action_url TEXT,
    read_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
"#;

/// SOP documents, version ledger and feedback
const DOCUMENTS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sop_documents (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    subcategory TEXT,
    purpose TEXT NOT NULL,
    scope TEXT,
    owner_user_id TEXT,

    -- Lifecycle: Draft -> Published -> Archived (or Draft -> Archived)
    status TEXT NOT NULL DEFAULT 'Draft',
    version TEXT NOT NULL DEFAULT 'v1.0',
    content TEXT NOT NULL,

    review_interval_days INTEGER NOT NULL DEFAULT 90,
    last_review_date TEXT,
    published_at TEXT,
    archived_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),

    FOREIGN KEY (owner_user_id) REFERENCES users(id) ON DELETE SET NULL
);

-- Tags stored separately for efficient querying
CREATE TABLE IF NOT EXISTS sop_tags (
    document_id TEXT NOT NULL,
    tag TEXT NOT NULL,
    PRIMARY KEY (document_id, tag),
    FOREIGN KEY (document_id) REFERENCES sop_documents(id) ON DELETE CASCADE
);

-- Append-only version ledger: one row per qualifying pre-update state
CREATE TABLE IF NOT EXISTS sop_versions (
    id TEXT PRIMARY KEY NOT NULL,
    sop_document_id TEXT NOT NULL,
    version TEXT NOT NULL,
    content TEXT NOT NULL,
    changed_by TEXT,
    change_summary TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),

    FOREIGN KEY (sop_document_id) REFERENCES sop_documents(id) ON DELETE CASCADE
);

-- Append-only reader feedback; user_id nullable for anonymous submissions
CREATE TABLE IF NOT EXISTS sop_feedback (
    id TEXT PRIMARY KEY NOT NULL,
    sop_document_id TEXT NOT NULL,
    user_id TEXT,
    rating INTEGER,
    comment TEXT,
    is_helpful INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),

    FOREIGN KEY (sop_document_id) REFERENCES sop_documents(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
);
"#;

/// Onboarding modules, tasks and per-user progress
const ONBOARDING_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS onboarding_modules (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    phase TEXT NOT NULL,
    sequence_order INTEGER NOT NULL UNIQUE,
    is_required INTEGER NOT NULL DEFAULT 1,
    estimated_hours REAL,
    linked_sop_ids_json TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS onboarding_tasks (
    id TEXT PRIMARY KEY NOT NULL,
    module_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    task_type TEXT NOT NULL DEFAULT 'manual',
    task_metadata_json TEXT,
    sequence_order INTEGER NOT NULL,
    is_required INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),

    UNIQUE (module_id, sequence_order),
    FOREIGN KEY (module_id) REFERENCES onboarding_modules(id) ON DELETE CASCADE
);

-- The unique constraint is the arbiter of concurrent first-touch creation
CREATE TABLE IF NOT EXISTS user_task_progress (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    task_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'NotStarted',
    started_at TEXT,
    completed_at TEXT,
    notes TEXT,
    quiz_score REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),

    UNIQUE (user_id, task_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (task_id) REFERENCES onboarding_tasks(id) ON DELETE CASCADE
);
"#;

/// Index definitions for fast queries
const INDEXES_SCHEMA: &str = r#"
-- Document indexes
CREATE INDEX IF NOT EXISTS idx_sop_documents_category ON sop_documents(category);
CREATE INDEX IF NOT EXISTS idx_sop_documents_status ON sop_documents(status);
CREATE INDEX IF NOT EXISTS idx_sop_documents_owner ON sop_documents(owner_user_id);
CREATE INDEX IF NOT EXISTS idx_sop_documents_updated_at ON sop_documents(updated_at);

-- Tag indexes
CREATE INDEX IF NOT EXISTS idx_sop_tags_tag ON sop_tags(tag);

-- Version ledger indexes
CREATE INDEX IF NOT EXISTS idx_sop_versions_document ON sop_versions(sop_document_id, created_at);

-- Feedback indexes
CREATE INDEX IF NOT EXISTS idx_sop_feedback_document ON sop_feedback(sop_document_id);

-- User indexes
CREATE INDEX IF NOT EXISTS idx_users_mentor ON users(mentor_id);

-- Onboarding indexes
CREATE INDEX IF NOT EXISTS idx_onboarding_tasks_module ON onboarding_tasks(module_id, sequence_order);
CREATE INDEX IF NOT EXISTS idx_task_progress_user ON user_task_progress(user_id);
CREATE INDEX IF NOT EXISTS idx_task_progress_task ON user_task_progress(task_id);

-- Audit indexes
CREATE INDEX IF NOT EXISTS idx_activity_log_user ON activity_log(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, is_read);
"#;
