//! SQLite database module for the SOP repository and onboarding tracker
//!
//! ## Architecture
//!
//! - All durable state lives in one SQLite database
//! - Repositories (one module per aggregate) take `&mut SqliteConnection`
//! - `SopDb` owns the r2d2 pool and hands connections to the service layer
//!
//! ## Tables
//!
//! - `users` - accounts, roles, mentor assignments
//! - `sop_documents` / `sop_tags` - authoritative current document state
//! - `sop_versions` - append-only ledger of prior (content, version) pairs
//! - `sop_feedback` - append-only reader feedback
//! - `onboarding_modules` / `onboarding_tasks` - the onboarding curriculum
//! - `user_task_progress` - per-user task state, unique per (user, task)
//! - `activity_log` / `notifications` - audit trail and user notifications

pub mod activity_log;
pub mod diesel_schema;
pub mod documents;
pub mod feedback;
pub mod models;
pub mod notifications;
pub mod onboarding;
pub mod schema;
pub mod task_progress;
pub mod users;
pub mod versions;

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::{debug, info};

use crate::error::SopdeskError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection PRAGMAs: foreign-key enforcement backs the cascade rules
/// and the busy timeout covers writer contention under WAL.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// SQLite database handle shared by all services
pub struct SopDb {
    pool: DbPool,
}

impl SopDb {
    /// Open or create the database under the given data directory
    pub fn open(data_dir: &Path) -> Result<Self, SopdeskError> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("sopdesk.db");
        info!("Opening SQLite database at {:?}", db_path);

        let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
        let pool = Pool::builder()
            .connection_customizer(Box::new(ConnectionOptions))
            .build(manager)
            .map_err(|e| SopdeskError::Database(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };

        {
            let mut conn = db.conn()?;
            // WAL mode persists in the database file; set it once at open
            conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
                .map_err(|e| SopdeskError::Database(format!("Failed to set PRAGMA: {}", e)))?;
            schema::init_schema(&mut conn)?;
        }

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// The pool is capped at one connection: every SQLite `:memory:`
    /// connection is its own database.
    pub fn open_in_memory() -> Result<Self, SopdeskError> {
        debug!("Opening in-memory SQLite database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(ConnectionOptions))
            .build(manager)
            .map_err(|e| SopdeskError::Database(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };

        {
            let mut conn = db.conn()?;
            schema::init_schema(&mut conn)?;
        }

        Ok(db)
    }

    /// Get a pooled connection
    pub fn conn(&self) -> Result<DbConn, SopdeskError> {
        self.pool
            .get()
            .map_err(|e| SopdeskError::Database(format!("Failed to get connection: {}", e)))
    }

    /// Run a closure with a pooled connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, SopdeskError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, SopdeskError>,
    {
        let mut conn = self.conn()?;
        f(&mut conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, SopdeskError> {
        self.with_conn(|conn| {
            use crate::db::diesel_schema::{
                onboarding_modules, onboarding_tasks, sop_documents, sop_versions,
                user_task_progress, users,
            };

            let document_count: i64 = sop_documents::table
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

            let version_count: i64 = sop_versions::table
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

            let user_count: i64 = users::table
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

            let module_count: i64 = onboarding_modules::table
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

            let task_count: i64 = onboarding_tasks::table
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

            let progress_count: i64 = user_task_progress::table
                .count()
                .get_result(conn)
                .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

            Ok(DbStats {
                document_count: document_count as u64,
                version_count: version_count as u64,
                user_count: user_count as u64,
                module_count: module_count as u64,
                task_count: task_count as u64,
                progress_count: progress_count as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub document_count: u64,
    pub version_count: u64,
    pub user_count: u64,
    pub module_count: u64,
    pub task_count: u64,
    pub progress_count: u64,
}

// Re-exports
pub use documents::{CreateDocumentInput, DocumentPage, DocumentQuery, UpdateDocumentInput};
pub use feedback::CreateFeedbackInput;
pub use models::{
    DocumentDetail, DocumentWithTags, Notification, OnboardingModule, OnboardingTask, SopDocument,
    SopFeedback, SopVersion, User, UserProfile, UserTaskProgress,
};
pub use onboarding::{CreateModuleInput, CreateTaskInput, ModuleWithTasks};
pub use task_progress::{ProgressSummary, StatusCount, TaskWithProgress, UpdateProgressInput};
pub use users::CreateUserInput;
