//! Per-user task progress operations
//!
//! Rows are created lazily on first interaction. The UNIQUE(user_id, task_id)
//! constraint is the arbiter of concurrent first-touch creation: the losing
//! inserter re-fetches the winner's row instead of surfacing the conflict.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diesel_schema::user_task_progress;
use super::models::{
    current_timestamp, task_statuses, NewUserTaskProgress, OnboardingTask, UserTaskProgress,
};
use super::onboarding;
use crate::error::SopdeskError;

/// Input for updating task progress
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProgressInput {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub quiz_score: Option<f32>,
}

/// Count of progress rows per status
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Task with the requesting user's progress row, if any
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithProgress {
    #[serde(flatten)]
    pub task: OnboardingTask,
    pub progress: Option<UserTaskProgress>,
}

/// Module with tasks and per-task progress for one user
#[derive(Debug, Clone, Serialize)]
pub struct ModuleProgress {
    #[serde(flatten)]
    pub module: super::models::OnboardingModule,
    pub tasks: Vec<TaskWithProgress>,
}

/// Full progress view for one user
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub stats: Vec<StatusCount>,
    pub modules: Vec<ModuleProgress>,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get the progress row for a (user, task) pair
pub fn get_progress(
    conn: &mut SqliteConnection,
    user_id: &str,
    task_id: &str,
) -> Result<Option<UserTaskProgress>, SopdeskError> {
    user_task_progress::table
        .filter(user_task_progress::user_id.eq(user_id))
        .filter(user_task_progress::task_id.eq(task_id))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// All progress rows for a user
pub fn progress_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<UserTaskProgress>, SopdeskError> {
    user_task_progress::table
        .filter(user_task_progress::user_id.eq(user_id))
        .order(user_task_progress::updated_at.desc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Progress rows for a user joined with their tasks (mentee view)
pub fn progress_with_tasks(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<(UserTaskProgress, OnboardingTask)>, SopdeskError> {
    use super::diesel_schema::onboarding_tasks;

    user_task_progress::table
        .inner_join(onboarding_tasks::table)
        .filter(user_task_progress::user_id.eq(user_id))
        .order(user_task_progress::updated_at.desc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Counts of a user's progress rows grouped by status
pub fn status_counts(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<StatusCount>, SopdeskError> {
    let rows: Vec<(String, i64)> = user_task_progress::table
        .filter(user_task_progress::user_id.eq(user_id))
        .group_by(user_task_progress::status)
        .select((user_task_progress::status, diesel::dsl::count_star()))
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?;

    Ok(rows
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect())
}

/// Full progress view: status counts plus every module and task with the
/// user's progress row attached where one exists
pub fn progress_summary(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<ProgressSummary, SopdeskError> {
    let stats = status_counts(conn, user_id)?;
    let rows = progress_for_user(conn, user_id)?;

    let modules = onboarding::list_modules(conn)?
        .into_iter()
        .map(|entry| {
            let tasks = entry
                .tasks
                .into_iter()
                .map(|task| {
                    let progress = rows.iter().find(|p| p.task_id == task.id).cloned();
                    TaskWithProgress { task, progress }
                })
                .collect();
            ModuleProgress {
                module: entry.module,
                tasks,
            }
        })
        .collect();

    Ok(ProgressSummary { stats, modules })
}

// ============================================================================
// Write Operations
// ============================================================================

/// Return the existing row for (user, task), or create one as NotStarted.
///
/// A unique-constraint violation from a concurrent first-touch resolves to a
/// re-fetch of the winner's row; the conflict never reaches the caller.
pub fn get_or_create(
    conn: &mut SqliteConnection,
    user_id: &str,
    task_id: &str,
) -> Result<UserTaskProgress, SopdeskError> {
    if let Some(existing) = get_progress(conn, user_id, task_id)? {
        return Ok(existing);
    }

    let id = Uuid::new_v4().to_string();
    let new_progress = NewUserTaskProgress {
        id: &id,
        user_id,
        task_id,
        status: task_statuses::NOT_STARTED,
    };

    match diesel::insert_into(user_task_progress::table)
        .values(&new_progress)
        .execute(conn)
    {
        Ok(_) => {}
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            // Lost the first-touch race; the winner's row is authoritative
            return get_progress(conn, user_id, task_id)?.ok_or_else(|| {
                SopdeskError::Conflict(format!(
                    "Progress row for ({}, {}) vanished after unique violation",
                    user_id, task_id
                ))
            });
        }
        Err(e) => return Err(SopdeskError::Database(format!("Insert failed: {}", e))),
    }

    get_progress(conn, user_id, task_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve created progress".into()))
}

/// Apply a status update to the (user, task) progress row, creating it first
/// if needed.
///
/// started_at is set the first time the row enters InProgress and never
/// overwritten. completed_at is stamped on every Completed call, matching the
/// reference behavior.
pub fn update_status(
    conn: &mut SqliteConnection,
    user_id: &str,
    task_id: &str,
    input: UpdateProgressInput,
) -> Result<UserTaskProgress, SopdeskError> {
    if !task_statuses::is_valid(&input.status) {
        return Err(SopdeskError::InvalidInput(format!(
            "Invalid task status: {}. Valid statuses: {:?}",
            input.status,
            task_statuses::ALL
        )));
    }

    let existing = get_or_create(conn, user_id, task_id)?;
    let now = current_timestamp();

    let started_at = if input.status == task_statuses::IN_PROGRESS && existing.started_at.is_none()
    {
        Some(now.clone())
    } else {
        existing.started_at.clone()
    };

    let completed_at = if input.status == task_statuses::COMPLETED {
        Some(now.clone())
    } else {
        existing.completed_at.clone()
    };

    let notes = input.notes.or(existing.notes);
    let quiz_score = input.quiz_score.or(existing.quiz_score);

    diesel::update(user_task_progress::table.filter(user_task_progress::id.eq(&existing.id)))
        .set((
            user_task_progress::status.eq(&input.status),
            user_task_progress::started_at.eq(started_at.as_deref()),
            user_task_progress::completed_at.eq(completed_at.as_deref()),
            user_task_progress::notes.eq(notes.as_deref()),
            user_task_progress::quiz_score.eq(quiz_score),
            user_task_progress::updated_at.eq(&now),
        ))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    get_progress(conn, user_id, task_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve updated progress".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::onboarding::{self, CreateModuleInput, CreateTaskInput};
    use crate::db::schema::init_schema;
    use crate::db::users::{self, CreateUserInput};
    use diesel::Connection;

    fn setup_test_db() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
        init_schema(&mut conn).expect("Failed to init schema");
        conn
    }

    fn seed_user(conn: &mut SqliteConnection, email: &str) -> String {
        users::create_user(
            conn,
            CreateUserInput {
                email: email.into(),
                name: "U".into(),
                password_hash: "$argon2id$x".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    fn seed_task(conn: &mut SqliteConnection, order: i32) -> String {
        let module = onboarding::create_module(
            conn,
            CreateModuleInput {
                title: format!("Module {}", order),
                phase: "Orientation".into(),
                sequence_order: order,
                is_required: true,
                ..Default::default()
            },
        )
        .unwrap();
        onboarding::create_task(
            conn,
            CreateTaskInput {
                module_id: module.id,
                title: "task".into(),
                task_type: "manual".into(),
                sequence_order: 1,
                is_required: true,
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut conn = setup_test_db();
        let user_id = seed_user(&mut conn, "a@example.com");
        let task_id = seed_task(&mut conn, 1);

        let first = get_or_create(&mut conn, &user_id, &task_id).unwrap();
        assert_eq!(first.status, "NotStarted");
        assert!(first.started_at.is_none());

        let second = get_or_create(&mut conn, &user_id, &task_id).unwrap();
        assert_eq!(first.id, second.id);

        let rows = progress_for_user(&mut conn, &user_id).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_started_at_set_once_completed_at_every_time() {
        let mut conn = setup_test_db();
        let user_id = seed_user(&mut conn, "b@example.com");
        let task_id = seed_task(&mut conn, 1);

        let started = update_status(
            &mut conn,
            &user_id,
            &task_id,
            UpdateProgressInput {
                status: "InProgress".into(),
                notes: None,
                quiz_score: None,
            },
        )
        .unwrap();
        let first_started_at = started.started_at.clone();
        assert!(first_started_at.is_some());

        // Second InProgress call leaves started_at untouched
        let again = update_status(
            &mut conn,
            &user_id,
            &task_id,
            UpdateProgressInput {
                status: "InProgress".into(),
                notes: Some("halfway".into()),
                quiz_score: None,
            },
        )
        .unwrap();
        assert_eq!(again.started_at, first_started_at);
        assert_eq!(again.notes.as_deref(), Some("halfway"));

        let completed = update_status(
            &mut conn,
            &user_id,
            &task_id,
            UpdateProgressInput {
                status: "Completed".into(),
                notes: None,
                quiz_score: Some(92.5),
            },
        )
        .unwrap();
        assert_eq!(completed.status, "Completed");
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.started_at, first_started_at);
        assert_eq!(completed.quiz_score, Some(92.5));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut conn = setup_test_db();
        let user_id = seed_user(&mut conn, "c@example.com");
        let task_id = seed_task(&mut conn, 1);

        let result = update_status(
            &mut conn,
            &user_id,
            &task_id,
            UpdateProgressInput {
                status: "Done".into(),
                notes: None,
                quiz_score: None,
            },
        );
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }

    #[test]
    fn test_unique_violation_resolves_to_existing_row() {
        let mut conn = setup_test_db();
        let user_id = seed_user(&mut conn, "d@example.com");
        let task_id = seed_task(&mut conn, 1);

        let winner = get_or_create(&mut conn, &user_id, &task_id).unwrap();

        // Simulate losing the race: insert directly, bypassing the pre-check
        let id = uuid::Uuid::new_v4().to_string();
        let result = diesel::insert_into(user_task_progress::table)
            .values(&NewUserTaskProgress {
                id: &id,
                user_id: &user_id,
                task_id: &task_id,
                status: task_statuses::NOT_STARTED,
            })
            .execute(&mut conn);
        assert!(result.is_err());

        // The public path still resolves to the winner's row
        let resolved = get_or_create(&mut conn, &user_id, &task_id).unwrap();
        assert_eq!(resolved.id, winner.id);
    }

    #[test]
    fn test_progress_summary_groups_by_status_and_module() {
        let mut conn = setup_test_db();
        let user_id = seed_user(&mut conn, "e@example.com");
        let task_a = seed_task(&mut conn, 1);
        let task_b = seed_task(&mut conn, 2);

        update_status(
            &mut conn,
            &user_id,
            &task_a,
            UpdateProgressInput {
                status: "Completed".into(),
                notes: None,
                quiz_score: None,
            },
        )
        .unwrap();
        get_or_create(&mut conn, &user_id, &task_b).unwrap();

        let summary = progress_summary(&mut conn, &user_id).unwrap();
        assert_eq!(summary.modules.len(), 2);
        assert!(summary.modules[0].tasks[0].progress.is_some());

        let completed = summary
            .stats
            .iter()
            .find(|s| s.status == "Completed")
            .map(|s| s.count);
        assert_eq!(completed, Some(1));
        let not_started = summary
            .stats
            .iter()
            .find(|s| s.status == "NotStarted")
            .map(|s| s.count);
        assert_eq!(not_started, Some(1));
    }
}
