//! Onboarding curriculum operations: modules and their tasks
//!
//! Sequence order is a unique ordering key (globally for modules, per-module
//! for tasks); the storage constraint backs the check here.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diesel_schema::{onboarding_modules, onboarding_tasks};
use super::models::{
    phases, NewOnboardingModule, NewOnboardingTask, OnboardingModule, OnboardingTask,
};
use crate::error::SopdeskError;

/// Input for creating a module
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateModuleInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub phase: String,
    pub sequence_order: i32,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub estimated_hours: Option<f32>,
    #[serde(default)]
    pub linked_sop_ids: Vec<String>,
}

/// Input for creating a task within a module
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskInput {
    #[serde(default)]
    pub id: Option<String>,
    pub module_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_task_type")]
    pub task_type: String,
    #[serde(default)]
    pub task_metadata: Option<serde_json::Value>,
    pub sequence_order: i32,
    #[serde(default = "default_true")]
    pub is_required: bool,
}

fn default_true() -> bool {
    true
}

fn default_task_type() -> String {
    "manual".to_string()
}

/// Module with its tasks attached, both in sequence order
#[derive(Debug, Clone, Serialize)]
pub struct ModuleWithTasks {
    #[serde(flatten)]
    pub module: OnboardingModule,
    pub tasks: Vec<OnboardingTask>,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a module by ID
pub fn get_module(
    conn: &mut SqliteConnection,
    module_id: &str,
) -> Result<Option<OnboardingModule>, SopdeskError> {
    onboarding_modules::table
        .filter(onboarding_modules::id.eq(module_id))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Get a task by ID
pub fn get_task(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Option<OnboardingTask>, SopdeskError> {
    onboarding_tasks::table
        .filter(onboarding_tasks::id.eq(task_id))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Tasks for a module, in sequence order
pub fn tasks_for_module(
    conn: &mut SqliteConnection,
    module_id: &str,
) -> Result<Vec<OnboardingTask>, SopdeskError> {
    onboarding_tasks::table
        .filter(onboarding_tasks::module_id.eq(module_id))
        .order(onboarding_tasks::sequence_order.asc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// All modules with their tasks, both ordered by sequence
pub fn list_modules(conn: &mut SqliteConnection) -> Result<Vec<ModuleWithTasks>, SopdeskError> {
    let modules: Vec<OnboardingModule> = onboarding_modules::table
        .order(onboarding_modules::sequence_order.asc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?;

    let mut results = Vec::with_capacity(modules.len());
    for module in modules {
        let tasks = tasks_for_module(conn, &module.id)?;
        results.push(ModuleWithTasks { module, tasks });
    }

    Ok(results)
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create a module
pub fn create_module(
    conn: &mut SqliteConnection,
    input: CreateModuleInput,
) -> Result<OnboardingModule, SopdeskError> {
    if !phases::is_valid(&input.phase) {
        return Err(SopdeskError::InvalidInput(format!(
            "Invalid phase: {}. Valid phases: {:?}",
            input.phase,
            phases::ALL
        )));
    }

    let id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let linked_json = if input.linked_sop_ids.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&input.linked_sop_ids)?)
    };

    let new_module = NewOnboardingModule {
        id: &id,
        title: &input.title,
        description: input.description.as_deref(),
        phase: &input.phase,
        sequence_order: input.sequence_order,
        is_required: i32::from(input.is_required),
        estimated_hours: input.estimated_hours,
        linked_sop_ids_json: linked_json.as_deref(),
    };

    diesel::insert_into(onboarding_modules::table)
        .values(&new_module)
        .execute(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                SopdeskError::InvalidInput(format!(
                    "Sequence order {} is already in use",
                    input.sequence_order
                ))
            }
            other => SopdeskError::Database(format!("Insert failed: {}", other)),
        })?;

    get_module(conn, &id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve created module".into()))
}

/// Create a task within a module
pub fn create_task(
    conn: &mut SqliteConnection,
    input: CreateTaskInput,
) -> Result<OnboardingTask, SopdeskError> {
    if get_module(conn, &input.module_id)?.is_none() {
        return Err(SopdeskError::NotFound(format!(
            "Module not found: {}",
            input.module_id
        )));
    }

    let id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let metadata_json = match &input.task_metadata {
        Some(value) => Some(serde_json::to_string(value)?),
        None => None,
    };

    let new_task = NewOnboardingTask {
        id: &id,
        module_id: &input.module_id,
        title: &input.title,
        description: input.description.as_deref(),
        task_type: &input.task_type,
        task_metadata_json: metadata_json.as_deref(),
        sequence_order: input.sequence_order,
        is_required: i32::from(input.is_required),
    };

    diesel::insert_into(onboarding_tasks::table)
        .values(&new_task)
        .execute(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                SopdeskError::InvalidInput(format!(
                    "Sequence order {} is already in use within module {}",
                    input.sequence_order, input.module_id
                ))
            }
            other => SopdeskError::Database(format!("Insert failed: {}", other)),
        })?;

    get_task(conn, &id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve created task".into()))
}
