//! Onboarding service - progress tracking and curriculum administration
//!
//! Progress updates always target the acting user's own rows. Mentee reads
//! are gated on the mentor back-reference or the Admin role; module and task
//! administration is Admin-only.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{ensure, Action, Actor, Resource};
use crate::db::{
    onboarding, task_progress, users, CreateModuleInput, CreateTaskInput, ModuleWithTasks, SopDb,
    UpdateProgressInput,
};
use crate::error::SopdeskError;

use super::events::{DomainEvent, EventBus};

/// A mentee's progress rows joined with their tasks
#[derive(Debug, Clone, Serialize)]
pub struct MenteeProgress {
    pub user: crate::db::User,
    pub progress: Vec<MenteeTaskProgress>,
}

/// One progress row with its task
#[derive(Debug, Clone, Serialize)]
pub struct MenteeTaskProgress {
    #[serde(flatten)]
    pub progress: crate::db::UserTaskProgress,
    pub task: crate::db::OnboardingTask,
}

/// Onboarding service for business logic
pub struct OnboardingService {
    db: Arc<SopDb>,
    events: Arc<EventBus>,
}

impl OnboardingService {
    /// Create a new onboarding service
    pub fn new(db: Arc<SopDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Progress Tracking
    // =========================================================================

    /// The acting user's full progress view: status counts plus every module
    /// and task with their progress row attached where one exists
    pub fn my_progress(
        &self,
        actor: &Actor,
    ) -> Result<task_progress::ProgressSummary, SopdeskError> {
        self.db
            .with_conn(|conn| task_progress::progress_summary(conn, &actor.id))
    }

    /// The acting user's progress row for a task, created as NotStarted on
    /// first touch
    pub fn task_progress(
        &self,
        actor: &Actor,
        task_id: &str,
    ) -> Result<crate::db::UserTaskProgress, SopdeskError> {
        self.db.with_conn(|conn| {
            if onboarding::get_task(conn, task_id)?.is_none() {
                return Err(SopdeskError::NotFound(format!(
                    "Task not found: {}",
                    task_id
                )));
            }
            task_progress::get_or_create(conn, &actor.id, task_id)
        })
    }

    /// Update the acting user's progress on a task, creating the row lazily
    /// on first interaction
    pub fn update_task_progress(
        &self,
        actor: &Actor,
        task_id: &str,
        input: UpdateProgressInput,
    ) -> Result<crate::db::UserTaskProgress, SopdeskError> {
        ensure(
            actor,
            Action::UpdateOwnProgress,
            &Resource::Progress {
                user_id: actor.id.clone(),
            },
        )?;

        let status = input.status.clone();
        let result = self.db.with_conn(|conn| {
            if onboarding::get_task(conn, task_id)?.is_none() {
                return Err(SopdeskError::NotFound(format!(
                    "Task not found: {}",
                    task_id
                )));
            }
            task_progress::update_status(conn, &actor.id, task_id, input)
        })?;

        self.events.emit(DomainEvent::TaskProgressUpdated {
            user_id: actor.id.clone(),
            task_id: task_id.to_string(),
            status,
        });

        Ok(result)
    }

    /// A mentee's progress, readable by their mentor or an Admin
    pub fn mentee_progress(
        &self,
        actor: &Actor,
        user_id: &str,
    ) -> Result<MenteeProgress, SopdeskError> {
        self.db.with_conn(|conn| {
            let user = users::get_user(conn, user_id)?
                .ok_or_else(|| SopdeskError::NotFound(format!("User not found: {}", user_id)))?;

            ensure(
                actor,
                Action::ReadMenteeProgress,
                &Resource::UserRecord {
                    mentor_id: user.mentor_id.clone(),
                },
            )?;

            let progress = task_progress::progress_with_tasks(conn, user_id)?
                .into_iter()
                .map(|(progress, task)| MenteeTaskProgress { progress, task })
                .collect();

            Ok(MenteeProgress { user, progress })
        })
    }

    // =========================================================================
    // Curriculum Administration (Admin only)
    // =========================================================================

    /// All modules with their tasks, both in sequence order
    pub fn list_modules(&self, actor: &Actor) -> Result<Vec<ModuleWithTasks>, SopdeskError> {
        ensure(actor, Action::ManageModules, &Resource::None)?;
        self.db.with_conn(onboarding::list_modules)
    }

    /// Create a module
    pub fn create_module(
        &self,
        actor: &Actor,
        input: CreateModuleInput,
    ) -> Result<crate::db::OnboardingModule, SopdeskError> {
        ensure(actor, Action::ManageModules, &Resource::None)?;

        let result = self
            .db
            .with_conn(|conn| onboarding::create_module(conn, input))?;

        self.events.emit(DomainEvent::ModuleCreated {
            id: result.id.clone(),
            title: result.title.clone(),
        });

        Ok(result)
    }

    /// Create a task within a module
    pub fn create_task(
        &self,
        actor: &Actor,
        input: CreateTaskInput,
    ) -> Result<crate::db::OnboardingTask, SopdeskError> {
        ensure(actor, Action::ManageModules, &Resource::None)?;

        let result = self
            .db
            .with_conn(|conn| onboarding::create_task(conn, input))?;

        self.events.emit(DomainEvent::TaskCreated {
            id: result.id.clone(),
            module_id: result.module_id.clone(),
        });

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CreateUserInput;
    use crate::services::Services;

    fn setup() -> Services {
        let db = Arc::new(SopDb::open_in_memory().unwrap());
        Services::new(db)
    }

    fn seed_actor(services: &Services, id: &str, role: &str) -> Actor {
        services
            .db
            .with_conn(|conn| {
                users::create_user(
                    conn,
                    CreateUserInput {
                        id: Some(id.into()),
                        email: format!("{}@example.com", id),
                        name: id.into(),
                        password_hash: "$argon2id$x".into(),
                        role: Some(role.into()),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        Actor::new(id, role)
    }

    fn seed_curriculum(services: &Services, admin: &Actor) -> String {
        let module = services
            .onboarding
            .create_module(
                admin,
                CreateModuleInput {
                    title: "Orientation week".into(),
                    phase: "Orientation".into(),
                    sequence_order: 1,
                    is_required: true,
                    ..Default::default()
                },
            )
            .unwrap();
        services
            .onboarding
            .create_task(
                admin,
                CreateTaskInput {
                    module_id: module.id,
                    title: "Read the handbook".into(),
                    task_type: "manual".into(),
                    sequence_order: 1,
                    is_required: true,
                    ..Default::default()
                },
            )
            .unwrap()
            .id
    }

    fn in_progress() -> UpdateProgressInput {
        UpdateProgressInput {
            status: "InProgress".into(),
            notes: None,
            quiz_score: None,
        }
    }

    #[test]
    fn test_module_admin_requires_admin_role() {
        let services = setup();
        let editor = seed_actor(&services, "u-editor", "Editor");

        let result = services.onboarding.create_module(
            &editor,
            CreateModuleInput {
                title: "Nope".into(),
                phase: "Orientation".into(),
                sequence_order: 1,
                is_required: true,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));

        let result = services.onboarding.list_modules(&editor);
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));
    }

    #[test]
    fn test_update_own_progress_and_summary() {
        let services = setup();
        let admin = seed_actor(&services, "u-admin", "Admin");
        let viewer = seed_actor(&services, "u-viewer", "Viewer");
        let task_id = seed_curriculum(&services, &admin);

        // First touch creates the row as NotStarted
        let created = services.onboarding.task_progress(&viewer, &task_id).unwrap();
        assert_eq!(created.status, "NotStarted");

        let progress = services
            .onboarding
            .update_task_progress(&viewer, &task_id, in_progress())
            .unwrap();
        assert_eq!(progress.id, created.id);
        assert_eq!(progress.status, "InProgress");
        assert!(progress.started_at.is_some());

        let summary = services.onboarding.my_progress(&viewer).unwrap();
        assert_eq!(summary.modules.len(), 1);
        assert_eq!(summary.modules[0].tasks.len(), 1);
        assert!(summary.modules[0].tasks[0].progress.is_some());
        assert_eq!(summary.stats.len(), 1);
        assert_eq!(summary.stats[0].status, "InProgress");
    }

    #[test]
    fn test_progress_on_missing_task_not_found() {
        let services = setup();
        let viewer = seed_actor(&services, "u-viewer", "Viewer");

        let result = services
            .onboarding
            .update_task_progress(&viewer, "missing", in_progress());
        assert!(matches!(result, Err(SopdeskError::NotFound(_))));
    }

    #[test]
    fn test_mentee_progress_access() {
        let services = setup();
        let admin = seed_actor(&services, "u-admin", "Admin");
        let mentor = seed_actor(&services, "u-mentor", "Mentor");
        let other = seed_actor(&services, "u-other", "Mentor");
        let mentee = seed_actor(&services, "u-mentee", "Viewer");
        let task_id = seed_curriculum(&services, &admin);

        services
            .db
            .with_conn(|conn| users::set_mentor(conn, &mentee.id, Some(&mentor.id)))
            .unwrap();
        services
            .onboarding
            .update_task_progress(&mentee, &task_id, in_progress())
            .unwrap();

        // The assigned mentor and an Admin may read; another mentor may not
        let view = services.onboarding.mentee_progress(&mentor, &mentee.id).unwrap();
        assert_eq!(view.user.id, mentee.id);
        assert_eq!(view.progress.len(), 1);
        assert_eq!(view.progress[0].task.title, "Read the handbook");

        assert!(services.onboarding.mentee_progress(&admin, &mentee.id).is_ok());

        let result = services.onboarding.mentee_progress(&other, &mentee.id);
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));
    }

    #[test]
    fn test_mentee_progress_missing_user_not_found() {
        let services = setup();
        let admin = seed_actor(&services, "u-admin", "Admin");

        let result = services.onboarding.mentee_progress(&admin, "missing");
        assert!(matches!(result, Err(SopdeskError::NotFound(_))));
    }
}
