//! Document service - business logic for SOP document operations
//!
//! Wraps the document repository with access-policy checks, validation and
//! event emission. The snapshot-on-update rule itself lives in the
//! repository's transaction so it cannot be bypassed from here.

use std::sync::Arc;

use crate::auth::{ensure, Action, Actor, Resource};
use crate::db::{
    self, documents, feedback, versions, CreateDocumentInput, CreateFeedbackInput, DocumentPage,
    DocumentQuery, SopDb, UpdateDocumentInput,
};
use crate::error::SopdeskError;

use super::events::{DomainEvent, EventBus};

/// Document service for business logic
pub struct DocumentService {
    db: Arc<SopDb>,
    events: Arc<EventBus>,
}

impl DocumentService {
    /// Create a new document service
    pub fn new(db: Arc<SopDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get a document with its tags
    pub fn get(&self, id: &str) -> Result<Option<db::DocumentWithTags>, SopdeskError> {
        self.db
            .with_conn(|conn| documents::get_document_with_tags(conn, id))
    }

    /// Get a document with tags, recent versions and feedback
    pub fn get_detail(
        &self,
        id: &str,
        version_limit: i64,
    ) -> Result<Option<db::DocumentDetail>, SopdeskError> {
        self.db
            .with_conn(|conn| documents::get_document_detail(conn, id, version_limit))
    }

    /// List documents with filters and pagination
    pub fn list(&self, query: &DocumentQuery) -> Result<DocumentPage, SopdeskError> {
        self.db.with_conn(|conn| documents::list_documents(conn, query))
    }

    /// Version history for a document, newest-first
    pub fn history(
        &self,
        id: &str,
        limit: i64,
    ) -> Result<Vec<db::SopVersion>, SopdeskError> {
        self.db.with_conn(|conn| versions::history(conn, id, limit))
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Create a document owned by the acting user
    pub fn create(
        &self,
        actor: &Actor,
        input: CreateDocumentInput,
    ) -> Result<db::DocumentWithTags, SopdeskError> {
        ensure(actor, Action::CreateSop, &Resource::None)?;
        self.validate_document(&input)?;

        let result = self
            .db
            .with_conn(|conn| documents::create_document(conn, Some(&actor.id), input))?;

        self.events.emit(DomainEvent::DocumentCreated {
            id: result.document.id.clone(),
            title: result.document.title.clone(),
            category: result.document.category.clone(),
        });

        Ok(result)
    }

    /// Update a document. Owner, Admin and Editor may update; a content- or
    /// version-changing update snapshots the prior state atomically.
    pub fn update(
        &self,
        actor: &Actor,
        id: &str,
        input: UpdateDocumentInput,
    ) -> Result<db::DocumentWithTags, SopdeskError> {
        self.db.with_conn(|conn| {
            let current = documents::get_document(conn, id)?
                .ok_or_else(|| SopdeskError::NotFound(format!("SOP not found: {}", id)))?;

            ensure(
                actor,
                Action::UpdateSop,
                &Resource::Document {
                    owner_user_id: current.owner_user_id.clone(),
                },
            )?;

            let snapshotted = input
                .content
                .as_deref()
                .is_some_and(|c| c != current.content)
                || input
                    .version
                    .as_deref()
                    .is_some_and(|v| v != current.version);

            let result = documents::update_document(conn, id, input)?;

            self.events.emit(DomainEvent::DocumentUpdated {
                id: id.to_string(),
                snapshotted,
            });

            Ok(result)
        })
    }

    /// Publish a document, stamping published_at on every call
    pub fn publish(&self, id: &str) -> Result<db::SopDocument, SopdeskError> {
        let result = self
            .db
            .with_conn(|conn| documents::publish_document(conn, id))?;

        self.events
            .emit(DomainEvent::DocumentPublished { id: id.to_string() });

        Ok(result)
    }

    /// Archive a document, stamping archived_at on every call
    pub fn archive(&self, id: &str) -> Result<db::SopDocument, SopdeskError> {
        let result = self
            .db
            .with_conn(|conn| documents::archive_document(conn, id))?;

        self.events
            .emit(DomainEvent::DocumentArchived { id: id.to_string() });

        Ok(result)
    }

    /// Irreversibly delete a document and its version/feedback rows (Admin only)
    pub fn delete(&self, actor: &Actor, id: &str) -> Result<(), SopdeskError> {
        self.db.with_conn(|conn| {
            if documents::get_document(conn, id)?.is_none() {
                return Err(SopdeskError::NotFound(format!("SOP not found: {}", id)));
            }

            ensure(actor, Action::DeleteSop, &Resource::None)?;

            documents::delete_document(conn, id)?;
            Ok(())
        })?;

        self.events
            .emit(DomainEvent::DocumentDeleted { id: id.to_string() });

        Ok(())
    }

    /// Submit feedback for a document. Open to any authenticated actor;
    /// `actor` is optional so anonymous submissions stay representable.
    pub fn submit_feedback(
        &self,
        actor: Option<&Actor>,
        id: &str,
        input: CreateFeedbackInput,
    ) -> Result<db::SopFeedback, SopdeskError> {
        if let Some(actor) = actor {
            ensure(actor, Action::SubmitFeedback, &Resource::None)?;
        }

        let user_id = actor.map(|a| a.id.as_str());
        let result = self
            .db
            .with_conn(|conn| feedback::create_feedback(conn, id, user_id, input))?;

        self.events.emit(DomainEvent::FeedbackSubmitted {
            document_id: id.to_string(),
            rating: result.rating,
        });

        Ok(result)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate_document(&self, input: &CreateDocumentInput) -> Result<(), SopdeskError> {
        if input.title.trim().is_empty() {
            return Err(SopdeskError::InvalidInput("title is required".into()));
        }
        if input.purpose.trim().is_empty() {
            return Err(SopdeskError::InvalidInput("purpose is required".into()));
        }
        if input.content.trim().is_empty() {
            return Err(SopdeskError::InvalidInput("content is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{users, CreateUserInput};
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

    fn doc_input(title: &str) -> CreateDocumentInput {
        CreateDocumentInput {
            title: title.into(),
            category: "TechnicalSEO".into(),
            purpose: "purpose".into(),
            content: "content".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_viewer_cannot_create() {
        let services = setup();
        let viewer = seed_actor(&services, "u-viewer", "Viewer");
        let result = services.documents.create(&viewer, doc_input("Doc"));
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));
    }

    #[test]
    fn test_create_assigns_actor_as_owner() {
        let services = setup();
        let editor = seed_actor(&services, "u-editor", "Editor");
        let doc = services.documents.create(&editor, doc_input("Doc")).unwrap();
        assert_eq!(doc.document.owner_user_id.as_deref(), Some("u-editor"));
        assert_eq!(doc.document.status, "Draft");
    }

    #[test]
    fn test_viewer_cannot_update_unowned_document() {
        let services = setup();
        let editor = seed_actor(&services, "u-editor", "Editor");
        let viewer = seed_actor(&services, "u-viewer", "Viewer");
        let doc = services.documents.create(&editor, doc_input("Doc")).unwrap();

        let result = services.documents.update(
            &viewer,
            &doc.document.id,
            UpdateDocumentInput {
                title: Some("New".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));
    }

    #[test]
    fn test_editor_updates_any_document() {
        let services = setup();
        let admin = seed_actor(&services, "u-admin", "Admin");
        let editor = seed_actor(&services, "u-editor", "Editor");
        let doc = services.documents.create(&admin, doc_input("Doc")).unwrap();

        let updated = services
            .documents
            .update(
                &editor,
                &doc.document.id,
                UpdateDocumentInput {
                    content: Some("revised".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.document.content, "revised");

        // Snapshot attributed to the owner (admin), not the editor
        let history = services.documents.history(&doc.document.id, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].changed_by.as_deref(), Some("u-admin"));
    }

    #[test]
    fn test_delete_requires_admin() {
        let services = setup();
        let admin = seed_actor(&services, "u-admin", "Admin");
        let editor = seed_actor(&services, "u-editor", "Editor");
        let doc = services.documents.create(&editor, doc_input("Doc")).unwrap();

        let result = services.documents.delete(&editor, &doc.document.id);
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));

        services.documents.delete(&admin, &doc.document.id).unwrap();
        assert!(services.documents.get(&doc.document.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let services = setup();
        let admin = seed_actor(&services, "u-admin", "Admin");
        let result = services.documents.delete(&admin, "missing");
        assert!(matches!(result, Err(SopdeskError::NotFound(_))));
    }

    #[test]
    fn test_feedback_rating_validated() {
        let services = setup();
        let editor = seed_actor(&services, "u-editor", "Editor");
        let viewer = seed_actor(&services, "u-viewer", "Viewer");
        let doc = services.documents.create(&editor, doc_input("Doc")).unwrap();

        let result = services.documents.submit_feedback(
            Some(&viewer),
            &doc.document.id,
            CreateFeedbackInput {
                rating: Some(6),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));

        let feedback = services
            .documents
            .submit_feedback(
                Some(&viewer),
                &doc.document.id,
                CreateFeedbackInput {
                    rating: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(feedback.rating, Some(3));

        let detail = services
            .documents
            .get_detail(&doc.document.id, 10)
            .unwrap()
            .unwrap();
        assert_eq!(detail.feedback.len(), 1);
    }

    #[test]
    fn test_publish_then_archive() {
        let services = setup();
        let editor = seed_actor(&services, "u-editor", "Editor");
        let doc = services.documents.create(&editor, doc_input("Doc")).unwrap();

        let published = services.documents.publish(&doc.document.id).unwrap();
        assert_eq!(published.status, "Published");

        let archived = services.documents.archive(&doc.document.id).unwrap();
        assert_eq!(archived.status, "Archived");
        assert!(archived.published_at.is_some());
        assert!(archived.archived_at.is_some());
    }

    #[test]
    fn test_create_validates_required_fields() {
        let services = setup();
        let mut input = doc_input("Doc");
        input.content = "  ".into();

        let editor = seed_actor(&services, "u-editor", "Editor");
        let result = services.documents.create(&editor, input);
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }
}
