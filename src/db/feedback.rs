//! SOP feedback operations
//!
//! Append-only: rows are never updated. `user_id` stays optional so
//! anonymous submissions are representable.

use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use super::diesel_schema::{sop_documents, sop_feedback};
use super::models::{NewSopFeedback, SopFeedback};
use crate::error::SopdeskError;

/// Input for submitting feedback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateFeedbackInput {
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_helpful: Option<bool>,
}

/// Create a feedback row for a document
///
/// The document must exist; rating, when present, must be within 1-5.
pub fn create_feedback(
    conn: &mut SqliteConnection,
    document_id: &str,
    user_id: Option<&str>,
    input: CreateFeedbackInput,
) -> Result<SopFeedback, SopdeskError> {
    if let Some(rating) = input.rating {
        if !(1..=5).contains(&rating) {
            return Err(SopdeskError::InvalidInput(format!(
                "Rating must be between 1 and 5, got {}",
                rating
            )));
        }
    }

    let document_exists: i64 = sop_documents::table
        .filter(sop_documents::id.eq(document_id))
        .count()
        .get_result(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?;
    if document_exists == 0 {
        return Err(SopdeskError::NotFound(format!(
            "SOP not found: {}",
            document_id
        )));
    }

    let id = Uuid::new_v4().to_string();
    let new_feedback = NewSopFeedback {
        id: &id,
        sop_document_id: document_id,
        user_id,
        rating: input.rating,
        comment: input.comment.as_deref(),
        is_helpful: input.is_helpful.map(i32::from),
    };

    diesel::insert_into(sop_feedback::table)
        .values(&new_feedback)
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Insert failed: {}", e)))?;

    sop_feedback::table
        .filter(sop_feedback::id.eq(&id))
        .first(conn)
        .map_err(|e| SopdeskError::Database(format!("Fetch failed: {}", e)))
}

/// All feedback for a document, newest-first
pub fn list_for_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<Vec<SopFeedback>, SopdeskError> {
    sop_feedback::table
        .filter(sop_feedback::sop_document_id.eq(document_id))
        .order(sop_feedback::created_at.desc())
        .then_order_by(sop_feedback::id.desc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Delete all feedback for a document (admin cascade path only)
pub fn delete_for_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<usize, SopdeskError> {
    diesel::delete(sop_feedback::table.filter(sop_feedback::sop_document_id.eq(document_id)))
        .execute(conn)
        .map_err(|e| SopdeskError::Database(format!("Delete failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::documents::{self, CreateDocumentInput};
    use crate::db::schema::init_schema;
    use diesel::Connection;

    fn setup_test_db() -> SqliteConnection {
        let mut conn =
            SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
        init_schema(&mut conn).expect("Failed to init schema");
        conn
    }

    fn seed_document(conn: &mut SqliteConnection) -> String {
        documents::create_document(
            conn,
            None,
            CreateDocumentInput {
                title: "Doc".into(),
                category: "General".into(),
                purpose: "p".into(),
                content: "c".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .document
        .id
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut conn = setup_test_db();
        let doc_id = seed_document(&mut conn);

        let result = create_feedback(
            &mut conn,
            &doc_id,
            None,
            CreateFeedbackInput {
                rating: Some(6),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));

        let result = create_feedback(
            &mut conn,
            &doc_id,
            None,
            CreateFeedbackInput {
                rating: Some(0),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SopdeskError::InvalidInput(_))));
    }

    #[test]
    fn test_valid_rating_stored_and_retrievable() {
        let mut conn = setup_test_db();
        let doc_id = seed_document(&mut conn);

        let feedback = create_feedback(
            &mut conn,
            &doc_id,
            None,
            CreateFeedbackInput {
                rating: Some(3),
                comment: Some("useful".into()),
                is_helpful: Some(true),
            },
        )
        .unwrap();
        assert_eq!(feedback.rating, Some(3));
        assert_eq!(feedback.is_helpful, Some(1));

        let listed = list_for_document(&mut conn, &doc_id).unwrap();
        assert!(listed.iter().any(|f| f.id == feedback.id));
    }

    #[test]
    fn test_missing_document_rejected() {
        let mut conn = setup_test_db();

        let result = create_feedback(&mut conn, "missing", None, CreateFeedbackInput::default());
        assert!(matches!(result, Err(SopdeskError::NotFound(_))));
    }

    #[test]
    fn test_rating_is_optional() {
        let mut conn = setup_test_db();
        let doc_id = seed_document(&mut conn);

        let feedback = create_feedback(
            &mut conn,
            &doc_id,
            None,
            CreateFeedbackInput {
                comment: Some("no rating".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(feedback.rating, None);
    }
}
