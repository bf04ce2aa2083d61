//! SOP document CRUD operations
//!
//! The update path owns the version-ledger side effect: when an incoming
//! update would change `content` or `version`, the pre-update pair is
//! snapshotted inside the same transaction that applies the new state.
//! Either both persist or neither does.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diesel_schema::{sop_documents, sop_tags};
use super::models::{
    categories, current_timestamp, doc_statuses, DocumentDetail, DocumentWithTags, NewSopDocument,
    NewSopTag, SopDocument,
};
use super::{feedback, versions};
use crate::error::SopdeskError;

// ============================================================================
// Query Types
// ============================================================================

/// Input for creating a document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDocumentInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub purpose: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub review_interval_days: Option<i32>,
    #[serde(default)]
    pub last_review_date: Option<String>,
}

/// Input for updating a document
///
/// `None` means "leave unchanged". Status transitions go through
/// `publish_document` / `archive_document`, not through here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocumentInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub review_interval_days: Option<i32>,
    #[serde(default)]
    pub last_review_date: Option<String>,
    #[serde(default)]
    pub change_summary: Option<String>,
}

/// Query parameters for listing documents
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Containment filter: every requested tag must be present
    #[serde(default)]
    pub tags: Vec<String>,
    /// Case-insensitive substring match over title, content and purpose
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            category: None,
            status: None,
            tags: Vec::new(),
            search: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// One page of a document listing
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPage {
    pub documents: Vec<DocumentWithTags>,
    pub count: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(AsChangeset)]
#[diesel(table_name = sop_documents)]
struct DocumentChanges<'a> {
    title: Option<&'a str>,
    category: Option<&'a str>,
    subcategory: Option<&'a str>,
    purpose: Option<&'a str>,
    scope: Option<&'a str>,
    version: Option<&'a str>,
    content: Option<&'a str>,
    review_interval_days: Option<i32>,
    last_review_date: Option<&'a str>,
    updated_at: &'a str,
}

// ============================================================================
// Read Operations
// ============================================================================

/// Get a document by ID
pub fn get_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<Option<SopDocument>, SopdeskError> {
    sop_documents::table
        .filter(sop_documents::id.eq(document_id))
        .first(conn)
        .optional()
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))
}

/// Get tags for a document
pub fn get_document_tags(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<Vec<String>, SopdeskError> {
    sop_tags::table
        .filter(sop_tags::document_id.eq(document_id))
        .select(sop_tags::tag)
        .order(sop_tags::tag.asc())
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Tags query failed: {}", e)))
}

/// Get a document with its tags
pub fn get_document_with_tags(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<Option<DocumentWithTags>, SopdeskError> {
    match get_document(conn, document_id)? {
        Some(document) => {
            let tags = get_document_tags(conn, document_id)?;
            Ok(Some(DocumentWithTags { document, tags }))
        }
        None => Ok(None),
    }
}

/// Get a document with tags, recent version history and feedback
pub fn get_document_detail(
    conn: &mut SqliteConnection,
    document_id: &str,
    version_limit: i64,
) -> Result<Option<DocumentDetail>, SopdeskError> {
    let document = match get_document(conn, document_id)? {
        Some(d) => d,
        None => return Ok(None),
    };

    let tags = get_document_tags(conn, document_id)?;
    let versions = versions::history(conn, document_id, version_limit)?;
    let feedback = feedback::list_for_document(conn, document_id)?;

    Ok(Some(DocumentDetail {
        document,
        tags,
        versions,
        feedback,
    }))
}

/// List documents with filters and pagination, most recently updated first
pub fn list_documents(
    conn: &mut SqliteConnection,
    query: &DocumentQuery,
) -> Result<DocumentPage, SopdeskError> {
    let page = query.page.max(1);
    let limit = query.limit.max(1);

    // Search pattern must outlive the boxed queries below
    let search_pattern = query.search.as_ref().map(|s| format!("%{}%", s));

    // Tag containment: resolve ids holding ALL requested tags first.
    // (document_id, tag) is the primary key, so a plain row count equals
    // the distinct-tag count.
    let tag_match_ids: Option<Vec<String>> = if query.tags.is_empty() {
        None
    } else {
        let wanted = query.tags.len() as i64;
        let ids = sop_tags::table
            .filter(sop_tags::tag.eq_any(&query.tags))
            .group_by(sop_tags::document_id)
            .having(diesel::dsl::count_star().eq(wanted))
            .select(sop_tags::document_id)
            .load(conn)
            .map_err(|e| SopdeskError::Database(format!("Tag query failed: {}", e)))?;
        Some(ids)
    };

    let count: i64 = filtered_query(query, &search_pattern, &tag_match_ids)
        .count()
        .get_result(conn)
        .map_err(|e| SopdeskError::Database(format!("Count query failed: {}", e)))?;

    let rows: Vec<SopDocument> = filtered_query(query, &search_pattern, &tag_match_ids)
        .order(sop_documents::updated_at.desc())
        .then_order_by(sop_documents::id.asc())
        .limit(limit)
        .offset((page - 1) * limit)
        .load(conn)
        .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?;

    let mut documents = Vec::with_capacity(rows.len());
    for document in rows {
        let tags = get_document_tags(conn, &document.id)?;
        documents.push(DocumentWithTags { document, tags });
    }

    let total_pages = if count == 0 { 0 } else { (count + limit - 1) / limit };

    Ok(DocumentPage {
        documents,
        count,
        page,
        limit,
        total_pages,
    })
}

fn filtered_query<'a>(
    query: &'a DocumentQuery,
    search_pattern: &'a Option<String>,
    tag_match_ids: &'a Option<Vec<String>>,
) -> sop_documents::BoxedQuery<'a, diesel::sqlite::Sqlite> {
    let mut base_query = sop_documents::table.into_boxed();

    if let Some(ref category) = query.category {
        base_query = base_query.filter(sop_documents::category.eq(category));
    }

    if let Some(ref status) = query.status {
        base_query = base_query.filter(sop_documents::status.eq(status));
    }

    if let Some(ref pattern) = search_pattern {
        base_query = base_query.filter(
            sop_documents::title
                .like(pattern)
                .or(sop_documents::content.like(pattern))
                .or(sop_documents::purpose.like(pattern)),
        );
    }

    if let Some(ref ids) = tag_match_ids {
        base_query = base_query.filter(sop_documents::id.eq_any(ids));
    }

    base_query
}

// ============================================================================
// Write Operations
// ============================================================================

/// Create a document. No version snapshot is taken: there is no prior state.
pub fn create_document(
    conn: &mut SqliteConnection,
    owner_user_id: Option<&str>,
    input: CreateDocumentInput,
) -> Result<DocumentWithTags, SopdeskError> {
    if !categories::is_valid(&input.category) {
        return Err(SopdeskError::InvalidInput(format!(
            "Invalid category: {}. Valid categories: {:?}",
            input.category,
            categories::ALL
        )));
    }

    let status = input.status.as_deref().unwrap_or(doc_statuses::DRAFT);
    if !doc_statuses::is_valid(status) {
        return Err(SopdeskError::InvalidInput(format!(
            "Invalid status: {}. Valid statuses: {:?}",
            status,
            doc_statuses::ALL
        )));
    }

    let id = input.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let version = input.version.as_deref().unwrap_or("v1.0");

    conn.transaction(|conn| {
        let new_document = NewSopDocument {
            id: &id,
            title: &input.title,
            category: &input.category,
            subcategory: input.subcategory.as_deref(),
            purpose: &input.purpose,
            scope: input.scope.as_deref(),
            owner_user_id,
            status,
            version,
            content: &input.content,
            review_interval_days: input.review_interval_days.unwrap_or(90),
            last_review_date: input.last_review_date.as_deref(),
        };

        diesel::insert_into(sop_documents::table)
            .values(&new_document)
            .execute(conn)
            .map_err(|e| SopdeskError::Database(format!("Insert failed: {}", e)))?;

        for tag in &input.tags {
            let new_tag = NewSopTag {
                document_id: &id,
                tag,
            };
            diesel::insert_or_ignore_into(sop_tags::table)
                .values(&new_tag)
                .execute(conn)
                .map_err(|e| SopdeskError::Database(format!("Tag insert failed: {}", e)))?;
        }

        let document = sop_documents::table
            .filter(sop_documents::id.eq(&id))
            .first(conn)
            .map_err(|e| SopdeskError::Database(format!("Fetch failed: {}", e)))?;

        Ok(DocumentWithTags {
            document,
            tags: input.tags.clone(),
        })
    })
}

/// Update a document, snapshotting the pre-update state when content or
/// version label would change.
///
/// The snapshot is attributed to the document's current owner, not the actor
/// performing the update. Snapshot and update commit atomically.
pub fn update_document(
    conn: &mut SqliteConnection,
    document_id: &str,
    input: UpdateDocumentInput,
) -> Result<DocumentWithTags, SopdeskError> {
    if let Some(ref category) = input.category {
        if !categories::is_valid(category) {
            return Err(SopdeskError::InvalidInput(format!(
                "Invalid category: {}. Valid categories: {:?}",
                category,
                categories::ALL
            )));
        }
    }

    conn.transaction(|conn| {
        let current: SopDocument = sop_documents::table
            .filter(sop_documents::id.eq(document_id))
            .first(conn)
            .optional()
            .map_err(|e| SopdeskError::Database(format!("Query failed: {}", e)))?
            .ok_or_else(|| SopdeskError::NotFound(format!("SOP not found: {}", document_id)))?;

        let content_changed = input
            .content
            .as_deref()
            .is_some_and(|c| c != current.content);
        let version_changed = input
            .version
            .as_deref()
            .is_some_and(|v| v != current.version);

        if content_changed || version_changed {
            versions::snapshot(
                conn,
                document_id,
                &current.version,
                &current.content,
                current.owner_user_id.as_deref(),
                input.change_summary.as_deref(),
            )?;
        }

        let now = current_timestamp();
        let changes = DocumentChanges {
            title: input.title.as_deref(),
            category: input.category.as_deref(),
            subcategory: input.subcategory.as_deref(),
            purpose: input.purpose.as_deref(),
            scope: input.scope.as_deref(),
            version: input.version.as_deref(),
            content: input.content.as_deref(),
            review_interval_days: input.review_interval_days,
            last_review_date: input.last_review_date.as_deref(),
            updated_at: &now,
        };

        diesel::update(sop_documents::table.filter(sop_documents::id.eq(document_id)))
            .set(&changes)
            .execute(conn)
            .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

        if let Some(ref tags) = input.tags {
            diesel::delete(sop_tags::table.filter(sop_tags::document_id.eq(document_id)))
                .execute(conn)
                .map_err(|e| SopdeskError::Database(format!("Tag delete failed: {}", e)))?;
            for tag in tags {
                let new_tag = NewSopTag {
                    document_id,
                    tag,
                };
                diesel::insert_or_ignore_into(sop_tags::table)
                    .values(&new_tag)
                    .execute(conn)
                    .map_err(|e| SopdeskError::Database(format!("Tag insert failed: {}", e)))?;
            }
        }

        get_document_with_tags(conn, document_id)?
            .ok_or_else(|| SopdeskError::Database("Failed to retrieve updated document".into()))
    })
}

/// Set status=Published and stamp published_at.
///
/// Repeat calls overwrite the timestamp; republishing is an allowed
/// transition, not a no-op.
pub fn publish_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<SopDocument, SopdeskError> {
    let now = current_timestamp();
    let updated =
        diesel::update(sop_documents::table.filter(sop_documents::id.eq(document_id)))
            .set((
                sop_documents::status.eq(doc_statuses::PUBLISHED),
                sop_documents::published_at.eq(&now),
                sop_documents::updated_at.eq(&now),
            ))
            .execute(conn)
            .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(SopdeskError::NotFound(format!(
            "SOP not found: {}",
            document_id
        )));
    }

    get_document(conn, document_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve published document".into()))
}

/// Set status=Archived and stamp archived_at. Same repeat-call caveat as
/// `publish_document`.
pub fn archive_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<SopDocument, SopdeskError> {
    let now = current_timestamp();
    let updated =
        diesel::update(sop_documents::table.filter(sop_documents::id.eq(document_id)))
            .set((
                sop_documents::status.eq(doc_statuses::ARCHIVED),
                sop_documents::archived_at.eq(&now),
                sop_documents::updated_at.eq(&now),
            ))
            .execute(conn)
            .map_err(|e| SopdeskError::Database(format!("Update failed: {}", e)))?;

    if updated == 0 {
        return Err(SopdeskError::NotFound(format!(
            "SOP not found: {}",
            document_id
        )));
    }

    get_document(conn, document_id)?
        .ok_or_else(|| SopdeskError::Database("Failed to retrieve archived document".into()))
}

/// Irreversibly delete a document with an explicit cascade of its version
/// history, feedback and tags.
pub fn delete_document(
    conn: &mut SqliteConnection,
    document_id: &str,
) -> Result<bool, SopdeskError> {
    conn.transaction(|conn| {
        versions::delete_for_document(conn, document_id)?;
        feedback::delete_for_document(conn, document_id)?;

        diesel::delete(sop_tags::table.filter(sop_tags::document_id.eq(document_id)))
            .execute(conn)
            .map_err(|e| SopdeskError::Database(format!("Tag delete failed: {}", e)))?;

        let deleted =
            diesel::delete(sop_documents::table.filter(sop_documents::id.eq(document_id)))
                .execute(conn)
                .map_err(|e| SopdeskError::Database(format!("Delete failed: {}", e)))?;

        Ok(deleted > 0)
    })
}
