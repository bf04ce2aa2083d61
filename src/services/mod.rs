//! Service layer for sopdesk
//!
//! Services encapsulate business logic between the API layer and the
//! repositories. Each service wraps database operations with:
//! - Access-policy checks (`auth::policy`)
//! - Input validation
//! - Event emission for audit/notifications
//! - Transaction boundaries
//!
//! ## Architecture
//!
//! ```text
//! API layer (out of scope, thin)
//!     ↓
//! Service Layer (business logic)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod document_service;
pub mod events;
pub mod notification_service;
pub mod onboarding_service;
pub mod user_service;

// Re-exports
pub use document_service::DocumentService;
pub use events::{DomainEvent, EventBus, EventListener};
pub use notification_service::NotificationService;
pub use onboarding_service::OnboardingService;
pub use user_service::UserService;

use crate::db::SopDb;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Each component receives exactly the handles it needs; nothing reaches
/// into a process-wide registry.
pub struct Services {
    pub db: Arc<SopDb>,
    pub documents: Arc<DocumentService>,
    pub onboarding: Arc<OnboardingService>,
    pub users: Arc<UserService>,
    pub notifications: Arc<NotificationService>,
    pub events: Arc<EventBus>,
}

impl Services {
    /// Create all services with a shared database
    pub fn new(db: Arc<SopDb>) -> Self {
        let events = Arc::new(EventBus::new());

        Self {
            documents: Arc::new(DocumentService::new(db.clone(), events.clone())),
            onboarding: Arc::new(OnboardingService::new(db.clone(), events.clone())),
            users: Arc::new(UserService::new(db.clone(), events.clone())),
            notifications: Arc::new(NotificationService::new(db.clone(), events.clone())),
            db,
            events,
        }
    }
}
