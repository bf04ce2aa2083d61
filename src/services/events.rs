//! Event system for domain operations
//!
//! Provides an event bus for notifying listeners about state changes.
//! Useful for:
//! - Audit logging
//! - Real-time notifications
//! - Downstream sync triggers

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Domain events emitted by services
#[derive(Debug, Clone)]
pub enum DomainEvent {
    // Document events
    DocumentCreated {
        id: String,
        title: String,
        category: String,
    },
    DocumentUpdated {
        id: String,
        snapshotted: bool,
    },
    DocumentPublished {
        id: String,
    },
    DocumentArchived {
        id: String,
    },
    DocumentDeleted {
        id: String,
    },
    FeedbackSubmitted {
        document_id: String,
        rating: Option<i32>,
    },

    // User events
    UserRegistered {
        id: String,
        name: String,
    },
    UserLoggedIn {
        id: String,
    },
    MentorAssigned {
        user_id: String,
        mentor_id: Option<String>,
    },

    // Onboarding events
    ModuleCreated {
        id: String,
        title: String,
    },
    TaskCreated {
        id: String,
        module_id: String,
    },
    TaskProgressUpdated {
        user_id: String,
        task_id: String,
        status: String,
    },

    // Notification events
    NotificationRead {
        id: String,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &DomainEvent);
}

/// Event bus for broadcasting domain events
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: DomainEvent) {
        trace!(event = ?event, "Emitting domain event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &DomainEvent) {
        match event {
            DomainEvent::DocumentCreated { id, title, category } => {
                debug!(id = %id, title = %title, category = %category, "SOP created");
            }
            DomainEvent::DocumentUpdated { id, snapshotted } => {
                debug!(id = %id, snapshotted = %snapshotted, "SOP updated");
            }
            DomainEvent::DocumentDeleted { id } => {
                debug!(id = %id, "SOP deleted");
            }
            DomainEvent::UserRegistered { id, name } => {
                debug!(id = %id, name = %name, "User registered");
            }
            DomainEvent::TaskProgressUpdated {
                user_id,
                task_id,
                status,
            } => {
                debug!(
                    user = %user_id,
                    task = %task_id,
                    status = %status,
                    "Task progress updated"
                );
            }
            _ => {
                trace!(event = ?event, "Domain event");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}
