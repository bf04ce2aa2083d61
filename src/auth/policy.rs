//! Access policy: a pure decision function over actor, action and resource
//!
//! The policy holds no state and performs no I/O. Callers load whatever
//! resource fields the decision needs (owner, mentor) and pass them in as a
//! descriptor; a mismatched descriptor is denied rather than guessed at.

use crate::db::models::roles;
use crate::error::SopdeskError;

/// The authenticated identity performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }

    fn is_admin(&self) -> bool {
        self.role == roles::ADMIN
    }
}

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadSop,
    CreateSop,
    UpdateSop,
    DeleteSop,
    SubmitFeedback,
    ReadMenteeProgress,
    UpdateOwnProgress,
    ManageModules,
}

impl Action {
    /// Human-readable description for deny messages and logging
    pub fn description(&self) -> &'static str {
        match self {
            Action::ReadSop => "read SOP",
            Action::CreateSop => "create SOP",
            Action::UpdateSop => "update SOP",
            Action::DeleteSop => "delete SOP",
            Action::SubmitFeedback => "submit feedback",
            Action::ReadMenteeProgress => "read mentee progress",
            Action::UpdateOwnProgress => "update own task progress",
            Action::ManageModules => "manage onboarding modules",
        }
    }
}

/// Resource descriptor carrying only the fields decisions depend on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Resource {
    /// Actions that don't target a specific record (create, list-admin)
    #[default]
    None,
    /// A specific SOP document
    Document { owner_user_id: Option<String> },
    /// Another user's record (mentee progress reads)
    UserRecord { mentor_id: Option<String> },
    /// A (user, task) progress record
    Progress { user_id: String },
}

/// Evaluate the decision table. Returns true to allow.
pub fn authorize(actor: &Actor, action: Action, resource: &Resource) -> bool {
    match (action, resource) {
        // Any authenticated actor may read documents and leave feedback
        (Action::ReadSop, _) => true,
        (Action::SubmitFeedback, _) => true,

        (Action::CreateSop, _) => roles::is_editorial(&actor.role),

        (Action::UpdateSop, Resource::Document { owner_user_id }) => {
            owner_user_id.as_deref() == Some(actor.id.as_str())
                || roles::is_editorial(&actor.role)
        }

        (Action::DeleteSop, _) => actor.is_admin(),

        (Action::ReadMenteeProgress, Resource::UserRecord { mentor_id }) => {
            mentor_id.as_deref() == Some(actor.id.as_str()) || actor.is_admin()
        }

        (Action::UpdateOwnProgress, Resource::Progress { user_id }) => actor.id == *user_id,

        (Action::ManageModules, _) => actor.is_admin(),

        // An action paired with the wrong descriptor is a caller bug; deny
        _ => false,
    }
}

/// Authorize or fail with `Forbidden`
pub fn ensure(actor: &Actor, action: Action, resource: &Resource) -> Result<(), SopdeskError> {
    if authorize(actor, action, resource) {
        Ok(())
    } else {
        Err(SopdeskError::Forbidden(format!(
            "Not authorized to {}",
            action.description()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Actor {
        Actor::new("u-viewer", "Viewer")
    }

    fn editor() -> Actor {
        Actor::new("u-editor", "Editor")
    }

    fn admin() -> Actor {
        Actor::new("u-admin", "Admin")
    }

    fn mentor() -> Actor {
        Actor::new("u-mentor", "Mentor")
    }

    #[test]
    fn test_read_and_feedback_open_to_all_authenticated() {
        for actor in [viewer(), editor(), admin(), mentor()] {
            assert!(authorize(&actor, Action::ReadSop, &Resource::None));
            assert!(authorize(&actor, Action::SubmitFeedback, &Resource::None));
        }
    }

    #[test]
    fn test_create_requires_editorial_role() {
        assert!(authorize(&admin(), Action::CreateSop, &Resource::None));
        assert!(authorize(&editor(), Action::CreateSop, &Resource::None));
        assert!(!authorize(&viewer(), Action::CreateSop, &Resource::None));
        assert!(!authorize(&mentor(), Action::CreateSop, &Resource::None));
    }

    #[test]
    fn test_update_allows_owner_or_editorial() {
        let not_owned = Resource::Document {
            owner_user_id: Some("someone-else".into()),
        };
        assert!(!authorize(&viewer(), Action::UpdateSop, &not_owned));
        assert!(authorize(&editor(), Action::UpdateSop, &not_owned));
        assert!(authorize(&admin(), Action::UpdateSop, &not_owned));

        let owned = Resource::Document {
            owner_user_id: Some("u-viewer".into()),
        };
        assert!(authorize(&viewer(), Action::UpdateSop, &owned));

        let unowned = Resource::Document { owner_user_id: None };
        assert!(!authorize(&viewer(), Action::UpdateSop, &unowned));
    }

    #[test]
    fn test_delete_is_admin_only() {
        let doc = Resource::Document {
            owner_user_id: Some("u-editor".into()),
        };
        assert!(authorize(&admin(), Action::DeleteSop, &doc));
        assert!(!authorize(&editor(), Action::DeleteSop, &doc));
        assert!(!authorize(&viewer(), Action::DeleteSop, &doc));
        // Owning the document grants no delete rights
        assert!(!authorize(
            &Actor::new("u-editor", "Viewer"),
            Action::DeleteSop,
            &doc
        ));
    }

    #[test]
    fn test_mentee_progress_readable_by_mentor_or_admin() {
        let mentee = Resource::UserRecord {
            mentor_id: Some("u-mentor".into()),
        };
        assert!(authorize(&mentor(), Action::ReadMenteeProgress, &mentee));
        assert!(authorize(&admin(), Action::ReadMenteeProgress, &mentee));
        assert!(!authorize(&viewer(), Action::ReadMenteeProgress, &mentee));

        let unmentored = Resource::UserRecord { mentor_id: None };
        assert!(!authorize(&mentor(), Action::ReadMenteeProgress, &unmentored));
        assert!(authorize(&admin(), Action::ReadMenteeProgress, &unmentored));
    }

    #[test]
    fn test_own_progress_ignores_role() {
        let own = Resource::Progress {
            user_id: "u-viewer".into(),
        };
        assert!(authorize(&viewer(), Action::UpdateOwnProgress, &own));
        // Not even Admin may update someone else's progress
        assert!(!authorize(&admin(), Action::UpdateOwnProgress, &own));
    }

    #[test]
    fn test_module_management_is_admin_only() {
        assert!(authorize(&admin(), Action::ManageModules, &Resource::None));
        assert!(!authorize(&editor(), Action::ManageModules, &Resource::None));
        assert!(!authorize(&mentor(), Action::ManageModules, &Resource::None));
    }

    #[test]
    fn test_mismatched_descriptor_denied() {
        assert!(!authorize(&admin(), Action::UpdateSop, &Resource::None));
        assert!(!authorize(
            &admin(),
            Action::UpdateOwnProgress,
            &Resource::None
        ));
    }

    #[test]
    fn test_ensure_maps_deny_to_forbidden() {
        let result = ensure(&viewer(), Action::DeleteSop, &Resource::None);
        assert!(matches!(result, Err(SopdeskError::Forbidden(_))));
        assert!(ensure(&admin(), Action::DeleteSop, &Resource::None).is_ok());
    }
}
