//! Sopdesk - SOP repository and onboarding progress core
//!
//! Owns the authoritative state behind an SOP management application:
//! documents with an append-only version ledger, role-based access policy,
//! and per-user onboarding task progress.
//!
//! ## Architecture
//!
//! - **Document store** (`services::DocumentService` over `db::documents`):
//!   current document state; content- or version-changing updates snapshot
//!   the prior state into the version ledger in the same transaction
//! - **Version ledger** (`db::versions`): append-only history, written only
//!   by the document store's update path
//! - **Access policy** (`auth::policy`): a pure decision function over
//!   (actor, action, resource); services convert deny into `Forbidden`
//! - **Progress tracker** (`services::OnboardingService` over
//!   `db::task_progress`): lazy per-(user, task) rows arbitrated by a unique
//!   constraint
//!
//! The HTTP layer lives upstream: it authenticates the caller, builds an
//! `auth::Actor`, and calls into `services::Services`. Every read goes to
//! the store; there are no in-process caches.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod seed;
pub mod services;

// Re-exports
pub use auth::{Action, Actor, Resource};
pub use config::Config;
pub use db::SopDb;
pub use error::SopdeskError;
pub use seed::{seed_baseline, SeedReport};
pub use services::Services;
