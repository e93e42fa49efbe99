//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use life_lessons_core::ports::{
    ContentStore, CredentialStore, PasswordHashingService, TokenService,
};
use life_lessons_core::{Authenticator, ContentService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing in here is mutated after startup; all coordination happens in the
/// stores.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub authenticator: Authenticator,
    pub content: ContentService,
}

impl AppState {
    /// Wires the core services onto the given adapters.
    pub fn new(
        config: Arc<Config>,
        accounts: Arc<dyn CredentialStore>,
        content: Arc<dyn ContentStore>,
        tokens: Arc<dyn TokenService>,
        hasher: Arc<dyn PasswordHashingService>,
    ) -> Self {
        let content = ContentService::new(content, accounts.clone());
        let authenticator =
            Authenticator::new(accounts, tokens, hasher, config.admin_emails.clone());
        Self {
            config,
            authenticator,
            content,
        }
    }
}
