//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::token::TokenService;
use campus_safety_core::ports::DatabaseService;
use chrono::Duration;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Handlers hold no other state between requests; the store handle and the
/// token service are the only shared resources.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, Duration::days(config.token_ttl_days));
        Self { db, config, tokens }
    }
}
