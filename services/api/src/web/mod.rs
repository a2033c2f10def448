pub mod auth;
pub mod campus;
pub mod contacts;
pub mod error;
pub mod escorts;
pub mod friend_walk;
pub mod incidents;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod sos;
pub mod state;
pub mod validation;

// Re-export the router builder for the binary that serves it.
pub use router::build_router;
