//! stackd HTTP control plane
//!
//! Routes provision/stop/destroy requests through validation, auth, and
//! payload limits into whichever executor strategy the process was wired
//! with, and turns operation outcomes into JSON envelopes.

pub mod middleware;
pub mod routes;
pub mod server;
pub mod validate;

pub use server::{build_router, AppState, Server, MAX_BODY_BYTES};
