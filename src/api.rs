//! HTTP API for the aggregation service.
//!
//! JSON routes for saving questions, fanning a question out to providers,
//! running the judge analysis, and validating credentials.

mod server;
mod state;

pub use server::start_http_server;
pub use state::ApiState;
