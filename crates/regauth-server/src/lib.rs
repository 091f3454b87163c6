//! # regauth-server
//!
//! HTTP front end of the registry token service.
//!
//! Serves two routes:
//! - `GET {server.token_path}` (default `/v1/registry/auth`): Basic-authenticated
//!   token endpoint used by registry clients
//! - `GET /healthz`: liveness probe
//!
//! Error responses carry a JSON body `{code, message, comment}` and 401s
//! include a `WWW-Authenticate: Basic` challenge.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ServerError;
pub use routes::create_router;
pub use server::TokenServer;
pub use state::AppState;
