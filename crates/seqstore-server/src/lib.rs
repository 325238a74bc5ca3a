//! HTTP surface for seqstore.
//!
//! Accepts JSON entities over HTTP and stores each one as an object keyed
//! by a sequential numeric id. `POST /entities` creates, `PUT
//! /entities/{id}` replaces. Every response body is `{"result": ...}`.

pub mod config;
pub mod error;
pub mod handler;
pub mod response;
pub mod router;
pub mod server;
pub mod state;

pub use config::{Backend, ServiceConfig};
pub use error::{ServerError, ServerResult};
pub use response::{ApiResponse, ResultBody};
pub use router::build_router;
pub use server::SeqstoreServer;
pub use state::AppState;
