//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, state)
//!     → request.rs (proxy origin, path, body limit)
//!     → [proxy pipeline resolves backend and forwards]
//!     → headers.rs (hop-by-hop stripping, rewritten-body headers)
//!     → response.rs (relay, error mapping)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;

pub use request::{IncomingRequest, OutgoingRequest, PathKind};
pub use request_id::{UuidRequestId, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
