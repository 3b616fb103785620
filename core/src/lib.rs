//! Todo session core: keeps a user's todo list in sync with a remote CRUD API.
//!
//! # Overview
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). A `Transport`
//! executes the round-trip, and `TodoSession` owns the list, the optimistic
//! placeholder, the loading set and the error banner, applying each settled
//! request one at a time.
//!
//! # Design
//! - `TodoClient` is stateless: it holds only `base_url` and the user id.
//! - Each CRUD operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod banner;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use banner::ErrorBanner;
pub use client::TodoClient;
pub use config::{SessionConfig, UserId, DEFAULT_ERROR_TTL};
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Dispatch, SessionEvent, TodoSession};
pub use transport::{HttpTransport, Transport};
pub use types::{DisplayItem, ErrorKind, NewTodo, PendingTodo, StatusFilter, Todo, TodoId, PENDING_ID};
