//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions)
//!
//! Authentication and display currency are extractors rather than layers.

pub mod auth;
pub mod currency;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use currency::DisplayCurrency;
pub use request_id::{RequestId, request_id_middleware};
pub use session::{create_session_layer, postgres_session_store};
