//! HTTP middleware for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (one `http_request` span per request)
//! 3. Request ID (tags the span, the Sentry scope and the response)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
