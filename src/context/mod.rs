//! Per-request context handed through the middleware chain to the handler.

use std::time::Instant;

use crate::Request;

/// Per-request context.
///
/// Owns the parsed [`Request`] and records when processing started so that
/// logging middleware and handlers agree on the request's age.
#[derive(Debug)]
pub struct Context {
    request: Request,
    received_at: Instant,
}

impl Context {
    /// Create a new context from a request, stamped with the current time.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            received_at: Instant::now(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Shorthand for [`Request::query_param`].
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.request.query_param(key)
    }

    /// When this context was created.
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}
