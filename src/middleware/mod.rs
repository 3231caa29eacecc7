//! Middleware pipeline — composable before/after request handler logic.
//!
//! Each middleware wraps the next layer, so it can inspect the request,
//! short-circuit with its own response, or decorate the downstream response.
//! The last layer is normally the [`Router`](crate::Router), installed by
//! [`App`](crate::app::App).
//!
//! ## Core types
//!
//! - [`Middleware`] — trait implemented by all middleware.
//! - [`Next`] — cursor into the remaining chain; call [`Next::run`] to advance.
//! - [`MiddlewareHandler`] — type-erased, cheaply-cloneable middleware function.
//! - [`from_middleware`] — turns a [`Middleware`] into a [`MiddlewareHandler`].
//! - [`LoggerMiddleware`] — request/response logger.

use std::{future::Future, pin::Pin, sync::Arc};

use tracing::info;

use crate::{Response, StatusCode, context::Context};

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is consumed by [`run`](Self::run), so each middleware can forward a
/// request at most once.
pub struct Next {
    middlewares: Arc<[MiddlewareHandler]>,
    // Position of the handler invoked by the next `run` call.
    index: usize,
}

/// A type-erased, reference-counted middleware function.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use fibserve::middleware::{LoggerMiddleware, from_middleware};
///
/// let handler = from_middleware(Arc::new(LoggerMiddleware));
/// ```
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

impl Next {
    /// Creates a `Next` positioned at the start of `middlewares`.
    pub fn new(middlewares: Arc<[MiddlewareHandler]>) -> Self {
        Self {
            middlewares,
            index: 0,
        }
    }

    /// Invokes the next middleware in the chain and returns its response.
    ///
    /// If the chain is exhausted without any layer producing a response, a
    /// `500 Internal Server Error` is returned.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.middlewares.get(self.index).cloned() {
            Some(handler) => {
                self.index += 1;
                handler(ctx, self).await
            }
            None => Response::new(StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline"),
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors receive a [`Context`] and a [`Next`] cursor. They may pass
/// through (`next.run(ctx).await`), short-circuit by returning their own
/// [`Response`], or decorate the downstream response.
///
/// Implementations must be `Send + Sync` because the chain is shared across
/// Tokio tasks, and must return a `Send` future.
pub trait Middleware: Send + Sync {
    /// Handle the request and optionally delegate to the next middleware.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// Logs one line per request with method, path, status and duration.
///
/// Never short-circuits.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let started = ctx.received_at();
            let method = ctx.request().method().clone();
            let path = ctx.request().path().to_owned();

            let response = next.run(ctx).await;

            info!(
                %method,
                path = %path,
                status = response.status().as_u16(),
                elapsed = ?started.elapsed(),
                "request handled"
            );

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;

    fn ctx() -> Context {
        let (req, _) = Request::parse(b"GET /fib HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        Context::new(req)
    }

    fn terminal(status: StatusCode) -> MiddlewareHandler {
        Arc::new(
            move |_ctx: Context, _next: Next| -> Pin<Box<dyn Future<Output = Response> + Send>> {
                Box::pin(async move { Response::new(status) })
            },
        )
    }

    struct Reject;

    impl Middleware for Reject {
        fn handle(
            &self,
            _ctx: Context,
            _next: Next,
        ) -> Pin<Box<dyn Future<Output = Response> + Send>> {
            Box::pin(async { Response::new(StatusCode::BadRequest) })
        }
    }

    #[tokio::test]
    async fn empty_chain_falls_back_to_500() {
        let res = Next::new(Arc::<[MiddlewareHandler]>::from(Vec::new())).run(ctx()).await;
        assert_eq!(res.status(), StatusCode::InternalServerError);
    }

    #[tokio::test]
    async fn logger_passes_the_response_through() {
        let chain: Arc<[MiddlewareHandler]> = Arc::from(vec![
            from_middleware(Arc::new(LoggerMiddleware)),
            terminal(StatusCode::Ok),
        ]);
        let res = Next::new(chain).run(ctx()).await;
        assert_eq!(res.status(), StatusCode::Ok);
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let chain: Arc<[MiddlewareHandler]> = Arc::from(vec![
            from_middleware(Arc::new(Reject)),
            terminal(StatusCode::Ok),
        ]);
        let res = Next::new(chain).run(ctx()).await;
        assert_eq!(res.status(), StatusCode::BadRequest);
    }
}
