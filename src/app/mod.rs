//! Application assembly — the middleware chain with the router at its end,
//! and the `/fib` wiring used by the binary.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::fib::{Engine, FibService};
use crate::middleware::{LoggerMiddleware, Middleware, MiddlewareHandler, Next, from_middleware};
use crate::{Request, Response, Router};

/// A complete request pipeline.
///
/// Cloning shares the same chain, so one `App` can be handed to every
/// connection task.
#[derive(Clone)]
pub struct App {
    chain: Arc<[MiddlewareHandler]>,
}

impl App {
    /// Starts a builder whose terminal layer is `router`.
    pub fn builder(router: Router) -> AppBuilder {
        AppBuilder {
            layers: Vec::new(),
            router,
        }
    }

    /// The production pipeline: request logging in front of `GET /fib`.
    pub fn fib<E: Engine>(service: FibService<E>) -> Self {
        let mut router = Router::new();
        router.get("/fib", move |ctx: Context| {
            let service = service.clone();
            async move { service.respond(ctx.query_param("n")).await }
        });
        Self::builder(router).layer(LoggerMiddleware).build()
    }

    /// Runs `request` through the chain.
    pub async fn handle(&self, request: Request) -> Response {
        Next::new(Arc::clone(&self.chain))
            .run(Context::new(request))
            .await
    }
}

/// Collects middleware in outer-to-inner order.
pub struct AppBuilder {
    layers: Vec<MiddlewareHandler>,
    router: Router,
}

impl AppBuilder {
    /// Appends `middleware`; earlier layers wrap later ones.
    #[must_use]
    pub fn layer<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.layers.push(from_middleware(Arc::new(middleware)));
        self
    }

    pub fn build(self) -> App {
        let router = Arc::new(self.router);
        let terminal: MiddlewareHandler = Arc::new(
            move |ctx: Context, _next: Next| -> Pin<Box<dyn Future<Output = Response> + Send>> {
                let router = Arc::clone(&router);
                Box::pin(async move { router.route(ctx).await })
            },
        );

        let mut chain = self.layers;
        chain.push(terminal);
        App {
            chain: Arc::from(chain),
        }
    }
}
