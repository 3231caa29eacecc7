//! Request routing — map exact paths and HTTP methods to handler functions.
//!
//! Trailing slashes are normalized on both registered paths and incoming
//! paths, so `/fib/` and `/fib` are equivalent. Routes are matched in
//! registration order; the first route whose method and path both match wins.
//!
//! | Outcome                              | Response                         |
//! |--------------------------------------|----------------------------------|
//! | method and path match                | the handler's response           |
//! | path matches under other methods     | `405` with an `Allow` header     |
//! | nothing matches                      | `404`                            |

use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::{Method, Response, StatusCode};

/// Type-erased, heap-allocated async handler that processes a [`Context`] and
/// returns a [`Response`].
///
/// You never construct this type directly — use [`Router::get`] or
/// [`Router::route_to`].
pub type Handler =
    Arc<dyn Fn(Context) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Context) -> impl Future<Output = Response> + Send` that is also
/// `Send + Sync + 'static` implements this trait through the blanket impl.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given context, boxing the returned future.
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Context) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: Context) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin((self)(ctx))
    }
}

fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

// A single registered route binding a method + path to a handler.
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// HTTP request router.
///
/// # Examples
///
/// ```rust,no_run
/// use fibserve::context::Context;
/// use fibserve::{Response, Router, StatusCode};
///
/// let mut router = Router::new();
/// router.get("/ping", |_ctx: Context| async { Response::new(StatusCode::Ok) });
/// assert_eq!(router.len(), 1);
/// ```
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create a new, empty `Router`.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for `GET` requests to `path`.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) {
        self.route_to(Method::Get, path, handler);
    }

    /// Register a handler for `method` requests to `path`.
    pub fn route_to(&mut self, method: Method, path: &str, handler: impl IntoHandler) {
        let handler: Handler = Arc::new(move |ctx| handler.call(ctx));
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler,
        });
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Dispatch `ctx` to the first matching route and return its response.
    pub async fn route(&self, ctx: Context) -> Response {
        let path = normalize(ctx.request().path()).to_owned();
        let mut allowed: Vec<&str> = Vec::new();

        for route in self.routes.iter().filter(|r| r.path == path) {
            if &route.method == ctx.request().method() {
                return (route.handler)(ctx).await;
            }
            if !allowed.contains(&route.method.as_str()) {
                allowed.push(route.method.as_str());
            }
        }

        if allowed.is_empty() {
            Response::new(StatusCode::NotFound)
        } else {
            Response::new(StatusCode::MethodNotAllowed).header("Allow", allowed.join(", "))
        }
    }
}
