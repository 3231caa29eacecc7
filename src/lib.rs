//! # fibserve
//!
//! An async HTTP/1.1 service with a single endpoint, `GET /fib?n=<n>`, that
//! returns the n-th Fibonacci number (`fib(1) = fib(2) = 1`) for
//! `1 <= n <= 100000`. Results are memoized in a bounded LRU cache shared by
//! all requests, and every computation runs on Tokio's blocking pool under a
//! wall-clock deadline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use fibserve::app::App;
//! use fibserve::cache::FibCache;
//! use fibserve::fib::{FibEngine, FibService};
//! use fibserve::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = FibEngine::new(Arc::new(FibCache::default()));
//!     let app = App::fib(FibService::new(engine, Duration::from_secs(60)));
//!
//!     let server = Server::bind("127.0.0.1:8000").await?;
//!     server.run(move |req| {
//!         let app = app.clone();
//!         async move { app.handle(req).await }
//!     }).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod background;
pub mod cache;
pub mod config;
pub mod context;
pub mod fib;
pub mod http;
pub mod middleware;
pub mod router;
pub mod server;

pub use http::{Headers, Method, Request, Response, StatusCode};
pub use router::Router;
pub use server::{Server, ServerError};
