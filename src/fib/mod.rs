//! The `/fib` endpoint: input validation, the memoized engine, and the
//! deadline-bounded orchestrator that turns both into HTTP responses.
//!
//! ```text
//! ?n=<raw> ─► validate ─► FibService ─► spawn_blocking(Engine::compute) ─┬─► 200 {status, result}
//!               │                         tokio::time::timeout ──────────┴─► 504 {status, message}
//!               └──────────────────────────────────────────────────────────► 400 {status, message}
//! ```

use std::fmt;

use thiserror::Error;

use crate::http::StatusCode;

pub mod engine;
pub mod service;
pub mod validator;

pub use engine::{Engine, FibEngine, fibonacci};
pub use service::FibService;
pub use validator::{FibIndex, MAX_N, MIN_N, validate};

/// Which side of `[MIN_N, MAX_N]` an input fell off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    BelowMinimum,
    AboveMaximum,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowMinimum => f.write_str("n must be a positive integer (1 or greater)."),
            Self::AboveMaximum => write!(f, "n is too large. Max allowed is {MAX_N}."),
        }
    }
}

/// Everything that can stop a `/fib` request from producing a result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FibError {
    #[error("n is required.")]
    MissingParameter,

    #[error("n must be a positive integer (1 or greater).")]
    NotAnInteger,

    #[error("{0}")]
    OutOfRange(Bound),

    #[error("Calculation timed out. The request took longer than 60 seconds.")]
    ComputationTimeout,

    #[error("Internal server error.")]
    WorkerFailed,
}

impl FibError {
    /// Returns `true` for errors caused by the client's input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter | Self::NotAnInteger | Self::OutOfRange(_)
        )
    }

    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::NotAnInteger | Self::OutOfRange(_) => {
                StatusCode::BadRequest
            }
            Self::ComputationTimeout => StatusCode::GatewayTimeout,
            Self::WorkerFailed => StatusCode::InternalServerError,
        }
    }

    /// The `message` field sent to the client.
    pub fn client_message(&self) -> String {
        if self.is_validation() {
            format!("Bad request. {self}")
        } else {
            self.to_string()
        }
    }
}
