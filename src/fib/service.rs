//! Request orchestration for `GET /fib`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::value::RawValue;
use tracing::{debug, error, warn};

use super::{Engine, FibEngine, FibError, FibIndex, validate};
use crate::background::{JobError, run_with_deadline};
use crate::http::{Response, StatusCode};

/// Wall-clock budget for one computation.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct Computed {
    status: u16,
    // Bare integer literal, up to 20899 digits.
    result: Box<RawValue>,
}

#[derive(Serialize)]
struct Failure {
    status: u16,
    message: String,
}

/// Validates `n`, runs the engine on a worker under a deadline, and shapes
/// the JSON reply.
///
/// Cloning is cheap: clones share the engine (and so its cache).
pub struct FibService<E = FibEngine> {
    engine: Arc<E>,
    budget: Duration,
}

impl<E> Clone for FibService<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            budget: self.budget,
        }
    }
}

impl<E: Engine> FibService<E> {
    pub fn new(engine: E, budget: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            budget,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Computes `fib(n)` for the raw query value and returns its decimal digits.
    ///
    /// Both the computation and the decimal rendering happen on the blocking
    /// pool; this future only waits for the result or the deadline.
    ///
    /// # Errors
    ///
    /// Validation failures, [`FibError::ComputationTimeout`] when the budget
    /// runs out, [`FibError::WorkerFailed`] if the worker panics.
    pub async fn evaluate(&self, raw: Option<&str>) -> Result<String, FibError> {
        let n = validate(raw)?;
        let engine = Arc::clone(&self.engine);

        run_with_deadline(self.budget, move || engine.compute(n).to_str_radix(10))
            .await
            .map_err(|e| match e {
                JobError::DeadlineExceeded { budget } => {
                    warn!(n = n.get(), ?budget, "fib computation timed out");
                    FibError::ComputationTimeout
                }
                JobError::Failed(join_error) => {
                    error!(n = n.get(), error = %join_error, "fib worker failed");
                    FibError::WorkerFailed
                }
            })
    }

    /// Runs [`evaluate`](Self::evaluate) and converts the outcome into a JSON
    /// response: `{"status", "result"}` on success, `{"status", "message"}`
    /// otherwise.
    pub async fn respond(&self, raw: Option<&str>) -> Response {
        match self.evaluate(raw).await {
            Ok(digits) => success(digits),
            Err(e) => {
                if e.is_validation() {
                    debug!(raw = ?raw, reason = %e, "rejected fib input");
                }
                failure(&e)
            }
        }
    }
}

fn success(digits: String) -> Response {
    match RawValue::from_string(digits) {
        Ok(result) => Response::json(
            StatusCode::Ok,
            &Computed {
                status: StatusCode::Ok.as_u16(),
                result,
            },
        ),
        Err(e) => {
            error!(error = %e, "fib result is not a valid JSON number");
            failure(&FibError::WorkerFailed)
        }
    }
}

fn failure(err: &FibError) -> Response {
    let status = err.status();
    Response::json(
        status,
        &Failure {
            status: status.as_u16(),
            message: err.client_message(),
        },
    )
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Instant;

    use num_bigint::BigUint;
    use serde_json::Value;

    use super::*;
    use crate::cache::FibCache;

    fn service() -> FibService {
        FibService::new(FibEngine::new(Arc::new(FibCache::default())), DEFAULT_BUDGET)
    }

    fn body(response: &Response) -> Value {
        serde_json::from_slice(response.body_ref()).unwrap()
    }

    /// Sleeps past any short budget before answering.
    struct Stalling(Duration);

    impl Engine for Stalling {
        fn compute(&self, _n: FibIndex) -> Arc<BigUint> {
            std::thread::sleep(self.0);
            Arc::new(BigUint::from(1u32))
        }
    }

    struct Exploding;

    impl Engine for Exploding {
        fn compute(&self, n: FibIndex) -> Arc<BigUint> {
            panic!("engine cannot compute {n}");
        }
    }

    #[tokio::test]
    async fn success_body_has_status_and_integer_result() {
        let res = service().respond(Some("10")).await;
        assert_eq!(res.status(), StatusCode::Ok);
        assert_eq!(res.body_ref(), br#"{"status":200,"result":55}"#);
    }

    #[tokio::test]
    async fn regression_anchors_through_the_service() {
        let svc = service();
        for (raw, expected) in [("1", "1"), ("2", "1"), ("3", "2"), ("10", "55")] {
            assert_eq!(svc.evaluate(Some(raw)).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn huge_result_is_a_bare_json_integer() {
        let res = service().respond(Some("1000")).await;
        let text = std::str::from_utf8(res.body_ref()).unwrap();
        let digits = crate::fib::fibonacci(FibIndex::try_from(1000).unwrap()).to_string();
        assert_eq!(text, format!(r#"{{"status":200,"result":{digits}}}"#));
    }

    #[tokio::test]
    async fn validation_failures_are_400_with_prefixed_message() {
        let svc = service();
        let cases = [
            (None, "required"),
            (Some("abc"), "positive integer"),
            (Some("0"), "1 or greater"),
            (Some("-1"), "1 or greater"),
            (Some("1.5"), "integer"),
            (Some("100001"), "too large"),
        ];
        for (raw, fragment) in cases {
            let res = svc.respond(raw).await;
            assert_eq!(res.status(), StatusCode::BadRequest, "{raw:?}");
            let json = body(&res);
            assert_eq!(json["status"], 400);
            let message = json["message"].as_str().unwrap();
            assert!(message.starts_with("Bad request. "), "{message}");
            assert!(message.contains(fragment), "{raw:?}: {message}");
            assert!(json.get("result").is_none());
        }
    }

    #[tokio::test]
    async fn validation_failures_never_touch_the_cache() {
        let svc = service();
        for raw in ["0", "-5", "100001", "x"] {
            svc.respond(Some(raw)).await;
        }
        assert!(svc.engine().cache().is_empty());
        assert_eq!(svc.engine().cache().stats().misses, 0);
    }

    #[tokio::test]
    async fn timeout_is_504_with_fixed_message() {
        let svc = FibService::new(
            Stalling(Duration::from_millis(500)),
            Duration::from_millis(50),
        );
        let start = Instant::now();
        let res = svc.respond(Some("5")).await;

        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(res.status(), StatusCode::GatewayTimeout);
        let json = body(&res);
        assert_eq!(json["status"], 504);
        assert_eq!(
            json["message"],
            "Calculation timed out. The request took longer than 60 seconds."
        );
    }

    #[tokio::test]
    async fn worker_panic_is_500() {
        let svc = FibService::new(Exploding, DEFAULT_BUDGET);
        let res = svc.respond(Some("5")).await;
        assert_eq!(res.status(), StatusCode::InternalServerError);
        assert_eq!(body(&res)["message"], "Internal server error.");
    }

    #[tokio::test]
    async fn timed_out_work_still_fills_the_cache() {
        let cache = Arc::new(FibCache::new(NonZeroUsize::new(4).unwrap()));
        let svc = FibService::new(FibEngine::new(Arc::clone(&cache)), Duration::ZERO);

        let res = svc.respond(Some("50000")).await;
        assert_eq!(res.status(), StatusCode::GatewayTimeout);

        let n = FibIndex::try_from(50_000).unwrap();
        let deadline = Instant::now() + Duration::from_secs(30);
        while !cache.contains(n) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(cache.contains(n));
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache_and_not_slower() {
        let svc = service();

        let start = Instant::now();
        let first = svc.respond(Some("20000")).await;
        let first_elapsed = start.elapsed();

        let start = Instant::now();
        let second = svc.respond(Some("20000")).await;
        let second_elapsed = start.elapsed();

        assert_eq!(first.status(), StatusCode::Ok);
        assert_eq!(first.body_ref(), second.body_ref());
        assert!(second_elapsed < first_elapsed, "{second_elapsed:?} vs {first_elapsed:?}");

        let stats = svc.engine().cache().stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }
}
