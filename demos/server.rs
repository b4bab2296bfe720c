//! Sample deployment: two read-only HTTP endpoints whose computations are
//! coalesced per request key.
//!
//! - `GET /fib/{n}`      — n-th Fibonacci number (u64, overflow is a task error)
//! - `GET /isprime/{n}`  — primality by trial division
//!
//! Each job sleeps for an artificial minimum duration so coalescing is easy
//! to observe: hammer one endpoint with the same argument and watch a single
//! execution serve every caller.
//!
//! ```text
//! curl localhost:8080/fib/90
//! {"result":2880067194370816120,"duration":2.00123}
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use unijob::{ExecutorConfig, JobExecutor, TaskError, TaskFn};

/// Artificial floor on job duration; makes the coalescing window visible.
const MIN_JOB_DURATION: Duration = Duration::from_secs(2);

type Executor = JobExecutor<serde_json::Value, u64>;

#[derive(Serialize)]
struct Response {
    result: serde_json::Value,
    duration: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,unijob=debug".into()),
        )
        .init();

    let executor: Executor = JobExecutor::new(ExecutorConfig::default());

    let app = Router::new()
        .route("/fib/{num}", get(handle_fib))
        .route("/isprime/{num}", get(handle_isprime))
        .with_state(executor);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_fib(
    State(executor): State<Executor>,
    Path(num): Path<String>,
) -> Result<Json<Response>, (StatusCode, String)> {
    let num = validate(&num)?;
    run_job(&executor, key_for("/fib", num), move || fibonacci(num)).await
}

async fn handle_isprime(
    State(executor): State<Executor>,
    Path(num): Path<String>,
) -> Result<Json<Response>, (StatusCode, String)> {
    let num = validate(&num)?;
    run_job(&executor, key_for("/isprime", num), move || {
        Ok(is_prime(num).into())
    })
    .await
}

/// Non-negative integer or 422; the core never sees invalid input.
fn validate(raw: &str) -> Result<u64, (StatusCode, String)> {
    raw.parse::<u64>().map_err(|_| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("expected a non-negative integer, got {raw:?}"),
        )
    })
}

/// Deduplication key: hash of the route and the argument.
fn key_for(route: &str, num: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    route.hash(&mut hasher);
    num.hash(&mut hasher);
    hasher.finish()
}

async fn run_job<F>(
    executor: &Executor,
    key: u64,
    compute: F,
) -> Result<Json<Response>, (StatusCode, String)>
where
    F: Fn() -> Result<serde_json::Value, TaskError> + Send + Sync + 'static,
{
    let task = TaskFn::arc(move |_ctx: CancellationToken| {
        let outcome = compute();
        async move {
            tokio::time::sleep(MIN_JOB_DURATION).await;
            outcome
        }
    });

    let started = Instant::now();
    let subscription = executor.submit(key, task).await;
    let result = subscription
        .wait(CancellationToken::new())
        .await
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok(Json(Response {
        result,
        duration: started.elapsed().as_secs_f64(),
    }))
}

fn fibonacci(n: u64) -> Result<serde_json::Value, TaskError> {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a
            .checked_add(b)
            .ok_or_else(|| TaskError::fail(format!("fibonacci({n}) overflows u64")))?;
        a = b;
        b = next;
    }
    Ok(a.into())
}

fn is_prime(p: u64) -> bool {
    if p < 2 {
        return false;
    }
    let mut i = 2u64;
    while i.saturating_mul(i) <= p {
        if p % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}
