//! Integration tests for the coalescing executor.
//!
//! Tasks are gated with `Notify` and counted with atomics so the tests
//! exercise real interleavings without sleeping for "long enough".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use unijob::{ExecutorConfig, Job, JobExecutor, TaskError, TaskFn, TaskRef};

/// A task that records it ran, blocks until `release`, then yields `value`.
fn gated_task(value: u64, release: Arc<Notify>, runs: Arc<AtomicUsize>) -> TaskRef<u64> {
    TaskFn::arc(move |_ctx: CancellationToken| {
        let release = Arc::clone(&release);
        let runs = Arc::clone(&runs);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            release.notified().await;
            Ok(value)
        }
    })
}

/// A task that never completes on its own (waits on the executor's token).
fn stuck_task() -> TaskRef<u64> {
    TaskFn::arc(|ctx: CancellationToken| async move {
        ctx.cancelled().await;
        Err(TaskError::Canceled)
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_execution() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    // Both subscriptions are obtained while the task is blocked, so the
    // second submit must coalesce; its own task (yielding 43) is discarded.
    let sub1 = executor
        .submit("K1", gated_task(42, Arc::clone(&release), Arc::clone(&runs)))
        .await;
    let sub2 = executor
        .submit("K1", gated_task(43, Arc::clone(&release), Arc::clone(&runs)))
        .await;

    release.notify_one();

    let (r1, r2) = tokio::join!(
        sub1.wait(CancellationToken::new()),
        sub2.wait(CancellationToken::new()),
    );

    assert_eq!(r1, Ok(42));
    assert_eq!(r2, Ok(42));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn task_error_is_delivered_verbatim() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();

    let task = TaskFn::arc(|_ctx: CancellationToken| async move {
        Err::<u64, _>(TaskError::fail("fibonacci(94) overflows u64"))
    });
    let sub = executor.submit("overflow", task).await;

    let err = sub.wait(CancellationToken::new()).await.unwrap_err();
    assert_eq!(err, TaskError::fail("fibonacci(94) overflows u64"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_caller_does_not_disturb_siblings() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let sub1 = executor
        .submit("K", gated_task(7, Arc::clone(&release), Arc::clone(&runs)))
        .await;
    let sub2 = executor
        .submit("K", gated_task(8, Arc::clone(&release), Arc::clone(&runs)))
        .await;

    // One caller walks away before delivery...
    let ctx = CancellationToken::new();
    ctx.cancel();
    assert_eq!(sub2.wait(ctx).await, Err(TaskError::Canceled));

    // ...and the sibling still receives the eventual outcome.
    release.notify_one();
    assert_eq!(sub1.wait(CancellationToken::new()).await, Ok(7));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn caller_context_expiry_never_yields_the_task_value() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let sub = executor.submit("stuck", stuck_task()).await;

    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    assert_eq!(sub.wait(ctx).await, Err(TaskError::Canceled));

    // Let the stuck task exit cooperatively.
    executor.shutdown();
}

#[tokio::test]
async fn subscription_backstop_times_out() {
    let executor: JobExecutor<u64, &str> = JobExecutor::new(ExecutorConfig {
        subscription_timeout: Duration::from_millis(30),
        ..ExecutorConfig::default()
    });
    let sub = executor.submit("stuck", stuck_task()).await;

    let err = sub.wait(CancellationToken::new()).await.unwrap_err();
    assert_eq!(
        err,
        TaskError::TimedOut {
            timeout: Duration::from_millis(30)
        }
    );

    executor.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_keys_run_independently() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    // K1 stays blocked the whole time K2 starts, runs, and delivers.
    let sub1 = executor
        .submit("K1", gated_task(1, Arc::clone(&release), Arc::clone(&runs)))
        .await;
    let sub2 = executor
        .submit("K2", TaskFn::arc(|_ctx: CancellationToken| async { Ok(2u64) }))
        .await;

    assert_eq!(sub2.wait(CancellationToken::new()).await, Ok(2));

    release.notify_one();
    assert_eq!(sub1.wait(CancellationToken::new()).await, Ok(1));
}

#[tokio::test]
async fn key_is_free_again_after_completion() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let runs = Arc::new(AtomicUsize::new(0));

    let counting = |runs: Arc<AtomicUsize>| {
        TaskFn::arc(move |_ctx: CancellationToken| {
            let runs = Arc::clone(&runs);
            async move { Ok(runs.fetch_add(1, Ordering::SeqCst) as u64 + 1) }
        })
    };

    let sub1 = executor.submit("K", counting(Arc::clone(&runs))).await;
    assert_eq!(sub1.wait(CancellationToken::new()).await, Ok(1));

    // Deregistration happens before delivery, so by the time the first
    // caller has its value the key must be free.
    assert!(executor.is_idle().await);

    let sub2 = executor.submit("K", counting(Arc::clone(&runs))).await;
    assert_eq!(sub2.wait(CancellationToken::new()).await, Ok(2));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn execute_accepts_caller_built_jobs() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let job = Job::new("J", gated_task(11, Arc::clone(&release), Arc::clone(&runs)));
    let sub = executor.execute(job).await;

    assert_eq!(executor.in_flight().await, 1);

    release.notify_one();
    assert_eq!(sub.wait(CancellationToken::new()).await, Ok(11));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn many_callers_one_key_one_execution() {
    let executor: JobExecutor<u64, &str> = JobExecutor::default();
    let release = Arc::new(Notify::new());
    let runs = Arc::new(AtomicUsize::new(0));

    let mut subs = Vec::new();
    for _ in 0..32 {
        subs.push(
            executor
                .submit("hot", gated_task(99, Arc::clone(&release), Arc::clone(&runs)))
                .await,
        );
    }

    release.notify_one();

    for sub in subs {
        assert_eq!(sub.wait(CancellationToken::new()).await, Ok(99));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
