//! engine::batch
//!
//! Bounded concurrent execution of independent collations.
//!
//! Each job runs on the blocking pool (`spawn_blocking`); a semaphore caps
//! how many run at once. The permit moves into the blocking task so the cap
//! also holds for jobs whose caller has stopped waiting on a timeout.
//! Results come back in job order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use super::{run_collation_until, CollationJob, CollationOutput};
use crate::align::CollationError;
use crate::core::config::CollationConfig;

/// Errors that fail one job of a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Collation(#[from] CollationError),

    #[error("collation '{job}' timed out after {after:?}")]
    TimedOut { job: String, after: Duration },

    #[error("collation '{job}' panicked: {message}")]
    Panicked { job: String, message: String },

    #[error("collation '{job}' was aborted before it started")]
    Aborted { job: String },
}

/// Result of one job.
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: Result<CollationOutput, BatchError>,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `jobs` with at most `config.max_parallel_collations` at once.
///
/// Must be called within a multi-threaded tokio runtime.
pub async fn run_batch(jobs: Vec<CollationJob>, config: &CollationConfig) -> Vec<JobOutcome> {
    run_batch_with(jobs, config, run_collation_until).await
}

async fn run_batch_with<F>(
    jobs: Vec<CollationJob>,
    config: &CollationConfig,
    collate: F,
) -> Vec<JobOutcome>
where
    F: Fn(&CollationJob, &CollationConfig, Option<Instant>) -> Result<CollationOutput, BatchError>
        + Copy
        + Send
        + 'static,
{
    let permits = Arc::new(Semaphore::new(config.max_parallel_collations.max(1)));
    tracing::debug!(
        jobs = jobs.len(),
        parallel = config.max_parallel_collations,
        "batch started"
    );

    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let name = job.name.clone();
        let permits = Arc::clone(&permits);
        let config = config.clone();

        let handle = tokio::spawn(async move {
            let name = job.name.clone();
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| BatchError::Aborted { job: name.clone() })?;

            let limit = config.timeout;
            let deadline = limit.map(|limit| Instant::now() + limit);
            let task = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                collate(&job, &config, deadline)
            });

            match limit {
                Some(limit) => match tokio::time::timeout(limit, task).await {
                    Ok(joined) => joined_result(joined, &name),
                    Err(_) => Err(BatchError::TimedOut {
                        job: name,
                        after: limit,
                    }),
                },
                None => joined_result(task.await, &name),
            }
        });
        handles.push((name, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(panicked(err, &name)),
        };
        if let Err(err) = &result {
            tracing::warn!(job = %name, error = %err, "collation failed");
        }
        outcomes.push(JobOutcome { name, result });
    }
    outcomes
}

fn joined_result(
    joined: Result<Result<CollationOutput, BatchError>, JoinError>,
    name: &str,
) -> Result<CollationOutput, BatchError> {
    joined.unwrap_or_else(|err| Err(panicked(err, name)))
}

fn panicked(err: JoinError, name: &str) -> BatchError {
    let message = if err.is_panic() {
        let payload = err.into_panic();
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    } else {
        err.to_string()
    };
    BatchError::Panicked {
        job: name.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Sigil, Witness};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn job(name: &str, texts: &[(&str, &str)]) -> CollationJob {
        CollationJob {
            name: name.to_string(),
            witnesses: texts
                .iter()
                .map(|(s, t)| Witness::from_text(Sigil::new(*s).unwrap(), t))
                .collect(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn results_in_job_order() {
        let jobs = vec![
            job("first", &[("A", "a b c"), ("B", "a c")]),
            job("second", &[("A", "x y"), ("B", "y x")]),
            job("third", &[("A", "one")]),
        ];
        let outcomes = run_batch(jobs, &CollationConfig::default()).await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(outcomes.iter().all(JobOutcome::is_ok));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_job_does_not_affect_others() {
        let jobs = vec![
            job("good", &[("A", "a b")]),
            job("bad", &[("A", "a"), ("A", "b")]),
        ];
        let outcomes = run_batch(jobs, &CollationConfig::default()).await;
        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(BatchError::Collation(CollationError::InvalidWitness { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panic_is_isolated() {
        fn explode(
            job: &CollationJob,
            config: &CollationConfig,
            deadline: Option<Instant>,
        ) -> Result<CollationOutput, BatchError> {
            if job.name == "boom" {
                panic!("boom");
            }
            run_collation_until(job, config, deadline)
        }

        let jobs = vec![job("boom", &[("A", "a")]), job("fine", &[("A", "a")])];
        let outcomes = run_batch_with(jobs, &CollationConfig::default(), explode).await;

        match &outcomes[0].result {
            Err(BatchError::Panicked { job, message }) => {
                assert_eq!(job, "boom");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_job_times_out() {
        fn slow(
            job: &CollationJob,
            config: &CollationConfig,
            deadline: Option<Instant>,
        ) -> Result<CollationOutput, BatchError> {
            if job.name == "slow" {
                std::thread::sleep(Duration::from_millis(500));
            }
            run_collation_until(job, config, deadline)
        }

        let config = CollationConfig {
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let jobs = vec![job("slow", &[("A", "a")]), job("quick", &[("A", "a")])];
        let outcomes = run_batch_with(jobs, &config, slow).await;

        assert!(matches!(outcomes[0].result, Err(BatchError::TimedOut { .. })));
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parallelism_is_bounded() {
        static RUNNING: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);

        fn tracked(
            job: &CollationJob,
            config: &CollationConfig,
            deadline: Option<Instant>,
        ) -> Result<CollationOutput, BatchError> {
            let now = RUNNING.fetch_add(1, Ordering::SeqCst) + 1;
            PEAK.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            let result = run_collation_until(job, config, deadline);
            RUNNING.fetch_sub(1, Ordering::SeqCst);
            result
        }

        let config = CollationConfig {
            max_parallel_collations: 2,
            ..Default::default()
        };
        let jobs = (0..6)
            .map(|i| job(&format!("job-{}", i), &[("A", "a b")]))
            .collect();
        let outcomes = run_batch_with(jobs, &config, tracked).await;

        assert!(outcomes.iter().all(JobOutcome::is_ok));
        assert!(PEAK.load(Ordering::SeqCst) <= 2);
    }
}
