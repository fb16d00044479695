//! Durable Job Queue (F): a typed FIFO with at-least-once delivery,
//! configurable per-job retries, and exponential backoff (§4.6). Grounded
//! on `consumer_tasks.rs`'s `retry_with_backoff` + `RetryConfig` +
//! DLQ-on-exhaustion shape, generalized from a single-subject consumer
//! loop into a reusable queue that both the webhook and notification
//! dispatchers drive.
//!
//! This is an in-process implementation: production deployments would back
//! it with a durable broker, but the retry/backoff/stats contract it
//! exposes is the same one a broker-backed queue would honor, following the
//! Design Notes' (§9) guidance to keep "instance-level singleton queues" as
//! context-held handles rather than ambient globals.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use common::ids::JobId;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum JobQueueError {
    #[error("queue is shutting down")]
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Waiting,
    Active,
    Delayed,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct JobOptions {
    pub job_id: JobId,
    pub attempts: u32,
    pub base_delay: Duration,
}

impl JobOptions {
    pub fn new(job_id: JobId, attempts: u32, base_delay: Duration) -> Self {
        Self {
            job_id,
            attempts,
            base_delay,
        }
    }
}

#[derive(Debug, Clone)]
struct Job<T> {
    job_id: JobId,
    job_type: &'static str,
    data: T,
    attempt: u32,
    max_attempts: u32,
    base_delay: Duration,
    state: JobState,
    last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub delayed: usize,
}

struct Inner<T> {
    waiting: VecDeque<Job<T>>,
    active: usize,
    delayed: usize,
    seen: HashMap<JobId, JobState>,
    completed: VecDeque<JobId>,
    failed: VecDeque<JobId>,
    shutting_down: bool,
}

/// A generic, job-type-agnostic durable queue (§4.6). `T` is the job
/// payload (`WebhookDeliveryJob`, `NotificationJob`, ...).
pub struct JobQueue<T> {
    inner: Mutex<Inner<T>>,
    notify: Notify,
    remove_on_complete: usize,
    remove_on_fail: usize,
}

impl<T: Clone + Send + 'static> JobQueue<T> {
    pub fn new(remove_on_complete: usize, remove_on_fail: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                waiting: VecDeque::new(),
                active: 0,
                delayed: 0,
                seen: HashMap::new(),
                completed: VecDeque::new(),
                failed: VecDeque::new(),
                shutting_down: false,
            }),
            notify: Notify::new(),
            remove_on_complete,
            remove_on_fail,
        }
    }

    /// Submitting the same `job_id` twice yields a single processed job
    /// (§4.6): a resubmission while the job is in any known state is a
    /// no-op.
    pub async fn enqueue(&self, job_type: &'static str, data: T, opts: JobOptions) -> Result<JobId, JobQueueError> {
        let mut inner = self.inner.lock().await;
        if inner.shutting_down {
            return Err(JobQueueError::ShuttingDown);
        }
        if inner.seen.contains_key(&opts.job_id) {
            return Ok(opts.job_id);
        }

        inner.seen.insert(opts.job_id.clone(), JobState::Waiting);
        inner.waiting.push_back(Job {
            job_id: opts.job_id.clone(),
            job_type,
            data,
            attempt: 0,
            max_attempts: opts.attempts.max(1),
            base_delay: opts.base_delay,
            state: JobState::Waiting,
            last_error: None,
        });
        drop(inner);
        self.notify.notify_one();
        Ok(opts.job_id)
    }

    pub async fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().await;
        QueueStats {
            waiting: inner.waiting.len(),
            active: inner.active,
            completed: inner.completed.len(),
            failed: inner.failed.len(),
            delayed: inner.delayed,
        }
    }

    /// Stops accepting new submissions; in-flight jobs already popped by a
    /// worker are allowed to drain (§5 shutdown ordering).
    pub async fn stop_accepting(&self) {
        self.inner.lock().await.shutting_down = true;
    }

    async fn pop(&self) -> Option<Job<T>> {
        let mut inner = self.inner.lock().await;
        let job = inner.waiting.pop_front();
        if job.is_some() {
            inner.active += 1;
        }
        job
    }

    async fn requeue_delayed(self: &Arc<Self>, mut job: Job<T>) {
        {
            let mut inner = self.inner.lock().await;
            inner.active -= 1;
            inner.delayed += 1;
        }
        let delay = job.base_delay * 2u32.pow(job.attempt.saturating_sub(1));
        tokio::time::sleep(delay).await;
        job.state = JobState::Waiting;
        let mut inner = self.inner.lock().await;
        inner.delayed -= 1;
        inner.waiting.push_back(job);
        drop(inner);
        self.notify.notify_one();
    }

    async fn finish(&self, job_id: &JobId, ok: bool) {
        let mut inner = self.inner.lock().await;
        inner.active -= 1;
        if ok {
            inner.seen.insert(job_id.clone(), JobState::Completed);
            inner.completed.push_back(job_id.clone());
            while inner.completed.len() > self.remove_on_complete {
                inner.completed.pop_front();
            }
        } else {
            inner.seen.insert(job_id.clone(), JobState::Failed);
            inner.failed.push_back(job_id.clone());
            while inner.failed.len() > self.remove_on_fail {
                inner.failed.pop_front();
            }
        }
    }

    /// Drives jobs to `handler` until `stop_accepting` has been called and
    /// the waiting queue is drained. A handler error retries with
    /// exponential backoff (`base_delay * 2^(attempt-1)`) until `attempts`
    /// is exhausted, then the job moves to `failed` (§4.6).
    pub async fn consume<F, Fut>(self: Arc<Self>, handler: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), String>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        loop {
            let job = self.pop().await;
            let Some(mut job) = job else {
                let shutting_down = self.inner.lock().await.shutting_down;
                if shutting_down {
                    return;
                }
                self.notify.notified().await;
                continue;
            };

            job.attempt += 1;
            let result = handler(job.data.clone()).await;

            match result {
                Ok(()) => {
                    info!(job_id = %job.job_id, job_type = job.job_type, attempt = job.attempt, "job completed");
                    self.finish(&job.job_id, true).await;
                }
                Err(e) if job.attempt < job.max_attempts => {
                    warn!(job_id = %job.job_id, job_type = job.job_type, attempt = job.attempt, error = %e, "job failed, retrying with backoff");
                    job.last_error = Some(e);
                    let this = self.clone();
                    tokio::spawn(async move { this.requeue_delayed(job).await });
                }
                Err(e) => {
                    error!(job_id = %job.job_id, job_type = job.job_type, attempts = job.attempt, error = %e, "job exhausted retries, moved to failed");
                    self.finish(&job.job_id, false).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn duplicate_job_id_is_processed_once() {
        let queue = Arc::new(JobQueue::<u32>::new(10, 10));
        let opts = JobOptions::new(JobId("job-1".into()), 3, Duration::from_millis(1));

        queue.enqueue("test", 1, opts.clone()).await.unwrap();
        queue.enqueue("test", 1, opts).await.unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let worker = tokio::spawn(queue.clone().consume(move |_data: u32| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.stop_accepting().await;
        let _ = tokio::time::timeout(Duration::from_millis(200), worker).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(queue.stats().await.completed, 1);
    }

    #[tokio::test]
    async fn exhausted_retries_move_job_to_failed() {
        let queue = Arc::new(JobQueue::<u32>::new(10, 10));
        let opts = JobOptions::new(JobId("job-2".into()), 2, Duration::from_millis(1));
        queue.enqueue("test", 1, opts).await.unwrap();

        let worker = tokio::spawn(queue.clone().consume(|_data: u32| async move { Err("boom".to_string()) }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.stop_accepting().await;
        let _ = tokio::time::timeout(Duration::from_millis(200), worker).await;

        let stats = queue.stats().await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 0);
    }
}
