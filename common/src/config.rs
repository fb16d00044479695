//! Environment-backed configuration, following the teacher's `main.rs`
//! pattern (`dotenv().ok()` then `env::var(...)`), collected here into a
//! struct instead of scattered calls so both binaries share one reading.

use std::env;
use std::time::Duration;

/// Durable job queue tuning shared by the webhook and notification
/// dispatchers (§4.6).
#[derive(Debug, Clone)]
pub struct JobQueueConfig {
    pub webhook_attempts: u32,
    pub webhook_base_delay: Duration,
    pub notification_attempts: u32,
    pub notification_base_delay: Duration,
    pub remove_on_complete: usize,
    pub remove_on_fail: usize,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            webhook_attempts: 5,
            webhook_base_delay: Duration::from_secs(1),
            notification_attempts: 3,
            notification_base_delay: Duration::from_millis(500),
            remove_on_complete: 1000,
            remove_on_fail: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub request_timeout: Duration,
    pub auto_deactivate_after_failures: u32,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            // Decision recorded in DESIGN.md ("Open Question decisions"):
            // 10 consecutive failures deactivates a subscription.
            auto_deactivate_after_failures: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub sweep_interval: Duration,
    pub stuck_after: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            stuck_after: Duration::from_secs(60),
        }
    }
}

/// Top-level app config assembled from the environment. `database_url` is
/// the only field that must be set; everything else has a teacher-matching
/// default and can be overridden for ops tuning.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub job_queue: JobQueueConfig,
    pub webhook: WebhookConfig,
    pub reconciler: ReconcilerConfig,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the environment, mirroring
    /// `dotenvy::dotenv().ok()` + `env::var("DATABASE_URL").expect(...)` in
    /// the teacher's `main.rs`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            host,
            port,
            job_queue: JobQueueConfig::default(),
            webhook: WebhookConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}
