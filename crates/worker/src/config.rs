//! Worker and storage configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default soft limit: the job is asked to stop.
pub const DEFAULT_SOFT_LIMIT_SECS: u64 = 20;

/// Default hard limit: the job is dropped.
pub const DEFAULT_HARD_LIMIT_SECS: u64 = 30;

/// Jobs a worker unit executes before it is replaced.
pub const DEFAULT_MAX_JOBS_PER_WORKER: u64 = 1000;

pub const DEFAULT_CONCURRENCY: usize = 4;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn path_or(key: &str, default: &str) -> PathBuf {
    std::env::var(key).unwrap_or_else(|_| default.into()).into()
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Where the config document and asset folders live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub config_path: PathBuf,
    pub template_folder: PathBuf,
    pub font_folder: PathBuf,
}

impl StorageConfig {
    /// | Env Var           | Default               |
    /// |-------------------|-----------------------|
    /// | `CONFIG_PATH`     | `storage/config.json` |
    /// | `TEMPLATE_FOLDER` | `storage/templates`   |
    /// | `FONT_FOLDER`     | `storage/fonts`       |
    pub fn from_env() -> Self {
        Self {
            config_path: path_or("CONFIG_PATH", "storage/config.json"),
            template_folder: path_or("TEMPLATE_FOLDER", "storage/templates"),
            font_folder: path_or("FONT_FOLDER", "storage/fonts"),
        }
    }
}

// ---------------------------------------------------------------------------
// JobLimits
// ---------------------------------------------------------------------------

/// Wall-clock limits applied to every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLimits {
    soft: Duration,
    hard: Duration,
}

impl JobLimits {
    /// `soft` must be strictly shorter than `hard`.
    pub fn new(soft: Duration, hard: Duration) -> Result<Self, ConfigError> {
        if soft >= hard {
            return Err(ConfigError::Limits {
                soft_secs: soft.as_secs(),
                hard_secs: hard.as_secs(),
            });
        }
        Ok(Self { soft, hard })
    }

    pub fn soft(&self) -> Duration {
        self.soft
    }

    pub fn hard(&self) -> Duration {
        self.hard
    }
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            soft: Duration::from_secs(DEFAULT_SOFT_LIMIT_SECS),
            hard: Duration::from_secs(DEFAULT_HARD_LIMIT_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Sizing and recycling policy of the worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker slots running in parallel.
    pub concurrency: usize,
    /// A worker unit retires after this many jobs.
    pub max_jobs_per_worker: u64,
    /// Sleep between polls of an empty queue.
    pub poll_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_jobs_per_worker: DEFAULT_MAX_JOBS_PER_WORKER,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerConfig
// ---------------------------------------------------------------------------

/// Everything the worker process needs besides SMTP and database settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub storage: StorageConfig,
    pub limits: JobLimits,
    pub pool: PoolConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// Unparseable numbers fall back to their defaults. Zero concurrency or
    /// a soft limit not below the hard limit is an error.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `WORKER_CONCURRENCY`     | `4`     |
    /// | `JOB_SOFT_LIMIT_SECS`    | `20`    |
    /// | `JOB_HARD_LIMIT_SECS`    | `30`    |
    /// | `WORKER_MAX_JOBS`        | `1000`  |
    /// | `QUEUE_POLL_INTERVAL_MS` | `500`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let limits = JobLimits::new(
            Duration::from_secs(env_or("JOB_SOFT_LIMIT_SECS", DEFAULT_SOFT_LIMIT_SECS)),
            Duration::from_secs(env_or("JOB_HARD_LIMIT_SECS", DEFAULT_HARD_LIMIT_SECS)),
        )?;

        let concurrency = env_or("WORKER_CONCURRENCY", DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::Invalid(
                "WORKER_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let max_jobs_per_worker = env_or("WORKER_MAX_JOBS", DEFAULT_MAX_JOBS_PER_WORKER).max(1);

        Ok(Self {
            storage: StorageConfig::from_env(),
            limits,
            pool: PoolConfig {
                concurrency,
                max_jobs_per_worker,
                poll_interval: Duration::from_millis(env_or(
                    "QUEUE_POLL_INTERVAL_MS",
                    DEFAULT_POLL_INTERVAL_MS,
                )),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn soft_must_precede_hard() {
        assert_matches!(
            JobLimits::new(Duration::from_secs(30), Duration::from_secs(30)),
            Err(ConfigError::Limits { soft_secs: 30, hard_secs: 30 })
        );
        let limits = JobLimits::new(Duration::from_secs(1), Duration::from_secs(2)).unwrap();
        assert_eq!(limits.hard(), Duration::from_secs(2));
    }

    #[test]
    fn defaults_match_recommended_limits() {
        let limits = JobLimits::default();
        assert_eq!(limits.soft(), Duration::from_secs(20));
        assert_eq!(limits.hard(), Duration::from_secs(30));
        assert_eq!(PoolConfig::default().max_jobs_per_worker, 1000);
    }
}
