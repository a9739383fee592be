use crate::domain::models::ScheduledItem;
use crate::infrastructure::config::SyncSettings;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_repository::DayScheduleRepository;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{Duration as TokioDuration, sleep};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u8,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
        }
    }
}

impl From<SyncSettings> for RetryPolicy {
    fn from(settings: SyncSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay_ms: settings.base_delay_ms,
        }
    }
}

/// Moves whole day schedules between the in-memory store and persistence.
pub struct ScheduleSyncService<R>
where
    R: DayScheduleRepository + ?Sized,
{
    repository: Arc<R>,
    retry_policy: RetryPolicy,
}

impl<R> ScheduleSyncService<R>
where
    R: DayScheduleRepository + ?Sized,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub async fn load(&self, user_id: &str, date: &str) -> Result<Vec<ScheduledItem>, InfraError> {
        self.with_retry("load", || self.repository.load_by_date(user_id, date))
            .await
    }

    pub async fn persist(
        &self,
        user_id: &str,
        date: &str,
        items: &[ScheduledItem],
    ) -> Result<(), InfraError> {
        self.with_retry("replace", || {
            self.repository.replace_by_date(user_id, date, items)
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, InfraError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InfraError>>,
    {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt: u8 = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self
                        .retry_policy
                        .base_delay_ms
                        .saturating_mul(2u64.saturating_pow(u32::from(attempt)));
                    tracing::warn!(operation, attempt, delay_ms = delay, %error, "retrying schedule sync");
                    sleep(TokioDuration::from_millis(delay)).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::schedule_repository::InMemoryDayScheduleRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DATE: &str = "2026-02-16";

    fn sample_items() -> Vec<ScheduledItem> {
        vec![ScheduledItem::for_task("itm-1", DATE, "tsk-1", "09:00", 60)]
    }

    /// Fails the first `failures` writes, then behaves like the in-memory store.
    #[derive(Debug, Default)]
    struct FlakyRepository {
        inner: InMemoryDayScheduleRepository,
        failures: AtomicUsize,
        insert_calls: AtomicUsize,
        fatal: bool,
    }

    impl FlakyRepository {
        fn failing(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                ..Self::default()
            }
        }

        fn broken() -> Self {
            Self {
                fatal: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DayScheduleRepository for FlakyRepository {
        async fn load_by_date(
            &self,
            user_id: &str,
            date: &str,
        ) -> Result<Vec<ScheduledItem>, InfraError> {
            self.inner.load_by_date(user_id, date).await
        }

        async fn delete_by_date(&self, user_id: &str, date: &str) -> Result<(), InfraError> {
            self.inner.delete_by_date(user_id, date).await
        }

        async fn insert_items(
            &self,
            user_id: &str,
            date: &str,
            items: &[ScheduledItem],
        ) -> Result<(), InfraError> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fatal {
                return Err(InfraError::InvalidConfig("schema mismatch".to_string()));
            }
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(InfraError::Persistence("network error".to_string()));
            }
            self.inner.insert_items(user_id, date, items).await
        }
    }

    fn fast_retry(max_attempts: u8) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn persisted_day_loads_back() {
        let repository = Arc::new(InMemoryDayScheduleRepository::default());
        let service = ScheduleSyncService::new(repository);

        service
            .persist("user-1", DATE, &sample_items())
            .await
            .expect("persist");
        let reloaded = service.load("user-1", DATE).await.expect("load");
        assert_eq!(reloaded, sample_items());
    }

    #[tokio::test]
    async fn persist_retries_retryable_failures() {
        let repository = Arc::new(FlakyRepository::failing(1));
        let service =
            ScheduleSyncService::new(Arc::clone(&repository)).with_retry_policy(fast_retry(3));

        service
            .persist("user-1", DATE, &sample_items())
            .await
            .expect("persist after retry");
        assert_eq!(repository.insert_calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            repository.load_by_date("user-1", DATE).await.expect("load"),
            sample_items()
        );
    }

    #[tokio::test]
    async fn persist_gives_up_after_max_attempts() {
        let repository = Arc::new(FlakyRepository::failing(5));
        let service =
            ScheduleSyncService::new(Arc::clone(&repository)).with_retry_policy(fast_retry(2));

        let result = service.persist("user-1", DATE, &sample_items()).await;
        assert!(matches!(result, Err(InfraError::Persistence(_))));
        assert_eq!(repository.insert_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_fast() {
        let repository = Arc::new(FlakyRepository::broken());
        let service =
            ScheduleSyncService::new(Arc::clone(&repository)).with_retry_policy(fast_retry(3));

        let result = service.persist("user-1", DATE, &sample_items()).await;
        assert!(matches!(result, Err(InfraError::InvalidConfig(_))));
        assert_eq!(repository.insert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_insert_after_delete_leaves_day_empty() {
        let repository = Arc::new(FlakyRepository::failing(0));
        let service =
            ScheduleSyncService::new(Arc::clone(&repository)).with_retry_policy(fast_retry(1));
        service
            .persist("user-1", DATE, &sample_items())
            .await
            .expect("initial persist");

        repository.failures.store(1, Ordering::SeqCst);
        let result = service.persist("user-1", DATE, &sample_items()).await;
        assert!(result.is_err());
        assert!(service.load("user-1", DATE).await.expect("load").is_empty());
    }
}
