use crate::domain::value_objects::{OperationPayload, SyncOperationId, SyncOperationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A pending mutation awaiting delivery to the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    pub id: SyncOperationId,
    pub operation_type: SyncOperationType,
    pub payload: OperationPayload,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl SyncOperation {
    pub fn new(
        operation_type: SyncOperationType,
        payload: OperationPayload,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SyncOperationId::generate(now.timestamp_millis()),
            operation_type,
            payload,
            enqueued_at: now,
            retry_count: 0,
            last_attempt_at: None,
        }
    }

    pub fn has_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }

    /// `base * 2^retry_count`, saturating.
    pub fn backoff_delay(&self, base: Duration) -> Duration {
        let factor = 2u32.checked_pow(self.retry_count).unwrap_or(u32::MAX);
        base.saturating_mul(factor)
    }

    /// True while the minimum wait since the previous attempt has not elapsed.
    pub fn is_backing_off(&self, now: DateTime<Utc>, base: Duration) -> bool {
        let Some(last_attempt) = self.last_attempt_at else {
            return false;
        };
        let elapsed = (now - last_attempt).to_std().unwrap_or(Duration::ZERO);
        elapsed < self.backoff_delay(base)
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_attempt_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn op() -> SyncOperation {
        SyncOperation::new(
            SyncOperationType::SaveHistory,
            OperationPayload::new(json!({"scenarioId": "s1"})).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn backoff_grows_exponentially() {
        let mut op = op();
        let base = Duration::from_millis(1_000);
        assert_eq!(op.backoff_delay(base), Duration::from_millis(1_000));
        op.retry_count = 1;
        assert_eq!(op.backoff_delay(base), Duration::from_millis(2_000));
        op.retry_count = 3;
        assert_eq!(op.backoff_delay(base), Duration::from_millis(8_000));
    }

    #[test]
    fn never_attempted_operation_is_not_backing_off() {
        assert!(!op().is_backing_off(Utc::now(), Duration::from_secs(60)));
    }

    #[test]
    fn backing_off_until_delay_elapses() {
        let now = Utc::now();
        let mut op = op();
        op.record_failure(now);
        assert_eq!(op.retry_count, 1);

        let base = Duration::from_millis(1_000);
        assert!(op.is_backing_off(now + ChronoDuration::milliseconds(1_999), base));
        assert!(!op.is_backing_off(now + ChronoDuration::milliseconds(2_000), base));
    }

    #[test]
    fn exhausted_at_max_retries() {
        let mut op = op();
        op.retry_count = 3;
        assert!(op.has_exhausted(3));
        op.retry_count = 2;
        assert!(!op.has_exhausted(3));
    }
}
